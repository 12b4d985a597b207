//! Flat blob storage: one JSON array per dataset.
//!
//! A dataset named `blocks` under data dir `d` lives at `d/blocks.json`.
//! Names may contain `/` to nest, e.g. `seeds/42` -> `d/seeds/42.json`.

use crate::{block::Block, error::SeedResult, seed::SeedAssignment};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.root.join(format!("{dataset}.json"))
    }

    pub fn put<T: Serialize + ?Sized>(&self, dataset: &str, value: &T) -> SeedResult<PathBuf> {
        let path = self.path_for(dataset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers only ever see a complete document: write aside, then rename.
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_file(&tmp, value) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &path)?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }

    pub fn get<T: DeserializeOwned>(&self, dataset: &str) -> SeedResult<T> {
        let path = self.path_for(dataset);
        read_json(BufReader::new(File::open(&path)?))
    }

    pub fn put_blocks(&self, dataset: &str, blocks: &[Block]) -> SeedResult<PathBuf> {
        self.put(dataset, blocks)
    }

    pub fn get_blocks(&self, dataset: &str) -> SeedResult<Vec<Block>> {
        self.get(dataset)
    }

    pub fn put_seeds(&self, dataset: &str, seeds: &[SeedAssignment]) -> SeedResult<PathBuf> {
        self.put(dataset, seeds)
    }

    pub fn get_seeds(&self, dataset: &str) -> SeedResult<Vec<SeedAssignment>> {
        self.get(dataset)
    }
}

fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> SeedResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(&mut writer, value)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> SeedResult<()> {
    serde_json::to_writer(writer, value)?;
    Ok(())
}

pub fn read_json<R: Read, T: DeserializeOwned>(reader: R) -> SeedResult<T> {
    Ok(serde_json::from_reader(reader)?)
}
