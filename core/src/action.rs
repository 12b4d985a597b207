//! Action payloads and their dispatcher.
//!
//! A payload is an ordered list of actions, each `{"type": ..., "attributes": {...}}`.
//! Actions run in order and the first failure aborts the rest.
//!
//! RULE: Actions only move data between the stores and the pure core.
//! No layout or seed logic lives here.

use crate::{
    blob::BlobStore,
    block::{self, Block},
    config::{BlockGeneratorConfig, RealizationSeedConfig, SeedGenerationConfig},
    error::{SeedError, SeedResult},
    seed::{RealizationSeeder, SeedAssignment, SeedDeriver},
    store::SeedStore,
    types::{DatasetName, EventIndex},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Where a dataset lives. Any value other than `"eventstore"` means a blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoreType {
    #[default]
    Blob,
    EventStore,
}

impl From<String> for StoreType {
    fn from(s: String) -> Self {
        if s == "eventstore" {
            Self::EventStore
        } else {
            Self::Blob
        }
    }
}

impl From<StoreType> for String {
    fn from(t: StoreType) -> Self {
        match t {
            StoreType::Blob => "blob".into(),
            StoreType::EventStore => "eventstore".into(),
        }
    }
}

fn default_block_dataset() -> DatasetName {
    "blockfile".into()
}

fn default_seed_dataset() -> DatasetName {
    "seeds".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGenerationAttrs {
    #[serde(flatten)]
    pub layout: BlockGeneratorConfig,
    pub outputdataset_name: DatasetName,
    pub store_type: StoreType,
}

/// The seed model comes from the blob named `model_dataset_name` when set,
/// otherwise from the seed attributes given inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizationSeedAttrs {
    #[serde(flatten)]
    pub config: Option<RealizationSeedConfig>,
    #[serde(default)]
    pub model_dataset_name: Option<DatasetName>,
    #[serde(default = "default_seed_dataset")]
    pub output_dataset_name: DatasetName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSeedAttrs {
    #[serde(flatten)]
    pub seeds: SeedGenerationConfig,
    #[serde(default = "default_block_dataset")]
    pub block_dataset_name: DatasetName,
    #[serde(default)]
    pub block_store_type: StoreType,
    #[serde(default = "default_seed_dataset")]
    pub output_dataset_name: DatasetName,
    #[serde(default)]
    pub output_store_type: StoreType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "snake_case")]
pub enum Action {
    BlockGeneration(BlockGenerationAttrs),
    RealizationSeedGeneration(RealizationSeedAttrs),
    BlockEventSeedGeneration(BlockSeedAttrs),
    BlockAllSeedGeneration(BlockSeedAttrs),
}

impl Action {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::BlockGeneration(_) => "block_generation",
            Self::RealizationSeedGeneration(_) => "realization_seed_generation",
            Self::BlockEventSeedGeneration(_) => "block_event_seed_generation",
            Self::BlockAllSeedGeneration(_) => "block_all_seed_generation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub actions: Vec<Action>,
}

impl Payload {
    pub fn from_json(json: &str) -> SeedResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Ok(Self::from_json(&content)?)
    }
}

/// What one action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    BlocksGenerated {
        dataset: DatasetName,
        blocks: usize,
        realizations: u32,
        last_event: EventIndex,
    },
    SeedsDerived {
        dataset: DatasetName,
        events: usize,
    },
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlocksGenerated { dataset, blocks, realizations, last_event } => write!(
                f,
                "{dataset}: {blocks} blocks, {realizations} realizations, events 1..={last_event}"
            ),
            Self::SeedsDerived { dataset, events } => {
                write!(f, "{dataset}: seeds for {events} event(s)")
            }
        }
    }
}

/// Stores and worker identity for one process.
pub struct ActionContext {
    pub blobs: BlobStore,
    pub store: SeedStore,
    /// Event assigned to this worker, if any.
    pub event_index: Option<EventIndex>,
}

impl ActionContext {
    fn worker_event(&self) -> SeedResult<EventIndex> {
        self.event_index
            .ok_or_else(|| SeedError::config("event_index", "no event number assigned to this worker"))
    }

    /// Run every action in order, stopping at the first failure.
    pub fn run_payload(&self, payload: &Payload) -> SeedResult<Vec<ActionOutcome>> {
        payload.actions.iter().map(|a| self.run(a)).collect()
    }

    pub fn run(&self, action: &Action) -> SeedResult<ActionOutcome> {
        log::info!("running action {}", action.type_name());
        match action {
            Action::BlockGeneration(attrs) => self.generate_blocks(attrs),
            Action::RealizationSeedGeneration(attrs) => self.realization_seeds(attrs),
            Action::BlockEventSeedGeneration(attrs) => self.block_event_seeds(attrs),
            Action::BlockAllSeedGeneration(attrs) => self.block_all_seeds(attrs),
        }
    }

    fn generate_blocks(&self, attrs: &BlockGenerationAttrs) -> SeedResult<ActionOutcome> {
        let blocks = block::generate_blocks(&attrs.layout)?;
        let name = &attrs.outputdataset_name;
        match attrs.store_type {
            StoreType::EventStore => self.store.write_blocks(name, &blocks)?,
            StoreType::Blob => {
                self.blobs.put_blocks(name, &blocks)?;
            }
        }
        Ok(ActionOutcome::BlocksGenerated {
            dataset: name.clone(),
            blocks: blocks.len(),
            realizations: blocks.last().map(|b| b.realization_index).unwrap_or(0),
            last_event: blocks.last().map(|b| b.event_end).unwrap_or(0),
        })
    }

    fn realization_seeds(&self, attrs: &RealizationSeedAttrs) -> SeedResult<ActionOutcome> {
        let config: RealizationSeedConfig = match (&attrs.model_dataset_name, &attrs.config) {
            (Some(name), _) => self.blobs.get(name)?,
            (None, Some(inline)) => inline.clone(),
            (None, None) => {
                return Err(SeedError::config(
                    "model_dataset_name",
                    "no seed model: set model_dataset_name or give the seed attributes inline",
                ))
            }
        };
        let seeder = RealizationSeeder::new(&config)?;
        let assignment = seeder.compute_for_realization(self.worker_event()?)?;
        self.write_one(&attrs.output_dataset_name, StoreType::Blob, &assignment)
    }

    fn block_event_seeds(&self, attrs: &BlockSeedAttrs) -> SeedResult<ActionOutcome> {
        let deriver = SeedDeriver::new(&attrs.seeds)?;
        let event_index = self.worker_event()?;
        let assignment = match attrs.block_store_type {
            StoreType::EventStore => {
                let block = self.store.block_for_event(&attrs.block_dataset_name, event_index)?;
                deriver.compute_one(event_index, std::slice::from_ref(&block))?
            }
            StoreType::Blob => {
                let blocks = self.read_layout(&attrs.block_dataset_name, StoreType::Blob)?;
                deriver.compute_one(event_index, &blocks)?
            }
        };
        self.write_one(&attrs.output_dataset_name, attrs.output_store_type, &assignment)
    }

    fn block_all_seeds(&self, attrs: &BlockSeedAttrs) -> SeedResult<ActionOutcome> {
        let deriver = SeedDeriver::new(&attrs.seeds)?;
        let blocks = self.read_layout(&attrs.block_dataset_name, attrs.block_store_type)?;
        let assignments = deriver.compute_all(&blocks);
        let name = &attrs.output_dataset_name;
        match attrs.output_store_type {
            StoreType::EventStore => self.store.write_seeds(name, &assignments)?,
            StoreType::Blob => {
                self.blobs.put_seeds(name, &assignments)?;
            }
        }
        Ok(ActionOutcome::SeedsDerived {
            dataset: name.clone(),
            events: assignments.len(),
        })
    }

    fn read_layout(&self, name: &str, store_type: StoreType) -> SeedResult<Vec<Block>> {
        let blocks = match store_type {
            StoreType::EventStore => self.store.read_blocks(name)?,
            StoreType::Blob => self.blobs.get_blocks(name)?,
        };
        block::verify_layout(&blocks)?;
        Ok(blocks)
    }

    /// Blob outputs of single-event actions go to `<dataset>/<event>.json`
    /// so workers sharing a data dir never overwrite each other.
    fn write_one(
        &self,
        name: &str,
        store_type: StoreType,
        assignment: &SeedAssignment,
    ) -> SeedResult<ActionOutcome> {
        match store_type {
            StoreType::EventStore => self.store.write_seeds(name, std::slice::from_ref(assignment))?,
            StoreType::Blob => {
                self.blobs
                    .put(&format!("{name}/{}", assignment.event_index), assignment)?;
            }
        }
        Ok(ActionOutcome::SeedsDerived {
            dataset: name.to_string(),
            events: 1,
        })
    }
}
