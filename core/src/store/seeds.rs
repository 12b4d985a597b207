use super::{DatasetKind, SeedStore};
use crate::{
    error::SeedResult,
    seed::SeedAssignment,
    types::{BlockIndex, EventIndex, RealizationIndex, Seed},
};
use rusqlite::params;
use std::collections::BTreeMap;

impl SeedStore {
    /// Add (or overwrite) assignments in dataset `name`.
    ///
    /// Workers each write their own event, so the dataset is created on
    /// first use and never cleared here.
    pub fn write_seeds(&self, name: &str, assignments: &[SeedAssignment]) -> SeedResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.ensure_dataset(name, DatasetKind::Seeds)?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO seed (
                     dataset, event_index, realization_index, block_index, plugin, seed
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for a in assignments {
                for (plugin, seed) in &a.plugin_seeds {
                    stmt.execute(params![
                        name,
                        a.event_index,
                        a.realization_index,
                        a.block_index,
                        plugin,
                        seed,
                    ])?;
                }
            }
        }
        tx.commit()?;
        log::info!("stored seeds for {} events in '{name}'", assignments.len());
        Ok(())
    }

    /// All assignments in `name`, in event order.
    pub fn read_seeds(&self, name: &str) -> SeedResult<Vec<SeedAssignment>> {
        self.require_dataset(name, DatasetKind::Seeds)?;
        let mut stmt = self.conn.prepare(
            "SELECT event_index, realization_index, block_index, plugin, seed
             FROM seed WHERE dataset = ?1
             ORDER BY event_index ASC, plugin ASC",
        )?;
        let rows = stmt
            .query_map(params![name], |r| {
                Ok((
                    r.get::<_, EventIndex>(0)?,
                    r.get::<_, RealizationIndex>(1)?,
                    r.get::<_, BlockIndex>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Seed>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut assignments: Vec<SeedAssignment> = Vec::new();
        for (event_index, realization_index, block_index, plugin, seed) in rows {
            match assignments.last_mut() {
                Some(last) if last.event_index == event_index => {
                    last.plugin_seeds.insert(plugin, seed);
                }
                _ => assignments.push(SeedAssignment {
                    realization_index,
                    block_index,
                    event_index,
                    plugin_seeds: BTreeMap::from([(plugin, seed)]),
                }),
            }
        }
        Ok(assignments)
    }
}
