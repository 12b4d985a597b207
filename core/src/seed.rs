//! Per-event seed derivation.
//!
//! RULE: Every seed is a pure function of its arguments.
//! A worker handed one event index must get exactly the seeds the batch
//! path would have given that event, without computing any other event.
//! See `rng` for the mixing function.

use crate::{
    block::Block,
    config::{RealizationSeedConfig, SeedGenerationConfig},
    error::{SeedError, SeedResult},
    rng::SeedRoots,
    types::{BlockIndex, EventIndex, RealizationIndex, Seed},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seeds for every configured plugin at one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAssignment {
    pub realization_index: RealizationIndex,
    pub block_index: BlockIndex,
    pub event_index: EventIndex,
    pub plugin_seeds: BTreeMap<String, Seed>,
}

/// Derives seeds against a block layout.
#[derive(Debug, Clone)]
pub struct SeedDeriver {
    roots: SeedRoots,
    plugins: Vec<String>,
}

impl SeedDeriver {
    pub fn new(config: &SeedGenerationConfig) -> SeedResult<Self> {
        config.validate()?;
        Ok(Self {
            roots: SeedRoots::new(config.initial_event_seed, config.initial_realization_seed),
            plugins: config.plugins.clone(),
        })
    }

    /// Seeds for a single event, located by scanning `blocks` in order.
    pub fn compute_one(&self, event_index: EventIndex, blocks: &[Block]) -> SeedResult<SeedAssignment> {
        let block = blocks
            .iter()
            .find(|b| b.contains_event(event_index))
            .ok_or(SeedError::EventNotFound { event_index })?;
        log::debug!(
            "event {event_index} -> realization {} block {}",
            block.realization_index,
            block.block_index
        );
        Ok(self.assign(block.realization_index, block.block_index, event_index))
    }

    /// Seeds for every event covered by `blocks`, in event order.
    pub fn compute_all(&self, blocks: &[Block]) -> Vec<SeedAssignment> {
        let assignments: Vec<SeedAssignment> = blocks
            .iter()
            .filter(|b| !b.is_empty())
            .flat_map(|b| {
                b.events()
                    .map(move |e| self.assign(b.realization_index, b.block_index, e))
            })
            .collect();
        log::info!(
            "derived seeds for {} events across {} plugins",
            assignments.len(),
            self.plugins.len()
        );
        assignments
    }

    pub(crate) fn assign(
        &self,
        realization_index: RealizationIndex,
        block_index: BlockIndex,
        event_index: EventIndex,
    ) -> SeedAssignment {
        let realization_key = self.roots.realization_key(realization_index);
        let plugin_seeds = self
            .plugins
            .iter()
            .map(|name| {
                let seed = self.roots.event_seed(
                    self.roots.stream_key(name),
                    realization_key,
                    event_index,
                );
                (name.clone(), seed)
            })
            .collect();
        SeedAssignment {
            realization_index,
            block_index,
            event_index,
            plugin_seeds,
        }
    }
}

/// Derives seeds when realizations are not block-partitioned.
///
/// Realization membership comes from `events_per_realization` alone; each
/// realization counts as a single block.
#[derive(Debug, Clone)]
pub struct RealizationSeeder {
    deriver: SeedDeriver,
    events_per_realization: Option<i64>,
}

impl RealizationSeeder {
    pub fn new(config: &RealizationSeedConfig) -> SeedResult<Self> {
        config.validate()?;
        Ok(Self {
            deriver: SeedDeriver::new(&config.seeds)?,
            events_per_realization: config.events_per_realization,
        })
    }

    /// Realization holding `event_index`, which must be at least 1.
    pub fn realization_of(&self, event_index: EventIndex) -> SeedResult<RealizationIndex> {
        if event_index < 1 {
            return Err(SeedError::config(
                "event_index",
                format!("must be at least 1, got {event_index}"),
            ));
        }
        let Some(n) = self.events_per_realization else {
            return Ok(1);
        };
        RealizationIndex::try_from((event_index - 1) / n + 1).map_err(|_| {
            SeedError::config(
                "event_index",
                format!("{event_index} falls past the last representable realization"),
            )
        })
    }

    pub fn compute_for_realization(&self, event_index: EventIndex) -> SeedResult<SeedAssignment> {
        let realization_index = self.realization_of(event_index)?;
        Ok(self.deriver.assign(realization_index, 1, event_index))
    }
}
