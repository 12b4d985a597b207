//! Typed configuration, validated once at the boundary.
//!
//! RULE: Nothing downstream re-checks these values.
//! Every constructor path (action attributes, stored models, tests) must
//! call `validate()` before the config reaches `block` or `seed`.

use crate::error::{SeedError, SeedResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_BLOCK_SEED: i64 = 1234;

fn default_block_seed() -> i64 {
    DEFAULT_BLOCK_SEED
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGeneratorConfig {
    /// Stop once a finished realization ends at or past this event.
    pub target_total_events: i64,
    pub blocks_per_realization: i64,
    /// Poisson mean of each block's event count.
    pub target_events_per_block: i64,
    #[serde(default = "default_block_seed")]
    pub seed: i64,
}

impl BlockGeneratorConfig {
    pub fn validate(&self) -> SeedResult<()> {
        if self.target_total_events <= 0 {
            return Err(SeedError::config(
                "target_total_events",
                format!("must be positive, got {}", self.target_total_events),
            ));
        }
        check_u32_positive("blocks_per_realization", self.blocks_per_realization)?;
        check_u32_positive("target_events_per_block", self.target_events_per_block)?;
        Ok(())
    }

    /// Small layout used throughout the tests.
    pub fn default_test() -> Self {
        Self {
            target_total_events: 10,
            blocks_per_realization: 2,
            target_events_per_block: 5,
            seed: DEFAULT_BLOCK_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedGenerationConfig {
    pub initial_event_seed: i64,
    pub initial_realization_seed: i64,
    /// Downstream consumers, one independent seed stream each.
    pub plugins: Vec<String>,
}

impl SeedGenerationConfig {
    pub fn validate(&self) -> SeedResult<()> {
        if self.plugins.is_empty() {
            return Err(SeedError::config("plugins", "must name at least one plugin"));
        }
        let mut seen = HashSet::with_capacity(self.plugins.len());
        for name in &self.plugins {
            if name.trim().is_empty() {
                return Err(SeedError::config("plugins", "contains an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(SeedError::config("plugins", format!("duplicate plugin '{name}'")));
            }
        }
        Ok(())
    }

    pub fn default_test() -> Self {
        Self {
            initial_event_seed: 1,
            initial_realization_seed: 2,
            plugins: vec!["hydrology".into(), "hydraulics".into()],
        }
    }
}

/// Seed roots for the realization-level path, where no block layout exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizationSeedConfig {
    #[serde(flatten)]
    pub seeds: SeedGenerationConfig,
    /// Fixed realization length. Absent means one realization holds every event.
    #[serde(default)]
    pub events_per_realization: Option<i64>,
}

impl RealizationSeedConfig {
    pub fn validate(&self) -> SeedResult<()> {
        self.seeds.validate()?;
        if let Some(n) = self.events_per_realization {
            if n <= 0 {
                return Err(SeedError::config(
                    "events_per_realization",
                    format!("must be positive, got {n}"),
                ));
            }
        }
        Ok(())
    }

    pub fn default_test() -> Self {
        Self {
            seeds: SeedGenerationConfig::default_test(),
            events_per_realization: Some(100),
        }
    }
}

fn check_u32_positive(field: &'static str, value: i64) -> SeedResult<()> {
    if value <= 0 || value > u32::MAX as i64 {
        return Err(SeedError::config(
            field,
            format!("must be in 1..={}, got {value}", u32::MAX),
        ));
    }
    Ok(())
}
