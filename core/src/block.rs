//! Block layout generation.
//!
//! A layout is an ordered list of blocks covering event indices 1..=N with
//! no gaps and no overlaps. Each block's size is one Poisson draw, so a
//! block may be empty. Realizations are always whole: generation only
//! stops after the last block of a realization.

use crate::{
    config::BlockGeneratorConfig,
    error::{SeedError, SeedResult},
    rng::BlockSizeSampler,
    types::{BlockIndex, EventIndex, RealizationIndex},
};
use serde::{Deserialize, Serialize};

/// One contiguous range of events inside a realization.
///
/// `event_end` is inclusive. An empty block has `event_end == event_start - 1`.
/// Serialized field names are an external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub realization_index: RealizationIndex,
    pub block_index: BlockIndex,
    #[serde(rename = "block_event_count")]
    pub event_count: u32,
    #[serde(rename = "block_event_start")]
    pub event_start: EventIndex,
    #[serde(rename = "block_event_end")]
    pub event_end: EventIndex,
}

impl Block {
    pub fn new(
        realization_index: RealizationIndex,
        block_index: BlockIndex,
        event_start: EventIndex,
        event_count: u32,
    ) -> Self {
        Self {
            realization_index,
            block_index,
            event_count,
            event_start,
            event_end: event_start + event_count as EventIndex - 1,
        }
    }

    pub fn contains_event(&self, event_index: EventIndex) -> bool {
        self.event_start <= event_index && event_index <= self.event_end
    }

    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }

    /// Every event index in this block, in order.
    pub fn events(&self) -> impl Iterator<Item = EventIndex> {
        self.event_start..=self.event_end
    }
}

/// Generate the full layout for `config`.
///
/// Validates the config first; an invalid config never produces blocks.
pub fn generate_blocks(config: &BlockGeneratorConfig) -> SeedResult<Vec<Block>> {
    config.validate()?;
    let blocks_per_realization = config.blocks_per_realization as BlockIndex;
    let mut sampler =
        BlockSizeSampler::new(config.seed, config.target_events_per_block as u32)?;

    let mut blocks = Vec::new();
    let mut event_start: EventIndex = 1;
    let mut block_index: BlockIndex = 1;
    let mut realization_index: RealizationIndex = 1;

    loop {
        let block = Block::new(realization_index, block_index, event_start, sampler.next_count());
        blocks.push(block);

        if block_index == blocks_per_realization {
            if block.event_end >= config.target_total_events {
                break;
            }
            realization_index += 1;
            block_index = 0;
        }

        event_start = block.event_end + 1;
        block_index += 1;
    }

    log::info!(
        "generated {} blocks over {} realizations ({} events, seed={})",
        blocks.len(),
        realization_index,
        blocks.last().map(|b| b.event_end).unwrap_or(0),
        config.seed
    );
    Ok(blocks)
}

/// Check a layout read back from storage: contiguous ranges from event 1,
/// consistent counts, and whole realizations all as long as the first one.
pub fn verify_layout(blocks: &[Block]) -> SeedResult<()> {
    if blocks.is_empty() {
        return Err(SeedError::MalformedLayout("layout has no blocks".into()));
    }
    let blocks_per_realization = blocks
        .iter()
        .take_while(|b| b.realization_index == 1)
        .count() as BlockIndex;

    let mut expected_start: EventIndex = 1;
    let mut expected_realization: RealizationIndex = 1;
    let mut expected_block: BlockIndex = 1;

    for (i, block) in blocks.iter().enumerate() {
        if block.event_start != expected_start {
            return Err(SeedError::MalformedLayout(format!(
                "block {i} starts at {}, expected {expected_start}",
                block.event_start
            )));
        }
        if block.event_end != block.event_start + block.event_count as EventIndex - 1 {
            return Err(SeedError::MalformedLayout(format!(
                "block {i} has an inconsistent event count"
            )));
        }
        if block.realization_index != expected_realization || block.block_index != expected_block {
            return Err(SeedError::MalformedLayout(format!(
                "block {i} is ({}, {}), expected ({expected_realization}, {expected_block})",
                block.realization_index, block.block_index
            )));
        }

        expected_start = block.event_end + 1;
        if expected_block == blocks_per_realization {
            expected_block = 1;
            expected_realization += 1;
        } else {
            expected_block += 1;
        }
    }

    if expected_block != 1 {
        return Err(SeedError::MalformedLayout("last realization is incomplete".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_contains_nothing() {
        let block = Block::new(1, 3, 6, 0);
        assert_eq!(block.event_end, 5);
        for x in -5..20 {
            assert!(!block.contains_event(x), "empty block claimed event {x}");
        }
        assert_eq!(block.events().count(), 0);
    }

    #[test]
    fn contains_event_is_inclusive() {
        let block = Block::new(2, 1, 10, 3);
        assert!(!block.contains_event(9));
        assert!(block.contains_event(10));
        assert!(block.contains_event(12));
        assert!(!block.contains_event(13));
    }

    #[test]
    fn serializes_with_contract_field_names() {
        let json = serde_json::to_value(Block::new(1, 2, 4, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "realization_index": 1,
                "block_index": 2,
                "block_event_count": 3,
                "block_event_start": 4,
                "block_event_end": 6
            })
        );
    }

    #[test]
    fn verify_layout_flags_gaps() {
        let blocks = vec![Block::new(1, 1, 1, 3), Block::new(1, 2, 5, 2)];
        assert!(matches!(verify_layout(&blocks), Err(SeedError::MalformedLayout(_))));
    }

    #[test]
    fn verify_layout_flags_partial_realization() {
        let blocks = vec![Block::new(1, 1, 1, 3), Block::new(1, 2, 4, 2), Block::new(2, 1, 6, 1)];
        let err = verify_layout(&blocks).unwrap_err();
        assert!(err.to_string().contains("last realization is incomplete"));
    }

    #[test]
    fn verify_layout_accepts_empty_blocks() {
        let blocks = vec![
            Block::new(1, 1, 1, 0),
            Block::new(1, 2, 1, 2),
            Block::new(2, 1, 3, 0),
            Block::new(2, 2, 3, 0),
        ];
        verify_layout(&blocks).unwrap();
    }
}
