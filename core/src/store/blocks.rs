use super::{DatasetKind, SeedStore};
use crate::{
    block::Block,
    error::{SeedError, SeedResult},
    types::EventIndex,
};
use rusqlite::{params, OptionalExtension, Row};

fn block_from_row(r: &Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        realization_index: r.get(0)?,
        block_index: r.get(1)?,
        event_count: r.get(2)?,
        event_start: r.get(3)?,
        event_end: r.get(4)?,
    })
}

impl SeedStore {
    /// Replace dataset `name` with `blocks`, in one transaction.
    pub fn write_blocks(&self, name: &str, blocks: &[Block]) -> SeedResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.create_dataset(name, DatasetKind::Blocks)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO block (
                     dataset, realization_index, block_index,
                     block_event_count, block_event_start, block_event_end
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for b in blocks {
                stmt.execute(params![
                    name,
                    b.realization_index,
                    b.block_index,
                    b.event_count,
                    b.event_start,
                    b.event_end,
                ])?;
            }
        }
        tx.commit()?;
        log::info!("stored {} blocks in '{name}'", blocks.len());
        Ok(())
    }

    /// The full layout, in generation order.
    pub fn read_blocks(&self, name: &str) -> SeedResult<Vec<Block>> {
        self.require_dataset(name, DatasetKind::Blocks)?;
        let mut stmt = self.conn.prepare(
            "SELECT realization_index, block_index, block_event_count,
                    block_event_start, block_event_end
             FROM block WHERE dataset = ?1
             ORDER BY realization_index ASC, block_index ASC",
        )?;
        let blocks = stmt
            .query_map(params![name], block_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(blocks)
    }

    /// Indexed lookup of the block holding `event_index`.
    ///
    /// Empty blocks never match, so this agrees with scanning the full layout.
    pub fn block_for_event(&self, name: &str, event_index: EventIndex) -> SeedResult<Block> {
        self.require_dataset(name, DatasetKind::Blocks)?;
        self.conn
            .query_row(
                "SELECT realization_index, block_index, block_event_count,
                        block_event_start, block_event_end
                 FROM block
                 WHERE dataset = ?1 AND block_event_start <= ?2 AND block_event_end >= ?2
                 ORDER BY realization_index ASC, block_index ASC
                 LIMIT 1",
                params![name, event_index],
                block_from_row,
            )
            .optional()?
            .ok_or(SeedError::EventNotFound { event_index })
    }

    pub fn block_count(&self, name: &str) -> SeedResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM block WHERE dataset = ?1",
            params![name],
            |r| r.get(0),
        )?)
    }
}
