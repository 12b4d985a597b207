//! Shared primitive types used across the layout and seed code.

/// A global, 1-based event index.
pub type EventIndex = i64;

/// A 1-based realization (Monte Carlo trial) index.
pub type RealizationIndex = u32;

/// A 1-based block index within one realization.
pub type BlockIndex = u32;

/// A raw seed handed to a downstream plugin.
pub type Seed = i64;

/// Name of a dataset in a store.
pub type DatasetName = String;
