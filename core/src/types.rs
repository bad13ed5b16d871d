//! Shared primitive types used across the entire pipeline.

/// A stable dealership identifier (`D001`, `D002`, ...). The join key
/// for every source and result table.
pub type DealerId = String;

/// Vehicle model name as it appears in sales, inventory and claim rows.
pub type ModelName = String;

/// A claim identifier (`C00001`, ...).
pub type ClaimId = String;
