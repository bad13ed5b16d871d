//! CSV loading at the pipeline boundary.
//!
//! RULE: only the loader touches files. Scoring modules receive typed
//! slices and never know where the rows came from.
//!
//! Every table declares the columns it cannot do without. Headers are
//! checked before any row is read; a missing column is fatal
//! (`PipelineError::InvalidInputSchema`) and no defaults are substituted.

use crate::{
    error::{PipelineError, PipelineResult},
    records::{Dealer, EngagementEvent, FeedbackEntry, InventoryRecord, SalesRecord, WarrantyClaim},
};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

/// A row type backed by one CSV file in the data directory.
pub trait SourceTable: DeserializeOwned {
    const TABLE: &'static str;
    const FILE_NAME: &'static str;
    const REQUIRED_COLUMNS: &'static [&'static str];
}

impl SourceTable for Dealer {
    const TABLE: &'static str = "dealer_master";
    const FILE_NAME: &'static str = "dealer_master.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "dealer_id", "region", "state", "city", "tier", "years_partnered", "ownership_type",
    ];
}

impl SourceTable for SalesRecord {
    const TABLE: &'static str = "sales_transactions";
    const FILE_NAME: &'static str = "sales_transactions.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["date", "dealer_id", "model", "units_sold", "wholesale_value"];
}

impl SourceTable for InventoryRecord {
    const TABLE: &'static str = "inventory_stock";
    const FILE_NAME: &'static str = "inventory_stock.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["dealer_id", "model", "stock_units", "ageing_days"];
}

impl SourceTable for WarrantyClaim {
    const TABLE: &'static str = "warranty_claims";
    const FILE_NAME: &'static str = "warranty_claims.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "dealer_id", "claim_id", "model", "issue_type", "severity", "filed_date", "resolution_days",
    ];
}

impl SourceTable for EngagementEvent {
    const TABLE: &'static str = "crm_engagement";
    const FILE_NAME: &'static str = "crm_engagement.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["dealer_id", "date", "interaction_type", "notes", "duration_mins"];
}

impl SourceTable for FeedbackEntry {
    const TABLE: &'static str = "feedback_forms";
    const FILE_NAME: &'static str = "feedback_forms.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["dealer_id", "feedback_date", "feedback_source", "comments"];
}

/// Read one table, checking its header before deserializing any row.
/// Extra columns are ignored.
pub fn read_table<T: SourceTable, R: Read>(reader: R) -> PipelineResult<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: HashSet<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if let Some(column) = T::REQUIRED_COLUMNS.iter().copied().find(|c| !headers.contains(*c)) {
        return Err(PipelineError::InvalidInputSchema { table: T::TABLE, column });
    }

    let rows = csv_reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("loader: read {} rows from {}", rows.len(), T::TABLE);
    Ok(rows)
}

pub fn read_table_file<T: SourceTable>(data_dir: &Path) -> PipelineResult<Vec<T>> {
    let path = data_dir.join(T::FILE_NAME);
    let file = std::fs::File::open(&path).map_err(|e| {
        PipelineError::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    })?;
    read_table(file)
}

/// Write `rows` to the table's file under `dir`, header first.
pub fn write_table_file<T: SourceTable + Serialize>(dir: &Path, rows: &[T]) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(dir.join(T::FILE_NAME))?;
    if rows.is_empty() {
        writer.write_record(T::REQUIRED_COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::debug!("loader: wrote {} rows to {}", rows.len(), T::TABLE);
    Ok(())
}

// ── Table bundle ─────────────────────────────────────────────────────────────

/// The six source tables of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTables {
    pub dealers:    Vec<Dealer>,
    pub sales:      Vec<SalesRecord>,
    pub inventory:  Vec<InventoryRecord>,
    pub claims:     Vec<WarrantyClaim>,
    pub engagement: Vec<EngagementEvent>,
    pub feedback:   Vec<FeedbackEntry>,
}

impl SourceTables {
    /// Read all six CSV files from `data_dir`. Fails on the first table
    /// that cannot be read; nothing is returned partially.
    pub fn load(data_dir: impl AsRef<Path>) -> PipelineResult<Self> {
        let dir = data_dir.as_ref();
        let tables = Self {
            dealers:    read_table_file(dir)?,
            sales:      read_table_file(dir)?,
            inventory:  read_table_file(dir)?,
            claims:     read_table_file(dir)?,
            engagement: read_table_file(dir)?,
            feedback:   read_table_file(dir)?,
        };

        log::info!(
            "loader: {} dealers, {} sales, {} inventory, {} claims, {} crm, {} feedback rows from {}",
            tables.dealers.len(),
            tables.sales.len(),
            tables.inventory.len(),
            tables.claims.len(),
            tables.engagement.len(),
            tables.feedback.len(),
            dir.display(),
        );
        Ok(tables)
    }

    /// Write all six tables into `data_dir`, creating it if needed.
    pub fn write(&self, data_dir: impl AsRef<Path>) -> PipelineResult<()> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_table_file(dir, &self.dealers)?;
        write_table_file(dir, &self.sales)?;
        write_table_file(dir, &self.inventory)?;
        write_table_file(dir, &self.claims)?;
        write_table_file(dir, &self.engagement)?;
        write_table_file(dir, &self.feedback)?;
        log::info!("loader: wrote source tables to {}", dir.display());
        Ok(())
    }

    /// Dealer ids referenced by event tables but missing from the master
    /// table. They still take part in scoring as ordinary cohort members.
    pub fn unknown_dealer_ids(&self) -> BTreeSet<&str> {
        let known: HashSet<&str> = self.dealers.iter().map(|d| d.dealer_id.as_str()).collect();

        self.sales
            .iter()
            .map(|r| r.dealer_id.as_str())
            .chain(self.inventory.iter().map(|r| r.dealer_id.as_str()))
            .chain(self.claims.iter().map(|r| r.dealer_id.as_str()))
            .chain(self.engagement.iter().map(|r| r.dealer_id.as_str()))
            .chain(self.feedback.iter().map(|r| r.dealer_id.as_str()))
            .filter(|id| !known.contains(id))
            .collect()
    }
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// Anything that can hand the pipeline a full set of source tables.
pub trait TableSource {
    fn load_tables(&self) -> PipelineResult<SourceTables>;
}

/// The six CSV files of a data directory.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TableSource for CsvDirectory {
    fn load_tables(&self) -> PipelineResult<SourceTables> {
        SourceTables::load(&self.root)
    }
}

impl TableSource for SourceTables {
    fn load_tables(&self) -> PipelineResult<SourceTables> {
        Ok(self.clone())
    }
}

/// Loads from the wrapped source once and serves copies afterwards.
/// Failed loads are not cached.
pub struct Memoized<S> {
    inner: S,
    cache: RefCell<Option<SourceTables>>,
}

impl<S: TableSource> Memoized<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, cache: RefCell::new(None) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop the cached tables; the next load reads the source again.
    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }
}

impl<S: TableSource> TableSource for Memoized<S> {
    fn load_tables(&self) -> PipelineResult<SourceTables> {
        if let Some(tables) = self.cache.borrow().as_ref() {
            return Ok(tables.clone());
        }

        let tables = self.inner.load_tables()?;
        *self.cache.borrow_mut() = Some(tables.clone());
        Ok(tables)
    }
}
