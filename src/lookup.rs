//! Lookup table loader
//!
//! Builds the (destination port, protocol number) → tag mapping from a
//! comma-separated table with a header row. Columns are found by name, so
//! their order does not matter and extra columns are ignored.
//!
//! Malformed rows (unparseable port, unknown protocol name, missing column)
//! are skipped without diagnostics. Only a failure to open or read the
//! source is an error.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::protocol_number;

/// Tag used for records with no lookup match
pub const UNTAGGED: &str = "Untagged";

const DSTPORT_COLUMN: &str = "dstport";
const PROTOCOL_COLUMN: &str = "protocol";
const TAG_COLUMN: &str = "tag";

/// Exact-match key into the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub dst_port: u16,
    pub protocol: i64,
}

impl LookupKey {
    pub fn new(dst_port: u16, protocol: i64) -> Self {
        Self { dst_port, protocol }
    }
}

/// Row counters gathered while loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: u64,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
}

/// Read-only mapping from [`LookupKey`] to tag
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<LookupKey, String>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a lookup table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_stats(path).map(|(table, _)| table)
    }

    /// Load a lookup table from a CSV file, also returning row counters
    pub fn load_with_stats<P: AsRef<Path>>(path: P) -> Result<(Self, LoadStats)> {
        let path = path.as_ref();
        let lookup_err = |source| Error::LookupTable {
            path: path.to_path_buf(),
            source,
        };

        let reader = csv_reader().from_path(path).map_err(lookup_err)?;
        let (table, stats) = Self::load_records(reader).map_err(lookup_err)?;

        info!(
            "Loaded {} lookup entries from {}",
            table.len(),
            path.display()
        );
        debug!(
            "Lookup table rows: read={}, loaded={}, skipped={}",
            stats.rows_read, stats.rows_loaded, stats.rows_skipped
        );

        Ok((table, stats))
    }

    /// Load a lookup table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> csv::Result<Self> {
        Self::load_records(csv_reader().from_reader(reader)).map(|(table, _)| table)
    }

    fn load_records<R: Read>(mut reader: csv::Reader<R>) -> csv::Result<(Self, LoadStats)> {
        let columns = Columns::resolve(reader.headers()?);
        let mut table = Self::new();
        let mut stats = LoadStats::default();

        for record in reader.records() {
            let record = record?;
            stats.rows_read += 1;

            match columns.and_then(|c| c.parse_row(&record)) {
                Some((key, tag)) => {
                    table.insert(key, tag);
                    stats.rows_loaded += 1;
                }
                None => stats.rows_skipped += 1,
            }
        }

        Ok((table, stats))
    }

    /// Insert a tag, replacing and returning any previous tag for the key
    pub fn insert(&mut self, key: LookupKey, tag: String) -> Option<String> {
        self.entries.insert(key, tag)
    }

    pub fn get(&self, key: &LookupKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Tag for a port/protocol pair, or [`UNTAGGED`] when there is no match
    pub fn tag_for(&self, dst_port: u16, protocol: i64) -> &str {
        self.get(&LookupKey::new(dst_port, protocol))
            .unwrap_or(UNTAGGED)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LookupKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl FromIterator<(LookupKey, String)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (LookupKey, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn csv_reader() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

/// Positions of the required columns within a row
#[derive(Debug, Clone, Copy)]
struct Columns {
    dstport: usize,
    protocol: usize,
    tag: usize,
}

impl Columns {
    /// Returns `None` when any required column is missing from the header,
    /// in which case every row is skipped.
    fn resolve(headers: &StringRecord) -> Option<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };

        Some(Self {
            dstport: position(DSTPORT_COLUMN)?,
            protocol: position(PROTOCOL_COLUMN)?,
            tag: position(TAG_COLUMN)?,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Option<(LookupKey, String)> {
        let dst_port = record.get(self.dstport)?.trim().parse::<u16>().ok()?;
        let protocol = protocol_number(record.get(self.protocol)?)?;
        let tag = record.get(self.tag)?.trim().to_string();

        Some((LookupKey::new(dst_port, protocol), tag))
    }
}
