//! Flow log tagging and frequency statistics.
//!
//! A run loads a lookup table of `(dstport, protocol) → tag` rules, streams a
//! flow log through [`analyzer::FlowLogAnalyzer`] and writes two frequency
//! distributions with [`report::write_report_file`].

pub mod analyzer;
pub mod config;
pub mod error;
pub mod generator;
pub mod lookup;
pub mod protocol;
pub mod report;

use std::path::PathBuf;

use tracing::debug;

pub use analyzer::{AnalysisResult, AnalysisStats, FlowLogAnalyzer, FlowRecord, PortProtocol};
pub use config::{Config, PathsConfig};
pub use error::{Error, Result};
pub use lookup::{LookupKey, LookupTable, UNTAGGED};

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub lookup_entries: usize,
    pub stats: AnalysisStats,
    pub output: PathBuf,
    pub result: AnalysisResult,
}

/// Load → analyze → report pipeline over a fixed set of paths
pub struct FlowTagger {
    paths: PathsConfig,
}

impl FlowTagger {
    pub fn new(paths: PathsConfig) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    /// Run the whole pipeline.
    ///
    /// The lookup table is loaded completely before the flow log is opened,
    /// so a bad lookup path fails without touching the flow log.
    pub fn run(&self) -> Result<RunSummary> {
        let lookup = LookupTable::from_path(&self.paths.lookup_table)?;
        if lookup.is_empty() {
            debug!("Lookup table is empty, every record will be {}", UNTAGGED);
        }

        let result = analyzer::analyze_flow_log(&self.paths.flow_logs, &lookup)?;
        report::write_report_file(&self.paths.output, &result)?;

        Ok(RunSummary {
            lookup_entries: lookup.len(),
            stats: result.stats,
            output: self.paths.output.clone(),
            result,
        })
    }
}
