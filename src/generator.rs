//! Synthetic flow log generation
//!
//! Produces random records in the same 14-field layout the analyzer reads,
//! for load testing and demos.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::Ipv4Addr;
use std::path::Path;

use chrono::Utc;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{Error, Result};

const VERSION: &str = "2";
const ACCOUNT_ID: &str = "123456789012";
const ENI_ID: &str = "eni-0a1b2c3d";
const LOG_STATUS: &str = "OK";

/// ICMP, TCP, UDP
const PROTOCOLS: [u8; 3] = [1, 6, 17];
const ACTIONS: [&str; 2] = ["ACCEPT", "REJECT"];

/// Maximum age of a generated record's start time, in seconds
const MAX_FLOW_AGE_SECS: i64 = 10_000;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Summary of a generated file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub entries: u64,
    pub bytes: u64,
}

/// Random flow log record generator
pub struct FlowLogGenerator<R: Rng = ThreadRng> {
    rng: R,
}

impl FlowLogGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for FlowLogGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowLogGenerator<StdRng> {
    /// Reproducible generator for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> FlowLogGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One newline-terminated record, timestamped relative to now
    pub fn entry(&mut self) -> String {
        self.entry_at(Utc::now().timestamp())
    }

    /// One newline-terminated record with `end_time` set to `now`
    pub fn entry_at(&mut self, now: i64) -> String {
        let src_addr = self.random_ip();
        let dst_addr = self.random_ip();
        let src_port: u16 = self.rng.random_range(1..=65535);
        let dst_port: u16 = self.rng.random_range(1..=65535);
        let protocol = PROTOCOLS[self.rng.random_range(0..PROTOCOLS.len())];
        let packets: u32 = self.rng.random_range(1..=10_000);
        let bytes: u32 = self.rng.random_range(1..=1_000_000);
        let start_time = now - self.rng.random_range(0..=MAX_FLOW_AGE_SECS);
        let action = ACTIONS[self.rng.random_range(0..ACTIONS.len())];

        format!(
            "{} {} {} {} {} {} {} {} {} {} {} {} {} {}\n",
            VERSION,
            ACCOUNT_ID,
            ENI_ID,
            src_addr,
            dst_addr,
            src_port,
            dst_port,
            protocol,
            packets,
            bytes,
            start_time,
            now,
            action,
            LOG_STATUS,
        )
    }

    /// Write records to `writer` until at least `target_bytes` have been written
    pub fn write_to<W: Write>(
        &mut self,
        writer: &mut W,
        target_bytes: u64,
    ) -> std::io::Result<GenerateStats> {
        let mut stats = GenerateStats::default();
        while stats.bytes < target_bytes {
            let entry = self.entry();
            writer.write_all(entry.as_bytes())?;
            stats.bytes += entry.len() as u64;
            stats.entries += 1;
        }
        Ok(stats)
    }

    /// Create (or truncate) `path` and fill it with roughly `size_mb` megabytes of records
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P, size_mb: u64) -> Result<GenerateStats> {
        let path = path.as_ref();
        let generate_err = |source| Error::Generate {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(generate_err)?;
        let mut writer = BufWriter::new(file);
        let stats = self
            .write_to(&mut writer, size_mb.saturating_mul(BYTES_PER_MB))
            .map_err(generate_err)?;
        writer.flush().map_err(generate_err)?;

        info!(
            "Flow log file generated at {} ({} entries, {} bytes)",
            path.display(),
            stats.entries,
            stats.bytes
        );
        Ok(stats)
    }

    fn random_ip(&mut self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.rng.random_range(1..=255),
            self.rng.random(),
            self.rng.random(),
            self.rng.random(),
        )
    }
}
