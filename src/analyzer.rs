//! Flow log analyzer
//!
//! Streams a whitespace-delimited flow log line by line, tags each record
//! through the [`LookupTable`] and accumulates two frequency distributions:
//! per tag, and per (destination port, protocol) pair.
//!
//! Record layout (0-based field index):
//! - 6: destination port
//! - 7: protocol number
//!
//! A line needs at least [`MIN_FIELDS`] fields. Short lines and lines whose
//! port or protocol is not an integer are skipped without diagnostics.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::lookup::LookupTable;
use crate::protocol::protocol_display_name;

/// Minimum number of whitespace-separated fields in a valid record
pub const MIN_FIELDS: usize = 14;

const DST_PORT_FIELD: usize = 6;

/// Count of records per tag, in order of first occurrence
pub type TagFrequencies = IndexMap<String, u64>;

/// Count of records per port/protocol pair, in order of first occurrence
pub type PortProtocolFrequencies = IndexMap<PortProtocol, u64>;

/// The fields of a flow log line that drive classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRecord {
    pub dst_port: u16,
    pub protocol: i64,
}

impl FlowRecord {
    /// Parse one flow log line, returning `None` for malformed lines
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();

        let dst_port = fields.nth(DST_PORT_FIELD)?;
        let protocol = fields.next()?;
        if fields.count() < MIN_FIELDS - DST_PORT_FIELD - 2 {
            return None;
        }

        Some(Self {
            dst_port: dst_port.parse().ok()?,
            protocol: protocol.parse().ok()?,
        })
    }
}

/// Destination port paired with the protocol's display name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortProtocol {
    pub port: u16,
    pub protocol: Cow<'static, str>,
}

impl PortProtocol {
    pub fn new(port: u16, protocol: impl Into<Cow<'static, str>>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
        }
    }
}

impl std::fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Line counters gathered while analyzing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub lines_read: u64,
    pub records_counted: u64,
    pub lines_skipped: u64,
}

/// Output of a completed analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub tag_frequencies: TagFrequencies,
    pub port_protocol_frequencies: PortProtocolFrequencies,
    pub stats: AnalysisStats,
}

impl AnalysisResult {
    /// Sum of all tag counts
    pub fn total_tagged(&self) -> u64 {
        self.tag_frequencies.values().sum()
    }

    /// Sum of all port/protocol counts
    pub fn total_port_protocol(&self) -> u64 {
        self.port_protocol_frequencies.values().sum()
    }
}

/// Single-pass accumulator over flow log records
pub struct FlowLogAnalyzer<'a> {
    lookup: &'a LookupTable,
    result: AnalysisResult,
}

impl<'a> FlowLogAnalyzer<'a> {
    pub fn new(lookup: &'a LookupTable) -> Self {
        Self {
            lookup,
            result: AnalysisResult::default(),
        }
    }

    /// Count one record in both distributions
    pub fn record(&mut self, record: &FlowRecord) {
        let key = PortProtocol::new(record.dst_port, protocol_display_name(record.protocol));
        *self.result.port_protocol_frequencies.entry(key).or_insert(0) += 1;

        let tag = self.lookup.tag_for(record.dst_port, record.protocol);
        match self.result.tag_frequencies.get_mut(tag) {
            Some(count) => *count += 1,
            None => {
                self.result.tag_frequencies.insert(tag.to_owned(), 1);
            }
        }

        self.result.stats.records_counted += 1;
    }

    /// Process one raw line. Returns whether it was counted.
    pub fn process_line(&mut self, line: &str) -> bool {
        self.result.stats.lines_read += 1;

        match FlowRecord::parse(line) {
            Some(record) => {
                self.record(&record);
                true
            }
            None => {
                self.result.stats.lines_skipped += 1;
                false
            }
        }
    }

    /// Consume every line of a reader, one line buffered at a time
    pub fn analyze_reader<R: BufRead>(&mut self, mut reader: R) -> std::io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(());
            }
            self.process_line(&line);
        }
    }

    /// Consume a flow log file
    pub fn analyze_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let flow_log_err = |source| Error::FlowLog {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(flow_log_err)?;
        self.analyze_reader(BufReader::new(file))
            .map_err(flow_log_err)?;

        let stats = &self.result.stats;
        info!(
            "Analyzed {} flow records from {}",
            stats.records_counted,
            path.display()
        );
        debug!(
            "Flow log lines: read={}, counted={}, skipped={}",
            stats.lines_read, stats.records_counted, stats.lines_skipped
        );

        Ok(())
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.result.stats
    }

    pub fn finish(self) -> AnalysisResult {
        self.result
    }
}

/// Analyze a flow log file against a lookup table
pub fn analyze_flow_log<P: AsRef<Path>>(path: P, lookup: &LookupTable) -> Result<AnalysisResult> {
    let mut analyzer = FlowLogAnalyzer::new(lookup);
    analyzer.analyze_path(path)?;
    Ok(analyzer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupKey, UNTAGGED};
    use proptest::prelude::*;

    const SAMPLE: &str =
        "2 123456789012 eni-0a1b2c3d 10.0.0.1 10.0.0.2 1234 443 6 10 1500 1000 2000 ACCEPT OK";

    fn web_lookup() -> LookupTable {
        [(LookupKey::new(443, 6), "web".to_string())]
            .into_iter()
            .collect()
    }

    fn analyze(lookup: &LookupTable, input: &str) -> AnalysisResult {
        let mut analyzer = FlowLogAnalyzer::new(lookup);
        analyzer.analyze_reader(input.as_bytes()).unwrap();
        analyzer.finish()
    }

    fn log_line(dst_port: &str, protocol: &str) -> String {
        format!(
            "2 123456789012 eni-0a1b2c3d 10.0.0.1 10.0.0.2 1234 {} {} 10 1500 1000 2000 ACCEPT OK",
            dst_port, protocol
        )
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(
            FlowRecord::parse(SAMPLE),
            Some(FlowRecord {
                dst_port: 443,
                protocol: 6,
            })
        );
    }

    #[test]
    fn test_parse_tolerates_surrounding_and_repeated_whitespace() {
        let line = format!("  {}\t \r\n", SAMPLE.replace(' ', "   "));
        assert_eq!(FlowRecord::parse(&line).map(|r| r.dst_port), Some(443));
    }

    #[test]
    fn test_parse_field_count() {
        let fields: Vec<&str> = SAMPLE.split(' ').collect();
        assert!(FlowRecord::parse(&fields[..13].join(" ")).is_none());
        assert!(FlowRecord::parse(&fields[..8].join(" ")).is_none());
        assert!(FlowRecord::parse("").is_none());

        let extended = format!("{} extra trailing fields", SAMPLE);
        assert!(FlowRecord::parse(&extended).is_some());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(FlowRecord::parse(&log_line("https", "6")).is_none());
        assert!(FlowRecord::parse(&log_line("443", "tcp")).is_none());
        assert!(FlowRecord::parse(&log_line("70000", "6")).is_none());
        assert!(FlowRecord::parse(&log_line("443", "9223372036854775808")).is_none());
    }

    #[test]
    fn test_out_of_registry_protocol_numbers_are_counted() {
        let lookup = web_lookup();
        let input = [log_line("443", "-1"), log_line("443", "4294967296")].join("\n");
        let result = analyze(&lookup, &input);

        assert_eq!(result.stats.records_counted, 2);
        assert_eq!(result.port_protocol_frequencies[&PortProtocol::new(443, "-1")], 1);
        assert_eq!(
            result.port_protocol_frequencies[&PortProtocol::new(443, "4294967296")],
            1
        );
        assert_eq!(result.tag_frequencies[UNTAGGED], 2);
    }

    #[test]
    fn test_tagged_record() {
        let result = analyze(&web_lookup(), SAMPLE);

        assert_eq!(result.tag_frequencies.len(), 1);
        assert_eq!(result.tag_frequencies["web"], 1);
        assert_eq!(result.port_protocol_frequencies.len(), 1);
        assert_eq!(result.port_protocol_frequencies[&PortProtocol::new(443, "tcp")], 1);
    }

    #[test]
    fn test_untagged_record() {
        let result = analyze(&LookupTable::new(), SAMPLE);

        assert_eq!(result.tag_frequencies.len(), 1);
        assert_eq!(result.tag_frequencies[UNTAGGED], 1);
        assert_eq!(result.port_protocol_frequencies[&PortProtocol::new(443, "tcp")], 1);
    }

    #[test]
    fn test_lookup_matches_on_protocol_number() {
        let input = format!("{}\n{}\n", log_line("443", "6"), log_line("443", "17"));
        let result = analyze(&web_lookup(), &input);

        assert_eq!(result.tag_frequencies["web"], 1);
        assert_eq!(result.tag_frequencies[UNTAGGED], 1);
        assert_eq!(result.port_protocol_frequencies[&PortProtocol::new(443, "udp")], 1);
    }

    #[test]
    fn test_unknown_protocol_renders_as_number() {
        let result = analyze(&web_lookup(), &log_line("8080", "255"));

        assert_eq!(result.port_protocol_frequencies[&PortProtocol::new(8080, "255")], 1);
        assert_eq!(result.tag_frequencies[UNTAGGED], 1);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let input = [
            SAMPLE.to_string(),
            "too short".to_string(),
            String::new(),
            log_line("x", "6"),
            log_line("443", "y"),
            SAMPLE.to_string(),
        ]
        .join("\n");
        let result = analyze(&web_lookup(), &input);

        assert_eq!(result.tag_frequencies["web"], 2);
        assert_eq!(
            result.stats,
            AnalysisStats {
                lines_read: 6,
                records_counted: 2,
                lines_skipped: 4,
            }
        );
    }

    #[test]
    fn test_first_occurrence_order() {
        let input = [
            log_line("53", "17"),
            log_line("443", "6"),
            log_line("53", "17"),
            log_line("22", "6"),
        ]
        .join("\n");
        let result = analyze(&web_lookup(), &input);

        let keys: Vec<String> = result
            .port_protocol_frequencies
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["53/udp", "443/tcp", "22/tcp"]);

        let tags: Vec<&str> = result.tag_frequencies.keys().map(String::as_str).collect();
        assert_eq!(tags, vec![UNTAGGED, "web"]);
    }

    fn arb_line() -> impl Strategy<Value = String> {
        prop_oneof![
            (any::<u16>(), prop::sample::select(vec![1i64, 6, 17, 255, -1]))
                .prop_map(|(port, proto)| log_line(&port.to_string(), &proto.to_string())),
            prop::sample::select(vec![443u16, 25, 68])
                .prop_map(|port| log_line(&port.to_string(), "6")),
            "[a-z0-9 ]{0,40}",
        ]
    }

    proptest! {
        #[test]
        fn prop_counter_sums_match_valid_lines(lines in prop::collection::vec(arb_line(), 0..50)) {
            let lookup = web_lookup();
            let result = analyze(&lookup, &lines.join("\n"));
            let valid = lines.iter().filter(|l| FlowRecord::parse(l).is_some()).count() as u64;

            prop_assert_eq!(result.total_tagged(), valid);
            prop_assert_eq!(result.total_port_protocol(), valid);
            prop_assert_eq!(result.stats.records_counted, valid);
        }

        #[test]
        fn prop_short_lines_do_not_affect_counters(
            lines in prop::collection::vec(arb_line(), 0..30),
            short in prop::collection::vec("[a-z0-9]{1,5}( [a-z0-9]{1,5}){0,12}", 0..10),
        ) {
            let lookup = web_lookup();
            let clean = analyze(&lookup, &lines.join("\n"));

            let mut mixed_lines = lines.clone();
            mixed_lines.extend(short);
            let mixed = analyze(&lookup, &mixed_lines.join("\n"));

            let sorted_tags = |m: &TagFrequencies| {
                let mut v: Vec<_> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
                v.sort();
                v
            };
            let sorted_pairs = |m: &PortProtocolFrequencies| {
                let mut v: Vec<_> = m
                    .iter()
                    .map(|(k, v)| (k.port, k.protocol.to_string(), *v))
                    .collect();
                v.sort();
                v
            };
            prop_assert_eq!(sorted_tags(&clean.tag_frequencies), sorted_tags(&mixed.tag_frequencies));
            prop_assert_eq!(
                sorted_pairs(&clean.port_protocol_frequencies),
                sorted_pairs(&mixed.port_protocol_frequencies)
            );
        }
    }
}
