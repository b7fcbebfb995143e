//! Report writer
//!
//! Two CSV-like sections separated by a blank line. Section titles and
//! column order are read by downstream tooling and must stay fixed:
//!
//! ```text
//! Tag Frequencies:
//! Tag,Count
//! <tag>,<count>
//!
//! Port/Protocol Combination Frequencies:
//! Port,Protocol,Count
//! <port>,<protocol>,<count>
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::analyzer::AnalysisResult;
use crate::error::{Error, Result};

pub const TAG_SECTION_TITLE: &str = "Tag Frequencies:";
pub const TAG_SECTION_HEADER: &str = "Tag,Count";
pub const PORT_PROTOCOL_SECTION_TITLE: &str = "Port/Protocol Combination Frequencies:";
pub const PORT_PROTOCOL_SECTION_HEADER: &str = "Port,Protocol,Count";

/// Write the report to any writer, in the iteration order of the result maps
pub fn write_report<W: Write>(writer: &mut W, result: &AnalysisResult) -> std::io::Result<()> {
    writeln!(writer, "{}", TAG_SECTION_TITLE)?;
    writeln!(writer, "{}", TAG_SECTION_HEADER)?;
    for (tag, count) in &result.tag_frequencies {
        writeln!(writer, "{},{}", tag, count)?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", PORT_PROTOCOL_SECTION_TITLE)?;
    writeln!(writer, "{}", PORT_PROTOCOL_SECTION_HEADER)?;
    for (key, count) in &result.port_protocol_frequencies {
        writeln!(writer, "{},{},{}", key.port, key.protocol, count)?;
    }

    Ok(())
}

/// Write the report to a file, replacing any existing content.
///
/// The parent directory must already exist.
pub fn write_report_file<P: AsRef<Path>>(path: P, result: &AnalysisResult) -> Result<()> {
    let path = path.as_ref();
    let report_err = |source| Error::Report {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(report_err)?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, result).map_err(report_err)?;
    writer.flush().map_err(report_err)?;

    info!("Results written to {}", path.display());
    Ok(())
}
