use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use flowtag::config::Config;
use flowtag::generator::FlowLogGenerator;
use flowtag::{AnalysisResult, FlowTagger};

#[derive(Parser)]
#[command(name = "flowtag")]
#[command(author, version, about = "Tag flow log records and count tag / port-protocol frequencies")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag a flow log and write the frequency report
    Analyze {
        /// Lookup table CSV (dstport,protocol,tag)
        #[arg(short, long)]
        lookup: Option<PathBuf>,

        /// Flow log to analyze
        #[arg(short, long)]
        flow_log: Option<PathBuf>,

        /// Report output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print both distributions as tables
        #[arg(short, long)]
        summary: bool,
    },

    /// Generate a random flow log for testing
    Generate {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target file size in megabytes
        #[arg(short, long)]
        size_mb: Option<u64>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate default configuration file
    GenConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Table row for tag frequencies
#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Count")]
    count: u64,
}

/// Table row for port/protocol frequencies
#[derive(Tabled)]
struct PortProtocolRow {
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Count")]
    count: u64,
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

pub fn run_command(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            lookup,
            flow_log,
            output,
            summary,
        } => cmd_analyze(config, lookup, flow_log, output, summary),
        Commands::Generate {
            output,
            size_mb,
            seed,
        } => cmd_generate(config, output, size_mb, seed),
        Commands::GenConfig { output } => cmd_gen_config(output),
    }
}

fn cmd_analyze(
    mut config: Config,
    lookup: Option<PathBuf>,
    flow_log: Option<PathBuf>,
    output: Option<PathBuf>,
    summary: bool,
) -> Result<()> {
    if let Some(path) = lookup {
        config.paths.lookup_table = path;
    }
    if let Some(path) = flow_log {
        config.paths.flow_logs = path;
    }
    if let Some(path) = output {
        config.paths.output = path;
    }

    let run = FlowTagger::new(config.paths).run()?;

    if summary {
        print_summary(&run.result);
    }

    Ok(())
}

fn print_summary(result: &AnalysisResult) {
    let tag_rows: Vec<TagRow> = result
        .tag_frequencies
        .iter()
        .map(|(tag, &count)| TagRow {
            tag: tag.clone(),
            count,
        })
        .collect();

    let port_rows: Vec<PortProtocolRow> = result
        .port_protocol_frequencies
        .iter()
        .map(|(key, &count)| PortProtocolRow {
            port: key.port,
            protocol: key.protocol.to_string(),
            count,
        })
        .collect();

    println!("{}", "Tag Frequencies".bold());
    println!("{}", Table::new(tag_rows));
    println!();
    println!("{}", "Port/Protocol Combination Frequencies".bold());
    println!("{}", Table::new(port_rows));
    println!();
    println!(
        "Records counted: {}  Lines skipped: {}",
        result.stats.records_counted.to_string().cyan(),
        result.stats.lines_skipped.to_string().yellow()
    );
}

fn cmd_generate(
    config: Config,
    output: Option<PathBuf>,
    size_mb: Option<u64>,
    seed: Option<u64>,
) -> Result<()> {
    let output = output.unwrap_or(config.generator.output);
    let size_mb = size_mb.unwrap_or(config.generator.size_mb);

    let stats = match seed.or(config.generator.seed) {
        Some(seed) => FlowLogGenerator::with_seed(seed).write_file(&output, size_mb)?,
        None => FlowLogGenerator::new().write_file(&output, size_mb)?,
    };

    println!(
        "{} {} ({} entries)",
        "Generated:".green().bold(),
        output.display(),
        stats.entries
    );

    Ok(())
}

fn cmd_gen_config(output: Option<PathBuf>) -> Result<()> {
    let config = Config::default();
    let toml_str = config.to_toml()?;

    match output {
        Some(path) => {
            std::fs::write(&path, &toml_str)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Configuration written to {}", path.display());
        }
        None => {
            println!("{}", toml_str);
        }
    }

    Ok(())
}
