//! Command-line argument parsing for sdgprogress
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::errors::Result;
use crate::types::{CountryCode, DataSource, YearRange};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// sdgprogress - Track country progress toward the Sustainable Development Goals
#[derive(Parser, Debug)]
#[command(name = "sdgprogress")]
#[command(version)]
#[command(about = "Track country progress toward the 2030 SDG targets", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// List the 17 goals with indicator counts
    Goals,

    /// List catalogue indicators for a goal
    Indicators {
        /// Goal number (1-17)
        #[arg(short, long)]
        goal: u8,
    },

    /// Quick status of every indicator in a goal for the focus country and peers
    Status {
        /// Goal number (1-17)
        #[arg(short, long)]
        goal: u8,

        /// Focus country (ISO3); overrides the configured one
        #[arg(long)]
        focus: Option<String>,

        /// Peer preset (SAARC, BRICS, "G20 sample")
        #[arg(long)]
        preset: Option<String>,

        /// Extra peers, comma separated ISO3 codes
        #[arg(long)]
        peers: Option<String>,

        /// Baseline policy year
        #[arg(long)]
        baseline: Option<i32>,
    },

    /// Per-country series for one indicator
    Series {
        /// Indicator code, e.g. SH.STA.MMRT
        #[arg(short, long)]
        indicator: String,

        /// Focus country (ISO3); overrides the configured one
        #[arg(long)]
        focus: Option<String>,

        /// Peer preset
        #[arg(long)]
        preset: Option<String>,

        /// Extra peers, comma separated ISO3 codes
        #[arg(long)]
        peers: Option<String>,

        /// First year (default 2000)
        #[arg(long)]
        from: Option<i32>,

        /// Last year (default current year)
        #[arg(long)]
        to: Option<i32>,

        /// Add a 3-year rolling mean column
        #[arg(long)]
        smooth: bool,

        /// Data source for a code missing from the catalogue (world-bank, un-sdg)
        #[arg(long)]
        source: Option<DataSource>,
    },

    /// Show source metadata for an indicator
    Define {
        /// Indicator code
        #[arg(short, long)]
        indicator: String,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log level for this verbosity; `Normal` keeps the configured level
    pub fn log_level(&self, configured: Level) -> Level {
        match self {
            Verbosity::Quiet => Level::ERROR,
            Verbosity::Normal => configured,
            Verbosity::Verbose => Level::DEBUG,
            Verbosity::VeryVerbose => Level::TRACE,
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

/// Parse a year range from optional bounds, defaulting to 2000..=current year
pub fn year_range(from: Option<i32>, to: Option<i32>) -> Result<YearRange> {
    let default = YearRange::default_window();
    YearRange::new(from.unwrap_or(default.start), to.unwrap_or(default.end))
}

/// Parse an optional comma separated peer list
pub fn peer_list(peers: Option<&str>) -> Result<Vec<CountryCode>> {
    match peers {
        Some(list) => CountryCode::parse_list(list),
        None => Ok(Vec::new()),
    }
}
