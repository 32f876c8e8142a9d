// Command-line surface. Options and positionals may be interleaved in
// any order; clap resolves positionals by slot.

use crate::models::{Aggregation, Timeframe};
use clap::Parser;

/// Ranked top-N resource usage report for Proxmox VE clusters.
#[derive(Debug, Parser)]
#[command(name = "pvetop", version)]
pub struct Cli {
    /// API endpoint host (host or host:port)
    pub hostname: String,

    /// API auth identity, e.g. root@pam
    pub username: String,

    /// Number of ranked entries per listing
    #[arg(short = 'T', long, default_value_t = 8)]
    pub top: usize,

    /// Historical window to report over
    #[arg(short = 't', long, value_enum, default_value_t = Timeframe::Hour)]
    pub timeframe: Timeframe,

    /// Sample consolidation requested from the API
    #[arg(short = 'g', long, value_enum, default_value_t = Aggregation::Average)]
    pub aggregation: Aggregation,

    /// Match VM name filters as substrings instead of exact names
    #[arg(long)]
    pub partial_match: bool,

    /// Restrict the report to these VM names
    #[arg(value_name = "ONLY_VMS")]
    pub only_vms: Vec<String>,
}
