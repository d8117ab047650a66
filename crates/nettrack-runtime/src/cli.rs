//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "nettrack",
    about = "Log when a device joins or leaves the local network"
)]
pub struct Cli {
    /// Device identifier as reported by nmap, or an alias from the config file
    pub device: String,

    /// Seconds to sleep between probes
    pub poll_secs: u64,

    /// Human-readable name used for the log file (default: the device argument)
    pub alias: Option<String>,

    /// TOML config file with device aliases and tuning
    #[arg(long, short = 'c', env = "NETTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the CSV log; also the git working tree when publishing
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Subnet passed to `nmap -sn`
    #[arg(long)]
    pub subnet: Option<String>,

    /// nmap binary
    #[arg(long)]
    pub nmap_bin: Option<String>,

    /// Absent probes needed to confirm a disconnect
    #[arg(long)]
    pub confirm_attempts: Option<u32>,

    /// Seconds between confirmation probes
    #[arg(long)]
    pub confirm_interval_secs: Option<u64>,

    /// A disconnect must last longer than this to be logged as a reconnect
    #[arg(long)]
    pub reconnect_threshold_secs: Option<u64>,

    /// Only write the CSV log; skip git commit/push
    #[arg(long)]
    pub no_publish: bool,

    /// Git remote to push to
    #[arg(long)]
    pub remote: Option<String>,

    /// Git branch to push
    #[arg(long)]
    pub branch: Option<String>,
}
