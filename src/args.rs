use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::duration::parse_duration;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Measure round-trip latency to every peer, starting at an agreed wall-clock instant",
    name = "allping"
)]
pub struct Args {
    /// Start time in seconds since the Unix epoch, shared by all participants
    #[arg()]
    pub start_time: u64,

    /// Index of this participant
    #[arg()]
    pub self_id: usize,

    /// Number of peer addresses to read
    #[arg()]
    pub peers: usize,

    /// File with one peer address per line (default: standard input)
    #[arg(short = 'f', long)]
    pub addresses: Option<PathBuf>,

    /// Delay between activating successive peers, e.g. "100ms"
    #[arg(short, long, value_parser = parse_duration)]
    pub stagger: Option<Duration>,

    /// Keep sockets registered for writability at all times (lower latency, spins the CPU)
    #[arg(short, long)]
    pub busy_wait: bool,

    /// UDP port of peer 0; peer i listens on base-port + i
    #[arg(short = 'p', long, default_value_t = 34567)]
    pub base_port: u16,

    /// Time allowed after the start instant before giving up
    #[arg(short = 'w', long, default_value = "5s", value_parser = parse_duration)]
    pub grace: Duration,

    /// Interval between progress reports on stderr
    #[arg(short, long, default_value = "2s", value_parser = parse_duration)]
    pub report_interval: Duration,

    /// Output format of the final report
    #[arg(long, default_value = "text")]
    pub summary: SummaryFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
