// Command line argument parser using clap for glovetrace

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::Hand;

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct GloveArgs {
    #[command(subcommand)]
    pub command: CommandTask,

    /// JSON settings file; every key is optional
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Root folder holding <user>/<session>/<gesture>.json
    #[arg(short = 'd', long = "data-root", global = true)]
    pub data_root: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// List users with their session and gesture counts
    Users,

    /// List a user's sessions, newest name first
    Sessions { user: String },

    /// List the gesture files of one session
    Gestures { user: String, session: String },

    /// Render the six per-finger figures of recordings
    Plot(PlotCommand),

    /// Compare one column range across 2 or 4 recordings
    Compare(CompareCommand),

    /// Compare all twelve 3-column ranges across 2 or 4 recordings
    CompareBatch(BatchCommand),

    /// Write a recording as an aligned CSV table
    ExportCsv(ExportCommand),

    /// Capture gestures from two simulated gloves
    Simulate(SimulateCommand),
}

#[derive(Debug, Args, Clone)]
pub struct PlotCommand {
    /// Recording files to plot
    #[clap(num_args = 0..)]
    pub files: Vec<PathBuf>,

    /// Plot every gesture of this user's session instead
    #[arg(long, num_args = 2, value_names = ["USER", "SESSION"])]
    pub session: Option<Vec<String>>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareCommand {
    #[arg(long, default_value = "Right")]
    pub hand: Hand,

    /// First column, 1-based
    #[arg(short = 's', long = "start")]
    pub start: usize,

    /// Last column, inclusive
    #[arg(short = 'e', long = "end")]
    pub end: usize,

    #[arg(short = 'o', long = "out", default_value = "plots/comparisons")]
    pub out: PathBuf,

    /// Two or four recording files
    #[clap(num_args = 2..=4, required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchCommand {
    #[arg(long, default_value = "Right")]
    pub hand: Hand,

    #[arg(short = 'o', long = "out", default_value = "plots/comparisons")]
    pub out: PathBuf,

    #[clap(num_args = 2..=4, required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportCommand {
    pub file: PathBuf,

    /// Defaults to the recording path with a .csv extension
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateCommand {
    #[arg(short = 'u', long = "user")]
    pub user: String,

    #[arg(short = 's', long = "session")]
    pub session: String,

    /// Number of gestures to record
    #[arg(short = 'n', long = "gestures", default_value_t = 1)]
    pub gestures: usize,

    /// Recording length of each gesture
    #[arg(long = "duration-ms", default_value_t = 2000)]
    pub duration_ms: u64,

    /// Custom gesture name; timestamp names are used otherwise
    #[arg(short = 'l', long = "label")]
    pub label: Option<String>,

    /// Discovered glove (1-based) to use as the left hand
    #[arg(long = "left", default_value_t = 1)]
    pub left: usize,

    /// Discovered glove (1-based) to use as the right hand
    #[arg(long = "right", default_value_t = 2)]
    pub right: usize,

    /// Keep live per-finger PNGs updated in this folder
    #[arg(long = "live-dir")]
    pub live_dir: Option<PathBuf>,
}
