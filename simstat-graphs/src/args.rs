//! Arguments

// Imports
use {
	simstat::{stat_file, LabelMatch},
	std::{num::NonZeroUsize, path::PathBuf},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	#[clap(name = "miss-breakdown")]
	MissBreakdown(MissBreakdown),

	#[clap(name = "miss-breakdown-pct")]
	MissBreakdownPct(MissBreakdownPct),

	#[clap(name = "ipc")]
	Ipc(Ipc),
}

/// Creates a stacked chart of the capacity, compulsory and conflict misses
/// of every benchmark under every configuration
#[derive(Debug, clap::Args)]
pub struct MissBreakdown {
	/// Experiment
	#[clap(flatten)]
	pub experiment: Experiment,
}

/// Creates a grouped, stacked chart of the miss type percentages of every
/// benchmark, with one bar per configuration
#[derive(Debug, clap::Args)]
pub struct MissBreakdownPct {
	/// Experiment
	#[clap(flatten)]
	pub experiment: Experiment,
}

/// Creates grouped charts of the ipc and data cache miss ratio of every
/// benchmark, with one bar per configuration
#[derive(Debug, clap::Args)]
pub struct Ipc {
	/// Experiment
	#[clap(flatten)]
	pub experiment: Experiment,

	/// Benchmarks per chart
	#[clap(long = "benchmarks-per-plot", default_value = "8")]
	pub benchmarks_per_plot: NonZeroUsize,

	/// Maximum of the ipc axis
	#[clap(long = "ipc-y-max")]
	pub ipc_y_max: Option<f64>,

	/// Maximum of the miss ratio axis
	#[clap(long = "miss-ratio-y-max")]
	pub miss_ratio_y_max: Option<f64>,
}

/// Experiment
#[derive(Debug, clap::Args)]
pub struct Experiment {
	/// Output directory for the charts
	#[clap(short = 'o', long = "output_dir", visible_alias = "output-dir")]
	pub output_dir: PathBuf,

	/// Experiment descriptor
	#[clap(short = 'd', long = "descriptor_name", visible_alias = "descriptor")]
	pub descriptor: PathBuf,

	/// Simulation results directory
	#[clap(short = 's', long = "simulation_path", visible_alias = "simulation-path")]
	pub simulation_path: PathBuf,

	/// Statistics file name within each result directory
	#[clap(long = "stat-file", default_value = stat_file::DEFAULT_FILE_NAME)]
	pub stat_file: String,

	/// How statistics labels are matched, `exact` or `substring`
	#[clap(long = "label-match", default_value_t = LabelMatch::Exact)]
	pub label_match: LabelMatch,

	/// Write `gnuplot` scripts instead of rendering pdfs
	#[clap(long = "script-only")]
	pub script_only: bool,
}
