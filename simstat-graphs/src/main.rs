//! Creates charts from simulator statistics

// Modules
mod args;
mod chart;
mod plots;

// Imports
use {self::args::Args, clap::Parser, simstat_util::logger};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Then check the sub-command
	match &args.sub_cmd {
		args::SubCmd::MissBreakdown(sub_cmd) => plots::miss_breakdown(sub_cmd)?,
		args::SubCmd::MissBreakdownPct(sub_cmd) => plots::miss_breakdown_pct(sub_cmd)?,
		args::SubCmd::Ipc(sub_cmd) => plots::ipc(sub_cmd)?,
	}

	Ok(())
}
