//! Charts of each sub-command
//!
//! Failing to load the descriptor is an error, but failing to create a single
//! chart only skips that chart.

// Imports
use {
	crate::{
		args,
		chart::{Chart, ChartOutput, ChartStyle},
	},
	anyhow::Context,
	itertools::Itertools,
	simstat::{aggregate, Descriptor, ResultTree},
	std::{fs, path::PathBuf},
};

/// Stacked miss breakdown chart name
pub const MISS_BREAKDOWN: &str = "DCACHE_MISS_STACKED";

/// Grouped miss breakdown percentage chart name
pub const MISS_BREAKDOWN_PCT: &str = "DCACHE_MISS_STACKED_RATIO";

/// Ipc chart name prefix
pub const IPC: &str = "IPC_plot";

/// Miss ratio chart name prefix
pub const DCACHE_MISS_RATIO: &str = "Dcache_Miss_Ratio_plot";

/// Loaded experiment
struct LoadedExperiment<'a> {
	args:       &'a args::Experiment,
	descriptor: Descriptor,
	output:     ChartOutput,
}

impl<'a> LoadedExperiment<'a> {
	/// Loads the descriptor and creates the output directory
	fn load(args: &'a args::Experiment) -> Result<Self, anyhow::Error> {
		let descriptor = Descriptor::from_path(&args.descriptor).context("Unable to load experiment descriptor")?;
		fs::create_dir_all(&args.output_dir)
			.with_context(|| format!("Unable to create output directory {:?}", args.output_dir))?;

		let output = if args.script_only {
			ChartOutput::Script
		} else {
			ChartOutput::Pdf
		};

		Ok(Self {
			args,
			descriptor,
			output,
		})
	}

	/// Returns the result tree
	fn tree(&self) -> ResultTree<'_> {
		ResultTree {
			descriptor:     &self.descriptor,
			sim_path:       &self.args.simulation_path,
			stat_file_name: &self.args.stat_file,
			label_match:    self.args.label_match,
		}
	}

	/// Returns the output path of chart `name`
	fn chart_path(&self, name: &str) -> PathBuf {
		self.output.path(&self.args.output_dir, name)
	}
}

/// Charts the miss breakdown of every benchmark under every configuration.
///
/// If any statistics can't be read, the chart is skipped.
pub fn miss_breakdown(args: &args::MissBreakdown) -> Result<(), anyhow::Error> {
	let experiment = LoadedExperiment::load(&args.experiment)?;

	let res = chart_miss_breakdown(&experiment);
	skip_on_err(MISS_BREAKDOWN, res);

	Ok(())
}

fn chart_miss_breakdown(experiment: &LoadedExperiment) -> Result<(), anyhow::Error> {
	let series = experiment
		.tree()
		.miss_breakdown_flat()
		.context("Unable to aggregate miss breakdown")?;
	tracing::debug!(
		labels = %series.labels.iter().join(", "),
		series = ?series.series,
		"Aggregated miss breakdown"
	);

	let chart = Chart {
		title:   None,
		y_label: "DCACHE Miss Breakdown",
		y_range: None,
		style:   ChartStyle::stacked(),
		output:  experiment.output,
	};
	chart
		.render_stacked(&series.labels, &series.series, &experiment.chart_path(MISS_BREAKDOWN))
		.context("Unable to render miss breakdown")
}

/// Charts the miss type percentages of every benchmark, grouped by configuration.
///
/// If any statistics can't be read, or lack a percentage, the chart is skipped.
pub fn miss_breakdown_pct(args: &args::MissBreakdownPct) -> Result<(), anyhow::Error> {
	let experiment = LoadedExperiment::load(&args.experiment)?;

	let res = chart_miss_breakdown_pct(&experiment);
	skip_on_err(MISS_BREAKDOWN_PCT, res);

	Ok(())
}

fn chart_miss_breakdown_pct(experiment: &LoadedExperiment) -> Result<(), anyhow::Error> {
	let mut series = experiment
		.tree()
		.miss_breakdown_grouped()
		.context("Unable to aggregate miss breakdown percentages")?;
	tracing::debug!(
		labels = %series.labels.iter().join(", "),
		configurations = %series.configurations.iter().join(", "),
		series = ?series.series,
		"Aggregated miss breakdown percentages"
	);

	// Stack conflict misses between capacity and compulsory misses
	let stack_order = [aggregate::CAPACITY_MISS, aggregate::CONFLICT_MISS, aggregate::COMPULSORY_MISS];
	series.series.sort_by_key(|series| {
		stack_order
			.iter()
			.position(|&name| name == series.name)
			.unwrap_or(stack_order.len())
	});

	let chart = Chart {
		title:   Some("DCache Miss Type Ratios (Stacked)"),
		y_label: "DCACHE Miss Type Percent",
		y_range: None,
		style:   ChartStyle::grouped_stacked(),
		output:  experiment.output,
	};
	chart
		.render_grouped_stacked(
			&series.labels,
			&series.configurations,
			&series.series,
			&experiment.chart_path(MISS_BREAKDOWN_PCT),
		)
		.context("Unable to render miss breakdown percentages")
}

/// Charts the ipc and data cache miss ratio of every benchmark, grouped by configuration.
///
/// Benchmarks are split over multiple charts, each ending with the average of each
/// configuration. Benchmarks whose statistics can't be read are left out.
pub fn ipc(args: &args::Ipc) -> Result<(), anyhow::Error> {
	let experiment = LoadedExperiment::load(&args.experiment)?;

	let series = experiment.tree().ipc_by_configuration();
	for plot in series.plots(args.benchmarks_per_plot.get()) {
		tracing::debug!(
			number = plot.number,
			labels = %plot.labels.iter().join(", "),
			ipc = ?plot.ipc,
			dcache_miss_ratio = ?plot.dcache_miss_ratio,
			"Ipc plot"
		);

		let ipc_name = format!("{IPC}_{}", plot.number);
		let ipc_chart = Chart {
			title:   None,
			y_label: "IPC",
			y_range: args.ipc_y_max.map(|max| (0.0, max)),
			style:   ChartStyle::grouped(),
			output:  experiment.output,
		};
		let res = ipc_chart
			.render_grouped(&plot.labels, &plot.ipc, &experiment.chart_path(&ipc_name))
			.context("Unable to render ipc");
		skip_on_err(&ipc_name, res);

		let miss_ratio_name = format!("{DCACHE_MISS_RATIO}_{}", plot.number);
		let miss_ratio_chart = Chart {
			title:   None,
			y_label: "Dcache Miss Ratio",
			y_range: args.miss_ratio_y_max.map(|max| (0.0, max)),
			style:   ChartStyle::grouped(),
			output:  experiment.output,
		};
		let res = miss_ratio_chart
			.render_grouped(
				&plot.labels,
				&plot.dcache_miss_ratio,
				&experiment.chart_path(&miss_ratio_name),
			)
			.context("Unable to render data cache miss ratio");
		skip_on_err(&miss_ratio_name, res);
	}

	Ok(())
}

/// Logs `res`'s error, if any, as skipping chart `name`
fn skip_on_err(name: &str, res: Result<(), anyhow::Error>) {
	if let Err(err) = res {
		tracing::error!(chart = name, "Skipping chart: {err:#}");
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		simstat::stat_file,
		std::{num::NonZeroUsize, path::Path},
	};

	/// Writes a descriptor and one statistics file per `(benchmark, configuration, lines)`
	fn write_experiment(dir: &Path, descriptor: &str, experiment: &str, stats: &[(&str, &str, &[&str])]) {
		fs::write(dir.join("descriptor.json"), descriptor).expect("Unable to write descriptor");

		for (benchmark, configuration, lines) in stats {
			let result_dir = dir.join("sim").join(benchmark).join(experiment).join(configuration);
			fs::create_dir_all(&result_dir).expect("Unable to create result directory");
			fs::write(result_dir.join(stat_file::DEFAULT_FILE_NAME), lines.join("\n"))
				.expect("Unable to write statistics");
		}
	}

	fn experiment_args(dir: &Path, script_only: bool) -> args::Experiment {
		args::Experiment {
			output_dir: dir.join("plots"),
			descriptor: dir.join("descriptor.json"),
			simulation_path: dir.join("sim"),
			stat_file: stat_file::DEFAULT_FILE_NAME.to_owned(),
			label_match: simstat::LabelMatch::Exact,
			script_only,
		}
	}

	/// Reads a chart script, which contains binary plot data
	fn read_script(path: &Path) -> String {
		let script = fs::read(path).expect("Unable to read chart script");
		String::from_utf8_lossy(&script).into_owned()
	}

	/// Returns if `gnuplot` is available to render pdfs
	fn has_gnuplot() -> bool {
		std::process::Command::new("gnuplot")
			.arg("--version")
			.output()
			.is_ok_and(|output| output.status.success())
	}

	const SINGLE_DESCRIPTOR: &str = r#"{"experiment":"e1","workloads_list":["b1/x"],"configurations":{"c1":{}}}"#;
	const SINGLE_STATS: &[&str] = &["DCACHE_MISS,100", "DCACHE_MISS_CAPACITY,40", "DCACHE_MISS_COMPULSORY,30"];

	#[test]
	fn miss_breakdown_writes_script() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		write_experiment(dir.path(), SINGLE_DESCRIPTOR, "e1", &[("b1/x", "c1", SINGLE_STATS)]);

		miss_breakdown(&args::MissBreakdown {
			experiment: experiment_args(dir.path(), true),
		})
		.expect("Unable to chart miss breakdown");

		let script = read_script(&dir.path().join("plots").join("DCACHE_MISS_STACKED.gp"));
		assert!(script.contains("b1-c1"), "Script:\n{script}");
		assert!(script.contains("Conflict Miss"), "Script:\n{script}");
	}

	#[test]
	fn miss_breakdown_writes_pdf() {
		if !has_gnuplot() {
			eprintln!("`gnuplot` not found, skipping");
			return;
		}

		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		write_experiment(dir.path(), SINGLE_DESCRIPTOR, "e1", &[("b1/x", "c1", SINGLE_STATS)]);

		miss_breakdown(&args::MissBreakdown {
			experiment: experiment_args(dir.path(), false),
		})
		.expect("Unable to chart miss breakdown");

		let pdf = fs::read(dir.path().join("plots").join("DCACHE_MISS_STACKED.pdf")).expect("Unable to read chart");
		assert!(pdf.starts_with(b"%PDF"));
	}

	#[test]
	fn missing_descriptor_errors() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		miss_breakdown(&args::MissBreakdown {
			experiment: experiment_args(dir.path(), true),
		})
		.expect_err("Charted without a descriptor");
	}

	#[test]
	fn missing_stats_skip_chart() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		write_experiment(dir.path(), SINGLE_DESCRIPTOR, "e1", &[]);

		miss_breakdown_pct(&args::MissBreakdownPct {
			experiment: experiment_args(dir.path(), true),
		})
		.expect("Missing statistics weren't skipped");
		assert!(!dir.path().join("plots").join("DCACHE_MISS_STACKED_RATIO.gp").exists());
	}

	#[test]
	fn ipc_writes_chart_per_plot() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let stats: &[&str] = &["Periodic IPC, 1.5", "DCACHE_MISSES, 10", "DCACHE_ACCESSES, 100"];
		write_experiment(
			dir.path(),
			r#"{"experiment":"e","workloads_list":["a/x","b/x","c/x"],"configurations":{"base":{},"fast":{}}}"#,
			"e",
			&[
				("a/x", "base", stats),
				("b/x", "base", stats),
				("c/x", "base", stats),
				("a/x", "fast", stats),
				("c/x", "fast", stats),
			],
		);

		ipc(&args::Ipc {
			experiment:          experiment_args(dir.path(), true),
			benchmarks_per_plot: NonZeroUsize::new(2).expect("Non-zero"),
			ipc_y_max:           None,
			miss_ratio_y_max:    Some(1.0),
		})
		.expect("Unable to chart ipc");

		let plots = dir.path().join("plots");
		for name in ["IPC_plot_1", "IPC_plot_2", "Dcache_Miss_Ratio_plot_1", "Dcache_Miss_Ratio_plot_2"] {
			let path = plots.join(format!("{name}.gp"));
			assert!(path.exists(), "Missing chart {path:?}");
		}
		assert!(!plots.join("IPC_plot_3.gp").exists());

		let script = read_script(&plots.join("IPC_plot_2.gp"));
		assert!(script.contains("Avg"), "Script:\n{script}");
	}
}
