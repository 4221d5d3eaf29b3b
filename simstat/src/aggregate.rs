//! Aggregation of statistics across benchmarks and configurations

// Imports
use {
	crate::{
		descriptor::{self, Descriptor},
		extract::{self, ExtractError, IpcStats, LabelMatch, MissBreakdown},
		stat_file::{self, StatFileError},
	},
	average::Mean,
	itertools::Itertools,
	std::path::{Path, PathBuf},
};

/// Capacity miss series name
pub const CAPACITY_MISS: &str = "Capacity Miss";

/// Compulsory miss series name
pub const COMPULSORY_MISS: &str = "Compulsory Miss";

/// Conflict miss series name
pub const CONFLICT_MISS: &str = "Conflict Miss";

/// Label of the per-configuration average bar
pub const AVERAGE_LABEL: &str = "Avg";

/// Named series of values
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Series {
	pub name:   String,
	pub values: Vec<f64>,
}

/// Named series of values, with gaps
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SparseSeries {
	pub name:   String,
	pub values: Vec<Option<f64>>,
}

/// Named series of values, grouped per benchmark.
///
/// Each group has one value per configuration.
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GroupedSeries {
	pub name:   String,
	pub groups: Vec<Vec<f64>>,
}

impl GroupedSeries {
	/// Returns the value of each benchmark for configuration `config_idx`
	pub fn configuration(&self, config_idx: usize) -> impl Iterator<Item = f64> + '_ {
		self.groups.iter().map(move |group| group.get(config_idx).copied().unwrap_or(0.0))
	}
}

/// Stacked series, one bar per label
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StackedSeries {
	pub labels: Vec<String>,
	pub series: Vec<Series>,
}

/// Stacked series grouped per benchmark, one bar per configuration
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GroupedStackedSeries {
	pub labels:         Vec<String>,
	pub configurations: Vec<String>,
	pub series:         Vec<GroupedSeries>,
}

/// Ipc statistics of all benchmarks, per configuration
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IpcSeries {
	/// Benchmark display names
	pub benchmarks: Vec<String>,

	/// Statistics of each configuration
	pub configurations: Vec<ConfigurationIpc>,
}

/// Ipc statistics of all benchmarks of a configuration
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ConfigurationIpc {
	pub name: String,

	/// Statistics of each benchmark.
	///
	/// `None` if the statistics couldn't be read.
	pub stats: Vec<Option<IpcStats>>,

	/// Average over all benchmarks with statistics
	pub average: IpcStats,
}

impl IpcSeries {
	/// Splits these statistics into plots of at most `benchmarks_per_plot` benchmarks.
	///
	/// Each plot ends with the average of each configuration, and there's always
	/// at least one plot.
	pub fn plots(&self, benchmarks_per_plot: usize) -> impl Iterator<Item = IpcPlot> + '_ {
		let benchmarks_per_plot = benchmarks_per_plot.max(1);
		let plots_len = self.benchmarks.len().div_ceil(benchmarks_per_plot).max(1);

		(0..plots_len).map(move |plot_idx| {
			let start = plot_idx * benchmarks_per_plot;
			let end = (start + benchmarks_per_plot).min(self.benchmarks.len());

			let labels = self.benchmarks[start..end]
				.iter()
				.cloned()
				.chain([AVERAGE_LABEL.to_owned()])
				.collect();

			let series_with = |get: fn(&IpcStats) -> f64| {
				self.configurations
					.iter()
					.map(|config| SparseSeries {
						name:   config.name.clone(),
						values: config.stats[start..end]
							.iter()
							.map(|stats| stats.as_ref().map(get))
							.chain([Some(get(&config.average))])
							.collect(),
					})
					.collect::<Vec<_>>()
			};

			IpcPlot {
				number: plot_idx + 1,
				labels,
				ipc: series_with(|stats| stats.ipc),
				dcache_miss_ratio: series_with(|stats| stats.dcache_miss_ratio),
			}
		})
	}
}

/// A plot of ipc statistics
#[derive(PartialEq, Clone, Debug)]
pub struct IpcPlot {
	/// Plot number, starting at 1
	pub number: usize,

	/// Benchmark labels, ending in [`AVERAGE_LABEL`]
	pub labels: Vec<String>,

	/// Ipc, one series per configuration
	pub ipc: Vec<SparseSeries>,

	/// Data cache miss ratio, one series per configuration
	pub dcache_miss_ratio: Vec<SparseSeries>,
}

/// Result tree of an experiment
#[derive(Clone, Copy, Debug)]
pub struct ResultTree<'a> {
	/// Experiment descriptor
	pub descriptor: &'a Descriptor,

	/// Simulation results root
	pub sim_path: &'a Path,

	/// Statistics file name in each result directory
	pub stat_file_name: &'a str,

	/// Label matching
	pub label_match: LabelMatch,
}

impl ResultTree<'_> {
	/// Returns the statistics file of `benchmark` under `configuration`
	pub fn stat_file_path(&self, benchmark: &str, configuration: &str) -> PathBuf {
		self.descriptor
			.result_dir(self.sim_path, benchmark, configuration)
			.join(self.stat_file_name)
	}

	/// Reads the statistics of `benchmark` under `configuration` with `extract`
	pub fn read<T>(
		&self,
		benchmark: &str,
		configuration: &str,
		extract: impl FnOnce(&[String], LabelMatch) -> Result<T, ExtractError>,
	) -> Result<T, AggregateError> {
		let path = self.stat_file_path(benchmark, configuration);
		let lines = stat_file::read_lines(&path)?;
		tracing::trace!(?path, lines = lines.len(), "Read statistics file");

		extract(lines.as_slice(), self.label_match).map_err(|source| AggregateError::Extract { path, source })
	}

	/// Aggregates the miss breakdown of every benchmark under every configuration.
	///
	/// Configurations are the outer loop. Each bar is labeled `<benchmark>-<configuration>`.
	pub fn miss_breakdown_flat(&self) -> Result<StackedSeries, AggregateError> {
		let mut labels = vec![];
		let mut capacity = vec![];
		let mut compulsory = vec![];
		let mut conflict = vec![];
		for configuration in self.descriptor.configuration_names() {
			for benchmark in &self.descriptor.workloads_list {
				let breakdown = self.read(benchmark, configuration, |lines, label_match| {
					extract::miss_breakdown(lines, label_match)
				})?;

				labels.push(format!("{}-{configuration}", descriptor::display_name(benchmark)));
				capacity.push(breakdown.capacity);
				compulsory.push(breakdown.compulsory);
				conflict.push(breakdown.conflict);
			}
		}

		tracing::debug!(
			labels = labels.len(),
			capacity = capacity.len(),
			compulsory = compulsory.len(),
			conflict = conflict.len(),
			"Aggregated miss breakdown"
		);

		Ok(StackedSeries {
			labels,
			series: vec![
				Series {
					name:   CAPACITY_MISS.to_owned(),
					values: capacity,
				},
				Series {
					name:   COMPULSORY_MISS.to_owned(),
					values: compulsory,
				},
				Series {
					name:   CONFLICT_MISS.to_owned(),
					values: conflict,
				},
			],
		})
	}

	/// Aggregates the miss breakdown percentages, grouped by benchmark.
	///
	/// Benchmarks are the outer loop. Labels are the workloads, as listed in the descriptor.
	pub fn miss_breakdown_grouped(&self) -> Result<GroupedStackedSeries, AggregateError> {
		let configurations = self.descriptor.configuration_names().map(str::to_owned).collect::<Vec<_>>();

		let mut capacity = vec![];
		let mut compulsory = vec![];
		let mut conflict = vec![];
		for benchmark in &self.descriptor.workloads_list {
			let breakdowns = configurations
				.iter()
				.map(|configuration| {
					self.read(benchmark, configuration, |lines, label_match| {
						extract::miss_breakdown_pct(lines, label_match)
					})
				})
				.collect::<Result<Vec<MissBreakdown>, _>>()?;

			capacity.push(breakdowns.iter().map(|breakdown| breakdown.capacity).collect());
			compulsory.push(breakdowns.iter().map(|breakdown| breakdown.compulsory).collect());
			conflict.push(breakdowns.iter().map(|breakdown| breakdown.conflict).collect());
		}

		tracing::debug!(
			benchmarks = %self.descriptor.workloads_list.iter().join(", "),
			?capacity,
			?compulsory,
			?conflict,
			"Aggregated grouped miss breakdown"
		);

		Ok(GroupedStackedSeries {
			labels: self.descriptor.workloads_list.clone(),
			configurations,
			series: vec![
				GroupedSeries {
					name:   CAPACITY_MISS.to_owned(),
					groups: capacity,
				},
				GroupedSeries {
					name:   COMPULSORY_MISS.to_owned(),
					groups: compulsory,
				},
				GroupedSeries {
					name:   CONFLICT_MISS.to_owned(),
					groups: conflict,
				},
			],
		})
	}

	/// Aggregates the ipc and miss ratio of every benchmark under every configuration.
	///
	/// Benchmarks whose statistics can't be read are logged and skipped, and don't
	/// count towards the average.
	pub fn ipc_by_configuration(&self) -> IpcSeries {
		let benchmarks = self
			.descriptor
			.workloads_list
			.iter()
			.map(|benchmark| descriptor::display_name(benchmark).to_owned())
			.collect();

		let configurations = self
			.descriptor
			.configuration_names()
			.map(|configuration| {
				let stats = self
					.descriptor
					.workloads_list
					.iter()
					.map(|benchmark| {
						let res = self.read(benchmark, configuration, |lines, label_match| {
							extract::ipc_and_miss_ratio(lines, label_match)
						});
						match res {
							Ok(stats) => Some(stats),
							Err(err) => {
								tracing::warn!(
									%benchmark,
									%configuration,
									err = &err as &(dyn std::error::Error + 'static),
									"Unable to read statistics, skipping"
								);
								None
							},
						}
					})
					.collect::<Vec<_>>();

				let ipc = stats.iter().flatten().map(|stats| stats.ipc).collect::<Mean>();
				let dcache_miss_ratio = stats
					.iter()
					.flatten()
					.map(|stats| stats.dcache_miss_ratio)
					.collect::<Mean>();
				let average = IpcStats {
					ipc:               mean_or_zero(&ipc),
					dcache_miss_ratio: mean_or_zero(&dcache_miss_ratio),
				};
				tracing::debug!(%configuration, ?average, "Aggregated ipc");

				ConfigurationIpc {
					name: configuration.to_owned(),
					stats,
					average,
				}
			})
			.collect();

		IpcSeries {
			benchmarks,
			configurations,
		}
	}
}

/// Returns the mean of `mean`, or `0` if it's empty
fn mean_or_zero(mean: &Mean) -> f64 {
	if mean.is_empty() {
		0.0
	} else {
		mean.mean()
	}
}

/// Aggregation error
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
	/// Unable to read statistics file
	#[error(transparent)]
	StatFile(#[from] StatFileError),

	/// Unable to extract statistics
	#[error("Unable to extract statistics from {path:?}")]
	Extract {
		path:   PathBuf,
		#[source]
		source: ExtractError,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	fn descriptor(benchmarks: &[&str], configurations: &[&str]) -> Descriptor {
		Descriptor {
			experiment:     "exp".to_owned(),
			workloads_list: benchmarks.iter().map(|&benchmark| benchmark.to_owned()).collect(),
			configurations: configurations
				.iter()
				.map(|&configuration| (configuration.to_owned(), serde_json::json!({})))
				.collect(),
		}
	}

	fn ipc_series(benchmarks: usize) -> IpcSeries {
		IpcSeries {
			benchmarks:     (0..benchmarks).map(|idx| format!("b{idx}")).collect(),
			configurations: vec![ConfigurationIpc {
				name:    "c".to_owned(),
				stats:   (0..benchmarks)
					.map(|idx| {
						Some(IpcStats {
							ipc:               idx as f64,
							dcache_miss_ratio: 0.5,
						})
					})
					.collect(),
				average: IpcStats {
					ipc:               42.0,
					dcache_miss_ratio: 0.5,
				},
			}],
		}
	}

	#[test]
	fn stat_file_path_layout() {
		let descriptor = descriptor(&["b1/x"], &["c1"]);
		let tree = ResultTree {
			descriptor:     &descriptor,
			sim_path:       Path::new("sim"),
			stat_file_name: stat_file::DEFAULT_FILE_NAME,
			label_match:    LabelMatch::Exact,
		};

		assert_eq!(
			tree.stat_file_path("b1/x", "c1"),
			Path::new("sim/b1/x/exp/c1/memory.stat.0.csv")
		);
	}

	#[test]
	fn flat_missing_file_aborts() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let descriptor = descriptor(&["b1/x"], &["c1"]);
		let tree = ResultTree {
			descriptor:     &descriptor,
			sim_path:       dir.path(),
			stat_file_name: stat_file::DEFAULT_FILE_NAME,
			label_match:    LabelMatch::Exact,
		};

		let err = tree.miss_breakdown_flat().expect_err("Aggregated missing file");
		assert!(matches!(err, AggregateError::StatFile(StatFileError::Open { .. })));
	}

	#[test]
	fn ipc_plots_split_benchmarks() {
		let series = ipc_series(9);
		let plots = series.plots(8).collect::<Vec<_>>();
		assert_eq!(plots.len(), 2);

		assert_eq!(plots[0].number, 1);
		assert_eq!(plots[0].labels.len(), 9);
		assert_eq!(plots[0].labels.last().map(String::as_str), Some(AVERAGE_LABEL));
		assert_eq!(plots[0].ipc[0].values.len(), 9);

		assert_eq!(plots[1].number, 2);
		assert_eq!(plots[1].labels, ["b8", AVERAGE_LABEL]);
		assert_eq!(plots[1].ipc[0].values, [Some(8.0), Some(42.0)]);
		assert_eq!(plots[1].dcache_miss_ratio[0].values, [Some(0.5), Some(0.5)]);
	}

	#[test]
	fn ipc_plots_exact_multiple() {
		let series = ipc_series(8);
		let plots = series.plots(8).collect::<Vec<_>>();
		assert_eq!(plots.len(), 1);
		assert_eq!(plots[0].labels.len(), 9);
	}

	#[test]
	fn ipc_plots_without_benchmarks() {
		let series = ipc_series(0);
		let plots = series.plots(8).collect::<Vec<_>>();
		assert_eq!(plots.len(), 1);
		assert_eq!(plots[0].labels, [AVERAGE_LABEL]);
		assert_eq!(plots[0].ipc[0].values, [Some(42.0)]);
	}

	#[test]
	fn grouped_series_configuration() {
		let series = GroupedSeries {
			name:   CAPACITY_MISS.to_owned(),
			groups: vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]],
		};
		assert_eq!(series.configuration(1).collect::<Vec<_>>(), [2.0, 4.0, 0.0]);
	}
}
