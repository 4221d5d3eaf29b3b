//! Experiment descriptor

// Imports
use std::{
	fs,
	io,
	path::{Path, PathBuf},
};

/// Experiment descriptor
///
/// Names an experiment, the workloads it ran and the configurations
/// each workload ran under.
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Descriptor {
	/// Experiment name
	pub experiment: String,

	/// Workloads, as `<benchmark>/<input>` paths
	pub workloads_list: Vec<String>,

	/// Configurations.
	///
	/// Only the names are used, and they are iterated in the
	/// order they appear in the descriptor file.
	pub configurations: serde_json::Map<String, serde_json::Value>,
}

impl Descriptor {
	/// Loads a descriptor from a json file
	pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
		let file = fs::File::open(path).map_err(|source| match source.kind() {
			io::ErrorKind::NotFound => DescriptorError::NotFound { path: path.to_path_buf() },
			_ => DescriptorError::Open {
				path: path.to_path_buf(),
				source,
			},
		})?;

		let descriptor = serde_json::from_reader::<_, Self>(io::BufReader::new(file)).map_err(|source| {
			DescriptorError::Parse {
				path: path.to_path_buf(),
				source,
			}
		})?;
		tracing::debug!(
			experiment = %descriptor.experiment,
			workloads = descriptor.workloads_list.len(),
			configurations = descriptor.configurations.len(),
			"Loaded descriptor"
		);

		Ok(descriptor)
	}

	/// Returns all configuration names, in descriptor order
	pub fn configuration_names(&self) -> impl Iterator<Item = &str> + '_ {
		self.configurations.keys().map(String::as_str)
	}

	/// Returns the result directory of `benchmark` ran under `configuration`
	pub fn result_dir(&self, sim_path: &Path, benchmark: &str, configuration: &str) -> PathBuf {
		sim_path.join(benchmark).join(&self.experiment).join(configuration)
	}
}

/// Returns the display name of a workload.
///
/// This is the part of the workload before the first `/`.
pub fn display_name(workload: &str) -> &str {
	match workload.split_once('/') {
		Some((name, _)) => name,
		None => workload,
	}
}

/// Descriptor error
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
	/// Descriptor file doesn't exist
	#[error("Descriptor file {path:?} not found")]
	NotFound { path: PathBuf },

	/// Unable to open descriptor file
	#[error("Unable to open descriptor file {path:?}")]
	Open {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// Unable to parse descriptor file
	#[error("Unable to parse descriptor file {path:?}")]
	Parse {
		path:   PathBuf,
		#[source]
		source: serde_json::Error,
	},
}
