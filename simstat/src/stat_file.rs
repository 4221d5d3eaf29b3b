//! Simulator statistics files

// Imports
use std::{
	fs,
	io::{self, BufRead},
	path::{Path, PathBuf},
};

/// Default statistics file name within each result directory
pub const DEFAULT_FILE_NAME: &str = "memory.stat.0.csv";

/// Reads all lines of a statistics file
pub fn read_lines(path: &Path) -> Result<Vec<String>, StatFileError> {
	let file = fs::File::open(path).map_err(|source| StatFileError::Open {
		path: path.to_path_buf(),
		source,
	})?;

	io::BufReader::new(file)
		.lines()
		.collect::<Result<Vec<_>, _>>()
		.map_err(|source| StatFileError::Read {
			path: path.to_path_buf(),
			source,
		})
}

/// Extension trait to split statistics lines
#[extend::ext(name = StatLine)]
pub impl str {
	/// Returns the label of this line, its first field
	fn stat_label(&self) -> &str {
		self.split(',').next().unwrap_or_default().trim()
	}

	/// Returns the value of this line, its second field
	fn stat_value(&self) -> Option<&str> {
		self.split(',').nth(1).map(str::trim)
	}
}

/// Statistics file error
#[derive(Debug, thiserror::Error)]
pub enum StatFileError {
	/// Unable to open file
	#[error("Unable to open statistics file {path:?}")]
	Open {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// Unable to read file
	#[error("Unable to read statistics file {path:?}")]
	Read {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},
}
