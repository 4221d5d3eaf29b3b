//! Metric extraction from statistics lines
//!
//! Each extractor does a single pass over the lines of a statistics file,
//! matching each line against a small ordered set of labels. The value of a
//! matched line is its second field, and a later line with the same label
//! overwrites an earlier one.

// Imports
use {
	crate::stat_file::StatLine,
	std::{fmt, str::FromStr},
};

/// Statistic labels
pub mod labels {
	/// Total data cache misses
	pub const DCACHE_MISS: &str = "DCACHE_MISS";

	/// Data cache capacity misses
	pub const DCACHE_MISS_CAPACITY: &str = "DCACHE_MISS_CAPACITY";

	/// Data cache compulsory misses
	pub const DCACHE_MISS_COMPULSORY: &str = "DCACHE_MISS_COMPULSORY";

	/// Data cache capacity misses, in percent of all misses
	pub const DCACHE_MISS_CAPACITY_PCT: &str = "DCACHE_MISS_CAPACITY_pct";

	/// Data cache compulsory misses, in percent of all misses.
	// Note: The simulator writes this label misspelled.
	pub const DCACHE_MISS_COMPULSORY_PCT: &str = "DCACHE_MISS_COMPULSURY_pct";

	/// Data cache conflict misses, in percent of all misses
	pub const DCACHE_MISS_CONFLICT_PCT: &str = "DCACHE_MISS_CONFLICT_pct";

	/// Instructions per cycle
	pub const PERIODIC_IPC: &str = "Periodic IPC";

	/// Data cache misses, for the miss ratio
	pub const DCACHE_MISSES: &str = "DCACHE_MISSES";

	/// Data cache accesses, for the miss ratio
	pub const DCACHE_ACCESSES: &str = "DCACHE_ACCESSES";
}

/// How lines are matched against labels
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum LabelMatch {
	/// The first field of the line must be the label
	#[default]
	Exact,

	/// The line must contain the label anywhere.
	///
	/// Since labels share prefixes (`DCACHE_MISS` is contained in
	/// `DCACHE_MISS_CAPACITY`), the result depends on the order the
	/// labels are checked in. Every extractor checks its most specific
	/// labels first.
	Substring,
}

impl LabelMatch {
	/// Returns if `line` matches `label`
	pub fn matches(self, line: &str, label: &str) -> bool {
		match self {
			Self::Exact => line.stat_label() == label,
			Self::Substring => line.contains(label),
		}
	}
}

impl FromStr for LabelMatch {
	type Err = ParseLabelMatchError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"exact" => Ok(Self::Exact),
			"substring" => Ok(Self::Substring),
			_ => Err(ParseLabelMatchError(s.to_owned())),
		}
	}
}

impl fmt::Display for LabelMatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exact => f.write_str("exact"),
			Self::Substring => f.write_str("substring"),
		}
	}
}

/// Error for [`LabelMatch::from_str`]
#[derive(Debug, thiserror::Error)]
#[error("Unknown label match {0:?}, expected `exact` or `substring`")]
pub struct ParseLabelMatchError(String);

/// Cache miss breakdown
#[derive(PartialEq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MissBreakdown {
	pub capacity:   f64,
	pub compulsory: f64,
	pub conflict:   f64,
}

/// Performance statistics
#[derive(PartialEq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IpcStats {
	/// Instructions per cycle
	pub ipc: f64,

	/// Data cache misses per access
	pub dcache_miss_ratio: f64,
}

/// Extracts the miss breakdown from miss counts.
///
/// Conflict misses are the misses that are neither capacity nor compulsory
/// misses. Missing labels count as `0`.
pub fn miss_breakdown<I>(lines: I, label_match: LabelMatch) -> Result<MissBreakdown, ExtractError>
where
	I: IntoIterator,
	I::Item: AsRef<str>,
{
	let [capacity, compulsory, total] = scan(lines, label_match, [
		labels::DCACHE_MISS_CAPACITY,
		labels::DCACHE_MISS_COMPULSORY,
		labels::DCACHE_MISS,
	])?;

	let capacity = capacity.unwrap_or(0.0);
	let compulsory = compulsory.unwrap_or(0.0);
	let total = total.unwrap_or(0.0);
	Ok(MissBreakdown {
		capacity,
		compulsory,
		conflict: total - (capacity + compulsory),
	})
}

/// Extracts the miss breakdown from miss percentages.
///
/// Unlike [`miss_breakdown`], all labels must be present.
pub fn miss_breakdown_pct<I>(lines: I, label_match: LabelMatch) -> Result<MissBreakdown, ExtractError>
where
	I: IntoIterator,
	I::Item: AsRef<str>,
{
	const LABELS: [&str; 3] = [
		labels::DCACHE_MISS_CAPACITY_PCT,
		labels::DCACHE_MISS_COMPULSORY_PCT,
		labels::DCACHE_MISS_CONFLICT_PCT,
	];

	let values = scan(lines, label_match, LABELS)?;
	let [capacity, compulsory, conflict] = match values {
		[Some(capacity), Some(compulsory), Some(conflict)] => [capacity, compulsory, conflict],
		_ => {
			let missing = values
				.iter()
				.zip(LABELS)
				.filter(|(value, _)| value.is_none())
				.map(|(_, label)| label)
				.collect();
			return Err(ExtractError::MissingLabels { labels: missing });
		},
	};

	Ok(MissBreakdown {
		capacity,
		compulsory,
		conflict,
	})
}

/// Extracts the ipc and data cache miss ratio.
///
/// Missing labels count as `0`, and the miss ratio is `0` when there were no accesses.
pub fn ipc_and_miss_ratio<I>(lines: I, label_match: LabelMatch) -> Result<IpcStats, ExtractError>
where
	I: IntoIterator,
	I::Item: AsRef<str>,
{
	let [ipc, misses, accesses] = scan(lines, label_match, [
		labels::PERIODIC_IPC,
		labels::DCACHE_MISSES,
		labels::DCACHE_ACCESSES,
	])?;

	let misses = misses.unwrap_or(0.0);
	let accesses = accesses.unwrap_or(0.0);
	let dcache_miss_ratio = if accesses > 0.0 { misses / accesses } else { 0.0 };

	Ok(IpcStats {
		ipc: ipc.unwrap_or(0.0),
		dcache_miss_ratio,
	})
}

/// Scans `lines` for `labels`, returning the last value of each.
///
/// Each line is attributed to the first label it matches.
fn scan<I, const N: usize>(
	lines: I,
	label_match: LabelMatch,
	labels: [&'static str; N],
) -> Result<[Option<f64>; N], ExtractError>
where
	I: IntoIterator,
	I::Item: AsRef<str>,
{
	let mut values = [None; N];
	for line in lines {
		let line = line.as_ref();
		let Some(idx) = labels.iter().position(|label| label_match.matches(line, label)) else {
			continue;
		};

		let label = labels[idx];
		let value = line.stat_value().ok_or_else(|| ExtractError::MissingValue {
			label,
			line: line.to_owned(),
		})?;
		let value = value.parse::<f64>().map_err(|source| ExtractError::InvalidValue {
			label,
			line: line.to_owned(),
			source,
		})?;

		values[idx] = Some(value);
	}

	Ok(values)
}

/// Extraction error
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
	/// Line had a label, but no value
	#[error("Line {line:?} for {label} has no value")]
	MissingValue { label: &'static str, line: String },

	/// Line value wasn't a number
	#[error("Line {line:?} for {label} has an invalid value")]
	InvalidValue {
		label:  &'static str,
		line:   String,
		#[source]
		source: std::num::ParseFloatError,
	},

	/// Required labels were missing
	#[error("Missing required labels: {labels:?}")]
	MissingLabels { labels: Vec<&'static str> },
}
