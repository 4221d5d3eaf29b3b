//! Simulator statistics aggregation (`simstat`)
//!
//! Reads an experiment descriptor, extracts cache and ipc statistics from the
//! simulator's result tree, and aggregates them into series ready to plot.

// Modules
pub mod aggregate;
pub mod descriptor;
pub mod extract;
pub mod stat_file;

// Exports
pub use self::{
	aggregate::{AggregateError, ResultTree},
	descriptor::{Descriptor, DescriptorError},
	extract::LabelMatch,
};
