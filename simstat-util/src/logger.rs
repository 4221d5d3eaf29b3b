//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and optionally to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{
		fs,
		path::Path,
		sync::{Mutex, PoisonError},
	},
	tracing_subscriber::{prelude::*, EnvFilter},
};

/// Messages emitted before the logger was initialized
static PRE_INIT_MESSAGES: Mutex<Vec<String>> = Mutex::new(vec![]);

/// Pre-initialization logging.
///
/// Messages are buffered until [`init`] is called, then re-emitted.
pub mod pre_init {
	use super::PRE_INIT_MESSAGES;

	/// Buffers a debug message
	pub fn debug(message: impl Into<String>) {
		PRE_INIT_MESSAGES
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.push(message.into());
	}
}

/// Initializes the logger
///
/// If `log_file` is given, verbose output is also written to it, appending
/// if `log_file_append` is set, else truncating it.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	// Create the stderr layer
	let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_filter(stderr_filter);

	// Then the file layer, if we have one.
	// Note: If we can't open the file, we still want to log to stderr,
	//       so just report it once the logger is up.
	let mut file_open_err = None;
	let file_layer = log_file.and_then(|log_file| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(log_file);

		match file {
			Ok(file) => {
				let file_filter = EnvFilter::try_from_env("RUST_LOG_FILE").unwrap_or_else(|_| EnvFilter::new("debug"));
				let layer = tracing_subscriber::fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(file_filter);
				Some(layer)
			},
			Err(err) => {
				file_open_err = Some((log_file.to_path_buf(), err));
				None
			},
		}
	});

	tracing_subscriber::registry().with(stderr_layer).with(file_layer).init();

	if let Some((path, err)) = file_open_err {
		tracing::warn!(?path, ?err, "Unable to open log file");
	}

	// Finally emit all messages we got before initializing
	let messages = std::mem::take(&mut *PRE_INIT_MESSAGES.lock().unwrap_or_else(PoisonError::into_inner));
	for message in messages {
		tracing::debug!("{message}");
	}
}
