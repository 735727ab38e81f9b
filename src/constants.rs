//! Constants shared across the engine.
//!
//! Token names, interval tuning and network defaults live here so the
//! renderer, the HTTP runner and the CLI agree on them.

use std::time::Duration;

/// Built-in token replaced by a group-by interval derived from the time range.
pub const TEMP_VAR_INTERVAL: &str = ":interval:";

/// Built-in database slot filled from a template's own query definition.
pub const TEMP_VAR_DATABASE: &str = ":database:";

/// Built-in measurement slot filled from a template's own query definition.
pub const TEMP_VAR_MEASUREMENT: &str = ":measurement:";

/// Built-in tag key slot filled from a template's own query definition.
pub const TEMP_VAR_TAG_KEY: &str = ":tagKey:";

/// Number of points a graph should show across its time range.
///
/// `:interval:` becomes `duration / DESIRED_POINTS_PER_GRAPH`, rounded to
/// whole milliseconds.
pub const DESIRED_POINTS_PER_GRAPH: u64 = 360;

/// Comparators that open a regex literal (`host =~ /.../`).
pub const REGEX_COMPARATORS: [&str; 2] = ["=~", "!~"];

/// Delimiter of InfluxQL regex literals.
pub const REGEX_DELIMITER: char = '/';

/// Default HTTP request timeout for metadata queries (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default HTTP request timeout as a [`Duration`].
pub fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TEMPVAR_CONFIG";

/// Directory under the user's home holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = ".tempvar";

/// File name of the user configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
