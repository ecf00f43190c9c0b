//! Centralized environment variable names and default values for the local driver.

// Environment variable names
pub const ENV_RAYON_THREADS: &str = "UNIQSET_RAYON_THREADS";
pub const ENV_SEQUENTIAL: &str = "UNIQSET_SEQUENTIAL";
pub const ENV_OUTPUT_FILE: &str = "UNIQSET_OUTPUT_FILE";

// Defaults
pub const DEFAULT_OUTPUT_FILE: &str = "part-00000.tsv";
