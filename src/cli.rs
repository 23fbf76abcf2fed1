//! Command-line interface definition for savecheck.
//!
//! The definition is shared between the main binary and xtask for man page
//! generation.

use clap::Parser;

/// Main CLI structure for savecheck.
///
/// The tool takes no flags: it always checks the current directory against
/// the store under `.save/`. Behaviour is tuned through the config file.
#[derive(Parser, Debug)]
#[command(
    name = "savecheck",
    version = crate::VERSION,
    about = "Detect files that changed since the last run",
    long_about = "Hashes every file under the current directory and compares the result \
                  with the fingerprints recorded by the previous run. Files are reported as \
                  unchanged, changed (the stored baseline is updated), or as a time \
                  regression when the stored record is newer than the file on disk.\n\n\
                  Configuration is read from .save/config.toml or $SAVECHECK_CONFIG_PATH. \
                  Logging is controlled with $SAVECHECK_LOG."
)]
pub struct Cli {}
