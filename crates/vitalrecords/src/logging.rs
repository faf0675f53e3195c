//! Diagnostics for the `vitrec` binary.
//!
//! Everything logs through `tracing`. Log lines are written to stderr so
//! listings on stdout stay pipeable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How chatty the CLI is, picked with `-q` / `-v` / `-vv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings, such as a malformed collection being ignored.
    #[default]
    Normal,
    /// One line per write to the store.
    Verbose,
    /// Every store read and write.
    Trace,
}

impl Verbosity {
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Trace => Level::DEBUG,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directive(self) -> String {
        format!("vitalrecords={}", self.level())
    }
}

/// Install the global subscriber. Later calls are ignored.
///
/// ```no_run
/// use vitalrecords::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("vitalrecords=debug")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.level(), Level::WARN);
        assert_eq!(Verbosity::Verbose.level(), Level::INFO);
        assert_eq!(Verbosity::Trace.level(), Level::DEBUG);
    }

    #[test]
    fn test_directive_targets_this_crate() {
        assert_eq!(Verbosity::default().directive(), "vitalrecords=WARN");
        assert_eq!(Verbosity::Trace.directive(), "vitalrecords=DEBUG");
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        for verbosity in [Verbosity::Quiet, Verbosity::Verbose, Verbosity::Trace] {
            init_logging(verbosity);
        }
        init_test_logging();
    }
}
