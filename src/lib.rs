//! ELK plugins: strongly typed monitoring checks against an ELK stack
//!
//! The checks in here follow the Nagios/Sensu plugin contract: print a single
//! status line on stdout and exit with the code for that status. This library
//! holds the pieces that every check needs:
//!
//! * [`Status`], the four plugin states and their exit codes
//! * [`threshold`], the threshold expression language accepted by
//!   `--critical`
//! * [`init_logging`], which routes internal diagnostics to stderr so that
//!   stdout stays reserved for the monitoring system
//!
//! Documentation for the individual checks lives in the [`scripts`] module.

use std::fmt;
use std::process;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod scripts;
pub mod threshold;

/// The environment variable used to override the log filter
pub const LOG_ENV: &str = "CHECK_ELK_LOG";

/// All possible exit statuses
///
/// Statuses are ordered by severity so that `max` picks the worst one.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// The process exit code monitoring systems expect for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    /// Format the single line of plugin output, e.g. `OK - Total matches: 0`
    pub fn line(self, summary: &str) -> String {
        format!("{} - {}", self, summary)
    }

    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// Print the status line and exit with the matching code
    pub fn exit_with(self, summary: &str) -> ! {
        println!("{}", self.line(summary));
        self.exit()
    }

    /// The names accepted on the command line
    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected status '{0}', expected one of: ok, warning, critical, unknown")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Status, ParseStatusError> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(Status::Ok),
            "warn" | "warning" => Ok(Status::Warning),
            "critical" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(ParseStatusError(s.to_owned())),
        }
    }
}

/// Install a stderr `tracing` subscriber
///
/// The filter comes from `CHECK_ELK_LOG` when set, otherwise `warn`, or
/// `info` when the check runs verbosely. Calling this twice is harmless.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
