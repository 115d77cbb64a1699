//! The checklib crate provides shared building blocks for writing nagios/icinga
//! compatible check plugins: threshold parsing and evaluation, service states
//! with the nagios exit code convention, and a small SQLite backed key-value
//! cache for persisting tokens between plugin runs.
//!
//! A check usually measures something, classifies the measured value against
//! the `--warning`/`--critical` thresholds and prints a single status line:
//!
//! ```rust
//! use checklib::{get_state, Outcome, State};
//!
//! let usage = 93.0;
//! let state = get_state(usage, Some("80"), Some("95"), "ge").unwrap();
//!
//! let mut outcome = Outcome::new();
//! outcome.add(state, format!("{}% disk usage", usage));
//! assert_eq!(outcome.state(), State::Warning);
//! assert_eq!(outcome.message(), "93% disk usage [WARNING]");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::process;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

mod cache;
mod db;
mod runner;
mod threshold;

pub use crate::cache::{Cache, CacheEntry, DEFAULT_CACHE_FILENAME};
pub use crate::db::{validate_identifier, Db, DbError};
pub use crate::runner::{Runner, RunnerResult};
pub use crate::threshold::{
    get_state, match_range, parse_value, Operator, Range, RangeError, Threshold,
};

/// Represents a service state from nagios.
///
/// The states order by badness, not by their numeric exit codes:
/// `Ok < Unknown < Warning < Critical`. Folding a sequence of states with
/// [`State::worst`] therefore never lets an `Unknown` shadow a real problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl State {
    /// Returns the corresponding nagios exit code to signal the service state.
    pub fn exit_code(&self) -> i32 {
        match self {
            State::Ok => 0,
            State::Warning => 1,
            State::Critical => 2,
            State::Unknown => 3,
        }
    }

    /// Returns the state wrapped in square brackets, for example `[WARNING]`.
    /// Icinga Web colors these markers in status lines.
    pub fn bracketed(&self) -> &'static str {
        match self {
            State::Ok => "[OK]",
            State::Warning => "[WARNING]",
            State::Critical => "[CRITICAL]",
            State::Unknown => "[UNKNOWN]",
        }
    }

    /// Compares two states and returns the worse one, prioritizing any
    /// non-OK state: `Critical > Warning > Unknown > Ok`.
    ///
    /// Note that numerically (by exit code) the above does not hold.
    pub fn worst(self, other: State) -> State {
        self.max(other)
    }

    fn priority(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Unknown => 1,
            State::Warning => 2,
            State::Critical => 3,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Ok => "OK",
            State::Warning => "WARNING",
            State::Critical => "CRITICAL",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

impl Ord for State {
    fn cmp(&self, other: &State) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &State) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The error returned when parsing a [`State`] from a string fails.
#[derive(Debug, thiserror::Error)]
#[error("unknown state {0:?}")]
pub struct ParseStateError(String);

impl FromStr for State {
    type Err = ParseStateError;

    /// Parses `ok` and any string starting with `warn`, `crit` or `unk`,
    /// case-insensitive.
    fn from_str(s: &str) -> Result<State, ParseStateError> {
        let lower = s.to_ascii_lowercase();
        if lower == "ok" {
            return Ok(State::Ok);
        }
        if lower.starts_with("warn") {
            return Ok(State::Warning);
        }
        if lower.starts_with("crit") {
            return Ok(State::Critical);
        }
        if lower.starts_with("unk") {
            return Ok(State::Unknown);
        }
        Err(ParseStateError(s.to_string()))
    }
}

/// Returns the current date and time as UNIX time in seconds.
pub fn now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}

/// The result of a whole check run: the overall service state plus the
/// status lines to print.
///
/// Each measured item is pushed with [`Outcome::add`]; the overall state is
/// the worst of all pushed states and non-OK items are tagged with the
/// bracketed state marker. The first line is the status line shown by
/// nagios/icinga, further lines become long output.
///
/// ```rust
/// use checklib::{Outcome, State};
///
/// let mut outcome = Outcome::new();
/// outcome.add(State::Ok, "cpu usage 12%");
/// outcome.add(State::Critical, "load 38.2");
/// assert_eq!(outcome.state(), State::Critical);
/// assert_eq!(outcome.message(), "cpu usage 12%\nload 38.2 [CRITICAL]");
/// ```
#[derive(Debug, Default)]
pub struct Outcome {
    state: Option<State>,
    lines: Vec<String>,
    always_ok: bool,
}

impl Outcome {
    pub fn new() -> Outcome {
        Outcome::default()
    }

    /// Pushes a single check item. The overall state becomes the worst of
    /// the states pushed so far; non-OK items get the bracketed state
    /// appended to their message.
    pub fn add(&mut self, state: State, message: impl Into<String>) {
        let message = message.into();
        let line = match state {
            State::Ok => message,
            other => format!("{} {}", message, other.bracketed()),
        };
        self.lines.push(line);
        self.state = Some(match self.state {
            Some(current) => current.worst(state),
            None => state,
        });
    }

    /// Overrides the overall state, ignoring the states pushed via
    /// [`Outcome::add`].
    pub fn set_state(&mut self, state: State) {
        self.state = Some(state);
    }

    /// If set, [`Outcome::exit_code`] always reports 0 while the message
    /// still shows the real result. Checks usually wire this to an
    /// `--always-ok` flag.
    pub fn set_always_ok(&mut self, always_ok: bool) {
        self.always_ok = always_ok;
    }

    /// The overall state. An outcome without any pushed item is `Unknown`.
    pub fn state(&self) -> State {
        self.state.unwrap_or(State::Unknown)
    }

    /// The message to print: all pushed lines joined by newlines, or the
    /// state name if nothing was pushed.
    pub fn message(&self) -> String {
        if self.lines.is_empty() {
            return self.state().to_string();
        }
        self.lines.join("\n")
    }

    pub fn exit_code(&self) -> i32 {
        if self.always_ok {
            return 0;
        }
        self.state().exit_code()
    }

    /// Prints the message and exits with the exit code from
    /// [`Outcome::exit_code`].
    pub fn print_and_exit(self) -> ! {
        println!("{}", self.message().trim());
        process::exit(self.exit_code())
    }
}
