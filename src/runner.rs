use std::fmt::Display;

use crate::{Outcome, State};

/// Runs the fallible part of a check and turns any error into the plugin's
/// single point of exit.
///
/// By default an error prints its text and exits with `Unknown`, which is
/// the convention for "the check itself could not be performed". The
/// [`Runner::on_error`] hook can map specific errors to another state.
///
/// ```rust,no_run
/// use checklib::{Outcome, Runner, State};
///
/// Runner::new()
///     .safe_run(|| {
///         let mut outcome = Outcome::new();
///         let body = std::fs::read_to_string("/run/service/status")?;
///         outcome.add(State::Ok, body.trim().to_string());
///         Ok::<_, std::io::Error>(outcome)
///     })
///     .print_and_exit();
/// ```
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> (State, E)>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    /// Maps an error to the state and error to report instead of the
    /// default `(Unknown, original error)`.
    pub fn on_error(mut self, f: impl FnOnce(&E) -> (State, E) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn safe_run(self, f: impl FnOnce() -> Result<Outcome, E>) -> RunnerResult<E> {
        match f() {
            Ok(outcome) => RunnerResult::Ok(outcome),
            Err(err) => {
                let (state, err) = match self.on_error {
                    Some(map) => map(&err),
                    None => (State::Unknown, err),
                };
                RunnerResult::Err(state, err)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Runner::new()
    }
}

pub enum RunnerResult<E> {
    Ok(Outcome),
    Err(State, E),
}

impl<E: Display> RunnerResult<E> {
    /// Prints the outcome or the error text and exits with the matching
    /// exit code.
    pub fn print_and_exit(self) -> ! {
        match self {
            RunnerResult::Ok(outcome) => outcome.print_and_exit(),
            RunnerResult::Err(state, err) => {
                println!("{err}");
                std::process::exit(state.exit_code());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("api unreachable")]
    struct ApiError;

    #[test]
    fn test_runner_ok() {
        let result = Runner::<ApiError>::new().safe_run(|| {
            let mut outcome = Outcome::new();
            outcome.add(State::Ok, "reachable");
            Ok(outcome)
        });

        match result {
            RunnerResult::Ok(outcome) => assert_eq!(outcome.state(), State::Ok),
            RunnerResult::Err(..) => panic!("expected ok"),
        }
    }

    #[test]
    fn test_runner_error_defaults_to_unknown() {
        let result = Runner::new().safe_run(|| Err(ApiError));

        match result {
            RunnerResult::Err(state, err) => {
                assert_eq!(state, State::Unknown);
                assert_eq!(err.to_string(), "api unreachable");
            }
            RunnerResult::Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_runner_on_error_override() {
        let result = Runner::new()
            .on_error(|_| (State::Critical, ApiError))
            .safe_run(|| Err(ApiError));

        match result {
            RunnerResult::Err(state, _) => assert_eq!(state, State::Critical),
            RunnerResult::Ok(_) => panic!("expected error"),
        }
    }
}
