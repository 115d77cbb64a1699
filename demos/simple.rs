use std::env::args;

use checklib::{Outcome, State};

// Usage: cargo run --example simple -- haaa
//        cargo run --example simple -- itsfine

fn main() {
    // Grab the first argument
    let arg = args().nth(1).unwrap_or_default();

    // Starts out as unknown until something is pushed
    let mut outcome = Outcome::new();

    // Check logic goes here
    match arg.as_str() {
        "itsfine" => outcome.add(State::Ok, "Everything is fine :-)"),
        "haaa" => outcome.add(State::Critical, "Something went terribly wrong!"),
        _ => (), // unexpected argument: the state will remain unknown
    };

    // print the status line and exit with the matching exit code
    outcome.print_and_exit();
}
