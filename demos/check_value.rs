use clap::Parser;

use checklib::{get_state, parse_value, Outcome, RangeError, Runner};

/// Classifies a given value against warning/critical range specifications.
///
/// Usage: cargo run --example check_value -- --value 15 --warning 1:20 --critical 1:25
///        cargo run --example check_value -- --value 87% --warning 80 --critical 90
#[derive(Parser)]
struct Args {
    /// The measured value, optionally with a trailing `%`
    #[arg(long)]
    value: String,

    /// Warning threshold, a range specification or `none`
    #[arg(long)]
    warning: Option<String>,

    /// Critical threshold, a range specification or `none`
    #[arg(long)]
    critical: Option<String>,

    /// Always exit with 0 while still reporting the real state
    #[arg(long)]
    always_ok: bool,
}

fn main() {
    let args = Args::parse();

    Runner::new()
        .safe_run(|| {
            let value = parse_value(&args.value)?;
            let state = get_state(
                value,
                args.warning.as_deref(),
                args.critical.as_deref(),
                "range",
            )?;

            let mut outcome = Outcome::new();
            outcome.add(state, format!("value is {value}"));
            outcome.set_always_ok(args.always_ok);
            Ok::<_, RangeError>(outcome)
        })
        .print_and_exit();
}
