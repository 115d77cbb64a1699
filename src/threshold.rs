//! Nagios range specifications and threshold evaluation.
//!
//! A range specification is the string format behind the usual
//! `--warning`/`--critical` flags:
//!
//! | Spec     | Alert if value is    | Parsed range         |
//! |----------|----------------------|----------------------|
//! | `10`     | not in (0..10)       | `(0, 10)`            |
//! | `10:`    | not in (10..inf)     | `(10, inf)`          |
//! | `~:10`   | not in (-inf..10)    | `(-inf, 10)`         |
//! | `10:20`  | not in (10..20)      | `(10, 20)`           |
//! | `@10:20` | in (10..20)          | `(10, 20)` inverted  |
//!
//! Both bounds are inclusive. A missing start is 0, a missing end is
//! positive infinity and a `~` start is negative infinity.

use std::str::FromStr;

use crate::State;

/// The error for malformed range specifications and non-numeric input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("Start {0} must not be greater than end {1}")]
    StartGreaterThanEnd(f64, f64),
    #[error("Not using range definition correctly")]
    Malformed,
    #[error("Invalid number {0:?}")]
    InvalidNumber(String),
}

/// A parsed range specification: a closed interval plus the `@` invert flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub start: f64,
    pub end: f64,
    pub invert: bool,
}

impl Range {
    /// Parses a range specification. Fails if the start ends up greater
    /// than the end, so a bare negative number like `-10` is rejected
    /// (it reads as `0:-10`).
    pub fn parse(spec: &str) -> Result<Range, RangeError> {
        let (invert, spec) = match spec.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };

        let (start_atom, end_atom) = if spec.contains(':') {
            let mut parts = spec.split(':');
            let start = parts.next().unwrap_or("");
            let end = parts.next().unwrap_or("");
            if parts.next().is_some() {
                return Err(RangeError::Malformed);
            }
            (start, end)
        } else {
            ("", spec)
        };

        let start = if start_atom == "~" {
            f64::NEG_INFINITY
        } else {
            parse_atom(start_atom, 0.0)?
        };
        let end = parse_atom(end_atom, f64::INFINITY)?;

        if start > end {
            return Err(RangeError::StartGreaterThanEnd(start, end));
        }
        Ok(Range { start, end, invert })
    }

    /// Whether `value` passes this range: inside the closed interval for a
    /// plain range, outside it for an inverted one.
    pub fn matches(&self, value: f64) -> bool {
        if value < self.start || value > self.end {
            return self.invert;
        }
        !self.invert
    }
}

impl FromStr for Range {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Range, RangeError> {
        Range::parse(s)
    }
}

/// An atom with a `.` parses as a float, everything else as an integer.
/// The distinction only matters for how the bound is displayed in error
/// messages; matching is always done on floats.
fn parse_atom(atom: &str, default: f64) -> Result<f64, RangeError> {
    if atom.is_empty() {
        return Ok(default);
    }
    if atom.contains('.') {
        return atom
            .parse::<f64>()
            .map_err(|_| RangeError::InvalidNumber(atom.to_string()));
    }
    atom.parse::<i64>()
        .map(|n| n as f64)
        .map_err(|_| RangeError::InvalidNumber(atom.to_string()))
}

/// A possibly absent threshold: `None` and `"none"` (any letter case) mean
/// "no threshold given", which passes every value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Threshold(Option<Range>);

impl Threshold {
    /// Parses an optional range specification, treating `None` and the
    /// literal string `none` as the always-pass threshold.
    pub fn parse(spec: Option<&str>) -> Result<Threshold, RangeError> {
        match spec {
            None => Ok(Threshold(None)),
            Some(s) if s.eq_ignore_ascii_case("none") => Ok(Threshold(None)),
            Some(s) => Range::parse(s).map(|range| Threshold(Some(range))),
        }
    }

    /// True if no threshold was given.
    pub fn always_passes(&self) -> bool {
        self.0.is_none()
    }

    pub fn range(&self) -> Option<&Range> {
        self.0.as_ref()
    }

    /// Whether `value` passes the threshold. See [`Range::matches`];
    /// an absent threshold passes everything.
    pub fn matches(&self, value: f64) -> bool {
        match &self.0 {
            Some(range) => range.matches(value),
            None => true,
        }
    }
}

/// Parses and matches a range specification in one step.
///
/// Returns whether `value` passes the threshold, or the parse error for a
/// malformed specification.
pub fn match_range(value: f64, spec: Option<&str>) -> Result<bool, RangeError> {
    Ok(Threshold::parse(spec)?.matches(value))
}

/// Converts a measured value given as a string, stripping a trailing `%`.
pub fn parse_value(value: &str) -> Result<f64, RangeError> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    trimmed
        .parse::<f64>()
        .map_err(|_| RangeError::InvalidNumber(value.to_string()))
}

/// The comparison mode used by [`get_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// greater or equal
    Ge,
    /// greater than
    Gt,
    /// less or equal
    Le,
    /// less than
    Lt,
    /// equal to
    Eq,
    /// not equal to
    Ne,
    /// nagios range specification
    Range,
}

impl Operator {
    /// Looks up the operator for a mode string, `None` for anything
    /// unrecognized.
    pub fn from_mode(mode: &str) -> Option<Operator> {
        match mode {
            "ge" => Some(Operator::Ge),
            "gt" => Some(Operator::Gt),
            "le" => Some(Operator::Le),
            "lt" => Some(Operator::Lt),
            "eq" => Some(Operator::Eq),
            "ne" => Some(Operator::Ne),
            "range" => Some(Operator::Range),
            _ => None,
        }
    }

    /// Whether `value` breaches `threshold` under this operator. For the
    /// six numeric modes that is the comparison itself; in range mode a
    /// breach is a value that does NOT pass the acceptable range.
    fn breaches(self, value: f64, threshold: &str) -> Result<bool, RangeError> {
        Ok(match self {
            Operator::Ge => value >= parse_number(threshold)?,
            Operator::Gt => value > parse_number(threshold)?,
            Operator::Le => value <= parse_number(threshold)?,
            Operator::Lt => value < parse_number(threshold)?,
            Operator::Eq => value == parse_number(threshold)?,
            Operator::Ne => value != parse_number(threshold)?,
            Operator::Range => !match_range(value, Some(threshold))?,
        })
    }
}

fn parse_number(threshold: &str) -> Result<f64, RangeError> {
    threshold
        .trim()
        .parse::<f64>()
        .map_err(|_| RangeError::InvalidNumber(threshold.to_string()))
}

/// Classifies `value` against the optional warning and critical thresholds.
///
/// The critical threshold is evaluated first: if it is given and breached,
/// the state is `Critical` without looking at the warning threshold.
/// Otherwise a given and breached warning threshold yields `Warning`, and
/// everything else is `Ok`. An unrecognized `mode` string yields `Unknown`.
///
/// `mode` is one of `ge`, `gt`, `le`, `lt`, `eq`, `ne` (thresholds are
/// plain numbers) or `range` (thresholds are range specifications).
///
/// ```rust
/// use checklib::{get_state, State};
///
/// assert_eq!(get_state(15.0, Some("10"), Some("20"), "ge").unwrap(), State::Warning);
/// assert_eq!(get_state(10.0, Some("10"), Some("20"), "gt").unwrap(), State::Ok);
/// assert_eq!(get_state(3.0, Some("0:10"), Some("0:20"), "range").unwrap(), State::Ok);
/// ```
pub fn get_state(
    value: f64,
    warn: Option<&str>,
    crit: Option<&str>,
    mode: &str,
) -> Result<State, RangeError> {
    let Some(operator) = Operator::from_mode(mode) else {
        return Ok(State::Unknown);
    };

    if let Some(threshold) = crit {
        if operator.breaches(value, threshold)? {
            return Ok(State::Critical);
        }
    }
    if let Some(threshold) = warn {
        if operator.breaches(value, threshold)? {
            return Ok(State::Warning);
        }
    }
    Ok(State::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(spec: &str) -> Range {
        Range::parse(spec).unwrap()
    }

    #[test]
    fn test_parse_grammar() {
        assert_eq!(
            range("10"),
            Range { start: 0.0, end: 10.0, invert: false }
        );
        assert_eq!(
            range("10:"),
            Range { start: 10.0, end: f64::INFINITY, invert: false }
        );
        assert_eq!(
            range(":"),
            Range { start: 0.0, end: f64::INFINITY, invert: false }
        );
        assert_eq!(
            range("~:10"),
            Range { start: f64::NEG_INFINITY, end: 10.0, invert: false }
        );
        assert_eq!(
            range("10:20"),
            Range { start: 10.0, end: 20.0, invert: false }
        );
        assert_eq!(
            range("@10:20"),
            Range { start: 10.0, end: 20.0, invert: true }
        );
        assert_eq!(
            range("@~:20"),
            Range { start: f64::NEG_INFINITY, end: 20.0, invert: true }
        );
        assert_eq!(
            range("@"),
            Range { start: 0.0, end: f64::INFINITY, invert: true }
        );
        assert_eq!(
            range("0.5:1.5"),
            Range { start: 0.5, end: 1.5, invert: false }
        );
    }

    #[test]
    fn test_parse_invert_only_flips_flag() {
        let plain = range("10:20");
        let inverted = range("@10:20");
        assert_eq!(plain.start, inverted.start);
        assert_eq!(plain.end, inverted.end);
        assert!(!plain.invert);
        assert!(inverted.invert);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(range("~:10.5"), range("~:10.5"));
        assert_eq!(range("@5:"), range("@5:"));
    }

    #[test]
    fn test_parse_rejects_reversed_bounds() {
        let err = Range::parse("20:10").unwrap_err();
        assert_eq!(err, RangeError::StartGreaterThanEnd(20.0, 10.0));
        assert_eq!(err.to_string(), "Start 20 must not be greater than end 10");

        // a bare negative number reads as 0:-10
        let err = Range::parse("-10").unwrap_err();
        assert_eq!(err, RangeError::StartGreaterThanEnd(0.0, -10.0));

        let err = Range::parse("2.5:1.5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Start 2.5 must not be greater than end 1.5"
        );
    }

    #[test]
    fn test_parse_rejects_extra_colons() {
        let err = Range::parse("10:20:30").unwrap_err();
        assert_eq!(err, RangeError::Malformed);
        assert_eq!(err.to_string(), "Not using range definition correctly");
    }

    #[test]
    fn test_parse_rejects_garbage_atoms() {
        assert!(matches!(
            Range::parse("abc"),
            Err(RangeError::InvalidNumber(_))
        ));
        assert!(matches!(
            Range::parse("10:high"),
            Err(RangeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_threshold_none_sentinel() {
        for spec in [None, Some("none"), Some("None"), Some("NONE")] {
            let threshold = Threshold::parse(spec).unwrap();
            assert!(threshold.always_passes());
            assert!(threshold.range().is_none());
            assert!(threshold.matches(-1e9));
            assert!(threshold.matches(0.0));
            assert!(threshold.matches(1e9));
        }
    }

    #[test]
    fn test_match_bounds_are_inclusive() {
        let threshold = Threshold::parse(Some("10:20")).unwrap();
        assert!(threshold.matches(10.0));
        assert!(threshold.matches(20.0));
        assert!(threshold.matches(15.0));
        assert!(!threshold.matches(9.999));
        assert!(!threshold.matches(20.001));
    }

    #[test]
    fn test_match_inverted() {
        let threshold = Threshold::parse(Some("@10:20")).unwrap();
        assert!(!threshold.matches(15.0));
        assert!(!threshold.matches(10.0));
        assert!(!threshold.matches(20.0));
        assert!(threshold.matches(9.0));
        assert!(threshold.matches(25.0));
    }

    #[test]
    fn test_match_open_ends() {
        assert!(match_range(1e12, Some("10:")).unwrap());
        assert!(!match_range(9.0, Some("10:")).unwrap());
        assert!(match_range(-1e12, Some("~:10")).unwrap());
        assert!(!match_range(11.0, Some("~:10")).unwrap());
    }

    #[test]
    fn test_match_range_propagates_parse_errors() {
        assert!(match_range(5.0, Some("20:10")).is_err());
        assert!(match_range(5.0, Some("1:2:3")).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("85").unwrap(), 85.0);
        assert_eq!(parse_value("85%").unwrap(), 85.0);
        assert_eq!(parse_value(" 12.5% ").unwrap(), 12.5);
        assert!(parse_value("full").is_err());
    }

    #[test]
    fn test_get_state_ge() {
        assert_eq!(
            get_state(15.0, Some("10"), Some("20"), "ge").unwrap(),
            State::Warning
        );
        assert_eq!(
            get_state(25.0, Some("10"), Some("20"), "ge").unwrap(),
            State::Critical
        );
        assert_eq!(
            get_state(5.0, Some("10"), Some("20"), "ge").unwrap(),
            State::Ok
        );
        // boundary: ge includes the threshold itself
        assert_eq!(
            get_state(20.0, Some("10"), Some("20"), "ge").unwrap(),
            State::Critical
        );
    }

    #[test]
    fn test_get_state_other_operators() {
        assert_eq!(
            get_state(10.0, Some("10"), Some("20"), "gt").unwrap(),
            State::Ok
        );
        assert_eq!(
            get_state(10.0, Some("15"), Some("5"), "le").unwrap(),
            State::Warning
        );
        assert_eq!(
            get_state(4.0, Some("15"), Some("5"), "lt").unwrap(),
            State::Critical
        );
        assert_eq!(
            get_state(7.0, Some("7"), None, "eq").unwrap(),
            State::Warning
        );
        assert_eq!(
            get_state(7.0, None, Some("8"), "ne").unwrap(),
            State::Critical
        );
    }

    #[test]
    fn test_get_state_without_thresholds() {
        assert_eq!(get_state(99.0, None, None, "ge").unwrap(), State::Ok);
        assert_eq!(get_state(99.0, None, None, "range").unwrap(), State::Ok);
    }

    #[test]
    fn test_get_state_unknown_mode() {
        assert_eq!(
            get_state(1.0, Some("10"), Some("20"), "between").unwrap(),
            State::Unknown
        );
    }

    // The range mode polarity is easy to get backwards: a value the
    // matcher accepts must NOT raise the state, a value it rejects must.
    #[test]
    fn test_get_state_range_polarity() {
        assert_eq!(
            get_state(15.0, None, Some("10:20"), "range").unwrap(),
            State::Ok
        );
        assert_eq!(
            get_state(25.0, None, Some("10:20"), "range").unwrap(),
            State::Critical
        );
        assert_eq!(
            get_state(25.0, Some("10:20"), None, "range").unwrap(),
            State::Warning
        );

        // inverted specs flip what counts as a breach
        assert_eq!(
            get_state(15.0, None, Some("@10:20"), "range").unwrap(),
            State::Critical
        );
        assert_eq!(
            get_state(25.0, None, Some("@10:20"), "range").unwrap(),
            State::Ok
        );
        assert_eq!(
            get_state(15.0, Some("@10:20"), None, "range").unwrap(),
            State::Warning
        );
    }

    #[test]
    fn test_get_state_range_crit_wins() {
        assert_eq!(
            get_state(50.0, Some("0:10"), Some("0:20"), "range").unwrap(),
            State::Critical
        );
    }

    #[test]
    fn test_get_state_range_none_threshold() {
        assert_eq!(
            get_state(50.0, Some("none"), Some("none"), "range").unwrap(),
            State::Ok
        );
    }

    #[test]
    fn test_get_state_propagates_range_errors() {
        assert!(get_state(5.0, Some("20:10"), None, "range").is_err());
        assert!(get_state(5.0, Some("x"), None, "ge").is_err());
    }
}
