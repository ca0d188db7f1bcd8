//! Threshold expressions
//!
//! A threshold decides whether an observed value should raise an alert. Two
//! spellings are accepted:
//!
//! * comparisons: `> 5`, `>=5`, `< 1`, `<= 1`, `== 0`, `!= 0`. The threshold
//!   alerts when the comparison holds for the observed value.
//! * Nagios ranges: `[@]start:end`. `10` means `0:10`, `10:` means ten to
//!   infinity and `~:10` means negative infinity to ten. The threshold alerts
//!   when the value is *outside* the range, or inside it if the range starts
//!   with `@`.
//!
//! ```
//! use elk_plugins::threshold::Threshold;
//!
//! let crit: Threshold = ">0".parse().unwrap();
//! assert!(crit.evaluate(4.0));
//! assert!(!crit.evaluate(0.0));
//!
//! let crit: Threshold = "5".parse().unwrap();
//! assert!(crit.evaluate(10.0));
//! assert!(!crit.evaluate(3.0));
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("empty threshold")]
    Empty,
    #[error("couldn't parse a number from '{0}'")]
    InvalidNumber(String),
    #[error("range start {start} is greater than its end {end}")]
    InvertedRange { start: String, end: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Operator {
    // longest first, so that `>=` is not read as `>`
    const ALL: [(&'static str, Operator); 6] = [
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("==", Operator::Eq),
        ("!=", Operator::Ne),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Note: counts arrive as f64 and are compared exactly; thresholds are
    /// whole numbers in practice so there's no epsilon.
    fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => value < threshold,
            Operator::Le => value <= threshold,
            Operator::Gt => value > threshold,
            Operator::Ge => value >= threshold,
            Operator::Eq => value == threshold,
            Operator::Ne => value != threshold,
        }
    }
}

/// A parsed threshold expression
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Threshold {
    Compare {
        operator: Operator,
        value: f64,
    },
    Range {
        start: f64,
        end: f64,
        /// Alert when inside the range (`@start:end`)
        inside: bool,
    },
}

impl Threshold {
    /// Whether `value` violates this threshold
    pub fn evaluate(&self, value: f64) -> bool {
        match *self {
            Threshold::Compare { operator, value: t } => operator.holds(value, t),
            Threshold::Range { start, end, inside } => {
                let within = start <= value && value <= end;
                within == inside
            }
        }
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(raw: &str) -> Result<Threshold, ThresholdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ThresholdError::Empty);
        }

        if let Some(&(prefix, operator)) = Operator::ALL.iter().find(|(op, _)| raw.starts_with(op)) {
            let value = parse_number(raw[prefix.len()..].trim())?;
            return Ok(Threshold::Compare { operator, value });
        }

        let (inside, range) = match raw.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let (start, end) = match range.find(':') {
            Some(idx) => {
                let start = match &range[..idx] {
                    "~" => f64::NEG_INFINITY,
                    "" => 0.0,
                    s => parse_number(s)?,
                };
                let end = match &range[idx + 1..] {
                    "" => f64::INFINITY,
                    s => parse_number(s)?,
                };
                (start, end)
            }
            None => (0.0, parse_number(range)?),
        };

        if start > end {
            return Err(ThresholdError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Threshold::Range { start, end, inside })
    }
}

fn parse_number(s: &str) -> Result<f64, ThresholdError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| ThresholdError::InvalidNumber(s.to_owned()))
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Threshold::Compare { operator, value } => write!(f, "{} {}", operator.as_str(), value),
            Threshold::Range { start, end, inside } => {
                if inside {
                    f.write_str("@")?;
                }
                if start == f64::NEG_INFINITY {
                    f.write_str("~")?;
                } else {
                    write!(f, "{}", start)?;
                }
                f.write_str(":")?;
                if end != f64::INFINITY {
                    write!(f, "{}", end)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn t(s: &str) -> Threshold {
        s.parse().unwrap()
    }

    #[test]
    fn comparisons() {
        assert!(t(">0").evaluate(4.0));
        assert!(!t(">0").evaluate(0.0));
        assert!(t(">= 5").evaluate(5.0));
        assert!(t("<1").evaluate(0.0));
        assert!(!t("<=1").evaluate(2.0));
        assert!(t("== 0").evaluate(0.0));
        assert!(t("!=0").evaluate(3.0));
    }

    #[test]
    fn two_character_operators_are_not_split() {
        assert_eq!(
            t(">=10"),
            Threshold::Compare {
                operator: Operator::Ge,
                value: 10.0
            }
        );
    }

    #[test]
    fn bare_number_is_zero_to_n() {
        let crit = t("5");
        assert!(crit.evaluate(10.0));
        assert!(!crit.evaluate(3.0));
        assert!(!crit.evaluate(5.0));
        assert!(crit.evaluate(-1.0));
    }

    #[test]
    fn open_ranges() {
        assert!(t("10:").evaluate(9.0));
        assert!(!t("10:").evaluate(1e9));
        assert!(t("~:10").evaluate(11.0));
        assert!(!t("~:10").evaluate(-1e9));
    }

    #[test]
    fn inside_and_outside_ranges() {
        assert!(t("10:20").evaluate(5.0));
        assert!(!t("10:20").evaluate(15.0));
        assert!(t("@10:20").evaluate(15.0));
        assert!(!t("@10:20").evaluate(25.0));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let crit = t(">5");
        for _ in 0..3 {
            assert!(crit.evaluate(10.0));
            assert!(!crit.evaluate(3.0));
        }
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<Threshold>(), Err(ThresholdError::Empty));
        assert_eq!(
            ">lots".parse::<Threshold>(),
            Err(ThresholdError::InvalidNumber("lots".into()))
        );
        assert_eq!(
            "a:b".parse::<Threshold>(),
            Err(ThresholdError::InvalidNumber("a".into()))
        );
        assert!(matches!(
            "20:10".parse::<Threshold>(),
            Err(ThresholdError::InvertedRange { .. })
        ));
        assert!("NaN".parse::<Threshold>().is_err());
    }

    #[test]
    fn display_reads_back() {
        for s in &["> 5", "10:20", "@10:20", "~:3", "4:"] {
            assert_eq!(t(s).to_string(), *s);
            assert_eq!(t(&t(s).to_string()), t(s));
        }
    }
}
