//! Submission verdicts.
//!
//! A submission starts out `PENDING` and is moved to exactly one terminal
//! verdict by the worker. Verdicts are stored in the database as the same
//! strings shown to users, so `Display` and `FromStr` define the format.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Accepted,
    CompileError,
    /// Output mismatch on a specific test.
    WrongAnswer { test: u32 },
    /// Carries the failing test index except in blind mode.
    TimeLimitExceeded { test: Option<u32> },
    RuntimeError { test: Option<u32> },
    /// Sandbox or filesystem fault; never the submitter's fault.
    InternalError { test: Option<u32> },
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn on_test(f: &mut fmt::Formatter<'_>, kind: &str, test: Option<u32>) -> fmt::Result {
            match test {
                Some(n) => write!(f, "{} on test {}", kind, n),
                None => f.write_str(kind),
            }
        }
        match self {
            Verdict::Pending => f.write_str("PENDING"),
            Verdict::Accepted => f.write_str("AC"),
            Verdict::CompileError => f.write_str("CE"),
            Verdict::WrongAnswer { test } => on_test(f, "WA", Some(*test)),
            Verdict::TimeLimitExceeded { test } => on_test(f, "TLE", *test),
            Verdict::RuntimeError { test } => on_test(f, "RTE", *test),
            Verdict::InternalError { test } => on_test(f, "IE", *test),
        }
    }
}

/// Status text that does not name a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verdict: {0:?}")]
pub struct ParseVerdictError(String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, test) = match s.split_once(" on test ") {
            Some((kind, index)) => {
                let test = index.parse().map_err(|_| ParseVerdictError(s.into()))?;
                (kind, Some(test))
            }
            None => (s, None),
        };
        match (kind, test) {
            ("PENDING", None) => Ok(Verdict::Pending),
            ("AC", None) => Ok(Verdict::Accepted),
            ("CE", None) => Ok(Verdict::CompileError),
            ("WA", Some(test)) => Ok(Verdict::WrongAnswer { test }),
            ("TLE", test) => Ok(Verdict::TimeLimitExceeded { test }),
            ("RTE", test) => Ok(Verdict::RuntimeError { test }),
            ("IE", test) => Ok(Verdict::InternalError { test }),
            _ => Err(ParseVerdictError(s.into())),
        }
    }
}
