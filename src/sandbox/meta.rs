//! Meta file parsing for isolate runs.
//!
//! After every run isolate writes a `key:value` meta file; its `status`
//! field is the authoritative account of what happened to the program. The
//! exit status of the isolate process itself carries no information here.

use std::fmt;

/// Low-level outcome of one sandboxed run.
///
/// The runner reports how the program fared against its limits; whether the
/// output was correct is decided by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ok,
    TimeLimitExceeded,
    RuntimeError,
    InternalError,
}

impl RunOutcome {
    pub fn is_ok(self) -> bool {
        matches!(self, RunOutcome::Ok)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunOutcome::Ok => "OK",
            RunOutcome::TimeLimitExceeded => "TLE",
            RunOutcome::RuntimeError => "RTE",
            RunOutcome::InternalError => "IE",
        })
    }
}

/// Map meta file contents to an outcome.
///
/// `TO` is a time-limit kill, `RE` a non-zero exit, `SG` a fatal signal and
/// `XX` an isolate-internal failure. A missing status field means the
/// program ran to completion.
pub fn outcome_from_meta(content: &str) -> RunOutcome {
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim() != "status" {
            continue;
        }
        return match value.trim() {
            "TO" => RunOutcome::TimeLimitExceeded,
            "RE" | "SG" => RunOutcome::RuntimeError,
            "XX" => RunOutcome::InternalError,
            _ => RunOutcome::Ok,
        };
    }
    RunOutcome::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_status_means_ok() {
        let content = "time:0.015\ntime-wall:0.020\nmax-rss:1024\nexitcode:0\n";
        assert_eq!(outcome_from_meta(content), RunOutcome::Ok);
    }

    #[test]
    fn timeout_maps_to_tle() {
        let content = "time:1.000\nstatus:TO\nmessage:Time limit exceeded\n";
        assert_eq!(outcome_from_meta(content), RunOutcome::TimeLimitExceeded);
    }

    #[test]
    fn nonzero_exit_and_signal_map_to_rte() {
        assert_eq!(
            outcome_from_meta("status:RE\nexitcode:1\n"),
            RunOutcome::RuntimeError
        );
        assert_eq!(
            outcome_from_meta("status:SG\nexitsig:11\n"),
            RunOutcome::RuntimeError
        );
    }

    #[test]
    fn isolate_failure_maps_to_ie() {
        assert_eq!(outcome_from_meta("status:XX\n"), RunOutcome::InternalError);
    }

    #[test]
    fn unknown_status_value_is_treated_like_absent() {
        assert_eq!(outcome_from_meta("status:ZZ\n"), RunOutcome::Ok);
    }

    #[test]
    fn tolerates_garbage_lines() {
        let content = "no colon here\n\nstatus:TO\ntrailing\n";
        assert_eq!(outcome_from_meta(content), RunOutcome::TimeLimitExceeded);
    }

    #[test]
    fn empty_meta_is_ok() {
        assert_eq!(outcome_from_meta(""), RunOutcome::Ok);
    }
}
