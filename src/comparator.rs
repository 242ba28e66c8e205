//! Output comparison.
//!
//! Verdicts hinge on token equality: both files are split on runs of ASCII
//! whitespace and the resulting token sequences must match pairwise. Line
//! endings, indentation and trailing blank lines carry no meaning; token
//! bytes compare exactly, with no numeric tolerance or case folding.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Compare a program's output against the reference output.
///
/// An open failure on either path is handed back to the caller, which
/// decides whether it escalates. A read failure after a successful open
/// counts as a mismatch.
pub fn files_match(user: &Path, expected: &Path) -> io::Result<bool> {
    let mut user_file = File::open(user)?;
    let mut expected_file = File::open(expected)?;

    let mut user_bytes = Vec::new();
    if user_file.read_to_end(&mut user_bytes).is_err() {
        return Ok(false);
    }
    let mut expected_bytes = Vec::new();
    if expected_file.read_to_end(&mut expected_bytes).is_err() {
        return Ok(false);
    }

    Ok(tokens(&user_bytes).eq(tokens(&expected_bytes)))
}

fn tokens(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes
        .split(|byte: &u8| byte.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
}
