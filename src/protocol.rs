//! Child-to-parent result protocol
//!
//! A child process reports its single result as one line on stdout:
//!
//! ```text
//! <status code><separator><description>\n
//! ```
//!
//! The separator is one character and is discarded by the reader. Backslash,
//! newline and carriage return in the description are escaped so that
//! multi-line failure messages stay on one line.

use crate::error::RunnerError;
use crate::models::TestStatus;

/// Separator written between the code and the description
pub const SEPARATOR: char = ' ';

/// Encode a result as a newline-terminated wire line.
pub fn encode(status: TestStatus, description: &str) -> String {
    format!("{}{}{}\n", status.code(), SEPARATOR, escape(description))
}

/// Decode a wire line into its raw code and description.
///
/// The code is returned unchecked; callers map codes outside the execution
/// range to a crash.
pub fn decode(line: &str) -> Result<(u64, String), RunnerError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let trimmed = line.trim_start();

    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits == 0 {
        return Err(RunnerError::Protocol(line.to_string()));
    }

    let code = trimmed[..digits]
        .parse::<u64>()
        .map_err(|_| RunnerError::Protocol(line.to_string()))?;

    let mut rest = trimmed[digits..].chars();
    rest.next();

    Ok((code, unescape(rest.as_str())))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_format() {
        assert_eq!(encode(TestStatus::Passed, ""), "0 \n");
        assert_eq!(
            encode(TestStatus::Failed, "assertion X failed"),
            "1 assertion X failed\n"
        );
    }

    #[test]
    fn test_failed_round_trip() {
        let line = encode(TestStatus::Failed, "assertion X failed");
        let (code, description) = decode(&line).unwrap();
        assert_eq!(TestStatus::from_code(code), Some(TestStatus::Failed));
        assert_eq!(description, "assertion X failed");
    }

    #[test]
    fn test_multiline_description_stays_on_one_line() {
        let message = "left != right\n  left: 1\n right: 2 \\ done";
        let line = encode(TestStatus::Failed, message);
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(decode(&line).unwrap().1, message);
    }

    #[test]
    fn test_only_first_separator_is_discarded() {
        assert_eq!(decode("1  two spaces\n").unwrap(), (1, " two spaces".to_string()));
        assert_eq!(decode("2:colon").unwrap(), (2, "colon".to_string()));
    }

    #[test]
    fn test_missing_separator_gives_empty_description() {
        assert_eq!(decode("0\n").unwrap(), (0, String::new()));
        assert_eq!(decode("3").unwrap(), (3, String::new()));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(decode("").is_err());
        assert!(decode("\n").is_err());
        assert!(decode("passed\n").is_err());
        assert!(decode("-1 nope\n").is_err());
        assert!(decode("99999999999999999999999 overflow\n").is_err());
    }

    #[test]
    fn test_out_of_range_code_is_returned_raw() {
        let (code, description) = decode("4 not found\n").unwrap();
        assert_eq!(code, 4);
        assert_eq!(description, "not found");
        assert_eq!(TestStatus::from_code(code), None);
    }
}
