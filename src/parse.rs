//! String-to-value parsers used by the binder
//!
//! Integers are base-detecting:
//! - `0x1f` / `0X1F` hexadecimal
//! - `0o17` / `0O17` octal, and a bare leading zero (`017`) is octal too
//! - `0b101` / `0B101` binary
//! - anything else is decimal
//!
//! Underscores may separate digits (`1_000`, `0x_ff`), never lead or trail.
//! Integers are bounded by the platform's native width (`isize` / `usize`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid syntax: `{0}`")]
    Syntax(String),

    #[error("value out of range: `{0}`")]
    Range(String),
}

/// Parse a signed integer within `isize` bounds
pub fn parse_int(s: &str) -> Result<i64, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Syntax(s.to_string()));
    }

    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = parse_uint(digits).map_err(|err| match err {
        ParseError::Syntax(_) => ParseError::Syntax(s.to_string()),
        ParseError::Range(_) => ParseError::Range(s.to_string()),
    })?;

    let max = isize::MAX as u64;
    if negative {
        if magnitude > max + 1 {
            return Err(ParseError::Range(s.to_string()));
        }
        // magnitude == max + 1 is isize::MIN
        Ok((magnitude as i64).wrapping_neg())
    } else {
        if magnitude > max {
            return Err(ParseError::Range(s.to_string()));
        }
        Ok(magnitude as i64)
    }
}

/// Parse an unsigned integer within `usize` bounds. Signs are rejected.
pub fn parse_uint(s: &str) -> Result<u64, ParseError> {
    let syntax = || ParseError::Syntax(s.to_string());
    if s.is_empty() {
        return Err(syntax());
    }

    let (base, digits) = split_base_prefix(s);
    let max = usize::MAX as u64;
    let mut value: u64 = 0;
    let mut underscores = false;

    for c in digits.bytes() {
        if c == b'_' {
            underscores = true;
            continue;
        }
        let digit = match c {
            b'0'..=b'9' => u64::from(c - b'0'),
            b'a'..=b'z' => u64::from(c - b'a') + 10,
            b'A'..=b'Z' => u64::from(c - b'A') + 10,
            _ => return Err(syntax()),
        };
        if digit >= base {
            return Err(syntax());
        }
        value = value
            .checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .filter(|v| *v <= max)
            .ok_or_else(|| ParseError::Range(s.to_string()))?;
    }

    if underscores && !underscore_ok(s) {
        return Err(syntax());
    }

    Ok(value)
}

/// Parse a 64-bit float. Accepts `inf`, `infinity` and `nan` in any case.
pub fn parse_float(s: &str) -> Result<f64, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Syntax(s.to_string()));
    }

    let cleaned;
    let input = if s.contains('_') {
        if !underscore_ok(s) {
            return Err(ParseError::Syntax(s.to_string()));
        }
        cleaned = s.replace('_', "");
        cleaned.as_str()
    } else {
        s
    };

    let value: f64 = input
        .parse()
        .map_err(|_| ParseError::Syntax(s.to_string()))?;

    if value.is_infinite() && !is_infinity_literal(input) {
        return Err(ParseError::Range(s.to_string()));
    }
    Ok(value)
}

/// Parse the canonical boolean literals
pub fn parse_bool(s: &str) -> Result<bool, ParseError> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseError::Syntax(s.to_string())),
    }
}

fn split_base_prefix(s: &str) -> (u64, &str) {
    let bytes = s.as_bytes();
    if bytes[0] != b'0' {
        return (10, s);
    }
    if bytes.len() >= 3 {
        match bytes[1].to_ascii_lowercase() {
            b'b' => return (2, &s[2..]),
            b'o' => return (8, &s[2..]),
            b'x' => return (16, &s[2..]),
            _ => {}
        }
    }
    (8, &s[1..])
}

fn is_infinity_literal(s: &str) -> bool {
    let unsigned = s.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Underscores must sit between digits (a base prefix counts as a digit)
fn underscore_ok(s: &str) -> bool {
    #[derive(PartialEq)]
    enum Saw {
        Start,
        Digit,
        Underscore,
        Other,
    }

    let mut bytes = s.as_bytes();
    if let Some(b'+' | b'-') = bytes.first() {
        bytes = &bytes[1..];
    }

    let mut saw = Saw::Start;
    let mut hex = false;
    let mut i = 0;
    if bytes.len() >= 2
        && bytes[0] == b'0'
        && matches!(bytes[1].to_ascii_lowercase(), b'b' | b'o' | b'x')
    {
        i = 2;
        saw = Saw::Digit;
        hex = bytes[1].to_ascii_lowercase() == b'x';
    }

    for &c in &bytes[i..] {
        if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
            saw = Saw::Digit;
            continue;
        }
        if c == b'_' {
            if saw != Saw::Digit {
                return false;
            }
            saw = Saw::Underscore;
            continue;
        }
        if saw == Saw::Underscore {
            return false;
        }
        saw = Saw::Other;
    }
    saw != Saw::Underscore
}
