//! Parsing of Remote Script replies.
//!
//! Term answers queries with `key=value:` text, e.g. `potential= 1.0e-3V:`
//! or `impedance=12.5,-3.25:`. The assignment may follow other text (an echo
//! of the key, a status prefix), so replies are searched rather than matched
//! from the start. Values may carry leading whitespace and a trailing unit.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ScriptError};

static CURRENT_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"current=\s*(.*?)A?:").expect("invalid current pattern"));

static POTENTIAL_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"potential=\s*(.*?)V?:").expect("invalid potential pattern"));

static IMPEDANCE_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"impedance=\s*(.*?),(.*?):").expect("invalid impedance pattern"));

/// Longest decimal or scientific number at the start of a value.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("invalid number pattern")
});

/// Parse the reply to `CURRENT`, in amperes.
pub fn current(reply: &str) -> Result<f64> {
    scalar("CURRENT", reply, &CURRENT_REPLY)
}

/// Parse the reply to `POTENTIAL`, in volts.
pub fn potential(reply: &str) -> Result<f64> {
    scalar("POTENTIAL", reply, &POTENTIAL_REPLY)
}

/// Parse the reply to `IMPEDANCE` into `(real, imaginary)` ohms.
pub fn impedance(reply: &str) -> Result<(f64, f64)> {
    let captures = IMPEDANCE_REPLY
        .captures(reply)
        .ok_or_else(|| unexpected("IMPEDANCE", reply))?;
    Ok((number(&captures[1])?, number(&captures[2])?))
}

/// Parse the number a value starts with.
///
/// Text after the number (a unit prefix such as the `m` in `1.5mA`) is
/// ignored. A value that does not start with a number is an error.
pub fn number(text: &str) -> Result<f64> {
    let value = text.trim();
    let invalid = |source| ScriptError::InvalidNumber {
        value: value.to_string(),
        source,
    };
    match LEADING_NUMBER.find(value) {
        Some(found) => found.as_str().parse::<f64>().map_err(invalid),
        None => value.parse::<f64>().map_err(invalid),
    }
}

fn scalar(command: &str, reply: &str, pattern: &Regex) -> Result<f64> {
    let captures = pattern
        .captures(reply)
        .ok_or_else(|| unexpected(command, reply))?;
    number(&captures[1])
}

fn unexpected(command: &str, reply: &str) -> ScriptError {
    ScriptError::UnexpectedReply {
        command: command.to_string(),
        reply: reply.to_string(),
    }
}
