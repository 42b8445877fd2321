//! Fee-input parsing.
//!
//! The legal/advisory fee field is free-form: either a percentage of the
//! bid ("4%", "2,5 %") or a Brazilian-locale currency literal
//! ("1.500,00", "R$ 2.500"). Parsing never fails — anything unreadable
//! is worth zero, so an in-progress form never blocks the calculation.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Strip currency-symbol prefixes and whitespace.
fn clean(input: &str) -> String {
    let mut s = input.replace("R$", "").replace("r$", "");
    s.retain(|c| !c.is_whitespace());
    s
}

/// Parse the longest leading numeric prefix of `s` (sign, digits, one
/// decimal point). Returns None when no digit is found.
fn numeric_prefix(s: &str) -> Option<Decimal> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => end = i + 1,
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    let slice = &s[..end];
    slice
        .parse::<Decimal>()
        .ok()
        .or_else(|| slice.parse::<f64>().ok().and_then(Decimal::from_f64))
}

/// If `input` encodes a percentage, return it as a fraction of the bid
/// (e.g. "4%" → 0.04). Returns None for flat currency inputs.
///
/// The numeric portion before the first `%` is read with the
/// comma-as-decimal-separator convention; an unreadable portion counts
/// as 0%.
pub fn percent_rate(input: &str) -> Option<Decimal> {
    let cleaned = clean(input);
    let pos = cleaned.find('%')?;
    let number = cleaned[..pos].replacen(',', ".", 1);
    Some(numeric_prefix(&number).unwrap_or(Decimal::ZERO) / dec!(100))
}

/// Interpret a fee-input field against a bid amount.
///
/// Percentage inputs resolve against `bid`; flat inputs resolve to their
/// literal value with `.` as thousands separator and `,` as decimal
/// separator. Empty or unparseable input yields zero.
pub fn parse_fee(input: &str, bid: Decimal) -> Decimal {
    if input.trim().is_empty() {
        return Decimal::ZERO;
    }

    if let Some(rate) = percent_rate(input) {
        return bid * rate;
    }

    let normalized = clean(input).replace('.', "").replacen(',', ".", 1);
    numeric_prefix(&normalized).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
