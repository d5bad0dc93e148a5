//! Output line formats for a lattice's length distribution.

use serde::Serialize;

use crate::distribution::Distribution;

/// `<key> <len> <logprob> ; <len> <logprob> ; ...`
///
/// A lattice without entries prints only its key.
pub fn format_text_line(key: &str, dist: &Distribution) -> String {
    let mut line = String::from(key);
    for entry in dist.iter() {
        line.push(' ');
        line.push_str(&entry.length.to_string());
        line.push(' ');
        line.push_str(&format_float(entry.log_prob));
        line.push_str(" ;");
    }
    line
}

#[derive(Serialize)]
struct JsonLine<'a> {
    key: &'a str,
    lengths: &'a Distribution,
}

/// `{"key":"utt1","lengths":[{"length":2,"log_prob":-0.31}, ...]}`
pub fn format_json_line(key: &str, dist: &Distribution) -> Result<String, serde_json::Error> {
    serde_json::to_string(&JsonLine { key, lengths: dist })
}

/// Shortest representation with 6 significant digits, switching to
/// exponent notation for very small or large magnitudes (`%g`).
pub fn format_float(value: f64) -> String {
    const PRECISION: i32 = 6;
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    // Round to the target precision first: the exponent of the rounded
    // value decides the notation.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let mantissa = strip_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
