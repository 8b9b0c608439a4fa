//! Descriptor keywords and the conversion each one's value receives.
//!
//! A descriptor line is `<KEYWORD><whitespace><value>`. Keywords not listed
//! here (statistics blocks such as `ULOADS`, `MEAN`, their continuation
//! lines) are ignored by the parser.

use std::sync::OnceLock;

use regex::Regex;

use crate::bladed::types::models::NumericFormat;

/// How a keyword's value is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text, kept as written.
    Text,
    /// Free text with single quotes removed.
    QuotedText,
    /// Whitespace separated words.
    TextList,
    /// Every `'...'` enclosed item.
    QuotedList,
    Int,
    IntList,
    Float,
    FloatList,
    /// `<kind>*<width>` element format.
    Format,
}

/// A converted keyword value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    TextList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
    Float(f64),
    FloatList(Vec<f64>),
    Format(NumericFormat),
}

/// Keywords that must be present to locate a descriptor's data.
pub const REQUIRED: &[&str] = &["NDIMENS", "DIMENS", "FORMAT", "VARIAB", "VARUNIT"];

/// Returns the conversion for a known keyword.
pub fn kind_of(keyword: &str) -> Option<ValueKind> {
    let kind = match keyword {
        "FILE" | "ACCESS" | "FORM" | "AXIUNIT" => ValueKind::Text,
        "CONTENT" | "CONFIG" | "GENLAB" | "AXISLAB" => ValueKind::QuotedText,
        "VARUNIT" => ValueKind::TextList,
        "VARIAB" | "AXITICK" => ValueKind::QuotedList,
        "RECL" | "NDIMENS" | "AXIMETH" | "NVARS" | "HEADREC" => ValueKind::Int,
        "DIMENS" => ValueKind::IntList,
        "MIN" | "STEP" | "VAROFFSET" => ValueKind::Float,
        "AXIVAL" | "VARSCALE" => ValueKind::FloatList,
        "FORMAT" => ValueKind::Format,
        _ => return None,
    };
    Some(kind)
}

/// Splits a line into keyword and value at the first whitespace run.
///
/// Returns `None` for blank lines and lines without a value.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let split_at = line.find(char::is_whitespace)?;
    let (keyword, rest) = line.split_at(split_at);
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((keyword, rest))
}

fn quoted_regex() -> &'static Regex {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    QUOTED.get_or_init(|| Regex::new(r"'([^']*)'").expect("Invalid quoted-item regex pattern"))
}

fn format_regex() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| {
        Regex::new(r"^([A-Za-z])\*(\d+)$").expect("Invalid format-token regex pattern")
    })
}

/// Converts a keyword's raw value.
///
/// The error string describes what could not be converted; the caller
/// attaches the path and line number.
pub fn convert(kind: ValueKind, raw: &str) -> Result<Value, String> {
    match kind {
        ValueKind::Text => Ok(Value::Text(raw.to_string())),
        ValueKind::QuotedText => Ok(Value::Text(raw.replace('\'', "").trim().to_string())),
        ValueKind::TextList => Ok(Value::TextList(
            raw.split_whitespace().map(str::to_string).collect(),
        )),
        ValueKind::QuotedList => {
            let items: Vec<String> = quoted_regex()
                .captures_iter(raw)
                .map(|c| c[1].trim().to_string())
                .collect();
            if items.is_empty() {
                return Err(format!("expected quoted items, found {:?}", raw));
            }
            Ok(Value::TextList(items))
        }
        ValueKind::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("invalid integer {:?}", raw)),
        ValueKind::IntList => raw
            .split_whitespace()
            .map(|s| s.parse::<i64>().map_err(|_| format!("invalid integer {:?}", s)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::IntList),
        ValueKind::Float => parse_float(raw).map(Value::Float),
        ValueKind::FloatList => raw
            .split_whitespace()
            .map(parse_float)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::FloatList),
        ValueKind::Format => {
            let caps = format_regex()
                .captures(raw)
                .ok_or_else(|| format!("invalid element format {:?}", raw))?;
            let width = caps[2]
                .parse::<usize>()
                .map_err(|_| format!("invalid element width in {:?}", raw))?;
            let kind = caps[1]
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .ok_or_else(|| format!("invalid element format {:?}", raw))?;
            Ok(Value::Format(NumericFormat { kind, width }))
        }
    }
}

// Fortran writers may emit a `D` exponent.
fn parse_float(raw: &str) -> Result<f64, String> {
    raw.replace(|c: char| c == 'D' || c == 'd', "E")
        .parse::<f64>()
        .map_err(|_| format!("invalid number {:?}", raw))
}
