//! Date parsing and pattern formatting
//!
//! Field patterns use the familiar `yyyy-MM-dd HH:mm:ss` letter notation.
//! They are translated to chrono format items before rendering.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

/// Accepted on import for date fields, tried in order
pub const DATE_IMPORT_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Accepted on import for date-time fields, tried in order
pub const DATE_TIME_IMPORT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse a date against [`DATE_IMPORT_FORMATS`]
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let trimmed = text.trim();
    DATE_IMPORT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("invalid date '{}' (expected yyyy/MM/dd or yyyy-MM-dd)", text))
}

/// Parse a date-time against [`DATE_TIME_IMPORT_FORMATS`]
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime, String> {
    let trimmed = text.trim();
    DATE_TIME_IMPORT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            format!(
                "invalid date-time '{}' (expected yyyy-MM-dd HH:mm:ss or yyyy/MM/dd HH:mm:ss)",
                text
            )
        })
}

/// Render a timestamp with a letter pattern such as `yyyy/MM/dd HH:mm`
pub fn format_with_pattern(value: &NaiveDateTime, pattern: &str) -> Result<String, String> {
    let chrono_fmt = to_chrono_format(pattern);
    let mut out = String::new();
    write!(out, "{}", value.format(&chrono_fmt))
        .map_err(|_| format!("cannot format value with pattern '{}'", pattern))?;
    Ok(out)
}

/// Translate a letter pattern into a chrono format string.
///
/// Runs of the same letter form one token. Text inside single quotes is
/// literal and `''` is an escaped quote. Letters without a chrono
/// equivalent pass through unchanged.
pub fn to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        match letter_token(c, run) {
            Some(token) => out.push_str(token),
            None => (0..run).for_each(|_| out.push(c)),
        }
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn letter_token(letter: char, run: usize) -> Option<&'static str> {
    let token = match (letter, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('S', _) => "%3f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('D', _) => "%j",
        _ => return None,
    };
    Some(token)
}
