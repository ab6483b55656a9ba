//! Heuristic repair of near-valid JSON.
//!
//! Runs only after a strict parse of the extracted candidate has failed. Each
//! repair targets one failure signature observed in engine output and is a
//! standalone pure function, applied in the order of [`REPAIR_RULES`]:
//!
//! 1. [`repair_attribute_quotes`] - `width = "200"` leaking from embedded markup
//!    becomes `width=\"200\"`. A quote that closes the string is left alone.
//! 2. [`repair_embedded_newlines`] - raw line breaks inside string values become
//!    the `\n` escape; carriage returns inside strings are dropped.
//! 3. [`repair_trailing_doubled_quote`] - `"done""  ,` and `"done ""  ,` become
//!    `"done",` and `"done ",`.
//!
//! The result is not guaranteed to be valid JSON; callers re-parse it once.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A single text-rewrite rule.
pub type RepairRule = fn(&str) -> String;

/// Repair rules in application order, with names used in logs.
pub const REPAIR_RULES: [(&str, RepairRule); 3] = [
    ("attribute_quotes", repair_attribute_quotes),
    ("embedded_newlines", repair_embedded_newlines),
    ("trailing_doubled_quote", repair_trailing_doubled_quote),
];

/// `name = "value"` with at least one space before the opening quote.
static ATTRIBUTE_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)\s*=\s+"([^"]*)""#).expect("attribute pattern is valid"));

/// A closing quote followed by a stray second quote and a terminator.
///
/// The last non-whitespace character before the first quote must not open a
/// value or escape the quote, so empty or blank strings (`: ""`, `[ " ",`) and
/// escaped quotes (`\" ",`) are left alone.
static TRAILING_DOUBLED_QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s:\[,{\\])(\s*)"\s*"\s*([,}])"#).expect("doubled quote pattern is valid")
});

/// Applies every repair rule in order. Never fails.
pub fn sanitize(candidate: &str) -> String {
    REPAIR_RULES
        .iter()
        .fold(candidate.to_string(), |text, (name, rule)| {
            let repaired = rule(&text);
            if repaired != text {
                tracing::debug!(rule = *name, "sanitizer rule rewrote candidate");
            }
            repaired
        })
}

/// Rewrites `name = "value"` into the escaped form `name=\"value\"`.
///
/// Skipped when the quote after `=` is followed by a JSON delimiter, since
/// that quote ends a string value such as `"let total = "`.
pub fn repair_attribute_quotes(candidate: &str) -> String {
    ATTRIBUTE_QUOTES
        .replace_all(candidate, |caps: &Captures| {
            let value = caps.get(2).map_or("", |m| m.as_str());
            let after_quote = caps.get(2).map_or("", |m| &candidate[m.start()..]);
            if closes_string(after_quote.chars()) {
                caps[0].to_string()
            } else {
                format!(r#"{}=\"{}\""#, &caps[1], value)
            }
        })
        .into_owned()
}

/// Escapes raw line breaks found inside string values.
///
/// Walks the text tracking whether it is inside a string. A quote inside a
/// string only closes it when the next non-whitespace character is a JSON
/// delimiter (`,` `}` `]` `:`) or the end of input; any other quote is treated
/// as unescaped content. Text outside strings is copied unchanged.
pub fn repair_embedded_newlines(candidate: &str) -> String {
    let chars: Vec<char> = candidate.chars().collect();
    let mut out = String::with_capacity(candidate.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\\' => match chars.get(i + 1) {
                // A backslash directly before a raw line break becomes the escape itself.
                Some('\n') => {
                    out.push_str("\\n");
                    i += 1;
                }
                Some(&next) => {
                    out.push('\\');
                    out.push(next);
                    i += 1;
                }
                None => out.push('\\'),
            },
            '"' => {
                if closes_string(chars[i + 1..].iter().copied()) {
                    in_string = false;
                }
                out.push('"');
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Collapses a doubled closing quote before `,` or `}` into a single quote.
pub fn repair_trailing_doubled_quote(candidate: &str) -> String {
    TRAILING_DOUBLED_QUOTE
        .replace_all(candidate, r#"${1}${2}"${3}"#)
        .into_owned()
}

/// True when the text after a quote starts (past whitespace) with a JSON
/// delimiter or is exhausted.
fn closes_string(mut rest: impl Iterator<Item = char>) -> bool {
    rest.find(|c| !c.is_whitespace())
        .map_or(true, |c| matches!(c, ',' | '}' | ']' | ':'))
}
