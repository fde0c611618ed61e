use std::sync::LazyLock;

use regex::Regex;

use super::{Condition, Filter, IndexSel, Op, PathQuery, Segment};

/// `@.field == 'literal'` or `@.field = "literal"`, anchored at the start.
///
/// The pattern is a valid literal, so the fallback is never taken; it only
/// exists because the workspace bans `expect()`.
static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@\.(\w+)\s*==?\s*(?:'([^']*)'|"([^"]*)")"#)
        .unwrap_or_else(|_| Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken")))
});

/// Parses a full query string. Leading `$` and `$.` are optional.
pub(super) fn parse_query(text: &str) -> PathQuery {
    let text = text.trim();
    let body = text.strip_prefix('$').unwrap_or(text);
    let segments = split_top_level(body, '.')
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_segment)
        .collect();
    PathQuery::from_segments(segments)
}

/// Splits `text` on `sep` wherever the separator is outside brackets and
/// outside quoted literals.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            (None, _) => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte offset of the `]` closing a bracket whose body starts at `body`.
fn closing_bracket(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn parse_segment(text: &str) -> Segment {
    let mut ops = Vec::new();
    let split = text.find('[').unwrap_or(text.len());
    let base = text[..split].trim();
    if !base.is_empty() {
        ops.push(Op::Key(base.to_owned()));
    }

    let mut rest = &text[split..];
    while !rest.is_empty() {
        if let Some(body) = rest.strip_prefix('[') {
            match closing_bracket(body) {
                Some(end) => {
                    let content = body[..end].trim();
                    if !content.is_empty() {
                        ops.push(parse_bracket(content));
                    }
                    rest = &body[end + 1..];
                }
                None => {
                    ops.push(Op::Index(IndexSel::Nothing));
                    rest = "";
                }
            }
        } else {
            // Stray text between brackets.
            let end = rest.find('[').unwrap_or(rest.len());
            if !rest[..end].trim().is_empty() {
                ops.push(Op::Index(IndexSel::Nothing));
            }
            rest = &rest[end..];
        }
    }
    Segment::new(ops)
}

fn parse_bracket(content: &str) -> Op {
    if content == "*" {
        return Op::Index(IndexSel::All);
    }
    if let Some(expr) = content
        .strip_prefix("?(")
        .and_then(|inner| inner.strip_suffix(')'))
    {
        return Op::Filter(parse_filter(expr.trim()));
    }
    match content.parse::<usize>() {
        Ok(n) => Op::Index(IndexSel::At(n)),
        Err(_) => Op::Index(IndexSel::Nothing),
    }
}

fn parse_filter(expr: &str) -> Filter {
    Filter {
        conditions: split_conjuncts(expr)
            .into_iter()
            .map(|c| parse_condition(c.trim()))
            .collect(),
    }
}

/// Splits a filter body on `and`, `&&` and `&` outside quoted literals.
fn split_conjuncts(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut skip_to = 0;
    for (i, c) in expr.char_indices() {
        if i < skip_to {
            continue;
        }
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '&') => {
                parts.push(&expr[start..i]);
                let width = if expr[i..].starts_with("&&") { 2 } else { 1 };
                start = i + width;
                skip_to = start;
            }
            (None, c) if c.is_whitespace() => {
                let tail = &expr[i..];
                let after = tail.trim_start().strip_prefix("and");
                if let Some(after) = after.filter(|a| a.starts_with(char::is_whitespace)) {
                    parts.push(&expr[start..i]);
                    start = expr.len() - after.len();
                    skip_to = start;
                }
            }
            (None, _) => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// Reads `@.field == 'literal'` (a single `=` is accepted too). Text after the
/// closing quote is ignored.
fn parse_condition(text: &str) -> Condition {
    match CONDITION_RE.captures(text) {
        Some(caps) => {
            let literal = caps.get(2).or_else(|| caps.get(3));
            Condition::Equals {
                field: caps[1].to_owned(),
                literal: literal.map(|m| m.as_str().to_owned()).unwrap_or_default(),
            }
        }
        None => Condition::Malformed(text.to_owned()),
    }
}
