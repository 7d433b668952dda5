//! RFC address-list parsing.
//!
//! Extracts addr-specs from header fields like
//! `To: Alice <alice@example.com>, bob@example.com (Bob)`. Display names,
//! quoted strings, nested comments, and source routes are handled well
//! enough to recover the addresses; anything structurally broken is an
//! error, because a field that is present but malformed must skip the
//! message rather than silently lose recipients.

use crate::error::{Error, Result};

/// Parses a comma-separated address list from the named header field.
///
/// # Errors
///
/// Returns [`Error::MalformedAddressList`] when the field is empty or any
/// entry fails to yield a valid addr-spec.
pub fn parse_address_list(field: &str, input: &str) -> Result<Vec<String>> {
    let malformed = |detail: &str| Error::MalformedAddressList {
        field: field.to_string(),
        detail: detail.to_string(),
    };

    let items = split_top_level(input).map_err(|d| malformed(&d))?;
    let mut addresses = Vec::with_capacity(items.len());
    for item in items {
        let spec = extract_addr_spec(item).map_err(|d| malformed(&format!("{item:?}: {d}")))?;
        addresses.push(spec);
    }
    if addresses.is_empty() {
        return Err(malformed("empty address list"));
    }
    Ok(addresses)
}

/// Splits on commas that are outside quotes, comments, and angle brackets.
fn split_top_level(input: &str) -> std::result::Result<Vec<&str>, String> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0usize;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' if comment_depth == 0 => in_quotes = !in_quotes,
            '(' if !in_quotes => comment_depth += 1,
            ')' if !in_quotes => {
                comment_depth = comment_depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            '<' if !in_quotes && comment_depth == 0 => {
                if in_angle {
                    return Err("nested '<'".to_string());
                }
                in_angle = true;
            }
            '>' if !in_quotes && comment_depth == 0 => {
                if !in_angle {
                    return Err("unbalanced '>'".to_string());
                }
                in_angle = false;
            }
            ',' if !in_quotes && comment_depth == 0 && !in_angle => {
                items.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if comment_depth > 0 {
        return Err("unterminated comment".to_string());
    }
    if in_angle {
        return Err("missing '>'".to_string());
    }
    items.push(&input[start..]);
    Ok(items)
}

/// Pulls the addr-spec out of one list entry.
fn extract_addr_spec(item: &str) -> std::result::Result<String, String> {
    let item = item.trim();
    if item.is_empty() {
        return Err("empty address".to_string());
    }

    // name-addr form: the address is inside the angle brackets.
    if let Some(open) = item.rfind('<') {
        let close = item[open..]
            .find('>')
            .map(|i| i + open)
            .ok_or_else(|| "missing '>'".to_string())?;
        let mut spec = item[open + 1..close].trim();
        // Obsolete source route: <@relay1,@relay2:user@example.com>
        if spec.starts_with('@') {
            spec = spec
                .split_once(':')
                .map_or(spec, |(_route, addr)| addr.trim());
        }
        validate_addr_spec(spec)?;
        return Ok(spec.to_string());
    }

    // Bare addr-spec, possibly decorated with comments.
    let spec = strip_comments(item);
    let spec = spec.trim();
    if spec.chars().any(char::is_whitespace) {
        return Err("display name without angle-bracketed address".to_string());
    }
    validate_addr_spec(spec)?;
    Ok(spec.to_string())
}

fn strip_comments(item: &str) -> String {
    let mut out = String::with_capacity(item.len());
    let mut depth = 0usize;
    for c in item.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn validate_addr_spec(spec: &str) -> std::result::Result<(), String> {
    if spec.is_empty() {
        return Err("empty address".to_string());
    }
    let Some((local, domain)) = spec.rsplit_once('@') else {
        return Err("address must contain '@'".to_string());
    };
    if local.is_empty() || domain.is_empty() {
        return Err("local and domain parts cannot be empty".to_string());
    }
    if domain.contains('@') || domain.chars().any(char::is_whitespace) {
        return Err("invalid domain".to_string());
    }
    Ok(())
}
