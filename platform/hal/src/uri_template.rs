//! Expansion for the RFC 6570 subset found in HAL links: simple `{var}`
//! substitution plus form-style `{?a,b}` and `{&a,b}` query expressions.

use url::form_urlencoded::byte_serialize;

/// Result of expanding a template. `unused` holds the params the template
/// did not name, in their original order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expanded {
    pub uri: String,
    pub unused: Vec<(String, String)>,
}

pub fn expand(template: &str, params: &[(String, String)]) -> Expanded {
    let mut used = vec![false; params.len()];
    let mut uri = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        uri.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            uri.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let expression = &rest[open + 1..open + close];
        expand_expression(expression, params, &mut used, &mut uri);
        rest = &rest[open + close + 1..];
    }
    uri.push_str(rest);

    let unused = params
        .iter()
        .zip(used)
        .filter(|(_, used)| !used)
        .map(|(pair, _)| pair.clone())
        .collect();
    Expanded { uri, unused }
}

fn expand_expression(
    expression: &str,
    params: &[(String, String)],
    used: &mut [bool],
    out: &mut String,
) {
    let (operator, vars) = match expression.chars().next() {
        Some(op @ ('?' | '&')) => (Some(op), &expression[1..]),
        _ => (None, expression),
    };

    let mut pairs = Vec::new();
    for var in vars.split(',') {
        let name = variable_name(var);
        if name.is_empty() {
            continue;
        }
        if let Some(idx) = params.iter().position(|(key, _)| key == name) {
            used[idx] = true;
            let value = &params[idx].1;
            let encoded = match operator {
                Some(_) => form_encode(value),
                None => encode_unreserved(value),
            };
            pairs.push((name, encoded));
        }
    }

    match operator {
        Some(op) => {
            if pairs.is_empty() {
                return;
            }
            out.push(op);
            let joined = pairs
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            out.push_str(&joined);
        }
        None => {
            let joined = pairs
                .into_iter()
                .map(|(_, value)| value)
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&joined);
        }
    }
}

// strips explode (`*`) and prefix (`:n`) modifiers
fn variable_name(var: &str) -> &str {
    let var = var.trim();
    let var = var.split(':').next().unwrap_or(var);
    var.trim_end_matches('*')
}

fn form_encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Simple string expansion: everything outside the unreserved set is
/// percent-encoded, so a space is `%20` and `+` stays distinguishable.
fn encode_unreserved(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
