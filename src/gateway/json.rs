//! JSON extraction from model replies.
//!
//! Models wrap their JSON in prose or code fences and often leave trailing
//! commas. The extractor takes the outermost `{...}` span, removes commas
//! that directly precede `}` or `]` outside string literals, and parses.

use serde_json::Value;

/// Extract the JSON object embedded in a model reply.
///
/// Returns `None` when no object can be recovered. A top-level value that is
/// not an object is also `None`.
pub fn extract_json(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    let repaired = strip_trailing_commas(&raw[start..=end]);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => None,
        Err(e) => {
            log::debug!("model reply is not valid JSON after repair: {}", e);
            None
        }
    }
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
