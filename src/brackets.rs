//! Low-level token helpers shared by every annotation and schema parser.
//!
//! Annotation lines carry small `name(value)` tokens (`enum(a,b)`,
//! `example(John Doe)`, `with(author,comments)`, ...) and occasionally a JSON
//! fragment. The helpers here pull those pieces out of a single line. None of
//! them fail: a missing token is reported as an empty string or `None`.

/// Returns the text between the first `name(` ... `)` pair on the line.
///
/// The token name must start at a word boundary, so `with` does not match
/// inside `startswith(`. The value may not contain parentheses. Whitespace is
/// removed from the value unless the token is `example`, whose value is kept
/// verbatim because examples are often human-readable sentences.
///
/// Returns an empty string when the token is absent.
pub fn between_brackets(line: &str, name: &str) -> String {
    let needle = format!("{}(", name);
    let mut search_from = 0;

    while let Some(offset) = line[search_from..].find(&needle) {
        let start = search_from + offset;
        search_from = start + needle.len();

        let at_boundary = line[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if !at_boundary {
            continue;
        }

        let rest = &line[search_from..];
        let Some(close) = rest.find(')') else {
            return String::new();
        };
        let value = &rest[..close];
        if value.contains('(') {
            continue;
        }

        return if name == "example" {
            value.to_string()
        } else {
            value.chars().filter(|c| !c.is_whitespace()).collect()
        };
    }

    String::new()
}

/// Splits a comma separated token value, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the JSON fragment delimited by the first `{` and the last `}`.
pub fn json_fragment(line: &str) -> Option<&str> {
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    (end > start).then(|| &line[start..=end])
}

/// Returns the text between the first `<` and the last `>` (a schema reference).
pub fn angle_reference(line: &str) -> Option<&str> {
    let start = line.find('<')?;
    let end = line.rfind('>')?;
    if end <= start + 1 {
        return None;
    }
    Some(line[start + 1..end].trim())
}

/// Removes every `name(...)` token in `names` from the line.
pub fn strip_tokens(line: &str, names: &[&str]) -> String {
    let mut out = line.to_string();
    for name in names {
        let needle = format!("{}(", name);
        while let Some(start) = out.find(&needle) {
            let Some(close) = out[start..].find(')') else {
                break;
            };
            let mut from = start;
            // `.with(...)` style suffixes
            if from > 0 && out.as_bytes()[from - 1] == b'.' {
                from -= 1;
            }
            out.replace_range(from..start + close + 1, "");
        }
    }
    out
}
