use std::borrow::Cow;

/// Display-only rendering of an API key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();
    if len > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[len - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(len - 8))
    } else {
        "*".repeat(len)
    }
}

const KEY_PREFIXES: [&str; 4] = ["sk-ant-", "sk-or-", "sk-proj-", "sk-"];

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

pub fn redact_api_keys(input: &str) -> Cow<'_, str> {
    let mut redacted = input.to_string();

    for prefix in KEY_PREFIXES {
        if !redacted.contains(prefix) {
            continue;
        }
        let mut out = String::with_capacity(redacted.len());
        let mut rest = redacted.as_str();
        while let Some(idx) = rest.find(prefix) {
            // Only match at a token boundary so words like "task-" stay intact.
            let at_boundary = rest[..idx]
                .chars()
                .next_back()
                .map_or(true, |c| !is_token_char(c));
            out.push_str(&rest[..idx]);
            out.push_str(prefix);
            rest = &rest[idx + prefix.len()..];
            if !at_boundary {
                continue;
            }

            let mut consumed = 0;
            for ch in rest.chars() {
                if is_token_char(ch) {
                    consumed += ch.len_utf8();
                } else {
                    break;
                }
            }
            if consumed > 0 && !rest[..consumed].contains("REDACTED") {
                out.push_str("REDACTED");
            } else {
                out.push_str(&rest[..consumed]);
            }
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        redacted = out;
    }

    // Google keys travel as a query parameter.
    if redacted.contains("key=") {
        let mut out = String::with_capacity(redacted.len());
        let mut rest = redacted.as_str();
        while let Some(idx) = rest.find("key=") {
            out.push_str(&rest[..idx + "key=".len()]);
            rest = &rest[idx + "key=".len()..];
            let mut consumed = 0;
            for ch in rest.chars() {
                if ch == '&' || ch == '"' || ch == ')' || ch.is_whitespace() {
                    break;
                }
                consumed += ch.len_utf8();
            }
            out.push_str("REDACTED");
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        redacted = out;
    }

    if redacted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(redacted)
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() {
        return Some(0);
    }
    if nee.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - nee.len()).find(|&i| {
        hay[i..i + nee.len()]
            .iter()
            .zip(nee)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}

fn redact_header_value(text: String, header: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    loop {
        let Some(idx) = find_ascii_case_insensitive(rest, header) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        // Header name is copied as written in the input.
        out.push_str(&rest[..header.len()]);
        rest = &rest[header.len()..];

        if let Some(first) = rest.chars().next() {
            if first == ' ' {
                out.push(' ');
                rest = &rest[first.len_utf8()..];
            }
        }

        let mut consumed = 0;
        for ch in rest.chars() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            consumed += ch.len_utf8();
        }
        out.push_str(replacement);
        rest = &rest[consumed..];
    }
    out
}

/// Scrubs credentials from text that is about to leave the process
/// (log lines, IPC error messages).
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = redact_api_keys(input).into_owned();

    value = redact_header_value(value, "Authorization: Bearer", "REDACTED");
    value = redact_header_value(value, "x-api-key:", "REDACTED");

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
