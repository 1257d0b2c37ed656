//! `${NAME}` expansion applied to raw config text before parsing.

/// Expand `${NAME}` placeholders from the process environment.
///
/// Unset variables, names that are not identifiers, and an unterminated
/// trailing `${` are all kept verbatim.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let body = &rest[open + 2..];
        let Some(close) = body.find('}') else {
            // No closing brace anywhere after: the tail is plain text.
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &body[..close];
        if !is_env_name(name) {
            // Not a placeholder. Rescan from inside so `${a ${B}}` still expands B.
            out.push_str("${");
            rest = body;
            continue;
        }

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..open + close + 3]),
        }
        rest = &body[close + 1..];
    }

    out.push_str(rest);
    out
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_env_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    matches!(bytes.next(), Some(b) if b == b'_' || b.is_ascii_alphabetic())
        && bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
}
