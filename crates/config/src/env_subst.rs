//! `${ENV_VAR}` substitution for raw config text, applied before parsing
//! so secrets never live in the file. Shell-style fallbacks are supported:
//! `${VAR:-default}` resolves to `default` when `VAR` is unset.

/// Replace every `${...}` placeholder in `input`.
///
/// An unset variable without a fallback is left as the literal placeholder,
/// so validation downstream fails on the unexpanded name instead of an
/// empty string.
pub fn substitute_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_on = &rest[start + 2..];
        match body_on.find('}') {
            Some(end) => {
                out.push_str(&resolve(&body_on[..end]));
                rest = &body_on[end + 1..];
            },
            None => {
                // Unterminated placeholder, emit the tail literally.
                out.push_str(&rest[start..]);
                return out;
            },
        }
    }
    out.push_str(rest);
    out
}

fn resolve(body: &str) -> String {
    let (name, fallback) = match body.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (body, None),
    };
    if name.is_empty() {
        return format!("${{{body}}}");
    }
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => match fallback {
            Some(fallback) => fallback.to_string(),
            None => format!("${{{body}}}"),
        },
    }
}
