/// Ensure a submitted URL carries an explicit scheme.
///
/// `http` and `https` URLs are returned unchanged. Anything else is treated
/// as schemeless: a foreign scheme or a leading `//` is dropped and `http://`
/// is prepended, keeping host, path, query and fragment as given.
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim();

    if let Some((scheme, rest)) = split_scheme(raw) {
        if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
            return raw.to_string();
        }
        return format!("http://{}", rest.trim_start_matches('/'));
    }

    format!("http://{}", raw.trim_start_matches('/'))
}

/// Split `scheme://rest`, only when the prefix is a syntactically valid scheme.
fn split_scheme(raw: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = raw.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}
