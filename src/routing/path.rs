//! Request path normalization.

/// Canonicalize a raw request path.
///
/// Drops the query string and fragment, strips `base_url` when it prefixes
/// the path at a segment boundary (case-insensitively, like route matching), collapses repeated separators and trims
/// the trailing one. The result always starts with `/`; the root is `"/"`.
pub fn normalize(raw: &str, base_url: Option<&str>) -> String {
    let path = raw
        .split_once(['?', '#'])
        .map(|(p, _)| p)
        .unwrap_or(raw);

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(base) = base_url {
        let prefix: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
        if !prefix.is_empty()
            && segments.len() >= prefix.len()
            && segments.iter().zip(&prefix).all(|(a, b)| a.to_lowercase() == b.to_lowercase())
        {
            segments.drain(..prefix.len());
        }
    }

    format!("/{}", segments.join("/"))
}

/// First segment of a normalized path, or `None` for the root.
pub fn first_segment(normalized: &str) -> Option<&str> {
    normalized
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}
