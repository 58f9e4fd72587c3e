//! Descriptor URL handling.
//!
//! Covers exactly the URL shapes UPnP descriptions use: an absolute
//! `scheme://host/...` entry point plus absolute, host-relative or
//! path-relative sub-resource references. No `..` or query normalization.

/// Resolve a possibly relative sub-resource reference against the URL of the
/// document that referenced it.
pub fn resolve(base: &str, reference: &str) -> String {
    if reference.starts_with("http") {
        return reference.to_string();
    }
    if reference.starts_with('/') {
        // scheme + empty + host segments of the base
        let origin: Vec<&str> = base.split('/').take(3).collect();
        return format!("{}{}", origin.join("/"), reference);
    }
    let mut parts: Vec<&str> = base.split('/').collect();
    parts.pop();
    format!("{}/{}", parts.join("/"), reference.trim_start_matches('/'))
}

/// Hostname (with port, if any) of a descriptor URL: the third `/`-delimited
/// component of `scheme://host/...`.
pub fn hostname(url: &str) -> Option<&str> {
    url.split('/').nth(2).filter(|host| !host.is_empty())
}
