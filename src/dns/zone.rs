//! Zone name construction.

/// Label prepended to every queried host.
pub const BASE_ZONE: &str = "_redirect";

/// Label substituted for the first host label on wildcard lookups.
pub const WILDCARD_LABEL: &str = "_";

/// Build the absolute lookup zone for a host.
///
/// `example.com:8080` becomes `_redirect.example.com.`.
pub fn lookup_zone(host: &str) -> String {
    let host = crate::http::request::strip_port(host);

    let mut zone = if host.starts_with(BASE_ZONE) {
        host.to_string()
    } else {
        format!("{BASE_ZONE}.{host}")
    };
    if !zone.ends_with('.') {
        zone.push('.');
    }
    zone
}

/// Replace the first label of `host` with the wildcard label.
pub fn wildcard_host(host: &str) -> String {
    match host.split_once('.') {
        Some((_, rest)) => format!("{WILDCARD_LABEL}.{rest}"),
        None => WILDCARD_LABEL.to_string(),
    }
}

/// Zone for a URL path below `host`, most specific label first.
///
/// `/a/b` on `example.com` gives `b.a.example.com`.
pub fn path_zone(host: &str, segments: &[&str]) -> String {
    let mut labels: Vec<&str> = segments.iter().rev().copied().collect();
    labels.push(host);
    labels.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_zone() {
        assert_eq!(lookup_zone("example.com"), "_redirect.example.com.");
        assert_eq!(lookup_zone("example.com:8080"), "_redirect.example.com.");
        assert_eq!(lookup_zone("_redirect.about.test."), "_redirect.about.test.");
        assert_eq!(lookup_zone("_redirect.about.test"), "_redirect.about.test.");
    }

    #[test]
    fn test_wildcard_host() {
        assert_eq!(wildcard_host("docs.example.com"), "_.example.com");
        assert_eq!(wildcard_host("localhost"), "_");
    }

    #[test]
    fn test_path_zone() {
        assert_eq!(path_zone("example.com", &["a", "b"]), "b.a.example.com");
        assert_eq!(path_zone("example.com", &[]), "example.com");
    }
}
