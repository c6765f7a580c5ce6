//! Version information and the client identification string

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent suffix identifying this library on every request.
///
/// Wikimedia's policy asks clients to identify themselves; callers should
/// prepend their own tool name and contact details.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "mediawiki-client-rs/",
    env!("CARGO_PKG_VERSION"),
    " (https://crates.io/crates/mediawiki-client)"
);

/// Get the crate version
pub fn get_version() -> &'static str {
    VERSION
}

/// Compose the User-Agent header from an optional caller prefix
pub fn user_agent(prefix: Option<&str>) -> String {
    match prefix.map(str::trim) {
        Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, DEFAULT_USER_AGENT),
        _ => DEFAULT_USER_AGENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_manifest() {
        assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let ua = user_agent(Some("MyBot/1.0 (ops@example.org)"));
        assert!(ua.starts_with("MyBot/1.0 (ops@example.org) "));
        assert!(ua.ends_with(DEFAULT_USER_AGENT));
    }

    #[test]
    fn test_user_agent_without_prefix() {
        assert_eq!(user_agent(None), DEFAULT_USER_AGENT);
        assert_eq!(user_agent(Some("   ")), DEFAULT_USER_AGENT);
    }
}
