//! Trusted parent origins.

/// Origins allowed to talk to the embed: production parent sites plus the
/// local dev server.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://www.ieduguide.com",
    "https://ieduguide.com",
    "https://eduguiders.com",
    "https://www.eduguiders.com",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Fixed set of origins matched by exact string equality.
///
/// No wildcard, suffix or case folding: `https://ieduguide.com.evil.example`
/// and `HTTPS://ieduguide.com` are both rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAllowlist {
    origins: Vec<String>,
}

impl OriginAllowlist {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

impl Default for OriginAllowlist {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origins_allowed() {
        let allowlist = OriginAllowlist::default();
        for origin in DEFAULT_ALLOWED_ORIGINS {
            assert!(allowlist.contains(origin), "{origin} should be allowed");
        }
    }

    #[test]
    fn test_exact_match_only() {
        let allowlist = OriginAllowlist::default();
        assert!(!allowlist.contains("https://evil.example"));
        assert!(!allowlist.contains("https://ieduguide.com.evil.example"));
        assert!(!allowlist.contains("https://sub.ieduguide.com"));
        assert!(!allowlist.contains("HTTPS://ieduguide.com"));
        assert!(!allowlist.contains("https://ieduguide.com/"));
        assert!(!allowlist.contains("http://localhost:5174"));
        assert!(!allowlist.contains(""));
        assert!(!allowlist.contains("null"));
    }

    #[test]
    fn test_custom_allowlist() {
        let allowlist = OriginAllowlist::new(["https://parent.test"]);
        assert!(allowlist.contains("https://parent.test"));
        assert!(!allowlist.contains("https://ieduguide.com"));
        assert_eq!(allowlist.iter().count(), 1);
    }
}
