//! Per-user access policy model.
//!
//! The model is built once at startup (see [`loader`]) and is read-only for
//! the rest of the process lifetime. Handlers share it through an `Arc`
//! without any locking.
//!
//! # Document shape
//!
//! ```yaml
//! passthrough: false
//! users:
//!   alice:
//!     entrypoint: /basicui/app?sitemap=home
//!     sitemaps:
//!       default: home
//!       allowed: [home, garden]
//!     paths:
//!       /paperui:
//!         allowed: false
//! ```

pub mod loader;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel entry of [`SitemapPolicy::allowed`] that permits every sitemap.
pub const WILDCARD_SITEMAP: &str = "*";

// =============================================================================
// Policy Model
// =============================================================================

/// Root of the policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyModel {
    /// Disables the gate and rewrite stages for every request.
    #[serde(default)]
    pub passthrough: bool,

    /// Policies keyed by the exact (case-sensitive) trusted username.
    #[serde(default)]
    pub users: HashMap<String, UserPolicy>,
}

impl PolicyModel {
    /// Look up the policy for a username.
    #[must_use]
    pub fn lookup(&self, username: &str) -> Option<&UserPolicy> {
        self.users.get(username)
    }

    /// Usernames in lexical order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.into_iter()
    }
}

// =============================================================================
// User Policy
// =============================================================================

/// Access rules for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPolicy {
    /// Absolute request target the user lands on for `/` or a denied path.
    #[serde(default)]
    pub entrypoint: String,

    /// Which sitemaps the user may open.
    #[serde(default)]
    pub sitemaps: SitemapPolicy,

    /// Raw-URI substrings and whether they may be accessed, in document order.
    #[serde(default)]
    pub paths: IndexMap<String, PathRule>,
}

impl UserPolicy {
    /// First fragment contained in `uri` whose rule denies access.
    pub fn denied_fragment(&self, uri: &str) -> Option<&str> {
        self.paths
            .iter()
            .find(|(fragment, rule)| !rule.allowed && uri.contains(fragment.as_str()))
            .map(|(fragment, _)| fragment.as_str())
    }
}

/// Sitemap allow-list of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapPolicy {
    /// Sitemap used whenever none or a forbidden one is requested.
    #[serde(default)]
    pub default: String,

    /// Permitted sitemaps. `["*"]` alone permits every sitemap.
    #[serde(default)]
    pub allowed: Vec<String>,
}

impl SitemapPolicy {
    /// Whether the allow-list is exactly the wildcard sentinel.
    ///
    /// A list mixing `*` with named sitemaps does not count.
    #[must_use]
    pub fn allows_all(&self) -> bool {
        matches!(self.allowed.as_slice(), [only] if only == WILDCARD_SITEMAP)
    }

    /// Whether `sitemap` may be opened through the basic UI.
    ///
    /// The default sitemap is always permitted.
    #[must_use]
    pub fn permits(&self, sitemap: &str) -> bool {
        sitemap == self.default
            || self.allows_all()
            || self.allowed.iter().any(|allowed| allowed == sitemap)
    }

    /// Whether a REST sitemap URI is permitted.
    ///
    /// Matches allowed names as substrings of the whole raw URI, so `a`
    /// also admits `/rest/sitemaps/abc`.
    #[must_use]
    pub fn permits_rest_uri(&self, uri: &str) -> bool {
        self.allows_all() || self.allowed.iter().any(|allowed| uri.contains(allowed.as_str()))
    }
}

/// Rule for one path fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    /// `false` sends the user to their entrypoint.
    #[serde(default)]
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sitemaps(default: &str, allowed: &[&str]) -> SitemapPolicy {
        SitemapPolicy {
            default: default.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_wildcard_only_as_single_entry() {
        assert!(sitemaps("home", &["*"]).allows_all());
        assert!(!sitemaps("home", &["*", "admin"]).allows_all());
        assert!(!sitemaps("home", &["admin"]).allows_all());
    }

    #[test]
    fn test_default_sitemap_always_permitted() {
        let policy = sitemaps("home", &["admin"]);
        assert!(policy.permits("home"));
        assert!(policy.permits("admin"));
        assert!(!policy.permits("other"));
    }

    #[test]
    fn test_mixed_wildcard_is_a_plain_name() {
        let policy = sitemaps("home", &["*", "admin"]);
        assert!(policy.permits("*"));
        assert!(!policy.permits("garage"));
    }

    #[test]
    fn test_rest_uri_uses_substring_match() {
        let policy = sitemaps("home", &["a"]);
        assert!(policy.permits_rest_uri("/rest/sitemaps/abc"));
        assert!(!sitemaps("home", &["zzz"]).permits_rest_uri("/rest/sitemaps/abc"));
    }

    #[test]
    fn test_denied_fragment_in_document_order() {
        let mut user = UserPolicy::default();
        user.paths.insert("/open".into(), PathRule { allowed: true });
        user.paths.insert("/paperui".into(), PathRule { allowed: false });
        user.paths.insert("/paper".into(), PathRule { allowed: false });

        assert_eq!(user.denied_fragment("/paperui/index.html"), Some("/paperui"));
        assert_eq!(user.denied_fragment("/paper/x"), Some("/paper"));
        assert_eq!(user.denied_fragment("/open/paperless"), None);
    }

    #[test]
    fn test_allowed_fragment_does_not_mask_denial() {
        let mut user = UserPolicy::default();
        user.paths.insert("/habpanel".into(), PathRule { allowed: true });
        user.paths.insert("/habpanel/admin".into(), PathRule { allowed: false });

        assert_eq!(
            user.denied_fragment("/habpanel/admin/x"),
            Some("/habpanel/admin")
        );
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut model = PolicyModel::default();
        model.users.insert("alice".into(), UserPolicy::default());

        assert!(model.lookup("alice").is_some());
        assert!(model.lookup("Alice").is_none());
    }

    #[test]
    fn test_usernames_sorted() {
        let mut model = PolicyModel::default();
        for name in ["carol", "alice", "bob"] {
            model.users.insert(name.into(), UserPolicy::default());
        }
        let names: Vec<&str> = model.usernames().collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }
}
