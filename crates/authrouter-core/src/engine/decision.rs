//! Per-request decision types.

use std::fmt;

/// Trusted header carrying the already-authenticated username.
pub const USER_HEADER: &str = "X-Forwarded-Username";

// =============================================================================
// Access Decision
// =============================================================================

/// Result of evaluating one request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Forward the request, optionally with a new target.
    Allow(Option<Rewrite>),
    /// Reject the request.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns `true` if the request may be forwarded.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Returns `true` if the request is rejected.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// The rewrite to apply before forwarding, if any.
    #[must_use]
    pub fn rewrite(&self) -> Option<&Rewrite> {
        match self {
            Self::Allow(rewrite) => rewrite.as_ref(),
            Self::Deny(_) => None,
        }
    }

    /// The deny reason if the request is rejected.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow(_) => None,
        }
    }
}

// =============================================================================
// Deny Reason
// =============================================================================

/// Why the gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyCode {
    /// The trusted username header is absent or empty.
    MissingUserHeader,
    /// The username has no policy.
    UnknownUser,
}

impl DenyCode {
    /// HTTP status to answer with.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::MissingUserHeader => 400,
            Self::UnknownUser => 403,
        }
    }

    /// Stable code for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingUserHeader => "missing-user-header",
            Self::UnknownUser => "unknown-user",
        }
    }
}

impl fmt::Display for DenyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection produced by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyReason {
    /// Machine-readable cause.
    pub code: DenyCode,
    /// Body text for the client; empty for unknown users.
    pub message: String,
}

impl DenyReason {
    /// The trusted header was missing or empty.
    #[must_use]
    pub fn missing_user_header() -> Self {
        Self {
            code: DenyCode::MissingUserHeader,
            message: format!("the header '{USER_HEADER}' is either not set or empty"),
        }
    }

    /// The username is not configured.
    #[must_use]
    pub fn unknown_user() -> Self {
        Self {
            code: DenyCode::UnknownUser,
            message: String::new(),
        }
    }

    /// HTTP status to answer with.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

// =============================================================================
// Rewrite
// =============================================================================

/// New request target (path and query) chosen by the rewrite stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Replacement request target, always starting with `/`.
    pub target: String,
    /// Rule that produced the rewrite.
    pub reason: RewriteReason,
}

impl Rewrite {
    pub(crate) fn new(target: impl Into<String>, reason: RewriteReason) -> Self {
        Self {
            target: target.into(),
            reason,
        }
    }
}

/// Rule that triggered a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteReason {
    /// The root path was requested.
    Entrypoint,
    /// The URI contains a denied path fragment.
    DeniedPath {
        /// The configured fragment that matched.
        fragment: String,
    },
    /// The basic UI was opened without a sitemap.
    MissingSitemap,
    /// The basic UI was opened with a sitemap the user may not see.
    ForbiddenSitemap {
        /// The sitemap that was asked for.
        requested: String,
    },
    /// The REST `_default` sitemap alias was requested.
    RestDefaultSitemap,
    /// A REST sitemap resource the user may not see was requested.
    RestForbiddenSitemap {
        /// The sitemap id that was asked for.
        requested: String,
    },
}

impl fmt::Display for RewriteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entrypoint => write!(f, "root path requested"),
            Self::DeniedPath { fragment } => write!(f, "access to '{fragment}' denied"),
            Self::MissingSitemap => write!(f, "no sitemap given"),
            Self::ForbiddenSitemap { requested } => {
                write!(f, "access to sitemap '{requested}' denied")
            }
            Self::RestDefaultSitemap => write!(f, "default sitemap alias requested"),
            Self::RestForbiddenSitemap { requested } => {
                write!(f, "access to sitemap '{requested}' denied via REST")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_header_message() {
        let reason = DenyReason::missing_user_header();
        assert_eq!(reason.status(), 400);
        assert_eq!(
            reason.message,
            "the header 'X-Forwarded-Username' is either not set or empty"
        );
    }

    #[test]
    fn test_unknown_user_has_empty_body() {
        let reason = DenyReason::unknown_user();
        assert_eq!(reason.status(), 403);
        assert!(reason.message.is_empty());
    }

    #[test]
    fn test_decision_accessors() {
        let allow = AccessDecision::Allow(Some(Rewrite::new("/x", RewriteReason::Entrypoint)));
        assert!(allow.is_allowed());
        assert_eq!(allow.rewrite().map(|r| r.target.as_str()), Some("/x"));
        assert!(allow.deny_reason().is_none());

        let deny = AccessDecision::Deny(DenyReason::unknown_user());
        assert!(deny.is_denied());
        assert!(deny.rewrite().is_none());
        assert_eq!(deny.deny_reason().map(|r| r.code), Some(DenyCode::UnknownUser));
    }
}
