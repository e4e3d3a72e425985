//! Per-user authorization and request rewriting for a single upstream
//! home-automation server.
//!
//! The crate is split in two layers:
//!
//! - [`policy`]: the immutable per-user policy model and its YAML loader
//! - [`engine`]: the gate and rewrite stages that turn a request into an
//!   [`AccessDecision`]
//!
//! ```
//! use authrouter_core::{PolicyModel, RequestFacts, evaluate};
//!
//! let policy = PolicyModel::from_yaml_str(r#"
//! users:
//!   alice:
//!     entrypoint: /basicui/app?sitemap=home
//!     sitemaps:
//!       default: home
//!       allowed: [home]
//! "#).unwrap();
//!
//! let decision = evaluate(&policy, &RequestFacts::new(Some("alice"), "/"));
//! assert_eq!(
//!     decision.rewrite().map(|r| r.target.as_str()),
//!     Some("/basicui/app?sitemap=home")
//! );
//! ```

pub mod engine;
pub mod error;
pub mod policy;

pub use engine::{
    AccessDecision, DenyCode, DenyReason, GateOutcome, PolicyEvaluator, RequestFacts, Rewrite,
    RewriteReason, USER_HEADER, evaluate, gate, rewrite,
};
pub use error::{PolicyError, Result};
pub use policy::{PathRule, PolicyModel, SitemapPolicy, UserPolicy};
