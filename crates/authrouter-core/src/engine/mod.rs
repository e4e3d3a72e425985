//! Request authorization and rewrite engine.
//!
//! Evaluation is a pure function of the request facts and the policy
//! model. It is composed of two stages:
//!
//! ```text
//! request ──▶ gate ──┬─▶ Deny(400 | 403)
//!                    ├─▶ Passthrough ──────────────▶ Allow(None)
//!                    └─▶ Admitted(user) ─▶ rewrite ─▶ Allow(Option<Rewrite>)
//! ```

mod decision;
mod gate;
mod rewrite;
mod target;

use std::sync::Arc;

pub use decision::{AccessDecision, DenyCode, DenyReason, Rewrite, RewriteReason, USER_HEADER};
pub use gate::{GateOutcome, gate};
pub use rewrite::rewrite;

use crate::policy::PolicyModel;

/// The parts of an inbound request the engine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFacts<'a> {
    /// Value of the trusted username header, if present.
    pub username: Option<&'a str>,
    /// Raw request target: path plus `?` and the raw query, if any.
    pub uri: &'a str,
}

impl<'a> RequestFacts<'a> {
    pub fn new(username: Option<&'a str>, uri: &'a str) -> Self {
        Self { username, uri }
    }
}

/// Evaluate one request against the policy.
pub fn evaluate(policy: &PolicyModel, request: &RequestFacts<'_>) -> AccessDecision {
    match gate(policy, request.username) {
        Err(reason) => AccessDecision::Deny(reason),
        Ok(GateOutcome::Passthrough) => AccessDecision::Allow(None),
        Ok(GateOutcome::Admitted(user)) => AccessDecision::Allow(rewrite(user, request.uri)),
    }
}

// =============================================================================
// Policy Evaluator
// =============================================================================

/// Shared handle to the policy model that logs every decision.
///
/// Cloning is cheap; all clones read the same immutable model.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    policy: Arc<PolicyModel>,
}

impl PolicyEvaluator {
    pub fn new(policy: Arc<PolicyModel>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyModel {
        &self.policy
    }

    pub fn evaluate(&self, request: &RequestFacts<'_>) -> AccessDecision {
        let decision = evaluate(&self.policy, request);
        let user = request.username.unwrap_or_default();

        match &decision {
            AccessDecision::Deny(reason) => {
                tracing::debug!(
                    user,
                    uri = request.uri,
                    code = %reason.code,
                    status = reason.status(),
                    "Request denied"
                );
            }
            AccessDecision::Allow(Some(rewrite)) => {
                tracing::debug!(
                    user,
                    uri = request.uri,
                    target = %rewrite.target,
                    reason = %rewrite.reason,
                    "Request rewritten"
                );
            }
            AccessDecision::Allow(None) if self.policy.passthrough => {
                tracing::debug!(user, uri = request.uri, "Passthrough request served");
            }
            AccessDecision::Allow(None) => {
                tracing::debug!(user, uri = request.uri, "Request allowed");
            }
        }

        decision
    }
}
