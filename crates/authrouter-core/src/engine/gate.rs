//! Stage A: coarse accept/reject.

use super::decision::DenyReason;
use crate::policy::{PolicyModel, UserPolicy};

/// Outcome of the gate when the request is not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome<'p> {
    /// Passthrough mode; skip the rewrite stage.
    Passthrough,
    /// Known user; continue with their policy.
    Admitted(&'p UserPolicy),
}

/// Decide whether a request may reach the rewrite stage.
///
/// 1. passthrough mode admits everything
/// 2. an absent or empty username is a 400
/// 3. an unknown username is a 403
pub fn gate<'p>(
    policy: &'p PolicyModel,
    username: Option<&str>,
) -> Result<GateOutcome<'p>, DenyReason> {
    if policy.passthrough {
        return Ok(GateOutcome::Passthrough);
    }

    let username = match username {
        Some(name) if !name.is_empty() => name,
        _ => return Err(DenyReason::missing_user_header()),
    };

    policy
        .lookup(username)
        .map(GateOutcome::Admitted)
        .ok_or_else(DenyReason::unknown_user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decision::DenyCode;

    fn policy(passthrough: bool) -> PolicyModel {
        let mut model = PolicyModel {
            passthrough,
            ..Default::default()
        };
        model.users.insert("alice".into(), UserPolicy::default());
        model
    }

    #[test]
    fn test_passthrough_ignores_username() {
        let model = policy(true);
        assert_eq!(gate(&model, None), Ok(GateOutcome::Passthrough));
        assert_eq!(gate(&model, Some("")), Ok(GateOutcome::Passthrough));
        assert_eq!(gate(&model, Some("mallory")), Ok(GateOutcome::Passthrough));
    }

    #[test]
    fn test_missing_or_empty_username() {
        let model = policy(false);
        for username in [None, Some("")] {
            let reason = gate(&model, username).unwrap_err();
            assert_eq!(reason.code, DenyCode::MissingUserHeader);
            assert_eq!(reason.status(), 400);
        }
    }

    #[test]
    fn test_unknown_user() {
        let reason = gate(&policy(false), Some("mallory")).unwrap_err();
        assert_eq!(reason.code, DenyCode::UnknownUser);
        assert_eq!(reason.status(), 403);
        assert!(reason.message.is_empty());
    }

    #[test]
    fn test_known_user_admitted() {
        let model = policy(false);
        assert!(matches!(
            gate(&model, Some("alice")),
            Ok(GateOutcome::Admitted(_))
        ));
    }
}
