//! Loading and validation of the policy document.

use std::fs;
use std::path::Path;

use super::PolicyModel;
use crate::error::{PolicyError, Result};

impl PolicyModel {
    /// Parse and validate a YAML policy document.
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let model: PolicyModel = serde_yaml::from_str(document)?;
        model.validate()?;
        Ok(model)
    }

    /// Read, parse and validate the policy file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_yaml_str(&document)?;

        tracing::info!(
            path = %path.display(),
            users = model.users.len(),
            passthrough = model.passthrough,
            "Policy loaded"
        );
        if !model.passthrough && model.users.is_empty() {
            tracing::warn!("Policy has no users and passthrough is off; every request will be rejected");
        }

        Ok(model)
    }

    /// Check the per-user invariants the engine relies on.
    ///
    /// Users are checked in username order and the first violation is
    /// returned.
    pub fn validate(&self) -> Result<()> {
        for name in self.usernames() {
            let Some(user) = self.lookup(name) else {
                continue;
            };

            if user.entrypoint.is_empty() {
                return Err(PolicyError::missing(name, "entrypoint"));
            }
            if !user.entrypoint.starts_with('/') {
                return Err(PolicyError::RelativeEntrypoint {
                    user: name.to_string(),
                    entrypoint: user.entrypoint.clone(),
                });
            }
            if user.sitemaps.default.is_empty() {
                return Err(PolicyError::missing(name, "sitemaps.default"));
            }
            if user.sitemaps.allowed.is_empty() {
                return Err(PolicyError::missing(name, "sitemaps.allowed"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
passthrough: false
users:
  alice:
    entrypoint: /basicui/app?sitemap=home
    sitemaps:
      default: home
      allowed:
        - home
        - garden
    paths:
      /paperui:
        allowed: false
      /habpanel:
        allowed: true
"#;

    #[test]
    fn test_parse_valid_document() {
        let model = PolicyModel::from_yaml_str(VALID).unwrap();
        assert!(!model.passthrough);

        let alice = model.lookup("alice").unwrap();
        assert_eq!(alice.entrypoint, "/basicui/app?sitemap=home");
        assert_eq!(alice.sitemaps.default, "home");
        assert_eq!(alice.sitemaps.allowed, vec!["home", "garden"]);

        let fragments: Vec<&str> = alice.paths.keys().map(String::as_str).collect();
        assert_eq!(fragments, ["/paperui", "/habpanel"]);
        assert!(!alice.paths["/paperui"].allowed);
        assert!(alice.paths["/habpanel"].allowed);
    }

    #[test]
    fn test_passthrough_without_users() {
        let model = PolicyModel::from_yaml_str("passthrough: true\n").unwrap();
        assert!(model.passthrough);
        assert!(model.users.is_empty());
    }

    #[test]
    fn test_missing_entrypoint() {
        let err = PolicyModel::from_yaml_str(
            r#"
users:
  bob:
    sitemaps:
      default: home
      allowed: [home]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::MissingField { ref user, field: "entrypoint" } if user == "bob"
        ));
        assert_eq!(err.to_string(), "the field `entrypoint` is missing for user 'bob'");
    }

    #[test]
    fn test_relative_entrypoint() {
        let err = PolicyModel::from_yaml_str(
            r#"
users:
  bob:
    entrypoint: basicui/app
    sitemaps:
      default: home
      allowed: [home]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::RelativeEntrypoint { .. }));
    }

    #[test]
    fn test_missing_default_sitemap() {
        let err = PolicyModel::from_yaml_str(
            r#"
users:
  bob:
    entrypoint: /start
    sitemaps:
      allowed: [home]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::MissingField { field: "sitemaps.default", .. }
        ));
    }

    #[test]
    fn test_missing_allowed_sitemaps() {
        let err = PolicyModel::from_yaml_str(
            r#"
users:
  bob:
    entrypoint: /start
    sitemaps:
      default: home
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::MissingField { field: "sitemaps.allowed", .. }
        ));
    }

    #[test]
    fn test_first_invalid_user_in_name_order() {
        let err = PolicyModel::from_yaml_str(
            r#"
users:
  zed:
    entrypoint: /start
  adam:
    sitemaps:
      default: home
      allowed: [home]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::MissingField { ref user, field: "entrypoint" } if user == "adam"
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PolicyModel::from_yaml_str("users: [not, a, map]").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PolicyModel::from_path(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, PolicyError::Read { .. }));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, VALID).unwrap();

        let model = PolicyModel::from_path(&path).unwrap();
        assert!(model.lookup("alice").is_some());
    }
}
