use std::fmt;

use thiserror::Error;

/// Why a single raw value could not be coerced into its target type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    #[error("value is missing")]
    Missing,

    #[error("value must not be empty")]
    Empty,

    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot convert '{value}' to {expected}")]
    Unparsable {
        expected: &'static str,
        value: String,
    },

    #[error("{0}")]
    Invalid(String),
}

/// One offending field inside a rejected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path of the field, e.g. `user.username` or `media[1].id`.
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Structural rejection of a whole entity.
///
/// Collects every offending field rather than stopping at the first one, so
/// a caller can log a single line per rejected payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {entity}: {}", format_issues(.issues))]
pub struct ValidationError {
    pub entity: &'static str,
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(entity: &'static str, issues: Vec<FieldIssue>) -> Self {
        Self { entity, issues }
    }

    pub fn single(entity: &'static str, field: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            entity,
            issues: vec![FieldIssue {
                field: field.into(),
                reason: reason.to_string(),
            }],
        }
    }

    /// Whether any issue was reported for `field` (exact path match).
    pub fn has_issue(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// Re-roots every issue under `prefix`, used when a nested entity fails.
    pub(crate) fn prefixed(self, prefix: &str) -> Vec<FieldIssue> {
        self.issues
            .into_iter()
            .map(|issue| FieldIssue {
                field: if issue.field.is_empty() {
                    prefix.to_string()
                } else {
                    format!("{prefix}.{}", issue.field)
                },
                reason: issue.reason,
            })
            .collect()
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_issue() {
        let err = ValidationError::new(
            "post",
            vec![
                FieldIssue {
                    field: "id".into(),
                    reason: CoerceError::Missing.to_string(),
                },
                FieldIssue {
                    field: "user.username".into(),
                    reason: CoerceError::Empty.to_string(),
                },
            ],
        );

        assert_eq!(
            err.to_string(),
            "invalid post: id: value is missing; user.username: value must not be empty"
        );
    }

    #[test]
    fn test_prefixed_nests_paths() {
        let err = ValidationError::single("user", "username", CoerceError::Empty);
        let issues = err.prefixed("owner");
        assert_eq!(issues[0].field, "owner.username");
    }
}
