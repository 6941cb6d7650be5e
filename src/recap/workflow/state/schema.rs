// SPDX-License-Identifier: MIT

//! State schema definitions
//!
//! Every field of [`RecapState`](super::RecapState) is listed here together
//! with its merge policy. Merging never infers a policy from a field's type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::adk::error::ConfigurationError;

/// Fields of the run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    InputText,
    Summary,
    Extracted,
    SelectedActions,
    Results,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::InputText => "input_text",
            StateField::Summary => "summary",
            StateField::Extracted => "extracted",
            StateField::SelectedActions => "selected_actions",
            StateField::Results => "results",
        }
    }

    /// Merge policy declared for this field
    pub fn policy(&self) -> FieldPolicy {
        StateSchema::spec(*self)
            .map(|s| s.policy)
            .unwrap_or(FieldPolicy::Immutable)
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a partial write is merged into a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Set at run start; partial writes are rejected
    Immutable,
    /// Latest write wins; at most one writer per round
    Replace,
    /// Incoming items are appended in merge order
    Append,
}

/// Shape of a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Sequence,
}

/// Declaration of a single state field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: StateField,
    pub kind: FieldKind,
    pub policy: FieldPolicy,
}

/// Declared layout of the run state
pub struct StateSchema;

impl StateSchema {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            field: StateField::InputText,
            kind: FieldKind::Scalar,
            policy: FieldPolicy::Immutable,
        },
        FieldSpec {
            field: StateField::Summary,
            kind: FieldKind::Scalar,
            policy: FieldPolicy::Replace,
        },
        FieldSpec {
            field: StateField::Extracted,
            kind: FieldKind::Scalar,
            policy: FieldPolicy::Replace,
        },
        FieldSpec {
            field: StateField::SelectedActions,
            kind: FieldKind::Sequence,
            policy: FieldPolicy::Append,
        },
        FieldSpec {
            field: StateField::Results,
            kind: FieldKind::Sequence,
            policy: FieldPolicy::Append,
        },
    ];

    pub fn spec(field: StateField) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|s| s.field == field)
    }

    /// Fields whose partial writes replace the current value
    pub fn replaced_fields() -> impl Iterator<Item = StateField> {
        Self::FIELDS
            .iter()
            .filter(|s| s.policy == FieldPolicy::Replace)
            .map(|s| s.field)
    }

    /// Check the table is consistent: every field declared once, and
    /// `Append` only on sequence fields.
    pub fn validate() -> Result<(), ConfigurationError> {
        for (i, spec) in Self::FIELDS.iter().enumerate() {
            if Self::FIELDS[..i].iter().any(|s| s.field == spec.field) {
                return Err(ConfigurationError::InvalidSchema(format!(
                    "field {} declared twice",
                    spec.field
                )));
            }
            if spec.policy == FieldPolicy::Append && spec.kind == FieldKind::Scalar {
                return Err(ConfigurationError::InvalidSchema(format!(
                    "scalar field {} cannot append",
                    spec.field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_declared() {
        for field in [
            StateField::InputText,
            StateField::Summary,
            StateField::Extracted,
            StateField::SelectedActions,
            StateField::Results,
        ] {
            assert!(StateSchema::spec(field).is_some(), "{} missing", field);
        }
    }

    #[test]
    fn test_declared_policies() {
        assert_eq!(StateField::InputText.policy(), FieldPolicy::Immutable);
        assert_eq!(StateField::Summary.policy(), FieldPolicy::Replace);
        assert_eq!(StateField::Extracted.policy(), FieldPolicy::Replace);
        assert_eq!(StateField::SelectedActions.policy(), FieldPolicy::Append);
        assert_eq!(StateField::Results.policy(), FieldPolicy::Append);
    }

    #[test]
    fn test_schema_validates() {
        assert!(StateSchema::validate().is_ok());
    }

    #[test]
    fn test_replaced_fields() {
        let fields: Vec<_> = StateSchema::replaced_fields().collect();
        assert_eq!(fields, vec![StateField::Summary, StateField::Extracted]);
    }
}
