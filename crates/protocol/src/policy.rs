//! Access policy model
//!
//! A [`Policy`] is bound to exactly one container. Its canonical form is the
//! compact JSON produced by `serde_json`; attributes live in a sorted map so
//! the canonical bytes do not depend on insertion order.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Policy errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy has no identifier")]
    MissingId,

    #[error("Invalid policy field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Policy bytes are not in canonical form")]
    NonCanonical,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PolicyError {
    /// Returns a stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            PolicyError::MissingId => "TDF_E_POLICY_ID_MISSING",
            PolicyError::InvalidField { .. } => "TDF_E_POLICY_FIELD_INVALID",
            PolicyError::NonCanonical => "TDF_E_POLICY_NON_CANONICAL",
            PolicyError::SerializationError(_) => "TDF_E_POLICY_SERIALIZATION",
        }
    }

    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PolicyError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Value of a data attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    StringArray(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::StringArray(value)
    }
}

/// Policy body: data attributes and the dissemination list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyBody {
    pub data_attributes: BTreeMap<String, AttributeValue>,
    pub dissem: Vec<String>,
}

/// Root policy that includes metadata and effective dates
///
/// The validity window is carried for key authorities; the engine itself
/// never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Policy {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    pub body: PolicyBody,
}

impl Policy {
    /// Create a new policy with a UUID and no time constraints
    pub fn new(
        uuid: impl Into<String>,
        data_attributes: BTreeMap<String, AttributeValue>,
        dissem: Vec<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            valid_from: None,
            valid_to: None,
            body: PolicyBody {
                data_attributes,
                dissem,
            },
        }
    }

    /// Shorthand for a policy made of attributes only, with a fresh UUID
    pub fn with_attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let data_attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(uuid::Uuid::new_v4().to_string(), data_attributes, Vec::new())
    }

    /// Check if the policy window contains `time`
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        let after_start = self.valid_from.is_none_or(|from| time >= from);
        let before_end = self.valid_to.is_none_or(|to| time <= to);
        after_start && before_end
    }

    /// Validate the policy structure
    ///
    /// Checks the UUID format, the time window ordering, attribute names, and
    /// that dissemination entries are non-empty and unique.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.uuid.is_empty() {
            return Err(PolicyError::MissingId);
        }
        uuid::Uuid::parse_str(&self.uuid)
            .map_err(|e| PolicyError::invalid("uuid", format!("invalid UUID format: {}", e)))?;

        if let (Some(from), Some(to)) = (self.valid_from, self.valid_to) {
            if from >= to {
                return Err(PolicyError::invalid(
                    "validFrom",
                    format!("valid_from ({}) must be before valid_to ({})", from, to),
                ));
            }
        }

        for name in self.body.data_attributes.keys() {
            if name.trim().is_empty() {
                return Err(PolicyError::invalid(
                    "dataAttributes",
                    "attribute name is empty",
                ));
            }
        }

        let mut seen = HashSet::new();
        for (idx, entity) in self.body.dissem.iter().enumerate() {
            if entity.trim().is_empty() {
                return Err(PolicyError::invalid(
                    format!("dissem[{}]", idx),
                    "empty dissemination entity",
                ));
            }
            if !seen.insert(entity) {
                return Err(PolicyError::invalid(
                    format!("dissem[{}]", idx),
                    format!("duplicate dissemination entity: {}", entity),
                ));
            }
        }

        Ok(())
    }

    /// Canonical byte form used for binding and for the manifest
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec(self).map_err(PolicyError::from)
    }

    /// Parse canonical bytes, rejecting any other encoding of the same policy
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, PolicyError> {
        let policy: Policy = serde_json::from_slice(bytes)?;
        if policy.to_canonical_bytes()? != bytes {
            return Err(PolicyError::NonCanonical);
        }
        Ok(policy)
    }
}

/// Builder for creating policies with a fluent API
///
/// # Example
///
/// ```
/// use tdf_engine_protocol::policy::PolicyBuilder;
///
/// let policy = PolicyBuilder::new()
///     .id_auto()
///     .attribute("clearance", "public")
///     .dissem("user@example.com")
///     .valid_for_days(30)
///     .build()?;
/// assert_eq!(policy.body.dissem, vec!["user@example.com"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    uuid: Option<String>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    attributes: BTreeMap<String, AttributeValue>,
    dissem: Vec<String>,
}

impl PolicyBuilder {
    /// Create a new PolicyBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific UUID for the policy
    #[must_use]
    pub fn id(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Auto-generate a UUID v4 for the policy
    #[must_use]
    pub fn id_auto(mut self) -> Self {
        self.uuid = Some(uuid::Uuid::new_v4().to_string());
        self
    }

    /// Set a data attribute, replacing any earlier value for the same name
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a dissemination target (entity authorized to access)
    #[must_use]
    pub fn dissem(mut self, target: impl Into<String>) -> Self {
        self.dissem.push(target.into());
        self
    }

    /// Set the validity window start
    #[must_use]
    pub fn valid_from(mut self, from: DateTime<Utc>) -> Self {
        self.valid_from = Some(from);
        self
    }

    /// Set the validity window end
    #[must_use]
    pub fn valid_to(mut self, to: DateTime<Utc>) -> Self {
        self.valid_to = Some(to);
        self
    }

    /// Valid from now for the given number of days
    #[must_use]
    pub fn valid_for_days(mut self, days: i64) -> Self {
        let now = Utc::now();
        self.valid_from = Some(now);
        self.valid_to = Some(now + Duration::days(days));
        self
    }

    /// Build and validate the policy
    pub fn build(self) -> Result<Policy, PolicyError> {
        let policy = Policy {
            uuid: self.uuid.ok_or(PolicyError::MissingId)?,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            body: PolicyBody {
                data_attributes: self.attributes,
                dissem: self.dissem,
            },
        };
        policy.validate()?;
        Ok(policy)
    }
}
