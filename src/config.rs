//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PropagationError, PropagationResult};
use crate::scope::ScopeSelector;

/// Default source attribute: the object's stable directory GUID.
pub const DEFAULT_SOURCE_ATTRIBUTE: &str = "objectGUID";

/// Default target attribute written by the propagation.
pub const DEFAULT_TARGET_ATTRIBUTE: &str = "mS-DS-ConsistencyGuid";

/// The attribute pair a run copies between. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePair {
    /// Attribute the value is read from.
    pub source: String,
    /// Attribute the value is written to.
    pub target: String,
}

impl AttributePair {
    /// Create a pair with explicit attribute names.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Default for AttributePair {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_ATTRIBUTE, DEFAULT_TARGET_ATTRIBUTE)
    }
}

/// Configuration for one propagation run.
///
/// Constructed once at run start and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Which objects the run operates on.
    pub scope: ScopeSelector,

    /// Source and target attribute names.
    #[serde(default)]
    pub attributes: AttributePair,

    /// Classify every object without mutating the directory.
    #[serde(default)]
    pub report_only: bool,

    /// Only touch objects whose target attribute is currently unset.
    #[serde(default)]
    pub only_update_null_target: bool,

    /// Go through the apply path but skip every mutating call.
    #[serde(default)]
    pub dry_run: bool,
}

impl RunConfig {
    /// Create a configuration for a scope with default attributes and gates.
    pub fn new(scope: ScopeSelector) -> Self {
        Self {
            scope,
            attributes: AttributePair::default(),
            report_only: false,
            only_update_null_target: false,
            dry_run: false,
        }
    }

    /// Set the attribute pair.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributePair) -> Self {
        self.attributes = attributes;
        self
    }

    /// Enable report-only mode.
    #[must_use]
    pub fn report_only(mut self) -> Self {
        self.report_only = true;
        self
    }

    /// Only update objects whose target attribute is unset.
    #[must_use]
    pub fn only_null_targets(mut self) -> Self {
        self.only_update_null_target = true;
        self
    }

    /// Simulate without mutating.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Validate the configuration before any directory access.
    pub fn validate(&self) -> PropagationResult<()> {
        if self.attributes.source.trim().is_empty() {
            return Err(PropagationError::invalid_configuration(
                "source attribute name cannot be empty",
            ));
        }
        if self.attributes.target.trim().is_empty() {
            return Err(PropagationError::invalid_configuration(
                "target attribute name cannot be empty",
            ));
        }
        if self.attributes.source == self.attributes.target {
            return Err(PropagationError::invalid_configuration(format!(
                "source and target attribute are both '{}'",
                self.attributes.source
            )));
        }

        match &self.scope {
            ScopeSelector::Identity { ids } => {
                if ids.is_empty() {
                    return Err(PropagationError::invalid_configuration(
                        "identity scope requires at least one identifier",
                    ));
                }
                if ids.iter().any(|id| id.trim().is_empty()) {
                    return Err(PropagationError::invalid_configuration(
                        "identity scope contains a blank identifier",
                    ));
                }
            }
            ScopeSelector::SearchBase { dn, .. } => {
                if dn.trim().is_empty() {
                    return Err(PropagationError::invalid_configuration(
                        "search base DN cannot be empty",
                    ));
                }
            }
            ScopeSelector::Domain { fqdn } | ScopeSelector::Forest { fqdn } => {
                if fqdn.trim().is_empty() {
                    return Err(PropagationError::invalid_configuration(
                        "domain or forest name cannot be empty",
                    ));
                }
            }
        }

        Ok(())
    }
}
