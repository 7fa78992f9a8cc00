//! Directory client capability surface.
//!
//! The propagation engine talks to the directory exclusively through the
//! [`DirectoryClient`] trait: query by filter/scope/server, fetch one object,
//! resolve domain/forest metadata, and write one attribute on one object.
//! Connection setup and protocol mechanics live behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error surfaced by a directory client implementation.
///
/// The engine maps these into its own taxonomy with per-object or per-scope
/// context attached.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The target server or naming context could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The directory rejected the operation.
    #[error("operation rejected: {0}")]
    Rejected(String),

    /// Any other failure reported by the directory layer.
    #[error("{0}")]
    Other(String),
}

/// Result type for raw directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// A value held by a directory attribute.
///
/// `Null` is distinct from an empty string: an attribute explicitly set to
/// the empty string counts as present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value.
    Null,
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// Binary data (e.g. a raw GUID).
    Binary(Vec<u8>),
    /// Multiple values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Get as a string if this is a single string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

/// One object returned by the directory: a map of attribute name to value.
///
/// Attribute access is by name; a name that is missing or mapped to
/// [`AttributeValue::Null`] is treated as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(flatten)]
    attributes: HashMap<String, AttributeValue>,
}

impl DirectoryEntry {
    /// Create a new empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a single-valued string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_string())
    }

    /// Check whether an attribute is semantically absent (missing or null).
    pub fn is_unset(&self, name: &str) -> bool {
        match self.attributes.get(name) {
            None => true,
            Some(value) => value.is_null(),
        }
    }

    /// Get the distinguished name, if present.
    pub fn dn(&self) -> Option<&str> {
        self.get_string("distinguishedName")
    }
}

/// Filter for directory queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryFilter {
    /// Match objects where attribute equals value.
    Equals { attribute: String, value: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<DirectoryFilter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<DirectoryFilter> },
}

impl DirectoryFilter {
    /// Create an equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        DirectoryFilter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<DirectoryFilter>) -> Self {
        DirectoryFilter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<DirectoryFilter>) -> Self {
        DirectoryFilter::Or { filters }
    }
}

/// Search scope relative to a base distinguished name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base object only.
    Base,
    /// Direct children of the base object.
    OneLevel,
    /// The base object and its entire subtree.
    SubTree,
}

/// Metadata for one domain, resolved from its fully qualified name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainMeta {
    /// DNS root of the domain; used as the server to query.
    pub dns_root: String,
    /// NetBIOS name, when the directory reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netbios_name: Option<String>,
}

impl DomainMeta {
    /// Create domain metadata from a DNS root.
    pub fn new(dns_root: impl Into<String>) -> Self {
        Self {
            dns_root: dns_root.into(),
            netbios_name: None,
        }
    }
}

/// Metadata for a forest: the set of member domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestMeta {
    /// Fully qualified name of the forest root domain.
    pub root_domain: String,
    /// Fully qualified names of every domain in the forest.
    pub domains: Vec<String>,
}

/// Capability surface the propagation engine consumes.
///
/// Implementations own connection management; the engine only selects which
/// server a call is routed to. A `server` of `None` means the implementation
/// may answer from a directory-wide (partial) view.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Query objects matching a filter, optionally rooted at a search base.
    async fn query_objects(
        &self,
        filter: &DirectoryFilter,
        search_base: Option<&str>,
        search_scope: Option<SearchScope>,
        server: Option<&str>,
        properties: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>>;

    /// Fetch one object by identifier (DN, GUID, or SAM-equivalent).
    ///
    /// Returns `Ok(None)` when no object matches.
    async fn get_object(
        &self,
        identifier: &str,
        server: Option<&str>,
        properties: &[&str],
    ) -> DirectoryResult<Option<DirectoryEntry>>;

    /// Resolve domain metadata from a fully qualified domain name.
    async fn resolve_domain(&self, fqdn: &str) -> DirectoryResult<DomainMeta>;

    /// Resolve forest metadata from a fully qualified forest name.
    async fn resolve_forest(&self, fqdn: &str) -> DirectoryResult<ForestMeta>;

    /// Add a value to one attribute on one object, routed to a server.
    async fn update_attribute(
        &self,
        identifier: &str,
        server: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> DirectoryResult<()>;

    /// Check whether the client holds a usable directory binding.
    ///
    /// Checked once at the entry boundary before any directory access.
    fn is_bound(&self) -> bool {
        true
    }
}
