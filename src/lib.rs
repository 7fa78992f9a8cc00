//! # guidlink
//!
//! Propagates a stable identifier value (ImmutableID) from a source
//! attribute to a target attribute on directory objects, so separate
//! identity-synchronization pipelines can join the same real-world identity
//! across an on-prem and a cloud directory.
//!
//! ## Architecture
//!
//! The pipeline runs scope resolution, enumeration, optional null-target
//! filtering, and per-object execution, feeding one ordered result stream:
//!
//! - [`scope::ScopeResolver`] - turn a scope selector into per-server queries
//! - [`enumerate::ObjectEnumerator`] - uniform object snapshots with a
//!   resolved home domain, including the two-phase identity lookup
//! - [`executor::PropagationExecutor`] - copy-or-report per object, with
//!   report-only and dry-run gates
//! - [`report::ResultReporter`] - ordered records plus the run summary
//! - [`join::CrossDomainJoiner`] - independent two-directory pairing with
//!   strict precondition enforcement
//!
//! All directory access goes through the [`directory::DirectoryClient`]
//! capability trait; connection setup, CLI parsing, and CSV/log export live
//! outside this crate.
//!
//! ## Example
//!
//! ```ignore
//! use guidlink::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = PropagationEngine::new(directory);
//! let config = RunConfig::new(ScopeSelector::Domain {
//!     fqdn: "corp.example.com".into(),
//! })
//! .only_null_targets();
//!
//! let report = engine.run(&config).await?;
//! for record in &report.records {
//!     println!("{} {} {}", record.identifier, record.status, record.domain);
//! }
//! ```

pub mod config;
pub mod directory;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod executor;
pub mod join;
pub mod report;
pub mod scope;

/// Prelude module for convenient imports.
///
/// ```
/// use guidlink::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AttributePair, RunConfig};
    pub use crate::directory::{
        AttributeValue, DirectoryClient, DirectoryEntry, DirectoryError, DirectoryFilter,
        DirectoryResult, DomainMeta, ForestMeta, SearchScope,
    };
    pub use crate::engine::{PropagationEngine, PropagationReport, RunContext};
    pub use crate::enumerate::{DirectoryObjectRef, ObjectEnumerator};
    pub use crate::error::{JoinSide, PropagationError, PropagationResult};
    pub use crate::executor::{filter_null_targets, PropagationExecutor};
    pub use crate::join::{CrossDomainJoiner, JoinOutcome, JoinRequest, OperatingContext};
    pub use crate::report::{OperationResult, OperationStatus, ResultReporter, RunSummary};
    pub use crate::scope::{QueryUnit, ScopeResolver, ScopeSelector};
}

// Re-export async_trait for directory client implementors
pub use async_trait::async_trait;
