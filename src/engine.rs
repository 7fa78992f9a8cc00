//! Run orchestration.
//!
//! Wires the pipeline: validate the environment and configuration, resolve
//! the scope, enumerate objects, narrow to null targets when asked, execute
//! the copy-or-report decision, and hand back the ordered record stream with
//! its summary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::directory::DirectoryClient;
use crate::enumerate::ObjectEnumerator;
use crate::error::{PropagationError, PropagationResult};
use crate::executor::{filter_null_targets, PropagationExecutor};
use crate::report::{OperationResult, ResultReporter, RunSummary};
use crate::scope::{ScopeResolver, ScopeSelector};

/// Identity of one run, threaded through diagnostics instead of any global
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// Start a new run context.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a run produced, ready for export collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct PropagationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// All records in discovery order.
    pub records: Vec<OperationResult>,
    pub summary: RunSummary,
}

/// Entry point for attribute propagation runs.
pub struct PropagationEngine {
    directory: Arc<dyn DirectoryClient>,
}

impl PropagationEngine {
    /// Create an engine bound to a directory client.
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }

    /// Execute one propagation run.
    ///
    /// Fatal errors (environment, configuration, scope resolution) abort
    /// before any object is touched; per-object errors end up in the record
    /// stream and never stop the batch.
    #[instrument(skip(self, config), fields(run_id = tracing::field::Empty, scope = %config.scope.describe()))]
    pub async fn run(&self, config: &RunConfig) -> PropagationResult<PropagationReport> {
        if !self.directory.is_bound() {
            return Err(PropagationError::environment(
                "directory client is not bound",
            ));
        }
        config.validate()?;

        let context = RunContext::new();
        tracing::Span::current().record("run_id", tracing::field::display(context.run_id));
        info!(run_id = %context.run_id, "propagation run started");

        let mut reporter = ResultReporter::new();
        let enumerator = ObjectEnumerator::new(self.directory.as_ref(), &config.attributes);

        // Scope resolution must complete before any enumeration begins.
        let resolver = ScopeResolver::new(self.directory.as_ref());
        let units = resolver.resolve(&config.scope).await?;

        let objects = match &config.scope {
            ScopeSelector::Identity { ids } => {
                enumerator.enumerate_identities(ids, &mut reporter).await
            }
            _ => enumerator.enumerate_units(&units).await?,
        };

        let objects = if config.only_update_null_target {
            filter_null_targets(objects)
        } else {
            objects
        };

        let executor = PropagationExecutor::new(
            self.directory.as_ref(),
            &config.attributes,
            config.report_only,
            config.dry_run,
        );
        executor.execute(&objects, &mut reporter).await;

        let summary = reporter.summary();
        info!(
            run_id = %context.run_id,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "propagation run finished"
        );

        Ok(PropagationReport {
            run_id: context.run_id,
            started_at: context.started_at,
            finished_at: Utc::now(),
            records: reporter.into_records(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_identity() {
        let a = RunContext::new();
        let b = RunContext::new();
        assert_ne!(a.run_id, b.run_id);
        assert!(a.started_at <= b.started_at);
    }
}
