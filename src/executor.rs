//! Propagation execution.
//!
//! Applies the copy-or-report decision to every surviving object. Report
//! mode classifies without touching the directory; apply mode performs one
//! mutation attempt per object, continuing past individual failures.

use tracing::{debug, info, instrument, warn};

use crate::config::AttributePair;
use crate::directory::DirectoryClient;
use crate::enumerate::DirectoryObjectRef;
use crate::report::{OperationResult, OperationStatus, ResultReporter};

/// Keep only objects whose target attribute is currently unset.
///
/// Applied after enumeration when the run narrows to null targets; a value
/// that is an empty string still counts as set.
pub fn filter_null_targets(objects: Vec<DirectoryObjectRef>) -> Vec<DirectoryObjectRef> {
    objects
        .into_iter()
        .filter(DirectoryObjectRef::target_is_unset)
        .collect()
}

/// Per-object copy-or-report execution for one run.
pub struct PropagationExecutor<'a> {
    directory: &'a dyn DirectoryClient,
    attributes: &'a AttributePair,
    report_only: bool,
    dry_run: bool,
}

impl<'a> PropagationExecutor<'a> {
    /// Create an executor with the run's mode flags.
    pub fn new(
        directory: &'a dyn DirectoryClient,
        attributes: &'a AttributePair,
        report_only: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            directory,
            attributes,
            report_only,
            dry_run,
        }
    }

    /// Process every surviving object, appending one record per terminal
    /// event in discovery order.
    ///
    /// In report mode no mutating call is made for any input. In apply mode
    /// the dry-run gate skips the mutation for an object without recording a
    /// mutation outcome; otherwise exactly one update attempt is made, with
    /// no retry.
    #[instrument(skip(self, objects, reporter), fields(objects = objects.len(), report_only = self.report_only, dry_run = self.dry_run))]
    pub async fn execute(&self, objects: &[DirectoryObjectRef], reporter: &mut ResultReporter) {
        for object in objects {
            if self.report_only {
                self.record(object, OperationStatus::ReportOnly, None, reporter);
                continue;
            }

            if self.dry_run {
                debug!(
                    identifier = %object.identifier,
                    domain = %object.domain,
                    "dry run, skipping attribute update"
                );
                continue;
            }

            self.apply(object, reporter).await;
        }
    }

    /// One mutation attempt for one object.
    ///
    /// The value written is the source attribute snapshot taken at
    /// enumeration time, routed to the object's home-domain server.
    async fn apply(&self, object: &DirectoryObjectRef, reporter: &mut ResultReporter) {
        let Some(value) = object.source_value() else {
            warn!(
                identifier = %object.identifier,
                attribute = %self.attributes.source,
                "source attribute has no value, nothing to copy"
            );
            self.record(
                object,
                OperationStatus::Failed,
                Some(format!(
                    "source attribute '{}' has no value",
                    self.attributes.source
                )),
                reporter,
            );
            return;
        };

        match self
            .directory
            .update_attribute(
                &object.distinguished_name,
                &object.domain,
                &self.attributes.target,
                value,
            )
            .await
        {
            Ok(()) => {
                info!(
                    identifier = %object.identifier,
                    domain = %object.domain,
                    attribute = %self.attributes.target,
                    "attribute propagated"
                );
                self.record(object, OperationStatus::Succeeded, None, reporter);
            }
            Err(e) => {
                warn!(
                    identifier = %object.identifier,
                    domain = %object.domain,
                    error = %e,
                    "attribute update failed"
                );
                self.record(object, OperationStatus::Failed, Some(e.to_string()), reporter);
            }
        }
    }

    /// Emit one terminal record for an object.
    ///
    /// Objects that carry a Get-phase slot get that record updated in place
    /// (with a fresh timestamp); others get a new record appended.
    fn record(
        &self,
        object: &DirectoryObjectRef,
        status: OperationStatus,
        error_message: Option<String>,
        reporter: &mut ResultReporter,
    ) {
        match object.result_slot {
            Some(slot) => reporter.update(slot, status, error_message),
            None => {
                reporter.push(OperationResult::for_object(
                    object,
                    status,
                    self.attributes,
                    error_message,
                ));
            }
        }
    }
}
