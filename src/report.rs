//! Per-object result records and run aggregation.
//!
//! Every terminal event for an object (lookup outcome, report classification,
//! or mutation outcome) becomes one [`OperationResult`]. The reporter keeps
//! them in discovery order and derives the run summary. It performs no I/O;
//! CSV and log export are external collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AttributePair;
use crate::enumerate::DirectoryObjectRef;

/// Terminal status of one event for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Identity lookup obtained the object.
    GetSucceeded,
    /// Identity lookup failed; the object never reaches the mutation phase.
    GetFailed,
    /// Classified without mutation (report mode).
    ReportOnly,
    /// The attribute write succeeded.
    Succeeded,
    /// The attribute write failed.
    Failed,
}

impl OperationStatus {
    /// Whether this status belongs to the mutation phase.
    pub fn is_mutation_phase(self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::GetSucceeded => write!(f, "get_succeeded"),
            OperationStatus::GetFailed => write!(f, "get_failed"),
            OperationStatus::ReportOnly => write!(f, "report_only"),
            OperationStatus::Succeeded => write!(f, "succeeded"),
            OperationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One exportable record. Fields that are unknown at failure time (e.g. the
/// domain of an identifier that never resolved) are left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub identifier: String,
    pub domain: String,
    pub object_class: String,
    pub distinguished_name: String,
    /// Taken when the event happened, not at run start.
    pub timestamp: DateTime<Utc>,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub source_attribute: String,
    pub target_attribute: String,
}

impl OperationResult {
    /// Record an event for a fully resolved object.
    pub fn for_object(
        object: &DirectoryObjectRef,
        status: OperationStatus,
        attributes: &AttributePair,
        error_message: Option<String>,
    ) -> Self {
        Self {
            identifier: object.identifier.clone(),
            domain: object.domain.clone(),
            object_class: object.object_class.clone(),
            distinguished_name: object.distinguished_name.clone(),
            timestamp: Utc::now(),
            status,
            error_message,
            source_attribute: attributes.source.clone(),
            target_attribute: attributes.target.clone(),
        }
    }

    /// Record a lookup failure for an identifier that never resolved.
    pub fn get_failed(
        identifier: impl Into<String>,
        attributes: &AttributePair,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            domain: String::new(),
            object_class: String::new(),
            distinguished_name: String::new(),
            timestamp: Utc::now(),
            status: OperationStatus::GetFailed,
            error_message: Some(error_message.into()),
            source_attribute: attributes.source.clone(),
            target_attribute: attributes.target.clone(),
        }
    }
}

/// Counts derived from the result stream, never persisted independently.
///
/// `attempted`, `succeeded` and `failed` cover mutation-phase records only;
/// lookup failures and report-only classifications are counted separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub report_only: usize,
    pub get_failed: usize,
}

/// Ordered collector of result records for one run.
#[derive(Debug, Default)]
pub struct ResultReporter {
    records: Vec<OperationResult>,
}

impl ResultReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record, preserving discovery order.
    ///
    /// Returns the record's slot index, so a later phase can update the same
    /// object's record in place instead of appending a duplicate.
    pub fn push(&mut self, record: OperationResult) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Update a record in place with a later terminal status.
    ///
    /// The timestamp is refreshed to the time of the new event.
    pub fn update(&mut self, slot: usize, status: OperationStatus, error_message: Option<String>) {
        if let Some(record) = self.records.get_mut(slot) {
            record.status = status;
            record.error_message = error_message;
            record.timestamp = Utc::now();
        }
    }

    /// All records in discovery order.
    pub fn records(&self) -> &[OperationResult] {
        &self.records
    }

    /// Derive the summary over the current records.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for record in &self.records {
            match record.status {
                OperationStatus::Succeeded => summary.succeeded += 1,
                OperationStatus::Failed => summary.failed += 1,
                OperationStatus::ReportOnly => summary.report_only += 1,
                OperationStatus::GetFailed => summary.get_failed += 1,
                OperationStatus::GetSucceeded => {}
            }
        }
        summary.attempted = self
            .records
            .iter()
            .filter(|r| r.status.is_mutation_phase())
            .count();
        summary
    }

    /// Consume the reporter, yielding the ordered record stream.
    pub fn into_records(self) -> Vec<OperationResult> {
        self.records
    }
}
