//! Cross-domain join.
//!
//! Hand-pairs one object in a source directory with one object in a target
//! directory by copying the identifier value, for cases where automatic
//! correlation by attribute is not yet possible. Preconditions are strict:
//! the source attribute must be set, and the target attribute must not be;
//! the latter guards against overwriting an existing join.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use serde::{Deserialize, Serialize};

use crate::config::AttributePair;
use crate::directory::{AttributeValue, DirectoryClient};
use crate::error::{JoinSide, PropagationError, PropagationResult};

/// The process-wide "current directory endpoint".
///
/// The joiner switches it while working against one side and must put it
/// back on every exit path, including errors.
#[derive(Debug, Clone, Default)]
pub struct OperatingContext {
    current: Arc<Mutex<Option<String>>>,
}

impl OperatingContext {
    /// Create an unbound context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently bound endpoint, if any.
    pub async fn current(&self) -> Option<String> {
        self.current.lock().await.clone()
    }

    /// Bind the context to an endpoint, returning a restorer that puts the
    /// previous endpoint back.
    pub async fn switch(&self, endpoint: &str) -> ContextRestorer {
        let mut current = self.current.lock().await;
        let previous = current.replace(endpoint.to_string());
        debug!(endpoint = %endpoint, "operating context switched");
        ContextRestorer {
            context: self.clone(),
            previous,
        }
    }
}

/// Restores the operating context captured at switch time.
#[must_use = "the previous operating context is lost unless restored"]
pub struct ContextRestorer {
    context: OperatingContext,
    previous: Option<String>,
}

impl ContextRestorer {
    /// Put the previous endpoint back.
    pub async fn restore(self) {
        let mut current = self.context.current.lock().await;
        *current = self.previous;
    }
}

/// One join attempt: which object on each side, addressed by domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub source_domain: String,
    pub source_identifier: String,
    pub target_domain: String,
    pub target_identifier: String,
}

impl JoinRequest {
    /// Create a join request.
    pub fn new(
        source_domain: impl Into<String>,
        source_identifier: impl Into<String>,
        target_domain: impl Into<String>,
        target_identifier: impl Into<String>,
    ) -> Self {
        Self {
            source_domain: source_domain.into(),
            source_identifier: source_identifier.into(),
            target_domain: target_domain.into(),
            target_identifier: target_identifier.into(),
        }
    }
}

/// Outcome of a successful join call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinOutcome {
    /// False when the dry-run gate skipped the write.
    pub applied: bool,
    /// The value that was (or would be) written.
    pub value: AttributeValue,
    /// DN of the target object the value applies to.
    pub target_dn: String,
}

/// Two-object, two-directory join operation.
///
/// Independent of the scope/enumeration machinery; every error is fatal for
/// the pair and identifies which side failed.
pub struct CrossDomainJoiner {
    source_directory: Arc<dyn DirectoryClient>,
    target_directory: Arc<dyn DirectoryClient>,
    attributes: AttributePair,
    dry_run: bool,
    context: OperatingContext,
}

impl CrossDomainJoiner {
    /// Create a joiner over two directory clients.
    pub fn new(
        source_directory: Arc<dyn DirectoryClient>,
        target_directory: Arc<dyn DirectoryClient>,
        attributes: AttributePair,
    ) -> Self {
        Self {
            source_directory,
            target_directory,
            attributes,
            dry_run: false,
            context: OperatingContext::new(),
        }
    }

    /// Skip the mutating call while still enforcing every precondition.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Share an operating context with the caller.
    #[must_use]
    pub fn with_context(mut self, context: OperatingContext) -> Self {
        self.context = context;
        self
    }

    /// Join one object pair.
    ///
    /// Acquires the source context, reads the source value, restores the
    /// context, then does the same on the target side around the
    /// precondition check and the write. The context is restored on every
    /// exit path before an error propagates.
    #[instrument(skip(self, request), fields(
        source = %request.source_identifier,
        target = %request.target_identifier,
    ))]
    pub async fn join(&self, request: &JoinRequest) -> PropagationResult<JoinOutcome> {
        if !self.source_directory.is_bound() {
            return Err(PropagationError::environment(
                "source directory client is not bound",
            ));
        }
        if !self.target_directory.is_bound() {
            return Err(PropagationError::environment(
                "target directory client is not bound",
            ));
        }

        let restorer = self.context.switch(&request.source_domain).await;
        let source_result = self.read_source_value(request).await;
        restorer.restore().await;
        let value = source_result?;

        let restorer = self.context.switch(&request.target_domain).await;
        let target_result = self.write_target_value(request, &value).await;
        restorer.restore().await;
        target_result
    }

    /// Resolve the source home domain and read the source attribute value.
    async fn read_source_value(&self, request: &JoinRequest) -> PropagationResult<AttributeValue> {
        let meta = self
            .source_directory
            .resolve_domain(&request.source_domain)
            .await
            .map_err(|e| {
                PropagationError::scope_resolution(
                    format!("source domain {}", request.source_domain),
                    e.to_string(),
                )
            })?;

        let entry = self
            .source_directory
            .get_object(
                &request.source_identifier,
                Some(&meta.dns_root),
                &[self.attributes.source.as_str(), "distinguishedName"],
            )
            .await
            .map_err(|e| {
                PropagationError::object_lookup(&request.source_identifier, e.to_string())
            })?
            .ok_or_else(|| {
                PropagationError::object_lookup(
                    &request.source_identifier,
                    format!("not found in source domain {}", request.source_domain),
                )
            })?;

        match entry.get(&self.attributes.source) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(PropagationError::precondition(
                JoinSide::Source,
                &request.source_identifier,
                format!("source attribute '{}' is null", self.attributes.source),
            )),
        }
    }

    /// Resolve the target home domain, enforce the overwrite guard, and
    /// write the value (unless dry-run).
    async fn write_target_value(
        &self,
        request: &JoinRequest,
        value: &AttributeValue,
    ) -> PropagationResult<JoinOutcome> {
        let meta = self
            .target_directory
            .resolve_domain(&request.target_domain)
            .await
            .map_err(|e| {
                PropagationError::scope_resolution(
                    format!("target domain {}", request.target_domain),
                    e.to_string(),
                )
            })?;

        let entry = self
            .target_directory
            .get_object(
                &request.target_identifier,
                Some(&meta.dns_root),
                &[self.attributes.target.as_str(), "distinguishedName"],
            )
            .await
            .map_err(|e| {
                PropagationError::object_lookup(&request.target_identifier, e.to_string())
            })?
            .ok_or_else(|| {
                PropagationError::object_lookup(
                    &request.target_identifier,
                    format!("not found in target domain {}", request.target_domain),
                )
            })?;

        if let Some(existing) = entry.get(&self.attributes.target) {
            if !existing.is_null() {
                return Err(PropagationError::precondition(
                    JoinSide::Target,
                    &request.target_identifier,
                    format!(
                        "target attribute '{}' already has a value",
                        self.attributes.target
                    ),
                ));
            }
        }

        let target_dn = entry
            .dn()
            .unwrap_or(request.target_identifier.as_str())
            .to_string();

        if self.dry_run {
            debug!(target_dn = %target_dn, "dry run, skipping join write");
            return Ok(JoinOutcome {
                applied: false,
                value: value.clone(),
                target_dn,
            });
        }

        self.target_directory
            .update_attribute(&target_dn, &meta.dns_root, &self.attributes.target, value)
            .await
            .map_err(|e| {
                PropagationError::attribute_update(&target_dn, &meta.dns_root, e.to_string())
            })?;

        info!(target_dn = %target_dn, "cross-domain join applied");
        Ok(JoinOutcome {
            applied: true,
            value: value.clone(),
            target_dn,
        })
    }
}
