//! Object enumeration.
//!
//! Turns query units (or individual identifiers) into a uniform list of
//! [`DirectoryObjectRef`] snapshots, each annotated with the home-domain
//! server that answered for it authoritatively.

use tracing::{debug, instrument, warn};

use crate::config::AttributePair;
use crate::directory::{AttributeValue, DirectoryClient, DirectoryEntry, DirectoryFilter};
use crate::error::{PropagationError, PropagationResult};
use crate::report::{OperationResult, OperationStatus, ResultReporter};
use crate::scope::{server_from_dn, QueryUnit};

/// Snapshot of one enumerated object.
///
/// Read-only after creation; the propagation executor mutates the remote
/// target attribute, never this snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryObjectRef {
    /// Stable identifier (GUID when available, otherwise the DN).
    pub identifier: String,
    /// Home-domain server the authoritative attribute set came from.
    pub domain: String,
    pub object_class: String,
    pub distinguished_name: String,
    /// Source attribute value at enumeration time.
    pub source_value: Option<AttributeValue>,
    /// Target attribute value at enumeration time.
    pub target_value: Option<AttributeValue>,
    /// Slot of this object's Get-phase record, when one was emitted. The
    /// mutation phase updates that record in place instead of appending a
    /// second one for the same object.
    pub result_slot: Option<usize>,
}

impl DirectoryObjectRef {
    /// Whether the target attribute was unset when the object was fetched.
    pub fn target_is_unset(&self) -> bool {
        matches!(&self.target_value, None | Some(AttributeValue::Null))
    }

    /// The source value, if it carries one.
    pub fn source_value(&self) -> Option<&AttributeValue> {
        self.source_value.as_ref().filter(|v| !v.is_null())
    }
}

/// Executes query units and identity lookups against the directory.
pub struct ObjectEnumerator<'a> {
    directory: &'a dyn DirectoryClient,
    attributes: &'a AttributePair,
}

impl<'a> ObjectEnumerator<'a> {
    /// Create an enumerator for one run's attribute pair.
    pub fn new(directory: &'a dyn DirectoryClient, attributes: &'a AttributePair) -> Self {
        Self {
            directory,
            attributes,
        }
    }

    fn fetch_properties(&self) -> Vec<&str> {
        vec![
            "objectClass",
            "distinguishedName",
            "objectGUID",
            self.attributes.source.as_str(),
            self.attributes.target.as_str(),
        ]
    }

    fn snapshot(&self, entry: &DirectoryEntry, domain: &str) -> DirectoryObjectRef {
        let dn = entry.dn().unwrap_or_default().to_string();
        let identifier = entry
            .get_string("objectGUID")
            .map(str::to_string)
            .unwrap_or_else(|| dn.clone());

        DirectoryObjectRef {
            identifier,
            domain: domain.to_string(),
            object_class: entry.get_string("objectClass").unwrap_or_default().to_string(),
            distinguished_name: dn,
            source_value: entry.get(&self.attributes.source).cloned(),
            target_value: entry.get(&self.attributes.target).cloned(),
            result_slot: None,
        }
    }

    /// Execute pre-built query units sequentially.
    ///
    /// Every returned object is annotated with the domain its unit queried.
    /// A unit whose query cannot be executed aborts the run: the failure is
    /// scope-wide, not per-object.
    #[instrument(skip(self, units), fields(units = units.len()))]
    pub async fn enumerate_units(
        &self,
        units: &[QueryUnit],
    ) -> PropagationResult<Vec<DirectoryObjectRef>> {
        let properties = self.fetch_properties();
        let mut objects = Vec::new();

        for unit in units {
            let entries = self
                .directory
                .query_objects(
                    &unit.filter,
                    unit.search_base.as_deref(),
                    unit.search_scope,
                    Some(&unit.server),
                    &properties,
                )
                .await
                .map_err(|e| {
                    PropagationError::scope_resolution(
                        format!("query against {}", unit.server),
                        e.to_string(),
                    )
                })?;

            debug!(server = %unit.server, count = entries.len(), "enumerated query unit");
            objects.extend(entries.iter().map(|entry| self.snapshot(entry, &unit.server)));
        }

        Ok(objects)
    }

    /// Resolve identifiers one by one, recording exactly one Get-phase
    /// outcome per identifier.
    ///
    /// A failure for one identifier never stops the remaining ones.
    #[instrument(skip(self, ids, reporter), fields(ids = ids.len()))]
    pub async fn enumerate_identities(
        &self,
        ids: &[String],
        reporter: &mut ResultReporter,
    ) -> Vec<DirectoryObjectRef> {
        let mut objects = Vec::with_capacity(ids.len());

        for id in ids {
            match self.lookup_identity(id).await {
                Ok(mut object) => {
                    let slot = reporter.push(OperationResult::for_object(
                        &object,
                        OperationStatus::GetSucceeded,
                        self.attributes,
                        None,
                    ));
                    object.result_slot = Some(slot);
                    objects.push(object);
                }
                Err(e) => {
                    warn!(identifier = %id, error = %e, "identity lookup failed");
                    reporter.push(OperationResult::get_failed(id, self.attributes, e.to_string()));
                }
            }
        }

        objects
    }

    /// Two-phase lookup for one identifier.
    ///
    /// Phase 1 queries without pinning a server to discover the object and
    /// its home domain; phase 2 re-fetches from the home-domain server,
    /// where the full attribute set is available.
    async fn lookup_identity(&self, id: &str) -> PropagationResult<DirectoryObjectRef> {
        let discovery_filter = DirectoryFilter::or(vec![
            DirectoryFilter::eq("sAMAccountName", id),
            DirectoryFilter::eq("distinguishedName", id),
            DirectoryFilter::eq("objectGUID", id),
        ]);

        let matches = self
            .directory
            .query_objects(
                &discovery_filter,
                None,
                None,
                None,
                &["objectClass", "distinguishedName"],
            )
            .await
            .map_err(|e| PropagationError::object_lookup(id, e.to_string()))?;

        let entry = match matches.len() {
            0 => return Err(PropagationError::object_lookup(id, "no matching object")),
            1 => &matches[0],
            n => {
                return Err(PropagationError::object_lookup(
                    id,
                    format!("ambiguous identifier: {n} matches"),
                ))
            }
        };

        let dn = entry
            .dn()
            .ok_or_else(|| PropagationError::object_lookup(id, "entry has no distinguished name"))?
            .to_string();

        let home_domain = server_from_dn(&dn)
            .map_err(|e| PropagationError::object_lookup(id, e.to_string()))?;

        let full = self
            .directory
            .get_object(&dn, Some(&home_domain), &self.fetch_properties())
            .await
            .map_err(|e| PropagationError::object_lookup(id, e.to_string()))?
            .ok_or_else(|| {
                PropagationError::object_lookup(
                    id,
                    format!("not found on home domain server {home_domain}"),
                )
            })?;

        Ok(self.snapshot(&full, &home_domain))
    }
}
