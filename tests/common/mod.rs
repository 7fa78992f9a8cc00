//! In-memory directory fake shared by the integration suites.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use guidlink::async_trait;
use guidlink::prelude::*;

/// One recorded mutation call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub identifier: String,
    pub server: String,
    pub attribute: String,
    pub value: AttributeValue,
}

/// In-memory [`DirectoryClient`] with scripted failures.
///
/// Entries are stored per server; a query or fetch without a server searches
/// all of them, modelling the partial directory-wide view.
#[derive(Default)]
pub struct InMemoryDirectory {
    domains: HashMap<String, DomainMeta>,
    forests: HashMap<String, ForestMeta>,
    entries: Vec<(String, DirectoryEntry)>,
    bound: bool,
    fail_queries_on: HashSet<String>,
    fail_updates_on: HashSet<String>,
    updates: Mutex<Vec<UpdateCall>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            bound: true,
            ..Self::default()
        }
    }

    pub fn unbound(mut self) -> Self {
        self.bound = false;
        self
    }

    pub fn with_domain(mut self, fqdn: &str, dns_root: &str) -> Self {
        self.domains
            .insert(fqdn.to_string(), DomainMeta::new(dns_root));
        self
    }

    pub fn with_forest(mut self, fqdn: &str, domains: &[&str]) -> Self {
        self.forests.insert(
            fqdn.to_string(),
            ForestMeta {
                root_domain: fqdn.to_string(),
                domains: domains.iter().map(|d| d.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_entry(mut self, server: &str, entry: DirectoryEntry) -> Self {
        self.entries.push((server.to_string(), entry));
        self
    }

    /// Make every query routed to `server` fail.
    pub fn fail_queries_on(mut self, server: &str) -> Self {
        self.fail_queries_on.insert(server.to_string());
        self
    }

    /// Make updates against `identifier` fail.
    pub fn fail_updates_on(mut self, identifier: &str) -> Self {
        self.fail_updates_on.insert(identifier.to_string());
        self
    }

    /// Every mutation call made so far, including rejected ones.
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    fn matches(entry: &DirectoryEntry, filter: &DirectoryFilter) -> bool {
        match filter {
            DirectoryFilter::Equals { attribute, value } => {
                entry.get_string(attribute) == Some(value.as_str())
            }
            DirectoryFilter::And { filters } => filters.iter().all(|f| Self::matches(entry, f)),
            DirectoryFilter::Or { filters } => filters.iter().any(|f| Self::matches(entry, f)),
        }
    }

    fn in_scope(entry: &DirectoryEntry, base: Option<&str>, scope: Option<SearchScope>) -> bool {
        let Some(base) = base else { return true };
        let Some(dn) = entry.dn() else { return false };

        match scope.unwrap_or(SearchScope::SubTree) {
            SearchScope::Base => dn == base,
            SearchScope::OneLevel => dn
                .strip_suffix(base)
                .and_then(|rest| rest.strip_suffix(','))
                .is_some_and(|rdn| !rdn.contains(',')),
            SearchScope::SubTree => dn == base || dn.ends_with(&format!(",{base}")),
        }
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn query_objects(
        &self,
        filter: &DirectoryFilter,
        search_base: Option<&str>,
        search_scope: Option<SearchScope>,
        server: Option<&str>,
        _properties: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        if let Some(server) = server {
            if self.fail_queries_on.contains(server) {
                return Err(DirectoryError::Unavailable(format!(
                    "server {server} unreachable"
                )));
            }
        }

        Ok(self
            .entries
            .iter()
            .filter(|(entry_server, _)| server.is_none_or(|s| entry_server.as_str() == s))
            .map(|(_, entry)| entry)
            .filter(|entry| Self::matches(entry, filter))
            .filter(|entry| Self::in_scope(entry, search_base, search_scope))
            .cloned()
            .collect())
    }

    async fn get_object(
        &self,
        identifier: &str,
        server: Option<&str>,
        _properties: &[&str],
    ) -> DirectoryResult<Option<DirectoryEntry>> {
        if let Some(server) = server {
            if self.fail_queries_on.contains(server) {
                return Err(DirectoryError::Unavailable(format!(
                    "server {server} unreachable"
                )));
            }
        }

        Ok(self
            .entries
            .iter()
            .filter(|(entry_server, _)| server.is_none_or(|s| entry_server.as_str() == s))
            .map(|(_, entry)| entry)
            .find(|entry| {
                entry.dn() == Some(identifier)
                    || entry.get_string("objectGUID") == Some(identifier)
                    || entry.get_string("sAMAccountName") == Some(identifier)
            })
            .cloned())
    }

    async fn resolve_domain(&self, fqdn: &str) -> DirectoryResult<DomainMeta> {
        self.domains
            .get(fqdn)
            .cloned()
            .ok_or_else(|| DirectoryError::Unavailable(format!("cannot resolve domain {fqdn}")))
    }

    async fn resolve_forest(&self, fqdn: &str) -> DirectoryResult<ForestMeta> {
        self.forests
            .get(fqdn)
            .cloned()
            .ok_or_else(|| DirectoryError::Unavailable(format!("cannot resolve forest {fqdn}")))
    }

    async fn update_attribute(
        &self,
        identifier: &str,
        server: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> DirectoryResult<()> {
        self.updates.lock().unwrap().push(UpdateCall {
            identifier: identifier.to_string(),
            server: server.to_string(),
            attribute: attribute.to_string(),
            value: value.clone(),
        });

        if self.fail_updates_on.contains(identifier) {
            return Err(DirectoryError::Rejected(format!(
                "update rejected for {identifier}"
            )));
        }
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.bound
    }
}

/// A person entry with the standard attribute layout used across the suites.
pub fn person(sam: &str, dn: &str, guid: &str) -> DirectoryEntry {
    DirectoryEntry::new()
        .with("objectClass", "person")
        .with("sAMAccountName", sam)
        .with("distinguishedName", dn)
        .with("objectGUID", guid)
}
