//! Scope selection and resolution.
//!
//! A run targets exactly one scope: individual identities, a subtree rooted
//! at a distinguished name, a domain, or a whole forest. The resolver turns
//! the non-identity scopes into per-server query units; identity scopes are
//! resolved one identifier at a time by the enumerator because each
//! identifier may live in a different domain.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::directory::{DirectoryClient, DirectoryFilter, SearchScope};
use crate::error::{PropagationError, PropagationResult};

/// Which objects a run operates on. Exactly one variant per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScopeSelector {
    /// Individual identifiers (SAM name, DN, or GUID), resolved one by one.
    Identity { ids: Vec<String> },
    /// A subtree (or single level, or single object) under a DN.
    SearchBase { dn: String, scope: SearchScope },
    /// Every person and group in one domain.
    Domain { fqdn: String },
    /// Every person and group in every domain of a forest.
    Forest { fqdn: String },
}

impl ScopeSelector {
    /// Short description used in spans and error messages.
    pub fn describe(&self) -> String {
        match self {
            ScopeSelector::Identity { ids } => format!("identity ({} ids)", ids.len()),
            ScopeSelector::SearchBase { dn, .. } => format!("search base {dn}"),
            ScopeSelector::Domain { fqdn } => format!("domain {fqdn}"),
            ScopeSelector::Forest { fqdn } => format!("forest {fqdn}"),
        }
    }
}

/// One executable query: a server plus the filter and optional base to run
/// against it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryUnit {
    /// Server the query is routed to; also the domain annotation for every
    /// object the unit returns.
    pub server: String,
    pub filter: DirectoryFilter,
    pub search_base: Option<String>,
    pub search_scope: Option<SearchScope>,
}

/// Filter restricting enumeration to people and groups.
pub fn person_or_group_filter() -> DirectoryFilter {
    DirectoryFilter::or(vec![
        DirectoryFilter::eq("objectClass", "person"),
        DirectoryFilter::eq("objectClass", "group"),
    ])
}

/// Derive the owning domain name from the `DC=` components of a DN.
///
/// `OU=Users,OU=Managed,DC=corp,DC=example,DC=com` → `corp.example.com`.
pub fn server_from_dn(dn: &str) -> PropagationResult<String> {
    let labels: Vec<&str> = dn
        .split(',')
        .map(str::trim)
        .filter_map(|component| {
            let (key, value) = component.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("dc") {
                Some(value.trim())
            } else {
                None
            }
        })
        .collect();

    if labels.is_empty() {
        return Err(PropagationError::scope_resolution(
            dn,
            "distinguished name has no domain components",
        ));
    }

    Ok(labels.join("."))
}

/// Turns a scope selector into per-server query units.
pub struct ScopeResolver<'a> {
    directory: &'a dyn DirectoryClient,
}

impl<'a> ScopeResolver<'a> {
    /// Create a resolver over a directory client.
    pub fn new(directory: &'a dyn DirectoryClient) -> Self {
        Self { directory }
    }

    /// Resolve a selector into query units.
    ///
    /// Returns an empty list for identity scopes. Any metadata resolution
    /// failure is fatal and surfaces before enumeration starts.
    #[instrument(skip(self, selector), fields(scope = %selector.describe()))]
    pub async fn resolve(&self, selector: &ScopeSelector) -> PropagationResult<Vec<QueryUnit>> {
        match selector {
            ScopeSelector::Identity { .. } => Ok(Vec::new()),

            ScopeSelector::SearchBase { dn, scope } => {
                let server = server_from_dn(dn)?;
                debug!(server = %server, "derived server from search base");
                Ok(vec![QueryUnit {
                    server,
                    filter: person_or_group_filter(),
                    search_base: Some(dn.clone()),
                    search_scope: Some(*scope),
                }])
            }

            ScopeSelector::Domain { fqdn } => {
                let meta = self.directory.resolve_domain(fqdn).await.map_err(|e| {
                    PropagationError::scope_resolution(format!("domain {fqdn}"), e.to_string())
                })?;
                Ok(vec![QueryUnit {
                    server: meta.dns_root,
                    filter: person_or_group_filter(),
                    search_base: None,
                    search_scope: None,
                }])
            }

            ScopeSelector::Forest { fqdn } => {
                let forest = self.directory.resolve_forest(fqdn).await.map_err(|e| {
                    PropagationError::scope_resolution(format!("forest {fqdn}"), e.to_string())
                })?;

                let mut units = Vec::with_capacity(forest.domains.len());
                for domain in &forest.domains {
                    let meta = self.directory.resolve_domain(domain).await.map_err(|e| {
                        PropagationError::scope_resolution(
                            format!("domain {domain} in forest {fqdn}"),
                            e.to_string(),
                        )
                    })?;
                    units.push(QueryUnit {
                        server: meta.dns_root,
                        filter: person_or_group_filter(),
                        search_base: None,
                        search_scope: None,
                    });
                }
                debug!(domains = units.len(), "resolved forest scope");
                Ok(units)
            }
        }
    }
}
