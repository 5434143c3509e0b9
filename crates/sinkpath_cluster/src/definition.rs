use crate::error::Result;
use sinkpath_protocol::ResolutionContext;
use std::fmt;
use std::sync::Arc;

/// A cluster definition as seen by the resolver.
///
/// Beyond its name the resolver only needs [`substitute`](Self::substitute).
/// The embed pair lets a step carry a portable copy: `to_xml_for_embed`
/// writes one, and `from_xml_for_embed` (called on a *template*) reads one
/// back. Implementations must keep `substitute` idempotent for a fixed
/// `(definition, raw_url)`.
pub trait ClusterDefinition: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Apply this cluster's connection parameters to `raw_url`.
    fn substitute(&self, raw_url: &str, ctx: &ResolutionContext) -> Result<String>;

    /// Serialize as an inline fragment rooted at `<tag>`.
    fn to_xml_for_embed(&self, tag: &str) -> Result<String>;

    /// Rebuild a definition from `fragment`, treating `self` as the template
    /// supplying anything the fragment omits.
    fn from_xml_for_embed(&self, fragment: &str) -> Result<Arc<dyn ClusterDefinition>>;
}

/// Outcome of a registry lookup. `NotFound` is a normal answer (the cluster
/// was deleted or renamed), not an error.
#[derive(Debug, Clone)]
pub enum ClusterLookupResult {
    Found(Arc<dyn ClusterDefinition>),
    NotFound,
}

impl ClusterLookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ClusterLookupResult::Found(_))
    }

    pub fn into_definition(self) -> Option<Arc<dyn ClusterDefinition>> {
        match self {
            ClusterLookupResult::Found(definition) => Some(definition),
            ClusterLookupResult::NotFound => None,
        }
    }
}

impl From<Option<Arc<dyn ClusterDefinition>>> for ClusterLookupResult {
    fn from(value: Option<Arc<dyn ClusterDefinition>>) -> Self {
        match value {
            Some(definition) => ClusterLookupResult::Found(definition),
            None => ClusterLookupResult::NotFound,
        }
    }
}
