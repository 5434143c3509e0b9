//! Output location resolution.
//!
//! The branch is chosen by registry availability, never by which fields of
//! the reference happen to be populated:
//!
//! - registry available: look the cluster up by name and substitute; a
//!   missing cluster degrades to the raw URL.
//! - registry unavailable: decode the embedded copy against the registry's
//!   template and substitute.

use crate::error::Result;
use sinkpath_cluster::{codec, substitute, ClusterLookupResult, ClusterRegistry};
use sinkpath_protocol::{ResolutionContext, SourceReference};
use tracing::{debug, warn};

/// Resolve `reference` to a concrete URL.
///
/// Returns `Ok(None)` only when no raw URL is configured. Substitution and
/// decoding errors propagate unchanged.
pub fn resolve(
    reference: &SourceReference,
    registry: &dyn ClusterRegistry,
    ctx: &ResolutionContext,
) -> Result<Option<String>> {
    let Some(raw_url) = reference.raw_url() else {
        return Ok(None);
    };

    if !ctx.registry_available() {
        return resolve_embedded(reference, raw_url, registry, ctx).map(Some);
    }

    let lookup = match reference.configuration_name() {
        Some(name) => registry.lookup_by_name(name, ctx),
        None => ClusterLookupResult::NotFound,
    };

    match lookup {
        ClusterLookupResult::Found(definition) => {
            debug!(cluster = definition.name(), raw = raw_url, "Resolving through registry");
            Ok(Some(substitute(definition.as_ref(), raw_url, ctx)?))
        }
        ClusterLookupResult::NotFound => {
            if let Some(name) = reference.configuration_name() {
                warn!(
                    cluster = name,
                    url = raw_url,
                    "Named cluster not registered; using configured URL as-is"
                );
            }
            Ok(Some(raw_url.to_string()))
        }
    }
}

fn resolve_embedded(
    reference: &SourceReference,
    raw_url: &str,
    registry: &dyn ClusterRegistry,
    ctx: &ResolutionContext,
) -> Result<String> {
    let Some(fragment) = reference.embedded_definition_xml() else {
        debug!(url = raw_url, "No registry and no embedded cluster; using configured URL as-is");
        return Ok(raw_url.to_string());
    };

    let template = registry.template();
    let definition = codec::decode(template.as_ref(), fragment)?;
    debug!(cluster = definition.name(), raw = raw_url, "Resolving through embedded cluster");
    Ok(substitute(definition.as_ref(), raw_url, ctx)?)
}
