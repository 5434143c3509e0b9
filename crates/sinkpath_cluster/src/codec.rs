//! Embedded cluster definitions.
//!
//! A step saved against a registry carries an inline copy of its cluster so
//! it can still resolve somewhere without one. Decoding always starts from
//! the template of the registry present at decode time; the fragment only
//! overrides what it contains.

use crate::definition::ClusterDefinition;
use crate::error::{ClusterError, Result};
use sinkpath_protocol::{XmlError, XmlNode, NAMED_CLUSTER_TAG};
use std::sync::Arc;

/// Serialize `definition` as an inline fragment rooted at `<tag>`.
pub fn encode(definition: &dyn ClusterDefinition, tag: &str) -> Result<String> {
    definition.to_xml_for_embed(tag)
}

/// Decode a fragment rooted at the default `<NamedCluster>` tag.
pub fn decode(template: &dyn ClusterDefinition, fragment: &str) -> Result<Arc<dyn ClusterDefinition>> {
    decode_with_tag(template, fragment, NAMED_CLUSTER_TAG)
}

/// Decode `fragment` against `template`, rejecting anything not rooted at
/// `<expected_tag>`.
pub fn decode_with_tag(
    template: &dyn ClusterDefinition,
    fragment: &str,
    expected_tag: &str,
) -> Result<Arc<dyn ClusterDefinition>> {
    match XmlNode::parse_rooted(fragment, expected_tag) {
        Ok(_) => template.from_xml_for_embed(fragment),
        Err(XmlError::UnexpectedRoot { found, .. }) => Err(ClusterError::malformed(
            expected_tag,
            format!("fragment is rooted at <{}>", found),
        )),
        Err(err) => Err(ClusterError::malformed(expected_tag, err.to_string())),
    }
}
