//! Loading step definitions from files.

use crate::error::{Result, StepError};
use sinkpath_protocol::{XmlError, XmlNode};
use std::path::Path;

/// Root element of a saved step definition.
pub const STEP_ENTRY_TAG: &str = "entry";

/// Read the step definition at `path` and return its `<entry>` node.
///
/// The entry may be the document root or a direct child of it.
pub fn load_step_resource(path: &Path) -> Result<XmlNode> {
    if !path.is_file() {
        return Err(StepError::ResourceNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| StepError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let root = XmlNode::parse(&content)?;
    if root.tag() == STEP_ENTRY_TAG {
        return Ok(root);
    }
    root.sub_node(STEP_ENTRY_TAG)
        .cloned()
        .ok_or_else(|| XmlError::MissingElement(STEP_ENTRY_TAG.to_string()).into())
}
