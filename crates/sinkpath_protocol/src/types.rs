use crate::xml::XmlNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Storage keys
// ============================================================================

/// Element and attribute key holding the registered cluster name.
pub const SOURCE_CONFIGURATION_NAME: &str = "source_configuration_name";

/// Flat attribute key holding the raw (possibly stale) output URL.
pub const FILE_NAME_ATTRIBUTE: &str = "file_name";

/// Step child element grouping the output file settings.
pub const FILE_TAG: &str = "file";

/// Child of `<file>` holding the raw output URL.
pub const NAME_TAG: &str = "name";

/// Step child element carrying the embedded cluster definition.
pub const NAMED_CLUSTER_TAG: &str = "NamedCluster";

// ============================================================================
// Resolution context
// ============================================================================

/// Opaque handle to the metadata store backing the cluster registry.
///
/// The core never looks inside; it is only threaded through to registry
/// lookups and cluster substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaStoreHandle(String);

impl MetaStoreHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetaStoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variables available to `${NAME}` expansion during substitution.
///
/// Expansion applies to cluster connection fields. A raw URL path keeps its
/// tokens; the running step expands them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSpace {
    values: BTreeMap<String, String>,
}

impl VariableSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand `${NAME}` tokens, leaving unknown variables in place.
    pub fn expand(&self, input: &str) -> String {
        match expand_tokens(input, |name| self.get(name)) {
            Ok(expanded) | Err((expanded, _)) => expanded,
        }
    }

    /// Expand `${NAME}` tokens, failing with the first unknown variable name.
    pub fn expand_strict(&self, input: &str) -> Result<String, String> {
        expand_tokens(input, |name| self.get(name)).map_err(|(_, name)| name)
    }
}

/// Expands `${NAME}` tokens. On failure returns the partially expanded text
/// together with the first unknown name.
fn expand_tokens<'v, F>(input: &str, lookup: F) -> Result<String, (String, String)>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut unknown: Option<String> = None;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated token: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        match lookup(name) {
            Some(value) => out.push_str(value),
            None => {
                if unknown.is_none() {
                    unknown = Some(name.to_string());
                }
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    match unknown {
        Some(name) => Err((out, name)),
        None => Ok(out),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableSpace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Caller-supplied environment for one resolution call. Never persisted.
///
/// `registry_available` selects the branch: lookup by name when true,
/// decoding the embedded definition when false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    registry_available: bool,
    meta_store: Option<MetaStoreHandle>,
    variables: VariableSpace,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::online()
    }
}

impl ResolutionContext {
    pub fn new(registry_available: bool) -> Self {
        Self {
            registry_available,
            meta_store: None,
            variables: VariableSpace::new(),
        }
    }

    /// Context with the central registry reachable.
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Context without a registry; embedded definitions govern.
    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn with_meta_store(mut self, meta_store: MetaStoreHandle) -> Self {
        self.meta_store = Some(meta_store);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.set(name, value);
        self
    }

    pub fn with_variables(mut self, variables: VariableSpace) -> Self {
        self.variables = variables;
        self
    }

    pub fn registry_available(&self) -> bool {
        self.registry_available
    }

    pub fn meta_store(&self) -> Option<&MetaStoreHandle> {
        self.meta_store.as_ref()
    }

    pub fn variables(&self) -> &VariableSpace {
        &self.variables
    }
}

// ============================================================================
// Source reference
// ============================================================================

/// The persisted decision of where a sink step writes.
///
/// Holds the raw URL plus both possible cluster sources. Which of
/// `configuration_name` / `embedded_definition_xml` governs is decided by
/// [`ResolutionContext::registry_available`], not by which field is set; the
/// embedded copy is carried so a reference saved with a registry still
/// resolves without one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configuration_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedded_definition_xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_url: Option<String>,
}

impl SourceReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference resolved through the named cluster `name`.
    pub fn by_name(name: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self::new()
            .with_configuration_name(Some(name.into()))
            .with_raw_url(Some(raw_url.into()))
    }

    pub fn with_configuration_name(mut self, name: Option<String>) -> Self {
        self.set_configuration_name(name);
        self
    }

    pub fn with_embedded_definition(mut self, xml: Option<String>) -> Self {
        self.set_embedded_definition_xml(xml);
        self
    }

    pub fn with_raw_url(mut self, raw_url: Option<String>) -> Self {
        self.raw_url = raw_url;
        self
    }

    pub fn configuration_name(&self) -> Option<&str> {
        self.configuration_name.as_deref()
    }

    pub fn embedded_definition_xml(&self) -> Option<&str> {
        self.embedded_definition_xml.as_deref()
    }

    pub fn raw_url(&self) -> Option<&str> {
        self.raw_url.as_deref()
    }

    /// Blank names are stored as absent.
    pub fn set_configuration_name(&mut self, name: Option<String>) {
        self.configuration_name = non_blank(name);
    }

    /// Well-formed fragments are stored in compact form, so the copy reads
    /// the same after a trip through a step document. Anything else is kept
    /// as given and rejected when it is decoded.
    pub fn set_embedded_definition_xml(&mut self, xml: Option<String>) {
        self.embedded_definition_xml = non_blank(xml).map(|fragment| {
            match XmlNode::parse(&fragment) {
                Ok(node) => node.to_xml(),
                Err(_) => fragment,
            }
        });
    }

    pub fn set_raw_url(&mut self, raw_url: Option<String>) {
        self.raw_url = raw_url;
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
