//! Persistence of the step's output location.
//!
//! Both storage shapes go through one function each way. In XML the name and
//! the cluster selector sit under `<file>` while the embedded cluster copy is
//! a direct child of the step node. In the attribute store only the name and
//! the selector are kept; the URL is re-resolved on load.

use crate::error::Result;
use crate::meta::FileOutputMeta;
use crate::resolve::resolve;
use sinkpath_cluster::{codec, ClusterLookupResult};
use sinkpath_protocol::xml::add_tag_value;
use sinkpath_protocol::{
    ObjectId, ResolutionContext, SourceReference, StepAttributeStore, XmlNode, FILE_NAME_ATTRIBUTE,
    FILE_TAG, NAMED_CLUSTER_TAG, NAME_TAG, SOURCE_CONFIGURATION_NAME,
};
use tracing::debug;

/// XML written for the output location, split by where it belongs in the
/// step node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSource {
    /// Elements for the inside of `<file>`.
    pub file_entries: String,
    /// Cluster copy for the step level, if there is one.
    pub embedded_fragment: Option<String>,
}

impl FileOutputMeta {
    /// Write the output location.
    ///
    /// With the registry available a registered cluster is encoded fresh, so
    /// the embedded copy tracks the registry. Otherwise whatever copy the
    /// step already carries is written back unchanged.
    pub fn save_source(&self, ctx: &ResolutionContext) -> Result<SavedSource> {
        let mut file_entries = String::new();
        file_entries.push_str("      ");
        file_entries.push_str(&add_tag_value(NAME_TAG, self.source.raw_url()));
        file_entries.push_str("      ");
        file_entries.push_str(&add_tag_value(
            SOURCE_CONFIGURATION_NAME,
            self.source.configuration_name(),
        ));

        let lookup = match self.source.configuration_name() {
            Some(name) if ctx.registry_available() => self.registry.lookup_by_name(name, ctx),
            _ => ClusterLookupResult::NotFound,
        };
        let embedded_fragment = match lookup {
            ClusterLookupResult::Found(definition) => {
                debug!(cluster = definition.name(), "Embedding registered cluster");
                Some(codec::encode(definition.as_ref(), NAMED_CLUSTER_TAG)?)
            }
            ClusterLookupResult::NotFound => {
                self.source.embedded_definition_xml().map(str::to_string)
            }
        };

        Ok(SavedSource {
            file_entries,
            embedded_fragment,
        })
    }

    /// Read the output location from a step node.
    pub fn load_source(step_node: &XmlNode) -> Result<SourceReference> {
        let file = step_node.sub_node(FILE_TAG);
        let raw_url = file
            .and_then(|f| f.tag_value(NAME_TAG))
            .map(str::to_string);
        let configuration_name = file
            .and_then(|f| f.tag_value(SOURCE_CONFIGURATION_NAME))
            .map(str::to_string);
        let embedded = step_node.sub_node(NAMED_CLUSTER_TAG).map(XmlNode::to_xml);

        Ok(SourceReference::new()
            .with_raw_url(raw_url)
            .with_configuration_name(configuration_name)
            .with_embedded_definition(embedded))
    }

    /// Write the output location as step attributes.
    pub fn save_source_rep(
        &self,
        store: &mut dyn StepAttributeStore,
        id_transformation: &ObjectId,
        id_step: &ObjectId,
    ) -> Result<()> {
        store.save_step_attribute(
            id_transformation,
            id_step,
            FILE_NAME_ATTRIBUTE,
            self.source.raw_url(),
        )?;
        store.save_step_attribute(
            id_transformation,
            id_step,
            SOURCE_CONFIGURATION_NAME,
            self.source.configuration_name(),
        )?;
        Ok(())
    }

    /// Read the output location from step attributes and return the URL it
    /// resolves to now. The stored URL is only a fallback.
    pub fn load_source_rep(
        &mut self,
        store: &dyn StepAttributeStore,
        id_step: &ObjectId,
        ctx: &ResolutionContext,
    ) -> Result<Option<String>> {
        let raw_url = store.step_attribute_string(id_step, FILE_NAME_ATTRIBUTE)?;
        let configuration_name = store.step_attribute_string(id_step, SOURCE_CONFIGURATION_NAME)?;

        self.source = SourceReference::new()
            .with_raw_url(raw_url)
            .with_configuration_name(configuration_name);

        resolve(&self.source, self.registry.as_ref(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinkpath_cluster::{InMemoryRegistry, NamedCluster};
    use sinkpath_protocol::InMemoryAttributeStore;
    use std::sync::Arc;

    fn meta() -> FileOutputMeta {
        let registry = InMemoryRegistry::new()
            .with_cluster(NamedCluster::template().derive("prod").with_hdfs("nn1", "8020"));
        FileOutputMeta::new(Arc::new(registry))
    }

    #[test]
    fn save_source_embeds_registered_cluster() {
        let mut meta = meta();
        meta.set_file_name(Some("/out".to_string()));
        meta.set_source_configuration_name(Some("prod".to_string()));

        let saved = meta.save_source(&ResolutionContext::online()).unwrap();
        assert!(saved.file_entries.contains("<name>/out</name>"));
        assert!(saved
            .file_entries
            .contains("<source_configuration_name>prod</source_configuration_name>"));
        let fragment = saved.embedded_fragment.unwrap();
        assert!(fragment.starts_with("<NamedCluster>"));
        assert!(fragment.contains("<hdfs_host>nn1</hdfs_host>"));
    }

    #[test]
    fn save_source_offline_keeps_carried_copy() {
        let mut meta = meta();
        meta.source = SourceReference::by_name("prod", "/out")
            .with_embedded_definition(Some("<NamedCluster><name>prod</name></NamedCluster>".into()));

        let saved = meta.save_source(&ResolutionContext::offline()).unwrap();
        assert_eq!(
            saved.embedded_fragment.as_deref(),
            Some("<NamedCluster><name>prod</name></NamedCluster>")
        );
    }

    #[test]
    fn save_source_without_cluster_writes_empty_selector() {
        let mut meta = meta();
        meta.set_file_name(Some("/plain".to_string()));

        let saved = meta.save_source(&ResolutionContext::online()).unwrap();
        assert!(saved.file_entries.contains("<source_configuration_name/>"));
        assert_eq!(saved.embedded_fragment, None);
    }

    #[test]
    fn load_source_reads_both_locations() {
        let node = XmlNode::parse(
            "<step><file><name>/out</name><source_configuration_name>prod</source_configuration_name></file>\
             <NamedCluster><name>prod</name></NamedCluster></step>",
        )
        .unwrap();
        let source = FileOutputMeta::load_source(&node).unwrap();
        assert_eq!(source.raw_url(), Some("/out"));
        assert_eq!(source.configuration_name(), Some("prod"));
        assert_eq!(
            source.embedded_definition_xml(),
            Some("<NamedCluster><name>prod</name></NamedCluster>")
        );
    }

    #[test]
    fn carried_copy_reads_back_unchanged_from_step_xml() {
        let cluster = NamedCluster::template().derive("prod").with_hdfs("nn1", "8020");
        let fragment = codec::encode(&cluster, NAMED_CLUSTER_TAG).unwrap();
        assert!(fragment.contains('\n'));

        let mut meta = meta();
        meta.source = SourceReference::by_name("prod", "/out").with_embedded_definition(Some(fragment));

        let xml = meta.get_xml(&ResolutionContext::offline()).unwrap();
        let node = XmlNode::parse(&format!("<entry>{}</entry>", xml)).unwrap();
        let loaded = FileOutputMeta::load_source(&node).unwrap();
        assert_eq!(
            loaded.embedded_definition_xml(),
            meta.source.embedded_definition_xml()
        );
        assert_eq!(loaded, meta.source);
    }

    #[test]
    fn load_source_tolerates_missing_file_node() {
        let node = XmlNode::parse("<step><separator>;</separator></step>").unwrap();
        assert_eq!(FileOutputMeta::load_source(&node).unwrap(), SourceReference::new());
    }

    #[test]
    fn attribute_round_trip_resolves_url() {
        let mut meta = meta();
        meta.set_file_name(Some("/out".to_string()));
        meta.set_source_configuration_name(Some("prod".to_string()));

        let mut store = InMemoryAttributeStore::new();
        let trans = ObjectId::new("t1");
        let step = ObjectId::new("s1");
        meta.save_source_rep(&mut store, &trans, &step).unwrap();

        let mut loaded = self::meta();
        let url = loaded
            .load_source_rep(&store, &step, &ResolutionContext::online())
            .unwrap();
        assert_eq!(url.as_deref(), Some("hdfs://nn1:8020/out"));
        assert_eq!(loaded.source_configuration_name(), Some("prod"));
    }
}
