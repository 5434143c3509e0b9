//! Output location resolution against registry doubles.

mod support;

use proptest::prelude::*;
use sinkpath_protocol::{MetaStoreHandle, ResolutionContext, SourceReference};
use sinkpath_step::{resolve, FileOutputMeta};
use std::sync::Arc;
use support::{StubCluster, StubRegistry};

const CLUSTER: &str = "TEST-CLUSTER-NAME";
const EMBEDDED: &str = "<NamedCluster><name>TEST-CLUSTER-NAME</name></NamedCluster>";

fn online() -> ResolutionContext {
    ResolutionContext::online().with_meta_store(MetaStoreHandle::new("memory"))
}

#[test]
fn processed_url_without_url_is_none() {
    let mut meta = FileOutputMeta::new(Arc::new(StubRegistry::empty()));
    meta.set_source_configuration_name(Some(CLUSTER.to_string()));

    assert_eq!(meta.processed_url(&online(), None).unwrap(), None);
}

#[test]
fn processed_url_falls_back_to_raw_url_when_cluster_missing() {
    let mut meta = FileOutputMeta::new(Arc::new(StubRegistry::empty()));
    meta.set_source_configuration_name(Some(CLUSTER.to_string()));

    assert_eq!(
        meta.processed_url(&online(), Some("hc://in/put")).unwrap(),
        Some("hc://in/put".to_string())
    );
}

#[test]
fn processed_url_substitutes_through_registered_cluster() {
    let cluster = Arc::new(StubCluster::named(CLUSTER).substituting_to("hdfs://nn:8020/in/put"));
    let registry = StubRegistry::empty().with_cluster(Arc::clone(&cluster));
    let mut meta = FileOutputMeta::new(Arc::new(registry));
    meta.set_source_configuration_name(Some(CLUSTER.to_string()));

    assert_eq!(
        meta.processed_url(&online(), Some("hc://in/put")).unwrap(),
        Some("hdfs://nn:8020/in/put".to_string())
    );
    assert_eq!(cluster.substitute_calls(), 1);
}

#[test]
fn offline_resolution_decodes_embedded_copy_against_template() {
    let decoded = Arc::new(StubCluster::named(CLUSTER).substituting_to("hdfs://embedded/out"));
    let template = Arc::new(StubCluster::named("").decoding_to(Arc::clone(&decoded)));
    let registry = StubRegistry::empty().with_template(Arc::clone(&template));

    let reference =
        SourceReference::by_name(CLUSTER, "/out").with_embedded_definition(Some(EMBEDDED.to_string()));

    assert_eq!(
        resolve(&reference, &registry, &ResolutionContext::offline()).unwrap(),
        Some("hdfs://embedded/out".to_string())
    );
    assert_eq!(template.decode_calls(), 1);
    assert_eq!(decoded.substitute_calls(), 1);
    assert_eq!(registry.lookups(), 0);
}

#[test]
fn online_resolution_ignores_embedded_copy() {
    let decoded = Arc::new(StubCluster::named(CLUSTER).substituting_to("hdfs://embedded/out"));
    let template = Arc::new(StubCluster::named("").decoding_to(Arc::clone(&decoded)));
    let registered = Arc::new(StubCluster::named(CLUSTER).substituting_to("hdfs://registry/out"));
    let registry = StubRegistry::empty()
        .with_template(Arc::clone(&template))
        .with_cluster(registered);

    let reference =
        SourceReference::by_name(CLUSTER, "/out").with_embedded_definition(Some(EMBEDDED.to_string()));

    assert_eq!(
        resolve(&reference, &registry, &online()).unwrap(),
        Some("hdfs://registry/out".to_string())
    );
    assert_eq!(template.decode_calls(), 0);
    assert_eq!(decoded.substitute_calls(), 0);
}

#[test]
fn online_resolution_with_only_embedded_copy_uses_raw_url() {
    let template = Arc::new(StubCluster::named(""));
    let registry = StubRegistry::empty().with_template(Arc::clone(&template));
    let reference =
        SourceReference::by_name(CLUSTER, "/out").with_embedded_definition(Some(EMBEDDED.to_string()));

    assert_eq!(
        resolve(&reference, &registry, &online()).unwrap(),
        Some("/out".to_string())
    );
    assert_eq!(template.decode_calls(), 0);
}

#[test]
fn malformed_embedded_copy_is_an_error_offline() {
    let registry = StubRegistry::empty();
    let reference = SourceReference::by_name(CLUSTER, "/out")
        .with_embedded_definition(Some("<Other/>".to_string()));

    let err = resolve(&reference, &registry, &ResolutionContext::offline()).unwrap_err();
    assert!(err.to_string().contains("NamedCluster"), "{}", err);
}

proptest! {
    #[test]
    fn unregistered_cluster_resolves_to_raw_url(
        name in "[A-Za-z][A-Za-z0-9_-]{0,12}",
        raw in "[a-z]{0,5}(://)?[A-Za-z0-9/._-]{0,24}",
    ) {
        let registry = StubRegistry::empty();
        let reference = SourceReference::by_name(name, raw.clone());
        prop_assert_eq!(resolve(&reference, &registry, &online()).unwrap(), Some(raw));
    }

    #[test]
    fn registered_cluster_decides_the_url(raw in "[A-Za-z0-9/._-]{1,24}") {
        let cluster = Arc::new(StubCluster::named(CLUSTER));
        let registry = StubRegistry::empty().with_cluster(Arc::clone(&cluster));
        let reference = SourceReference::by_name(CLUSTER, raw.clone());

        prop_assert_eq!(
            resolve(&reference, &registry, &online()).unwrap(),
            Some(format!("stub:{}", raw))
        );
        prop_assert_eq!(cluster.substitute_calls(), 1);
    }
}
