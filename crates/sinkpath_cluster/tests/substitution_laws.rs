//! Behavioural properties of cluster URL substitution.

use proptest::prelude::*;
use sinkpath_cluster::{substitute, ClusterDefinition, NamedCluster};
use sinkpath_protocol::ResolutionContext;

fn cluster() -> NamedCluster {
    NamedCluster::template()
        .derive("prod")
        .with_hdfs("nn1.example.com", "8020")
}

proptest! {
    #[test]
    fn substitution_is_idempotent(path in "(/[a-z0-9_]{1,8}){1,4}") {
        let ctx = ResolutionContext::online();
        let c = cluster();
        let once = substitute(&c, &path, &ctx).unwrap();
        let twice = substitute(&c, &once, &ctx).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.starts_with("hdfs://nn1.example.com:8020/"));
        prop_assert!(once.ends_with(&path));
    }

    #[test]
    fn named_cluster_urls_resolve_to_cluster(path in "(/[a-z0-9_]{1,8}){1,4}") {
        let ctx = ResolutionContext::online();
        let url = cluster().substitute(&format!("hc://prod{}", path), &ctx).unwrap();
        prop_assert_eq!(url, format!("hdfs://nn1.example.com:8020{}", path));
    }
}

#[test]
fn root_maps_to_cluster_address() {
    let ctx = ResolutionContext::online();
    assert_eq!(
        cluster().substitute("/", &ctx).unwrap(),
        "hdfs://nn1.example.com:8020"
    );
}

#[test]
fn storage_scheme_controls_matching() {
    let ctx = ResolutionContext::online();
    let wasb = cluster().with_storage_scheme("wasb");
    assert_eq!(
        wasb.substitute("wasb://old/out", &ctx).unwrap(),
        "wasb://nn1.example.com:8020/out"
    );
    assert_eq!(
        wasb.substitute("hdfs://old/out", &ctx).unwrap(),
        "hdfs://old/out"
    );
}
