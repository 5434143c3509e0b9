//! `sinkpath embed` and `sinkpath clusters`.

use super::context::CliContext;
use super::error::HelpfulError;
use anyhow::Result;
use sinkpath_cluster::{codec, ClusterLookupResult};
use sinkpath_protocol::NAMED_CLUSTER_TAG;

pub fn run_embed(ctx: &CliContext, name: &str) -> Result<()> {
    print!("{}", embedded_fragment(ctx, name)?);
    Ok(())
}

pub fn embedded_fragment(ctx: &CliContext, name: &str) -> Result<String> {
    let resolution = ctx.resolution_context(false, &[]);
    match ctx.registry.lookup_by_name(name, &resolution) {
        ClusterLookupResult::Found(definition) => {
            Ok(codec::encode(definition.as_ref(), NAMED_CLUSTER_TAG)?)
        }
        ClusterLookupResult::NotFound => {
            Err(HelpfulError::cluster_not_registered(name, &ctx.registry.names()).into())
        }
    }
}

pub fn run_list(ctx: &CliContext) -> Result<()> {
    let names = ctx.registry.names();
    if names.is_empty() {
        eprintln!("No clusters registered in {}", ctx.config.registry_path.display());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
