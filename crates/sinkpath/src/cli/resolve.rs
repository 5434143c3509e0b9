//! `sinkpath resolve`: print where a step writes.

use super::context::CliContext;
use anyhow::{Context, Result};
use sinkpath_protocol::SourceReference;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct ResolveArgs {
    pub step: PathBuf,
    pub offline: bool,
    pub vars: Vec<(String, String)>,
    pub json: bool,
}

/// Printed when the step has no output URL configured.
pub const NO_URL: &str = "<none>";

/// Where a step writes, with the reference it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    pub source: SourceReference,
    pub registry_available: bool,
    pub url: Option<String>,
}

impl ResolvedStep {
    pub fn to_json(&self, step: &Path) -> serde_json::Value {
        serde_json::json!({
            "step": step.display().to_string(),
            "registry_available": self.registry_available,
            "source": self.source,
            "url": self.url,
        })
    }
}

pub fn run(ctx: &CliContext, args: ResolveArgs) -> Result<()> {
    let resolved = resolve_step(ctx, &args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved.to_json(&args.step))?);
    } else {
        println!("{}", resolved.url.as_deref().unwrap_or(NO_URL));
    }
    Ok(())
}

pub fn resolve_step(ctx: &CliContext, args: &ResolveArgs) -> Result<ResolvedStep> {
    let meta = ctx.load_step(&args.step)?;
    let resolution = ctx.resolution_context(args.offline, &args.vars);
    let url = meta
        .output_url(&resolution)
        .with_context(|| format!("Failed to resolve output of {}", args.step.display()))?;

    info!(
        step = %args.step.display(),
        registry_available = resolution.registry_available(),
        url = ?url,
        "Resolved output location"
    );
    Ok(ResolvedStep {
        source: meta.source().clone(),
        registry_available: resolution.registry_available(),
        url,
    })
}
