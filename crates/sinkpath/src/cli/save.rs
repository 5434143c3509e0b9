//! `sinkpath save`: re-serialize a step through the persistence adapter.

use super::context::CliContext;
use anyhow::{Context, Result};
use sinkpath_protocol::{XmlNode, NAMED_CLUSTER_TAG};
use sinkpath_step::load_step_resource;
use sinkpath_step::resources::STEP_ENTRY_TAG;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug)]
pub struct SaveArgs {
    pub step: PathBuf,
    pub in_place: bool,
}

pub fn run(ctx: &CliContext, args: SaveArgs) -> Result<()> {
    let xml = render_step(ctx, &args)?;
    if args.in_place {
        std::fs::write(&args.step, &xml)
            .with_context(|| format!("Failed to write {}", args.step.display()))?;
        info!(step = %args.step.display(), "Saved step");
    } else {
        print!("{}", xml);
    }
    Ok(())
}

/// The step document as it would be saved now.
///
/// Entry children the file output settings do not cover (step name, type,
/// layout and the like) are carried over from the original file.
pub fn render_step(ctx: &CliContext, args: &SaveArgs) -> Result<String> {
    let meta = ctx.load_step(&args.step)?;
    let original = load_step_resource(&args.step)
        .with_context(|| format!("Failed to load step {}", args.step.display()))?;
    let body = meta
        .get_xml(&ctx.resolution_context(false, &[]))
        .with_context(|| format!("Failed to serialize {}", args.step.display()))?;
    let regenerated = XmlNode::parse(&format!(
        "<{tag}>{body}</{tag}>",
        tag = STEP_ENTRY_TAG,
        body = body
    ))
    .context("Serialized step is not well-formed")?;

    let mut document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<{tag}>\n",
        tag = STEP_ENTRY_TAG
    );
    for child in original.children() {
        if child.tag() != NAMED_CLUSTER_TAG && regenerated.sub_node(child.tag()).is_none() {
            debug!(element = child.tag(), "Keeping step element");
            document.push_str("    ");
            document.push_str(&child.to_xml());
            document.push('\n');
        }
    }
    document.push_str(&body);
    document.push_str(&format!("</{}>\n", STEP_ENTRY_TAG));
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn save_refreshes_embedded_cluster() {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("clusters.toml");
        fs::write(
            &registry_path,
            "[[cluster]]\nname = \"prod\"\nhdfs_host = \"nn-new\"\n",
        )
        .unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            format!("registry_path = {:?}\n", registry_path.display().to_string()),
        )
        .unwrap();
        let step = dir.path().join("step.xml");
        fs::write(
            &step,
            "<entry><file><name>/out</name>\
             <source_configuration_name>prod</source_configuration_name></file>\
             <NamedCluster><name>prod</name><hdfs_host>nn-old</hdfs_host></NamedCluster></entry>",
        )
        .unwrap();

        let ctx = CliContext::load(Some(&config_path)).unwrap();
        let args = SaveArgs {
            step: step.clone(),
            in_place: true,
        };
        run(&ctx, args).unwrap();

        let saved = XmlNode::parse(&fs::read_to_string(&step).unwrap()).unwrap();
        let cluster = saved.sub_node("NamedCluster").unwrap();
        assert_eq!(cluster.tag_value("hdfs_host"), Some("nn-new"));
        assert_eq!(saved.count_nodes("NamedCluster"), 1);
        assert_eq!(
            saved.sub_node("file").unwrap().tag_value("source_configuration_name"),
            Some("prod")
        );
    }

    #[test]
    fn save_keeps_step_elements_it_does_not_manage() {
        let dir = TempDir::new().unwrap();
        let step = dir.path().join("step.xml");
        fs::write(
            &step,
            "<entry>\n  <name>My Output</name>\n  <type>TextFileOutput</type>\n  \
             <separator>,</separator>\n  <file><name>/out</name></file>\n  \
             <GUI><xloc>160</xloc><yloc>96</yloc></GUI>\n</entry>\n",
        )
        .unwrap();

        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            format!(
                "registry_path = {:?}\n",
                dir.path().join("clusters.toml").display().to_string()
            ),
        )
        .unwrap();

        let ctx = CliContext::load(Some(&config_path)).unwrap();
        let args = SaveArgs {
            step: step.clone(),
            in_place: true,
        };
        run(&ctx, args).unwrap();

        let saved = XmlNode::parse(&fs::read_to_string(&step).unwrap()).unwrap();
        assert_eq!(saved.tag_value("name"), Some("My Output"));
        assert_eq!(saved.tag_value("type"), Some("TextFileOutput"));
        assert_eq!(saved.sub_node("GUI").unwrap().tag_value("xloc"), Some("160"));
        assert_eq!(saved.tag_value("separator"), Some(","));
        assert_eq!(saved.count_nodes("separator"), 1);
        assert_eq!(saved.sub_node("file").unwrap().tag_value("name"), Some("/out"));
    }
}
