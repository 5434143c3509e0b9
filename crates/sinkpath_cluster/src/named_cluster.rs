use crate::definition::ClusterDefinition;
use crate::error::{ClusterError, Result};
use crate::substitution::{self, apply_cluster_url, cluster_base_url};
use serde::{Deserialize, Serialize};
use sinkpath_protocol::xml::{add_tag_value, close_tag, open_tag};
use sinkpath_protocol::{ResolutionContext, VariableSpace, XmlNode};
use std::sync::Arc;
use tracing::debug;

const MAPR_SCHEME: &str = "maprfs";

/// A registered Hadoop-style cluster.
///
/// Every connection field is text so it may hold `${VAR}` tokens; they are
/// expanded from the resolution context's variables at substitution time.
/// Fields missing from a registry file take their [`template`](Self::template)
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedCluster {
    pub name: String,
    pub storage_scheme: String,
    pub hdfs_host: String,
    pub hdfs_port: String,
    pub hdfs_username: String,
    pub hdfs_password: String,
    pub job_tracker_host: String,
    pub job_tracker_port: String,
    pub zoo_keeper_host: String,
    pub zoo_keeper_port: String,
    pub oozie_url: String,
    pub kafka_bootstrap_servers: String,
    pub shim_identifier: String,
    pub mapr: bool,
}

fn default_storage_scheme() -> String {
    "hdfs".to_string()
}

impl Default for NamedCluster {
    fn default() -> Self {
        Self::template()
    }
}

impl NamedCluster {
    /// The blank definition new clusters (and decoded embeds) start from.
    pub fn template() -> Self {
        Self {
            name: String::new(),
            storage_scheme: default_storage_scheme(),
            hdfs_host: String::new(),
            hdfs_port: "8020".to_string(),
            hdfs_username: String::new(),
            hdfs_password: String::new(),
            job_tracker_host: String::new(),
            job_tracker_port: "8032".to_string(),
            zoo_keeper_host: String::new(),
            zoo_keeper_port: "2181".to_string(),
            oozie_url: String::new(),
            kafka_bootstrap_servers: String::new(),
            shim_identifier: String::new(),
            mapr: false,
        }
    }

    /// Copy of `self` renamed to `name`.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_hdfs(mut self, host: impl Into<String>, port: impl Into<String>) -> Self {
        self.hdfs_host = host.into();
        self.hdfs_port = port.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.hdfs_username = username.into();
        self.hdfs_password = password.into();
        self
    }

    pub fn with_storage_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.storage_scheme = scheme.into();
        self
    }

    pub fn with_mapr(mut self, mapr: bool) -> Self {
        self.mapr = mapr;
        self
    }

    /// Field name / value pairs in embed order.
    fn fields(&self) -> [(&'static str, String); 14] {
        [
            ("name", self.name.clone()),
            ("storage_scheme", self.storage_scheme.clone()),
            ("hdfs_host", self.hdfs_host.clone()),
            ("hdfs_port", self.hdfs_port.clone()),
            ("hdfs_username", self.hdfs_username.clone()),
            ("hdfs_password", self.hdfs_password.clone()),
            ("job_tracker_host", self.job_tracker_host.clone()),
            ("job_tracker_port", self.job_tracker_port.clone()),
            ("zoo_keeper_host", self.zoo_keeper_host.clone()),
            ("zoo_keeper_port", self.zoo_keeper_port.clone()),
            ("oozie_url", self.oozie_url.clone()),
            ("kafka_bootstrap_servers", self.kafka_bootstrap_servers.clone()),
            ("shim_identifier", self.shim_identifier.clone()),
            ("is_mapr", if self.mapr { "Y" } else { "N" }.to_string()),
        ]
    }

    /// Overwrite one field from an embedded element. Returns false for
    /// elements this definition does not know.
    fn apply_field(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "name" => &mut self.name,
            "storage_scheme" => &mut self.storage_scheme,
            "hdfs_host" => &mut self.hdfs_host,
            "hdfs_port" => &mut self.hdfs_port,
            "hdfs_username" => &mut self.hdfs_username,
            "hdfs_password" => &mut self.hdfs_password,
            "job_tracker_host" => &mut self.job_tracker_host,
            "job_tracker_port" => &mut self.job_tracker_port,
            "zoo_keeper_host" => &mut self.zoo_keeper_host,
            "zoo_keeper_port" => &mut self.zoo_keeper_port,
            "oozie_url" => &mut self.oozie_url,
            "kafka_bootstrap_servers" => &mut self.kafka_bootstrap_servers,
            "shim_identifier" => &mut self.shim_identifier,
            "is_mapr" => {
                self.mapr = value.eq_ignore_ascii_case("y");
                return true;
            }
            _ => return false,
        };
        *slot = value.to_string();
        true
    }

    /// Embedded XML for this cluster under `tag`. Empty fields are written as
    /// empty elements so they override the template on decode.
    pub fn to_embedded_xml(&self, tag: &str) -> String {
        let mut xml = String::new();
        xml.push_str(&open_tag(tag));
        xml.push('\n');
        for (key, value) in self.fields() {
            xml.push_str("  ");
            xml.push_str(&add_tag_value(key, Some(value.as_str())));
        }
        xml.push_str(&close_tag(tag));
        xml.push('\n');
        xml
    }

    /// Decode an embedded element on top of `self` (the template).
    pub fn apply_embedded(&self, node: &XmlNode) -> Self {
        let mut cluster = self.clone();
        for child in node.children() {
            if !cluster.apply_field(child.tag(), child.text()) {
                debug!(element = child.tag(), "Ignoring unknown embedded cluster element");
            }
        }
        cluster
    }

    fn expand(&self, field: &str, value: &str, vars: &VariableSpace) -> Result<String> {
        vars.expand_strict(value)
            .map(|v| v.trim().to_string())
            .map_err(|variable| ClusterError::UnresolvedVariable {
                field: field.to_string(),
                variable,
            })
    }

    /// Address of this cluster's storage, or `None` when no host is set.
    pub fn cluster_url(&self, vars: &VariableSpace) -> Result<Option<String>> {
        let host = self.expand("hdfs_host", &self.hdfs_host, vars)?;
        if host.is_empty() {
            return Ok(None);
        }
        let scheme = self.expand("storage_scheme", &self.storage_scheme, vars)?;
        let port = self.expand("hdfs_port", &self.hdfs_port, vars)?;
        let username = self.expand("hdfs_username", &self.hdfs_username, vars)?;
        let password = self.expand("hdfs_password", &self.hdfs_password, vars)?;
        cluster_base_url(&scheme, &host, Some(port.as_str()), Some(username.as_str()), Some(password.as_str())).map(Some)
    }

    fn substitute_mapr(&self, raw_url: &str) -> String {
        let path = match substitution::split_url(raw_url) {
            None => raw_url,
            Some((scheme, _, _)) if scheme.eq_ignore_ascii_case(MAPR_SCHEME) => {
                return raw_url.to_string()
            }
            Some((scheme, _, path))
                if scheme.eq_ignore_ascii_case(substitution::NAMED_CLUSTER_SCHEME)
                    || scheme.eq_ignore_ascii_case(&self.storage_scheme) =>
            {
                path
            }
            Some(_) => return raw_url.to_string(),
        };
        if path.starts_with('/') {
            format!("{}://{}", MAPR_SCHEME, path)
        } else {
            format!("{}:///{}", MAPR_SCHEME, path)
        }
    }
}

impl ClusterDefinition for NamedCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn substitute(&self, raw_url: &str, ctx: &ResolutionContext) -> Result<String> {
        if self.mapr {
            return Ok(self.substitute_mapr(raw_url));
        }

        let vars = ctx.variables();
        let Some(base) = self.cluster_url(vars)? else {
            debug!(cluster = %self.name, "Cluster has no storage host; leaving URL unchanged");
            return Ok(raw_url.to_string());
        };
        let scheme = self.expand("storage_scheme", &self.storage_scheme, vars)?;

        let url = apply_cluster_url(&base, &scheme, raw_url);
        substitution::validate(&url)?;
        debug!(cluster = %self.name, raw = raw_url, resolved = %url, "Substituted cluster URL");
        Ok(url)
    }

    fn to_xml_for_embed(&self, tag: &str) -> Result<String> {
        Ok(self.to_embedded_xml(tag))
    }

    fn from_xml_for_embed(&self, fragment: &str) -> Result<Arc<dyn ClusterDefinition>> {
        let node = XmlNode::parse(fragment)?;
        Ok(Arc::new(self.apply_embedded(&node)))
    }
}
