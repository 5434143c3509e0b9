//! File output step configuration.

use crate::error::{Result, StepError};
use crate::field::{parse_int, OutputField};
use crate::resolve::resolve;
use sinkpath_cluster::ClusterRegistry;
use sinkpath_protocol::xml::{add_tag_display, add_tag_flag, add_tag_value};
use sinkpath_protocol::{
    ObjectId, ResolutionContext, SourceReference, StepAttributeStore, XmlNode, FILE_TAG,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Line ending written after each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Dos,
    Unix,
    Cr,
    None,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Dos => "DOS",
            FileFormat::Unix => "UNIX",
            FileFormat::Cr => "CR",
            FileFormat::None => "None",
        }
    }

    pub fn line_ending(&self) -> &'static str {
        match self {
            FileFormat::Dos => "\r\n",
            FileFormat::Unix => "\n",
            FileFormat::Cr => "\r",
            FileFormat::None => "",
        }
    }
}

impl FromStr for FileFormat {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DOS" => Ok(FileFormat::Dos),
            "UNIX" => Ok(FileFormat::Unix),
            "CR" => Ok(FileFormat::Cr),
            "NONE" => Ok(FileFormat::None),
            _ => Err(StepError::invalid_value("format", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Zip,
    GZip,
    Snappy,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Zip => "Zip",
            Compression::GZip => "GZip",
            Compression::Snappy => "Hadoop-snappy",
        }
    }
}

impl FromStr for Compression {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "zip" => Ok(Compression::Zip),
            "gzip" => Ok(Compression::GZip),
            "hadoop-snappy" | "snappy" => Ok(Compression::Snappy),
            _ => Err(StepError::invalid_value("compression", s)),
        }
    }
}

/// Configuration of a step writing delimited text files to cluster storage.
///
/// The output location lives in the step's [`SourceReference`]; everything
/// that reads or writes it goes through the persistence adapter in
/// [`crate::source`].
#[derive(Clone)]
pub struct FileOutputMeta {
    pub(crate) registry: Arc<dyn ClusterRegistry>,
    pub(crate) source: SourceReference,

    pub separator: String,
    pub enclosure: String,
    pub enclosure_forced: bool,
    pub header: bool,
    pub footer: bool,
    pub file_format: FileFormat,
    pub compression: Compression,
    pub encoding: Option<String>,
    pub create_parent_folder: bool,

    pub extension: Option<String>,
    pub append: bool,
    /// Start a new file every N rows; 0 disables splitting.
    pub split_every: i32,
    pub part_number_in_name: bool,
    pub date_in_name: bool,
    pub time_in_name: bool,
    pub add_to_result: bool,

    pub output_fields: Vec<OutputField>,
}

impl fmt::Debug for FileOutputMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOutputMeta")
            .field("source", &self.source)
            .field("separator", &self.separator)
            .field("file_format", &self.file_format)
            .field("compression", &self.compression)
            .field("output_fields", &self.output_fields)
            .finish_non_exhaustive()
    }
}

impl FileOutputMeta {
    pub fn new(registry: Arc<dyn ClusterRegistry>) -> Self {
        Self {
            registry,
            source: SourceReference::new(),
            separator: ";".to_string(),
            enclosure: "\"".to_string(),
            enclosure_forced: false,
            header: true,
            footer: false,
            file_format: FileFormat::Dos,
            compression: Compression::None,
            encoding: None,
            create_parent_folder: true,
            extension: Some("txt".to_string()),
            append: false,
            split_every: 0,
            part_number_in_name: false,
            date_in_name: false,
            time_in_name: false,
            add_to_result: true,
            output_fields: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<dyn ClusterRegistry> {
        &self.registry
    }

    pub fn source(&self) -> &SourceReference {
        &self.source
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.raw_url()
    }

    pub fn set_file_name(&mut self, file_name: Option<String>) {
        self.source.set_raw_url(file_name);
    }

    pub fn source_configuration_name(&self) -> Option<&str> {
        self.source.configuration_name()
    }

    pub fn set_source_configuration_name(&mut self, name: Option<String>) {
        self.source.set_configuration_name(name);
    }

    pub fn embedded_cluster_xml(&self) -> Option<&str> {
        self.source.embedded_definition_xml()
    }

    pub fn set_output_fields(&mut self, fields: Vec<OutputField>) {
        self.output_fields = fields;
    }

    /// Resolve `url` with this step's cluster settings.
    pub fn processed_url(&self, ctx: &ResolutionContext, url: Option<&str>) -> Result<Option<String>> {
        let reference = self.source.clone().with_raw_url(url.map(str::to_string));
        resolve(&reference, self.registry.as_ref(), ctx)
    }

    /// Concrete URL this step writes to.
    pub fn output_url(&self, ctx: &ResolutionContext) -> Result<Option<String>> {
        resolve(&self.source, self.registry.as_ref(), ctx)
    }

    // ------------------------------------------------------------------
    // XML shape
    // ------------------------------------------------------------------

    /// Serialize the step body. The result is a sequence of sibling
    /// elements meant to be wrapped in the caller's step node.
    pub fn get_xml(&self, ctx: &ResolutionContext) -> Result<String> {
        let saved = self.save_source(ctx)?;

        let mut xml = String::with_capacity(1024);
        let mut line = |s: String| {
            xml.push_str("    ");
            xml.push_str(&s);
        };
        line(add_tag_value("separator", Some(self.separator.as_str())));
        line(add_tag_value("enclosure", Some(self.enclosure.as_str())));
        line(add_tag_flag("enclosure_forced", self.enclosure_forced));
        line(add_tag_flag("header", self.header));
        line(add_tag_flag("footer", self.footer));
        line(add_tag_value("format", Some(self.file_format.as_str())));
        line(add_tag_value("compression", Some(self.compression.as_str())));
        line(add_tag_value("encoding", self.encoding.as_deref()));
        line(add_tag_flag("create_parent_folder", self.create_parent_folder));

        xml.push_str("    <file>\n");
        xml.push_str(&saved.file_entries);
        let mut file_line = |s: String| {
            xml.push_str("      ");
            xml.push_str(&s);
        };
        file_line(add_tag_value("extension", self.extension.as_deref()));
        file_line(add_tag_flag("append", self.append));
        file_line(add_tag_flag("haspartno", self.part_number_in_name));
        file_line(add_tag_flag("add_date", self.date_in_name));
        file_line(add_tag_flag("add_time", self.time_in_name));
        file_line(add_tag_flag("add_to_result_filenames", self.add_to_result));
        file_line(add_tag_display("splitevery", self.split_every));
        xml.push_str("    </file>\n");

        xml.push_str("    <fields>\n");
        for field in &self.output_fields {
            xml.push_str(&field.to_xml());
        }
        xml.push_str("    </fields>\n");

        if let Some(embedded) = saved.embedded_fragment {
            xml.push_str(&embedded);
            if !embedded.ends_with('\n') {
                xml.push('\n');
            }
        }

        Ok(xml)
    }

    /// Populate this step from its serialized node.
    pub fn read_data(&mut self, step_node: &XmlNode) -> Result<()> {
        self.source = Self::load_source(step_node)?;

        if let Some(separator) = step_node.sub_node("separator") {
            self.separator = separator.text().to_string();
        }
        if let Some(enclosure) = step_node.sub_node("enclosure") {
            self.enclosure = enclosure.text().to_string();
        }
        self.enclosure_forced = step_node.tag_flag("enclosure_forced");
        self.header = step_node.tag_flag("header");
        self.footer = step_node.tag_flag("footer");
        self.file_format = match step_node.tag_value("format") {
            Some(v) => v.parse()?,
            None => FileFormat::default(),
        };
        self.compression = match step_node.tag_value("compression") {
            Some(v) => v.parse()?,
            None => Compression::default(),
        };
        self.encoding = step_node.tag_value("encoding").map(str::to_string);
        self.create_parent_folder = step_node.tag_flag("create_parent_folder");

        if let Some(file) = step_node.sub_node(FILE_TAG) {
            self.extension = file.tag_value("extension").map(str::to_string);
            self.append = file.tag_flag("append");
            self.part_number_in_name = file.tag_flag("haspartno");
            self.date_in_name = file.tag_flag("add_date");
            self.time_in_name = file.tag_flag("add_time");
            self.add_to_result = file.tag_flag("add_to_result_filenames");
            self.split_every = parse_int("splitevery", file.tag_value("splitevery"))?.max(0);
        }

        self.output_fields = match step_node.sub_node("fields") {
            Some(fields) => fields
                .sub_nodes("field")
                .map(OutputField::from_xml)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(())
    }

    // ------------------------------------------------------------------
    // Attribute shape
    // ------------------------------------------------------------------

    pub fn save_rep(
        &self,
        store: &mut dyn StepAttributeStore,
        id_transformation: &ObjectId,
        id_step: &ObjectId,
    ) -> Result<()> {
        store.clear_step_attributes(id_step)?;
        let mut put = |key: &str, value: Option<&str>| {
            store.save_step_attribute(id_transformation, id_step, key, value)
        };
        put("separator", Some(self.separator.as_str()))?;
        put("enclosure", Some(self.enclosure.as_str()))?;
        put("enclosure_forced", Some(flag(self.enclosure_forced)))?;
        put("header", Some(flag(self.header)))?;
        put("footer", Some(flag(self.footer)))?;
        put("format", Some(self.file_format.as_str()))?;
        put("compression", Some(self.compression.as_str()))?;
        put("encoding", self.encoding.as_deref())?;
        put("create_parent_folder", Some(flag(self.create_parent_folder)))?;
        put("file_extension", self.extension.as_deref())?;
        put("file_append", Some(flag(self.append)))?;
        put("file_add_partnr", Some(flag(self.part_number_in_name)))?;
        put("file_add_date", Some(flag(self.date_in_name)))?;
        put("file_add_time", Some(flag(self.time_in_name)))?;
        put("add_to_result_filenames", Some(flag(self.add_to_result)))?;
        put("file_split", Some(self.split_every.to_string().as_str()))?;

        self.save_source_rep(store, id_transformation, id_step)?;

        for (nr, field) in self.output_fields.iter().enumerate() {
            let mut put_at = |key: &str, value: Option<&str>| {
                store.save_step_attribute_at(id_transformation, id_step, nr, key, value)
            };
            put_at("field_name", Some(field.name.as_str()))?;
            put_at("field_type", Some(field.field_type.as_str()))?;
            put_at("field_format", field.format.as_deref())?;
            put_at("field_nullif", field.null_string.as_deref())?;
            put_at("field_trim_type", Some(field.trim_type.as_str()))?;
            put_at("field_length", Some(field.length.to_string().as_str()))?;
            put_at("field_precision", Some(field.precision.to_string().as_str()))?;
        }
        Ok(())
    }

    /// Populate this step from repository attributes. The stored file name
    /// is replaced by the freshly resolved URL.
    pub fn read_rep(
        &mut self,
        store: &dyn StepAttributeStore,
        id_step: &ObjectId,
        ctx: &ResolutionContext,
    ) -> Result<()> {
        let resolved = self.load_source_rep(store, id_step, ctx)?;
        if resolved.as_deref() != self.file_name() {
            info!(
                stored = ?self.file_name(),
                resolved = ?resolved,
                "Refreshed output URL from cluster definition"
            );
        }
        self.set_file_name(resolved);

        let get = |key: &str| store.step_attribute_string(id_step, key);
        if let Some(separator) = get("separator")? {
            self.separator = separator;
        }
        if let Some(enclosure) = get("enclosure")? {
            self.enclosure = enclosure;
        }
        self.enclosure_forced = store.step_attribute_bool(id_step, "enclosure_forced")?;
        self.header = store.step_attribute_bool(id_step, "header")?;
        self.footer = store.step_attribute_bool(id_step, "footer")?;
        self.file_format = match get("format")? {
            Some(v) => v.parse()?,
            None => FileFormat::default(),
        };
        self.compression = match get("compression")? {
            Some(v) => v.parse()?,
            None => Compression::default(),
        };
        self.encoding = get("encoding")?;
        self.create_parent_folder = store.step_attribute_bool(id_step, "create_parent_folder")?;
        self.extension = get("file_extension")?;
        self.append = store.step_attribute_bool(id_step, "file_append")?;
        self.part_number_in_name = store.step_attribute_bool(id_step, "file_add_partnr")?;
        self.date_in_name = store.step_attribute_bool(id_step, "file_add_date")?;
        self.time_in_name = store.step_attribute_bool(id_step, "file_add_time")?;
        self.add_to_result = store.step_attribute_bool(id_step, "add_to_result_filenames")?;
        self.split_every = store
            .step_attribute_int_at(id_step, 0, "file_split")?
            .unwrap_or(0)
            .clamp(0, i32::MAX as i64) as i32;

        let count = store.count_step_attributes(id_step, "field_name")?;
        let mut fields = Vec::with_capacity(count);
        for nr in 0..count {
            let get_at = |key: &str| store.step_attribute_string_at(id_step, nr, key);
            let name = get_at("field_name")?.unwrap_or_default();
            let mut field = OutputField::new(
                name,
                match get_at("field_type")? {
                    Some(t) => t.parse()?,
                    None => Default::default(),
                },
            );
            field.format = get_at("field_format")?;
            field.null_string = get_at("field_nullif")?;
            if let Some(trim) = get_at("field_trim_type")? {
                field.trim_type = trim.parse()?;
            }
            field.length = attribute_i32(store, id_step, nr, "field_length")?;
            field.precision = attribute_i32(store, id_step, nr, "field_precision")?;
            fields.push(field);
        }
        self.output_fields = fields;

        Ok(())
    }
}

/// Indexed integer attribute; absent means -1.
fn attribute_i32(
    store: &dyn StepAttributeStore,
    id_step: &ObjectId,
    nr: usize,
    key: &str,
) -> Result<i32> {
    match store.step_attribute_int_at(id_step, nr, key)? {
        None => Ok(-1),
        Some(v) => i32::try_from(v).map_err(|_| StepError::invalid_value(key, v.to_string())),
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}
