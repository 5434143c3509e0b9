//! Output field definitions.

use crate::error::{Result, StepError};
use sinkpath_protocol::xml::{add_tag_display, add_tag_value};
use sinkpath_protocol::XmlNode;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    String,
    Number,
    Integer,
    BigNumber,
    Date,
    Timestamp,
    Boolean,
    Binary,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Integer => "Integer",
            FieldType::BigNumber => "BigNumber",
            FieldType::Date => "Date",
            FieldType::Timestamp => "Timestamp",
            FieldType::Boolean => "Boolean",
            FieldType::Binary => "Binary",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "integer" => Ok(FieldType::Integer),
            "bignumber" => Ok(FieldType::BigNumber),
            "date" => Ok(FieldType::Date),
            "timestamp" => Ok(FieldType::Timestamp),
            "boolean" => Ok(FieldType::Boolean),
            "binary" => Ok(FieldType::Binary),
            _ => Err(StepError::invalid_value("type", s)),
        }
    }
}

/// Whitespace trimming applied to a value before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrimType {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl TrimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimType::None => "none",
            TrimType::Left => "left",
            TrimType::Right => "right",
            TrimType::Both => "both",
        }
    }
}

impl FromStr for TrimType {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(TrimType::None),
            "left" => Ok(TrimType::Left),
            "right" => Ok(TrimType::Right),
            "both" => Ok(TrimType::Both),
            _ => Err(StepError::invalid_value("trim_type", s)),
        }
    }
}

/// One column written by the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputField {
    pub name: String,
    pub field_type: FieldType,
    pub format: Option<String>,
    /// `-1` means unspecified.
    pub length: i32,
    pub precision: i32,
    pub trim_type: TrimType,
    pub null_string: Option<String>,
}

impl OutputField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            length: -1,
            precision: -1,
            trim_type: TrimType::None,
            null_string: None,
        }
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from("      <field>\n");
        for line in [
            add_tag_value("name", Some(self.name.as_str())),
            add_tag_value("type", Some(self.field_type.as_str())),
            add_tag_value("format", self.format.as_deref()),
            add_tag_value("nullif", self.null_string.as_deref()),
            add_tag_value("trim_type", Some(self.trim_type.as_str())),
            add_tag_display("length", self.length),
            add_tag_display("precision", self.precision),
        ] {
            xml.push_str("        ");
            xml.push_str(&line);
        }
        xml.push_str("      </field>\n");
        xml
    }

    pub(crate) fn from_xml(node: &XmlNode) -> Result<Self> {
        let name = node
            .tag_value("name")
            .ok_or_else(|| StepError::invalid_value("field/name", ""))?;
        let field_type = match node.tag_value("type") {
            Some(t) => t.parse()?,
            None => FieldType::default(),
        };
        let trim_type = match node.tag_value("trim_type") {
            Some(t) => t.parse()?,
            None => TrimType::default(),
        };
        Ok(Self {
            name: name.to_string(),
            field_type,
            format: node.tag_value("format").map(str::to_string),
            length: parse_int("length", node.tag_value("length"))?,
            precision: parse_int("precision", node.tag_value("precision"))?,
            trim_type,
            null_string: node.tag_value("nullif").map(str::to_string),
        })
    }
}

pub(crate) fn parse_int(key: &str, value: Option<&str>) -> Result<i32> {
    match value {
        None => Ok(-1),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| StepError::invalid_value(key, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_xml_round_trips() {
        let mut field = OutputField::new("amount", FieldType::Number);
        field.format = Some("#.##".to_string());
        field.length = 10;
        field.precision = 2;
        field.trim_type = TrimType::Both;

        let node = XmlNode::parse(&field.to_xml()).unwrap();
        assert_eq!(OutputField::from_xml(&node).unwrap(), field);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let node = XmlNode::parse("<field><name>a</name><type>Blob</type></field>").unwrap();
        assert!(matches!(
            OutputField::from_xml(&node),
            Err(StepError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_numbers_default_to_unspecified() {
        let node = XmlNode::parse("<field><name>a</name></field>").unwrap();
        let field = OutputField::from_xml(&node).unwrap();
        assert_eq!(field.length, -1);
        assert_eq!(field.precision, -1);
        assert_eq!(field.field_type, FieldType::String);
    }
}
