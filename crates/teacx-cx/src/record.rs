//! Structured-record projection of CX files.
//!
//! The record is a field-for-field copy of the decoded file and is the
//! preferred lossless textual form. Every field is optional on the Rust side so
//! that a record read from JSON can report exactly which key is missing.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use teacx_common::{Digest, ResourceHeader};

use crate::{Attribute, CxFile, CxHeader, Error, Node, NodeType, Result};

/// Stack left before a nested (de)serialization step grows the stack.
const RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated while (de)serializing deep records.
const STACK_SIZE: usize = 2 * 1024 * 1024;

/// Top-level record.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CxRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeRecord>,
}

/// Record form of [`CxHeader`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_header: Option<ResourceHeaderRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
}

/// Record form of [`ResourceHeader`], digests as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceHeaderRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_digest: Option<String>,
}

/// Record form of [`Node`].
///
/// Like [`Node`], a record tree may be arbitrarily deep: it is dropped with an
/// explicit stack, and serialization grows the call stack on demand.
#[derive(Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeRecord>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_children"
    )]
    pub children: Option<Vec<NodeRecord>>,
}

/// Record form of [`Attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

fn serialize_children<S: Serializer>(
    children: &Option<Vec<NodeRecord>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, || children.serialize(serializer))
}

impl Drop for NodeRecord {
    fn drop(&mut self) {
        let mut pending = self.children.take().unwrap_or_default();
        while let Some(mut record) = pending.pop() {
            if let Some(mut children) = record.children.take() {
                pending.append(&mut children);
            }
        }
    }
}

impl fmt::Debug for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRecord")
            .field("line_number", &self.line_number)
            .field("type", &self.node_type)
            .field("content", &self.content)
            .field("attributes", &self.attributes)
            .field("children", &self.children.as_ref().map(Vec::len))
            .finish()
    }
}

fn required<'a, T>(value: &'a Option<T>, field: impl FnOnce() -> String) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::MissingField { field: field() })
}

/// Record of one node without its children.
fn record_head(node: &Node) -> Result<NodeRecord> {
    let type_name = node
        .node_type
        .name()
        .ok_or_else(|| Error::UnknownNodeType(node.node_type.to_string()))?;

    Ok(NodeRecord {
        line_number: Some(node.line_number),
        node_type: Some(type_name.to_string()),
        content: Some(node.content.clone()),
        attributes: Some(
            node.attributes
                .iter()
                .map(|a| AttributeRecord {
                    name: Some(a.name.clone()),
                    value: Some(a.value.clone()),
                })
                .collect(),
        ),
        children: Some(Vec::with_capacity(node.children.len())),
    })
}

fn node_to_record(root: &Node) -> Result<NodeRecord> {
    // Each entry pairs a node with its record built so far.
    let mut stack: Vec<(&Node, NodeRecord)> = Vec::new();
    let mut current = (root, record_head(root)?);

    loop {
        let done = current.1.children.as_ref().map_or(0, Vec::len);
        if let Some(child) = current.0.children.get(done) {
            let next = (child, record_head(child)?);
            stack.push(std::mem::replace(&mut current, next));
        } else {
            match stack.pop() {
                Some(parent) => {
                    let (_, finished) = std::mem::replace(&mut current, parent);
                    current.1.children.get_or_insert_with(Vec::new).push(finished);
                }
                None => return Ok(current.1),
            }
        }
    }
}

/// Dotted path of the record reached through the given child indices.
fn record_path(indices: &[usize]) -> String {
    let mut path = String::from("node");
    for i in indices {
        path.push_str(&format!(".children[{i}]"));
    }
    path
}

/// Node of one record without its children, plus the child records.
fn node_head<'a>(
    record: &'a NodeRecord,
    path: &dyn Fn() -> String,
) -> Result<(Node, &'a [NodeRecord])> {
    let type_name = required(&record.node_type, || format!("{}.type", path()))?;
    let node_type = NodeType::from_name(type_name)
        .ok_or_else(|| Error::UnknownNodeType(type_name.clone()))?;

    let mut node = Node::new(
        node_type,
        required(&record.content, || format!("{}.content", path()))?.clone(),
    )
    .with_line(*required(&record.line_number, || {
        format!("{}.line_number", path())
    })?);

    let attributes = required(&record.attributes, || format!("{}.attributes", path()))?;
    for (i, attr) in attributes.iter().enumerate() {
        node.attributes.push(Attribute {
            name: required(&attr.name, || format!("{}.attributes[{i}].name", path()))?.clone(),
            value: required(&attr.value, || format!("{}.attributes[{i}].value", path()))?
                .clone(),
        });
    }

    let children = required(&record.children, || format!("{}.children", path()))?;
    node.children.reserve(children.len());
    Ok((node, children))
}

fn node_from_record(root: &NodeRecord) -> Result<Node> {
    // Child indices leading to `current`, used only for error paths.
    let mut indices: Vec<usize> = Vec::new();
    let mut stack: Vec<(Node, &[NodeRecord])> = Vec::new();
    let mut current = node_head(root, &|| record_path(&indices))?;

    loop {
        let done = current.0.children.len();
        if let Some(child) = current.1.get(done) {
            indices.push(done);
            let next = node_head(child, &|| record_path(&indices))?;
            stack.push(std::mem::replace(&mut current, next));
        } else {
            match stack.pop() {
                Some(parent) => {
                    indices.pop();
                    let (finished, _) = std::mem::replace(&mut current, parent);
                    current.0.children.push(finished);
                }
                None => return Ok(current.0),
            }
        }
    }
}

fn digest_from_record(value: &Option<String>, field: &str) -> Result<Digest> {
    let text = required(value, || field.to_string())?;
    Ok(text.parse::<Digest>()?)
}

/// Project a file onto its structured record.
pub fn to_record(file: &CxFile) -> Result<CxRecord> {
    let header = &file.header;
    Ok(CxRecord {
        header: Some(HeaderRecord {
            version: Some(header.version),
            resource_header: Some(ResourceHeaderRecord {
                source_digest: Some(header.resource.source_digest.to_string()),
                definition_digest: Some(header.resource.definition_digest.to_string()),
            }),
            original_file_path: Some(header.original_file_path.clone()),
            build_number: Some(header.build_number),
            header_text: Some(header.header_text.clone()),
        }),
        node: Some(node_to_record(&file.root)?),
    })
}

/// Rebuild a file from its structured record.
pub fn from_record(record: &CxRecord) -> Result<CxFile> {
    let header = required(&record.header, || "header".to_string())?;
    let resource = required(&header.resource_header, || {
        "header.resource_header".to_string()
    })?;

    let header = CxHeader {
        version: *required(&header.version, || "header.version".to_string())?,
        resource: ResourceHeader::new(
            digest_from_record(
                &resource.source_digest,
                "header.resource_header.source_digest",
            )?,
            digest_from_record(
                &resource.definition_digest,
                "header.resource_header.definition_digest",
            )?,
        ),
        original_file_path: required(&header.original_file_path, || {
            "header.original_file_path".to_string()
        })?
        .clone(),
        build_number: *required(&header.build_number, || "header.build_number".to_string())?,
        header_text: required(&header.header_text, || "header.header_text".to_string())?
            .clone(),
    };

    let node = required(&record.node, || "node".to_string())?;
    Ok(CxFile::new(header, node_from_record(node)?))
}

/// Project a file onto a pretty-printed JSON record.
pub fn to_json_string(file: &CxFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_record(file)?)?)
}

/// Rebuild a file from a JSON record of any nesting depth.
pub fn from_json_str(text: &str) -> Result<CxFile> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let record = CxRecord::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    from_record(&record)
}
