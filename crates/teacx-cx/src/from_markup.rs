//! Parse markup text into a CX tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use teacx_common::memchr::memchr_iter;
use teacx_common::ResourceHeader;
use tracing::debug;

use crate::names::{escape_markup, unescape_name};
use crate::{Attribute, CxFile, CxHeader, Error, Node, NodeType, Result};

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        Self {
            newlines: memchr_iter(b'\n', text.as_bytes()).collect(),
        }
    }

    fn line_of(&self, offset: usize) -> u32 {
        (self.newlines.partition_point(|&n| n < offset) + 1) as u32
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Common(e.into()))
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> Error {
    Error::Xml(format!(
        "XML parse error at byte {}: {}",
        reader.error_position(),
        err
    ))
}

/// Build an element node from a start tag, restoring escaped names.
fn element(tag: &BytesStart<'_>, line_number: u32) -> Result<Node> {
    let name = unescape_name(utf8(tag.name().as_ref())?).into_owned();
    let mut node = Node::element(name).with_line(line_number);

    for attr in tag.attributes() {
        let attr = attr.map_err(|e| Error::Xml(format!("invalid attribute: {}", e)))?;
        let key = unescape_name(utf8(attr.key.as_ref())?).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("invalid attribute value: {}", e)))?
            .into_owned();
        node.attributes.push(Attribute { name: key, value });
    }

    Ok(node)
}

/// Attach a finished element to its parent, or make it the document element.
fn attach(stack: &mut [Node], document: &mut Option<Node>, node: Node) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if document.is_some() {
        return Err(Error::Xml(format!(
            "multiple root elements: unexpected <{}> on line {}",
            node.content, node.line_number
        )));
    } else {
        *document = Some(node);
    }
    Ok(())
}

/// Parse markup text into a tree rooted at a `RootVirtual` node.
///
/// Elements become `Node`s, non-blank text and CDATA become `Text` nodes and
/// comments inside the document element become `Comment` nodes. Everything
/// outside the document element (declarations, the header comment, ...) is
/// dropped. Line numbers are the 1-based source lines of each item.
pub fn parse_markup(text: &str) -> Result<Node> {
    let escaped = escape_markup(text)?;
    let lines = LineIndex::new(&escaped);
    let mut reader = Reader::from_str(&escaped);

    let mut stack: Vec<Node> = Vec::new();
    let mut document: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let start = end - e.len() - 2;
                stack.push(element(&e, lines.line_of(start))?);
            }
            Event::Empty(e) => {
                let start = end - e.len() - 3;
                let node = element(&e, lines.line_of(start))?;
                attach(&mut stack, &mut document, node)?;
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut document, node)?;
                }
            }
            Event::Text(e) => {
                let Some(parent) = stack.last_mut() else {
                    continue;
                };
                let start = end - e.len();
                let text = e.unescape().map_err(|err| xml_error(&reader, err))?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    let leading = text.len() - text.trim_start().len();
                    let line = lines.line_of(start + leading);
                    parent.children.push(Node::text(trimmed).with_line(line));
                }
            }
            Event::CData(e) => {
                let Some(parent) = stack.last_mut() else {
                    continue;
                };
                let start = end - e.len() - 12;
                let content = utf8(&e)?;
                if !content.trim().is_empty() {
                    parent
                        .children
                        .push(Node::text(content).with_line(lines.line_of(start)));
                }
            }
            Event::Comment(e) => {
                let Some(parent) = stack.last_mut() else {
                    continue;
                };
                let start = end - e.len() - 7;
                let content = utf8(&e)?;
                parent
                    .children
                    .push(Node::comment(content).with_line(lines.line_of(start)));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!(
            "unclosed element <{}> opened on line {}",
            open.content, open.line_number
        )));
    }

    let document =
        document.ok_or_else(|| Error::Xml("No root element found in XML".to_string()))?;
    debug!(
        root = %document.content,
        nodes = document.descendant_count(),
        "parsed markup"
    );

    Ok(Node::new(NodeType::RootVirtual, "").with_child(document))
}

/// Author a CX file from markup text.
///
/// The resource header is generated from `text`; the remaining header fields
/// are taken from the arguments.
pub fn from_markup(
    text: &str,
    original_path: impl Into<String>,
    header_text: impl Into<String>,
    build_number: u32,
    version: u16,
) -> Result<CxFile> {
    let root = parse_markup(text)?;
    let header = CxHeader {
        version,
        resource: ResourceHeader::generate_from(text),
        original_file_path: original_path.into(),
        build_number,
        header_text: header_text.into(),
    };
    Ok(CxFile::new(header, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{to_markup, MarkupOptions, MarkupWriter};
    use teacx_common::digest::digest;

    #[test]
    fn test_simple() {
        let root = parse_markup(r#"<Root version="1.0"/>"#).unwrap();
        assert_eq!(root.node_type, NodeType::RootVirtual);
        assert_eq!(root.children.len(), 1);

        let doc = &root.children[0];
        assert_eq!(doc.node_type, NodeType::Node);
        assert_eq!(doc.content, "Root");
        assert_eq!(doc.attr("version"), Some("1.0"));
        assert_eq!(doc.line_number, 1);
    }

    #[test]
    fn test_structure_and_lines() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- outside the document -->
<Library group="ui">
    <!-- buttons -->
    <button.ok caption="&lt;OK&gt;"
               style.name="big">
        Press &amp; hold
    </button.ok>
    <spacer/>
</Library>
"#;
        let root = parse_markup(xml).unwrap();
        assert_eq!(root.children.len(), 1);

        let library = &root.children[0];
        assert_eq!(library.content, "Library");
        assert_eq!(library.line_number, 3);
        assert_eq!(library.children.len(), 3);

        let comment = &library.children[0];
        assert_eq!(comment.node_type, NodeType::Comment);
        assert_eq!(comment.content, " buttons ");
        assert_eq!(comment.line_number, 4);

        let button = &library.children[1];
        assert_eq!(button.content, "button.ok");
        assert_eq!(button.line_number, 5);
        assert_eq!(button.attributes[0], Attribute::new("caption", "<OK>"));
        assert_eq!(button.attributes[1], Attribute::new("style.name", "big"));

        let text = &button.children[0];
        assert_eq!(text.node_type, NodeType::Text);
        assert_eq!(text.content, "Press & hold");
        assert_eq!(text.line_number, 7);

        let spacer = &library.children[2];
        assert_eq!(spacer.content, "spacer");
        assert_eq!(spacer.line_number, 9);
        assert!(spacer.children.is_empty());
    }

    #[test]
    fn test_mixed_content() {
        let root = parse_markup("<a>one<b/>two</a>").unwrap();
        let kinds: Vec<_> = root.children[0]
            .children
            .iter()
            .map(|n| (n.node_type, n.content.as_str()))
            .collect();
        assert_eq!(
            kinds,
            [
                (NodeType::Text, "one"),
                (NodeType::Node, "b"),
                (NodeType::Text, "two")
            ]
        );
    }

    #[test]
    fn test_cdata() {
        let root = parse_markup("<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(root.children[0].children[0].content, "x < y");
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_markup(""), Err(Error::Xml(_))));
    }

    #[test]
    fn test_multiple_roots() {
        assert!(matches!(parse_markup("<a/><b/>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_unclosed() {
        assert!(parse_markup("<a><b></b>").is_err());
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(parse_markup("<a></b>").is_err());
    }

    #[test]
    fn test_name_collision() {
        assert!(matches!(
            parse_markup("<a_x002E_b/>"),
            Err(Error::NameEscapingCollision { .. })
        ));
    }

    #[test]
    fn test_from_markup_header() {
        let xml = "<a x=\"1\"/>";
        let file = from_markup(xml, "library/a.xml", "note", 123, 3).unwrap();

        assert_eq!(file.header.version, 3);
        assert_eq!(file.header.build_number, 123);
        assert_eq!(file.header.original_file_path, "library/a.xml");
        assert_eq!(file.header.header_text, "note");
        assert_eq!(file.header.resource.source_digest, digest(xml));
        assert!(file.header.resource.definition_digest.is_zero());
    }

    #[test]
    fn test_markup_round_trip() {
        let xml = r#"<Library group="ui">
    <!-- buttons -->
    <button.ok caption="&quot;OK&quot;">
        press
    </button.ok>
    <spacer size="4" />
</Library>
"#;
        let file = from_markup(xml, "a.xml", "", 1, 1).unwrap();
        let writer = MarkupWriter::new(MarkupOptions {
            indent: 4,
            header_comment: false,
        });
        assert_eq!(writer.render_file(&file).unwrap(), xml);

        // The header comment is dropped when parsing back.
        let reparsed = parse_markup(&to_markup(&file).unwrap()).unwrap();
        assert_eq!(reparsed.children[0].content, "Library");
        assert_eq!(reparsed.descendant_count(), file.root.descendant_count());
    }
}
