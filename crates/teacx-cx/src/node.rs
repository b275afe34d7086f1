//! CX node structure and codec.

use std::fmt;

use teacx_common::{BinaryCodec, BinaryReader};

use crate::{Attribute, Error, NodeType, Result};

/// Smallest encoded node: line, type, empty content and two zero counts.
const MIN_NODE_SIZE: usize = 4 + 4 + 5 + 4 + 4;

/// Smallest encoded attribute: two empty strings.
const MIN_ATTRIBUTE_SIZE: usize = 5 + 5;

/// A node in the CX tree.
///
/// Attribute and child counts are not stored; they are taken from the lengths
/// of [`Node::attributes`] and [`Node::children`] when encoding.
///
/// Decoding, encoding, cloning, comparing, formatting and dropping walk the
/// tree with an explicit stack, so arbitrarily deep trees do not exhaust the
/// call stack.
pub struct Node {
    /// Source line of the node in the authored markup.
    pub line_number: u32,
    /// Kind of node.
    pub node_type: NodeType,
    /// Tag name, text payload or comment text depending on the type.
    pub content: String,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node of the given type and content.
    pub fn new(node_type: NodeType, content: impl Into<String>) -> Self {
        Self {
            line_number: 0,
            node_type,
            content: content.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element node.
    pub fn element(name: impl Into<String>) -> Self {
        Self::new(NodeType::Node, name)
    }

    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeType::Text, text)
    }

    /// Create a comment node.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(NodeType::Comment, text)
    }

    /// Create a disabled element node.
    pub fn commented_out(name: impl Into<String>) -> Self {
        Self::new(NodeType::CommentedOutNode, name)
    }

    /// Create a virtual root wrapping the given document root.
    pub fn root(document: Node) -> Self {
        Self::new(NodeType::RootVirtual, "").with_child(document)
    }

    /// Set the line number.
    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = line_number;
        self
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Get the value of the first attribute with the given name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check if an element would render without a body.
    pub fn is_self_closing(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterate over this node and all of its descendants in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including this node.
    pub fn descendant_count(&self) -> usize {
        self.descendants().count()
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }

    /// Copy of this node without its children.
    fn clone_head(&self) -> Node {
        Node {
            line_number: self.line_number,
            node_type: self.node_type,
            content: self.content.clone(),
            attributes: self.attributes.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }

    /// Compare everything but the children.
    fn head_eq(&self, other: &Node) -> bool {
        self.line_number == other.line_number
            && self.node_type == other.node_type
            && self.content == other.content
            && self.attributes == other.attributes
            && self.children.len() == other.children.len()
    }

    /// Read one node without its children. Returns the declared child count.
    fn read_head(reader: &mut BinaryReader<'_>) -> Result<(Node, u32)> {
        let line_number = reader.read_u32()?;
        let node_type = NodeType::from_code(reader.read_u32()?);
        let content = reader.read_string()?;

        let attribute_count = reader.read_u32()? as usize;
        let mut attributes =
            Vec::with_capacity(attribute_count.min(reader.remaining() / MIN_ATTRIBUTE_SIZE));
        for _ in 0..attribute_count {
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            attributes.push(Attribute { name, value });
        }

        let child_count = reader.read_u32()?;
        let children =
            Vec::with_capacity((child_count as usize).min(reader.remaining() / MIN_NODE_SIZE));

        let node = Node {
            line_number,
            node_type,
            content,
            attributes,
            children,
        };
        Ok((node, child_count))
    }
}

/// Write a sequence length as a 4-byte count.
fn write_count(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let count = u32::try_from(len).map_err(|_| teacx_common::Error::ValueOutOfRange {
        value: len as i128,
        width: 4,
        kind: "unsigned",
    })?;
    count.encode(out)?;
    Ok(())
}

impl BinaryCodec for Node {
    type Error = Error;

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        // Each entry is a node still waiting for children plus how many remain.
        let mut stack: Vec<(Node, u32)> = Vec::new();
        let mut current = Self::read_head(reader)?;

        loop {
            if current.1 > 0 {
                current.1 -= 1;
                let child = Self::read_head(reader)?;
                stack.push(std::mem::replace(&mut current, child));
            } else {
                let finished = current.0;
                match stack.pop() {
                    Some(mut parent) => {
                        parent.0.children.push(finished);
                        current = parent;
                    }
                    None => return Ok(finished),
                }
            }
        }
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.line_number.encode(out)?;
            node.node_type.code().encode(out)?;
            node.content.encode(out)?;

            write_count(out, node.attributes.len())?;
            for attr in &node.attributes {
                attr.name.encode(out)?;
                attr.value.encode(out)?;
            }

            write_count(out, node.children.len())?;
            stack.extend(node.children.iter().rev());
        }
        Ok(())
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        // Each entry pairs a source node with its copy built so far.
        let mut stack: Vec<(&Node, Node)> = Vec::new();
        let mut current = (self, self.clone_head());

        loop {
            let copied = current.1.children.len();
            if let Some(child) = current.0.children.get(copied) {
                let next = (child, child.clone_head());
                stack.push(std::mem::replace(&mut current, next));
            } else {
                match stack.pop() {
                    Some(parent) => {
                        let (_, finished) = std::mem::replace(&mut current, parent);
                        current.1.children.push(finished);
                    }
                    None => return current.1,
                }
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.head_eq(b) {
                return false;
            }
            stack.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for Node {}

/// Work item of [`Node`]'s `Debug` output.
enum DebugStep<'a> {
    Open(&'a Node),
    Separator,
    Close,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![DebugStep::Open(self)];
        while let Some(step) = stack.pop() {
            match step {
                DebugStep::Open(node) => {
                    write!(
                        f,
                        "Node {{ line_number: {:?}, node_type: {:?}, content: {:?}, attributes: {:?}, children: [",
                        node.line_number, node.node_type, node.content, node.attributes
                    )?;
                    stack.push(DebugStep::Close);
                    for (i, child) in node.children.iter().enumerate().rev() {
                        stack.push(DebugStep::Open(child));
                        if i > 0 {
                            stack.push(DebugStep::Separator);
                        }
                    }
                }
                DebugStep::Separator => f.write_str(", ")?,
                DebugStep::Close => f.write_str("] }")?,
            }
        }
        Ok(())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Pre-order iterator over a subtree, see [`Node::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Node `a` with attribute `x="1"` and no children.
    const ELEMENT_A: &[u8] = &[
        0, 0, 0, 0, // line
        0, 0, 0, 0, // type: Node
        1, 1, 0, 0, 0, b'a', // content
        1, 0, 0, 0, // attribute count
        1, 1, 0, 0, 0, b'x', // name
        1, 1, 0, 0, 0, b'1', // value
        0, 0, 0, 0, // child count
    ];

    #[test]
    fn test_decode_element() {
        let node = Node::from_bytes(ELEMENT_A).unwrap();
        assert_eq!(node.node_type, NodeType::Node);
        assert_eq!(node.content, "a");
        assert_eq!(node.attr("x"), Some("1"));
        assert!(node.children.is_empty());
        assert_eq!(node.to_bytes().unwrap(), ELEMENT_A);
    }

    #[test]
    fn test_round_trip() {
        let node = Node::element("Library")
            .with_line(1)
            .with_attr("group", "ui")
            .with_child(Node::comment(" widgets ").with_line(2))
            .with_child(
                Node::element("widget.button")
                    .with_line(3)
                    .with_attr("id", "ok")
                    .with_attr("caption", "OK")
                    .with_child(Node::text("press me").with_line(4)),
            )
            .with_child(Node::commented_out("widget.old").with_line(6));

        let bytes = node.to_bytes().unwrap();
        let decoded = Node::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(decoded.descendant_count(), 5);
        assert_eq!(decoded.depth(), 3);
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let node = Node::element("a")
            .with_attr("z", "1")
            .with_attr("a", "2")
            .with_attr("m", "3");
        let decoded = Node::from_bytes(&node.to_bytes().unwrap()).unwrap();
        let names: Vec<_> = decoded.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let mut bytes = ELEMENT_A.to_vec();
        bytes[4] = 9;
        let node = Node::from_bytes(&bytes).unwrap();
        assert_eq!(node.node_type, NodeType::Unknown(9));
        assert_eq!(node.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_truncated_mid_attribute() {
        // Cut inside the attribute value.
        let bytes = &ELEMENT_A[..ELEMENT_A.len() - 6];
        let err = Node::from_bytes(bytes).unwrap_err();
        assert!(err.is_truncated(), "unexpected error: {err}");
    }

    #[test]
    fn test_truncated_missing_child() {
        let mut bytes = ELEMENT_A.to_vec();
        let len = bytes.len();
        bytes[len - 4] = 2; // claims two children, has none
        assert!(Node::from_bytes(&bytes).unwrap_err().is_truncated());
    }

    #[test]
    fn test_huge_counts_do_not_preallocate() {
        let mut bytes = ELEMENT_A[..18].to_vec();
        bytes[14..18].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(Node::from_bytes(&bytes).unwrap_err().is_truncated());
    }

    #[test]
    fn test_deep_tree() {
        const DEPTH: usize = 100_000;

        let mut node = Node::element("leaf");
        for _ in 1..DEPTH {
            node = Node::element("n").with_child(node);
        }

        let bytes = node.to_bytes().unwrap();
        let decoded = Node::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.depth(), DEPTH);
        assert_eq!(decoded.descendants().last().map(|n| n.content.as_str()), Some("leaf"));
    }

    #[test]
    fn test_deep_tree_clone_and_compare() {
        const DEPTH: usize = 100_000;

        let mut node = Node::element("leaf").with_attr("k", "v");
        for _ in 1..DEPTH {
            node = Node::element("n").with_child(node);
        }

        let decoded = Node::from_bytes(&node.to_bytes().unwrap()).unwrap();
        assert!(decoded == node);

        let copy = node.clone();
        assert!(copy == node);
        assert_eq!(copy.depth(), DEPTH);

        let debug = format!("{:?}", copy);
        assert!(debug.starts_with("Node { line_number: 0, node_type: Node, content: \"n\""));
        assert_eq!(debug.matches("] }").count(), DEPTH);
    }

    #[test]
    fn test_compare_detects_deep_difference() {
        let build = |leaf: &str| {
            let mut node = Node::element(leaf);
            for _ in 0..1_000 {
                node = Node::element("n").with_child(Node::text("t")).with_child(node);
            }
            node
        };

        assert!(build("a") == build("a"));
        assert!(build("a") != build("b"));
        assert!(Node::element("a") != Node::element("a").with_child(Node::text("x")));
    }

    #[test]
    fn test_debug_lists_children() {
        let node = Node::element("a")
            .with_child(Node::text("x"))
            .with_child(Node::element("b"));
        assert_eq!(
            format!("{:?}", node),
            "Node { line_number: 0, node_type: Node, content: \"a\", attributes: [], children: [\
Node { line_number: 0, node_type: Text, content: \"x\", attributes: [], children: [] }, \
Node { line_number: 0, node_type: Node, content: \"b\", attributes: [], children: [] }] }"
        );
    }

    #[test]
    fn test_descendants_order() {
        let node = Node::element("a")
            .with_child(Node::element("b").with_child(Node::element("c")))
            .with_child(Node::element("d"));
        let names: Vec<_> = node.descendants().map(|n| n.content.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }
}
