//! Node type enumeration.

use std::fmt;

/// The kind of a CX node.
///
/// The wire code is a 4-byte integer. Codes outside the known table decode to
/// [`NodeType::Unknown`], which keeps the code so the node re-encodes as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Ordinary element; content is the tag name.
    Node,
    /// Plain text payload.
    Text,
    /// Real comment.
    Comment,
    /// Synthetic wrapper around the document root. Never rendered itself.
    RootVirtual,
    /// Element kept in the file but disabled.
    CommentedOutNode,
    /// Unrecognised wire code.
    Unknown(u32),
}

/// Wire code and record name of every known node type.
const NODE_TYPES: [(NodeType, u32, &str); 5] = [
    (NodeType::Node, 0, "Node"),
    (NodeType::Text, 1, "Text"),
    (NodeType::Comment, 2, "Comment"),
    (NodeType::RootVirtual, 3, "RootVirtual"),
    (NodeType::CommentedOutNode, 4, "CommentedOutNode"),
];

impl NodeType {
    /// Map a wire code to a node type.
    pub fn from_code(code: u32) -> Self {
        NODE_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map_or(NodeType::Unknown(code), |(t, _, _)| *t)
    }

    /// Map a record name to a known node type.
    pub fn from_name(name: &str) -> Option<Self> {
        NODE_TYPES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(t, _, _)| *t)
    }

    /// Wire code of this node type.
    pub fn code(self) -> u32 {
        match self {
            NodeType::Unknown(code) => code,
            known => NODE_TYPES
                .iter()
                .find(|(t, _, _)| *t == known)
                .map_or(0, |(_, c, _)| *c),
        }
    }

    /// Record name, or `None` for unknown codes.
    pub fn name(self) -> Option<&'static str> {
        NODE_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map(|(_, _, n)| *n)
    }

    /// Check if the type is outside the known table.
    pub fn is_unknown(self) -> bool {
        matches!(self, NodeType::Unknown(_))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown({})", self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_bidirectional() {
        for (node_type, code, name) in NODE_TYPES {
            assert_eq!(NodeType::from_code(code), node_type);
            assert_eq!(node_type.code(), code);
            assert_eq!(NodeType::from_name(name), Some(node_type));
            assert_eq!(node_type.name(), Some(name));
        }
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let t = NodeType::from_code(42);
        assert_eq!(t, NodeType::Unknown(42));
        assert!(t.is_unknown());
        assert_eq!(t.code(), 42);
        assert_eq!(t.name(), None);
        assert_eq!(t.to_string(), "Unknown(42)");
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(NodeType::from_name("Element"), None);
    }
}
