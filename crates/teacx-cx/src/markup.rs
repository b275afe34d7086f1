//! Rendering of CX trees as markup text.

use quick_xml::escape::{escape, partial_escape};

use crate::{CxFile, Error, Node, NodeType, Result};

/// Comment line written at the top of every rendered file.
pub const HEADER_COMMENT: &str = concat!("<!-- teacx-cx ", env!("CARGO_PKG_VERSION"), " -->");

/// Options for [`MarkupWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Whether [`MarkupWriter::render_file`] starts with [`HEADER_COMMENT`].
    pub header_comment: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            header_comment: true,
        }
    }
}

/// Work item of the rendering stack.
enum Step<'a> {
    /// Render a node; the flag is set inside a commented-out element.
    Enter(&'a Node, usize, bool),
    Close(&'a Node, usize),
    EndDisabled(usize),
}

/// Check that `content` can sit between `<!--` and `-->`.
fn check_comment(content: &str) -> Result<()> {
    let reason = if content.contains("--") {
        "text contains `--`"
    } else if content.ends_with('-') {
        "text ends with `-`"
    } else {
        return Ok(());
    };
    Err(Error::InvalidComment {
        content: content.to_string(),
        reason,
    })
}

/// Renders nodes as markup text.
///
/// - `RootVirtual` renders only its children, at its own depth.
/// - `Text` renders its content on its own line, with `<`, `>` and `&`
///   escaped.
/// - `Comment` renders as `<!--content-->`.
/// - `Node` renders as an element, self-closing when it has no children.
///   Attribute values are escaped, quotes included.
/// - `CommentedOutNode` renders like `Node`, wrapped in a comment.
/// - `Unknown` types cannot be rendered.
///
/// Escaping keeps the output parseable by [`crate::parse_markup`]. Comments
/// that would not survive that are rejected with [`Error::InvalidComment`]:
/// text containing `--` or ending in `-`, and any `Comment` or
/// `CommentedOutNode` inside a `CommentedOutNode`.
#[derive(Debug, Clone, Default)]
pub struct MarkupWriter {
    options: MarkupOptions,
}

impl MarkupWriter {
    /// Create a writer with the given options.
    pub fn new(options: MarkupOptions) -> Self {
        Self { options }
    }

    /// Render a whole file, optionally preceded by the header comment.
    pub fn render_file(&self, file: &CxFile) -> Result<String> {
        let mut out = String::new();
        if self.options.header_comment {
            out.push_str(HEADER_COMMENT);
            out.push('\n');
        }
        self.write_node(&file.root, &mut out)?;
        Ok(out)
    }

    /// Render a single subtree.
    pub fn render_node(&self, node: &Node) -> Result<String> {
        let mut out = String::new();
        self.write_node(node, &mut out)?;
        Ok(out)
    }

    /// Append the rendering of a subtree to `out`.
    pub fn write_node(&self, node: &Node, out: &mut String) -> Result<()> {
        let mut stack = vec![Step::Enter(node, 0, false)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node, depth, disabled) => match node.node_type {
                    NodeType::RootVirtual => {
                        stack.extend(
                            node.children
                                .iter()
                                .rev()
                                .map(|c| Step::Enter(c, depth, disabled)),
                        );
                    }
                    NodeType::Text => {
                        self.indent(out, depth);
                        out.push_str(&partial_escape(node.content.as_str()));
                        out.push('\n');
                    }
                    NodeType::Comment | NodeType::CommentedOutNode if disabled => {
                        return Err(Error::InvalidComment {
                            content: node.content.clone(),
                            reason: "nested inside a commented-out element",
                        });
                    }
                    NodeType::Comment => {
                        check_comment(&node.content)?;
                        self.indent(out, depth);
                        out.push_str("<!--");
                        out.push_str(&node.content);
                        out.push_str("-->\n");
                    }
                    NodeType::Node => {
                        self.open_element(node, depth, disabled, &mut stack, out);
                    }
                    NodeType::CommentedOutNode => {
                        self.indent(out, depth);
                        out.push_str("<!--\n");
                        stack.push(Step::EndDisabled(depth));
                        self.open_element(node, depth, true, &mut stack, out);
                    }
                    NodeType::Unknown(_) => {
                        return Err(Error::UnknownNodeType(node.node_type.to_string()));
                    }
                },
                Step::Close(node, depth) => {
                    self.indent(out, depth);
                    out.push_str("</");
                    out.push_str(&node.content);
                    out.push_str(">\n");
                }
                Step::EndDisabled(depth) => {
                    self.indent(out, depth);
                    out.push_str("-->\n");
                }
            }
        }

        Ok(())
    }

    /// Write the start tag and schedule the body and end tag.
    fn open_element<'a>(
        &self,
        node: &'a Node,
        depth: usize,
        disabled: bool,
        stack: &mut Vec<Step<'a>>,
        out: &mut String,
    ) {
        self.indent(out, depth);
        out.push('<');
        out.push_str(&node.content);
        for attr in &node.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape(attr.value.as_str()));
            out.push('"');
        }

        if node.is_self_closing() {
            out.push_str(" />\n");
            return;
        }

        out.push_str(">\n");
        stack.push(Step::Close(node, depth));
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|c| Step::Enter(c, depth + 1, disabled)),
        );
    }

    fn indent(&self, out: &mut String, depth: usize) {
        out.extend(std::iter::repeat(' ').take(depth * self.options.indent));
    }
}

/// Render a file with the default options.
pub fn to_markup(file: &CxFile) -> Result<String> {
    MarkupWriter::default().render_file(file)
}
