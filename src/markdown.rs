use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{InvalidOptions, ParseError};
use crate::format::{
    int_option, read_source, str_option, validate_options, Document, Emitted, Format, Mapper,
    OptionBag, OptionKind, OptionSpec, Source, DEFAULT_ENCODING, ENCODING_OPTION,
};
use crate::ir::{Children, IrNode};

// ATX heading with optional inline text and optional closing hash run.
static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))??(?:[ \t]+#+)?[ \t]*$").unwrap()
});
static RE_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,})([a-zA-Z0-9_]*)\s*$").unwrap());

const DEFAULT_DEPTH: usize = 6;

pub static FORMAT: Format = Format {
    display_name: "Markdown",
    aliases: &["md"],
    file_extensions: &["md", "markdown", "mdown", "mkdn", "mkd", "mdwn", "mkdown", "ron"],
    options: &[
        ENCODING_OPTION,
        OptionSpec {
            name: "depth",
            kind: OptionKind::IntRange(1, 6),
            description: "maximum depth of headings to parse; deeper headings \
                          are folded into the enclosing section's content",
            default: Some("6"),
        },
    ],
    accepts: "markdown markup text",
    emits: "markdown markup text",
    create,
};

fn create(format: &'static Format, bag: &OptionBag) -> Result<Box<dyn Mapper>, InvalidOptions> {
    validate_options(format, bag)?;
    let encoding = str_option(bag, "encoding")
        .unwrap_or(DEFAULT_ENCODING)
        .to_string();
    let depth = int_option(bag, "depth")
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_DEPTH);
    Ok(Box::new(MarkdownMapper {
        format,
        encoding,
        depth,
    }))
}

struct MarkdownMapper {
    format: &'static Format,
    encoding: String,
    depth: usize,
}

impl Mapper for MarkdownMapper {
    fn parse(&self, input: &Source) -> Result<Document, ParseError> {
        let text = read_source(input, &self.encoding)
            .map_err(|e| ParseError::wrap(self.format.display_name, &input.describe(), e))?;
        let headings = scan_headings(&text);
        let root = build_tree(&text, &headings, self.depth);
        Ok(Document {
            format: self.format,
            root,
        })
    }

    fn emit(&self, doc: Document, _location: Option<&Path>) -> io::Result<Emitted> {
        Ok(Emitted::Text(emit_markdown(&doc.root)))
    }
}

/// A structural heading found by the block scan. All spans are byte offsets
/// into the source; `title_start..title_end` covers the inline content
/// exactly (zero-width when the heading has none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Heading {
    depth: usize,
    start: usize,
    end: usize,
    title_start: usize,
    title_end: usize,
}

/// Line-level scan for ATX headings, with fenced code blocks masked out.
fn scan_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut offset = 0;
    let mut fence: Option<String> = None;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        if let Some(open) = &fence {
            if line.trim_end() == open {
                fence = None;
            }
        } else if let Some(caps) = RE_FENCE_OPEN.captures(line) {
            fence = Some(caps[1].to_string());
        } else if let Some(caps) = RE_HEADING.captures(line) {
            if let Some(hashes) = caps.get(1) {
                let (title_start, title_end) = match caps.get(2) {
                    Some(m) => (offset + m.start(), offset + m.end()),
                    None => (offset + hashes.end(), offset + hashes.end()),
                };
                headings.push(Heading {
                    depth: hashes.len(),
                    start: offset,
                    end: offset + line.len(),
                    title_start,
                    title_end,
                });
            }
        }
        offset += raw.len();
    }
    headings
}

/// An open section during tree construction: a heading whose child list is
/// still accepting nodes. Depth 0 is the virtual root.
struct Frame {
    depth: usize,
    title: Option<String>,
    content: Option<String>,
    items: Vec<IrNode>,
}

impl Frame {
    fn into_node(self) -> IrNode {
        IrNode {
            title: self.title,
            content: self.content,
            children: Some(Children::ordered(self.items)),
        }
    }
}

fn pop_frame(frames: &mut Vec<Frame>) {
    if let Some(done) = frames.pop() {
        if let Some(parent) = frames.last_mut() {
            parent.items.push(done.into_node());
        }
    }
}

/// The depth-stack construction. A stack keyed by depth, rather than a
/// fixed-depth array, is what makes skipped and decreasing heading levels
/// nest correctly; popping while the top depth is `>= d` (not `>`) is the
/// tie-break that makes a same-or-shallower heading a sibling instead of a
/// child.
fn build_tree(text: &str, headings: &[Heading], max_depth: usize) -> IrNode {
    let mut frames = vec![Frame {
        depth: 0,
        title: None,
        content: None,
        items: Vec::new(),
    }];
    let mut prev_end = 0;

    for heading in headings.iter().filter(|h| h.depth <= max_depth) {
        // Text since the previous structural heading belongs to whichever
        // section is still open, the virtual root included.
        let between = text[prev_end..heading.start].trim();
        if !between.is_empty() {
            if let Some(open) = frames.last_mut() {
                open.content = Some(between.to_string());
            }
        }

        while frames.len() > 1 && frames[frames.len() - 1].depth >= heading.depth {
            pop_frame(&mut frames);
        }

        // A heading token was explicitly present, so the title is at worst
        // empty, never absent.
        let title = text[heading.title_start..heading.title_end].trim().to_string();
        frames.push(Frame {
            depth: heading.depth,
            title: Some(title),
            content: None,
            items: Vec::new(),
        });
        prev_end = heading.end;
    }

    let trailing = text[prev_end..].trim();
    if !trailing.is_empty() {
        if let Some(open) = frames.last_mut() {
            open.content = Some(match open.content.take() {
                Some(existing) => format!("{existing}\n\n{trailing}"),
                None => trailing.to_string(),
            });
        }
    }

    while frames.len() > 1 {
        pop_frame(&mut frames);
    }
    let mut root = match frames.pop() {
        Some(frame) => frame.into_node(),
        None => IrNode::default(),
    };
    if root.children.as_ref().is_some_and(|c| c.items.is_empty()) {
        root.children = None;
    }
    root
}

/// IR to Markdown text. Heading markers are synthesized as `#` repetition
/// for the node's nesting level, clamped to 6; untitled nodes contribute
/// content only.
fn emit_markdown(root: &IrNode) -> String {
    let mut out = String::new();
    walk(root, 0, &mut out);
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

fn walk(node: &IrNode, level: usize, out: &mut String) {
    let mut child_level = level.max(1);
    if let Some(title) = &node.title {
        let depth = level.clamp(1, 6);
        out.push_str(&"#".repeat(depth));
        if !title.is_empty() {
            out.push(' ');
            out.push_str(title);
        }
        out.push_str("\n\n");
        child_level = depth + 1;
    }
    if let Some(content) = &node.content {
        if !content.is_empty() {
            out.push_str(content.trim_end());
            out.push_str("\n\n");
        }
    }
    if let Some(children) = &node.children {
        for child in &children.items {
            walk(child, child_level, out);
        }
    }
}
