use indexmap::IndexMap;
use std::io;
use std::path::Path;

use crate::error::{InvalidOptions, ParseError};
use crate::format::{
    decode, str_option, validate_options, Document, Emitted, Format, Mapper, OptionBag,
    OptionKind, OptionSpec, Source, DEFAULT_ENCODING, ENCODING_OPTION,
};
use crate::fstree::{self, FsTree};
use crate::ir::{Children, IrNode};
use crate::names::{sanitize, uniquify};

const DEFAULT_BASEDIR: &str = ".";
const DEFAULT_BASEFILE: &str = "out";

pub static FORMAT: Format = Format {
    display_name: "Filesystem",
    aliases: &["fs"],
    file_extensions: &[],
    options: &[
        ENCODING_OPTION,
        OptionSpec {
            name: "basedir",
            kind: OptionKind::Text,
            description: "dirname to place the root node's children in",
            default: Some(DEFAULT_BASEDIR),
        },
        OptionSpec {
            name: "basefile",
            kind: OptionKind::Text,
            description: "filename to place root node content in, extension excluded",
            default: Some(DEFAULT_BASEFILE),
        },
        OptionSpec {
            name: "replace",
            kind: OptionKind::Text,
            description: "replacement for characters that are invalid in file names \
                          (default: removal)",
            default: None,
        },
        OptionSpec {
            name: "header",
            kind: OptionKind::Text,
            description: "file header template; {title} is replaced by the node \
                          title and {n} by a newline",
            default: None,
        },
    ],
    accepts: "a filesystem path",
    emits: "a filesystem subtree at the output location, or the current directory \
            if unspecified",
    create,
};

fn create(format: &'static Format, bag: &OptionBag) -> Result<Box<dyn Mapper>, InvalidOptions> {
    validate_options(format, bag)?;
    Ok(Box::new(FilesystemMapper {
        format,
        encoding: str_option(bag, "encoding")
            .unwrap_or(DEFAULT_ENCODING)
            .to_string(),
        base_dirname: str_option(bag, "basedir")
            .unwrap_or(DEFAULT_BASEDIR)
            .to_string(),
        base_filename: str_option(bag, "basefile")
            .unwrap_or(DEFAULT_BASEFILE)
            .to_string(),
        replacement: str_option(bag, "replace").unwrap_or("").to_string(),
        header: str_option(bag, "header").map(str::to_string),
    }))
}

struct FilesystemMapper {
    format: &'static Format,
    encoding: String,
    base_dirname: String,
    base_filename: String,
    replacement: String,
    header: Option<String>,
}

impl Mapper for FilesystemMapper {
    fn parse(&self, input: &Source) -> Result<Document, ParseError> {
        let path = match input {
            Source::Path(p) => p.display().to_string(),
            // Stdin carries the root path as text.
            Source::Bytes(bytes) => decode(&self.encoding, bytes)
                .map_err(|e| ParseError::wrap(self.format.display_name, &input.describe(), e))?
                .trim_end()
                .to_string(),
        };
        let tree = fstree::read(Path::new(&path), &self.encoding)
            .map_err(|e| ParseError::wrap(self.format.display_name, &path, e))?;
        Ok(Document {
            format: self.format,
            root: node_from_tree(Some(path), tree),
        })
    }

    fn emit(&self, doc: Document, location: Option<&Path>) -> io::Result<Emitted> {
        let entries = self.emit_tree(&doc);
        let root = location.unwrap_or_else(|| Path::new("."));
        fstree::write(&FsTree::Dir(entries), root)?;
        Ok(Emitted::Tree(root.to_path_buf()))
    }
}

/// Directory entries become titles; files become content leaves; directories
/// become unordered children.
fn node_from_tree(title: Option<String>, tree: FsTree) -> IrNode {
    match tree {
        FsTree::File(content) => IrNode {
            title,
            content: Some(content),
            children: None,
        },
        FsTree::Dir(entries) => IrNode {
            title,
            content: None,
            children: Some(Children::unordered(
                entries
                    .into_iter()
                    .map(|(name, child)| node_from_tree(Some(name), child))
                    .collect(),
            )),
        },
    }
}

impl FilesystemMapper {
    fn emit_tree(&self, doc: &Document) -> IndexMap<String, FsTree> {
        let mut entries = IndexMap::new();
        self.walk(&mut entries, &doc.root, None, doc.format.primary_extension());
        entries
    }

    /// One node may claim a file (its content), a directory (its children),
    /// or both as siblings, each name uniquified against the parent's
    /// already-claimed entries.
    fn walk(
        &self,
        parent: &mut IndexMap<String, FsTree>,
        node: &IrNode,
        index: Option<usize>,
        extension: &str,
    ) {
        let base = node
            .title
            .as_deref()
            .map(|t| sanitize(t, &self.replacement))
            .or_else(|| index.map(|i| i.to_string()));

        if let Some(content) = &node.content {
            let stem = base.clone().unwrap_or_else(|| self.base_filename.clone());
            let filename = uniquify(&format!("{stem}.{extension}"), |c| parent.contains_key(c));
            let contents = match &self.header {
                Some(template) => {
                    format!("{}{content}", render_header(template, node.title.as_deref()))
                }
                None => content.clone(),
            };
            parent.insert(filename, FsTree::File(contents));
        }

        let items: &[IrNode] = node
            .children
            .as_ref()
            .map(|c| c.items.as_slice())
            .unwrap_or(&[]);
        // A childless, contentless node still claims an empty directory.
        if !items.is_empty() || node.content.is_none() {
            let dirname_base = base.unwrap_or_else(|| self.base_dirname.clone());
            let dirname = uniquify(&dirname_base, |c| parent.contains_key(c));
            let mut dir = IndexMap::new();
            for (i, child) in items.iter().enumerate() {
                self.walk(&mut dir, child, Some(i + 1), extension);
            }
            parent.insert(dirname, FsTree::Dir(dir));
        }
    }
}

fn render_header(template: &str, title: Option<&str>) -> String {
    template
        .replace("{n}", "\n")
        .replace("{title}", title.unwrap_or(""))
}
