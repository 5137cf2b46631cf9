use majas::format::{OptionBag, OptionValue, Source};
use majas::ir::normalize;
use majas::{convert, formats, Emitted};
use std::fs;
use tempfile::TempDir;

fn bag(entries: &[(&str, &str)]) -> OptionBag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), OptionValue::Str(v.to_string())))
        .collect()
}

fn text(result: Emitted) -> String {
    match result {
        Emitted::Text(t) => t,
        other => panic!("expected text output, got {other:?}"),
    }
}

const SAMPLE: &str = "\
intro text

# Guide

Opening words.

## Install

Run the installer.

## Use

### Quick start

Type things.

# Appendix

The end.
";

#[test]
fn test_markdown_ir_round_trip() {
    let md = formats::find_format("md").unwrap();
    let ir = formats::find_format("ir").unwrap();
    let empty = OptionBag::new();

    let source = Source::Bytes(SAMPLE.as_bytes().to_vec());
    let json = text(convert(md, ir, &source, &empty, &empty, None).unwrap());

    let direct = md
        .create_mapper(&empty)
        .unwrap()
        .parse(&source)
        .unwrap()
        .root;
    let reparsed = ir
        .create_mapper(&empty)
        .unwrap()
        .parse(&Source::Bytes(json.into_bytes()))
        .unwrap()
        .root;

    assert_eq!(normalize(reparsed), normalize(direct));
}

#[test]
fn test_ir_round_trip_with_indentation() {
    let ir = formats::find_format("ir").unwrap();
    let pretty = bag(&[("space", "2")]);
    let empty = OptionBag::new();

    let input = r#"{"title":"root","children":{"ordered":false,"items":[{"content":"x"}]}}"#;
    let source = Source::Bytes(input.as_bytes().to_vec());
    let printed = text(convert(ir, ir, &source, &empty, &pretty, None).unwrap());
    assert!(printed.contains("\n  \"title\""));

    let back = text(convert(
        ir,
        ir,
        &Source::Bytes(printed.into_bytes()),
        &empty,
        &empty,
        None,
    )
    .unwrap());
    assert_eq!(back, input);
}

#[test]
fn test_markdown_to_filesystem() {
    let md = formats::find_format("md").unwrap();
    let fs_format = formats::find_format("fs").unwrap();
    let empty = OptionBag::new();
    let tmp = TempDir::new().unwrap();

    let source = Source::Bytes(SAMPLE.as_bytes().to_vec());
    let result = convert(md, fs_format, &source, &empty, &empty, Some(tmp.path())).unwrap();
    assert_eq!(result, Emitted::Tree(tmp.path().to_path_buf()));

    // Root content lands in out.md; each titled section with content gets a
    // file named after it, sections with subsections get a sibling
    // directory, all with the markdown extension.
    assert_eq!(
        fs::read_to_string(tmp.path().join("out.md")).unwrap(),
        "intro text"
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("Guide.md")).unwrap(),
        "Opening words."
    );
    let guide = tmp.path().join("Guide");
    assert_eq!(
        fs::read_to_string(guide.join("Install.md")).unwrap(),
        "Run the installer."
    );
    assert_eq!(
        fs::read_to_string(guide.join("Use").join("Quick start.md")).unwrap(),
        "Type things."
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("Appendix.md")).unwrap(),
        "The end."
    );
    assert!(!tmp.path().join("Appendix").exists());
}

#[test]
fn test_filesystem_round_trip() {
    let fs_format = formats::find_format("fs").unwrap();
    let empty = OptionBag::new();
    let tmp = TempDir::new().unwrap();

    fs::write(tmp.path().join("a.txt"), "alpha").unwrap();
    fs::create_dir(tmp.path().join("sub")).unwrap();
    fs::write(tmp.path().join("sub").join("b.txt"), "beta").unwrap();

    let doc = fs_format
        .create_mapper(&empty)
        .unwrap()
        .parse(&Source::Path(tmp.path().to_path_buf()))
        .unwrap();

    let root = doc.root;
    let children = root.children.as_ref().unwrap();
    assert!(!children.ordered);
    assert_eq!(children.items.len(), 2);
    assert_eq!(children.items[0].title.as_deref(), Some("a.txt"));
    assert_eq!(children.items[0].content.as_deref(), Some("alpha"));
    assert_eq!(children.items[1].title.as_deref(), Some("sub"));
}

#[test]
fn test_filesystem_emit_honors_options() {
    let md = formats::find_format("md").unwrap();
    let fs_format = formats::find_format("fs").unwrap();
    let tmp = TempDir::new().unwrap();

    let source = Source::Bytes(b"# em/pty\n\nbody\n".to_vec());
    let out_opts = bag(&[("replace", "_"), ("header", "# {title}{n}{n}")]);
    convert(
        md,
        fs_format,
        &source,
        &OptionBag::new(),
        &out_opts,
        Some(tmp.path()),
    )
    .unwrap();

    let written = fs::read_to_string(tmp.path().join("em_pty.md")).unwrap();
    assert_eq!(written, "# em/pty\n\nbody");
}

#[test]
fn test_depth_option_end_to_end() {
    let md = formats::find_format("md").unwrap();
    let empty = OptionBag::new();
    let shallow = bag(&[("depth", "1")]);

    let source = Source::Bytes(b"# a\n## b\ncontent\n".to_vec());
    let deep = md.create_mapper(&empty).unwrap().parse(&source).unwrap();
    let flat = md.create_mapper(&shallow).unwrap().parse(&source).unwrap();

    let deep_a = &deep.root.children.as_ref().unwrap().items[0];
    assert_eq!(deep_a.children.as_ref().unwrap().items.len(), 1);

    let flat_a = &flat.root.children.as_ref().unwrap().items[0];
    assert!(flat_a.children.as_ref().unwrap().items.is_empty());
    assert_eq!(flat_a.content.as_deref(), Some("## b\ncontent"));
}

#[test]
fn test_parse_failures_are_parse_errors() {
    let fs_format = formats::find_format("fs").unwrap();
    let empty = OptionBag::new();
    let err = fs_format
        .create_mapper(&empty)
        .unwrap()
        .parse(&Source::Bytes(b"/nonexistent/majas-input".to_vec()))
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to parse Filesystem"));
    assert_eq!(err.input(), "/nonexistent/majas-input");
}

#[test]
fn test_unknown_output_option_rejected() {
    let md = formats::find_format("md").unwrap();
    let ir = formats::find_format("ir").unwrap();
    let err = convert(
        md,
        ir,
        &Source::Bytes(b"# x".to_vec()),
        &OptionBag::new(),
        &bag(&[("depth", "3")]),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("unknown option `depth`"));
}
