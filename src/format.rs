use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{InvalidOptions, ParseError};
use crate::ir::IrNode;

/// An IR tree paired with the format that produced it, so an emitting mapper
/// can recover metadata about the producer (e.g. its preferred file
/// extension) without re-deriving it.
#[derive(Debug)]
pub struct Document {
    pub format: &'static Format,
    pub root: IrNode,
}

/// Raw conversion input: a path argument or undecoded stdin bytes.
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl Source {
    /// A printable stand-in for error excerpts.
    pub(crate) fn describe(&self) -> String {
        match self {
            Source::Path(p) => p.display().to_string(),
            Source::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

/// What an `emit` call produced: text for the caller to write out, or the
/// root of a filesystem tree already materialized as a side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    Text(String),
    Tree(PathBuf),
}

/// One configured format instance. Exactly two operations; everything a
/// `parse` can fail with is a [`ParseError`], while `emit` I/O failures
/// propagate untouched.
pub trait Mapper {
    fn parse(&self, input: &Source) -> Result<Document, ParseError>;
    fn emit(&self, doc: Document, location: Option<&Path>) -> io::Result<Emitted>;
}

/// A format capability record. One static value per concrete format, held in
/// the registry — selection is by name or alias, never by type inspection.
#[derive(Debug)]
pub struct Format {
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
    pub file_extensions: &'static [&'static str],
    pub options: &'static [OptionSpec],
    pub accepts: &'static str,
    pub emits: &'static str,
    pub create: fn(&'static Format, &OptionBag) -> Result<Box<dyn Mapper>, InvalidOptions>,
}

impl Format {
    pub fn create_mapper(
        &'static self,
        options: &OptionBag,
    ) -> Result<Box<dyn Mapper>, InvalidOptions> {
        (self.create)(self, options)
    }

    /// The extension content files take when this format produced the
    /// document being emitted.
    pub fn primary_extension(&self) -> &'static str {
        self.file_extensions.first().copied().unwrap_or("txt")
    }
}

/// Options arrive as a flat string-or-true mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Flag,
}

pub type OptionBag = IndexMap<String, OptionValue>;

#[derive(Debug, Clone, Copy)]
pub enum OptionKind {
    /// Any string value.
    Text,
    /// A non-negative integer.
    Count,
    /// An integer within an inclusive range.
    IntRange(i64, i64),
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
}

/// Declared schema entry for one option; drives both validation and help
/// text.
#[derive(Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub description: &'static str,
    pub default: Option<&'static str>,
}

pub const ENCODINGS: &[&str] = &["utf-8", "utf8", "ascii", "latin1"];
pub const DEFAULT_ENCODING: &str = "utf-8";

pub const ENCODING_OPTION: OptionSpec = OptionSpec {
    name: "encoding",
    kind: OptionKind::Choice(ENCODINGS),
    description: "text encoding to use",
    default: Some(DEFAULT_ENCODING),
};

/// Check an option bag against a format's declared schema. Unknown keys,
/// wrong types, and out-of-range values all fail.
pub fn validate_options(format: &'static Format, bag: &OptionBag) -> Result<(), InvalidOptions> {
    for (key, value) in bag {
        let spec = format
            .options
            .iter()
            .find(|s| s.name == key.as_str())
            .ok_or_else(|| {
                InvalidOptions::new(format.display_name, format!("unknown option `{key}`"))
            })?;
        check_value(format, spec, value)?;
    }
    Ok(())
}

fn check_value(
    format: &'static Format,
    spec: &OptionSpec,
    value: &OptionValue,
) -> Result<(), InvalidOptions> {
    let text = match value {
        OptionValue::Str(s) => s,
        OptionValue::Flag => {
            return Err(InvalidOptions::new(
                format.display_name,
                format!("option `{}` requires a value", spec.name),
            ));
        }
    };
    match spec.kind {
        OptionKind::Text => Ok(()),
        OptionKind::Count => match text.parse::<u64>() {
            Ok(_) => Ok(()),
            Err(_) => Err(InvalidOptions::new(
                format.display_name,
                format!("option `{}` must be a non-negative integer, got `{text}`", spec.name),
            )),
        },
        OptionKind::IntRange(lo, hi) => match text.parse::<i64>() {
            Ok(n) if (lo..=hi).contains(&n) => Ok(()),
            _ => Err(InvalidOptions::new(
                format.display_name,
                format!("option `{}` must be an integer in {lo}..={hi}, got `{text}`", spec.name),
            )),
        },
        OptionKind::Choice(choices) => {
            if choices.contains(&text.as_str()) {
                Ok(())
            } else {
                Err(InvalidOptions::new(
                    format.display_name,
                    format!(
                        "option `{}` must be one of {}, got `{text}`",
                        spec.name,
                        choices.join(", ")
                    ),
                ))
            }
        }
    }
}

/// String value of an option, if present and string-valued.
pub fn str_option<'a>(bag: &'a OptionBag, name: &str) -> Option<&'a str> {
    match bag.get(name)? {
        OptionValue::Str(s) => Some(s.as_str()),
        OptionValue::Flag => None,
    }
}

/// Integer value of an option. Only called after validation, so a non-integer
/// string simply reads as absent.
pub fn int_option(bag: &OptionBag, name: &str) -> Option<i64> {
    str_option(bag, name)?.parse().ok()
}

/// Decode raw bytes according to a validated `encoding` option value.
pub(crate) fn decode(encoding: &str, bytes: &[u8]) -> io::Result<String> {
    match encoding {
        "latin1" => Ok(bytes.iter().map(|&b| b as char).collect()),
        "ascii" if !bytes.is_ascii() => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "non-ascii byte in ascii input",
        )),
        _ => String::from_utf8(bytes.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
    }
}

/// Resolve a [`Source`] to decoded text: read the file behind a path
/// argument, or decode stdin bytes directly.
pub(crate) fn read_source(input: &Source, encoding: &str) -> io::Result<String> {
    match input {
        Source::Path(p) => decode(encoding, &fs::read(p)?),
        Source::Bytes(b) => decode(encoding, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats;

    fn bag(entries: &[(&str, &str)]) -> OptionBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), OptionValue::Str(v.to_string())))
            .collect()
    }

    #[test]
    fn test_unknown_option_rejected() {
        let md = formats::find_format("md").unwrap();
        let err = validate_options(md, &bag(&[("speed", "11")])).unwrap_err();
        assert!(err.to_string().contains("unknown option `speed`"));
    }

    #[test]
    fn test_range_option_rejected_out_of_bounds() {
        let md = formats::find_format("md").unwrap();
        assert!(validate_options(md, &bag(&[("depth", "7")])).is_err());
        assert!(validate_options(md, &bag(&[("depth", "0")])).is_err());
        assert!(validate_options(md, &bag(&[("depth", "three")])).is_err());
        assert!(validate_options(md, &bag(&[("depth", "3")])).is_ok());
    }

    #[test]
    fn test_choice_option() {
        let ir = formats::find_format("ir").unwrap();
        assert!(validate_options(ir, &bag(&[("encoding", "latin1")])).is_ok());
        assert!(validate_options(ir, &bag(&[("encoding", "ebcdic")])).is_err());
    }

    #[test]
    fn test_flag_rejected_where_value_required() {
        let md = formats::find_format("md").unwrap();
        let mut b = OptionBag::new();
        b.insert("depth".to_string(), OptionValue::Flag);
        let err = validate_options(md, &b).unwrap_err();
        assert!(err.to_string().contains("requires a value"));
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode("utf-8", "héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode("latin1", &[0x68, 0xe9]).unwrap(), "hé");
    }

    #[test]
    fn test_decode_ascii_rejects_high_bytes() {
        assert!(decode("ascii", &[0x68, 0xe9]).is_err());
        assert_eq!(decode("ascii", b"plain").unwrap(), "plain");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(decode("utf-8", &[0xff, 0xfe]).is_err());
    }
}
