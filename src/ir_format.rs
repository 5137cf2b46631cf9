use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io;
use std::path::Path;

use crate::error::{InvalidOptions, ParseError};
use crate::format::{
    read_source, str_option, validate_options, Document, Emitted, Format, Mapper, OptionBag,
    OptionKind, OptionSpec, Source, DEFAULT_ENCODING, ENCODING_OPTION,
};
use crate::ir::IrNode;

pub static FORMAT: Format = Format {
    display_name: "IR",
    aliases: &[],
    file_extensions: &[],
    options: &[
        ENCODING_OPTION,
        OptionSpec {
            name: "space",
            kind: OptionKind::Text,
            description: "indentation for the output JSON: a whitespace string \
                          or a non-negative count of spaces",
            default: None,
        },
    ],
    accepts: "IRNode JSON",
    emits: "IRNode JSON",
    create,
};

fn create(format: &'static Format, bag: &OptionBag) -> Result<Box<dyn Mapper>, InvalidOptions> {
    validate_options(format, bag)?;
    let encoding = str_option(bag, "encoding")
        .unwrap_or(DEFAULT_ENCODING)
        .to_string();
    let space = str_option(bag, "space")
        .map(|s| match s.parse::<u64>() {
            Ok(n) => " ".repeat(n as usize),
            Err(_) => s.to_string(),
        })
        .filter(|s| !s.is_empty());
    Ok(Box::new(IrMapper {
        format,
        encoding,
        space,
    }))
}

struct IrMapper {
    format: &'static Format,
    encoding: String,
    space: Option<String>,
}

impl Mapper for IrMapper {
    fn parse(&self, input: &Source) -> Result<Document, ParseError> {
        let text = read_source(input, &self.encoding)
            .map_err(|e| ParseError::wrap(self.format.display_name, &input.describe(), e))?;
        // The serde derive enforces the recursive IR schema, unknown
        // properties included.
        let root: IrNode = serde_json::from_str(&text)
            .map_err(|e| ParseError::wrap(self.format.display_name, &text, e))?;
        Ok(Document {
            format: self.format,
            root,
        })
    }

    fn emit(&self, doc: Document, _location: Option<&Path>) -> io::Result<Emitted> {
        let text = match &self.space {
            None => serde_json::to_string(&doc.root)?,
            Some(indent) => {
                let mut buf = Vec::new();
                let formatter = PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                doc.root.serialize(&mut ser)?;
                String::from_utf8(buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            }
        };
        Ok(Emitted::Text(text))
    }
}
