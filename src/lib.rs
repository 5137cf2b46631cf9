pub mod error;
pub mod filesystem;
pub mod format;
pub mod formats;
pub mod fstree;
pub mod ir;
pub mod ir_format;
pub mod markdown;
pub mod names;

use std::path::Path;

pub use error::Error;
pub use format::{Document, Emitted, Format, OptionBag, OptionValue, Source};
pub use ir::{normalize, Children, IrNode};

/// Run one full conversion: parse `input` with the source format, emit the
/// resulting document with the target format.
///
/// The document keeps the source format descriptor, so a side-effecting
/// target (the filesystem) can name content files after the source format's
/// preferred extension. `location` is where a side-effecting emit
/// materializes its output; text output is returned for the caller to write.
pub fn convert(
    from: &'static Format,
    to: &'static Format,
    input: &Source,
    input_options: &OptionBag,
    output_options: &OptionBag,
    location: Option<&Path>,
) -> Result<Emitted, Error> {
    let doc = from.create_mapper(input_options)?.parse(input)?;
    let out = to.create_mapper(output_options)?;
    Ok(out.emit(doc, location)?)
}
