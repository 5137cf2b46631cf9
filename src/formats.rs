use std::path::Path;

use crate::error::UnknownFormat;
use crate::format::Format;
use crate::{filesystem, ir_format, markdown};

/// The static, ordered format registry. No plugin discovery: one entry per
/// concrete format, selected by linear name/alias match.
pub static FORMATS: &[&Format] = &[
    &ir_format::FORMAT,
    &markdown::FORMAT,
    &filesystem::FORMAT,
];

/// Look a format up by display name or alias, case-insensitively.
pub fn find_format(name: &str) -> Result<&'static Format, UnknownFormat> {
    FORMATS
        .iter()
        .copied()
        .find(|f| {
            f.display_name.eq_ignore_ascii_case(name)
                || f.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| UnknownFormat(name.to_string()))
}

/// Infer a format from a file extension, if any registered format claims it.
pub fn infer_format(path: &Path) -> Option<&'static Format> {
    let ext = path.extension()?.to_str()?;
    FORMATS
        .iter()
        .copied()
        .find(|f| f.file_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
