use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Longest input excerpt carried by a [`ParseError`].
const EXCERPT_LIMIT: usize = 1000;

pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Raised when a mapper's `parse` cannot turn its input into a valid IR tree.
///
/// Every failure inside `parse` is surfaced as this type, wrapping the
/// underlying error when one exists, so callers only ever deal with one
/// error taxonomy at that boundary.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    format: &'static str,
    excerpt: String,
    #[source]
    source: Option<BoxedError>,
}

impl ParseError {
    pub fn new(format: &'static str, input: &str, message: Option<&str>) -> Self {
        let excerpt = excerpt(input);
        let message = match message {
            Some(m) => format!("failed to parse {format}: {m}: input: {excerpt}"),
            None => format!("failed to parse {format}: input: {excerpt}"),
        };
        Self {
            message,
            format,
            excerpt,
            source: None,
        }
    }

    pub fn wrap(format: &'static str, input: &str, cause: impl Into<BoxedError>) -> Self {
        let cause = cause.into();
        let excerpt = excerpt(input);
        Self {
            message: format!("failed to parse {format}: {cause}: input: {excerpt}"),
            format,
            excerpt,
            source: Some(cause),
        }
    }

    pub fn format_name(&self) -> &'static str {
        self.format
    }

    /// The offending input, truncated to a bounded prefix.
    pub fn input(&self) -> &str {
        &self.excerpt
    }
}

fn excerpt(input: &str) -> String {
    if input.len() > EXCERPT_LIMIT {
        let mut end = EXCERPT_LIMIT;
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &input[..end])
    } else {
        input.to_string()
    }
}

/// Raised when a caller-supplied option bag fails a format's options schema.
#[derive(Debug, Error)]
#[error("invalid options for {format}: {reason}")]
pub struct InvalidOptions {
    pub format: &'static str,
    pub reason: String,
}

impl InvalidOptions {
    pub fn new(format: &'static str, reason: impl Into<String>) -> Self {
        Self {
            format,
            reason: reason.into(),
        }
    }
}

/// Raised when a requested format name or alias matches nothing registered.
#[derive(Debug, Error)]
#[error("unknown format: {0}")]
pub struct UnknownFormat(pub String);

/// Any failure a whole conversion can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Options(#[from] InvalidOptions),
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),
    #[error(transparent)]
    Io(#[from] io::Error),
}
