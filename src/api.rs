use crate::error::{Error, ErrorKind, ParseError};
use crate::lexer::scan_byte_order_mark;
use crate::parser::Parser;
use crate::utils::fold_case;
use crate::value::Value;
use log::debug;
use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

/// Name of the section holding everything written before the first header.
pub const DEFAULT_SECTION: &str = "default";

/// Name given to sources that do not come from a file.
pub const DEFAULT_SOURCE_NAME: &str = "<string>";

/// The result of a successful parse.
///
/// The root is a table of sections and always holds [`DEFAULT_SECTION`].
/// Scalars borrow from the parsed text; use [`Document::into_owned`] to keep
/// the document around after the text is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    root: Value<'a>,
}

impl<'a> Document<'a> {
    pub(crate) fn from_root(root: Value<'a>) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Value<'a> {
        &self.root
    }

    /// The implicit section, merged with every `[default]` block.
    #[must_use]
    pub fn default_section(&self) -> &Value<'a> {
        self.root.get(DEFAULT_SECTION)
    }

    /// Looks a section up by name, ignoring ASCII case.
    #[must_use]
    pub fn section(&self, name: &str) -> &Value<'a> {
        self.root.get(&fold_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.contains(&fold_case(name))
    }

    /// Sections in the order they first appear, `default` first.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.root.entries()
    }

    pub fn into_root(self) -> Value<'a> {
        self.root
    }

    /// Copies every borrowed slice so the document no longer depends on its source.
    pub fn into_owned(self) -> Document<'static> {
        Document {
            root: self.root.into_owned(),
        }
    }

    /// Renders the document as pretty-printed JSON. Scalars become strings.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> Index<&str> for Document<'a> {
    type Output = Value<'a>;

    fn index(&self, name: &str) -> &Self::Output {
        self.section(name)
    }
}

/// Owns a configuration text and the name it is reported under.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Decodes a raw buffer. A UTF-8 byte order mark is dropped and invalid
    /// UTF-8 sequences are replaced.
    ///
    /// # Errors
    /// Fails with [`ErrorKind::InvalidByteOrderMark`] when the buffer starts
    /// with a UTF-16 or UTF-32 byte order mark.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, Error> {
        let name = name.into();
        let skip = scan_byte_order_mark(bytes).ok_or_else(|| byte_order_mark_error(&name))?;
        let text = String::from_utf8_lossy(&bytes[skip..]).into_owned();
        Ok(Self { name, text })
    }

    /// Reads a whole file. The path becomes the source name.
    ///
    /// # Errors
    /// Fails with [`Error::Io`] when the file cannot be read, and like
    /// [`Source::from_bytes`] otherwise.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            debug!("unable to read `{}`: {}", path.display(), source);
            Error::Io {
                path: path.to_path_buf(),
                source: Arc::new(source),
            }
        })?;
        debug!("read {} bytes from `{}`", bytes.len(), path.display());
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// # Errors
    /// Returns the first syntax error found in the text.
    pub fn parse(&self) -> Result<Document<'_>, Error> {
        Ok(Parser::new_with_name(&self.text, self.name.as_str()).parse_document()?)
    }
}

fn byte_order_mark_error(name: &str) -> Error {
    ParseError::new(ErrorKind::InvalidByteOrderMark, name, "", 0, 0).into()
}

/// Parses a configuration held in memory.
///
/// ```
/// let doc = confit::parse("[server]\nPort = 8080").unwrap();
/// assert_eq!(doc["server"]["port"].to::<u16>(), Some(8080));
/// ```
///
/// # Errors
/// Returns the first syntax error found in `text`.
pub fn parse(text: &str) -> Result<Document<'_>, Error> {
    Ok(Parser::new(text).parse_document()?)
}

/// Parses a raw buffer, borrowing from it when it is valid UTF-8.
///
/// # Errors
/// Fails on a UTF-16 or UTF-32 byte order mark and on syntax errors.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document<'_>, Error> {
    let skip =
        scan_byte_order_mark(bytes).ok_or_else(|| byte_order_mark_error(DEFAULT_SOURCE_NAME))?;
    match std::str::from_utf8(&bytes[skip..]) {
        Ok(text) => parse(text),
        Err(_) => {
            let text = String::from_utf8_lossy(&bytes[skip..]);
            Ok(parse(&text)?.into_owned())
        }
    }
}

/// Reads and parses a file.
///
/// # Errors
/// Fails with [`ErrorKind::UnableToReadFile`] when the file cannot be read,
/// and with the first syntax error otherwise.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document<'static>, Error> {
    let source = Source::read(path)?;
    let document = source.parse()?.into_owned();
    Ok(document)
}
