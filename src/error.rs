use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::{get_line_and_column, get_line_text};

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum Error {
    #[error("Unable to read file `{}`", path.display())]
    #[diagnostic(
        code(confit::unable_to_read_file),
        help("Check that the file exists and that it is readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::UnableToReadFile,
            Error::Parse(err) => err.kind,
        }
    }

    /// 1-based line of a parse error, 0 when the input could not be read.
    pub fn line(&self) -> usize {
        match self {
            Error::Io { .. } => 0,
            Error::Parse(err) => err.line,
        }
    }

    /// 1-based column of a parse error, 0 when the input could not be read.
    pub fn column(&self) -> usize {
        match self {
            Error::Io { .. } => 0,
            Error::Parse(err) => err.column,
        }
    }
}

/// Everything that can go wrong while reading a configuration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("Unable to read file")]
    UnableToReadFile,
    #[error("Not enough memory")]
    NotEnoughMemory,
    #[error("Invalid byte order mark, only UTF-8 is supported (0xEFBBBF)")]
    InvalidByteOrderMark,
    #[error("Expected section or parameter")]
    ExpectedSectionOrParameter,
    #[error("Invalid section name")]
    InvalidSectionName,
    #[error("Duplicated section")]
    DuplicatedSection,
    #[error("Invalid item name")]
    InvalidItemName,
    #[error("Expected '=' after item name")]
    ExpectedEqualSign,
    #[error("Duplicated item name")]
    DuplicatedItem,
    #[error("Expected item value after '='")]
    ExpectedValue,
    #[error("Expected closing quote for string")]
    UnclosedString,
    #[error("Unexpected '=' in item value")]
    UnexpectedEqualSign,
    #[error("Unexpected characters after item value")]
    UnexpectedCharsAfterValue,
    #[error("There is opened array, so expected ']'")]
    ExpectedClosingArray,
    #[error("There is opened array, so expected ',' or ']'")]
    ExpectedCommaOrClosingArray,
    #[error("There is opened inline table, so expected '}}'")]
    ExpectedClosingTable,
    #[error("There is opened inline table, so expected ',' or '}}'")]
    ExpectedCommaOrClosingTable,
    #[error("Expected name of the table array inside [[ ]]")]
    ExpectedTableArrayName,
    #[error("Expected ']]' after name of the table array")]
    ExpectedClosingTableArray,
}

impl ErrorKind {
    /// Stable diagnostic code, e.g. `confit::duplicated_item`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnableToReadFile => "confit::unable_to_read_file",
            ErrorKind::NotEnoughMemory => "confit::not_enough_memory",
            ErrorKind::InvalidByteOrderMark => "confit::invalid_byte_order_mark",
            ErrorKind::ExpectedSectionOrParameter => "confit::expected_section_or_parameter",
            ErrorKind::InvalidSectionName => "confit::invalid_section_name",
            ErrorKind::DuplicatedSection => "confit::duplicated_section",
            ErrorKind::InvalidItemName => "confit::invalid_item_name",
            ErrorKind::ExpectedEqualSign => "confit::expected_equal_sign",
            ErrorKind::DuplicatedItem => "confit::duplicated_item",
            ErrorKind::ExpectedValue => "confit::expected_value",
            ErrorKind::UnclosedString => "confit::unclosed_string",
            ErrorKind::UnexpectedEqualSign => "confit::unexpected_equal_sign",
            ErrorKind::UnexpectedCharsAfterValue => "confit::unexpected_chars_after_value",
            ErrorKind::ExpectedClosingArray => "confit::expected_closing_array",
            ErrorKind::ExpectedCommaOrClosingArray => "confit::expected_comma_or_closing_array",
            ErrorKind::ExpectedClosingTable => "confit::expected_closing_table",
            ErrorKind::ExpectedCommaOrClosingTable => "confit::expected_comma_or_closing_table",
            ErrorKind::ExpectedTableArrayName => "confit::expected_table_array_name",
            ErrorKind::ExpectedClosingTableArray => "confit::expected_closing_table_array",
        }
    }

    fn help(self) -> Option<&'static str> {
        let help = match self {
            ErrorKind::InvalidByteOrderMark => "Save the file as UTF-8.",
            ErrorKind::InvalidSectionName | ErrorKind::InvalidItemName => {
                "Names start with a letter or '_' and continue with letters, digits, '_' or '.'."
            }
            ErrorKind::DuplicatedSection => "Each section may only be declared once, except [default].",
            ErrorKind::DuplicatedItem => "Each name may only appear once in a table.",
            ErrorKind::UnexpectedEqualSign => "Quote the value if it contains '='.",
            ErrorKind::UnexpectedCharsAfterValue => {
                "Put each item on its own line, or quote the whole value."
            }
            ErrorKind::ExpectedValue => "The value must start on the same line as '='.",
            _ => return None,
        };
        Some(help)
    }
}

/// A syntax error, located in the source it came from.
#[derive(Error, Debug, Clone)]
#[error("{kind} (line {line}, column {column})")]
pub struct ParseError {
    kind: ErrorKind,
    line: usize,
    column: usize,
    line_text: String,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl ParseError {
    /// Builds the error for `len` bytes at `offset` in `source`.
    pub fn new(kind: ErrorKind, name: &str, source: &str, offset: usize, len: usize) -> Self {
        let (line, column) = get_line_and_column(source, offset);
        Self {
            kind,
            line,
            column,
            line_text: get_line_text(source, offset).to_string(),
            src: NamedSource::new(name, source.to_string()),
            span: (offset, len).into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// The source line the error was found on.
    pub fn line_text(&self) -> &str {
        &self.line_text
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.kind
            .help()
            .map(|help| Box::new(help) as Box<dyn Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some(self.kind.to_string()), self.span);
        Some(Box::new(std::iter::once(label)))
    }
}
