use crate::api::{Document, DEFAULT_SECTION, DEFAULT_SOURCE_NAME};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Lexer, Token, TokenType};
use crate::utils::{fold_case, identifier_len, is_identifier};
use crate::value::Value;
use log::{debug, trace};
use std::borrow::Cow;
use std::mem;

/// Arrays and inline tables nested deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 256;

/// A recursive descent parser for the configuration dialect.
///
/// Tokens are pulled from the lexer one at a time; the first error stops the parse.
pub struct Parser<'a> {
    source: &'a str,
    name: String,
    lexer: Lexer<'a>,
    current: Token<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::new_with_name(source, DEFAULT_SOURCE_NAME)
    }

    pub fn new_with_name(source: &'a str, name: impl Into<String>) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            name: name.into(),
            lexer,
            current,
            depth: 0,
        }
    }

    // === Main Parsing Methods ===

    ///    Document ::= { Statement } { Section | TableArray }
    pub fn parse_document(&mut self) -> Result<Document<'a>, ParseError> {
        debug!("parsing `{}` ({} bytes)", self.name, self.source.len());
        let result = self.parse_sections();
        match &result {
            Ok(document) => debug!(
                "parsed `{}`: {} section(s)",
                self.name,
                document.root().size()
            ),
            Err(err) => debug!("failed to parse `{}`: {}", self.name, err),
        }
        result
    }

    fn parse_sections(&mut self) -> Result<Document<'a>, ParseError> {
        let mut root = Value::make_table();
        // The open section is kept outside the root until the next header.
        let mut name: Cow<'a, str> = Cow::Borrowed(DEFAULT_SECTION);
        let mut section = Value::make_table();

        loop {
            let token = self.current;
            match token.ttype {
                TokenType::End => break,
                TokenType::OpenedSquare => {
                    self.advance();
                    if self.match_token(TokenType::OpenedSquare) {
                        self.parse_table_array(&mut section)?;
                        continue;
                    }

                    let (next, name_token) = self.parse_section_name()?;
                    if next == DEFAULT_SECTION && name == DEFAULT_SECTION {
                        continue;
                    }
                    if next == name || (next != DEFAULT_SECTION && root.contains(&next)) {
                        return Err(self.error_at(ErrorKind::DuplicatedSection, &name_token));
                    }

                    let previous = mem::take(&mut section);
                    let previous_name = mem::replace(&mut name, next);
                    self.stash_section(&mut root, previous_name, previous, &name_token)?;
                    section = match root.get_mut(&name) {
                        // Only [default] can be reopened.
                        Some(slot) => mem::take(slot),
                        None => Value::make_table(),
                    };
                    trace!("opened section [{name}]");
                }
                TokenType::Text(_) | TokenType::Quoted(_) => {
                    self.parse_statement(&mut section)?;
                    self.expect_end_of_line()?;
                }
                TokenType::UnclosedString => {
                    return Err(self.error_at(ErrorKind::UnclosedString, &token));
                }
                _ => return Err(self.error_at(ErrorKind::ExpectedSectionOrParameter, &token)),
            }
        }

        let end = self.current;
        self.stash_section(&mut root, name, section, &end)?;
        Ok(Document::from_root(root))
    }

    fn stash_section(
        &self,
        root: &mut Value<'a>,
        name: Cow<'a, str>,
        section: Value<'a>,
        token: &Token<'a>,
    ) -> Result<(), ParseError> {
        if let Some(slot) = root.get_mut(&name) {
            *slot = section;
            return Ok(());
        }
        match root.insert(name, section) {
            Some(_) => Ok(()),
            None => Err(self.error_at(ErrorKind::NotEnoughMemory, token)),
        }
    }

    /// SectionName ::= Identifier "]" EndOfLine
    fn parse_section_name(&mut self) -> Result<(Cow<'a, str>, Token<'a>), ParseError> {
        let token = self.current;
        let name = match token.ttype {
            TokenType::Text(text) if is_identifier(text) => text,
            _ => return Err(self.error_at(ErrorKind::InvalidSectionName, &token)),
        };
        self.advance();

        if !self.match_token(TokenType::ClosedSquare) {
            return Err(self.error_at(ErrorKind::InvalidSectionName, &token));
        }
        if !self.at_end_of_line() {
            let trailing = self.current;
            return Err(self.error_at(ErrorKind::InvalidSectionName, &trailing));
        }
        Ok((fold_case(name), token))
    }

    /// TableArray ::= "[[" Identifier "]]" EndOfLine { Statement EndOfLine }
    ///
    /// The opening brackets are already consumed.
    fn parse_table_array(&mut self, section: &mut Value<'a>) -> Result<(), ParseError> {
        let token = self.current;
        let name = match token.ttype {
            TokenType::Text(text) if is_identifier(text) => text,
            _ => return Err(self.error_at(ErrorKind::ExpectedTableArrayName, &token)),
        };
        self.advance();

        for _ in 0..2 {
            if !self.match_token(TokenType::ClosedSquare) {
                let current = self.current;
                return Err(self.error_at(ErrorKind::ExpectedClosingTableArray, &current));
            }
        }
        self.expect_end_of_line()?;

        let key = fold_case(name);
        if section.contains(&key) && !section.get(&key).is_array() {
            return Err(self.error_at(ErrorKind::DuplicatedItem, &token));
        }

        let mut table = Value::make_table();
        loop {
            let current = self.current;
            match current.ttype {
                TokenType::End | TokenType::OpenedSquare => break,
                TokenType::Text(_) | TokenType::Quoted(_) => {
                    self.parse_statement(&mut table)?;
                    self.expect_end_of_line()?;
                }
                TokenType::UnclosedString => {
                    return Err(self.error_at(ErrorKind::UnclosedString, &current));
                }
                _ => return Err(self.error_at(ErrorKind::ExpectedSectionOrParameter, &current)),
            }
        }

        if !section.contains(&key) && section.insert(key.clone(), Value::make_array()).is_none() {
            return Err(self.error_at(ErrorKind::NotEnoughMemory, &token));
        }
        let appended = section
            .get_mut(&key)
            .is_some_and(|list| list.append(table));
        if !appended {
            return Err(self.error_at(ErrorKind::NotEnoughMemory, &token));
        }
        trace!("appended table to [[{key}]] ({} entries)", section.get(&key).size());
        Ok(())
    }

    /// Statement ::= Identifier "=" Value
    fn parse_statement(&mut self, table: &mut Value<'a>) -> Result<(), ParseError> {
        let key_token = self.current;
        let key = match key_token.ttype {
            TokenType::Text(text) if is_identifier(text) => text,
            TokenType::Text(text) => {
                let len = identifier_len(text);
                // The name stops at the first byte it cannot hold; `=` must come next.
                if len > 0 {
                    return Err(self.error_at_offset(
                        ErrorKind::ExpectedEqualSign,
                        key_token.pos_start + len,
                        0,
                    ));
                }
                return Err(self.error_at(ErrorKind::InvalidItemName, &key_token));
            }
            TokenType::UnclosedString => {
                return Err(self.error_at(ErrorKind::UnclosedString, &key_token));
            }
            _ => return Err(self.error_at(ErrorKind::InvalidItemName, &key_token)),
        };
        self.advance();

        let equal = self.current;
        if equal.new_line || !self.match_token(TokenType::Equal) {
            return Err(self.error_at(ErrorKind::ExpectedEqualSign, &equal));
        }

        let key = fold_case(key);
        if table.contains(&key) {
            return Err(self.error_at(ErrorKind::DuplicatedItem, &key_token));
        }
        if self.current.new_line {
            return Err(self.error_at_offset(ErrorKind::ExpectedValue, equal.pos_end, 0));
        }

        let value = self.parse_value()?;
        match table.insert(key, value) {
            Some(_) => Ok(()),
            None => Err(self.error_at(ErrorKind::NotEnoughMemory, &key_token)),
        }
    }

    /// Value ::= Scalar | Array | InlineTable
    fn parse_value(&mut self) -> Result<Value<'a>, ParseError> {
        let token = self.current;
        match token.ttype {
            TokenType::OpenedSquare => {
                self.enter_nested(ErrorKind::ExpectedClosingArray, &token)?;
                self.advance();
                let array = self.parse_array();
                self.depth -= 1;
                array
            }
            TokenType::OpenedBrace => {
                self.enter_nested(ErrorKind::ExpectedClosingTable, &token)?;
                self.advance();
                let table = self.parse_inline_table();
                self.depth -= 1;
                table
            }
            TokenType::Text(text) | TokenType::Quoted(text) => {
                self.advance();
                Ok(Value::make_scalar(text))
            }
            TokenType::UnclosedString => Err(self.error_at(ErrorKind::UnclosedString, &token)),
            _ => Err(self.error_at(ErrorKind::ExpectedValue, &token)),
        }
    }

    /// Array ::= "[" [ Value { "," Value } ] "]"
    fn parse_array(&mut self) -> Result<Value<'a>, ParseError> {
        let mut array = Value::make_array();
        if self.match_token(TokenType::ClosedSquare) {
            return Ok(array);
        }

        loop {
            let token = self.current;
            if token.ttype == TokenType::End {
                return Err(self.error_at(ErrorKind::ExpectedClosingArray, &token));
            }
            let value = self.parse_value()?;
            if !array.append(value) {
                return Err(self.error_at(ErrorKind::NotEnoughMemory, &token));
            }

            let token = self.current;
            match token.ttype {
                TokenType::Comma => self.advance(),
                TokenType::ClosedSquare => {
                    self.advance();
                    return Ok(array);
                }
                TokenType::Equal => {
                    return Err(self.error_at(ErrorKind::UnexpectedEqualSign, &token));
                }
                TokenType::End => {
                    return Err(self.error_at(ErrorKind::ExpectedClosingArray, &token));
                }
                _ => return Err(self.error_at(ErrorKind::ExpectedCommaOrClosingArray, &token)),
            }
        }
    }

    /// InlineTable ::= "{" [ Statement { "," Statement } ] "}"
    fn parse_inline_table(&mut self) -> Result<Value<'a>, ParseError> {
        let mut table = Value::make_table();
        if self.match_token(TokenType::ClosedBrace) {
            return Ok(table);
        }

        loop {
            let token = self.current;
            if token.ttype == TokenType::End {
                return Err(self.error_at(ErrorKind::ExpectedClosingTable, &token));
            }
            self.parse_statement(&mut table)?;

            let token = self.current;
            match token.ttype {
                TokenType::Comma => self.advance(),
                TokenType::ClosedBrace => {
                    self.advance();
                    return Ok(table);
                }
                TokenType::Equal => {
                    return Err(self.error_at(ErrorKind::UnexpectedEqualSign, &token));
                }
                TokenType::End => {
                    return Err(self.error_at(ErrorKind::ExpectedClosingTable, &token));
                }
                _ => return Err(self.error_at(ErrorKind::ExpectedCommaOrClosingTable, &token)),
            }
        }
    }

    // Past the limit the container is reported as never closed.
    fn enter_nested(&mut self, kind: ErrorKind, open: &Token<'a>) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at(kind, open));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_end_of_line(&mut self) -> Result<(), ParseError> {
        if self.at_end_of_line() {
            return Ok(());
        }
        let token = self.current;
        let kind = match token.ttype {
            TokenType::Equal => ErrorKind::UnexpectedEqualSign,
            _ => ErrorKind::UnexpectedCharsAfterValue,
        };
        Err(self.error_at(kind, &token))
    }

    // === Tokenizer Helper Methods ===

    fn at_end_of_line(&self) -> bool {
        self.current.ttype == TokenType::End || self.current.new_line
    }

    fn advance(&mut self) {
        if self.current.ttype != TokenType::End {
            self.current = self.lexer.next_token();
        }
    }

    fn match_token(&mut self, ttype: TokenType<'a>) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType<'a>) -> bool {
        mem::discriminant(&self.current.ttype) == mem::discriminant(&ttype)
    }

    fn error_at(&self, kind: ErrorKind, token: &Token<'a>) -> ParseError {
        self.error_at_offset(kind, token.pos_start, token.pos_end - token.pos_start)
    }

    fn error_at_offset(&self, kind: ErrorKind, offset: usize, len: usize) -> ParseError {
        ParseError::new(kind, &self.name, self.source, offset, len)
    }
}
