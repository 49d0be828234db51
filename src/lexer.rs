/// Represents the different kinds of tokens that the lexer can produce.
/// Text-carrying variants borrow directly from the source buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType<'a> {
    // == Special Tokens ==
    /// Represents the end of the input.
    End,
    /// A quoted literal whose closing quote is missing before the end of the line.
    UnclosedString,

    // == Literals ==
    /// An unquoted run of text. Internal spaces are kept, trailing ones are not.
    /// Examples: `server`, `foo bar`, `0xFF`.
    Text(&'a str),
    /// The content of a `"..."` or `'...'` literal, without the quotes.
    Quoted(&'a str),

    // == Punctuation ==
    /// Left Bracket: `[`
    OpenedSquare,
    /// Right Bracket: `]`
    ClosedSquare,
    /// Left Brace: `{`
    OpenedBrace,
    /// Right Brace: `}`
    ClosedBrace,
    /// Equals: `=`
    Equal,
    /// Comma: `,`
    Comma,
}

/// A token with its type and position
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub ttype: TokenType<'a>,
    pub pos_start: usize,
    pub pos_end: usize,
    /// 1-based line the token starts on.
    pub line: usize,
    /// Set when a line break separates this token from the previous one.
    pub new_line: bool,
}

impl<'a> Token<'a> {
    pub fn new(ttype: TokenType<'a>, pos_start: usize, pos_end: usize, line: usize) -> Token<'a> {
        Token {
            ttype,
            pos_start,
            pos_end,
            line,
            new_line: false,
        }
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Checks the start of a raw buffer for a byte order mark.
///
/// Returns the number of bytes to skip (3 for a UTF-8 BOM, 0 otherwise) or
/// `None` when the buffer starts with a UTF-16/UTF-32 mark (`0xFE`, `0xFF`).
pub fn scan_byte_order_mark(bytes: &[u8]) -> Option<usize> {
    match bytes.first() {
        Some(0xFE | 0xFF) => None,
        _ if bytes.starts_with(UTF8_BOM) => Some(UTF8_BOM.len()),
        _ => Some(0),
    }
}

/// Produces tokens on demand from a borrowed source buffer.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    previous_line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let position = scan_byte_order_mark(input.as_bytes()).unwrap_or(0);
        Self {
            input,
            position,
            line: 1,
            previous_line: 0,
        }
    }

    /// Current 1-based line of the cursor.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Lexes the remaining input, `End` included.
    pub fn lex(&mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.ttype == TokenType::End;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace_and_comments();
        let start_pos = self.position;
        let line = self.line;

        let ttype = match self.peek() {
            None => TokenType::End,
            Some(b'[') => self.single(TokenType::OpenedSquare),
            Some(b']') => self.single(TokenType::ClosedSquare),
            Some(b'{') => self.single(TokenType::OpenedBrace),
            Some(b'}') => self.single(TokenType::ClosedBrace),
            Some(b'=') => self.single(TokenType::Equal),
            Some(b',') => self.single(TokenType::Comma),
            Some(quote @ (b'"' | b'\'')) => self.read_quoted(quote),
            Some(_) => self.read_text(),
        };

        let mut token = Token::new(ttype, start_pos, self.position, line);
        token.new_line = line != self.previous_line;
        self.previous_line = line;
        token
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn single(&mut self, ttype: TokenType<'a>) -> TokenType<'a> {
        self.position += 1;
        ttype
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\r' => self.position += 1,
                b'\n' => {
                    self.position += 1;
                    self.line += 1;
                }
                b'#' | b';' => self.skip_comment(),
                _ => break,
            }
        }
    }

    // Stops on the newline so the caller counts it.
    fn skip_comment(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.position += 1;
        }
    }

    fn read_quoted(&mut self, quote: u8) -> TokenType<'a> {
        self.position += 1; // opening quote
        let head = self.position;
        while let Some(byte) = self.peek() {
            match byte {
                b'\r' | b'\n' => break,
                b if b == quote => {
                    let text = &self.input[head..self.position];
                    self.position += 1; // closing quote
                    return TokenType::Quoted(text);
                }
                _ => self.position += 1,
            }
        }
        TokenType::UnclosedString
    }

    fn read_text(&mut self) -> TokenType<'a> {
        let head = self.position;
        let mut tail = head;
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' => self.position += 1,
                b'\r' | b'\n' | b'#' | b';' | b',' | b'[' | b']' | b'{' | b'}' | b'=' => break,
                _ => {
                    self.position += 1;
                    tail = self.position;
                }
            }
        }
        // Trailing blanks are not part of the text.
        self.position = tail;
        TokenType::Text(&self.input[head..tail])
    }
}
