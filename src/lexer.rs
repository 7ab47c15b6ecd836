//! Lexer for JavaScript (and the TypeScript surface syntax the parser strips)
//!
//! The lexer runs ahead of the parser and produces the whole token stream at
//! once. Template substitutions are tracked with a brace stack so a `}` that
//! closes `${ ... }` resumes template scanning without parser feedback.
//! Regular expression literals are not supported: `/` always lexes as
//! division.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::JsError;
use crate::string_dict::StringDict;
use crate::value::JsString;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering `self` through `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// One literal chunk of a template: the cooked value (absent when the chunk
/// holds an invalid escape, which only tagged templates tolerate) and the raw
/// source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    pub cooked: Option<JsString>,
    pub raw: JsString,
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(JsString),
    True,
    False,
    Null,

    // Identifiers, including contextual keywords (`async`, `of`, `get`,
    // `static`, `yield`, `await`, TypeScript modifiers, ...)
    Identifier(JsString),

    // Reserved words
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Operators
    Plus,             // +
    Minus,            // -
    Star,             // *
    Slash,            // /
    Percent,          // %
    StarStar,         // **
    PlusPlus,         // ++
    MinusMinus,       // --
    Eq,               // =
    EqEq,             // ==
    EqEqEq,           // ===
    BangEq,           // !=
    BangEqEq,         // !==
    Lt,               // <
    LtEq,             // <=
    Gt,               // >
    GtEq,             // >=
    LtLt,             // <<
    GtGt,             // >>
    GtGtGt,           // >>>
    Amp,              // &
    AmpAmp,           // &&
    Pipe,             // |
    PipePipe,         // ||
    Caret,            // ^
    Tilde,            // ~
    Bang,             // !
    Question,         // ?
    QuestionQuestion, // ??
    QuestionDot,      // ?.

    // Assignment Operators
    PlusEq,             // +=
    MinusEq,            // -=
    StarEq,             // *=
    SlashEq,            // /=
    PercentEq,          // %=
    StarStarEq,         // **=
    AmpEq,              // &=
    PipeEq,             // |=
    CaretEq,            // ^=
    LtLtEq,             // <<=
    GtGtEq,             // >>=
    GtGtGtEq,           // >>>=
    AmpAmpEq,           // &&=
    PipePipeEq,         // ||=
    QuestionQuestionEq, // ??=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    DotDotDot, // ...
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Arrow,     // =>
    At,        // @
    Hash,      // #

    // Template literals
    TemplateNoSub(TemplatePart),  // `...` (no substitutions)
    TemplateHead(TemplatePart),   // `...${
    TemplateMiddle(TemplatePart), // }...${
    TemplateTail(TemplatePart),   // }...`

    // Special
    Eof,
    Invalid(char),
    Error(&'static str),
}

impl TokenKind {
    /// Source text of a reserved word or literal keyword, for positions where
    /// any IdentifierName is allowed (`a.default`, `{ if: 1 }`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Enum => "enum",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::Let => "let",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            _ => return None,
        })
    }
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator appeared between the previous token and this one.
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceKind {
    Block,
    Template,
}

/// Lexer over one source text
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Tracks if we just saw a newline (for ASI)
    saw_newline: bool,
    braces: Vec<BraceKind>,
    /// String dictionary for interning identifiers and strings
    string_dict: &'a mut StringDict,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
            braces: Vec::new(),
            string_dict,
        }
    }

    /// Lex the whole source. Invalid characters and malformed literals are
    /// reported as syntax errors at their position.
    pub fn tokenize(mut self) -> Result<Vec<Token>, JsError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            match &token.kind {
                TokenKind::Eof => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                TokenKind::Invalid(c) => {
                    return Err(JsError::syntax_error(
                        format!("Invalid or unexpected token '{}'", c),
                        token.span.line,
                        token.span.column,
                    ));
                }
                TokenKind::Error(message) => {
                    return Err(JsError::syntax_error(
                        *message,
                        token.span.line,
                        token.span.column,
                    ));
                }
                _ => tokens.push(token),
            }
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let newline_before = self.saw_newline;

        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(self.current_pos, self.current_pos, self.line, self.column),
                newline_before,
            );
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => {
                self.braces.push(BraceKind::Block);
                TokenKind::LBrace
            }
            '}' => match self.braces.pop() {
                Some(BraceKind::Template) => self.scan_template(false),
                _ => TokenKind::RBrace,
            },
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            '#' => TokenKind::Hash,
            ':' => TokenKind::Colon,

            '.' => self.scan_dot(),
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_star(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),
            '^' => self.scan_caret(),
            '?' => self.scan_question(),

            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(true),
            '0'..='9' => self.scan_number(ch),

            c if is_id_start(c) => self.scan_identifier(c),
            c => TokenKind::Invalid(c),
        };

        Token::new(kind, self.make_span(), newline_before)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
            // ECMAScript line terminators: LF, LS (U+2028), PS (U+2029)
            if ch == '\n' || ch == '\u{2028}' || ch == '\u{2029}' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn skip_whitespace_and_comments(&mut self) {
        self.saw_newline = false;

        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}') => {
                    self.advance();
                }
                Some(c) if c != '\n' && c.is_whitespace() && !is_line_terminator(c) => {
                    self.advance();
                }
                Some('\n' | '\u{2028}' | '\u{2029}') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some('/') => {
                    let next = self.peek_next();
                    if next == Some('/') {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    } else if next == Some('*') {
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some((_, '*')) if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some((_, c)) if is_line_terminator(c) => {
                                    self.saw_newline = true;
                                }
                                Some(_) => {}
                                None => break,
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            TokenKind::DotDotDot
        } else if matches!(self.peek(), Some('0'..='9')) {
            self.scan_number('.')
        } else {
            TokenKind::Dot
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.match_char('+') {
            TokenKind::PlusPlus
        } else if self.match_char('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.match_char('-') {
            TokenKind::MinusMinus
        } else if self.match_char('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.match_char('*') {
            if self.match_char('=') {
                TokenKind::StarStarEq
            } else {
                TokenKind::StarStar
            }
        } else if self.match_char('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else if self.match_char('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.match_char('&') {
            if self.match_char('=') {
                TokenKind::AmpAmpEq
            } else {
                TokenKind::AmpAmp
            }
        } else if self.match_char('=') {
            TokenKind::AmpEq
        } else {
            TokenKind::Amp
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.match_char('|') {
            if self.match_char('=') {
                TokenKind::PipePipeEq
            } else {
                TokenKind::PipePipe
            }
        } else if self.match_char('=') {
            TokenKind::PipeEq
        } else {
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        if self.match_char('?') {
            if self.match_char('=') {
                TokenKind::QuestionQuestionEq
            } else {
                TokenKind::QuestionQuestion
            }
        } else if self.peek() == Some('.') && !matches!(self.peek_next(), Some('0'..='9')) {
            // `a?.5:b` is a conditional, not an optional chain
            self.advance();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        }
    }

    /// Scan the escape after a backslash into `out`. Returns false for
    /// escapes that are invalid in templates (legacy octal, malformed
    /// hex/unicode); string literals accept legacy octal.
    fn scan_escape(&mut self, out: &mut String, in_template: bool) -> bool {
        match self.advance() {
            Some((_, 'n')) => out.push('\n'),
            Some((_, 'r')) => out.push('\r'),
            Some((_, 't')) => out.push('\t'),
            Some((_, 'b')) => out.push('\x08'),
            Some((_, 'f')) => out.push('\x0C'),
            Some((_, 'v')) => out.push('\x0B'),
            Some((_, '0')) if !matches!(self.peek(), Some('0'..='9')) => out.push('\0'),
            Some((_, c @ '0'..='7')) => {
                if in_template {
                    return false;
                }
                let mut code = c.to_digit(8).unwrap_or(0);
                let max_len = if c <= '3' { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.advance();
                            len += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            Some((_, '8' | '9')) if in_template => return false,
            Some((_, 'x')) => match self.scan_hex_digits(2) {
                Some(code) => out.push(char::from_u32(code).unwrap_or('\u{FFFD}')),
                None => return false,
            },
            Some((_, 'u')) => match self.scan_unicode_escape() {
                Some(ch) => out.push(ch),
                None => return false,
            },
            Some((_, '\r')) => {
                self.match_char('\n');
            }
            Some((_, '\n' | '\u{2028}' | '\u{2029}')) => {}
            Some((_, c)) => out.push(c),
            None => return false,
        }
        true
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        if self.match_char('{') {
            let mut code: u32 = 0;
            let mut digits = 0;
            while let Some(ch) = self.peek() {
                if ch == '}' {
                    break;
                }
                let d = ch.to_digit(16)?;
                code = code.checked_mul(16)?.checked_add(d)?;
                digits += 1;
                self.advance();
            }
            if digits == 0 || !self.match_char('}') || code > 0x10FFFF {
                return None;
            }
            return Some(char::from_u32(code).unwrap_or('\u{FFFD}'));
        }
        let high = self.scan_hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) {
            // Surrogate pair written as two escapes
            let rest = self.source.get(self.current_pos..).unwrap_or("");
            if rest.starts_with("\\u") {
                let low = rest
                    .get(2..6)
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .filter(|low| (0xDC00..0xE000).contains(low));
                if let Some(low) = low {
                    for _ in 0..6 {
                        self.advance();
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(code);
                }
            }
        }
        Some(char::from_u32(high).unwrap_or('\u{FFFD}'))
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let d = self.peek()?.to_digit(16)?;
            self.advance();
            value = value * 16 + d;
        }
        Some(value)
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => {
                    if !self.scan_escape(&mut value, false) {
                        return TokenKind::Error("Invalid escape sequence");
                    }
                }
                Some((_, '\n' | '\r')) | None => {
                    return TokenKind::Error("Unterminated string literal");
                }
                Some((_, c)) => value.push(c),
            }
        }

        TokenKind::String(self.string_dict.get_or_insert(&value))
    }

    /// Scan a template chunk. `opening` is true after a backtick and false
    /// after the `}` closing a substitution.
    fn scan_template(&mut self, opening: bool) -> TokenKind {
        let mut cooked = String::new();
        let mut raw = String::new();
        let mut valid = true;

        loop {
            match self.advance() {
                Some((_, '`')) => {
                    let part = self.template_part(valid, &cooked, &raw);
                    return if opening {
                        TokenKind::TemplateNoSub(part)
                    } else {
                        TokenKind::TemplateTail(part)
                    };
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    self.braces.push(BraceKind::Template);
                    let part = self.template_part(valid, &cooked, &raw);
                    return if opening {
                        TokenKind::TemplateHead(part)
                    } else {
                        TokenKind::TemplateMiddle(part)
                    };
                }
                Some((start, '\\')) => {
                    if !self.scan_escape(&mut cooked, true) {
                        valid = false;
                    }
                    let text = self.source.get(start..self.current_pos).unwrap_or("");
                    raw.push_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                }
                Some((_, '\r')) => {
                    // CR and CRLF are normalized to LF in both values
                    self.match_char('\n');
                    cooked.push('\n');
                    raw.push('\n');
                }
                Some((_, c)) => {
                    cooked.push(c);
                    raw.push(c);
                }
                None => return TokenKind::Error("Unterminated template literal"),
            }
        }
    }

    fn template_part(&mut self, valid: bool, cooked: &str, raw: &str) -> TemplatePart {
        TemplatePart {
            cooked: valid.then(|| self.string_dict.get_or_insert(cooked)),
            raw: self.string_dict.get_or_insert(raw),
        }
    }

    fn scan_radix_digits(&mut self, radix: u32) -> TokenKind {
        let mut value = 0f64;
        let mut digits = 0;
        while let Some(ch) = self.peek() {
            if ch == '_' {
                self.advance();
                continue;
            }
            match ch.to_digit(radix) {
                Some(d) => {
                    value = value * f64::from(radix) + f64::from(d);
                    digits += 1;
                    self.advance();
                }
                None => break,
            }
        }
        if digits == 0 {
            return TokenKind::Error("Invalid number literal");
        }
        if self.peek() == Some('n') {
            return TokenKind::Error("BigInt literals are not supported");
        }
        TokenKind::Number(value)
    }

    fn scan_decimal_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut num_str = String::new();

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    self.advance();
                    return self.scan_radix_digits(16);
                }
                Some('o' | 'O') => {
                    self.advance();
                    return self.scan_radix_digits(8);
                }
                Some('b' | 'B') => {
                    self.advance();
                    return self.scan_radix_digits(2);
                }
                Some('0'..='9') => {
                    // Legacy octal (0777) or noctal decimal (089)
                    let mut digits = String::new();
                    self.scan_decimal_digits(&mut digits);
                    if digits.chars().all(|c| c.is_digit(8)) {
                        let value = digits
                            .chars()
                            .fold(0f64, |acc, c| acc * 8.0 + f64::from(c.to_digit(8).unwrap_or(0)));
                        return TokenKind::Number(value);
                    }
                    num_str.push_str(&digits);
                }
                _ => num_str.push('0'),
            }
        } else if first == '.' {
            num_str.push_str("0.");
            self.scan_decimal_digits(&mut num_str);
        } else {
            num_str.push(first);
        }

        if first != '.' {
            self.scan_decimal_digits(&mut num_str);
            if self.peek() == Some('.') {
                self.advance();
                num_str.push('.');
                self.scan_decimal_digits(&mut num_str);
            }
        }

        if self.peek() == Some('n') {
            return TokenKind::Error("BigInt literals are not supported");
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            num_str.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.advance();
                num_str.push(sign);
            }
            let before = num_str.len();
            self.scan_decimal_digits(&mut num_str);
            if num_str.len() == before {
                return TokenKind::Error("Invalid number literal");
            }
        }

        if matches!(self.peek(), Some(c) if is_id_start(c)) {
            return TokenKind::Error("Identifier starts immediately after numeric literal");
        }

        let text = num_str.strip_suffix('.').unwrap_or(&num_str);
        TokenKind::Number(text.parse().unwrap_or(f64::NAN))
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,

            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "debugger" => TokenKind::Debugger,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "enum" => TokenKind::Enum,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "let" => TokenKind::Let,
            "new" => TokenKind::New,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,

            _ => TokenKind::Identifier(self.string_dict.get_or_insert(&name)),
        }
    }
}

/// Lex a complete source text.
pub fn tokenize(source: &str, string_dict: &mut StringDict) -> Result<Vec<Token>, JsError> {
    Lexer::new(source, string_dict).tokenize()
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if a character can start an identifier
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

/// Check if a character can continue an identifier
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || unicode_ident::is_xid_continue(ch)
}
