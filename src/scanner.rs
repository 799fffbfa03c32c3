use std::{collections::HashMap, str::Chars};

/// Scans PHP-JS source left to right, yielding tokens in source order and a
/// single EOF sentinel at the end. Lexing never fails: unknown characters,
/// lone `&`/`|`, and unterminated strings or block comments are dropped.
pub struct Scanner<'a> {
    chars: Chars<'a>,
    line: u32,
    eof_emitted: bool,
    keywords: HashMap<String, TokenKind>,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;
    fn next(&mut self) -> Option<Self::Item> {
        self.scan_token()
    }
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let keywords: HashMap<String, TokenKind> = HashMap::from_iter([
            ("if".into(), TokenKind::If),
            ("else".into(), TokenKind::Else),
            ("elseif".into(), TokenKind::Elseif),
            ("for".into(), TokenKind::For),
            ("foreach".into(), TokenKind::Foreach),
            ("while".into(), TokenKind::While),
            ("do".into(), TokenKind::Do),
            ("switch".into(), TokenKind::Switch),
            ("case".into(), TokenKind::Case),
            ("default".into(), TokenKind::Default),
            ("break".into(), TokenKind::Break),
            ("continue".into(), TokenKind::Continue),
            ("return".into(), TokenKind::Return),
            ("echo".into(), TokenKind::Echo),
            ("function".into(), TokenKind::Function),
            ("as".into(), TokenKind::As),
            ("include".into(), TokenKind::Include),
            ("require".into(), TokenKind::Require),
            ("var".into(), TokenKind::Var),
            ("const".into(), TokenKind::Const),
            ("let".into(), TokenKind::Let),
            ("true".into(), TokenKind::True),
            ("false".into(), TokenKind::False),
            ("null".into(), TokenKind::Null),
        ]);

        Self {
            chars: source.chars(),
            line: 1,
            eof_emitted: false,
            keywords,
        }
    }

    fn scan_token(&mut self) -> Option<Token> {
        loop {
            let c = match self.advance() {
                Some(c) => c,
                None => {
                    if self.eof_emitted {
                        return None;
                    }
                    self.eof_emitted = true;
                    return Some(self.create_token(TokenKind::Eof, ""));
                }
            };

            let token = match c {
                ' ' | '\t' | '\r' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '(' => self.create_token(TokenKind::LeftParen, c),
                ')' => self.create_token(TokenKind::RightParen, c),
                '{' => self.create_token(TokenKind::LeftBrace, c),
                '}' => self.create_token(TokenKind::RightBrace, c),
                '[' => self.create_token(TokenKind::LeftBracket, c),
                ']' => self.create_token(TokenKind::RightBracket, c),
                ',' => self.create_token(TokenKind::Comma, c),
                ';' => self.create_token(TokenKind::Semicolon, c),
                '.' => {
                    if self.match_next('=') {
                        self.create_token(TokenKind::DotEqual, ".=")
                    } else {
                        self.create_token(TokenKind::Dot, c)
                    }
                }
                '+' => {
                    if self.match_next('+') {
                        self.create_token(TokenKind::PlusPlus, "++")
                    } else if self.match_next('=') {
                        self.create_token(TokenKind::PlusEqual, "+=")
                    } else {
                        self.create_token(TokenKind::Plus, c)
                    }
                }
                '-' => {
                    if self.match_next('-') {
                        self.create_token(TokenKind::MinusMinus, "--")
                    } else if self.match_next('=') {
                        self.create_token(TokenKind::MinusEqual, "-=")
                    } else {
                        self.create_token(TokenKind::Minus, c)
                    }
                }
                '*' => {
                    if self.match_next('*') {
                        self.create_token(TokenKind::StarStar, "**")
                    } else if self.match_next('=') {
                        self.create_token(TokenKind::StarEqual, "*=")
                    } else {
                        self.create_token(TokenKind::Star, c)
                    }
                }
                '%' => {
                    if self.match_next('=') {
                        self.create_token(TokenKind::PercentEqual, "%=")
                    } else {
                        self.create_token(TokenKind::Percent, c)
                    }
                }
                '=' => {
                    if self.match_next('=') {
                        if self.match_next('=') {
                            self.create_token(TokenKind::EqualEqualEqual, "===")
                        } else {
                            self.create_token(TokenKind::EqualEqual, "==")
                        }
                    } else {
                        self.create_token(TokenKind::Equal, c)
                    }
                }
                '!' => {
                    if self.match_next('=') {
                        if self.match_next('=') {
                            self.create_token(TokenKind::BangEqualEqual, "!==")
                        } else {
                            self.create_token(TokenKind::BangEqual, "!=")
                        }
                    } else {
                        self.create_token(TokenKind::Bang, c)
                    }
                }
                '<' => {
                    if self.match_next('=') {
                        self.create_token(TokenKind::LessEqual, "<=")
                    } else {
                        self.create_token(TokenKind::Less, c)
                    }
                }
                '>' => {
                    if self.match_next('=') {
                        self.create_token(TokenKind::GreaterEqual, ">=")
                    } else {
                        self.create_token(TokenKind::Greater, c)
                    }
                }
                '&' => {
                    if self.match_next('&') {
                        self.create_token(TokenKind::And, "&&")
                    } else {
                        continue;
                    }
                }
                '|' => {
                    if self.match_next('|') {
                        self.create_token(TokenKind::Or, "||")
                    } else {
                        continue;
                    }
                }
                '/' => {
                    if self.match_next('/') {
                        self.line_comment();
                        continue;
                    } else if self.match_next('*') {
                        self.block_comment();
                        continue;
                    } else if self.match_next('=') {
                        self.create_token(TokenKind::SlashEqual, "/=")
                    } else {
                        self.create_token(TokenKind::Slash, c)
                    }
                }
                '"' | '\'' => match self.string(c) {
                    Some(token) => token,
                    // unterminated string at end of input: no token
                    None => continue,
                },
                '$' => self.variable(),
                '0'..='9' => self.number(c),
                c if Self::is_alpha(c) => self.identifier(c),
                // anything else is dropped
                _ => continue,
            };

            return Some(token);
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek_first() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn block_comment(&mut self) {
        // unterminated comments are accepted at end of input
        while let Some(c) = self.advance() {
            match c {
                '\n' => self.line += 1,
                '*' if self.peek_first() == Some('/') => {
                    self.advance();
                    break;
                }
                _ => {}
            }
        }
    }

    /// Scans a string body after the opening quote. A backslash directly
    /// before the matching quote keeps the scan going; both characters stay
    /// in the raw payload. Returns None when the input ends unterminated.
    fn string(&mut self, quote: char) -> Option<Token> {
        let mut body = String::new();
        loop {
            match self.peek_first() {
                None => return None,
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') if self.peek_second() == Some(quote) => {
                    body.push('\\');
                    self.advance();
                    body.push(quote);
                    self.advance();
                }
                Some('\n') => {
                    self.line += 1;
                    body.push('\n');
                    self.advance();
                }
                Some(c) => {
                    body.push(c);
                    self.advance();
                }
            }
        }

        let mut lexeme = String::with_capacity(body.len() + 2);
        lexeme.push(quote);
        lexeme.push_str(&body);
        lexeme.push(quote);
        Some(self.literal_token(TokenKind::String, lexeme, Literal::Text(body)))
    }

    fn variable(&mut self) -> Token {
        let mut name = String::from('$');
        while let Some(c) = self.peek_first() {
            if Self::is_alphanumeric(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.literal_token(TokenKind::Variable, name.clone(), Literal::Text(name))
    }

    fn number(&mut self, first: char) -> Token {
        let mut number = String::from(first);
        while let Some(c @ '0'..='9') = self.peek_first() {
            number.push(c);
            self.advance();
        }

        if self.peek_first() == Some('.') {
            if let Some('0'..='9') = self.peek_second() {
                number.push('.');
                self.advance();
                while let Some(c @ '0'..='9') = self.peek_first() {
                    number.push(c);
                    self.advance();
                }
            }
        }

        let value = number.parse().expect("lexeme contains only digits");
        self.literal_token(TokenKind::Number, number, Literal::Number(value))
    }

    fn identifier(&mut self, first: char) -> Token {
        let mut name = String::from(first);
        while let Some(c) = self.peek_first() {
            if Self::is_alphanumeric(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(kind) = self.keywords.get(name.as_str()) {
            self.create_token(*kind, name)
        } else {
            self.literal_token(TokenKind::Identifier, name.clone(), Literal::Text(name))
        }
    }

    fn is_alpha(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_alphanumeric(c: char) -> bool {
        Self::is_alpha(c) || c.is_ascii_digit()
    }

    fn create_token<T: Into<String>>(&self, kind: TokenKind, lexeme: T) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal: None,
            line: self.line,
        }
    }

    fn literal_token(&self, kind: TokenKind, lexeme: String, literal: Literal) -> Token {
        Token {
            kind,
            lexeme,
            literal: Some(literal),
            line: self.line,
        }
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek_first() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_first(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    StarStar,
    Dot,

    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    DotEqual,

    // Equality and relational
    EqualEqual,
    EqualEqualEqual,
    Bang,
    BangEqual,
    BangEqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Logical
    And,
    Or,

    // Literals
    Identifier,
    Variable,
    String,
    Number,

    // Keywords
    If,
    Else,
    Elseif,
    For,
    Foreach,
    While,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Echo,
    Function,
    As,
    Include,
    Require,
    Var,
    Const,
    Let,
    True,
    False,
    Null,

    Eof,
}
