//! Token splitter for expression fragments.
//!
//! [`tokenize`] is a pure function: it recognises lexical shapes and nothing
//! more.  Numeric-looking text stays text, `true` stays an identifier and
//! `AND` is just a word until the evaluator decides what they mean.
//!
//! Recognition order at each position:
//!
//! 1. `"…"` / `'…'` quoted text
//! 2. decimal numbers (`12`, `3.5`)
//! 3. `==` `!=` `<=` `>=`
//! 4. `+` `-` `*` `/` `<` `>`
//! 5. identifiers, optionally followed by a `[index]` subscript
//! 6. `{a, b, c}` brace lists
//! 7. anything else, one character per token

use super::value::Value;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An already-resolved literal: a substituted variable or a folded
    /// parenthesised sub-expression.
    Value(Value),
    /// Contents of a quoted string, quotes removed.
    Quoted(String),
    /// Decimal text, not yet converted.
    Number(String),
    Ident(String),
    /// `name[index]` — `index` is the raw subscript source.
    Indexed { name: String, index: String },
    /// `{…}` — one token list per comma-separated element.
    List(Vec<Vec<Token>>),
    Op(Symbol),
    LParen,
    RParen,
    Other(char),
}

/// Operator symbols recognised by the tokenizer.  Word operators (`AND`,
/// `OR`, `NOT`) arrive as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_quoted(&mut self, quote: char) -> Token {
        let mut s = String::new();
        while let Some(c) = self.advance() {
            if c == quote {
                break;
            }
            s.push(c);
        }
        Token::Quoted(s)
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            s.extend(self.advance());
        }
        if self.peek() == Some('.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            s.extend(self.advance());
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                s.extend(self.advance());
            }
        }
        Token::Number(s)
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut name = String::from(first);
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            name.extend(self.advance());
        }
        if self.eat('[') {
            let index = self.read_balanced('[', ']');
            return Token::Indexed { name, index };
        }
        Token::Ident(name)
    }

    /// Read up to the bracket closing an already-consumed `open`, honouring
    /// nesting and quotes.  An unterminated group takes the rest of the input.
    fn read_balanced(&mut self, open: char, close: char) -> String {
        let mut out = String::new();
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        while let Some(c) = self.advance() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == open => depth += 1,
                None if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                None => {}
            }
            out.push(c);
        }
        out
    }

    fn read_list(&mut self) -> Token {
        let inner = self.read_balanced('{', '}');
        if inner.trim().is_empty() {
            return Token::List(Vec::new());
        }
        Token::List(split_elements(&inner).iter().map(|e| tokenize(e)).collect())
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_ws();
        let ch = self.advance()?;
        let tok = match ch {
            '"' | '\'' => self.read_quoted(ch),
            '0'..='9' => self.read_number(ch),
            '=' if self.eat('=') => Token::Op(Symbol::Eq),
            '!' if self.eat('=') => Token::Op(Symbol::Ne),
            '<' if self.eat('=') => Token::Op(Symbol::Le),
            '>' if self.eat('=') => Token::Op(Symbol::Ge),
            '<' => Token::Op(Symbol::Lt),
            '>' => Token::Op(Symbol::Gt),
            '+' => Token::Op(Symbol::Plus),
            '-' => Token::Op(Symbol::Minus),
            '*' => Token::Op(Symbol::Star),
            '/' => Token::Op(Symbol::Slash),
            c if is_ident_start(c) => self.read_ident(c),
            '{' => self.read_list(),
            '(' => Token::LParen,
            ')' => Token::RParen,
            c => Token::Other(c),
        };
        Some(tok)
    }
}

/// Split a fragment into tokens.
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(t) = lexer.next_token() {
        tokens.push(t);
    }
    tokens
}

/// Split brace-list contents on commas that are not nested or quoted.
fn split_elements(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            },
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ── Tests ─────────────────────────────────────────────────────────────────────
