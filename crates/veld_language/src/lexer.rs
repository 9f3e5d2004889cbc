//! Hand-written lexer for veld source text.
//!
//! Produces the raw token stream consumed by the [token filter](crate::filter).
//! The lexer handles:
//!
//! - **Keywords and identifiers**: longest-match words; an identifier that
//!   merely contains a keyword (`ifelse`) stays an identifier.
//! - **Word operators**: `and`, `or`, `not` become the same tokens as `&&`,
//!   `||`, `!`.
//! - **Operator-call names**: `op+`, `op==`, `op_and` … become a single
//!   [`TokenKind::OpName`] token.
//! - **Literals**: unsuffixed integers are `int`, a literal with a decimal
//!   point is `double`, `'x'` is `char`, `true`/`false` are `bool` with
//!   value 1/0. A suffix (`0bool`, `65char`) forces the type; an
//!   unrecognized suffix is a lexer error.
//! - **Comments**: `// …`, `#! …` and `/* … */` are consumed here and never
//!   reach the parser.
//!
//! Newlines are emitted as tokens; smoothing them is the filter's job.

use veld_base::{Interner, Span};

use crate::ast::Op;
use crate::diag::{ErrorKind, ErrorLog, PassResult};
use crate::token::{Token, TokenKind};
use crate::types::FundaType;

/// Lexes `source` into a raw token stream ending in [`TokenKind::Eof`].
pub fn lex(source: &str, interner: &mut Interner, log: &mut ErrorLog) -> PassResult<Vec<Token>> {
    Lexer::new(source, interner, log).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: &'a mut Interner,
    log: &'a mut ErrorLog,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, interner: &'a mut Interner, log: &'a mut ErrorLog) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
            log,
        }
    }

    fn run(mut self) -> PassResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, Span::point(self.source.len())));
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> PassResult<Option<Token>> {
        loop {
            let start = self.pos;
            let Some(b) = self.bump() else {
                return Ok(None);
            };
            let kind = match b {
                b' ' | b'\t' | b'\r' => continue,
                b'\n' => TokenKind::Newline,
                b'/' if self.eat(b'/') => {
                    self.skip_to_line_end();
                    continue;
                }
                b'/' if self.eat(b'*') => {
                    self.skip_block_comment(start)?;
                    continue;
                }
                b'#' if self.peek() == Some(b'!') => {
                    self.skip_to_line_end();
                    continue;
                }
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b',' => TokenKind::Comma,
                b';' => TokenKind::Semicolon,
                b'$' => TokenKind::Dollar,
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'*' => TokenKind::Star,
                b'/' => TokenKind::Slash,
                b':' if self.eat(b'=') => TokenKind::RefAssign,
                b':' => TokenKind::Colon,
                b'=' if self.eat(b'=') => TokenKind::EqEq,
                b'=' => TokenKind::Assign,
                b'!' if self.eat(b'=') => TokenKind::NotEq,
                b'!' => TokenKind::Bang,
                b'<' if self.eat(b'=') => TokenKind::LtEq,
                b'<' => TokenKind::Lt,
                b'>' if self.eat(b'=') => TokenKind::GtEq,
                b'>' => TokenKind::Gt,
                b'&' if self.eat(b'&') => TokenKind::AmpAmp,
                b'&' => TokenKind::Amp,
                b'|' if self.eat(b'|') => TokenKind::PipePipe,
                b'\'' => {
                    let token = self.scan_char_literal(start)?;
                    return Ok(Some(token));
                }
                b'0'..=b'9' => {
                    let token = self.scan_number(start)?;
                    return Ok(Some(token));
                }
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                    let token = self.scan_word(start)?;
                    return Ok(Some(token));
                }
                _ => {
                    // step over whole code points so spans stay on char
                    // boundaries even for non-ASCII input
                    let ch = self.source[start..].chars().next().unwrap_or('\u{fffd}');
                    self.pos = start + ch.len_utf8();
                    let span = Span::new(start, self.pos);
                    self.log.report(
                        ErrorKind::Syntax,
                        Some(span),
                        format!("unexpected character `{ch}`"),
                    )?;
                    continue;
                }
            };
            return Ok(Some(Token::new(kind, Span::new(start, self.pos))));
        }
    }

    fn skip_to_line_end(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self, start: usize) -> PassResult<()> {
        loop {
            match self.bump() {
                Some(b'*') if self.eat(b'/') => return Ok(()),
                Some(_) => {}
                None => {
                    return self.log.report(
                        ErrorKind::Syntax,
                        Some(Span::new(start, self.pos)),
                        "unterminated block comment",
                    );
                }
            }
        }
    }

    fn scan_char_literal(&mut self, start: usize) -> PassResult<Token> {
        let value = match self.bump() {
            Some(b'\\') => match self.bump() {
                Some(b'n') => b'\n',
                Some(b't') => b'\t',
                Some(b'r') => b'\r',
                Some(b'0') => 0,
                Some(b'\\') => b'\\',
                Some(b'\'') => b'\'',
                _ => {
                    self.log.report(
                        ErrorKind::Syntax,
                        Some(Span::new(start, self.pos)),
                        "unknown escape in char literal",
                    )?;
                    0
                }
            },
            Some(b) if b != b'\'' && b != b'\n' => b,
            _ => {
                self.log.report(
                    ErrorKind::Syntax,
                    Some(Span::new(start, self.pos)),
                    "empty or unterminated char literal",
                )?;
                0
            }
        };
        if !self.eat(b'\'') {
            self.log.report(
                ErrorKind::Syntax,
                Some(Span::new(start, self.pos)),
                "unterminated char literal",
            )?;
        }
        Ok(Token::new(
            TokenKind::Number {
                value: value as f64,
                ty: FundaType::Char,
            },
            Span::new(start, self.pos),
        ))
    }

    fn scan_number(&mut self, start: usize) -> PassResult<Token> {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let digits_end = self.pos;

        // a trailing word is a type suffix, e.g. `0bool`
        while matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'0'..=b'9')) {
            self.pos += 1;
        }
        let suffix = &self.source[digits_end..self.pos];
        let span = Span::new(start, self.pos);

        let default_ty = if is_float {
            FundaType::Double
        } else {
            FundaType::Int
        };
        let ty = match suffix {
            "" => default_ty,
            "bool" => FundaType::Bool,
            "char" => FundaType::Char,
            "int" => FundaType::Int,
            "double" => FundaType::Double,
            _ => {
                self.log.report(
                    ErrorKind::Syntax,
                    Some(span),
                    format!("unrecognized literal suffix `{suffix}`"),
                )?;
                default_ty
            }
        };

        let text = &self.source[start..digits_end];
        let value: f64 = match text.parse() {
            Ok(v) => v,
            Err(_) => {
                self.log
                    .report(ErrorKind::Syntax, Some(span), "malformed number literal")?;
                0.0
            }
        };
        if !value_in_range(value, ty) {
            self.log.report(
                ErrorKind::Syntax,
                Some(span),
                format!("literal `{text}` out of range for {}", ty.name()),
            )?;
        }

        Ok(Token::new(TokenKind::Number { value, ty }, span))
    }

    fn scan_word(&mut self, start: usize) -> PassResult<Token> {
        while matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];

        // `op` glued to an operator symbol is the operator-call name
        if word == "op" {
            if let Some(op) = self.scan_op_symbol() {
                return Ok(Token::new(TokenKind::OpName(op), Span::new(start, self.pos)));
            }
        }
        if let Some(op) = word_op_name(word) {
            return Ok(Token::new(TokenKind::OpName(op), Span::new(start, self.pos)));
        }

        let kind = match word {
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "fun" => TokenKind::Fun,
            "val" => TokenKind::Val,
            "var" => TokenKind::Var,
            "return" => TokenKind::Return,
            "end" => TokenKind::End,
            "mut" => TokenKind::Mut,
            "static" => TokenKind::Static,
            "noinit" => TokenKind::Noinit,
            "nop" => TokenKind::Nop,
            "not" => TokenKind::Bang,
            "and" => TokenKind::AmpAmp,
            "or" => TokenKind::PipePipe,
            "true" => TokenKind::Number {
                value: 1.0,
                ty: FundaType::Bool,
            },
            "false" => TokenKind::Number {
                value: 0.0,
                ty: FundaType::Bool,
            },
            "void" => TokenKind::Funda(FundaType::Void),
            "noreturn" => TokenKind::Funda(FundaType::Noreturn),
            "infer" => TokenKind::Funda(FundaType::Infer),
            "bool" => TokenKind::Funda(FundaType::Bool),
            "char" => TokenKind::Funda(FundaType::Char),
            "int" => TokenKind::Funda(FundaType::Int),
            "double" => TokenKind::Funda(FundaType::Double),
            _ => TokenKind::Ident(self.interner.intern(word)),
        };
        Ok(Token::new(kind, Span::new(start, self.pos)))
    }

    /// Consumes the symbol part of an `op…` name, longest match first.
    fn scan_op_symbol(&mut self) -> Option<Op> {
        let two = [self.peek()?, self.peek_at(1).unwrap_or(0)];
        let (op, len) = match &two {
            b"&&" => (Op::And, 2),
            b"||" => (Op::Or, 2),
            b"==" => (Op::EqualTo, 2),
            b"!=" => (Op::NotEqualTo, 2),
            b"<=" => (Op::LessEq, 2),
            b">=" => (Op::GreaterEq, 2),
            b":=" => (Op::RefAssign, 2),
            [b'+', _] => (Op::Add, 1),
            [b'-', _] => (Op::Sub, 1),
            [b'*', _] => (Op::Mul, 1),
            [b'/', _] => (Op::Div, 1),
            [b'!', _] => (Op::Not, 1),
            [b'&', _] => (Op::AddrOf, 1),
            [b'<', _] => (Op::Less, 1),
            [b'>', _] => (Op::Greater, 1),
            [b'=', _] => (Op::Assign, 1),
            _ => return None,
        };
        self.pos += len;
        Some(op)
    }
}

fn word_op_name(word: &str) -> Option<Op> {
    match word {
        "op_and" => Some(Op::And),
        "op_or" => Some(Op::Or),
        "op_not" => Some(Op::Not),
        _ => None,
    }
}

fn value_in_range(value: f64, ty: FundaType) -> bool {
    match ty {
        FundaType::Bool => value == 0.0 || value == 1.0,
        FundaType::Char => value.fract() == 0.0 && (0.0..=255.0).contains(&value),
        FundaType::Int => value.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&value),
        _ => true,
    }
}
