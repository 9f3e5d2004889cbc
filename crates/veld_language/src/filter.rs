//! Newline smoothing between lexer and parser.
//!
//! veld treats a line break as a sequence separator, but only where one
//! could actually separate two sequence elements. The filter applies five
//! rules to the raw token stream, in this order:
//!
//! 1. Newlines at the start of the stream are dropped.
//! 2. Newlines directly after a *starter* token are dropped.
//! 3. Newlines directly before a *delimiter* token are dropped.
//! 4. Newlines surrounding a *separator* token are dropped.
//! 5. A remaining run of newlines collapses to a single newline, which then
//!    acts as the sequence separator.
//!
//! The classification lives on [`TokenKind::class`](crate::token::TokenKind).

use crate::token::{Token, TokenClass, TokenKind};

/// Applies the five newline rules to a raw token stream.
///
/// The input is expected to end in [`TokenKind::Eof`]; since end-of-file is
/// a delimiter, trailing newlines disappear on their own.
pub fn filter_tokens(input: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(input.len());
    let mut pending_newline: Option<Token> = None;

    for token in input {
        if token.kind == TokenKind::Newline {
            let previous = out.last().map(|t| t.kind.class());
            let dropped = matches!(
                previous,
                None | Some(TokenClass::Starter) | Some(TokenClass::Separator)
            );
            if !dropped && pending_newline.is_none() {
                pending_newline = Some(token);
            }
            continue;
        }

        if let Some(newline) = pending_newline.take() {
            let class = token.kind.class();
            if class != TokenClass::Delimiter && class != TokenClass::Separator {
                out.push(newline);
            }
        }
        out.push(token);
    }

    if let Some(newline) = pending_newline {
        out.push(newline);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_base::{Span, Symbol};

    const NL: TokenKind = TokenKind::Newline;
    const ID: TokenKind = TokenKind::Ident(Symbol::EMPTY);

    fn run(kinds: &[TokenKind]) -> Vec<TokenKind> {
        let tokens = kinds
            .iter()
            .map(|&kind| Token::new(kind, Span::default()))
            .collect();
        filter_tokens(tokens).into_iter().map(|t| t.kind).collect()
    }

    /// Streams are bounded by component tokens so that neither the
    /// start-of-stream rule nor the end-of-file delimiter interferes with
    /// the rule under test.
    fn run_bounded(kinds: &[TokenKind]) -> Vec<TokenKind> {
        let mut input = vec![ID];
        input.extend_from_slice(kinds);
        input.push(ID);
        let output = run(&input);
        assert_eq!(output.first(), Some(&ID));
        assert_eq!(output.last(), Some(&ID));
        output[1..output.len() - 1].to_vec()
    }

    #[test]
    fn stream_without_newlines_passes_through() {
        assert_eq!(run(&[]), vec![]);
        assert_eq!(run(&[ID]), vec![ID]);
        assert_eq!(
            run(&[TokenKind::If, ID, TokenKind::Eof]),
            vec![TokenKind::If, ID, TokenKind::Eof]
        );
    }

    #[test]
    fn leading_newlines_are_dropped() {
        assert_eq!(run(&[NL, ID]), vec![ID]);
        assert_eq!(run(&[NL, NL, NL, ID]), vec![ID]);
    }

    #[test]
    fn newlines_after_a_starter_are_dropped() {
        assert_eq!(run_bounded(&[TokenKind::LParen, NL]), vec![TokenKind::LParen]);
        assert_eq!(
            run_bounded(&[TokenKind::Plus, NL, NL]),
            vec![TokenKind::Plus]
        );
        // border case: starter with no trailing newline
        assert_eq!(run_bounded(&[TokenKind::LParen]), vec![TokenKind::LParen]);
    }

    #[test]
    fn newlines_before_a_delimiter_are_dropped() {
        assert_eq!(run_bounded(&[NL, TokenKind::RParen]), vec![TokenKind::RParen]);
        assert_eq!(
            run_bounded(&[NL, NL, TokenKind::Dollar]),
            vec![TokenKind::Dollar]
        );
    }

    #[test]
    fn newlines_around_a_separator_are_dropped() {
        assert_eq!(run_bounded(&[TokenKind::Comma, NL]), vec![TokenKind::Comma]);
        assert_eq!(run_bounded(&[NL, TokenKind::Comma]), vec![TokenKind::Comma]);
        assert_eq!(
            run_bounded(&[NL, TokenKind::Semicolon, NL, NL]),
            vec![TokenKind::Semicolon]
        );
        assert_eq!(
            run_bounded(&[NL, TokenKind::Else, NL]),
            vec![TokenKind::Else]
        );
    }

    #[test]
    fn surviving_newline_runs_collapse_to_one() {
        assert_eq!(run_bounded(&[NL]), vec![NL]);
        assert_eq!(run_bounded(&[NL, NL]), vec![NL]);
        assert_eq!(run_bounded(&[NL, NL, NL]), vec![NL]);
    }

    #[test]
    fn trailing_newlines_vanish_before_eof() {
        assert_eq!(
            run(&[ID, NL, NL, TokenKind::Eof]),
            vec![ID, TokenKind::Eof]
        );
    }

    #[test]
    fn newline_between_components_separates_a_sequence() {
        assert_eq!(run(&[ID, NL, ID]), vec![ID, NL, ID]);
    }

    #[test]
    fn spans_of_kept_tokens_are_preserved() {
        let tokens = vec![
            Token::new(ID, Span::new(0, 1)),
            Token::new(NL, Span::new(1, 2)),
            Token::new(ID, Span::new(2, 3)),
        ];
        let out = filter_tokens(tokens);
        assert_eq!(out[0].span, Span::new(0, 1));
        assert_eq!(out[1].span, Span::new(1, 2));
        assert_eq!(out[2].span, Span::new(2, 3));
    }
}
