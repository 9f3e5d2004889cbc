//! Round-trip properties of the front end.

use veld_base::Interner;
use veld_language::printer::{canonical, source};
use veld_language::token::TokenKind;
use veld_language::{filter_tokens, lex, parse, ErrorLog};

/// Lexing, printing the lexemes back out and lexing again reproduces the
/// token stream — whitespace, newlines and comments aside.
#[test]
fn token_streams_survive_printing() {
    let programs = [
        "val foo :mut int = 42; foo = 77; foo",
        "fun fact: (x:int) int = if x==0: 1 else x*fact(x-1) $; fact(5)",
        "op+(1, 2, 3); 'a'; 2.5; 0bool; true && false",
        "while x<3: x = x+1 end",
    ];
    for program in programs {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = lex(program, &mut interner, &mut log).expect("lexes");

        let printed = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| &program[t.span.start..t.span.end])
            .collect::<Vec<_>>()
            .join(" ");

        let mut log2 = ErrorLog::new();
        let relexed = lex(&printed, &mut interner, &mut log2).expect("printed text lexes");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        let rekinds: Vec<_> = relexed.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, rekinds, "token round trip differs for {program:?}");
    }
}

/// Parsing, printing as surface syntax and re-parsing yields an identical
/// tree.
#[test]
fn parsed_trees_survive_surface_printing() {
    let programs = [
        "42",
        "42 + 77",
        "val x :mut int = 0; while x<3: x = x+1 $; x",
        "fun fact: (x:int) int = if x==0: 1 else x*fact(x-1) $; fact(5)",
        "val g :static mut int = 5; g = g + 1; g",
        "val x :int = 5; *&x",
        "int(true); 0",
    ];
    for program in programs {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = filter_tokens(lex(program, &mut interner, &mut log).expect("lexes"));
        let ast = parse(&tokens, &mut log).expect("parses");

        let printed = source(&ast, &interner);
        let mut log2 = ErrorLog::new();
        let tokens2 = filter_tokens(lex(&printed, &mut interner, &mut log2).expect("lexes"));
        let reparsed = parse(&tokens2, &mut log2)
            .unwrap_or_else(|_| panic!("printed source must reparse: {printed:?}"));

        assert_eq!(
            canonical(&ast, &interner),
            canonical(&reparsed, &interner),
            "surface round trip differs for {program:?} via {printed:?}"
        );
    }
}
