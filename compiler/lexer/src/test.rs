use crate::{
    token::{BareToken::*, Token},
    BareError, Outcome,
};
use span::{span, FileName, SourceMap, Spanned};

fn lex(source: &str) -> Outcome {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    super::lex(&map[file])
}

macro_rules! assert_lex_eq {
    ($source:literal, $tokens:expr $(,)?) => {
        assert_lex_eq!($source, $tokens, Vec::new())
    };
    ($source:literal, $tokens:expr, $errors:expr $(,)?) => {
        assert_eq(lex($source), Outcome { tokens: $tokens, errors: $errors })
    };
}

#[track_caller]
fn assert_eq(actual: Outcome, expected: Outcome) {
    if actual != expected {
        panic!(
            "the output of the lexer does not match the expected one:\n\
             expected: {expected:#?}\n\
             actual: {actual:#?}",
        );
    }
}

#[test]
fn smallest_valid_program() {
    assert_lex_eq!(
        "fn int main() { return 0; }",
        vec![
            Token::new(span(1, 3), Fn),
            Token::new(span(4, 7), Int),
            Token::new(span(8, 12), Word("main".into())),
            Token::new(span(12, 13), OpeningRoundBracket),
            Token::new(span(13, 14), ClosingRoundBracket),
            Token::new(span(15, 16), OpeningCurlyBracket),
            Token::new(span(17, 23), Return),
            Token::new(span(24, 25), NumberLiteral("0".into())),
            Token::new(span(25, 26), Semicolon),
            Token::new(span(27, 28), ClosingCurlyBracket),
            Token::new(span(28, 28), EndOfInput),
        ],
    );
}

#[test]
fn keywords_and_words() {
    assert_lex_eq!(
        "var variable true truth",
        vec![
            Token::new(span(1, 4), Var),
            Token::new(span(5, 13), Word("variable".into())),
            Token::new(span(14, 18), True),
            Token::new(span(19, 24), Word("truth".into())),
            Token::new(span(24, 24), EndOfInput),
        ],
    );
}

#[test]
fn maximal_munch_operators() {
    assert_lex_eq!(
        "a+=b<=c==d!=-e",
        vec![
            Token::new(span(1, 2), Word("a".into())),
            Token::new(span(2, 4), PlusEquals),
            Token::new(span(4, 5), Word("b".into())),
            Token::new(span(5, 7), LessEquals),
            Token::new(span(7, 8), Word("c".into())),
            Token::new(span(8, 10), DoubleEquals),
            Token::new(span(10, 11), Word("d".into())),
            Token::new(span(11, 13), BangEquals),
            Token::new(span(13, 14), Minus),
            Token::new(span(14, 15), Word("e".into())),
            Token::new(span(15, 15), EndOfInput),
        ],
    );
}

#[test]
fn line_comments_are_skipped() {
    assert_lex_eq!(
        "1 // rest of the line\n2",
        vec![
            Token::new(span(1, 2), NumberLiteral("1".into())),
            Token::new(span(23, 24), NumberLiteral("2".into())),
            Token::new(span(24, 24), EndOfInput),
        ],
    );
}

#[test]
fn float_literals() {
    assert_lex_eq!(
        "3.14 1.0",
        vec![
            Token::new(span(1, 5), FloatLiteral("3.14".into())),
            Token::new(span(6, 9), FloatLiteral("1.0".into())),
            Token::new(span(9, 9), EndOfInput),
        ],
    );
}

#[test]
fn trailing_dot_in_number_literal() {
    assert_lex_eq!(
        "3.;",
        vec![
            Token::new(span(1, 3), Error),
            Token::new(span(3, 4), Semicolon),
            Token::new(span(4, 4), EndOfInput),
        ],
        vec![Spanned::new(span(1, 3), BareError::MissingDigitsAfterDecimalPoint)],
    );
}

#[test]
fn second_dot_in_float_literal() {
    assert_lex_eq!(
        "3.14.;",
        vec![
            Token::new(span(1, 6), Error),
            Token::new(span(6, 7), Semicolon),
            Token::new(span(7, 7), EndOfInput),
        ],
        vec![Spanned::new(span(1, 6), BareError::InvalidFloatLiteral)],
    );
}

#[test]
fn lexer_recovers_after_invalid_number_literal() {
    let outcome = lex("var x: int = 3..; var y: int = 42;");

    assert!(!outcome.errors.is_empty());
    assert!(outcome
        .tokens
        .iter()
        .any(|token| token.bare == NumberLiteral("42".into())));
}

#[test]
fn unterminated_text_literal() {
    assert_lex_eq!(
        "\"hello world",
        vec![
            Token::new(span(1, 13), TextLiteral("hello world".into())),
            Token::new(span(13, 13), EndOfInput),
        ],
        vec![Spanned::new(span(1, 13), BareError::UnterminatedTextLiteral)],
    );
}

#[test]
fn escape_sequences_are_cooked() {
    assert_lex_eq!(
        r#""a\tb\n\"c\\""#,
        vec![
            Token::new(span(1, 14), TextLiteral("a\tb\n\"c\\".into())),
            Token::new(span(14, 14), EndOfInput),
        ],
    );
}

#[test]
fn invalid_escape_sequence() {
    assert_lex_eq!(
        r#""hello\kworld""#,
        vec![
            Token::new(span(1, 15), TextLiteral("helloworld".into())),
            Token::new(span(15, 15), EndOfInput),
        ],
        vec![Spanned::new(span(1, 9), BareError::InvalidEscapeSequence('k'))],
    );
}

#[test]
fn lone_ampersand_and_pipe() {
    assert_lex_eq!(
        "a & b | c",
        vec![
            Token::new(span(1, 2), Word("a".into())),
            Token::new(span(3, 4), Error),
            Token::new(span(5, 6), Word("b".into())),
            Token::new(span(7, 8), Error),
            Token::new(span(9, 10), Word("c".into())),
            Token::new(span(10, 10), EndOfInput),
        ],
        vec![
            Spanned::new(span(3, 4), BareError::LoneAmpersand),
            Spanned::new(span(7, 8), BareError::LonePipe),
        ],
    );
}

#[test]
fn unexpected_character() {
    assert_lex_eq!(
        "var x: int = 42; #",
        vec![
            Token::new(span(1, 4), Var),
            Token::new(span(5, 6), Word("x".into())),
            Token::new(span(6, 7), Colon),
            Token::new(span(8, 11), Int),
            Token::new(span(12, 13), Equals),
            Token::new(span(14, 16), NumberLiteral("42".into())),
            Token::new(span(16, 17), Semicolon),
            Token::new(span(18, 19), Error),
            Token::new(span(19, 19), EndOfInput),
        ],
        vec![Spanned::new(span(18, 19), BareError::UnexpectedCharacter('#'))],
    );
}

#[test]
fn lexemes_round_trip() {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), "fn int main() { var x: int = 1 + 2; }");
    let outcome = super::lex(&map[file]);

    for token in &outcome.tokens {
        if token.bare == EndOfInput {
            continue;
        }

        let lexeme = map.snippet(token.span).to_owned();
        let mut roundtrip = SourceMap::default();
        let refile = roundtrip.add_str(FileName::Str("roundtrip"), &lexeme);
        let relexed = super::lex(&roundtrip[refile]);

        assert!(relexed.errors.is_empty());
        assert_eq!(relexed.tokens.len(), 2);
        assert_eq!(relexed.tokens[0].bare, token.bare);
    }
}

#[test]
fn spans_are_lexemes() {
    let source = "fn void f(a: int[3]) { a[0] = 5; }";
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    let outcome = super::lex(&map[file]);

    assert!(outcome.errors.is_empty());

    for token in &outcome.tokens {
        if token.bare == EndOfInput {
            continue;
        }

        let lexeme = map.snippet(token.span);
        assert!(!lexeme.is_empty());
        assert_eq!(lexeme, &source[{
            let local = token.span.local(&map[file]);
            std::ops::Range::from(local)
        }]);
    }
}
