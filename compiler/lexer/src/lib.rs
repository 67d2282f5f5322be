//! The lexical analyzer (lexer).

use diagnostics::{Code, Diagnostic};
use span::{LocalSpan, SourceFile, Spanned};
use std::{iter::Peekable, str::CharIndices};
use token::{parse_keyword, BareToken, Token};
use utility::quoted;
use BareToken::*;

#[cfg(test)]
mod test;
pub mod token;

pub fn lex(file: &SourceFile) -> Outcome {
    Lexer::new(file).lex()
}

#[derive(PartialEq, Eq, Debug)]
pub struct Outcome {
    pub tokens: Vec<Token>,
    pub errors: Vec<Error>,
}

/// The state of the lexer.
struct Lexer<'a> {
    characters: Peekable<CharIndices<'a>>,
    file: &'a SourceFile,
    tokens: Vec<Token>,
    errors: Vec<Error>,
    local_span: LocalSpan,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            characters: file.content().char_indices().peekable(),
            file,
            tokens: Vec::new(),
            errors: Vec::new(),
            local_span: LocalSpan::default(),
        }
    }

    fn lex(mut self) -> Outcome {
        while let Some((index, character)) = self.peek_with_index() {
            self.local_span = LocalSpan::empty(index);

            match character {
                character if character.is_ascii_whitespace() => self.advance(),
                character if is_word_start(character) => self.lex_word(),
                character if character.is_ascii_digit() => self.lex_number_literal(),
                '"' => self.lex_text_literal(),
                '/' => self.lex_slash_or_comment(),
                '+' => self.lex_one_or_two('=', PlusEquals, Plus),
                '-' => self.lex_one_or_two('=', MinusEquals, Minus),
                '*' => self.lex_one_or_two('=', AsteriskEquals, Asterisk),
                '=' => self.lex_one_or_two('=', DoubleEquals, Equals),
                '!' => self.lex_one_or_two('=', BangEquals, Bang),
                '<' => self.lex_one_or_two('=', LessEquals, Less),
                '>' => self.lex_one_or_two('=', GreaterEquals, Greater),
                '&' => self.lex_doubled('&', DoubleAmpersand, BareError::LoneAmpersand),
                '|' => self.lex_doubled('|', DoublePipe, BareError::LonePipe),
                '(' => self.consume(OpeningRoundBracket),
                ')' => self.consume(ClosingRoundBracket),
                '{' => self.consume(OpeningCurlyBracket),
                '}' => self.consume(ClosingCurlyBracket),
                '[' => self.consume(OpeningSquareBracket),
                ']' => self.consume(ClosingSquareBracket),
                ';' => self.consume(Semicolon),
                ':' => self.consume(Colon),
                ',' => self.consume(Comma),
                character => {
                    self.take();
                    self.advance();
                    self.error(BareError::UnexpectedCharacter(character));
                    self.add(Error);
                }
            }
        }

        self.local_span = LocalSpan::empty(self.file.local_span().end);
        self.add(EndOfInput);

        Outcome { tokens: self.tokens, errors: self.errors }
    }

    fn lex_word(&mut self) {
        self.take();
        self.advance();
        self.take_while(is_word_middle);

        match parse_keyword(self.source()) {
            Some(keyword) => self.add(keyword),
            None => self.add(Word(self.source().into())),
        }
    }

    fn lex_number_literal(&mut self) {
        self.take();
        self.advance();
        self.take_while(|character| character.is_ascii_digit());

        if self.peek() != Some('.') {
            self.add(NumberLiteral(self.source().into()));
            return;
        }

        if !self.digit_follows_dot() {
            self.take();
            self.advance();
            self.error(BareError::MissingDigitsAfterDecimalPoint);
            self.add(Error);
            return;
        }

        self.take();
        self.advance();
        self.take_while(|character| character.is_ascii_digit());

        if self.peek() == Some('.') {
            self.take();
            self.advance();
            self.error(BareError::InvalidFloatLiteral);
            self.add(Error);
            return;
        }

        self.add(FloatLiteral(self.source().into()));
    }

    /// Check if the character after the current `.` is a digit.
    fn digit_follows_dot(&self) -> bool {
        let mut characters = self.characters.clone();
        characters.next();
        matches!(characters.next(), Some((_, character)) if character.is_ascii_digit())
    }

    fn lex_text_literal(&mut self) {
        self.take();
        self.advance();

        let mut content = String::new();
        let mut terminated = false;

        while let Some(character) = self.peek() {
            match character {
                '"' => {
                    self.take();
                    self.advance();
                    terminated = true;
                    break;
                }
                '\n' => break,
                '\\' => {
                    self.take();
                    self.advance();

                    match self.peek() {
                        Some(escape @ ('n' | 't' | 'r' | '"' | '\\')) => {
                            content.push(match escape {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                escape => escape,
                            });
                            self.take();
                            self.advance();
                        }
                        Some(escape) => {
                            self.take();
                            self.advance();
                            self.error(BareError::InvalidEscapeSequence(escape));
                        }
                        None => break,
                    }
                }
                character => {
                    content.push(character);
                    self.take();
                    self.advance();
                }
            }
        }

        if !terminated {
            self.error(BareError::UnterminatedTextLiteral);
        }

        self.add(TextLiteral(content.into()));
    }

    fn lex_slash_or_comment(&mut self) {
        self.take();
        self.advance();

        match self.peek() {
            Some('/') => {
                while let Some(character) = self.peek() {
                    if character == '\n' {
                        break;
                    }
                    self.advance();
                }
            }
            Some('=') => {
                self.take();
                self.advance();
                self.add(SlashEquals);
            }
            _ => self.add(Slash),
        }
    }

    fn lex_one_or_two(&mut self, second: char, double: BareToken, single: BareToken) {
        self.take();
        self.advance();

        if self.peek() == Some(second) {
            self.take();
            self.advance();
            self.add(double);
        } else {
            self.add(single);
        }
    }

    fn lex_doubled(&mut self, second: char, double: BareToken, error: BareError) {
        self.take();
        self.advance();

        if self.peek() == Some(second) {
            self.take();
            self.advance();
            self.add(double);
        } else {
            self.error(error);
            self.add(Error);
        }
    }

    fn source(&self) -> &'a str {
        &self.file[self.local_span]
    }

    /// Step to the next character in the input stream.
    fn advance(&mut self) {
        self.characters.next();
    }

    /// Include the current character in the span of the token-to-be-added.
    fn take(&mut self) {
        let (index, character) = self.peek_with_index().unwrap();
        self.local_span.set_end(index + character);
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_with_index().map(|(_, character)| character)
    }

    fn peek_with_index(&mut self) -> Option<(span::LocalByteIndex, char)> {
        self.characters.peek().map(|&(index, character)| (index.try_into().unwrap(), character))
    }

    /// [Take](Self::take) the span of all succeeding characters where the predicate holds.
    fn take_while(&mut self, predicate: fn(char) -> bool) {
        while let Some(character) = self.peek() {
            if !predicate(character) {
                break;
            }
            self.take();
            self.advance();
        }
    }

    /// Add a token with the given kind to the output of the lexer.
    fn add(&mut self, token: BareToken) {
        let span = self.local_span.global(self.file);
        self.tokens.push(Token::new(span, token));
    }

    fn consume(&mut self, token: BareToken) {
        self.take();
        self.advance();
        self.add(token);
    }

    fn error(&mut self, error: BareError) {
        self.errors.push(Spanned::new(self.local_span.global(self.file), error));
    }
}

const fn is_word_start(character: char) -> bool {
    character.is_ascii_alphabetic() || character == '_'
}

const fn is_word_middle(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

pub type Error = Spanned<BareError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BareError {
    UnexpectedCharacter(char),
    UnterminatedTextLiteral,
    InvalidEscapeSequence(char),
    InvalidFloatLiteral,
    MissingDigitsAfterDecimalPoint,
    LoneAmpersand,
    LonePipe,
}

pub trait ErrorExt {
    fn diagnostic(self) -> Diagnostic;
}

impl ErrorExt for Error {
    fn diagnostic(self) -> Diagnostic {
        use utility::QuoteExt;

        let (code, message) = match self.bare {
            BareError::UnexpectedCharacter(character) => {
                (Code::E000, format!("unexpected character {}", character.quote()).into())
            }
            BareError::UnterminatedTextLiteral => {
                (Code::E001, utility::Str::from("unterminated text literal"))
            }
            BareError::InvalidEscapeSequence(character) => (
                Code::E004,
                format!("invalid escape sequence {}", format!("\\{character}").quote()).into(),
            ),
            BareError::InvalidFloatLiteral => (Code::E002, "invalid float literal".into()),
            BareError::MissingDigitsAfterDecimalPoint => (
                Code::E003,
                concat!(
                    "a float literal needs at least one digit ",
                    "after the decimal point"
                )
                .into(),
            ),
            BareError::LoneAmpersand => (
                Code::E005,
                concat!("found a lone ", quoted!("&"), " but expected ", quoted!("&&")).into(),
            ),
            BareError::LonePipe => (
                Code::E005,
                concat!("found a lone ", quoted!("|"), " but expected ", quoted!("||")).into(),
            ),
        };

        Diagnostic::error().code(code).message(message).primary_span(self.span)
    }
}
