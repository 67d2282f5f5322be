use diagnostics::{
    error::{Health, Result},
    Code, Diagnostic, Reporter,
};
use lexer::token::{BareToken, Token, TokenName};
use span::Span;
use std::{fmt, mem};
use utility::{Conjunction, ListingExt};

/// The parser.
pub(crate) struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    expectations: Vec<Expectation>,
    pub(crate) health: Health,
    pub(crate) reporter: &'a Reporter,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: Vec<Token>, reporter: &'a Reporter) -> Self {
        Self {
            tokens,
            index: 0,
            expectations: Vec::new(),
            health: Health::Untainted,
            reporter,
        }
    }

    /// Report the current token as unexpected, listing all relevant expectations.
    pub(crate) fn error<T>(&mut self) -> Result<T> {
        let expectations = mem::take(&mut self.expectations);

        debug_assert!(!expectations.is_empty());

        let error = Diagnostic::error()
            .code(Code::E100)
            .message(format!(
                "found {} but expected {}",
                self.token(),
                expectations.iter().list(Conjunction::Or),
            ))
            .labeled_primary_span(self.span(), "unexpected token")
            .report(self.reporter);

        Err(error)
    }

    /// Register the given expectation.
    ///
    /// Once we encounter an unexpected token, we list all *relevant* expectations where
    /// existing expectations become irrelevant once we [advance] the cursor of the parser.
    ///
    /// [advance]: Self::advance
    pub(crate) fn expected(&mut self, expectation: impl Into<Expectation>) {
        self.expectations.push(expectation.into());
    }

    /// Expect the current token to match the given name, [advance] on success and
    /// emit an error on failure.
    ///
    /// [advance]: Self::advance
    pub(crate) fn expect(&mut self, expectation: TokenName) -> Result<Span> {
        if self.name() == expectation {
            let span = self.span();
            self.advance();
            Ok(span)
        } else {
            self.expected(expectation);
            self.error()
        }
    }

    /// Consume the current token if it matches the given name.
    ///
    /// Returns whether the token was found and skipped.
    #[must_use]
    pub(crate) fn consume(&mut self, expectation: TokenName) -> bool {
        if self.check(expectation) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&mut self, expectation: TokenName) -> bool {
        if self.name() == expectation {
            true
        } else {
            self.expected(expectation);
            false
        }
    }

    /// Step to the next token.
    ///
    /// Clears any [expectations]. Does not advance past [`TokenName::EndOfInput`].
    ///
    /// [expectations]: Self::expected
    pub(crate) fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        self.expectations.clear();
    }

    /// Obtain the current token.
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    /// Obtain the span of the current token.
    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// Obtain the current token without span.
    pub(crate) fn token(&self) -> &BareToken {
        &self.current().bare
    }

    pub(crate) fn name(&self) -> TokenName {
        self.current().bare.name()
    }

    pub(crate) fn look_ahead(&self, amount: usize) -> Option<TokenName> {
        Some(self.tokens.get(self.index + amount)?.bare.name())
    }
}

pub(crate) enum Expectation {
    Token(TokenName),
    Decl,
    Statement,
    Expr,
    Ty,
}

impl From<TokenName> for Expectation {
    fn from(token: TokenName) -> Self {
        Self::Token(token)
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Token(token) => return write!(f, "{token}"),
            Self::Decl => "declaration",
            Self::Statement => "statement",
            Self::Expr => "expression",
            Self::Ty => "type",
        })
    }
}
