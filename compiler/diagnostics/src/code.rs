//! Error codes and their pipeline-stage classification.

use std::fmt;

/// A numeric error code.
///
/// The hundreds digit classifies the code into one of the pipeline [stages](Stage):
/// `E0xx` lexical, `E1xx` syntactic, `E2xx` semantic, `E3xx` code generation,
/// `E4xx` runtime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Code {
    /// Unexpected character.
    E000,
    /// Unterminated text literal.
    E001,
    /// Invalid float literal.
    E002,
    /// Missing digits after the decimal point.
    E003,
    /// Invalid escape sequence.
    E004,
    /// Lone `&` or `|`.
    E005,
    /// Unexpected token.
    E100,
    /// Invalid assignment target.
    E101,
    /// Variable of type `void`.
    E102,
    /// Expected a function declaration at the top level.
    E103,
    /// Call of something other than a name.
    E104,
    /// Undefined binding.
    E200,
    /// Duplicate declaration.
    E201,
    /// Mismatched types.
    E202,
    /// Mismatched return type or value.
    E203,
    /// Non-boolean condition.
    E204,
    /// Missing program entry.
    E205,
    /// Wrong program entry return type.
    E206,
    /// Wrong program entry signature.
    E207,
    /// Indexing into a non-array.
    E208,
    /// Non-integer array index or length.
    E209,
    /// Wrong number of arguments.
    E210,
    /// Mismatched argument type.
    E211,
    /// Incompatible array literal elements.
    E212,
    /// Module verification failure.
    E300,
    /// Internal invariant violation during lowering.
    E301,
    /// Runtime trap.
    E400,
}

impl Code {
    const fn value(self) -> u16 {
        match self {
            Self::E000 => 0,
            Self::E001 => 1,
            Self::E002 => 2,
            Self::E003 => 3,
            Self::E004 => 4,
            Self::E005 => 5,
            Self::E100 => 100,
            Self::E101 => 101,
            Self::E102 => 102,
            Self::E103 => 103,
            Self::E104 => 104,
            Self::E200 => 200,
            Self::E201 => 201,
            Self::E202 => 202,
            Self::E203 => 203,
            Self::E204 => 204,
            Self::E205 => 205,
            Self::E206 => 206,
            Self::E207 => 207,
            Self::E208 => 208,
            Self::E209 => 209,
            Self::E210 => 210,
            Self::E211 => 211,
            Self::E212 => 212,
            Self::E300 => 300,
            Self::E301 => 301,
            Self::E400 => 400,
        }
    }

    pub const fn stage(self) -> Stage {
        match self.value() {
            0..=99 => Stage::Lexical,
            100..=199 => Stage::Syntax,
            200..=299 => Stage::Semantic,
            300..=399 => Stage::Codegen,
            _ => Stage::Runtime,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.value())
    }
}

/// The pipeline stage a diagnostic originates from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    Lexical,
    Syntax,
    Semantic,
    Codegen,
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lexical => "lexical",
            Self::Syntax => "syntax",
            Self::Semantic => "semantic",
            Self::Codegen => "code generation",
            Self::Runtime => "runtime",
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Code, Stage};

    #[test]
    fn codes_classify_into_stages() {
        assert_eq!(Code::E003.stage(), Stage::Lexical);
        assert_eq!(Code::E100.stage(), Stage::Syntax);
        assert_eq!(Code::E206.stage(), Stage::Semantic);
        assert_eq!(Code::E300.stage(), Stage::Codegen);
        assert_eq!(Code::E400.stage(), Stage::Runtime);
    }

    #[test]
    fn codes_display_zero_padded() {
        assert_eq!(Code::E000.to_string(), "E000");
        assert_eq!(Code::E212.to_string(), "E212");
    }
}
