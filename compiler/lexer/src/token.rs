//! The tokens emitted by the lexer.

use span::Spanned;
use std::fmt;
use utility::{obtain, quoted, Atom};

pub type Token = Spanned<BareToken>;

macro_rules! keyword {
    ($keyword:ident) => {
        concat!("keyword ", quoted!(stringify!($keyword)))
    };
}

macro_rules! tokens {
    (
        $( #[$attr:meta] )*
        pub enum $BareToken:ident, $TokenName:ident {
            $( $( #[$variant_attr:meta] )* $Variant:ident $( ($payload:ty) )? => $description:expr, )+
        }
    ) => {
        $( #[$attr] )*
        pub enum $BareToken {
            $( $( #[$variant_attr] )* $Variant $( ($payload) )?, )+
        }

        impl $BareToken {
            pub const fn name(&self) -> $TokenName {
                match self {
                    $( Self::$Variant { .. } => $TokenName::$Variant, )+
                }
            }
        }

        /// The name of a token: the token without any payload.
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        pub enum $TokenName {
            $( $Variant, )+
        }

        impl fmt::Display for $TokenName {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $( Self::$Variant => $description, )+
                })
            }
        }
    };
}

tokens! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub enum BareToken, TokenName {
        Word(Atom) => "identifier",
        NumberLiteral(Atom) => "number literal",
        FloatLiteral(Atom) => "float literal",
        TextLiteral(Atom) => "text literal",
        /// For function declarations.
        Fn => keyword!(fn),
        /// For variable declarations.
        Var => keyword!(var),
        If => keyword!(if),
        Else => keyword!(else),
        While => keyword!(while),
        Return => keyword!(return),
        Int => keyword!(int),
        Float => keyword!(float),
        Bool => keyword!(bool),
        Str => keyword!(str),
        Void => keyword!(void),
        True => keyword!(true),
        False => keyword!(false),
        OpeningRoundBracket => quoted!("("),
        ClosingRoundBracket => quoted!(")"),
        OpeningCurlyBracket => quoted!("{"),
        ClosingCurlyBracket => quoted!("}"),
        OpeningSquareBracket => quoted!("["),
        ClosingSquareBracket => quoted!("]"),
        Semicolon => quoted!(";"),
        Colon => quoted!(":"),
        Comma => quoted!(","),
        Plus => quoted!("+"),
        Minus => quoted!("-"),
        Asterisk => quoted!("*"),
        Slash => quoted!("/"),
        Equals => quoted!("="),
        DoubleEquals => quoted!("=="),
        BangEquals => quoted!("!="),
        Less => quoted!("<"),
        LessEquals => quoted!("<="),
        Greater => quoted!(">"),
        GreaterEquals => quoted!(">="),
        DoubleAmpersand => quoted!("&&"),
        DoublePipe => quoted!("||"),
        Bang => quoted!("!"),
        PlusEquals => quoted!("+="),
        MinusEquals => quoted!("-="),
        AsteriskEquals => quoted!("*="),
        SlashEquals => quoted!("/="),
        EndOfInput => "end of input",
        /// A marker left behind by lexical-error recovery.
        Error => "invalid token",
    }
}

impl fmt::Display for BareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub trait TokenExt {
    fn name(&self) -> TokenName;
    fn into_word(self) -> Option<Atom>;
}

impl TokenExt for Token {
    fn name(&self) -> TokenName {
        self.bare.name()
    }

    fn into_word(self) -> Option<Atom> {
        obtain!(self.bare, BareToken::Word(word) => word)
    }
}

pub fn parse_keyword(source: &str) -> Option<BareToken> {
    use BareToken::*;

    Some(match source {
        "fn" => Fn,
        "var" => Var,
        "if" => If,
        "else" => Else,
        "while" => While,
        "return" => Return,
        "int" => Int,
        "float" => Float,
        "bool" => Bool,
        "str" => Str,
        "void" => Void,
        "true" => True,
        "false" => False,
        _ => return None,
    })
}
