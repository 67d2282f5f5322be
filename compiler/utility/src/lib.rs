//! Utility functionality and definitions.

use std::fmt;

pub use atom::Atom;
pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod atom;

pub const FILE_EXTENSION: &str = "lyra";
pub const PROGRAM_ENTRY: Atom = Atom::MAIN;

pub type Str = std::borrow::Cow<'static, str>;

pub type SmallVec<T, const N: usize> = smallvec::SmallVec<[T; N]>;

pub fn default<T: Default>() -> T {
    T::default()
}

#[macro_export]
macro_rules! obtain {
    ($expr:expr, $pat:pat $( if $guard:expr )? $(,)? => $mapping:expr $(,)?) => {
        match $expr {
            $pat $( if $guard )? => Some($mapping),
            _ => None,
        }
    };
}

pub trait ListingExt {
    fn list(self, conjunction: Conjunction) -> String;
}

impl<I> ListingExt for I
where
    I: Iterator + Clone,
    I::Item: Clone + fmt::Display,
{
    fn list(self, conjunction: Conjunction) -> String {
        let mut this = self.peekable();
        let mut first = true;
        let mut result = String::new();

        while let Some(item) = this.next() {
            if !first {
                if this.peek().is_some() {
                    result += ", ";
                } else {
                    use std::fmt::Write;
                    write!(result, " {conjunction} ").unwrap();
                }
            }

            result += &item.to_string();
            first = false;
        }

        result
    }
}

#[derive(Clone, Copy)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

/// Use the singular or the plural form of the given word depending on the given amount.
///
/// # Examples
///
/// ```
/// # use utility::pluralize;
/// # fn main() {
/// assert_eq!(pluralize!(1, "factor"), "factor");
/// assert_eq!(pluralize!(15, "factor"), "factors");
/// assert_eq!(pluralize!(0, "person", "people"), "people");
/// # }
/// ```
#[macro_export]
macro_rules! pluralize {
    ($amount:expr, $singular:expr, $plural:expr $(,)?) => {
        match $amount {
            1 => ::std::borrow::Cow::<'_, str>::from($singular),
            _ => $plural.into(),
        }
    };
    ($amount:expr, $singular:literal $(,)?) => {
        match $amount {
            1 => $singular,
            _ => concat!($singular, "s"),
        }
    };
}

pub trait QuoteExt {
    fn quote(self) -> String;
}

impl<D: fmt::Display> QuoteExt for D {
    fn quote(self) -> String {
        format!("\u{2018}{self}\u{2019}")
    }
}

#[macro_export]
macro_rules! quoted {
    ($code:expr) => {
        concat!("\u{2018}", $code, "\u{2019}")
    };
}

pub fn displayed<'f>(
    formatter: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result + 'f,
) -> impl fmt::Display + 'f {
    struct Formatted<F>(F);

    impl<F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result> fmt::Display for Formatted<F> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(f)
        }
    }

    Formatted(formatter)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn listing_no_elements() {
        assert_eq!(std::iter::empty::<u32>().list(Conjunction::And), "");
    }

    #[test]
    fn listing_one_element() {
        assert_eq!(std::iter::once(1).list(Conjunction::Or), "1");
    }

    #[test]
    fn listing_two_elements() {
        assert_eq!([false, true].into_iter().list(Conjunction::And), "false and true");
    }

    #[test]
    fn listing_three_elements() {
        assert_eq!([1, 2, 3].into_iter().list(Conjunction::Or), "1, 2 or 3");
    }
}
