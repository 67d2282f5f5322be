//! Interned strings.

use crate::HashMap;
use std::{
    fmt,
    sync::{LazyLock, Mutex},
};

/// An interned string.
///
/// Should only be used for "short" strings that are expected to occur many times
/// over like identifiers and literal contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(u32);

impl Atom {
    pub fn to_str(self) -> &'static str {
        Interner::the().lock().unwrap().get(self)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Interner::the().lock().unwrap().intern_borrowed(value)
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Interner::the().lock().unwrap().intern_owned(value)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

struct Interner {
    atoms: HashMap<&'static str, Atom>,
    strings: Vec<&'static str>,
}

impl Interner {
    fn the() -> &'static Mutex<Self> {
        static SELF: LazyLock<Mutex<Interner>> = LazyLock::new(|| Mutex::new(Interner::new()));

        &SELF
    }

    fn with(values: &[&'static str]) -> Self {
        Self {
            atoms: values
                .iter()
                .zip(0..)
                .map(|(&string, atom)| (string, Atom(atom)))
                .collect(),
            strings: values.to_vec(),
        }
    }

    fn intern_borrowed(&mut self, value: &str) -> Atom {
        if let Some(&atom) = self.atoms.get(value) {
            return atom;
        }

        self.insert(Box::leak(Box::from(value)))
    }

    fn intern_owned(&mut self, value: String) -> Atom {
        if let Some(&atom) = self.atoms.get(&*value) {
            return atom;
        }

        self.insert(String::leak(value))
    }

    fn insert(&mut self, value: &'static str) -> Atom {
        let atom = Atom(self.strings.len().try_into().unwrap());
        self.strings.push(value);
        self.atoms.insert(value, atom);
        atom
    }

    fn get(&self, atom: Atom) -> &'static str {
        self.strings[atom.0 as usize]
    }
}

macro_rules! atoms {
    ($( $atom:ident($index:literal) => $string:literal ),* $(,)?) => {
        impl Atom {
            $( pub const $atom: Self = Self($index); )*
        }

        impl Interner {
            fn new() -> Self {
                Self::with(&[$( $string ),*])
            }
        }

        #[cfg(test)]
        mod test {
            use super::Atom;

            #[test]
            fn preinterned_atoms_are_aligned() {
                $( assert_eq!(Atom::$atom.to_str(), $string); )*
            }
        }
    };
}

atoms! {
    MAIN(0) => "main",
    ARGC(1) => "argc",
    ARGV(2) => "argv",
    PRINT(3) => "print",
    INPUT(4) => "input",
    SIZEOF(5) => "sizeof",
    MALLOC(6) => "malloc",
    FREE(7) => "free",
    REALLOC(8) => "realloc",
    STRLEN(9) => "strlen",
    ATOI(10) => "atoi",
    ATOF(11) => "atof",
    ITOA(12) => "itoa",
    FTOA(13) => "ftoa",
    UNDERSCORE(14) => "_",
}
