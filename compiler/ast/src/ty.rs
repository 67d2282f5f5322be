//! Source-level types.

use span::Spanned;
use std::fmt;

pub type Ty = Spanned<BareTy>;

/// A source-level type: a scalar, optionally wrapped in an array.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BareTy {
    pub scalar: Scalar,
    pub extent: Option<Extent>,
}

impl BareTy {
    pub const fn scalar(scalar: Scalar) -> Self {
        Self { scalar, extent: None }
    }

    pub const fn array(scalar: Scalar, extent: Extent) -> Self {
        Self { scalar, extent: Some(extent) }
    }

    pub const fn is_array(self) -> bool {
        self.extent.is_some()
    }

    /// The element type of an array type, the type itself otherwise.
    pub const fn element(self) -> Self {
        Self::scalar(self.scalar)
    }
}

impl fmt::Display for BareTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scalar)?;

        match self.extent {
            Some(Extent::Fixed(length)) => write!(f, "[{length}]"),
            Some(Extent::Dynamic) => write!(f, "[]"),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scalar {
    Int,
    Float,
    Bool,
    Text,
    Void,
    /// Compatible with every other type. Only occurs in built-in signatures.
    Any,
}

impl Scalar {
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Text => "str",
            Self::Void => "void",
            Self::Any => "any",
        })
    }
}

/// The length of an array type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Extent {
    Fixed(u32),
    Dynamic,
}

/// Check if a value of type `source` may be stored in a slot of type `target`.
///
/// [`Any`](Scalar::Any) is compatible with everything, array lengths have to agree
/// unless one of them is dynamic and the only admissible scalar conversion is the
/// widening of `int` to `float`.
pub fn is_assignable(target: BareTy, source: BareTy) -> bool {
    if target.scalar == Scalar::Any || source.scalar == Scalar::Any {
        return true;
    }

    if target.scalar == source.scalar && target.is_array() == source.is_array() {
        return match (target.extent, source.extent) {
            (Some(Extent::Fixed(x)), Some(Extent::Fixed(y))) => x == y,
            _ => true,
        };
    }

    !target.is_array()
        && !source.is_array()
        && target.scalar == Scalar::Float
        && source.scalar == Scalar::Int
}

/// The common type of two types, preferring defined array lengths and
/// widening mixes of `int` and `float` to `float`.
pub fn common(a: BareTy, b: BareTy) -> BareTy {
    if a.scalar == b.scalar && a.is_array() == b.is_array() {
        return match (a.extent, b.extent) {
            (Some(Extent::Fixed(length)), _) | (_, Some(Extent::Fixed(length))) => {
                BareTy::array(a.scalar, Extent::Fixed(length))
            }
            (Some(Extent::Dynamic), Some(Extent::Dynamic)) => a,
            _ => a,
        };
    }

    if !a.is_array()
        && !b.is_array()
        && matches!(
            (a.scalar, b.scalar),
            (Scalar::Int, Scalar::Float) | (Scalar::Float, Scalar::Int)
        )
    {
        return BareTy::scalar(Scalar::Float);
    }

    a
}

#[cfg(test)]
mod test {
    use super::{common, is_assignable, BareTy, Extent, Scalar};

    const INT: BareTy = BareTy::scalar(Scalar::Int);
    const FLOAT: BareTy = BareTy::scalar(Scalar::Float);
    const TEXT: BareTy = BareTy::scalar(Scalar::Text);
    const ANY: BareTy = BareTy::scalar(Scalar::Any);

    #[test]
    fn widening_is_one_way() {
        assert!(is_assignable(FLOAT, INT));
        assert!(!is_assignable(INT, FLOAT));
    }

    #[test]
    fn any_is_compatible_with_everything() {
        assert!(is_assignable(ANY, TEXT));
        assert!(is_assignable(INT, ANY));
        assert!(is_assignable(BareTy::array(Scalar::Any, Extent::Dynamic), ANY));
    }

    #[test]
    fn array_lengths_agree_unless_dynamic() {
        let fixed3 = BareTy::array(Scalar::Int, Extent::Fixed(3));
        let fixed4 = BareTy::array(Scalar::Int, Extent::Fixed(4));
        let dynamic = BareTy::array(Scalar::Int, Extent::Dynamic);

        assert!(is_assignable(fixed3, fixed3));
        assert!(!is_assignable(fixed3, fixed4));
        assert!(is_assignable(dynamic, fixed3));
        assert!(is_assignable(fixed3, dynamic));
        assert!(!is_assignable(fixed3, INT));
        assert!(!is_assignable(INT, fixed3));
    }

    #[test]
    fn common_prefers_defined_lengths_and_floats() {
        let fixed3 = BareTy::array(Scalar::Int, Extent::Fixed(3));
        let dynamic = BareTy::array(Scalar::Int, Extent::Dynamic);

        assert_eq!(common(INT, FLOAT), FLOAT);
        assert_eq!(common(FLOAT, INT), FLOAT);
        assert_eq!(common(dynamic, fixed3), fixed3);
        assert_eq!(common(INT, INT), INT);
        assert_eq!(common(TEXT, INT), TEXT);
    }
}
