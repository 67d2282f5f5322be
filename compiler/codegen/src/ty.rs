//! Source-type lowering.

use ast::{BareTy, Extent, Scalar};
use ir::Ty;

/// Lower a source type to its IR representation.
///
/// Fixed arrays lower to array types, dynamic arrays to element pointers.
pub fn lower(ty: BareTy) -> Ty {
    match ty.extent {
        Some(Extent::Fixed(length)) => Ty::array(length, lower_scalar(ty.scalar)),
        Some(Extent::Dynamic) => Ty::ptr(lower_scalar(ty.scalar)),
        None => lower_scalar(ty.scalar),
    }
}

/// Lower a parameter type; arrays always decay to element pointers.
pub fn lower_param(ty: BareTy) -> Ty {
    match ty.extent {
        Some(_) => Ty::ptr(lower_scalar(ty.scalar)),
        None => lower_scalar(ty.scalar),
    }
}

fn lower_scalar(scalar: Scalar) -> Ty {
    match scalar {
        Scalar::Int => Ty::I32,
        Scalar::Float => Ty::F64,
        Scalar::Bool => Ty::I1,
        Scalar::Text => Ty::ptr(Ty::I8),
        Scalar::Void => Ty::Void,
        // `any` is resolved contextually before lowering; a leftover is a
        // plain byte as far as allocation sizes are concerned.
        Scalar::Any => Ty::I8,
    }
}

#[cfg(test)]
mod test {
    use super::{lower, lower_param};
    use ast::{BareTy, Extent, Scalar};
    use ir::Ty;

    #[test]
    fn scalars() {
        assert_eq!(lower(BareTy::scalar(Scalar::Int)), Ty::I32);
        assert_eq!(lower(BareTy::scalar(Scalar::Float)), Ty::F64);
        assert_eq!(lower(BareTy::scalar(Scalar::Bool)), Ty::I1);
        assert_eq!(lower(BareTy::scalar(Scalar::Text)), Ty::ptr(Ty::I8));
        assert_eq!(lower(BareTy::scalar(Scalar::Void)), Ty::Void);
    }

    #[test]
    fn arrays() {
        assert_eq!(
            lower(BareTy::array(Scalar::Int, Extent::Fixed(3))),
            Ty::array(3, Ty::I32),
        );
        assert_eq!(lower(BareTy::array(Scalar::Float, Extent::Dynamic)), Ty::ptr(Ty::F64));
    }

    #[test]
    fn parameters_decay() {
        assert_eq!(lower_param(BareTy::array(Scalar::Int, Extent::Fixed(3))), Ty::ptr(Ty::I32));
        assert_eq!(lower_param(BareTy::array(Scalar::Int, Extent::Dynamic)), Ty::ptr(Ty::I32));
        assert_eq!(lower_param(BareTy::scalar(Scalar::Text)), Ty::ptr(Ty::I8));
    }

    #[test]
    fn sizes() {
        assert_eq!(lower(BareTy::scalar(Scalar::Int)).size(), 4);
        assert_eq!(lower(BareTy::scalar(Scalar::Float)).size(), 8);
        assert_eq!(lower(BareTy::array(Scalar::Int, Extent::Fixed(3))).size(), 12);
        assert_eq!(lower(BareTy::array(Scalar::Int, Extent::Dynamic)).size(), 8);
    }
}
