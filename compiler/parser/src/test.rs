use ast::{BareDecl, BareExpr, BareStmt, BinaryOp, Extent, Program, Scalar};
use diagnostics::{error::Outcome, reporter::Buffer, Code, Reporter};
use span::{FileName, SourceMap};

fn parse(source: &str) -> (Outcome<Program>, Vec<Option<Code>>) {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());

    let lexed = lexer::lex(&map[file]);
    assert!(lexed.errors.is_empty(), "the test source has lexical errors");

    let outcome = super::parse(lexed.tokens, &reporter);
    let codes = buffer.lock().unwrap().iter().map(|diagnostic| diagnostic.code).collect();
    (outcome, codes)
}

fn parse_untainted(source: &str) -> Program {
    let (outcome, codes) = parse(source);
    assert!(outcome.health.is_untainted(), "unexpected diagnostics: {codes:?}");
    outcome.bare
}

#[test]
fn smallest_valid_program() {
    let program = parse_untainted("fn int main() { return 0; }");

    assert_eq!(
        ast::render(&program),
        "\
Program
  Function: main
    Return Type: int
    Body:
      Return
        Number: 0
",
    );
}

#[test]
fn parameters_and_array_types() {
    let program = parse_untainted("fn void f(a: int[3], b: str[], c: float) {}");

    let BareDecl::Function(function) = &program.decls[0].bare;
    assert_eq!(function.params.len(), 3);
    assert_eq!(function.params[0].bare.ty.bare.extent, Some(Extent::Fixed(3)));
    assert_eq!(function.params[1].bare.ty.bare.scalar, Scalar::Text);
    assert_eq!(function.params[1].bare.ty.bare.extent, Some(Extent::Dynamic));
    assert_eq!(function.params[2].bare.ty.bare.extent, None);
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse_untainted("fn int main() { return 1 + 2 * 3; }");

    assert_eq!(
        ast::render(&program),
        "\
Program
  Function: main
    Return Type: int
    Body:
      Return
        Binary: +
          Number: 1
          Binary: *
            Number: 2
            Number: 3
",
    );
}

#[test]
fn binary_operators_are_left_associative() {
    let program = parse_untainted("fn int main() { return 1 - 2 - 3; }");
    let BareDecl::Function(function) = &program.decls[0].bare;
    let BareStmt::Return(Some(value)) = &function.body.bare[0].bare else {
        panic!("expected a return statement");
    };
    let BareExpr::Binary(outer) = &value.bare else { panic!("expected a binary operation") };

    assert_eq!(outer.op.bare, BinaryOp::Subtract);
    assert!(matches!(&outer.lhs.bare, BareExpr::Binary(inner)
        if inner.op.bare == BinaryOp::Subtract));
    assert!(matches!(&outer.rhs.bare, BareExpr::NumberLiteral(_)));
}

#[test]
fn assignment_is_right_associative() {
    let program = parse_untainted("fn int main() { a = b = 1; return 0; }");
    let BareDecl::Function(function) = &program.decls[0].bare;
    let BareStmt::Expr(expr) = &function.body.bare[0].bare else {
        panic!("expected an expression statement");
    };
    let BareExpr::Assignment(outer) = &expr.bare else { panic!("expected an assignment") };

    assert!(matches!(&outer.target.bare, BareExpr::Binding(_)));
    assert!(matches!(&outer.value.bare, BareExpr::Assignment(_)));
}

#[test]
fn else_if_chains() {
    let program = parse_untainted(
        "fn int main() { if a { } else if b { } else { } return 0; }",
    );
    let BareDecl::Function(function) = &program.decls[0].bare;
    let BareStmt::If(if_) = &function.body.bare[0].bare else { panic!("expected an if") };
    let Some(alternate) = &if_.alternate else { panic!("expected an alternate") };
    let BareStmt::If(nested) = &alternate.bare else { panic!("expected a nested if") };

    assert!(nested.alternate.is_some());
}

#[test]
fn array_literals_allocations_and_type_refs() {
    let program = parse_untainted(
        "fn int main() {\n\
         \x20   var a: int[3] = {1, 2, 3};\n\
         \x20   var b: int[] = int[10];\n\
         \x20   var c: int = sizeof(str[]);\n\
         \x20   return 0;\n\
         }",
    );
    let BareDecl::Function(function) = &program.decls[0].bare;

    let BareStmt::Var(a) = &function.body.bare[0].bare else { panic!() };
    assert!(matches!(&a.initializer.as_ref().unwrap().bare, BareExpr::ArrayLiteral(elements)
        if elements.len() == 3));

    let BareStmt::Var(b) = &function.body.bare[1].bare else { panic!() };
    let BareExpr::ArrayAllocation(allocation) = &b.initializer.as_ref().unwrap().bare else {
        panic!("expected an array allocation");
    };
    assert_eq!(allocation.element.bare.scalar, Scalar::Int);

    let BareStmt::Var(c) = &function.body.bare[2].bare else { panic!() };
    let BareExpr::Call(call) = &c.initializer.as_ref().unwrap().bare else { panic!() };
    let BareExpr::TypeRef(ty) = &call.args[0].bare else { panic!("expected a type reference") };
    assert_eq!(ty.bare.scalar, Scalar::Text);
    assert_eq!(ty.bare.extent, Some(Extent::Dynamic));
}

#[test]
fn invalid_assignment_target() {
    let (outcome, codes) = parse("fn int main() { 1 = 2; return 0; }");

    assert!(!outcome.health.is_untainted());
    assert_eq!(codes, [Some(Code::E101)]);
}

#[test]
fn void_variables_are_rejected() {
    let (outcome, codes) = parse("fn int main() { var x: void; return 0; }");

    assert!(!outcome.health.is_untainted());
    assert_eq!(codes, [Some(Code::E102)]);
}

#[test]
fn top_level_junk_does_not_stop_later_functions() {
    let (outcome, codes) = parse("var x: int = 1; fn int main() { return 0; }");

    assert!(!outcome.health.is_untainted());
    assert_eq!(codes, [Some(Code::E103)]);
    assert_eq!(outcome.bare.decls.len(), 1);
}

#[test]
fn recovery_drops_only_the_erroneous_statement() {
    let (outcome, codes) = parse("fn int main() { var x: int = ; return 0; }");

    assert!(!outcome.health.is_untainted());
    assert_eq!(codes, [Some(Code::E100)]);

    let BareDecl::Function(function) = &outcome.bare.decls[0].bare;
    assert_eq!(function.body.bare.len(), 1);
    assert!(matches!(function.body.bare[0].bare, BareStmt::Return(_)));
}

#[test]
fn tainted_iff_a_subtree_was_dropped() {
    let (outcome, codes) = parse("fn int main() { return 0; }");

    assert!(outcome.health.is_untainted());
    assert!(codes.is_empty());
}
