use crate::{Code, Diagnostic};
use span::{span, FileName, SourceMap};

fn format(diagnostic: Diagnostic, map: Option<&SourceMap>) -> String {
    colored::control::set_override(false);
    diagnostic.bare.format(map)
}

#[test]
fn header_with_code() {
    assert_eq!(
        format(
            Diagnostic::error().code(Code::E201).message("‘x’ is already declared in this scope"),
            None,
        ),
        "error[E201]: ‘x’ is already declared in this scope",
    );
}

#[test]
fn single_line_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "var x: int = 42;\nvar x: int = 43;\n");

    assert_eq!(
        format(
            Diagnostic::error()
                .code(Code::E201)
                .message("duplicate declaration")
                .primary_span(span(22, 23)),
            Some(&map),
        ),
        "\
error[E201]: duplicate declaration
  ┌─ code:2:5
  │
2 │ var x: int = 43;
  │     ═",
    );
}

#[test]
fn single_line_highlight_with_label_and_note() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "if 42 {}\n");

    assert_eq!(
        format(
            Diagnostic::error()
                .code(Code::E204)
                .message("the condition is not boolean")
                .labeled_primary_span(span(4, 6), "has type ‘int’")
                .note("conditions have to evaluate to booleans"),
            Some(&map),
        ),
        "\
error[E204]: the condition is not boolean
  ┌─ code:1:4
  │
1 │ if 42 {}
  │    ══ has type ‘int’
  │
 note: conditions have to evaluate to booleans",
    );
}

#[test]
fn zero_length_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "fn");

    assert_eq!(
        format(
            Diagnostic::error().message("unexpected end of input").primary_span(span(3, 3)),
            Some(&map),
        ),
        "\
error: unexpected end of input
  ┌─ code:1:3
  │
1 │ fn
  │  ⟫⟪",
    );
}
