use super::{FileName, Highlight, LineWithHighlight, LinesWithHighlight, SourceMap};
use crate::span;

#[test]
fn span_sharing_line_and_column() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "fn int main() {}");

    assert_eq!(
        map.lines_with_highlight(span(4, 7)),
        LinesWithHighlight {
            file: &FileName::Str("code"),
            first: LineWithHighlight {
                number: 1,
                content: "fn int main() {}",
                highlight: Highlight { start: 4, end: 7, width: 3, prefix_width: 3 },
            },
            last: None,
        },
    );
}

#[test]
fn second_line_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "fn int main() {\n    return 0;\n}\n");

    assert_eq!(
        map.lines_with_highlight(span(21, 27)),
        LinesWithHighlight {
            file: &FileName::Str("code"),
            first: LineWithHighlight {
                number: 2,
                content: "    return 0;",
                highlight: Highlight { start: 5, end: 11, width: 6, prefix_width: 4 },
            },
            last: None,
        },
    );
}

#[test]
fn multi_line_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "if x {\n    y;\n}");

    assert_eq!(
        map.lines_with_highlight(span(1, 16)),
        LinesWithHighlight {
            file: &FileName::Str("code"),
            first: LineWithHighlight {
                number: 1,
                content: "if x {",
                highlight: Highlight { start: 1, end: 7, width: 6, prefix_width: 0 },
            },
            last: Some(LineWithHighlight {
                number: 3,
                content: "}",
                highlight: Highlight { start: 1, end: 2, width: 1, prefix_width: 0 },
            }),
        },
    );
}

#[test]
fn end_of_input_highlight() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "fn");

    assert_eq!(
        map.lines_with_highlight(span(3, 3)),
        LinesWithHighlight {
            file: &FileName::Str("code"),
            first: LineWithHighlight {
                number: 1,
                content: "fn",
                highlight: Highlight { start: 3, end: 3, width: 0, prefix_width: 2 },
            },
            last: None,
        },
    );
}

#[test]
fn snippets_are_lexemes() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("code"), "var x: int = 42;");

    assert_eq!(map.snippet(span(5, 6)), "x");
    assert_eq!(map.snippet(span(14, 16)), "42");
}

#[test]
fn files_are_padded_apart() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Str("one"), "ab");
    map.add_str(FileName::Str("two"), "cd");

    assert_eq!(map.snippet(span(1, 3)), "ab");
    assert_eq!(map.snippet(span(4, 6)), "cd");
}
