use diagnostics::{reporter::Buffer, Code, Reporter};
use span::{FileName, SourceMap};

fn check(source: &str) -> (Result<(), ()>, Vec<Option<Code>>) {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());

    let lexed = lexer::lex(&map[file]);
    assert!(lexed.errors.is_empty(), "the test source has lexical errors");

    let program = parser::parse(lexed.tokens, &reporter);
    assert!(program.health.is_untainted(), "the test source has syntax errors");

    let result = super::check(&program.bare, &reporter).map(drop).map_err(drop);
    let codes = buffer.lock().unwrap().iter().map(|diagnostic| diagnostic.code).collect();
    (result, codes)
}

#[track_caller]
fn assert_ok(source: &str) {
    let (result, codes) = check(source);
    assert!(result.is_ok(), "unexpected diagnostics: {codes:?}");
}

#[track_caller]
fn assert_errors(source: &str, expected: &[Code]) {
    let (result, codes) = check(source);
    assert!(result.is_err());
    let expected: Vec<_> = expected.iter().copied().map(Some).collect();
    assert_eq!(codes, expected);
}

#[test]
fn smallest_valid_program() {
    assert_ok("fn int main() { return 0; }");
}

#[test]
fn declarations_and_literals() {
    assert_ok(
        "fn int main() {
            var x: int = 42;
            var y: float = 3.14;
            var s: str = \"hello\";
            var b: bool = true;
            return 0;
        }",
    );
}

#[test]
fn widening_initialization_is_accepted() {
    assert_ok("fn int main() { var x: float = 3; return 0; }");
}

#[test]
fn narrowing_initialization_is_rejected() {
    assert_errors("fn int main() { var x: int = 3.0; return 0; }", &[Code::E202]);
}

#[test]
fn redeclaration_in_the_same_scope() {
    assert_errors(
        "fn int main() { var x: int = 1; var x: int = 2; return 0; }",
        &[Code::E201],
    );
}

#[test]
fn shadowing_in_a_nested_scope_is_allowed() {
    assert_ok(
        "fn int main() {
            var x: int = 1;
            {
                var x: int = 2;
                x = 3;
            }
            return x;
        }",
    );
}

#[test]
fn undefined_variable() {
    assert_errors("fn int main() { x = 2; return 0; }", &[Code::E200]);
}

#[test]
fn variables_do_not_leak_their_scope() {
    assert_errors(
        "fn int main() { { var x: int = 1; } x = 2; return 0; }",
        &[Code::E200],
    );
}

#[test]
fn mixed_type_array_literal() {
    assert_errors(
        "fn int main() { var a: int[] = {1, \"x\", 3}; return 0; }",
        &[Code::E212],
    );
}

#[test]
fn array_index_must_be_an_integer() {
    assert_errors(
        "fn int main() { var arr: int[] = {1, 2, 3}; arr[true] = 42; return 0; }",
        &[Code::E209],
    );
}

#[test]
fn fixed_array_lengths_have_to_agree() {
    assert_errors(
        "fn int main() { var a: int[3] = {1, 2, 3}; var b: int[2] = a; return 0; }",
        &[Code::E202],
    );
    assert_ok("fn int main() { var a: int[] = {1, 2}; var b: int[2] = a; return 0; }");
}

#[test]
fn array_literal_lengths_are_flexible() {
    assert_ok(
        "fn int main() { var a: int[3] = {1, 2}; var b: int[2] = {1, 2, 3}; return 0; }",
    );
}

#[test]
fn functions_are_forward_referencable() {
    assert_ok(
        "fn int main() { return add(1, 2); }
         fn int add(a: int, b: int) { return a + b; }",
    );
}

#[test]
fn wrong_number_of_arguments() {
    assert_errors(
        "fn int add(a: int, b: int) { return a + b; }
         fn int main() { var result: int = add(1); return 0; }",
        &[Code::E210],
    );
}

#[test]
fn mismatched_argument_types() {
    assert_errors(
        "fn int add(a: int, b: int) { return a + b; }
         fn int main() { var result: int = add(\"one\", \"two\"); return 0; }",
        &[Code::E211, Code::E211],
    );
}

#[test]
fn mismatched_return_type() {
    assert_errors(
        "fn int getValue() { return \"text\"; }
         fn int main() { return 0; }",
        &[Code::E203],
    );
}

#[test]
fn return_without_value_in_a_non_void_function() {
    assert_errors("fn int main() { return; }", &[Code::E203]);
}

#[test]
fn non_boolean_if_condition() {
    assert_errors("fn int main() { if 42 { return 1; } return 0; }", &[Code::E204]);
}

#[test]
fn non_boolean_while_condition() {
    assert_errors(
        "fn int main() { while \"forever\" { return 1; } return 0; }",
        &[Code::E204],
    );
}

#[test]
fn the_body_of_an_invalid_condition_is_still_analyzed() {
    assert_errors(
        "fn int main() { if 42 { y = 1; } return 0; }",
        &[Code::E204, Code::E200],
    );
}

#[test]
fn conditions_may_be_boolean_variables() {
    assert_ok(
        "fn int main() {
            var b: bool = true;
            var x: int = 0;
            if b { x = 1; }
            while b && x < 10 { x += 1; b = x != 5; }
            return x;
        }",
    );
}

#[test]
fn logical_operators_require_booleans() {
    assert_errors("fn int main() { var b: bool = 1 && 2; return 0; }", &[Code::E202]);
}

#[test]
fn arithmetic_requires_numbers() {
    assert_errors("fn int main() { var x: int = true + 42; return 0; }", &[Code::E202]);
}

#[test]
fn missing_main() {
    assert_errors("fn int answer() { return 42; }", &[Code::E205]);
}

#[test]
fn main_must_return_int() {
    assert_errors("fn void main() { return; }", &[Code::E206]);
}

#[test]
fn main_may_take_argc_and_argv() {
    assert_ok("fn int main(argc: int, argv: str[]) { return 0; }");
}

#[test]
fn main_with_an_invalid_signature() {
    assert_errors("fn int main(x: float) { return 0; }", &[Code::E207]);
}

#[test]
fn built_in_names_are_reserved() {
    assert_errors(
        "fn int print(value: int) { return 0; }
         fn int main() { return 0; }",
        &[Code::E201],
    );
}

#[test]
fn built_ins_are_callable() {
    assert_ok(
        "fn int main() {
            print(\"hello\");
            print(42);
            var line: str = input(\"> \");
            var n: int = atoi(line);
            var size: int = sizeof(int[]);
            var buffer: int[] = malloc(10 * sizeof(int));
            buffer[0] = n;
            var longer: int[] = realloc(buffer, 20 * sizeof(int));
            free(longer);
            return strlen(ftoa(atof(\"2.5\")));
        }",
    );
}

#[test]
fn malloc_takes_the_element_type_of_its_destination() {
    assert_ok("fn int main() { var a: float[] = malloc(80); a[0] = 1.5; return 0; }");
}

#[test]
fn scope_depth_is_balanced_after_checking() {
    let mut map = SourceMap::default();
    let file = map.add_str(
        FileName::Str("test"),
        "fn int main() { { { var x: int = 1; } } if true { } return 0; }",
    );
    let reporter = Reporter::silent();
    let lexed = lexer::lex(&map[file]);
    let program = parser::parse(lexed.tokens, &reporter);
    let table = super::check(&program.bare, &reporter).ok().unwrap();

    assert_eq!(table.depth(), 1);
}
