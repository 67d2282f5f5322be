use diagnostics::Reporter;
use span::{FileName, SourceMap};

fn compile(source: &str) -> ir::Module {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    let reporter = Reporter::silent();

    let lexed = lexer::lex(&map[file]);
    assert!(lexed.errors.is_empty(), "the test source has lexical errors");

    let program = parser::parse(lexed.tokens, &reporter);
    assert!(program.health.is_untainted(), "the test source has syntax errors");

    let table = typer::check(&program.bare, &reporter)
        .unwrap_or_else(|_| panic!("the test source has semantic errors"));

    codegen::compile(&program.bare, &table, "test", &reporter)
        .unwrap_or_else(|_| panic!("the test source does not lower"))
}

fn run(source: &str) -> i32 {
    run_full(source, "").0
}

fn run_for_output(source: &str) -> String {
    run_full(source, "").1
}

fn run_full(source: &str, input: &str) -> (i32, String) {
    let module = compile(source);
    let reporter = Reporter::silent();
    let mut output = Vec::new();
    let mut input = input.as_bytes();

    let result = super::execute_with(&module, &reporter, &mut output, &mut input)
        .unwrap_or_else(|_| panic!("execution trapped"));

    (result, String::from_utf8(output).unwrap())
}

#[test]
fn smallest_valid_program() {
    assert_eq!(run("fn int main() { return 0; }"), 0);
}

#[test]
fn arithmetic_with_precedence() {
    assert_eq!(run("fn int main() { return 1 + 2 * 3 - 4 / 2; }"), 5);
}

#[test]
fn widening_initialization() {
    assert_eq!(run("fn int main() { var x: float = 3; print(x); return 0; }"), 0);
    assert_eq!(
        run_for_output("fn int main() { var x: float = 3; print(x); return 0; }"),
        "3.000000",
    );
}

#[test]
fn while_loops_iterate() {
    assert_eq!(
        run("fn int main() {
            var sum: int = 0;
            var i: int = 1;
            while i <= 10 {
                sum += i;
                i += 1;
            }
            return sum;
        }"),
        55,
    );
}

#[test]
fn branches_pick_the_right_arm() {
    let source = "fn int classify(n: int) {
            if n < 0 { return -1; }
            else if n == 0 { return 0; }
            else { return 1; }
        }
        fn int main() { return classify(-5) * 100 + classify(0) * 10 + classify(7); }";

    assert_eq!(run(source), -99);
}

#[test]
fn user_functions_and_recursion() {
    assert_eq!(
        run("fn int fib(n: int) {
            if n < 2 { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        fn int main() { return fib(10); }"),
        55,
    );
}

#[test]
fn fixed_arrays_and_indexing() {
    assert_eq!(
        run("fn int main() {
            var a: int[3] = {10, 20, 30};
            a[1] = a[0] + a[2];
            return a[1];
        }"),
        40,
    );
}

#[test]
fn short_array_literals_are_zero_filled() {
    assert_eq!(
        run("fn int main() {
            var a: int[4] = {1, 2};
            return a[2] + a[3];
        }"),
        0,
    );
}

#[test]
fn fixed_array_parameters_decay() {
    assert_eq!(
        run("fn void fill(a: int[3]) { a[0] = 5; }
        fn int main() {
            var x: int[3] = {1, 2, 3};
            fill(x);
            return x[0];
        }"),
        5,
    );
}

#[test]
fn dynamic_arrays_through_malloc() {
    assert_eq!(
        run("fn int main() {
            var a: int[] = malloc(10 * sizeof(int));
            var i: int = 0;
            while i < 10 {
                a[i] = i * i;
                i += 1;
            }
            var total: int = 0;
            i = 0;
            while i < 10 {
                total += a[i];
                i += 1;
            }
            free(a);
            return total;
        }"),
        285,
    );
}

#[test]
fn realloc_preserves_contents() {
    assert_eq!(
        run("fn int main() {
            var a: int[] = malloc(2 * sizeof(int));
            a[0] = 7;
            a[1] = 8;
            var b: int[] = realloc(a, 4 * sizeof(int));
            b[2] = 9;
            return b[0] + b[1] + b[2];
        }"),
        24,
    );
}

#[test]
fn array_allocation_expressions() {
    assert_eq!(
        run("fn int main() {
            var a: float[] = float[4];
            a[3] = 2.5;
            var b: float = a[3] * 2.0;
            return 0;
        }"),
        0,
    );
}

#[test]
fn print_formats_by_type() {
    assert_eq!(
        run_for_output(
            "fn int main() {
                print(42);
                print(\"|\");
                print(true);
                print(\"|\");
                print(false);
                print(\"|\");
                print(\"text\");
                return 0;
            }"
        ),
        "42|true|false|text",
    );
}

#[test]
fn string_conversions() {
    assert_eq!(
        run("fn int main() {
            var n: int = atoi(\"123\");
            var m: int = strlen(itoa(n));
            return n + m;
        }"),
        126,
    );
}

#[test]
fn float_conversions() {
    assert_eq!(
        run("fn int main() {
            var f: float = atof(\"2.5\");
            return strlen(ftoa(f));
        }"),
        8,
    );
}

#[test]
fn input_reads_a_line_and_trims_the_line_break() {
    let (result, output) = run_full(
        "fn int main() {
            var line: str = input(\"> \");
            print(line);
            return strlen(line);
        }",
        "hello\n",
    );

    assert_eq!(output, "> hello");
    assert_eq!(result, 5);
}

#[test]
fn booleans_and_logical_operators() {
    assert_eq!(
        run("fn int main() {
            var a: bool = true;
            var b: bool = !a;
            if a && !b || false { return 1; }
            return 0;
        }"),
        1,
    );
}

#[test]
fn float_comparisons_are_ordered() {
    assert_eq!(
        run("fn int main() {
            var x: float = 1.5;
            if x > 1.0 && x <= 1.5 { return 1; }
            return 0;
        }"),
        1,
    );
}

#[test]
fn compound_assignment_on_array_elements() {
    assert_eq!(
        run("fn int main() {
            var a: int[2] = {6, 7};
            a[1] *= 6;
            return a[1];
        }"),
        42,
    );
}

#[test]
fn division_by_zero_traps() {
    let module = compile("fn int main() { var zero: int = 0; return 1 / zero; }");
    let reporter = Reporter::silent();
    let mut output = Vec::new();
    let mut input = "".as_bytes();

    assert!(super::execute_with(&module, &reporter, &mut output, &mut input).is_err());
}

#[test]
fn null_dereference_traps() {
    let module = compile(
        "fn int main() {
            var a: int[] = malloc(0);
            free(a);
            var b: int[];
            return b[0];
        }",
    );
    let reporter = Reporter::silent();
    let mut output = Vec::new();
    let mut input = "".as_bytes();

    assert!(super::execute_with(&module, &reporter, &mut output, &mut input).is_err());
}

#[test]
fn runaway_recursion_traps() {
    let module = compile(
        "fn int loop_(n: int) { return loop_(n + 1); }
         fn int main() { return loop_(0); }",
    );
    let reporter = Reporter::silent();
    let mut output = Vec::new();
    let mut input = "".as_bytes();

    assert!(super::execute_with(&module, &reporter, &mut output, &mut input).is_err());
}
