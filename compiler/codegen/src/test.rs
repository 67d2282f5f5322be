use diagnostics::{reporter::Buffer, Reporter};
use ir::{Const, Inst, Operand, Terminator, Ty};
use span::{FileName, SourceMap};

fn compile(source: &str) -> ir::Module {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Str("test"), source);
    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());

    let lexed = lexer::lex(&map[file]);
    assert!(lexed.errors.is_empty(), "the test source has lexical errors");

    let program = parser::parse(lexed.tokens, &reporter);
    assert!(program.health.is_untainted(), "the test source has syntax errors");

    let table = typer::check(&program.bare, &reporter)
        .unwrap_or_else(|_| panic!("the test source has semantic errors"));

    match super::compile(&program.bare, &table, "test", &reporter) {
        Ok(module) => module,
        Err(_) => {
            let codes: Vec<_> =
                buffer.lock().unwrap().iter().map(|diagnostic| diagnostic.code).collect();
            panic!("code generation failed: {codes:?}");
        }
    }
}

fn function<'a>(module: &'a ir::Module, name: &str) -> &'a ir::Function {
    module
        .functions
        .iter()
        .find(|function| function.name.to_str() == name)
        .unwrap_or_else(|| panic!("no function {name}"))
}

#[test]
fn smallest_valid_program() {
    let module = compile("fn int main() { return 0; }");
    let main = function(&module, "main");

    assert!(main.params.is_empty());
    assert_eq!(main.result, Ty::I32);
    assert!(matches!(
        main.blocks[0].terminator,
        Terminator::Return(Some(Operand::Const(Const::I32(0)))),
    ));
}

#[test]
fn runtime_helpers_are_declared() {
    let module = compile("fn int main() { return 0; }");

    for name in ["printf", "malloc", "free", "realloc", "strlen", "fgets", "pow", "sqrt"] {
        assert!(
            module.externals.iter().any(|external| external.name == name),
            "missing external {name}",
        );
    }
    assert!(module.globals.iter().any(|global| global.name == "stdin"));
}

#[test]
fn widening_initialization_stores_a_double() {
    let module = compile("fn int main() { var x: float = 3; return 0; }");
    let main = function(&module, "main");

    let stored_as_double = main.blocks.iter().flat_map(|block| &block.insts).any(|inst| {
        matches!(
            inst,
            Inst::Store { value, .. } if main.ty_of(value) == Ty::F64
        )
    });
    assert!(stored_as_double);
}

#[test]
fn every_block_ends_in_a_terminator() {
    let module = compile(
        "fn int collatz(n: int) {
            var steps: int = 0;
            while n != 1 {
                if n / 2 * 2 == n {
                    n = n / 2;
                } else {
                    n = 3 * n + 1;
                }
                steps += 1;
            }
            return steps;
        }
        fn int main() { return collatz(27); }",
    );

    for function in &module.functions {
        for block in &function.blocks {
            assert!(
                !matches!(block.terminator, Terminator::Unterminated),
                "block {} in {} lacks a terminator",
                block.name,
                function.name,
            );
        }
    }
}

#[test]
fn fixed_array_parameters_decay_to_pointers() {
    let module = compile(
        "fn void f(a: int[3]) { a[0] = 5; }
         fn int main() { var x: int[3] = {1, 2, 3}; f(x); return x[0]; }",
    );

    let f = function(&module, "f");
    assert_eq!(f.params, [Ty::ptr(Ty::I32)]);

    // The call site passes a pointer to the first element.
    let main = function(&module, "main");
    let calls_f = main.blocks.iter().flat_map(|block| &block.insts).any(|inst| {
        matches!(
            inst,
            Inst::Call { callee: ir::Callee::Function(_), args, .. }
                if args.len() == 1 && main.ty_of(&args[0]) == Ty::ptr(Ty::I32)
        )
    });
    assert!(calls_f);
}

#[test]
fn functions_may_be_called_before_their_declaration() {
    let module = compile(
        "fn int main() { return later(); }
         fn int later() { return 1; }",
    );

    let main = function(&module, "main");
    let calls_later = main.blocks.iter().flat_map(|block| &block.insts).any(|inst| {
        matches!(inst, Inst::Call { callee: ir::Callee::Function(index), .. }
            if module.functions[index.0 as usize].name.to_str() == "later")
    });
    assert!(calls_later);
}

#[test]
fn print_selects_its_format_string_by_type() {
    let module = compile(
        "fn int main() {
            print(42);
            print(2.5);
            print(\"hi\");
            print(true);
            return 0;
        }",
    );

    for format in ["%d", "%f", "%s", "true", "false"] {
        assert!(
            module.strings.iter().any(|string| string == format),
            "missing string constant {format:?}",
        );
    }
}

#[test]
fn string_constants_are_uniqued() {
    let module = compile(
        "fn int main() { print(\"twice\"); print(\"twice\"); return 0; }",
    );

    assert_eq!(module.strings.iter().filter(|string| *string == "twice").count(), 1);
}

#[test]
fn malloc_is_cast_to_the_declared_element_pointer() {
    let module = compile("fn int main() { var a: float[] = malloc(80); return 0; }");
    let main = function(&module, "main");

    let casts_to_double_ptr = main.blocks.iter().flat_map(|block| &block.insts).any(|inst| {
        matches!(inst, Inst::Cast { kind: ir::CastKind::Bitcast, ty, .. } if *ty == Ty::ptr(Ty::F64))
    });
    assert!(casts_to_double_ptr);
}

#[test]
fn sizeof_is_a_compile_time_constant() {
    let module = compile("fn int main() { return sizeof(int); }");
    let main = function(&module, "main");

    assert!(matches!(
        main.blocks[0].terminator,
        Terminator::Return(Some(Operand::Const(Const::I32(4)))),
    ));

    let module = compile("fn int main() { return sizeof(str[]); }");
    let main = function(&module, "main");

    assert!(matches!(
        main.blocks[0].terminator,
        Terminator::Return(Some(Operand::Const(Const::I32(8)))),
    ));
}

#[test]
fn short_array_literals_are_zero_filled() {
    let module = compile("fn int main() { var a: int[4] = {7}; return a[3]; }");
    let main = function(&module, "main");

    let zero_stores = main
        .blocks
        .iter()
        .flat_map(|block| &block.insts)
        .filter(|inst| {
            matches!(inst, Inst::Store { value: Operand::Const(Const::I32(0)), .. })
        })
        .count();
    assert_eq!(zero_stores, 3);
}

#[test]
fn the_emitted_module_renders_as_llvm_flavored_text() {
    let module = compile("fn int main() { print(\"hello\"); return 0; }");
    let text = module.to_string();

    assert!(text.contains("declare i32 @printf(i8*, ...)"));
    assert!(text.contains("define i32 @main() {"));
    assert!(text.contains("entry:"));
    assert!(text.contains("call i32 (i8*, ...) @printf("));
    assert!(text.contains("ret i32 0"));
}

#[test]
fn while_loops_compare_their_condition_to_zero() {
    let module = compile(
        "fn int main() { var i: int = 0; while i < 3 { i += 1; } return i; }",
    );
    let main = function(&module, "main");

    let block_names: Vec<_> = main.blocks.iter().map(|block| block.name.as_str()).collect();
    assert_eq!(block_names, ["entry", "whilecond", "whilebody", "whileend"]);

    let compares = main.blocks[1]
        .insts
        .iter()
        .filter(|inst| matches!(inst, Inst::Cmp { .. }))
        .count();
    // One comparison from `i < 3` and one nonzero test.
    assert_eq!(compares, 2);
}
