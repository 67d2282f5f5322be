//! Module verification.
//!
//! Checks the structural invariants the code generator promises: terminated
//! blocks, in-range branch targets and values, unique definitions, return
//! types matching the signature, and call arities matching their callees.

use crate::{Callee, Function, Inst, Module, Operand, Terminator, Ty};
use diagnostics::{error::Result, Code, Diagnostic, Reporter};
use utility::{HashSet, QuoteExt};

pub fn verify(module: &Module, reporter: &Reporter) -> Result {
    let mut errors = Vec::new();

    for function in &module.functions {
        verify_function(module, function, &mut errors);
    }

    let mut result = Ok(());
    for message in errors {
        let error = Diagnostic::error()
            .code(Code::E300)
            .message("module verification failed")
            .note(message)
            .report(reporter);
        result = Err(error);
    }
    result
}

fn verify_function(module: &Module, function: &Function, errors: &mut Vec<String>) {
    let name = function.name;
    let mut defined = HashSet::default();

    for (index, _) in function.params.iter().enumerate() {
        defined.insert(index as u32);
    }

    for block in &function.blocks {
        for inst in &block.insts {
            if let Some(value) = inst.def() {
                if !defined.insert(value.0) {
                    errors.push(format!(
                        "in {}: value %{} is defined more than once",
                        name.quote(),
                        value.0,
                    ));
                }
            }
        }
    }

    let in_range = |operand: &Operand| match operand {
        Operand::Value(value) => (value.0 as usize) < function.values.len(),
        Operand::Const(_) => true,
    };

    for block in &function.blocks {
        for inst in &block.insts {
            for operand in inst.uses() {
                if !in_range(operand) {
                    errors.push(format!(
                        "in {}: block {} uses an out-of-range value",
                        name.quote(),
                        block.name.clone().quote(),
                    ));
                } else if let Operand::Value(value) = operand {
                    if !defined.contains(&value.0) {
                        errors.push(format!(
                            "in {}: block {} uses the undefined value %{}",
                            name.quote(),
                            block.name.clone().quote(),
                            value.0,
                        ));
                    }
                }
            }

            if let Inst::Call { callee, args, .. } = inst {
                verify_call(module, function, *callee, args, errors);
            }
        }

        let mut target_in_range = |target: crate::BlockId| {
            if (target.0 as usize) >= function.blocks.len() {
                errors.push(format!(
                    "in {}: block {} branches out of range",
                    name.quote(),
                    block.name.clone().quote(),
                ));
            }
        };

        match &block.terminator {
            Terminator::Branch(target) => target_in_range(*target),
            Terminator::CondBranch { consequent, alternate, .. } => {
                target_in_range(*consequent);
                target_in_range(*alternate);
            }
            Terminator::Return(value) => {
                let actual = value.as_ref().map(|value| function.ty_of(value));

                let matches = match (&function.result, &actual) {
                    (Ty::Void, None) => true,
                    (result, Some(actual)) => result == actual,
                    _ => false,
                };

                if !matches {
                    errors.push(format!(
                        "in {}: block {} returns a value of the wrong type",
                        name.quote(),
                        block.name.clone().quote(),
                    ));
                }
            }
            Terminator::Unterminated => {
                errors.push(format!(
                    "in {}: block {} lacks a terminator",
                    name.quote(),
                    block.name.clone().quote(),
                ));
            }
        }
    }
}

fn verify_call(
    module: &Module,
    function: &Function,
    callee: Callee,
    args: &[Operand],
    errors: &mut Vec<String>,
) {
    let (callee_name, arity, variadic) = match callee {
        Callee::Function(index) => match module.functions.get(index.0 as usize) {
            Some(callee) => (callee.name.to_str(), callee.params.len(), false),
            None => {
                errors.push(format!(
                    "in {}: call of an undeclared function",
                    function.name.quote(),
                ));
                return;
            }
        },
        Callee::External(index) => match module.externals.get(index.0 as usize) {
            Some(callee) => (callee.name, callee.params.len(), callee.variadic),
            None => {
                errors.push(format!(
                    "in {}: call of an undeclared external function",
                    function.name.quote(),
                ));
                return;
            }
        },
    };

    let matches = if variadic { args.len() >= arity } else { args.len() == arity };

    if !matches {
        errors.push(format!(
            "in {}: call of {} with {} arguments but its signature takes {}",
            function.name.quote(),
            callee_name.quote(),
            args.len(),
            arity,
        ));
    }
}
