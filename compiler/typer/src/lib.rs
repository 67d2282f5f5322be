//! The semantic analyzer: scope and type checking plus entry-point validation.

use ast::{
    common, is_assignable, BareDecl, BareExpr, BareStmt, BareTy, Expr, Extent, Function, Program,
    Scalar, Stmt,
};
use diagnostics::{
    error::{ErasedReportedError, Health, Result, Stain},
    Code, Diagnostic, Reporter,
};
use utility::{Atom, QuoteExt, PROGRAM_ENTRY};

pub use scope::{FunctionSymbol, Parameter, Symbol, SymbolKind, SymbolTable};

pub mod scope;
#[cfg(test)]
mod test;

const INT: BareTy = BareTy::scalar(Scalar::Int);
const FLOAT: BareTy = BareTy::scalar(Scalar::Float);
const BOOL: BareTy = BareTy::scalar(Scalar::Bool);
const TEXT: BareTy = BareTy::scalar(Scalar::Text);
const VOID: BareTy = BareTy::scalar(Scalar::Void);
const ANY: BareTy = BareTy::scalar(Scalar::Any);
const ANY_ARRAY: BareTy = BareTy::array(Scalar::Any, Extent::Dynamic);
const TEXT_ARRAY: BareTy = BareTy::array(Scalar::Text, Extent::Dynamic);

/// Validate the program and build the symbol table consumed by the code generator.
///
/// Functions are declared before any body is checked, so forward references
/// resolve. Diagnostics are reported through the given reporter; analysis
/// continues past most errors.
pub fn check(program: &Program, reporter: &Reporter) -> Result<SymbolTable> {
    let mut typer = Typer::new(reporter);
    typer.declare_built_ins();
    typer.declare_functions(program);
    typer.check_bodies(program);

    match typer.health {
        Health::Untainted => Ok(typer.table),
        Health::Tainted(error) => Err(error),
    }
}

struct Typer<'a> {
    table: SymbolTable,
    return_ty: Option<BareTy>,
    health: Health,
    reporter: &'a Reporter,
}

impl<'a> Typer<'a> {
    fn new(reporter: &'a Reporter) -> Self {
        Self { table: SymbolTable::new(), return_ty: None, health: Health::Untainted, reporter }
    }

    fn declare_built_ins(&mut self) {
        let built_ins: &[(Atom, BareTy, &[(Atom, BareTy)])] = &[
            (Atom::PRINT, INT, &[(Atom::from("value"), ANY)]),
            (Atom::INPUT, TEXT, &[(Atom::from("prompt"), TEXT)]),
            (Atom::SIZEOF, INT, &[(Atom::from("ty"), ANY)]),
            (Atom::MALLOC, ANY_ARRAY, &[(Atom::from("size"), INT)]),
            (Atom::FREE, VOID, &[(Atom::from("ptr"), ANY_ARRAY)]),
            (Atom::REALLOC, ANY_ARRAY, &[(Atom::from("ptr"), ANY_ARRAY), (Atom::from("size"), INT)]),
            (Atom::STRLEN, INT, &[(Atom::from("text"), TEXT)]),
            (Atom::ATOI, INT, &[(Atom::from("text"), TEXT)]),
            (Atom::ATOF, FLOAT, &[(Atom::from("text"), TEXT)]),
            (Atom::ITOA, TEXT, &[(Atom::from("value"), INT)]),
            (Atom::FTOA, TEXT, &[(Atom::from("value"), FLOAT)]),
        ];

        for &(binder, ty, params) in built_ins {
            let params = params.iter().map(|&(binder, ty)| Parameter { binder, ty }).collect();
            let fresh = self.table.declare_function(binder, ty, params);
            debug_assert!(fresh);
        }
    }

    /// The declaration pass: declare every function in the global scope and
    /// validate the program entry.
    fn declare_functions(&mut self, program: &Program) {
        let mut entry = false;

        for decl in &program.decls {
            let BareDecl::Function(function) = &decl.bare;

            let params = function
                .params
                .iter()
                .map(|param| Parameter { binder: param.bare.binder.bare, ty: param.bare.ty.bare })
                .collect();

            if !self.table.declare_function(function.binder.bare, function.ty.bare, params) {
                let error = Diagnostic::error()
                    .code(Code::E201)
                    .message(format!(
                        "{} is already declared in this scope",
                        function.binder.bare.quote(),
                    ))
                    .primary_span(function.binder)
                    .report(self.reporter);
                self.health.taint(error);
            }

            if function.binder.bare == PROGRAM_ENTRY {
                entry = true;
                self.validate_entry(function);
            }
        }

        if !entry {
            let error = Diagnostic::error()
                .code(Code::E205)
                .message("the program is missing a ‘main’ function")
                .report(self.reporter);
            self.health.taint(error);
        }
    }

    fn validate_entry(&mut self, function: &Function) {
        if function.ty.bare != INT {
            let error = Diagnostic::error()
                .code(Code::E206)
                .message("the main function must return ‘int’")
                .primary_span(function.ty)
                .report(self.reporter);
            self.health.taint(error);
        }

        let params = &function.params;
        let valid = match params.as_slice() {
            [] => true,
            [argc, argv] => {
                argc.bare.binder.bare == Atom::ARGC
                    && argc.bare.ty.bare == INT
                    && argv.bare.binder.bare == Atom::ARGV
                    && argv.bare.ty.bare == TEXT_ARRAY
            }
            _ => false,
        };

        if !valid {
            let error = Diagnostic::error()
                .code(Code::E207)
                .message(
                    "the main function must be declared with no parameters \
                     or with ‘(argc: int, argv: str[])’",
                )
                .with(|it| {
                    params.iter().fold(it, |it, param| it.primary_span(param))
                })
                .report(self.reporter);
            self.health.taint(error);
        }
    }

    /// The body pass: check every function body in its own scope.
    fn check_bodies(&mut self, program: &Program) {
        for decl in &program.decls {
            let BareDecl::Function(function) = &decl.bare;

            self.return_ty = Some(function.ty.bare);
            self.table.enter();

            for param in &function.params {
                if !self.table.declare(param.bare.binder.bare, param.bare.ty.bare) {
                    let error = Diagnostic::error()
                        .code(Code::E201)
                        .message(format!(
                            "{} is already declared in this scope",
                            param.bare.binder.bare.quote(),
                        ))
                        .primary_span(param.bare.binder)
                        .report(self.reporter);
                    self.health.taint(error);
                }
            }

            // The block is the function's own body; its parameters already
            // live in the entered scope.
            for stmt in &function.body.bare {
                self.check_stmt(stmt);
            }

            self.table.exit();
            self.return_ty = None;
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.bare {
            BareStmt::Var(binding) => {
                if let Some(initializer) = &binding.initializer {
                    match self.infer_with_expectation(initializer, binding.ty.bare) {
                        Ok(ty) if !is_assignable(binding.ty.bare, ty) => {
                            let error = Diagnostic::error()
                                .code(Code::E202)
                                .message("mismatched types in variable declaration")
                                .labeled_primary_span(
                                    initializer,
                                    format!("has type {}", ty.quote()),
                                )
                                .labeled_secondary_span(
                                    binding.ty,
                                    format!("expected {}", binding.ty.bare.quote()),
                                )
                                .report(self.reporter);
                            self.health.taint(error);
                        }
                        Ok(_) => {}
                        Err(error) => self.health.taint(error),
                    }
                }

                // Declare even on error so that later uses resolve.
                if !self.table.declare(binding.binder.bare, binding.ty.bare) {
                    let error = Diagnostic::error()
                        .code(Code::E201)
                        .message(format!(
                            "{} is already declared in this scope",
                            binding.binder.bare.quote(),
                        ))
                        .primary_span(binding.binder)
                        .report(self.reporter);
                    self.health.taint(error);
                }
            }
            BareStmt::Expr(expr) => {
                let _ = self.infer(expr).map(drop).stain(&mut self.health);
            }
            BareStmt::Block(stmts) => {
                self.table.enter();
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
                self.table.exit();
            }
            BareStmt::If(if_) => {
                self.check_condition(&if_.condition);

                self.table.enter();
                for stmt in &if_.consequent.bare {
                    self.check_stmt(stmt);
                }
                self.table.exit();

                if let Some(alternate) = &if_.alternate {
                    self.check_stmt(alternate);
                }
            }
            BareStmt::While(while_) => {
                self.check_condition(&while_.condition);

                self.table.enter();
                for stmt in &while_.body.bare {
                    self.check_stmt(stmt);
                }
                self.table.exit();
            }
            BareStmt::Return(value) => self.check_return(stmt, value.as_ref()),
        }
    }

    fn check_return(&mut self, stmt: &Stmt, value: Option<&Expr>) {
        let return_ty = self.return_ty.unwrap();

        match value {
            None => {
                if return_ty != VOID {
                    let error = Diagnostic::error()
                        .code(Code::E203)
                        .message(format!(
                            "this function must return a value of type {}",
                            return_ty.quote(),
                        ))
                        .primary_span(stmt)
                        .report(self.reporter);
                    self.health.taint(error);
                }
            }
            Some(value) => {
                let ty = match self.infer(value) {
                    Ok(ty) => ty,
                    Err(error) => {
                        self.health.taint(error);
                        return;
                    }
                };

                if return_ty == VOID {
                    let error = Diagnostic::error()
                        .code(Code::E203)
                        .message("a void function cannot return a value")
                        .primary_span(value)
                        .report(self.reporter);
                    self.health.taint(error);
                } else if !is_assignable(return_ty, ty) {
                    let error = Diagnostic::error()
                        .code(Code::E203)
                        .message("mismatched return type")
                        .labeled_primary_span(value, format!("has type {}", ty.quote()))
                        .note(format!("the function returns {}", return_ty.quote()))
                        .report(self.reporter);
                    self.health.taint(error);
                }
            }
        }
    }

    /// Conditions have to evaluate to booleans. The body is analyzed either way.
    fn check_condition(&mut self, condition: &Expr) {
        let ty = match self.infer(condition) {
            Ok(ty) => ty,
            Err(error) => {
                self.health.taint(error);
                return;
            }
        };

        if ty != BOOL && ty.scalar != Scalar::Any {
            let error = Diagnostic::error()
                .code(Code::E204)
                .message("the condition must evaluate to a boolean value")
                .labeled_primary_span(condition, format!("has type {}", ty.quote()))
                .report(self.reporter);
            self.health.taint(error);
        }
    }

    fn infer(&mut self, expr: &Expr) -> Result<BareTy> {
        self.infer_with_expectation(expr, ANY)
    }

    /// Infer the type of an expression.
    ///
    /// The expectation is only consulted by constructs whose own type is
    /// contextual, namely `malloc`-style calls in initializer position.
    fn infer_with_expectation(&mut self, expr: &Expr, expectation: BareTy) -> Result<BareTy> {
        match &expr.bare {
            BareExpr::NumberLiteral(_) => Ok(INT),
            BareExpr::FloatLiteral(_) => Ok(FLOAT),
            BareExpr::TextLiteral(_) => Ok(TEXT),
            BareExpr::BoolLiteral(_) => Ok(BOOL),
            BareExpr::TypeRef(ty) => Ok(ty.bare),
            BareExpr::Binding(binder) => match self.table.resolve(*binder) {
                Some(symbol) => Ok(symbol.ty),
                None => Err(Diagnostic::error()
                    .code(Code::E200)
                    .message(format!("undefined variable {}", binder.quote()))
                    .primary_span(expr)
                    .report(self.reporter)),
            },
            BareExpr::Index(index) => {
                let base = self.infer(&index.base)?;
                let index_ty = self.infer(&index.index)?;

                if !base.is_array() {
                    return Err(Diagnostic::error()
                        .code(Code::E208)
                        .message(format!("cannot index into a value of type {}", base.quote()))
                        .primary_span(&index.base)
                        .report(self.reporter));
                }

                if index_ty != INT && index_ty.scalar != Scalar::Any {
                    let error = Diagnostic::error()
                        .code(Code::E209)
                        .message("the array index must be an integer")
                        .labeled_primary_span(&index.index, format!("has type {}", index_ty.quote()))
                        .report(self.reporter);
                    self.health.taint(error);
                }

                Ok(base.element())
            }
            BareExpr::Unary(unary) => {
                let ty = self.infer(&unary.operand)?;

                match unary.op.bare {
                    ast::UnaryOp::Negate => {
                        if !ty.is_array() && (ty.scalar.is_numeric() || ty.scalar == Scalar::Any) {
                            Ok(ty)
                        } else {
                            Err(Diagnostic::error()
                                .code(Code::E202)
                                .message(format!("cannot negate a value of type {}", ty.quote()))
                                .primary_span(&unary.operand)
                                .report(self.reporter))
                        }
                    }
                    ast::UnaryOp::Not => {
                        if ty == BOOL || ty.scalar == Scalar::Any {
                            Ok(BOOL)
                        } else {
                            Err(Diagnostic::error()
                                .code(Code::E202)
                                .message(format!(
                                    "‘!’ requires a boolean operand but found {}",
                                    ty.quote(),
                                ))
                                .primary_span(&unary.operand)
                                .report(self.reporter))
                        }
                    }
                }
            }
            BareExpr::Binary(binary) => {
                let lhs = self.infer(&binary.lhs)?;
                let rhs = self.infer(&binary.rhs)?;
                let op = binary.op.bare;

                let numeric = |ty: BareTy| {
                    !ty.is_array() && (ty.scalar.is_numeric() || ty.scalar == Scalar::Any)
                };
                let boolean = |ty: BareTy| ty == BOOL || ty.scalar == Scalar::Any;

                if op.is_arithmetic() {
                    if numeric(lhs) && numeric(rhs) {
                        Ok(common(lhs, rhs))
                    } else {
                        Err(self.invalid_operands(binary, lhs, rhs))
                    }
                } else if op.is_comparison() {
                    if numeric(lhs) && numeric(rhs) {
                        Ok(BOOL)
                    } else {
                        Err(self.invalid_operands(binary, lhs, rhs))
                    }
                } else if op.is_equality() {
                    if is_assignable(lhs, rhs) || is_assignable(rhs, lhs) {
                        Ok(BOOL)
                    } else {
                        Err(self.invalid_operands(binary, lhs, rhs))
                    }
                } else {
                    if boolean(lhs) && boolean(rhs) {
                        Ok(BOOL)
                    } else {
                        Err(self.invalid_operands(binary, lhs, rhs))
                    }
                }
            }
            BareExpr::Assignment(assignment) => {
                let target = self.infer(&assignment.target)?;
                let value = self.infer(&assignment.value)?;

                match assignment.op.bare.operation() {
                    Some(_) => {
                        let numeric = |ty: BareTy| {
                            !ty.is_array()
                                && (ty.scalar.is_numeric() || ty.scalar == Scalar::Any)
                        };

                        if numeric(target) && numeric(value) {
                            Ok(target)
                        } else {
                            Err(Diagnostic::error()
                                .code(Code::E202)
                                .message(format!(
                                    "invalid operand types for {}: {} and {}",
                                    assignment.op.bare.quote(),
                                    target.quote(),
                                    value.quote(),
                                ))
                                .primary_span(assignment.op.span)
                                .report(self.reporter))
                        }
                    }
                    None => {
                        if is_assignable(target, value) {
                            Ok(target)
                        } else {
                            Err(Diagnostic::error()
                                .code(Code::E202)
                                .message("mismatched types in assignment")
                                .labeled_primary_span(
                                    &assignment.value,
                                    format!("has type {}", value.quote()),
                                )
                                .labeled_secondary_span(
                                    &assignment.target,
                                    format!("expected {}", target.quote()),
                                )
                                .report(self.reporter))
                        }
                    }
                }
            }
            BareExpr::Call(call) => self.infer_call(expr, call, expectation),
            BareExpr::ArrayLiteral(elements) => {
                let Some((first, rest)) = elements.split_first() else {
                    return Err(Diagnostic::error()
                        .code(Code::E212)
                        .message("an array literal needs at least one element")
                        .primary_span(expr)
                        .report(self.reporter));
                };

                let mut element = self.infer(first)?;

                for elem in rest {
                    let ty = self.infer(elem)?;

                    if is_assignable(element, ty) || is_assignable(ty, element) {
                        element = common(element, ty);
                    } else {
                        let error = Diagnostic::error()
                            .code(Code::E212)
                            .message("array elements must have compatible types")
                            .labeled_primary_span(elem, format!("has type {}", ty.quote()))
                            .labeled_secondary_span(
                                first,
                                format!("first element has type {}", element.quote()),
                            )
                            .report(self.reporter);
                        self.health.taint(error);
                    }
                }

                if element.is_array() {
                    return Err(Diagnostic::error()
                        .code(Code::E212)
                        .message("array elements cannot themselves be arrays")
                        .primary_span(expr)
                        .report(self.reporter));
                }

                // The literal stays length-agnostic: stored into a fixed array, it is
                // truncated or zero-filled to the declared length by the lowerer.
                Ok(BareTy::array(element.scalar, Extent::Dynamic))
            }
            BareExpr::ArrayAllocation(allocation) => {
                let length = self.infer(&allocation.length)?;

                if length != INT && length.scalar != Scalar::Any {
                    let error = Diagnostic::error()
                        .code(Code::E209)
                        .message("the array length must be an integer")
                        .labeled_primary_span(
                            &allocation.length,
                            format!("has type {}", length.quote()),
                        )
                        .report(self.reporter);
                    self.health.taint(error);
                }

                Ok(BareTy::array(allocation.element.bare.scalar, Extent::Dynamic))
            }
        }
    }

    fn infer_call(&mut self, expr: &Expr, call: &ast::Call, expectation: BareTy) -> Result<BareTy> {
        let Some((return_ty, function)) = self.table.resolve_function(call.callee.bare) else {
            let message = match self.table.resolve(call.callee.bare) {
                Some(_) => format!("{} is not a function", call.callee.bare.quote()),
                None => format!("undefined function {}", call.callee.bare.quote()),
            };
            return Err(Diagnostic::error()
                .code(Code::E200)
                .message(message)
                .primary_span(call.callee)
                .report(self.reporter));
        };

        let params: Vec<Parameter> = function.params.clone();

        if call.args.len() != params.len() {
            let error = Diagnostic::error()
                .code(Code::E210)
                .message(format!(
                    "wrong number of arguments passed to {}: expected {}, found {}",
                    call.callee.bare.quote(),
                    params.len(),
                    call.args.len(),
                ))
                .primary_span(expr)
                .report(self.reporter);
            self.health.taint(error);
        }

        for (arg, param) in call.args.iter().zip(&params) {
            let ty = match self.infer(arg) {
                Ok(ty) => ty,
                Err(error) => {
                    self.health.taint(error);
                    continue;
                }
            };

            if !is_assignable(param.ty, ty) {
                let error = Diagnostic::error()
                    .code(Code::E211)
                    .message(format!(
                        "mismatched argument type: expected {}, found {}",
                        param.ty.quote(),
                        ty.quote(),
                    ))
                    .primary_span(arg)
                    .report(self.reporter);
                self.health.taint(error);
            }
        }

        for arg in call.args.iter().skip(params.len()) {
            let _ = self.infer(arg).map(drop).stain(&mut self.health);
        }

        // A `malloc`-style call takes the element type of its destination.
        if call.callee.bare == Atom::MALLOC || call.callee.bare == Atom::REALLOC {
            if expectation.is_array() && expectation.scalar != Scalar::Any {
                return Ok(expectation);
            }
        }

        Ok(return_ty)
    }

    fn invalid_operands(
        &self,
        binary: &ast::Binary,
        lhs: BareTy,
        rhs: BareTy,
    ) -> ErasedReportedError {
        Diagnostic::error()
            .code(Code::E202)
            .message(format!(
                "invalid operand types for {}: {} and {}",
                binary.op.bare.quote(),
                lhs.quote(),
                rhs.quote(),
            ))
            .primary_span(binary.op.span)
            .labeled_secondary_span(&binary.lhs, format!("has type {}", lhs.quote()))
            .labeled_secondary_span(&binary.rhs, format!("has type {}", rhs.quote()))
            .report(self.reporter)
    }
}
