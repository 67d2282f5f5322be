//! A deterministic, indented dump of the syntax tree.
//!
//! Not part of the compilation pipeline; used by `--print-ast` and by tests.

use crate::{BareDecl, BareExpr, BareStmt, Block, Decl, Expr, Program, Stmt};
use std::fmt::Write;

pub fn render(program: &Program) -> String {
    let mut renderer = Renderer { output: String::new(), indent: 0 };
    renderer.program(program);
    renderer.output
}

struct Renderer {
    output: String,
    indent: usize,
}

impl Renderer {
    fn line(&mut self, text: impl std::fmt::Display) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        writeln!(self.output, "{text}").unwrap();
    }

    fn indented(&mut self, renderer: impl FnOnce(&mut Self)) {
        self.indent += 1;
        renderer(self);
        self.indent -= 1;
    }

    fn program(&mut self, program: &Program) {
        self.line("Program");
        self.indented(|this| {
            for decl in &program.decls {
                this.decl(decl);
            }
        });
    }

    fn decl(&mut self, decl: &Decl) {
        match &decl.bare {
            BareDecl::Function(function) => {
                self.line(format_args!("Function: {}", function.binder.bare));
                self.indented(|this| {
                    this.line(format_args!("Return Type: {}", function.ty.bare));

                    if !function.params.is_empty() {
                        this.line("Parameters:");
                        this.indented(|this| {
                            for param in &function.params {
                                this.line(format_args!(
                                    "{}: {}",
                                    param.bare.binder.bare, param.bare.ty.bare
                                ));
                            }
                        });
                    }

                    this.line("Body:");
                    this.indented(|this| this.block(&function.body));
                });
            }
        }
    }

    fn block(&mut self, block: &Block) {
        for stmt in &block.bare {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.bare {
            BareStmt::Var(binding) => {
                self.line(format_args!("VarDecl: {}: {}", binding.binder.bare, binding.ty.bare));

                if let Some(initializer) = &binding.initializer {
                    self.indented(|this| {
                        this.line("Initializer:");
                        this.indented(|this| this.expr(initializer));
                    });
                }
            }
            BareStmt::Expr(expr) => {
                self.line("ExprStmt");
                self.indented(|this| this.expr(expr));
            }
            BareStmt::Block(stmts) => {
                self.line("Block");
                self.indented(|this| {
                    for stmt in stmts {
                        this.stmt(stmt);
                    }
                });
            }
            BareStmt::If(if_) => {
                self.line("If");
                self.indented(|this| {
                    this.line("Condition:");
                    this.indented(|this| this.expr(&if_.condition));
                    this.line("Then:");
                    this.indented(|this| this.block(&if_.consequent));

                    if let Some(alternate) = &if_.alternate {
                        this.line("Else:");
                        this.indented(|this| this.stmt(alternate));
                    }
                });
            }
            BareStmt::While(while_) => {
                self.line("While");
                self.indented(|this| {
                    this.line("Condition:");
                    this.indented(|this| this.expr(&while_.condition));
                    this.line("Body:");
                    this.indented(|this| this.block(&while_.body));
                });
            }
            BareStmt::Return(value) => {
                self.line("Return");

                if let Some(value) = value {
                    self.indented(|this| this.expr(value));
                }
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.bare {
            BareExpr::NumberLiteral(number) => self.line(format_args!("Number: {number}")),
            BareExpr::FloatLiteral(number) => self.line(format_args!("Float: {number}")),
            BareExpr::TextLiteral(text) => self.line(format_args!("String: {:?}", text.to_str())),
            BareExpr::BoolLiteral(value) => self.line(format_args!("Bool: {value}")),
            BareExpr::Binding(binder) => self.line(format_args!("Variable: {binder}")),
            BareExpr::Index(index) => {
                self.line("ArrayAccess");
                self.indented(|this| {
                    this.line("Base:");
                    this.indented(|this| this.expr(&index.base));
                    this.line("Index:");
                    this.indented(|this| this.expr(&index.index));
                });
            }
            BareExpr::Unary(unary) => {
                self.line(format_args!("Unary: {}", unary.op.bare));
                self.indented(|this| this.expr(&unary.operand));
            }
            BareExpr::Binary(binary) => {
                self.line(format_args!("Binary: {}", binary.op.bare));
                self.indented(|this| {
                    this.expr(&binary.lhs);
                    this.expr(&binary.rhs);
                });
            }
            BareExpr::Assignment(assignment) => {
                self.line(format_args!("Assign: {}", assignment.op.bare));
                self.indented(|this| {
                    this.expr(&assignment.target);
                    this.expr(&assignment.value);
                });
            }
            BareExpr::Call(call) => {
                self.line(format_args!("Call: {}", call.callee.bare));
                self.indented(|this| {
                    for arg in &call.args {
                        this.expr(arg);
                    }
                });
            }
            BareExpr::ArrayLiteral(elements) => {
                self.line("ArrayInit");
                self.indented(|this| {
                    for element in elements {
                        this.expr(element);
                    }
                });
            }
            BareExpr::ArrayAllocation(allocation) => {
                self.line(format_args!("ArrayAlloc: {}", allocation.element.bare));
                self.indented(|this| {
                    this.line("Size:");
                    this.indented(|this| this.expr(&allocation.length));
                });
            }
            BareExpr::TypeRef(ty) => self.line(format_args!("Type: {}", ty.bare)),
        }
    }
}
