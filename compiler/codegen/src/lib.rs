//! The code generator: lowers a validated [`Program`] to an IR [`Module`].
//!
//! Emission mirrors the semantic analyzer's two passes: phase A declares every
//! function with its lowered signature, phase B lowers the bodies. All
//! temporaries are SSA values; stack slots live at the top of each entry block.

use ast::{BareDecl, BareExpr, BareStmt, BareTy, BinaryOp, Expr, Extent, Stmt};
use diagnostics::{
    error::{ErasedReportedError, Health, Result},
    Code, Diagnostic, Reporter,
};
use ir::{
    verify::verify, BinaryOp as IrOp, Builder, Callee, CastKind, Const, Operand, Rel, Terminator,
    Ty,
};
use span::{Span, Spanning};
use utility::{Atom, HashMap, QuoteExt};

use typer::SymbolTable;

pub mod ty;
#[cfg(test)]
mod test;

/// The size of the stack buffer backing the `input` built-in.
const INPUT_BUFFER_SIZE: u32 = 1024;
/// The size of the conversion buffers backing `itoa` and `ftoa`.
const CONVERSION_BUFFER_SIZE: u32 = 32;
/// The precision `ftoa` formats with.
const FTOA_PRECISION: i32 = 6;

/// Lower the program into a fresh, verified module.
pub fn compile(
    program: &ast::Program,
    table: &SymbolTable,
    name: &str,
    reporter: &Reporter,
) -> Result<ir::Module> {
    let mut module = ir::Module::new(name);
    let externals = declare_runtime(&mut module);

    // Phase A: declare every function with its lowered signature so that
    // calls can reference functions declared later in the source.
    let mut functions = HashMap::default();
    for decl in &program.decls {
        let BareDecl::Function(function) = &decl.bare;

        let params = function.params.iter().map(|param| ty::lower_param(param.bare.ty.bare)).collect::<Vec<_>>();
        let index = ir::FunctionIndex(module.functions.len() as u32);
        module.functions.push(ir::Function {
            name: function.binder.bare,
            values: params.clone(),
            params,
            result: ty::lower(function.ty.bare),
            blocks: Vec::new(),
        });
        functions.insert(function.binder.bare, index);
    }

    // Phase B: lower the bodies.
    let mut health = Health::Untainted;
    for decl in &program.decls {
        let BareDecl::Function(function) = &decl.bare;

        let index = functions[&function.binder.bare];
        let lowerer = Lowerer::new(&mut module, &functions, &externals, table, reporter, function);
        let (lowered, function_health) = lowerer.lower_function(function);
        module.functions[index.0 as usize] = lowered;

        if let Health::Tainted(error) = function_health {
            health.taint(error);
        }
    }

    Result::from(health)?;
    verify(&module, reporter)?;
    Ok(module)
}

/// Declare the C-style runtime helpers the lowerings call into.
fn declare_runtime(module: &mut ir::Module) -> HashMap<&'static str, ir::ExternalIndex> {
    let byte_ptr = || Ty::ptr(Ty::I8);

    let signatures: [(&'static str, Vec<Ty>, Ty, bool); 17] = [
        ("printf", vec![byte_ptr()], Ty::I32, true),
        ("malloc", vec![Ty::I64], byte_ptr(), false),
        ("free", vec![byte_ptr()], Ty::Void, false),
        ("realloc", vec![byte_ptr(), Ty::I64], byte_ptr(), false),
        ("strlen", vec![byte_ptr()], Ty::I64, false),
        ("strcmp", vec![byte_ptr(), byte_ptr()], Ty::I32, false),
        ("strcpy", vec![byte_ptr(), byte_ptr()], byte_ptr(), false),
        ("strcat", vec![byte_ptr(), byte_ptr()], byte_ptr(), false),
        ("pow", vec![Ty::F64, Ty::F64], Ty::F64, false),
        ("sqrt", vec![Ty::F64], Ty::F64, false),
        ("toupper", vec![Ty::I32], Ty::I32, false),
        ("tolower", vec![Ty::I32], Ty::I32, false),
        ("atoi", vec![byte_ptr()], Ty::I32, false),
        ("atof", vec![byte_ptr()], Ty::F64, false),
        ("itoa", vec![Ty::I32, byte_ptr(), Ty::I32], byte_ptr(), false),
        ("ftoa", vec![Ty::F64, byte_ptr(), Ty::I32], byte_ptr(), false),
        ("fgets", vec![byte_ptr(), Ty::I32, byte_ptr()], byte_ptr(), false),
    ];

    let mut externals = HashMap::default();
    for (name, params, result, variadic) in signatures {
        externals.insert(name, module.declare_external(name, params, result, variadic));
    }

    module.declare_global("stdin", byte_ptr());

    externals
}

/// An SSA operand together with its IR type.
#[derive(Clone)]
struct Typed {
    operand: Operand,
    ty: Ty,
}

impl Typed {
    fn new(operand: impl Into<Operand>, ty: Ty) -> Self {
        Self { operand: operand.into(), ty }
    }
}

/// A local's stack slot together with its declared source type.
#[derive(Clone, Copy)]
struct Place {
    slot: ir::Value,
    ty: BareTy,
}

struct Lowerer<'a> {
    module: &'a mut ir::Module,
    functions: &'a HashMap<Atom, ir::FunctionIndex>,
    externals: &'a HashMap<&'static str, ir::ExternalIndex>,
    table: &'a SymbolTable,
    builder: Builder,
    locals: Vec<HashMap<Atom, Place>>,
    health: Health,
    reporter: &'a Reporter,
}

impl<'a> Lowerer<'a> {
    fn new(
        module: &'a mut ir::Module,
        functions: &'a HashMap<Atom, ir::FunctionIndex>,
        externals: &'a HashMap<&'static str, ir::ExternalIndex>,
        table: &'a SymbolTable,
        reporter: &'a Reporter,
        function: &ast::Function,
    ) -> Self {
        let params =
            function.params.iter().map(|param| ty::lower_param(param.bare.ty.bare)).collect();

        Self {
            module,
            functions,
            externals,
            table,
            builder: Builder::new(function.binder.bare, params, ty::lower(function.ty.bare)),
            locals: Vec::new(),
            health: Health::Untainted,
            reporter,
        }
    }

    fn lower_function(mut self, function: &ast::Function) -> (ir::Function, Health) {
        self.enter();

        for (index, param) in function.params.iter().enumerate() {
            let ty = ty::lower_param(param.bare.ty.bare);
            let slot = self.builder.alloca(ty);
            let argument = self.builder.param(index);
            self.builder.store(argument, slot);

            // Fixed-length array parameters have decayed; from here on they
            // behave like dynamic arrays.
            let ty = match param.bare.ty.bare.extent {
                Some(_) => BareTy::array(param.bare.ty.bare.scalar, Extent::Dynamic),
                None => param.bare.ty.bare,
            };
            self.declare_local(param.bare.binder.bare, Place { slot, ty });
        }

        for stmt in &function.body.bare {
            if let Err(error) = self.stmt(stmt) {
                self.health.taint(error);
            }
        }

        if self.builder.is_open() {
            let terminator = match self.builder.result() {
                Ty::Void => Terminator::Return(None),
                result => Terminator::Return(Some(zero(&result).into())),
            };
            self.builder.terminate(terminator);
        }

        self.exit();

        (self.builder.finish(), self.health)
    }

    fn enter(&mut self) {
        self.locals.push(HashMap::default());
    }

    fn exit(&mut self) {
        self.locals.pop();
    }

    fn declare_local(&mut self, binder: Atom, place: Place) {
        self.locals.last_mut().unwrap().insert(binder, place);
    }

    fn local(&self, binder: Atom) -> Option<Place> {
        self.locals.iter().rev().find_map(|scope| scope.get(&binder)).copied()
    }

    fn external(&self, name: &'static str) -> Callee {
        Callee::External(self.externals[name])
    }

    fn bug(&self, span: Span, message: impl Into<utility::Str>) -> ErasedReportedError {
        Diagnostic::error()
            .code(Code::E301)
            .message(message)
            .primary_span(span)
            .report(self.reporter)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result {
        match &stmt.bare {
            BareStmt::Var(binding) => self.local_binding(binding),
            BareStmt::Expr(expr) => {
                let _ = self.expr(expr, None)?;
                Ok(())
            }
            BareStmt::Block(stmts) => {
                self.enter();
                for stmt in stmts {
                    if let Err(error) = self.stmt(stmt) {
                        self.health.taint(error);
                    }
                }
                self.exit();
                Ok(())
            }
            BareStmt::If(if_) => self.if_(if_),
            BareStmt::While(while_) => self.while_(while_),
            BareStmt::Return(value) => self.return_(value.as_ref()),
        }
    }

    fn local_binding(&mut self, binding: &ast::LocalBinding) -> Result {
        let declared = binding.ty.bare;
        let slot_ty = ty::lower(declared);
        let slot = self.builder.alloca(slot_ty.clone());
        self.declare_local(binding.binder.bare, Place { slot, ty: declared });

        let Some(initializer) = &binding.initializer else {
            self.builder.store(zero(&slot_ty), slot);
            return Ok(());
        };

        match (declared.extent, &initializer.bare) {
            (Some(Extent::Fixed(length)), BareExpr::ArrayLiteral(elements)) => {
                self.fixed_array_literal(slot, &slot_ty, length, elements)
            }
            _ => {
                let value = self.expr(initializer, Some(declared))?;
                let value = self.convert(value, &slot_ty, initializer.span())?;
                self.builder.store(value, slot);
                Ok(())
            }
        }
    }

    /// Store an array literal into a fixed-length slot element by element,
    /// truncating surplus elements and zero-filling the remainder.
    fn fixed_array_literal(
        &mut self,
        slot: ir::Value,
        slot_ty: &Ty,
        length: u32,
        elements: &[Expr],
    ) -> Result {
        let element_ty = slot_ty.element().unwrap().clone();

        for (index, element) in elements.iter().take(length as usize).enumerate() {
            let target = self.builder.element_ptr(
                slot_ty.clone(),
                element_ty.clone(),
                slot,
                vec![Const::I32(0).into(), Const::I32(index as i32).into()],
            );
            let value = self.expr(element, None)?;
            let value = self.convert(value, &element_ty, element.span())?;
            self.builder.store(value, target);
        }

        for index in elements.len()..length as usize {
            let target = self.builder.element_ptr(
                slot_ty.clone(),
                element_ty.clone(),
                slot,
                vec![Const::I32(0).into(), Const::I32(index as i32).into()],
            );
            self.builder.store(zero(&element_ty), target);
        }

        Ok(())
    }

    fn if_(&mut self, if_: &ast::If) -> Result {
        let condition = self.expr(&if_.condition, None)?;

        let consequent = self.builder.block("then");
        let alternate = if_.alternate.as_ref().map(|_| self.builder.block("else"));
        let merge = self.builder.block("ifcont");

        self.builder.terminate(Terminator::CondBranch {
            condition: condition.operand,
            consequent,
            alternate: alternate.unwrap_or(merge),
        });

        self.builder.position_at(consequent);
        self.enter();
        for stmt in &if_.consequent.bare {
            if let Err(error) = self.stmt(stmt) {
                self.health.taint(error);
            }
        }
        self.exit();
        if self.builder.is_open() {
            self.builder.terminate(Terminator::Branch(merge));
        }

        if let (Some(block), Some(stmt)) = (alternate, &if_.alternate) {
            self.builder.position_at(block);
            if let Err(error) = self.stmt(stmt) {
                self.health.taint(error);
            }
            if self.builder.is_open() {
                self.builder.terminate(Terminator::Branch(merge));
            }
        }

        self.builder.position_at(merge);
        Ok(())
    }

    fn while_(&mut self, while_: &ast::While) -> Result {
        let condition = self.builder.block("whilecond");
        let body = self.builder.block("whilebody");
        let end = self.builder.block("whileend");

        self.builder.terminate(Terminator::Branch(condition));

        self.builder.position_at(condition);
        let value = self.expr(&while_.condition, None)?;
        // Nonzero is true.
        let nonzero = self.builder.cmp(
            Rel::Ne,
            value.ty.clone(),
            value.operand,
            zero(&value.ty),
        );
        self.builder.terminate(Terminator::CondBranch {
            condition: nonzero.into(),
            consequent: body,
            alternate: end,
        });

        self.builder.position_at(body);
        self.enter();
        for stmt in &while_.body.bare {
            if let Err(error) = self.stmt(stmt) {
                self.health.taint(error);
            }
        }
        self.exit();
        self.builder.terminate(Terminator::Branch(condition));

        self.builder.position_at(end);
        Ok(())
    }

    fn return_(&mut self, value: Option<&Expr>) -> Result {
        match value {
            None => self.builder.terminate(Terminator::Return(None)),
            Some(value) => {
                let result = self.builder.result();
                let lowered = self.expr(value, None)?;
                let lowered = self.convert(lowered, &result, value.span())?;
                self.builder.terminate(Terminator::Return(Some(lowered)));
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, expected: Option<BareTy>) -> Result<Typed> {
        let span = expr.span();

        match &expr.bare {
            BareExpr::NumberLiteral(number) => {
                let value: i32 = number.to_str().parse().map_err(|_| {
                    self.bug(span, format!("number literal {} is out of range", number.quote()))
                })?;
                Ok(Typed::new(Const::I32(value), Ty::I32))
            }
            BareExpr::FloatLiteral(number) => {
                let value: f64 = number.to_str().parse().map_err(|_| {
                    self.bug(span, format!("float literal {} is out of range", number.quote()))
                })?;
                Ok(Typed::new(Const::F64(value), Ty::F64))
            }
            BareExpr::TextLiteral(text) => {
                let index = self.module.intern_string(text.to_str());
                Ok(Typed::new(Const::Str(index), Ty::ptr(Ty::I8)))
            }
            BareExpr::BoolLiteral(value) => Ok(Typed::new(Const::I1(*value), Ty::I1)),
            BareExpr::Binding(binder) => {
                let Some(place) = self.local(*binder) else {
                    return Err(self.bug(span, format!("unresolved binding {}", binder.quote())));
                };

                let slot_ty = ty::lower(place.ty);
                match place.ty.extent {
                    // Fixed arrays are used by address.
                    Some(Extent::Fixed(_)) => {
                        Ok(Typed::new(place.slot, Ty::ptr(slot_ty)))
                    }
                    _ => Ok(Typed::new(self.builder.load(slot_ty.clone(), place.slot), slot_ty)),
                }
            }
            BareExpr::Index(index) => {
                let (element_ptr, element_ty) = self.element_pointer(index, span)?;
                Ok(Typed::new(
                    self.builder.load(element_ty.clone(), element_ptr),
                    element_ty,
                ))
            }
            BareExpr::Unary(unary) => {
                let operand = self.expr(&unary.operand, None)?;

                match unary.op.bare {
                    ast::UnaryOp::Negate => {
                        if operand.ty.is_float() {
                            Ok(Typed::new(self.builder.fneg(operand.operand), Ty::F64))
                        } else {
                            let value = self.builder.binary(
                                IrOp::Sub,
                                operand.ty.clone(),
                                Const::I32(0),
                                operand.operand,
                            );
                            Ok(Typed::new(value, operand.ty))
                        }
                    }
                    ast::UnaryOp::Not => {
                        let value = self.builder.binary(
                            IrOp::Xor,
                            Ty::I1,
                            operand.operand,
                            Const::I1(true),
                        );
                        Ok(Typed::new(value, Ty::I1))
                    }
                }
            }
            BareExpr::Binary(binary) => self.binary(binary, span),
            BareExpr::Assignment(assignment) => self.assignment(assignment, span),
            BareExpr::Call(call) => self.call(call, expected, span),
            BareExpr::ArrayLiteral(elements) => self.array_literal(elements, span),
            BareExpr::ArrayAllocation(allocation) => self.array_allocation(allocation),
            BareExpr::TypeRef(_) => {
                Err(self.bug(span, "a bare type is only meaningful as the argument of ‘sizeof’"))
            }
        }
    }

    fn binary(&mut self, binary: &ast::Binary, span: Span) -> Result<Typed> {
        let lhs = self.expr(&binary.lhs, None)?;
        let rhs = self.expr(&binary.rhs, None)?;
        let (lhs, rhs, ty) = self.promote(lhs, rhs, span)?;

        let op = binary.op.bare;

        if op.is_arithmetic() {
            let op = match op {
                BinaryOp::Add => IrOp::Add,
                BinaryOp::Subtract => IrOp::Sub,
                BinaryOp::Multiply => IrOp::Mul,
                _ => IrOp::Div,
            };
            let value = self.builder.binary(op, ty.clone(), lhs, rhs);
            Ok(Typed::new(value, ty))
        } else if op.is_logical() {
            let op = match op {
                BinaryOp::And => IrOp::And,
                _ => IrOp::Or,
            };
            let value = self.builder.binary(op, Ty::I1, lhs, rhs);
            Ok(Typed::new(value, Ty::I1))
        } else {
            let rel = match op {
                BinaryOp::Equal => Rel::Eq,
                BinaryOp::NotEqual => Rel::Ne,
                BinaryOp::Less => Rel::Lt,
                BinaryOp::LessEqual => Rel::Le,
                BinaryOp::Greater => Rel::Gt,
                _ => Rel::Ge,
            };
            // Relations on doubles use ordered predicates.
            let value = self.builder.cmp(rel, ty, lhs, rhs);
            Ok(Typed::new(value, Ty::I1))
        }
    }

    fn assignment(&mut self, assignment: &ast::Assignment, span: Span) -> Result<Typed> {
        let (target, pointee, source_ty) = self.place(&assignment.target, span)?;

        match assignment.op.bare.operation() {
            Some(op) => {
                let current = self.builder.load(pointee.clone(), target.clone());
                let value = self.expr(&assignment.value, None)?;
                let value = self.convert(value, &pointee, assignment.value.span())?;

                let op = match op {
                    BinaryOp::Add => IrOp::Add,
                    BinaryOp::Subtract => IrOp::Sub,
                    BinaryOp::Multiply => IrOp::Mul,
                    _ => IrOp::Div,
                };
                let result = self.builder.binary(op, pointee.clone(), current, value);
                self.builder.store(result, target);
                Ok(Typed::new(result, pointee))
            }
            None => {
                let value = self.expr(&assignment.value, source_ty)?;
                let value = self.convert(value, &pointee, assignment.value.span())?;
                self.builder.store(value.clone(), target);
                Ok(Typed::new(value, pointee))
            }
        }
    }

    /// Compute the address an assignment writes through, together with the
    /// pointee type and, for whole variables, the declared source type.
    fn place(&mut self, target: &Expr, span: Span) -> Result<(Operand, Ty, Option<BareTy>)> {
        match &target.bare {
            BareExpr::Binding(binder) => {
                let Some(place) = self.local(*binder) else {
                    return Err(self.bug(span, format!("unresolved binding {}", binder.quote())));
                };

                let pointee = match self.builder.ty_of(&place.slot.into()) {
                    Ty::Ptr(pointee) => *pointee,
                    _ => return Err(self.bug(span, "a stack slot is not a pointer")),
                };
                Ok((place.slot.into(), pointee, Some(place.ty)))
            }
            BareExpr::Index(index) => {
                let (element_ptr, element_ty) = self.element_pointer(index, span)?;
                Ok((element_ptr.into(), element_ty, None))
            }
            _ => Err(self.bug(span, "invalid assignment target")),
        }
    }

    /// Produce a pointer to the indexed element, choosing between fixed-array
    /// addressing (leading zero index) and dynamic-array addressing (loaded
    /// base pointer, single index).
    fn element_pointer(&mut self, index: &ast::Index, span: Span) -> Result<(ir::Value, Ty)> {
        let index_value = self.expr(&index.index, None)?;
        let index_value = self.convert(index_value, &Ty::I32, index.index.span())?;

        if let BareExpr::Binding(binder) = &index.base.bare {
            let Some(place) = self.local(*binder) else {
                return Err(self.bug(span, format!("unresolved binding {}", binder.quote())));
            };

            let element_ty = ty::lower(place.ty.element());

            return Ok(match place.ty.extent {
                Some(Extent::Fixed(_)) => {
                    let array_ty = ty::lower(place.ty);
                    let ptr = self.builder.element_ptr(
                        array_ty,
                        element_ty.clone(),
                        place.slot,
                        vec![Const::I32(0).into(), index_value],
                    );
                    (ptr, element_ty)
                }
                Some(Extent::Dynamic) => {
                    let base = self.builder.load(Ty::ptr(element_ty.clone()), place.slot);
                    let ptr = self.builder.element_ptr(
                        element_ty.clone(),
                        element_ty.clone(),
                        base,
                        vec![index_value],
                    );
                    (ptr, element_ty)
                }
                None => {
                    return Err(self.bug(span, format!("{} is not an array", binder.quote())));
                }
            });
        }

        let base = self.expr(&index.base, None)?;
        let element_ty = match &base.ty {
            Ty::Ptr(element) => (**element).clone(),
            _ => return Err(self.bug(span, "the base of an array access is not a pointer")),
        };
        let ptr = self.builder.element_ptr(
            element_ty.clone(),
            element_ty.clone(),
            base.operand,
            vec![index_value],
        );
        Ok((ptr, element_ty))
    }

    /// Lower an array literal in expression position: a stack array sized to
    /// the literal whose decayed base address is the value.
    fn array_literal(&mut self, elements: &[Expr], span: Span) -> Result<Typed> {
        let Some(first) = elements.first() else {
            return Err(self.bug(span, "an array literal needs at least one element"));
        };

        let first = self.expr(first, None)?;
        let element_ty = first.ty.clone();
        let array_ty = Ty::array(elements.len() as u32, element_ty.clone());
        let slot = self.builder.alloca(array_ty.clone());

        let target = self.builder.element_ptr(
            array_ty.clone(),
            element_ty.clone(),
            slot,
            vec![Const::I32(0).into(), Const::I32(0).into()],
        );
        self.builder.store(first.operand, target);

        for (index, element) in elements.iter().enumerate().skip(1) {
            let value = self.expr(element, None)?;
            let value = self.convert(value, &element_ty, element.span())?;
            let target = self.builder.element_ptr(
                array_ty.clone(),
                element_ty.clone(),
                slot,
                vec![Const::I32(0).into(), Const::I32(index as i32).into()],
            );
            self.builder.store(value, target);
        }

        let base = self.builder.element_ptr(
            array_ty,
            element_ty.clone(),
            slot,
            vec![Const::I32(0).into(), Const::I32(0).into()],
        );
        Ok(Typed::new(base, Ty::ptr(element_ty)))
    }

    /// Lower `T[n]`: `n * sizeof(T)` bytes from `malloc`, cast to `T*`.
    fn array_allocation(&mut self, allocation: &ast::ArrayAllocation) -> Result<Typed> {
        let length = self.expr(&allocation.length, None)?;
        let length = self.convert(length, &Ty::I32, allocation.length.span())?;

        let element_ty = ty::lower(allocation.element.bare);
        let length = self.builder.cast(CastKind::SExt, length, Ty::I64);
        let total = self.builder.binary(
            IrOp::Mul,
            Ty::I64,
            length,
            Const::I64(element_ty.size() as i64),
        );

        let raw = self
            .builder
            .call(self.external("malloc"), vec![total.into()], Ty::ptr(Ty::I8))
            .unwrap();
        let typed = self.builder.cast(CastKind::Bitcast, raw, Ty::ptr(element_ty.clone()));
        Ok(Typed::new(typed, Ty::ptr(element_ty)))
    }

    fn call(&mut self, call: &ast::Call, expected: Option<BareTy>, span: Span) -> Result<Typed> {
        // Built-ins take precedence over user functions of the same name.
        match call.callee.bare {
            Atom::PRINT => return self.print_call(call, span),
            Atom::INPUT => return self.input_call(call),
            Atom::MALLOC => return self.malloc_call(call, expected, span),
            Atom::FREE => return self.free_call(call, span),
            Atom::REALLOC => return self.realloc_call(call, span),
            Atom::STRLEN => return self.strlen_call(call, span),
            Atom::SIZEOF => return self.sizeof_call(call, span),
            Atom::ATOI => return self.conversion_call(call, "atoi", span),
            Atom::ATOF => return self.conversion_call(call, "atof", span),
            Atom::ITOA => return self.itoa_call(call, span),
            Atom::FTOA => return self.ftoa_call(call, span),
            _ => {}
        }

        let Some(&index) = self.functions.get(&call.callee.bare) else {
            return Err(self.bug(span, format!("undefined function {}", call.callee.bare.quote())));
        };
        let Some((return_ty, symbol)) = self.table.resolve_function(call.callee.bare) else {
            return Err(self.bug(span, format!("unresolved function {}", call.callee.bare.quote())));
        };

        if call.args.len() != symbol.params.len() {
            return Err(self.bug(
                span,
                format!("wrong number of arguments for {}", call.callee.bare.quote()),
            ));
        }

        let params: Vec<typer::Parameter> = symbol.params.clone();
        let mut args = Vec::new();
        for (arg, param) in call.args.iter().zip(&params) {
            let value = self.expr(arg, Some(param.ty))?;
            let value = self.decay(value);
            let target = ty::lower_param(param.ty);
            args.push(self.convert(value, &target, arg.span())?);
        }

        let result = ty::lower(return_ty);
        let value = self.builder.call(Callee::Function(index), args, result.clone());
        match value {
            Some(value) => Ok(Typed::new(value, result)),
            None => Ok(Typed::new(Const::I32(0), Ty::Void)),
        }
    }

    /// `print(value)`: pick a format string by the lowered type and call `printf`.
    fn print_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [argument] = call.args.as_slice() else {
            return Err(self.bug(span, "‘print’ requires exactly one argument"));
        };

        let value = self.expr(argument, None)?;

        let (format, argument) = match &value.ty {
            Ty::I32 => ("%d", value.operand),
            Ty::F64 => ("%f", value.operand),
            Ty::I1 => {
                let consequent = self.string("true");
                let alternate = self.string("false");
                let text = self.builder.select(
                    Ty::ptr(Ty::I8),
                    value.operand,
                    consequent,
                    alternate,
                );
                ("%s", text.into())
            }
            Ty::Ptr(pointee) => match **pointee {
                Ty::I8 => ("%s", value.operand),
                // A bare pointer to an integer is printed through a load.
                Ty::I32 => {
                    let loaded = self.builder.load(Ty::I32, value.operand);
                    ("%d", loaded.into())
                }
                _ => {
                    return Err(self.bug(span, "unsupported operand type for ‘print’"));
                }
            },
            _ => return Err(self.bug(span, "unsupported operand type for ‘print’")),
        };

        let format = self.string(format);
        let result = self
            .builder
            .call(self.external("printf"), vec![format, argument], Ty::I32)
            .unwrap();
        Ok(Typed::new(result, Ty::I32))
    }

    /// `input(prompt?)`: print the prompt, `fgets` into a stack buffer, trim
    /// the trailing line break, yield the buffer.
    fn input_call(&mut self, call: &ast::Call) -> Result<Typed> {
        let buffer_ty = Ty::array(INPUT_BUFFER_SIZE, Ty::I8);
        let buffer = self.builder.alloca(buffer_ty.clone());

        if let Some(prompt) = call.args.first() {
            let prompt = self.expr(prompt, None)?;
            let format = self.string("%s");
            self.builder.call(
                self.external("printf"),
                vec![format, prompt.operand],
                Ty::I32,
            );
        }

        let stdin = self.builder.load(
            Ty::ptr(Ty::I8),
            Const::Global("stdin", Ty::ptr(Ty::I8)),
        );

        let buffer_ptr = self.builder.element_ptr(
            buffer_ty.clone(),
            Ty::I8,
            buffer,
            vec![Const::I32(0).into(), Const::I32(0).into()],
        );

        self.builder.call(
            self.external("fgets"),
            vec![
                buffer_ptr.into(),
                Const::I32(INPUT_BUFFER_SIZE as i32).into(),
                stdin.into(),
            ],
            Ty::ptr(Ty::I8),
        );

        // Trim the trailing line break: buffer[strlen(buffer) - 1] == '\n'.
        let length = self
            .builder
            .call(self.external("strlen"), vec![buffer_ptr.into()], Ty::I64)
            .unwrap();
        let length = self.builder.cast(CastKind::Trunc, length, Ty::I32);
        let last = self.builder.binary(IrOp::Sub, Ty::I32, length, Const::I32(1));
        let last_ptr = self.builder.element_ptr(
            buffer_ty,
            Ty::I8,
            buffer,
            vec![Const::I32(0).into(), last.into()],
        );
        let last_char = self.builder.load(Ty::I8, last_ptr);
        let is_line_break = self.builder.cmp(Rel::Eq, Ty::I8, last_char, Const::I8(b'\n'));

        let trim = self.builder.block("remove_newline");
        let merge = self.builder.block("continue");
        self.builder.terminate(Terminator::CondBranch {
            condition: is_line_break.into(),
            consequent: trim,
            alternate: merge,
        });

        self.builder.position_at(trim);
        self.builder.store(Const::I8(0), last_ptr);
        self.builder.terminate(Terminator::Branch(merge));

        self.builder.position_at(merge);
        Ok(Typed::new(buffer_ptr, Ty::ptr(Ty::I8)))
    }

    /// `malloc(size)`: widen the size to 64 bits and cast the result to the
    /// element pointer type expected by the surrounding declaration.
    fn malloc_call(&mut self, call: &ast::Call, expected: Option<BareTy>, span: Span) -> Result<Typed> {
        let [size] = call.args.as_slice() else {
            return Err(self.bug(span, "‘malloc’ requires exactly one size argument"));
        };

        let size = self.expr(size, None)?;
        let size = self.builder.cast(CastKind::SExt, size.operand, Ty::I64);

        let raw = self
            .builder
            .call(self.external("malloc"), vec![size.into()], Ty::ptr(Ty::I8))
            .unwrap();

        let element_ty = match expected {
            Some(ty) if ty.is_array() => ty::lower(ty.element()),
            _ => Ty::I8,
        };
        let typed = self.builder.cast(CastKind::Bitcast, raw, Ty::ptr(element_ty.clone()));
        Ok(Typed::new(typed, Ty::ptr(element_ty)))
    }

    /// `free(ptr)`: cast to an opaque byte pointer and call the runtime.
    fn free_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [pointer] = call.args.as_slice() else {
            return Err(self.bug(span, "‘free’ requires exactly one pointer argument"));
        };

        let pointer = self.expr(pointer, None)?;
        let pointer = self.builder.cast(CastKind::Bitcast, pointer.operand, Ty::ptr(Ty::I8));
        self.builder.call(self.external("free"), vec![pointer.into()], Ty::Void);
        Ok(Typed::new(Const::I32(0), Ty::Void))
    }

    /// `realloc(ptr, size)`: through an opaque byte pointer and back.
    fn realloc_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [pointer, size] = call.args.as_slice() else {
            return Err(self.bug(span, "‘realloc’ requires a pointer and a size argument"));
        };

        let pointer = self.expr(pointer, None)?;
        let original_ty = pointer.ty.clone();
        let opaque = self.builder.cast(CastKind::Bitcast, pointer.operand, Ty::ptr(Ty::I8));

        let size = self.expr(size, None)?;
        let size = self.builder.cast(CastKind::SExt, size.operand, Ty::I64);

        let raw = self
            .builder
            .call(
                self.external("realloc"),
                vec![opaque.into(), size.into()],
                Ty::ptr(Ty::I8),
            )
            .unwrap();
        let result = self.builder.cast(CastKind::Bitcast, raw, original_ty.clone());
        Ok(Typed::new(result, original_ty))
    }

    /// `strlen(text)`: call the runtime and truncate to 32 bits.
    fn strlen_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [text] = call.args.as_slice() else {
            return Err(self.bug(span, "‘strlen’ requires exactly one string argument"));
        };

        let text = self.expr(text, None)?;
        let length = self
            .builder
            .call(self.external("strlen"), vec![text.operand], Ty::I64)
            .unwrap();
        let length = self.builder.cast(CastKind::Trunc, length, Ty::I32);
        Ok(Typed::new(length, Ty::I32))
    }

    /// `sizeof(type)`: a compile-time constant.
    fn sizeof_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [argument] = call.args.as_slice() else {
            return Err(self.bug(span, "‘sizeof’ requires exactly one argument"));
        };

        let BareExpr::TypeRef(ty) = &argument.bare else {
            return Err(self.bug(argument.span(), "the argument of ‘sizeof’ must be a type"));
        };

        let size = ty::lower(ty.bare).size();
        Ok(Typed::new(Const::I32(size as i32), Ty::I32))
    }

    /// `atoi`/`atof`: call the corresponding runtime helper by name.
    fn conversion_call(
        &mut self,
        call: &ast::Call,
        name: &'static str,
        span: Span,
    ) -> Result<Typed> {
        let [argument] = call.args.as_slice() else {
            return Err(self.bug(span, format!("{} requires exactly one argument", name.quote())));
        };

        let argument = self.expr(argument, None)?;
        let result = match name {
            "atoi" => Ty::I32,
            _ => Ty::F64,
        };
        let value = self
            .builder
            .call(self.external(name), vec![argument.operand], result.clone())
            .unwrap();
        Ok(Typed::new(value, result))
    }

    /// `itoa(value)`: format into a stack buffer, yield the buffer.
    fn itoa_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [value] = call.args.as_slice() else {
            return Err(self.bug(span, "‘itoa’ requires exactly one argument"));
        };

        let value = self.expr(value, None)?;
        let buffer = self.conversion_buffer();
        let result = self
            .builder
            .call(
                self.external("itoa"),
                vec![value.operand, buffer.into(), Const::I32(10).into()],
                Ty::ptr(Ty::I8),
            )
            .unwrap();
        Ok(Typed::new(result, Ty::ptr(Ty::I8)))
    }

    /// `ftoa(value)`: format into a stack buffer, yield the buffer.
    fn ftoa_call(&mut self, call: &ast::Call, span: Span) -> Result<Typed> {
        let [value] = call.args.as_slice() else {
            return Err(self.bug(span, "‘ftoa’ requires exactly one argument"));
        };

        let value = self.expr(value, None)?;
        let buffer = self.conversion_buffer();
        let result = self
            .builder
            .call(
                self.external("ftoa"),
                vec![value.operand, buffer.into(), Const::I32(FTOA_PRECISION).into()],
                Ty::ptr(Ty::I8),
            )
            .unwrap();
        Ok(Typed::new(result, Ty::ptr(Ty::I8)))
    }

    fn conversion_buffer(&mut self) -> ir::Value {
        let buffer_ty = Ty::array(CONVERSION_BUFFER_SIZE, Ty::I8);
        let buffer = self.builder.alloca(buffer_ty.clone());
        self.builder.element_ptr(
            buffer_ty,
            Ty::I8,
            buffer,
            vec![Const::I32(0).into(), Const::I32(0).into()],
        )
    }

    /// Decay the address of a fixed array to a pointer to its first element.
    fn decay(&mut self, value: Typed) -> Typed {
        if let Ty::Ptr(pointee) = &value.ty {
            if let Ty::Array(_, element) = &**pointee {
                let element = (**element).clone();
                let ptr = self.builder.element_ptr(
                    (**pointee).clone(),
                    element.clone(),
                    value.operand,
                    vec![Const::I32(0).into(), Const::I32(0).into()],
                );
                return Typed::new(ptr, Ty::ptr(element));
            }
        }
        value
    }

    fn string(&mut self, content: &str) -> Operand {
        Const::Str(self.module.intern_string(content)).into()
    }

    /// Promote two operands to their common type: double if either side is a
    /// double, otherwise the wider integer.
    fn promote(&mut self, lhs: Typed, rhs: Typed, span: Span) -> Result<(Operand, Operand, Ty)> {
        if lhs.ty == rhs.ty {
            let ty = lhs.ty.clone();
            return Ok((lhs.operand, rhs.operand, ty));
        }

        if lhs.ty.is_float() || rhs.ty.is_float() {
            let lhs = self.convert(lhs, &Ty::F64, span)?;
            let rhs = self.convert(rhs, &Ty::F64, span)?;
            return Ok((lhs, rhs, Ty::F64));
        }

        let lhs = self.convert(lhs, &Ty::I32, span)?;
        let rhs = self.convert(rhs, &Ty::I32, span)?;
        Ok((lhs, rhs, Ty::I32))
    }

    /// Coerce a value to the target type, inserting the matching cast.
    fn convert(&mut self, value: Typed, target: &Ty, span: Span) -> Result<Operand> {
        if value.ty == *target {
            return Ok(value.operand);
        }

        let cast = match (&value.ty, target) {
            (Ty::I32 | Ty::I8 | Ty::I1, Ty::F64) => CastKind::SiToFp,
            (Ty::F64, Ty::I32 | Ty::I64) => CastKind::FpToSi,
            (Ty::I1, Ty::I8 | Ty::I32 | Ty::I64)
            | (Ty::I8, Ty::I32 | Ty::I64)
            | (Ty::I32, Ty::I64) => CastKind::SExt,
            (Ty::I64, Ty::I32 | Ty::I8) | (Ty::I32, Ty::I8 | Ty::I1) => CastKind::Trunc,
            (Ty::Ptr(_), Ty::Ptr(_)) => CastKind::Bitcast,
            _ => {
                return Err(self.bug(
                    span,
                    format!("no conversion from ‘{}’ to ‘{target}’", value.ty),
                ));
            }
        };

        Ok(self.builder.cast(cast, value.operand, target.clone()).into())
    }
}

/// The zero value of a lowered type.
fn zero(ty: &Ty) -> Const {
    match ty {
        Ty::I1 => Const::I1(false),
        Ty::I8 => Const::I8(0),
        Ty::I32 => Const::I32(0),
        Ty::I64 => Const::I64(0),
        Ty::F64 => Const::F64(0.0),
        Ty::Ptr(_) => Const::Null(ty.clone()),
        Ty::Array(..) => Const::Zero(ty.clone()),
        Ty::Void => Const::I32(0),
    }
}
