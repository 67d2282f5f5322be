//! The textual writer. The output is LLVM-flavored assembly suitable for
//! later lowering; `--print-ir` and `-o` both go through [`std::fmt::Display`].

use crate::{
    BinaryOp, Block, Callee, CastKind, Const, External, Function, Global, Inst, Module, Operand,
    Rel, Terminator, Ty,
};
use std::fmt;

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I1 => f.write_str("i1"),
            Self::I8 => f.write_str("i8"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::F64 => f.write_str("double"),
            Self::Void => f.write_str("void"),
            Self::Ptr(pointee) => write!(f, "{pointee}*"),
            Self::Array(length, element) => write!(f, "[{length} x {element}]"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;

        if !self.externals.is_empty() {
            writeln!(f)?;
        }
        for external in &self.externals {
            write!(f, "{external}")?;
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for global in &self.globals {
            write!(f, "{global}")?;
        }

        if !self.strings.is_empty() {
            writeln!(f)?;
        }
        for (index, string) in self.strings.iter().enumerate() {
            writeln!(
                f,
                "@str.{index} = private constant [{} x i8] c\"{}\\00\"",
                string.len() + 1,
                escape(string),
            )?;
        }

        for function in &self.functions {
            writeln!(f)?;
            write_function(function, self, f)?;
        }

        Ok(())
    }
}

impl fmt::Display for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "declare {} @{}(", self.result, self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        if self.variadic {
            write!(f, ", ...")?;
        }
        writeln!(f, ")")
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@{} = external global {}", self.name, self.ty)
    }
}

fn write_function(function: &Function, module: &Module, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "define {} @{}(", function.result, function.name)?;
    for (index, param) in function.params.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{param} %{index}")?;
    }
    writeln!(f, ") {{")?;

    for (index, block) in function.blocks.iter().enumerate() {
        if index > 0 {
            writeln!(f)?;
        }
        write_block(block, function, module, f)?;
    }

    writeln!(f, "}}")
}

fn write_block(
    block: &Block,
    function: &Function,
    module: &Module,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    writeln!(f, "{}:", block.name)?;

    for inst in &block.insts {
        write!(f, "  ")?;
        write_inst(inst, function, module, f)?;
        writeln!(f)?;
    }

    write!(f, "  ")?;
    write_terminator(&block.terminator, function, f)?;
    writeln!(f)
}

struct DisplayOperand<'a> {
    operand: &'a Operand,
}

impl fmt::Display for DisplayOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Value(value) => write!(f, "%{}", value.0),
            Operand::Const(constant) => match constant {
                Const::I1(value) => write!(f, "{value}"),
                Const::I8(value) => write!(f, "{value}"),
                Const::I32(value) => write!(f, "{value}"),
                Const::I64(value) => write!(f, "{value}"),
                Const::F64(value) => {
                    if value.fract() == 0.0 && value.is_finite() {
                        write!(f, "{value:.1}")
                    } else {
                        write!(f, "{value}")
                    }
                }
                Const::Zero(_) => f.write_str("zeroinitializer"),
                Const::Null(_) => f.write_str("null"),
                Const::Str(index) => write!(f, "@str.{index}"),
                Const::Global(name, _) => write!(f, "@{name}"),
            },
        }
    }
}

fn operand(operand: &Operand) -> DisplayOperand<'_> {
    DisplayOperand { operand }
}

fn write_inst(
    inst: &Inst,
    function: &Function,
    module: &Module,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match inst {
        Inst::Alloca { dst, ty } => write!(f, "%{} = alloca {ty}", dst.0),
        Inst::Load { dst, ty, source } => {
            write!(f, "%{} = load {ty}, {ty}* {}", dst.0, operand(source))
        }
        Inst::Store { value, target } => {
            let ty = function.ty_of(value);
            write!(f, "store {ty} {}, {ty}* {}", operand(value), operand(target))
        }
        Inst::ElementPtr { dst, ty, base, indices } => {
            write!(f, "%{} = getelementptr inbounds {ty}, {ty}* {}", dst.0, operand(base))?;
            for index in indices {
                write!(f, ", {} {}", function.ty_of(index), operand(index))?;
            }
            Ok(())
        }
        Inst::Binary { dst, op, ty, lhs, rhs } => {
            let mnemonic = match (op, ty.is_float()) {
                (BinaryOp::Add, false) => "add",
                (BinaryOp::Add, true) => "fadd",
                (BinaryOp::Sub, false) => "sub",
                (BinaryOp::Sub, true) => "fsub",
                (BinaryOp::Mul, false) => "mul",
                (BinaryOp::Mul, true) => "fmul",
                (BinaryOp::Div, false) => "sdiv",
                (BinaryOp::Div, true) => "fdiv",
                (BinaryOp::And, _) => "and",
                (BinaryOp::Or, _) => "or",
                (BinaryOp::Xor, _) => "xor",
            };
            write!(f, "%{} = {mnemonic} {ty} {}, {}", dst.0, operand(lhs), operand(rhs))
        }
        Inst::Cmp { dst, rel, ty, lhs, rhs } => {
            let (inst_name, pred) = if ty.is_float() {
                let pred = match rel {
                    Rel::Eq => "oeq",
                    Rel::Ne => "one",
                    Rel::Lt => "olt",
                    Rel::Le => "ole",
                    Rel::Gt => "ogt",
                    Rel::Ge => "oge",
                };
                ("fcmp", pred)
            } else {
                let pred = match rel {
                    Rel::Eq => "eq",
                    Rel::Ne => "ne",
                    Rel::Lt => "slt",
                    Rel::Le => "sle",
                    Rel::Gt => "sgt",
                    Rel::Ge => "sge",
                };
                ("icmp", pred)
            };
            write!(f, "%{} = {inst_name} {pred} {ty} {}, {}", dst.0, operand(lhs), operand(rhs))
        }
        Inst::FNeg { dst, operand: value } => write!(f, "%{} = fneg double {}", dst.0, operand(value)),
        Inst::Cast { dst, kind, operand: value, ty } => {
            let mnemonic = match kind {
                CastKind::SExt => "sext",
                CastKind::Trunc => "trunc",
                CastKind::SiToFp => "sitofp",
                CastKind::FpToSi => "fptosi",
                CastKind::Bitcast => "bitcast",
            };
            let from = function.ty_of(value);
            write!(f, "%{} = {mnemonic} {from} {} to {ty}", dst.0, operand(value))
        }
        Inst::Call { dst, callee, args } => {
            if let Some(dst) = dst {
                write!(f, "%{} = ", dst.0)?;
            }

            let (name, result, variadic_signature) = match callee {
                Callee::Function(index) => {
                    let callee = &module.functions[index.0 as usize];
                    (callee.name.to_str(), callee.result.clone(), None)
                }
                Callee::External(index) => {
                    let callee = &module.externals[index.0 as usize];
                    let signature = callee.variadic.then(|| {
                        let params = callee
                            .params
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("({params}, ...)")
                    });
                    (callee.name, callee.result.clone(), signature)
                }
            };

            match variadic_signature {
                Some(signature) => write!(f, "call {result} {signature} @{name}(")?,
                None => write!(f, "call {result} @{name}(")?,
            }

            for (index, arg) in args.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", function.ty_of(arg), operand(arg))?;
            }
            write!(f, ")")
        }
        Inst::Select { dst, ty, condition, consequent, alternate } => write!(
            f,
            "%{} = select i1 {}, {ty} {}, {ty} {}",
            dst.0,
            operand(condition),
            operand(consequent),
            operand(alternate),
        ),
    }
}

fn write_terminator(
    terminator: &Terminator,
    function: &Function,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match terminator {
        Terminator::Branch(target) => {
            write!(f, "br label %{}", function.blocks[target.0 as usize].name)
        }
        Terminator::CondBranch { condition, consequent, alternate } => write!(
            f,
            "br i1 {}, label %{}, label %{}",
            operand(condition),
            function.blocks[consequent.0 as usize].name,
            function.blocks[alternate.0 as usize].name,
        ),
        Terminator::Return(None) => f.write_str("ret void"),
        Terminator::Return(Some(value)) => {
            write!(f, "ret {} {}", function.ty_of(value), operand(value))
        }
        Terminator::Unterminated => f.write_str("; <unterminated>"),
    }
}

fn escape(string: &str) -> String {
    let mut escaped = String::with_capacity(string.len());

    for byte in string.bytes() {
        match byte {
            b'"' | b'\\' => {
                escaped.push_str(&format!("\\{byte:02X}"));
            }
            0x20..=0x7e => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{byte:02X}")),
        }
    }

    escaped
}
