//! In-process execution of IR modules.
//!
//! Memory is a flat little-endian arena split into a stack region whose
//! watermark resets on frame exit and a bump-allocated heap. Pointers are
//! plain offsets; the zero page is never mapped, so null dereferences trap.
//! Runtime helpers are implemented natively against the same memory.

use diagnostics::{error::Result, Code, Diagnostic, Reporter};
use ir::{
    BinaryOp, BlockId, Callee, CastKind, Const, FunctionIndex, Inst, Module, Operand, Rel,
    Terminator, Ty, Value,
};
use std::io::{self, BufRead, Write};
use utility::{HashMap, HashSet, PROGRAM_ENTRY};

#[cfg(test)]
mod test;

const STACK_BASE: u64 = 0x1000_0000;
const HEAP_BASE: u64 = 0x8000_0000;
const CALL_DEPTH_LIMIT: usize = 256;
/// The sentinel stored in the `stdin` global; only ever passed back to `fgets`.
const STDIN_HANDLE: u64 = 0xF11E;

/// Run the module's `main` function and yield its return value.
pub fn execute(module: &Module, reporter: &Reporter) -> Result<i32> {
    execute_with(module, reporter, &mut io::stdout(), &mut io::stdin().lock())
}

pub fn execute_with(
    module: &Module,
    reporter: &Reporter,
    output: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<i32> {
    Machine::new(module, output, input).run().map_err(|trap| {
        Diagnostic::error().code(Code::E400).message(trap.0).report(reporter)
    })
}

struct Trap(String);

fn trap<T>(message: impl Into<String>) -> Exec<T> {
    Err(Trap(message.into()))
}

type Exec<T> = std::result::Result<T, Trap>;

#[derive(Clone, Copy, Debug)]
enum Val {
    I1(bool),
    I8(u8),
    I32(i32),
    I64(i64),
    F64(f64),
    Ptr(u64),
}

impl Val {
    fn as_i32(self) -> Exec<i32> {
        match self {
            Self::I32(value) => Ok(value),
            Self::I1(value) => Ok(value as i32),
            Self::I8(value) => Ok(value as i32),
            _ => trap("expected a 32-bit integer"),
        }
    }

    fn as_i64(self) -> Exec<i64> {
        match self {
            Self::I64(value) => Ok(value),
            Self::I32(value) => Ok(value as i64),
            _ => trap("expected a 64-bit integer"),
        }
    }

    fn as_f64(self) -> Exec<f64> {
        match self {
            Self::F64(value) => Ok(value),
            _ => trap("expected a double"),
        }
    }

    fn as_ptr(self) -> Exec<u64> {
        match self {
            Self::Ptr(address) => Ok(address),
            _ => trap("expected a pointer"),
        }
    }

    fn as_bool(self) -> Exec<bool> {
        match self {
            Self::I1(value) => Ok(value),
            _ => trap("expected a boolean"),
        }
    }
}

struct Memory {
    stack: Vec<u8>,
    heap: Vec<u8>,
    /// Heap allocation sizes, for `realloc` copies.
    allocations: HashMap<u64, u64>,
    freed: HashSet<u64>,
}

impl Memory {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            heap: Vec::new(),
            allocations: HashMap::default(),
            freed: HashSet::default(),
        }
    }

    fn stack_mark(&self) -> usize {
        self.stack.len()
    }

    fn stack_release(&mut self, mark: usize) {
        self.stack.truncate(mark);
    }

    fn stack_alloc(&mut self, size: u64) -> u64 {
        let address = STACK_BASE + self.stack.len() as u64;
        self.stack.resize(self.stack.len() + aligned(size), 0);
        address
    }

    fn heap_alloc(&mut self, size: u64) -> u64 {
        let address = HEAP_BASE + self.heap.len() as u64;
        self.heap.resize(self.heap.len() + aligned(size), 0);
        self.allocations.insert(address, size);
        address
    }

    fn region(&mut self, address: u64, length: u64) -> Exec<&mut [u8]> {
        let (base, region) = if address >= HEAP_BASE {
            (HEAP_BASE, &mut self.heap)
        } else if address >= STACK_BASE {
            (STACK_BASE, &mut self.stack)
        } else if address == 0 {
            return trap("null pointer dereference");
        } else {
            return trap(format!("invalid memory access at {address:#x}"));
        };

        let start = (address - base) as usize;
        let end = start + length as usize;

        if end > region.len() {
            return trap(format!("out-of-bounds memory access at {address:#x}"));
        }

        Ok(&mut region[start..end])
    }

    fn read(&mut self, address: u64, ty: &Ty) -> Exec<Val> {
        let bytes = self.region(address, ty.size())?;

        Ok(match ty {
            Ty::I1 => Val::I1(bytes[0] != 0),
            Ty::I8 => Val::I8(bytes[0]),
            Ty::I32 => Val::I32(i32::from_le_bytes(bytes.try_into().unwrap())),
            Ty::I64 => Val::I64(i64::from_le_bytes(bytes.try_into().unwrap())),
            Ty::F64 => Val::F64(f64::from_le_bytes(bytes.try_into().unwrap())),
            Ty::Ptr(_) => Val::Ptr(u64::from_le_bytes(bytes.try_into().unwrap())),
            Ty::Array(..) | Ty::Void => return trap("cannot load an aggregate"),
        })
    }

    fn write(&mut self, address: u64, value: Val) -> Exec<()> {
        match value {
            Val::I1(value) => self.region(address, 1)?[0] = value as u8,
            Val::I8(value) => self.region(address, 1)?[0] = value,
            Val::I32(value) => {
                self.region(address, 4)?.copy_from_slice(&value.to_le_bytes());
            }
            Val::I64(value) => {
                self.region(address, 8)?.copy_from_slice(&value.to_le_bytes());
            }
            Val::F64(value) => {
                self.region(address, 8)?.copy_from_slice(&value.to_le_bytes());
            }
            Val::Ptr(value) => {
                self.region(address, 8)?.copy_from_slice(&value.to_le_bytes());
            }
        }
        Ok(())
    }

    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Exec<()> {
        self.region(address, bytes.len() as u64)?.copy_from_slice(bytes);
        Ok(())
    }

    fn read_c_string(&mut self, address: u64) -> Exec<String> {
        let mut bytes = Vec::new();
        let mut cursor = address;

        loop {
            let byte = self.region(cursor, 1)?[0];
            if byte == 0 {
                break;
            }
            bytes.push(byte);
            cursor += 1;
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn aligned(size: u64) -> usize {
    ((size + 7) & !7) as usize
}

struct Machine<'a> {
    module: &'a Module,
    memory: Memory,
    /// The materialized address of every interned string constant.
    strings: Vec<u64>,
    /// The address of the slot backing each global.
    globals: HashMap<&'static str, u64>,
    output: &'a mut dyn Write,
    input: &'a mut dyn BufRead,
    depth: usize,
}

impl<'a> Machine<'a> {
    fn new(module: &'a Module, output: &'a mut dyn Write, input: &'a mut dyn BufRead) -> Self {
        Self {
            module,
            memory: Memory::new(),
            strings: Vec::new(),
            globals: HashMap::default(),
            output,
            input,
            depth: 0,
        }
    }

    fn run(&mut self) -> Exec<i32> {
        for string in &self.module.strings {
            let address = self.memory.heap_alloc(string.len() as u64 + 1);
            self.memory.write_bytes(address, string.as_bytes())?;
            self.strings.push(address);
        }

        for global in &self.module.globals {
            let slot = self.memory.heap_alloc(global.ty.size());
            self.globals.insert(global.name, slot);

            if global.name == "stdin" {
                self.memory.write(slot, Val::Ptr(STDIN_HANDLE))?;
            }
        }

        let Some((index, _)) = self.module.function(PROGRAM_ENTRY) else {
            return trap("the module does not contain a ‘main’ function");
        };

        match self.call_function(index, Vec::new())? {
            Some(value) => value.as_i32(),
            None => trap("‘main’ did not return a value"),
        }
    }

    fn call_function(&mut self, index: FunctionIndex, args: Vec<Val>) -> Exec<Option<Val>> {
        self.depth += 1;
        if self.depth > CALL_DEPTH_LIMIT {
            return trap("call stack overflow");
        }

        let module = self.module;
        let function = &module.functions[index.0 as usize];

        let mut registers: Vec<Option<Val>> = vec![None; function.values.len()];
        for (register, arg) in registers.iter_mut().zip(args) {
            *register = Some(arg);
        }

        let mark = self.memory.stack_mark();
        let mut block = BlockId(0);

        let result = loop {
            let Some(current) = function.blocks.get(block.0 as usize) else {
                break trap("branch into a nonexistent block");
            };

            for inst in &current.insts {
                self.exec(inst, function, &mut registers)?;
            }

            match &current.terminator {
                Terminator::Branch(target) => block = *target,
                Terminator::CondBranch { condition, consequent, alternate } => {
                    let condition = self.eval(condition, function, &registers)?;
                    block = if condition.as_bool()? { *consequent } else { *alternate };
                }
                Terminator::Return(value) => {
                    let value = match value {
                        Some(value) => Some(self.eval(value, function, &registers)?),
                        None => None,
                    };
                    break Ok(value);
                }
                Terminator::Unterminated => break trap("fell off an unterminated block"),
            }
        };

        self.memory.stack_release(mark);
        self.depth -= 1;
        result
    }

    fn eval(
        &mut self,
        operand: &Operand,
        function: &ir::Function,
        registers: &[Option<Val>],
    ) -> Exec<Val> {
        match operand {
            Operand::Value(value) => match registers.get(value.0 as usize) {
                Some(Some(value)) => Ok(*value),
                _ => trap("use of an undefined value"),
            },
            Operand::Const(constant) => self.constant(constant, function),
        }
    }

    fn constant(&mut self, constant: &Const, _function: &ir::Function) -> Exec<Val> {
        Ok(match constant {
            Const::I1(value) => Val::I1(*value),
            Const::I8(value) => Val::I8(*value),
            Const::I32(value) => Val::I32(*value),
            Const::I64(value) => Val::I64(*value),
            Const::F64(value) => Val::F64(*value),
            Const::Null(_) => Val::Ptr(0),
            Const::Str(index) => Val::Ptr(self.strings[*index as usize]),
            Const::Global(name, _) => Val::Ptr(self.globals[name]),
            Const::Zero(ty) => match ty {
                Ty::I1 => Val::I1(false),
                Ty::I8 => Val::I8(0),
                Ty::I32 => Val::I32(0),
                Ty::I64 => Val::I64(0),
                Ty::F64 => Val::F64(0.0),
                Ty::Ptr(_) => Val::Ptr(0),
                Ty::Array(..) | Ty::Void => {
                    return trap("an aggregate zero is only valid in a store");
                }
            },
        })
    }

    fn exec(
        &mut self,
        inst: &Inst,
        function: &ir::Function,
        registers: &mut Vec<Option<Val>>,
    ) -> Exec<()> {
        let mut set = |registers: &mut Vec<Option<Val>>, dst: Value, value: Val| {
            registers[dst.0 as usize] = Some(value);
        };

        match inst {
            Inst::Alloca { dst, ty } => {
                let address = self.memory.stack_alloc(ty.size().max(1));
                set(registers, *dst, Val::Ptr(address));
            }
            Inst::Load { dst, ty, source } => {
                let address = self.eval(source, function, registers)?.as_ptr()?;
                let value = self.memory.read(address, ty)?;
                set(registers, *dst, value);
            }
            Inst::Store { value, target } => {
                let address = self.eval(target, function, registers)?.as_ptr()?;

                // An aggregate zero clears the whole allocation.
                if let Operand::Const(Const::Zero(ty @ Ty::Array(..))) = value {
                    let size = ty.size();
                    self.memory.region(address, size)?.fill(0);
                    return Ok(());
                }

                let value = self.eval(value, function, registers)?;
                self.memory.write(address, value)?;
            }
            Inst::ElementPtr { dst, ty, base, indices } => {
                let mut address = self.eval(base, function, registers)?.as_ptr()?;
                let mut current = ty.clone();

                for (position, index) in indices.iter().enumerate() {
                    let index = self.eval(index, function, registers)?.as_i64()?;

                    if position == 0 {
                        address = offset(address, index * current.size() as i64);
                    } else {
                        match current {
                            Ty::Array(_, element) => {
                                address = offset(address, index * element.size() as i64);
                                current = *element;
                            }
                            _ => return trap("indexed into a non-aggregate type"),
                        }
                    }
                }

                set(registers, *dst, Val::Ptr(address));
            }
            Inst::Binary { dst, op, ty, lhs, rhs } => {
                let lhs = self.eval(lhs, function, registers)?;
                let rhs = self.eval(rhs, function, registers)?;
                let value = binary(*op, ty, lhs, rhs)?;
                set(registers, *dst, value);
            }
            Inst::Cmp { dst, rel, ty, lhs, rhs } => {
                let lhs = self.eval(lhs, function, registers)?;
                let rhs = self.eval(rhs, function, registers)?;
                let value = compare(*rel, ty, lhs, rhs)?;
                set(registers, *dst, Val::I1(value));
            }
            Inst::FNeg { dst, operand } => {
                let value = self.eval(operand, function, registers)?.as_f64()?;
                set(registers, *dst, Val::F64(-value));
            }
            Inst::Cast { dst, kind, operand, ty } => {
                let value = self.eval(operand, function, registers)?;
                let value = cast(*kind, value, ty)?;
                set(registers, *dst, value);
            }
            Inst::Call { dst, callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, function, registers)?);
                }

                let result = match callee {
                    Callee::Function(index) => self.call_function(*index, values)?,
                    Callee::External(index) => {
                        let name = self.module.externals[index.0 as usize].name;
                        self.call_external(name, values)?
                    }
                };

                if let (Some(dst), Some(result)) = (dst, result) {
                    set(registers, *dst, result);
                }
            }
            Inst::Select { dst, condition, consequent, alternate, .. } => {
                let condition = self.eval(condition, function, registers)?.as_bool()?;
                let value = if condition {
                    self.eval(consequent, function, registers)?
                } else {
                    self.eval(alternate, function, registers)?
                };
                set(registers, *dst, value);
            }
        }

        Ok(())
    }

    fn call_external(&mut self, name: &str, args: Vec<Val>) -> Exec<Option<Val>> {
        Ok(match name {
            "printf" => {
                let format = self.memory.read_c_string(args[0].as_ptr()?)?;
                let count = self.printf(&format, &args[1..])?;
                Some(Val::I32(count))
            }
            "malloc" => {
                let size = args[0].as_i64()?;
                Some(Val::Ptr(self.memory.heap_alloc(size.max(0) as u64)))
            }
            "free" => {
                let address = args[0].as_ptr()?;
                if address != 0 && !self.memory.freed.insert(address) {
                    return trap(format!("double free of {address:#x}"));
                }
                None
            }
            "realloc" => {
                let address = args[0].as_ptr()?;
                let size = args[1].as_i64()?.max(0) as u64;
                let fresh = self.memory.heap_alloc(size);

                if address != 0 {
                    let old = self.memory.allocations.get(&address).copied().unwrap_or(0);
                    let length = old.min(size);
                    let bytes = self.memory.region(address, length)?.to_vec();
                    self.memory.write_bytes(fresh, &bytes)?;
                }

                Some(Val::Ptr(fresh))
            }
            "strlen" => {
                let text = self.memory.read_c_string(args[0].as_ptr()?)?;
                Some(Val::I64(text.len() as i64))
            }
            "strcmp" => {
                let a = self.memory.read_c_string(args[0].as_ptr()?)?;
                let b = self.memory.read_c_string(args[1].as_ptr()?)?;
                Some(Val::I32(match a.cmp(&b) {
                    std::cmp::Ordering::Less => -1,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                }))
            }
            "strcpy" => {
                let source = self.memory.read_c_string(args[1].as_ptr()?)?;
                let target = args[0].as_ptr()?;
                self.memory.write_bytes(target, source.as_bytes())?;
                self.memory.region(target + source.len() as u64, 1)?[0] = 0;
                Some(Val::Ptr(target))
            }
            "strcat" => {
                let target = args[0].as_ptr()?;
                let prefix = self.memory.read_c_string(target)?;
                let suffix = self.memory.read_c_string(args[1].as_ptr()?)?;
                let combined = format!("{prefix}{suffix}");
                self.memory.write_bytes(target, combined.as_bytes())?;
                self.memory.region(target + combined.len() as u64, 1)?[0] = 0;
                Some(Val::Ptr(target))
            }
            "pow" => Some(Val::F64(args[0].as_f64()?.powf(args[1].as_f64()?))),
            "sqrt" => Some(Val::F64(args[0].as_f64()?.sqrt())),
            "toupper" => Some(Val::I32(change_case(args[0].as_i32()?, char::to_ascii_uppercase))),
            "tolower" => Some(Val::I32(change_case(args[0].as_i32()?, char::to_ascii_lowercase))),
            "atoi" => {
                let text = self.memory.read_c_string(args[0].as_ptr()?)?;
                Some(Val::I32(parse_leading_int(&text)))
            }
            "atof" => {
                let text = self.memory.read_c_string(args[0].as_ptr()?)?;
                Some(Val::F64(parse_leading_float(&text)))
            }
            "itoa" => {
                let target = args[1].as_ptr()?;
                let text = args[0].as_i32()?.to_string();
                self.memory.write_bytes(target, text.as_bytes())?;
                self.memory.region(target + text.len() as u64, 1)?[0] = 0;
                Some(Val::Ptr(target))
            }
            "ftoa" => {
                let target = args[1].as_ptr()?;
                let precision = args[2].as_i32()?.max(0) as usize;
                let text = format!("{:.*}", precision, args[0].as_f64()?);
                self.memory.write_bytes(target, text.as_bytes())?;
                self.memory.region(target + text.len() as u64, 1)?[0] = 0;
                Some(Val::Ptr(target))
            }
            "fgets" => {
                let target = args[0].as_ptr()?;
                let limit = args[1].as_i32()?.max(1) as usize;

                let mut line = String::new();
                let count = self
                    .input
                    .read_line(&mut line)
                    .map_err(|error| Trap(format!("failed to read input: {error}")))?;

                if count == 0 {
                    Some(Val::Ptr(0))
                } else {
                    let bytes = &line.as_bytes()[..line.len().min(limit - 1)];
                    self.memory.write_bytes(target, bytes)?;
                    self.memory.region(target + bytes.len() as u64, 1)?[0] = 0;
                    Some(Val::Ptr(target))
                }
            }
            _ => return trap(format!("call of an unknown runtime helper ‘{name}’")),
        })
    }

    fn printf(&mut self, format: &str, args: &[Val]) -> Exec<i32> {
        let mut buffer = String::new();
        let mut arguments = args.iter();
        let mut characters = format.chars();

        while let Some(character) = characters.next() {
            if character != '%' {
                buffer.push(character);
                continue;
            }

            match characters.next() {
                Some('d') => {
                    let value = arguments.next().copied().unwrap_or(Val::I32(0));
                    buffer.push_str(&value.as_i32()?.to_string());
                }
                Some('f') => {
                    let value = arguments.next().copied().unwrap_or(Val::F64(0.0));
                    buffer.push_str(&format!("{:.6}", value.as_f64()?));
                }
                Some('s') => {
                    let value = arguments.next().copied().unwrap_or(Val::Ptr(0));
                    let text = self.memory.read_c_string(value.as_ptr()?)?;
                    buffer.push_str(&text);
                }
                Some('c') => {
                    let value = arguments.next().copied().unwrap_or(Val::I32(0));
                    buffer.push(char::from_u32(value.as_i32()? as u32).unwrap_or('?'));
                }
                Some('%') => buffer.push('%'),
                Some(other) => {
                    buffer.push('%');
                    buffer.push(other);
                }
                None => break,
            }
        }

        self.output
            .write_all(buffer.as_bytes())
            .map_err(|error| Trap(format!("failed to write output: {error}")))?;

        Ok(buffer.len() as i32)
    }
}

fn offset(address: u64, delta: i64) -> u64 {
    address.wrapping_add_signed(delta)
}

fn binary(op: BinaryOp, ty: &Ty, lhs: Val, rhs: Val) -> Exec<Val> {
    if ty.is_float() {
        let lhs = lhs.as_f64()?;
        let rhs = rhs.as_f64()?;
        return Ok(Val::F64(match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            _ => return trap("bitwise operation on doubles"),
        }));
    }

    if let Ty::I1 = ty {
        let lhs = lhs.as_bool()?;
        let rhs = rhs.as_bool()?;
        return Ok(Val::I1(match op {
            BinaryOp::And => lhs & rhs,
            BinaryOp::Or => lhs | rhs,
            BinaryOp::Xor => lhs ^ rhs,
            _ => return trap("arithmetic on booleans"),
        }));
    }

    if let Ty::I64 = ty {
        let lhs = lhs.as_i64()?;
        let rhs = rhs.as_i64()?;
        return Ok(Val::I64(match op {
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div if rhs == 0 => return trap("division by zero"),
            BinaryOp::Div => lhs.wrapping_div(rhs),
            BinaryOp::And => lhs & rhs,
            BinaryOp::Or => lhs | rhs,
            BinaryOp::Xor => lhs ^ rhs,
        }));
    }

    let lhs = lhs.as_i32()?;
    let rhs = rhs.as_i32()?;
    Ok(Val::I32(match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div if rhs == 0 => return trap("division by zero"),
        BinaryOp::Div => lhs.wrapping_div(rhs),
        BinaryOp::And => lhs & rhs,
        BinaryOp::Or => lhs | rhs,
        BinaryOp::Xor => lhs ^ rhs,
    }))
}

fn compare(rel: Rel, ty: &Ty, lhs: Val, rhs: Val) -> Exec<bool> {
    if ty.is_float() {
        let lhs = lhs.as_f64()?;
        let rhs = rhs.as_f64()?;
        // Ordered predicates: comparisons with NaN are false.
        return Ok(match rel {
            Rel::Eq => lhs == rhs,
            Rel::Ne => lhs != rhs && !lhs.is_nan() && !rhs.is_nan(),
            Rel::Lt => lhs < rhs,
            Rel::Le => lhs <= rhs,
            Rel::Gt => lhs > rhs,
            Rel::Ge => lhs >= rhs,
        });
    }

    if let Ty::Ptr(_) = ty {
        let lhs = lhs.as_ptr()?;
        let rhs = rhs.as_ptr()?;
        return Ok(match rel {
            Rel::Eq => lhs == rhs,
            Rel::Ne => lhs != rhs,
            Rel::Lt => lhs < rhs,
            Rel::Le => lhs <= rhs,
            Rel::Gt => lhs > rhs,
            Rel::Ge => lhs >= rhs,
        });
    }

    let (lhs, rhs) = match ty {
        Ty::I1 => (lhs.as_bool()? as i64, rhs.as_bool()? as i64),
        Ty::I8 => (lhs.as_i32()? as i64, rhs.as_i32()? as i64),
        _ => (lhs.as_i64()?, rhs.as_i64()?),
    };

    Ok(match rel {
        Rel::Eq => lhs == rhs,
        Rel::Ne => lhs != rhs,
        Rel::Lt => lhs < rhs,
        Rel::Le => lhs <= rhs,
        Rel::Gt => lhs > rhs,
        Rel::Ge => lhs >= rhs,
    })
}

fn cast(kind: CastKind, value: Val, target: &Ty) -> Exec<Val> {
    Ok(match kind {
        CastKind::SExt => {
            let wide = match value {
                Val::I1(value) => -(value as i64),
                Val::I8(value) => value as i8 as i64,
                Val::I32(value) => value as i64,
                Val::I64(value) => value,
                _ => return trap("sign extension of a non-integer"),
            };
            narrow(wide, target)?
        }
        CastKind::Trunc => {
            let wide = match value {
                Val::I64(value) => value,
                Val::I32(value) => value as i64,
                _ => return trap("truncation of a non-integer"),
            };
            narrow(wide, target)?
        }
        CastKind::SiToFp => Val::F64(match value {
            Val::I1(value) => value as i64 as f64,
            Val::I8(value) => value as i8 as f64,
            Val::I32(value) => value as f64,
            Val::I64(value) => value as f64,
            _ => return trap("integer-to-double conversion of a non-integer"),
        }),
        CastKind::FpToSi => narrow(value.as_f64()?.trunc() as i64, target)?,
        CastKind::Bitcast => value,
    })
}

fn narrow(value: i64, target: &Ty) -> Exec<Val> {
    Ok(match target {
        Ty::I1 => Val::I1(value & 1 != 0),
        Ty::I8 => Val::I8(value as u8),
        Ty::I32 => Val::I32(value as i32),
        Ty::I64 => Val::I64(value),
        _ => return trap("narrowing to a non-integer type"),
    })
}

fn change_case(value: i32, change: impl Fn(&char) -> char) -> i32 {
    match char::from_u32(value as u32) {
        Some(character) => change(&character) as i32,
        None => value,
    }
}

fn parse_leading_int(text: &str) -> i32 {
    let text = text.trim_start();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i32>().map(|value| sign * value).unwrap_or(0)
}

fn parse_leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let bytes = text.as_bytes();

    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}
