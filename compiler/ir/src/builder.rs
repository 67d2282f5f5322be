//! A cursor-style function builder.

use crate::{
    BinaryOp, Block, BlockId, Callee, CastKind, Function, Inst, Operand, Rel, Terminator, Ty,
    Value,
};
use utility::{Atom, HashMap};

/// Builds one [`Function`], one open block at a time.
///
/// Freshly created blocks are [unterminated](Terminator::Unterminated); setting
/// a terminator closes the current block. Stack slots always land at the top of
/// the entry block regardless of the cursor.
pub struct Builder {
    function: Function,
    current: BlockId,
    entry_allocas: usize,
    block_names: HashMap<String, u32>,
}

impl Builder {
    pub fn new(name: Atom, params: Vec<Ty>, result: Ty) -> Self {
        let values = params.clone();
        let mut block_names = HashMap::default();
        block_names.insert("entry".to_owned(), 1);

        Self {
            function: Function {
                name,
                params,
                result,
                blocks: vec![Block {
                    name: "entry".to_owned(),
                    insts: Vec::new(),
                    terminator: Terminator::Unterminated,
                }],
                values,
            },
            current: BlockId(0),
            entry_allocas: 0,
            block_names,
        }
    }

    pub fn finish(self) -> Function {
        self.function
    }

    /// The incoming argument with the given index.
    pub fn param(&self, index: usize) -> Value {
        debug_assert!(index < self.function.params.len());

        Value(index as u32)
    }

    pub fn result(&self) -> Ty {
        self.function.result.clone()
    }

    fn value(&mut self, ty: Ty) -> Value {
        let value = Value(self.function.values.len() as u32);
        self.function.values.push(ty);
        value
    }

    pub fn ty_of(&self, operand: &Operand) -> Ty {
        self.function.ty_of(operand)
    }

    /// Create a new block with a unique label derived from the given name.
    pub fn block(&mut self, name: &str) -> BlockId {
        let count = self.block_names.entry(name.to_owned()).or_insert(0);
        let label = match *count {
            0 => name.to_owned(),
            count => format!("{name}{count}"),
        };
        *count += 1;

        let id = BlockId(self.function.blocks.len() as u32);
        self.function.blocks.push(Block {
            name: label,
            insts: Vec::new(),
            terminator: Terminator::Unterminated,
        });
        id
    }

    pub fn position_at(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Whether the current block still lacks a terminator.
    pub fn is_open(&self) -> bool {
        matches!(
            self.function.blocks[self.current.0 as usize].terminator,
            Terminator::Unterminated
        )
    }

    /// Set the current block's terminator unless it already has one.
    pub fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.function.blocks[self.current.0 as usize];

        if let Terminator::Unterminated = block.terminator {
            block.terminator = terminator;
        }
    }

    fn push(&mut self, inst: Inst) {
        self.function.blocks[self.current.0 as usize].insts.push(inst);
    }

    /// Allocate a stack slot at the top of the entry block.
    pub fn alloca(&mut self, ty: Ty) -> Value {
        let dst = self.value(Ty::ptr(ty.clone()));
        self.function.blocks[0].insts.insert(self.entry_allocas, Inst::Alloca { dst, ty });
        self.entry_allocas += 1;
        dst
    }

    pub fn load(&mut self, ty: Ty, source: impl Into<Operand>) -> Value {
        let dst = self.value(ty.clone());
        self.push(Inst::Load { dst, ty, source: source.into() });
        dst
    }

    pub fn store(&mut self, value: impl Into<Operand>, target: impl Into<Operand>) {
        self.push(Inst::Store { value: value.into(), target: target.into() });
    }

    /// Compute an element pointer. `pointee` is the type `base` points to and
    /// `element` the type of the addressed element.
    pub fn element_ptr(
        &mut self,
        pointee: Ty,
        element: Ty,
        base: impl Into<Operand>,
        indices: Vec<Operand>,
    ) -> Value {
        let dst = self.value(Ty::ptr(element));
        self.push(Inst::ElementPtr { dst, ty: pointee, base: base.into(), indices });
        dst
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        ty: Ty,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Value {
        let dst = self.value(ty.clone());
        self.push(Inst::Binary { dst, op, ty, lhs: lhs.into(), rhs: rhs.into() });
        dst
    }

    pub fn cmp(
        &mut self,
        rel: Rel,
        ty: Ty,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Value {
        let dst = self.value(Ty::I1);
        self.push(Inst::Cmp { dst, rel, ty, lhs: lhs.into(), rhs: rhs.into() });
        dst
    }

    pub fn fneg(&mut self, operand: impl Into<Operand>) -> Value {
        let dst = self.value(Ty::F64);
        self.push(Inst::FNeg { dst, operand: operand.into() });
        dst
    }

    pub fn cast(&mut self, kind: CastKind, operand: impl Into<Operand>, ty: Ty) -> Value {
        let dst = self.value(ty.clone());
        self.push(Inst::Cast { dst, kind, operand: operand.into(), ty });
        dst
    }

    /// Emit a call; `result` is the callee's return type.
    pub fn call(&mut self, callee: Callee, args: Vec<Operand>, result: Ty) -> Option<Value> {
        let dst = match result {
            Ty::Void => None,
            result => Some(self.value(result)),
        };
        self.push(Inst::Call { dst, callee, args });
        dst
    }

    pub fn select(
        &mut self,
        ty: Ty,
        condition: impl Into<Operand>,
        consequent: impl Into<Operand>,
        alternate: impl Into<Operand>,
    ) -> Value {
        let dst = self.value(ty.clone());
        self.push(Inst::Select {
            dst,
            ty,
            condition: condition.into(),
            consequent: consequent.into(),
            alternate: alternate.into(),
        });
        dst
    }
}
