//! Builder: the mutable cursor through which all IR is emitted.
//!
//! The builder owns the [`Module`] under construction and an *insert point*
//! — the function/block pair receiving new instructions. Emission helpers
//! mirror the instruction set one to one and return the produced [`Value`].
//!
//! Terminators are set at most once per block; emitting a terminator into
//! an already-terminated block is ignored, matching the convention that
//! everything after a terminator is dead.

use super::{
    Block, BlockId, FloatPred, FuncId, Function, Global, GlobalId, Instr, InstrId, IntPred,
    IrType, Module, OpCode, Terminator, Value,
};

pub struct Builder {
    module: Module,
    insert_point: Option<(FuncId, BlockId)>,
}

impl Builder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Builder {
            module: Module::new(module_name),
            insert_point: None,
        }
    }

    /// Hands the finished module out, consuming the builder.
    pub fn finish(self) -> Module {
        self.module
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    // ---- module-level entities -------------------------------------------

    pub fn create_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret: IrType,
    ) -> FuncId {
        let id = FuncId(self.module.functions.len() as u32);
        self.module.functions.push(Function {
            name: name.into(),
            params,
            ret,
            blocks: Vec::new(),
            instrs: Vec::new(),
        });
        id
    }

    pub fn create_global(
        &mut self,
        name: impl Into<String>,
        ty: IrType,
        init: Option<Value>,
        is_constant: bool,
    ) -> GlobalId {
        let id = GlobalId(self.module.globals.len() as u32);
        self.module.globals.push(Global {
            name: name.into(),
            ty,
            init,
            is_constant,
        });
        id
    }

    /// Fills in a global's initializer; used once the constant is known.
    pub fn set_global_initializer(&mut self, id: GlobalId, init: Value) {
        debug_assert!(init.is_const(), "global initializers are constants");
        self.module.globals[id.0 as usize].init = Some(init);
    }

    // ---- blocks and the insert point --------------------------------------

    pub fn create_block(&mut self, func: FuncId, label: impl Into<String>) -> BlockId {
        let function = &mut self.module.functions[func.0 as usize];
        let id = BlockId(function.blocks.len() as u32);
        function.blocks.push(Block {
            label: format!("{}{}", label.into(), id.0),
            instrs: Vec::new(),
            terminator: None,
        });
        id
    }

    pub fn set_insert_point(&mut self, func: FuncId, block: BlockId) {
        self.insert_point = Some((func, block));
    }

    pub fn clear_insert_point(&mut self) {
        self.insert_point = None;
    }

    pub fn insert_point(&self) -> Option<(FuncId, BlockId)> {
        self.insert_point
    }

    /// The function currently being emitted into.
    pub fn current_function(&self) -> FuncId {
        self.insert_point.expect("an insert point is set").0
    }

    pub fn current_block(&self) -> BlockId {
        self.insert_point.expect("an insert point is set").1
    }

    // ---- instruction emission ---------------------------------------------

    fn push_instr(&mut self, op: OpCode, ty: IrType, name: &str) -> Value {
        let (func, block) = self.insert_point.expect("an insert point is set");
        let function = &mut self.module.functions[func.0 as usize];
        let id = InstrId(function.instrs.len() as u32);
        function.instrs.push(Instr {
            op,
            ty,
            name: name.to_string(),
        });
        function.blocks[block.0 as usize].instrs.push(id);
        Value::Instr(id)
    }

    /// Appends an alloca to the *entry* block of the current function, so
    /// the backend can promote it to a register.
    pub fn alloca_in_entry(&mut self, ty: IrType, name: &str) -> Value {
        let (func, _) = self.insert_point.expect("an insert point is set");
        let function = &mut self.module.functions[func.0 as usize];
        let id = InstrId(function.instrs.len() as u32);
        function.instrs.push(Instr {
            op: OpCode::Alloca(ty),
            ty: IrType::Ptr,
            name: name.to_string(),
        });
        function.blocks[0].instrs.push(id);
        Value::Instr(id)
    }

    pub fn const_int(&self, ty: IrType, value: i64) -> Value {
        debug_assert!(ty.is_integer());
        Value::ConstInt { ty, value }
    }

    pub fn const_float(&self, value: f64) -> Value {
        Value::ConstFloat(value)
    }

    fn value_type(&self, value: Value) -> IrType {
        let (func, _) = self.insert_point.expect("an insert point is set");
        self.module.function(func).type_of(value)
    }

    pub fn add(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_type(lhs);
        self.push_instr(OpCode::Add(lhs, rhs), ty, name)
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_type(lhs);
        self.push_instr(OpCode::Sub(lhs, rhs), ty, name)
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_type(lhs);
        self.push_instr(OpCode::Mul(lhs, rhs), ty, name)
    }

    pub fn sdiv(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_type(lhs);
        self.push_instr(OpCode::SDiv(lhs, rhs), ty, name)
    }

    pub fn udiv(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_type(lhs);
        self.push_instr(OpCode::UDiv(lhs, rhs), ty, name)
    }

    pub fn fadd(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::FAdd(lhs, rhs), IrType::F64, name)
    }

    pub fn fsub(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::FSub(lhs, rhs), IrType::F64, name)
    }

    pub fn fmul(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::FMul(lhs, rhs), IrType::F64, name)
    }

    pub fn fdiv(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::FDiv(lhs, rhs), IrType::F64, name)
    }

    pub fn icmp(&mut self, pred: IntPred, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::ICmp(pred, lhs, rhs), IrType::I1, name)
    }

    pub fn fcmp(&mut self, pred: FloatPred, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_instr(OpCode::FCmp(pred, lhs, rhs), IrType::I1, name)
    }

    pub fn not(&mut self, value: Value, name: &str) -> Value {
        self.push_instr(OpCode::Not(value), IrType::I1, name)
    }

    pub fn zext(&mut self, value: Value, to: IrType, name: &str) -> Value {
        self.push_instr(OpCode::ZExt(value), to, name)
    }

    pub fn trunc(&mut self, value: Value, to: IrType, name: &str) -> Value {
        self.push_instr(OpCode::Trunc(value), to, name)
    }

    pub fn uitofp(&mut self, value: Value, name: &str) -> Value {
        self.push_instr(OpCode::UiToFp(value), IrType::F64, name)
    }

    pub fn sitofp(&mut self, value: Value, name: &str) -> Value {
        self.push_instr(OpCode::SiToFp(value), IrType::F64, name)
    }

    pub fn fptoui(&mut self, value: Value, to: IrType, name: &str) -> Value {
        self.push_instr(OpCode::FpToUi(value), to, name)
    }

    pub fn fptosi(&mut self, value: Value, to: IrType, name: &str) -> Value {
        self.push_instr(OpCode::FpToSi(value), to, name)
    }

    pub fn load(&mut self, addr: Value, ty: IrType, name: &str) -> Value {
        self.push_instr(OpCode::Load { addr }, ty, name)
    }

    pub fn store(&mut self, value: Value, addr: Value) {
        self.push_instr(OpCode::Store { value, addr }, IrType::Void, "");
    }

    pub fn phi(&mut self, ty: IrType, incomings: Vec<(Value, BlockId)>, name: &str) -> Value {
        self.push_instr(OpCode::Phi { incomings }, ty, name)
    }

    pub fn call(&mut self, callee: Value, args: Vec<Value>, ret: IrType, name: &str) -> Value {
        self.push_instr(OpCode::Call { callee, args }, ret, name)
    }

    // ---- terminators ------------------------------------------------------

    fn terminate(&mut self, terminator: Terminator) {
        let (func, block) = self.insert_point.expect("an insert point is set");
        let block = &mut self.module.functions[func.0 as usize].blocks[block.0 as usize];
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, value: Value) {
        self.terminate(Terminator::Ret(value));
    }

    pub fn ret_void(&mut self) {
        self.terminate(Terminator::RetVoid);
    }

    /// Seals every unterminated block of `func` with `unreachable`. Called
    /// when a function's emission is complete; only blocks behind diverging
    /// control flow can still be open at that point.
    pub fn seal_function(&mut self, func: FuncId) {
        for block in &mut self.module.functions[func.0 as usize].blocks {
            if block.terminator.is_none() {
                block.terminator = Some(Terminator::Unreachable);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_function() -> (Builder, FuncId, BlockId) {
        let mut builder = Builder::new("test");
        let func = builder.create_function("f", vec![IrType::I32], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        (builder, func, entry)
    }

    #[test]
    fn instructions_land_in_the_current_block() {
        let (mut builder, func, entry) = builder_with_function();
        let one = builder.const_int(IrType::I32, 1);
        let sum = builder.add(Value::Arg(0), one, "sum");
        builder.ret(sum);
        let module = builder.finish();
        let function = module.function(func);
        assert_eq!(function.block(entry).instrs.len(), 1);
        assert_eq!(function.block(entry).terminator, Some(Terminator::Ret(sum)));
    }

    #[test]
    fn arithmetic_inherits_the_operand_type() {
        let (mut builder, func, _) = builder_with_function();
        let one = builder.const_int(IrType::I32, 1);
        let sum = builder.add(one, one, "");
        let module = builder.finish();
        assert_eq!(module.function(func).type_of(sum), IrType::I32);
    }

    #[test]
    fn compares_produce_i1() {
        let (mut builder, func, _) = builder_with_function();
        let one = builder.const_int(IrType::I32, 1);
        let cmp = builder.icmp(IntPred::Eq, one, one, "cmp");
        let module = builder.finish();
        assert_eq!(module.function(func).type_of(cmp), IrType::I1);
    }

    #[test]
    fn allocas_go_to_the_entry_block() {
        let (mut builder, func, entry) = builder_with_function();
        let other = builder.create_block(func, "other");
        builder.set_insert_point(func, other);
        let slot = builder.alloca_in_entry(IrType::I32, "x");
        let module = builder.finish();
        let function = module.function(func);
        assert_eq!(function.block(entry).instrs.len(), 1);
        assert!(function.block(other).instrs.is_empty());
        assert_eq!(function.type_of(slot), IrType::Ptr);
    }

    #[test]
    fn the_first_terminator_wins() {
        let (mut builder, func, entry) = builder_with_function();
        let zero = builder.const_int(IrType::I32, 0);
        builder.ret(zero);
        builder.ret_void();
        let module = builder.finish();
        assert_eq!(
            module.function(func).block(entry).terminator,
            Some(Terminator::Ret(zero))
        );
    }

    #[test]
    fn seal_closes_open_blocks() {
        let (mut builder, func, entry) = builder_with_function();
        builder.seal_function(func);
        let module = builder.finish();
        assert_eq!(
            module.function(func).block(entry).terminator,
            Some(Terminator::Unreachable)
        );
    }

    #[test]
    fn globals_accept_a_late_initializer() {
        let mut builder = Builder::new("m");
        let g = builder.create_global("g", IrType::I32, None, true);
        builder.set_global_initializer(
            g,
            Value::ConstInt {
                ty: IrType::I32,
                value: 7,
            },
        );
        let module = builder.finish();
        assert_eq!(
            module.global(g).init,
            Some(Value::ConstInt {
                ty: IrType::I32,
                value: 7
            })
        );
    }
}
