//! Execution engine: runs a verified module in-process.
//!
//! This is the JIT seam of the pipeline: the driver hands the module over
//! and asks for `main` to be executed with its typed arguments forwarded;
//! the returned `int` becomes the process exit code. Execution interprets
//! the SSA directly — registers memoize instruction results per activation,
//! allocas and globals live in a flat cell store, and phi nodes select their
//! incoming by the edge the control flow actually took.

use std::collections::HashMap;
use std::fmt;

use crate::ir::{
    BlockId, FloatPred, FuncId, GlobalId, Instr, IntPred, IrType, Module, OpCode, Terminator,
    Value,
};

/// A runtime value. Integers of all widths are carried canonically: `i1`
/// and `i8` as their unsigned value, `i32` sign-extended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RtValue {
    Int(i64),
    Float(f64),
    /// Index into the cell store.
    Addr(usize),
    Fn(FuncId),
    /// The value of abstract (void) expressions.
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution error: {}", self.message)
    }
}

impl std::error::Error for EngineError {}

/// Executes `main` and returns its `int` result.
pub fn run_main(module: &Module) -> Result<i32, EngineError> {
    match run_function(module, "main", &[])? {
        RtValue::Int(value) => Ok(value as i32),
        other => Err(EngineError::new(format!(
            "main returned a non-integer value: {other:?}"
        ))),
    }
}

/// Executes the named function with the given arguments.
pub fn run_function(
    module: &Module,
    name: &str,
    args: &[RtValue],
) -> Result<RtValue, EngineError> {
    let (func, function) = module
        .function_by_name(name)
        .ok_or_else(|| EngineError::new(format!("no function named `{name}`")))?;
    if args.len() != function.arg_size() {
        return Err(EngineError::new(format!(
            "`{name}` takes {} arguments, got {}",
            function.arg_size(),
            args.len()
        )));
    }
    let mut machine = Machine::new(module);
    machine.exec(func, args.to_vec())
}

struct Machine<'a> {
    module: &'a Module,
    cells: Vec<RtValue>,
    global_cells: HashMap<GlobalId, usize>,
}

impl<'a> Machine<'a> {
    fn new(module: &'a Module) -> Self {
        let mut machine = Machine {
            module,
            cells: Vec::new(),
            global_cells: HashMap::new(),
        };
        for (index, global) in module.globals.iter().enumerate() {
            let value = match global.init {
                Some(Value::ConstInt { value, .. }) => RtValue::Int(value),
                Some(Value::ConstFloat(value)) => RtValue::Float(value),
                Some(_) | None => zero_cell(global.ty),
            };
            let cell = machine.cells.len();
            machine.cells.push(value);
            machine.global_cells.insert(GlobalId(index as u32), cell);
        }
        machine
    }

    fn exec(&mut self, func: FuncId, args: Vec<RtValue>) -> Result<RtValue, EngineError> {
        let function = self.module.function(func);
        if function.blocks.is_empty() {
            return Err(EngineError::new(format!(
                "`{}` has no body to execute",
                function.name
            )));
        }
        let mut regs: Vec<Option<RtValue>> = vec![None; function.instrs.len()];
        let mut current = BlockId(0);
        let mut previous: Option<BlockId> = None;

        loop {
            let block = function.block(current);
            for &instr_id in &block.instrs {
                let instr = function.instr(instr_id);
                let result = self.exec_instr(func, &regs, &args, previous, instr)?;
                regs[instr_id.0 as usize] = Some(result);
            }
            let terminator = block
                .terminator
                .as_ref()
                .expect("verified blocks are terminated");
            match terminator {
                Terminator::Br(target) => {
                    previous = Some(current);
                    current = *target;
                }
                Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let cond = self.eval(&regs, &args, *cond)?;
                    let taken = match cond {
                        RtValue::Int(0) => *else_block,
                        RtValue::Int(_) => *then_block,
                        other => {
                            return Err(EngineError::new(format!(
                                "branch on a non-boolean value {other:?}"
                            )))
                        }
                    };
                    previous = Some(current);
                    current = taken;
                }
                Terminator::Ret(value) => return self.eval(&regs, &args, *value),
                Terminator::RetVoid => return Ok(RtValue::Unit),
                Terminator::Unreachable => {
                    return Err(EngineError::new("reached an unreachable point"))
                }
            }
        }
    }

    fn eval(
        &self,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        value: Value,
    ) -> Result<RtValue, EngineError> {
        Ok(match value {
            Value::ConstInt { value, .. } => RtValue::Int(value),
            Value::ConstFloat(value) => RtValue::Float(value),
            Value::Arg(index) => args[index],
            Value::Instr(id) => regs[id.0 as usize]
                .ok_or_else(|| EngineError::new("use of an unexecuted instruction result"))?,
            Value::Global(id) => RtValue::Addr(self.global_cells[&id]),
            Value::Function(id) => RtValue::Fn(id),
            Value::Abstract => RtValue::Unit,
        })
    }

    fn exec_instr(
        &mut self,
        func: FuncId,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        previous: Option<BlockId>,
        instr: &Instr,
    ) -> Result<RtValue, EngineError> {
        let function = self.module.function(func);
        match &instr.op {
            OpCode::Add(a, b) => self.int_binop(function, regs, args, *a, *b, i64::wrapping_add),
            OpCode::Sub(a, b) => self.int_binop(function, regs, args, *a, *b, i64::wrapping_sub),
            OpCode::Mul(a, b) => self.int_binop(function, regs, args, *a, *b, i64::wrapping_mul),
            OpCode::SDiv(a, b) | OpCode::UDiv(a, b) => {
                let lhs = self.int(regs, args, *a)?;
                let rhs = self.int(regs, args, *b)?;
                if rhs == 0 {
                    return Err(EngineError::new("integer division by zero"));
                }
                let ty = function.type_of(*a);
                Ok(RtValue::Int(normalize(lhs.wrapping_div(rhs), ty)))
            }
            OpCode::FAdd(a, b) => self.float_binop(regs, args, *a, *b, |x, y| x + y),
            OpCode::FSub(a, b) => self.float_binop(regs, args, *a, *b, |x, y| x - y),
            OpCode::FMul(a, b) => self.float_binop(regs, args, *a, *b, |x, y| x * y),
            OpCode::FDiv(a, b) => self.float_binop(regs, args, *a, *b, |x, y| x / y),
            OpCode::ICmp(pred, a, b) => {
                let lhs = self.int(regs, args, *a)?;
                let rhs = self.int(regs, args, *b)?;
                let result = match pred {
                    IntPred::Eq => lhs == rhs,
                    IntPred::Ne => lhs != rhs,
                    IntPred::Ult => (lhs as u64) < rhs as u64,
                    IntPred::Ule => lhs as u64 <= rhs as u64,
                    IntPred::Ugt => lhs as u64 > rhs as u64,
                    IntPred::Uge => lhs as u64 >= rhs as u64,
                    IntPred::Slt => lhs < rhs,
                    IntPred::Sle => lhs <= rhs,
                    IntPred::Sgt => lhs > rhs,
                    IntPred::Sge => lhs >= rhs,
                };
                Ok(RtValue::Int(i64::from(result)))
            }
            OpCode::FCmp(pred, a, b) => {
                let lhs = self.float(regs, args, *a)?;
                let rhs = self.float(regs, args, *b)?;
                let result = match pred {
                    FloatPred::Oeq => lhs == rhs,
                    FloatPred::One => lhs != rhs,
                    FloatPred::Olt => lhs < rhs,
                    FloatPred::Ole => lhs <= rhs,
                    FloatPred::Ogt => lhs > rhs,
                    FloatPred::Oge => lhs >= rhs,
                };
                Ok(RtValue::Int(i64::from(result)))
            }
            OpCode::Not(a) => {
                let value = self.int(regs, args, *a)?;
                Ok(RtValue::Int(value ^ 1))
            }
            // canonical integers are already zero-extended
            OpCode::ZExt(a) => Ok(RtValue::Int(self.int(regs, args, *a)?)),
            OpCode::Trunc(a) => {
                let value = self.int(regs, args, *a)?;
                Ok(RtValue::Int(normalize(value, instr.ty)))
            }
            OpCode::UiToFp(a) => {
                let value = self.int(regs, args, *a)?;
                Ok(RtValue::Float(value as u64 as f64))
            }
            OpCode::SiToFp(a) => Ok(RtValue::Float(self.int(regs, args, *a)? as f64)),
            OpCode::FpToUi(a) | OpCode::FpToSi(a) => {
                let value = self.float(regs, args, *a)?;
                Ok(RtValue::Int(normalize(value as i64, instr.ty)))
            }
            OpCode::Alloca(ty) => {
                let cell = self.cells.len();
                self.cells.push(zero_cell(*ty));
                Ok(RtValue::Addr(cell))
            }
            OpCode::Load { addr } => {
                let addr = self.addr(regs, args, *addr)?;
                Ok(self.cells[addr])
            }
            OpCode::Store { value, addr } => {
                let value = self.eval(regs, args, *value)?;
                let addr = self.addr(regs, args, *addr)?;
                self.cells[addr] = value;
                Ok(RtValue::Unit)
            }
            OpCode::Phi { incomings } => {
                let previous =
                    previous.ok_or_else(|| EngineError::new("phi reached without predecessor"))?;
                let (value, _) = incomings
                    .iter()
                    .find(|(_, block)| *block == previous)
                    .ok_or_else(|| EngineError::new("phi has no incoming for the taken edge"))?;
                self.eval(regs, args, *value)
            }
            OpCode::Call { callee, args: call_args } => {
                let callee = match self.eval(regs, args, *callee)? {
                    RtValue::Fn(id) => id,
                    other => {
                        return Err(EngineError::new(format!(
                            "call through a non-function value {other:?}"
                        )))
                    }
                };
                let mut values = Vec::with_capacity(call_args.len());
                for arg in call_args {
                    values.push(self.eval(regs, args, *arg)?);
                }
                self.exec(callee, values)
            }
        }
    }

    fn int_binop(
        &self,
        function: &crate::ir::Function,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        a: Value,
        b: Value,
        op: fn(i64, i64) -> i64,
    ) -> Result<RtValue, EngineError> {
        let lhs = self.int(regs, args, a)?;
        let rhs = self.int(regs, args, b)?;
        let ty = function.type_of(a);
        Ok(RtValue::Int(normalize(op(lhs, rhs), ty)))
    }

    fn float_binop(
        &self,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        a: Value,
        b: Value,
        op: fn(f64, f64) -> f64,
    ) -> Result<RtValue, EngineError> {
        let lhs = self.float(regs, args, a)?;
        let rhs = self.float(regs, args, b)?;
        Ok(RtValue::Float(op(lhs, rhs)))
    }

    fn int(
        &self,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        value: Value,
    ) -> Result<i64, EngineError> {
        match self.eval(regs, args, value)? {
            RtValue::Int(v) => Ok(v),
            other => Err(EngineError::new(format!(
                "expected an integer, found {other:?}"
            ))),
        }
    }

    fn float(
        &self,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        value: Value,
    ) -> Result<f64, EngineError> {
        match self.eval(regs, args, value)? {
            RtValue::Float(v) => Ok(v),
            other => Err(EngineError::new(format!(
                "expected a float, found {other:?}"
            ))),
        }
    }

    fn addr(
        &self,
        regs: &[Option<RtValue>],
        args: &[RtValue],
        value: Value,
    ) -> Result<usize, EngineError> {
        match self.eval(regs, args, value)? {
            RtValue::Addr(a) => Ok(a),
            other => Err(EngineError::new(format!(
                "expected an address, found {other:?}"
            ))),
        }
    }
}

/// Canonical representation after an operation of the given width.
fn normalize(value: i64, ty: IrType) -> i64 {
    match ty {
        IrType::I1 => value & 1,
        IrType::I8 => value & 0xff,
        IrType::I32 => value as i32 as i64,
        _ => value,
    }
}

fn zero_cell(ty: IrType) -> RtValue {
    match ty {
        IrType::F64 => RtValue::Float(0.0),
        _ => RtValue::Int(0),
    }
}
