//! Structural verification of a finished module.
//!
//! Runs after IR generation; a verification failure means the compiler
//! itself emitted malformed IR and is reported as an internal error, never
//! as a user-facing build error.

use super::{Function, IrType, Module, OpCode, Terminator, Value};

/// Checks the module's structural well-formedness.
///
/// Verified properties: every function has an entry block and every block a
/// terminator; branch targets exist; operand and result types agree; phi
/// nodes have at least one incoming of the right type; calls match the
/// callee's signature; global initializers are constants of the global's
/// type.
pub fn verify(module: &Module) -> Result<(), String> {
    for global in &module.globals {
        if let Some(init) = global.init {
            if !init.is_const() {
                return Err(format!("global @{} has a non-constant initializer", global.name));
            }
            let init_ty = match init {
                Value::ConstInt { ty, .. } => ty,
                Value::ConstFloat(_) => IrType::F64,
                _ => unreachable!("checked above"),
            };
            if init_ty != global.ty {
                return Err(format!(
                    "global @{} of type {} initialized with {}",
                    global.name,
                    global.ty.name(),
                    init_ty.name()
                ));
            }
        }
    }

    for function in &module.functions {
        verify_function(module, function).map_err(|e| format!("in @{}: {e}", function.name))?;
    }
    Ok(())
}

fn verify_function(module: &Module, function: &Function) -> Result<(), String> {
    if function.blocks.is_empty() {
        return Err("function has no blocks".into());
    }

    for block in &function.blocks {
        for &instr in &block.instrs {
            if instr.0 as usize >= function.instrs.len() {
                return Err(format!("block {} references a missing instruction", block.label));
            }
            verify_instr(module, function, instr.0 as usize)
                .map_err(|e| format!("in block {}: {e}", block.label))?;
        }
        let Some(terminator) = &block.terminator else {
            return Err(format!("block {} has no terminator", block.label));
        };
        verify_terminator(function, terminator)
            .map_err(|e| format!("in block {}: {e}", block.label))?;
    }
    Ok(())
}

fn operand(function: &Function, value: Value) -> Result<IrType, String> {
    match value {
        Value::Abstract => return Err("abstract value used as an operand".into()),
        Value::Arg(index) if index >= function.params.len() => {
            return Err(format!("argument {index} out of range"));
        }
        Value::Instr(id) if id.0 as usize >= function.instrs.len() => {
            return Err(format!("instruction %{} out of range", id.0));
        }
        _ => {}
    }
    Ok(function.type_of(value))
}

fn verify_instr(module: &Module, function: &Function, index: usize) -> Result<(), String> {
    let instr = &function.instrs[index];
    match &instr.op {
        OpCode::Add(a, b)
        | OpCode::Sub(a, b)
        | OpCode::Mul(a, b)
        | OpCode::SDiv(a, b)
        | OpCode::UDiv(a, b) => {
            let (ta, tb) = (operand(function, *a)?, operand(function, *b)?);
            if !ta.is_integer() || ta != tb || instr.ty != ta {
                return Err(format!(
                    "integer arithmetic on {} and {}",
                    ta.name(),
                    tb.name()
                ));
            }
        }
        OpCode::FAdd(a, b) | OpCode::FSub(a, b) | OpCode::FMul(a, b) | OpCode::FDiv(a, b) => {
            let (ta, tb) = (operand(function, *a)?, operand(function, *b)?);
            if ta != IrType::F64 || tb != IrType::F64 || instr.ty != IrType::F64 {
                return Err("floating-point arithmetic on non-f64 operands".into());
            }
        }
        OpCode::ICmp(_, a, b) => {
            let (ta, tb) = (operand(function, *a)?, operand(function, *b)?);
            if !(ta.is_integer() || ta == IrType::Ptr) || ta != tb || instr.ty != IrType::I1 {
                return Err(format!("icmp on {} and {}", ta.name(), tb.name()));
            }
        }
        OpCode::FCmp(_, a, b) => {
            let (ta, tb) = (operand(function, *a)?, operand(function, *b)?);
            if ta != IrType::F64 || tb != IrType::F64 || instr.ty != IrType::I1 {
                return Err("fcmp on non-f64 operands".into());
            }
        }
        OpCode::Not(a) => {
            if operand(function, *a)? != IrType::I1 || instr.ty != IrType::I1 {
                return Err("not takes and produces i1".into());
            }
        }
        OpCode::ZExt(a) => {
            let ta = operand(function, *a)?;
            if !ta.is_integer() || !instr.ty.is_integer() || ta.bits() >= instr.ty.bits() {
                return Err(format!("zext from {} to {}", ta.name(), instr.ty.name()));
            }
        }
        OpCode::Trunc(a) => {
            let ta = operand(function, *a)?;
            if !ta.is_integer() || !instr.ty.is_integer() || ta.bits() <= instr.ty.bits() {
                return Err(format!("trunc from {} to {}", ta.name(), instr.ty.name()));
            }
        }
        OpCode::UiToFp(a) | OpCode::SiToFp(a) => {
            if !operand(function, *a)?.is_integer() || instr.ty != IrType::F64 {
                return Err("int-to-float conversion is integer to f64".into());
            }
        }
        OpCode::FpToUi(a) | OpCode::FpToSi(a) => {
            if operand(function, *a)? != IrType::F64 || !instr.ty.is_integer() {
                return Err("float-to-int conversion is f64 to integer".into());
            }
        }
        OpCode::Alloca(ty) => {
            if instr.ty != IrType::Ptr || *ty == IrType::Void {
                return Err("alloca produces ptr for a sized type".into());
            }
        }
        OpCode::Load { addr } => {
            if operand(function, *addr)? != IrType::Ptr || instr.ty == IrType::Void {
                return Err("load reads a sized value through a ptr".into());
            }
        }
        OpCode::Store { value, addr } => {
            let tv = operand(function, *value)?;
            if operand(function, *addr)? != IrType::Ptr || tv == IrType::Void {
                return Err("store writes a sized value through a ptr".into());
            }
        }
        OpCode::Phi { incomings } => {
            if incomings.is_empty() {
                return Err("phi without incomings".into());
            }
            for (value, block) in incomings {
                if operand(function, *value)? != instr.ty {
                    return Err("phi incoming type mismatch".into());
                }
                if block.0 as usize >= function.blocks.len() {
                    return Err("phi incoming from a missing block".into());
                }
            }
        }
        OpCode::Call { callee, args } => {
            match callee {
                Value::Function(id) => {
                    let target = module.function(*id);
                    if args.len() != target.params.len() {
                        return Err(format!(
                            "call to @{} with {} arguments, expected {}",
                            target.name,
                            args.len(),
                            target.params.len()
                        ));
                    }
                    for (arg, param) in args.iter().zip(&target.params) {
                        if operand(function, *arg)? != *param {
                            return Err(format!("call argument type mismatch for @{}", target.name));
                        }
                    }
                    if instr.ty != target.ret {
                        return Err(format!("call result type mismatch for @{}", target.name));
                    }
                }
                _ => {
                    if operand(function, *callee)? != IrType::Ptr {
                        return Err("indirect call through a non-ptr callee".into());
                    }
                }
            }
        }
    }
    Ok(())
}

fn verify_terminator(function: &Function, terminator: &Terminator) -> Result<(), String> {
    let block_exists = |id: super::BlockId| (id.0 as usize) < function.blocks.len();
    match terminator {
        Terminator::Br(target) => {
            if !block_exists(*target) {
                return Err("branch to a missing block".into());
            }
        }
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => {
            if operand(function, *cond)? != IrType::I1 {
                return Err("conditional branch on a non-i1 value".into());
            }
            if !block_exists(*then_block) || !block_exists(*else_block) {
                return Err("conditional branch to a missing block".into());
            }
        }
        Terminator::Ret(value) => {
            if operand(function, *value)? != function.ret {
                return Err(format!(
                    "return of {} from a {} function",
                    function.type_of(*value).name(),
                    function.ret.name()
                ));
            }
        }
        Terminator::RetVoid => {
            if function.ret != IrType::Void {
                return Err("void return from a non-void function".into());
            }
        }
        Terminator::Unreachable => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::builder::Builder;
    use super::*;

    #[test]
    fn a_minimal_function_verifies() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        let v = builder.const_int(IrType::I32, 42);
        builder.ret(v);
        assert_eq!(verify(&builder.finish()), Ok(()));
    }

    #[test]
    fn a_block_without_terminator_is_rejected() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        builder.create_block(func, "entry");
        let err = verify(&builder.finish()).unwrap_err();
        assert!(err.contains("no terminator"), "{err}");
    }

    #[test]
    fn mixed_type_arithmetic_is_rejected() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        let a = builder.const_int(IrType::I32, 1);
        let b = builder.const_int(IrType::I8, 1);
        let sum = builder.add(a, b, "");
        builder.ret(sum);
        assert!(verify(&builder.finish()).is_err());
    }

    #[test]
    fn return_type_must_match_the_signature() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        let v = builder.const_int(IrType::I1, 1);
        builder.ret(v);
        assert!(verify(&builder.finish()).is_err());
    }

    #[test]
    fn abstract_values_never_reach_instructions() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        let one = builder.const_int(IrType::I32, 1);
        let bad = builder.add(Value::Abstract, one, "");
        builder.ret(bad);
        assert!(verify(&builder.finish()).is_err());
    }

    #[test]
    fn call_arity_is_verified() {
        let mut builder = Builder::new("m");
        let callee = builder.create_function("f", vec![IrType::I32], IrType::I32);
        let ce = builder.create_block(callee, "entry");
        builder.set_insert_point(callee, ce);
        builder.ret(Value::Arg(0));

        let main = builder.create_function("main", vec![], IrType::I32);
        let me = builder.create_block(main, "entry");
        builder.set_insert_point(main, me);
        let call = builder.call(Value::Function(callee), vec![], IrType::I32, "call");
        builder.ret(call);
        let err = verify(&builder.finish()).unwrap_err();
        assert!(err.contains("arguments"), "{err}");
    }

    #[test]
    fn global_initializers_must_match_the_type() {
        let mut builder = Builder::new("m");
        builder.create_global("g", IrType::I32, Some(Value::ConstFloat(1.0)), true);
        let f = builder.create_function("main", vec![], IrType::Void);
        let e = builder.create_block(f, "entry");
        builder.set_insert_point(f, e);
        builder.ret_void();
        assert!(verify(&builder.finish()).is_err());
    }

    #[test]
    fn phi_needs_at_least_one_incoming() {
        let mut builder = Builder::new("m");
        let func = builder.create_function("main", vec![], IrType::I32);
        let entry = builder.create_block(func, "entry");
        builder.set_insert_point(func, entry);
        let phi = builder.phi(IrType::I32, vec![], "phi");
        builder.ret(phi);
        assert!(verify(&builder.finish()).is_err());
    }
}
