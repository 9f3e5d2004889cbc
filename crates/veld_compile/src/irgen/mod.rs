//! Pass 5: lowering the annotated AST to typed SSA IR.
//!
//! The generator walks the tree bottom-up. Every analyzed object carries an
//! IR decoration ([`ObjIr`]) that progresses `start → allocated →
//! initialized` and records where the object lives: behind an address
//! (alloca, global, function) or directly as an SSA value. An object must
//! live in memory if its storage duration is not local, if it is ever
//! written, or if its address is taken; everything else stays in a virtual
//! register.
//!
//! All allocas land in the entry block of their function so the backend can
//! promote them. Control flow lowers to the usual shapes: a five-block
//! diamond for `if`, a three-block loop for `while`, a short-circuit
//! diamond with a phi for `&&`/`||`. Blocks left open behind diverging
//! constructs are sealed with `unreachable` when their function finishes.

pub mod forward;

use veld_base::Interner;

use veld_language::ast::{Expr, ExprKind, Op};
use veld_language::diag::{BuildInterrupt, PassResult};
use veld_language::object::{ObjectId, ObjectTable, StorageDuration};
use veld_language::types::{FundaType, ObjType, ObjTypeId, TypeClass, TypeInterner};

use crate::ir::builder::Builder;
use crate::ir::{verify, BlockId, FloatPred, FuncId, IntPred, IrType, Module, Value};

use forward::ForwardDeclarator;

/// Lowers `root` to a verified module.
pub fn generate(
    root: &Expr,
    objects: &ObjectTable,
    types: &TypeInterner,
    names: &Interner,
) -> PassResult<Module> {
    let mut builder = Builder::new("main");
    let mut obj_ir = vec![ObjIr::default(); objects.len()];

    ForwardDeclarator::new(objects, types, names, &mut builder, &mut obj_ir).run(root);

    let mut gen = IrGen {
        objects,
        types,
        names,
        builder,
        obj_ir,
        insert_stack: Vec::new(),
    };
    gen.visit(root)?;

    let module = gen.builder.finish();
    verify::verify(&module)
        .map_err(|message| BuildInterrupt::Internal(format!("IR verification failed: {message}")))?;
    Ok(module)
}

/// Maps a canonical object type onto its IR representation.
pub(crate) fn ir_type(types: &TypeInterner, ty: ObjTypeId) -> IrType {
    match types.get(types.unqualified(ty)) {
        ObjType::Funda(funda) => match funda {
            FundaType::Void | FundaType::Noreturn | FundaType::Infer => IrType::Void,
            FundaType::Bool => IrType::I1,
            FundaType::Char => IrType::I8,
            FundaType::Int => IrType::I32,
            FundaType::Double => IrType::F64,
            FundaType::Nullptr => IrType::Ptr,
        },
        ObjType::Ptr { .. } | ObjType::Fun { .. } => IrType::Ptr,
        ObjType::Quali { .. } => unreachable!("unqualified above"),
        ObjType::Class { .. } => IrType::Ptr,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Start,
    Allocated,
    Initialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Residency {
    #[default]
    Unset,
    /// The object lives in memory; the value is its address.
    Addr(Value),
    /// The object lives as this SSA value.
    Ssa(Value),
}

/// Per-object IR decoration.
#[derive(Debug, Clone, Default)]
pub(crate) struct ObjIr {
    phase: Phase,
    residency: Residency,
}

impl ObjIr {
    /// Associates an allocated but uninitialized memory slot.
    pub(crate) fn allocate_addr(&mut self, addr: Value) {
        debug_assert_eq!(self.phase, Phase::Start);
        self.residency = Residency::Addr(addr);
        self.phase = Phase::Allocated;
    }

    /// Associates an already live memory object (function, derefee).
    pub(crate) fn refer_to_addr(&mut self, addr: Value) {
        debug_assert_eq!(self.phase, Phase::Start);
        self.residency = Residency::Addr(addr);
        self.phase = Phase::Initialized;
    }

    fn mark_ssa(&mut self) {
        debug_assert_eq!(self.phase, Phase::Start);
        self.phase = Phase::Allocated;
    }

    fn addr(&self) -> Value {
        match self.residency {
            Residency::Addr(addr) => addr,
            _ => unreachable!("object is not memory-resident"),
        }
    }
}

struct IrGen<'a> {
    objects: &'a ObjectTable,
    types: &'a TypeInterner,
    names: &'a Interner,
    builder: Builder,
    obj_ir: Vec<ObjIr>,
    /// Saved insert points around nested function definitions.
    insert_stack: Vec<Option<(FuncId, BlockId)>>,
}

impl<'a> IrGen<'a> {
    // ---- object decoration ------------------------------------------------

    fn obj_type(&self, object: ObjectId) -> ObjTypeId {
        self.objects
            .get(object)
            .obj_type
            .expect("analysis typed every object")
    }

    fn obj_ir_type(&self, object: ObjectId) -> IrType {
        ir_type(self.types, self.obj_type(object))
    }

    /// Initializes an allocated object with `value`.
    fn initialize(&mut self, object: ObjectId, value: Value) {
        let slot = &mut self.obj_ir[object.index()];
        debug_assert_ne!(slot.phase, Phase::Start);
        match slot.residency {
            Residency::Addr(addr) => {
                if self.objects.get(object).storage == StorageDuration::Static {
                    // a static object is initialized once, in the image, not
                    // every time control flow passes its definition
                    let Value::Global(global) = addr else {
                        unreachable!("static objects live behind globals")
                    };
                    self.builder.set_global_initializer(global, value);
                    self.obj_ir[object.index()].phase = Phase::Initialized;
                } else {
                    self.builder.store(value, addr);
                    self.obj_ir[object.index()].phase = Phase::Initialized;
                }
            }
            Residency::Unset | Residency::Ssa(_) => {
                slot.residency = Residency::Ssa(value);
                slot.phase = Phase::Initialized;
            }
        }
    }

    /// Allocates (memory or SSA) and initializes a local object in one step.
    fn init_local(&mut self, object: ObjectId, value: Value, name: &str) {
        if self.objects.get(object).is_stored_in_memory() {
            let ty = self.obj_ir_type(object);
            let addr = self.builder.alloca_in_entry(ty, name);
            self.obj_ir[object.index()].allocate_addr(addr);
        } else {
            self.obj_ir[object.index()].mark_ssa();
        }
        self.initialize(object, value);
    }

    /// Reads the current value of an initialized object.
    fn value_of(&mut self, object: ObjectId, name: &str) -> Value {
        match self.obj_ir[object.index()].residency {
            Residency::Addr(addr) => {
                let ty = self.obj_ir_type(object);
                self.builder.load(addr, ty, name)
            }
            Residency::Ssa(value) => value,
            // an SSA object read before any write (`noinit`) yields zero
            Residency::Unset => zero_of(self.obj_ir_type(object)),
        }
    }

    /// Writes a new value to a memory-resident object.
    fn set_value(&mut self, object: ObjectId, value: Value) {
        let addr = self.obj_ir[object.index()].addr();
        self.builder.store(value, addr);
    }

    fn addr_of(&self, object: ObjectId) -> Value {
        self.obj_ir[object.index()].addr()
    }

    // ---- traversal --------------------------------------------------------

    fn object_of(expr: &Expr) -> ObjectId {
        expr.object.expect("analysis associated every expression")
    }

    fn gen_value(&mut self, expr: &Expr) -> PassResult<Value> {
        self.visit(expr)?;
        Ok(self.value_of(Self::object_of(expr), ""))
    }

    fn expr_type(&self, expr: &Expr) -> ObjTypeId {
        self.obj_type(Self::object_of(expr))
    }

    fn is_noreturn(&self, expr: &Expr) -> bool {
        self.types.is_noreturn(self.expr_type(expr))
    }

    fn visit(&mut self, expr: &Expr) -> PassResult<()> {
        match &expr.kind {
            ExprKind::Nop => {
                self.init_local(Self::object_of(expr), Value::Abstract, "");
                Ok(())
            }
            ExprKind::Number { value, .. } => self.visit_number(expr, *value),
            // the object bound to the name was decorated at its definition
            ExprKind::Symbol { .. } => Ok(()),
            ExprKind::Cast { arg, .. } => self.visit_cast(expr, arg),
            ExprKind::Operator { op, args } => self.visit_operator(expr, *op, args),
            ExprKind::Seq { operands } => {
                // all operands run; the sequence shares its last operand's
                // object, so there is nothing to forward
                for operand in operands {
                    self.visit(operand)?;
                }
                Ok(())
            }
            ExprKind::Block { body, .. } => {
                let value = self.gen_value(body)?;
                self.init_local(Self::object_of(expr), value, "");
                Ok(())
            }
            ExprKind::If { cond, then, els } => self.visit_if(expr, cond, then, els.as_deref()),
            ExprKind::Loop { cond, body } => self.visit_loop(expr, cond, body),
            ExprKind::Return { value } => self.visit_return(expr, value),
            ExprKind::Call { callee, args } => self.visit_call(expr, callee, args),
            ExprKind::DataDef(def) => self.visit_data_def(expr, def),
            ExprKind::FunDef(def) => self.visit_fun_def(def),
        }
    }

    fn visit_number(&mut self, expr: &Expr, value: f64) -> PassResult<()> {
        let object = Self::object_of(expr);
        let constant = match self.obj_ir_type(object) {
            ty @ (IrType::I1 | IrType::I8 | IrType::I32) => self.builder.const_int(ty, value as i64),
            IrType::F64 => self.builder.const_float(value),
            other => {
                return Err(BuildInterrupt::Internal(format!(
                    "literal of unexpected IR type {}",
                    other.name()
                )))
            }
        };
        self.init_local(object, constant, "literal");
        Ok(())
    }

    fn visit_cast(&mut self, expr: &Expr, arg: &Expr) -> PassResult<()> {
        let value = self.gen_value(arg)?;
        let src = ir_type(self.types, self.expr_type(arg));
        let dst = ir_type(self.types, self.expr_type(expr));
        let name = "cast";

        let result = if src == dst {
            value // same representation, a nop
        } else if src.is_integer() && dst.is_integer() {
            if src == IrType::I1 {
                self.emit_zext(value, dst, name)
            } else if dst == IrType::I1 {
                let zero = self.builder.const_int(src, 0);
                self.emit_icmp_ne(value, zero, name)
            } else if src.bits() < dst.bits() {
                // the only widening sources are unsigned (bool, char)
                self.emit_zext(value, dst, name)
            } else {
                self.emit_trunc(value, dst, name)
            }
        } else if src.is_integer() && dst == IrType::F64 {
            if src == IrType::I32 {
                self.emit_sitofp(value, name)
            } else {
                self.emit_uitofp(value, name)
            }
        } else if src == IrType::F64 && dst.is_integer() {
            if dst == IrType::I1 {
                let zero = self.builder.const_float(0.0);
                self.emit_fcmp_one(value, zero, name)
            } else if dst == IrType::I8 {
                self.emit_fptoui(value, dst, name)
            } else {
                self.emit_fptosi(value, dst, name)
            }
        } else {
            return Err(BuildInterrupt::Internal(format!(
                "cast from {} to {} survived analysis",
                src.name(),
                dst.name()
            )));
        };

        self.init_local(Self::object_of(expr), result, name);
        Ok(())
    }

    // Conversions fold constants so that casts of literals stay usable as
    // global initializers.

    fn emit_zext(&mut self, value: Value, to: IrType, name: &str) -> Value {
        match value {
            Value::ConstInt { value, .. } => self.builder.const_int(to, value),
            _ => self.builder.zext(value, to, name),
        }
    }

    fn emit_trunc(&mut self, value: Value, to: IrType, name: &str) -> Value {
        match value {
            Value::ConstInt { value, .. } => self.builder.const_int(to, truncate(value, to)),
            _ => self.builder.trunc(value, to, name),
        }
    }

    fn emit_icmp_ne(&mut self, value: Value, zero: Value, name: &str) -> Value {
        match value {
            Value::ConstInt { value, .. } => {
                self.builder.const_int(IrType::I1, i64::from(value != 0))
            }
            _ => self.builder.icmp(IntPred::Ne, value, zero, name),
        }
    }

    fn emit_uitofp(&mut self, value: Value, name: &str) -> Value {
        match value {
            Value::ConstInt { value, .. } => self.builder.const_float(value as u64 as f64),
            _ => self.builder.uitofp(value, name),
        }
    }

    fn emit_sitofp(&mut self, value: Value, name: &str) -> Value {
        match value {
            Value::ConstInt { value, .. } => self.builder.const_float(value as f64),
            _ => self.builder.sitofp(value, name),
        }
    }

    fn emit_fptoui(&mut self, value: Value, to: IrType, name: &str) -> Value {
        match value {
            Value::ConstFloat(value) => self.builder.const_int(to, truncate(value as i64, to)),
            _ => self.builder.fptoui(value, to, name),
        }
    }

    fn emit_fptosi(&mut self, value: Value, to: IrType, name: &str) -> Value {
        match value {
            Value::ConstFloat(value) => self.builder.const_int(to, truncate(value as i64, to)),
            _ => self.builder.fptosi(value, to, name),
        }
    }

    fn emit_fcmp_one(&mut self, value: Value, zero: Value, name: &str) -> Value {
        match value {
            Value::ConstFloat(value) => {
                self.builder.const_int(IrType::I1, i64::from(value != 0.0))
            }
            _ => self.builder.fcmp(FloatPred::One, value, zero, name),
        }
    }

    fn visit_operator(&mut self, expr: &Expr, op: Op, args: &[Expr]) -> PassResult<()> {
        let object = Self::object_of(expr);
        match op {
            Op::Not => {
                let operand = self.gen_value(&args[0])?;
                let result = self.builder.not(operand, "not");
                self.init_local(object, result, "not");
            }
            Op::AddrOf => {
                self.visit(&args[0])?;
                let addr = self.addr_of(Self::object_of(&args[0]));
                self.init_local(object, addr, "addr");
            }
            Op::Deref => {
                // the node's object is a stand-in for the derefee: bind it
                // to the address the operand evaluates to
                let addr = self.gen_value(&args[0])?;
                self.obj_ir[object.index()].refer_to_addr(addr);
            }
            Op::And | Op::Or => self.visit_short_circuit(expr, op, args)?,
            Op::Assign | Op::RefAssign => {
                self.visit(&args[0])?;
                let rhs = self.gen_value(&args[1])?;
                self.set_value(Self::object_of(&args[0]), rhs);
                if op == Op::Assign {
                    // the void-assignment's own value is abstract
                    self.init_local(object, Value::Abstract, "");
                }
                // the lvalue-assignment shares the lhs object: nothing to do
            }
            _ if args.len() == 2 => {
                let lhs = self.gen_value(&args[0])?;
                let rhs = self.gen_value(&args[1])?;
                let integral = self
                    .types
                    .is(self.expr_type(&args[0]), TypeClass::StoredAsIntegral);
                let result = if integral {
                    self.integral_binary(op, &args[0], lhs, rhs)?
                } else {
                    self.float_binary(op, lhs, rhs)?
                };
                self.init_local(object, result, "");
            }
            _ => {
                // unary `+` and `-`
                let operand = self.gen_value(&args[0])?;
                let integral = self
                    .types
                    .is(self.expr_type(&args[0]), TypeClass::StoredAsIntegral);
                let result = match op {
                    Op::Add => operand,
                    Op::Sub if integral => {
                        let ty = ir_type(self.types, self.expr_type(&args[0]));
                        let zero = self.builder.const_int(ty, 0);
                        self.builder.sub(zero, operand, "neg")
                    }
                    Op::Sub => {
                        let zero = self.builder.const_float(0.0);
                        self.builder.fsub(zero, operand, "fneg")
                    }
                    other => {
                        return Err(BuildInterrupt::Internal(format!(
                            "unary operator `{}` survived analysis",
                            other.symbol()
                        )))
                    }
                };
                self.init_local(object, result, "");
            }
        }
        Ok(())
    }

    fn integral_binary(&mut self, op: Op, lhs_expr: &Expr, lhs: Value, rhs: Value) -> PassResult<Value> {
        let unsigned = !self.types.is(self.expr_type(lhs_expr), TypeClass::Integral);
        Ok(match op {
            Op::Add => self.builder.add(lhs, rhs, "add"),
            Op::Sub => self.builder.sub(lhs, rhs, "sub"),
            Op::Mul => self.builder.mul(lhs, rhs, "mul"),
            Op::Div if unsigned => self.builder.udiv(lhs, rhs, "div"),
            Op::Div => self.builder.sdiv(lhs, rhs, "div"),
            Op::EqualTo => self.builder.icmp(IntPred::Eq, lhs, rhs, "cmp"),
            Op::NotEqualTo => self.builder.icmp(IntPred::Ne, lhs, rhs, "cmp"),
            Op::Less => self.icmp_ordered(IntPred::Slt, IntPred::Ult, unsigned, lhs, rhs),
            Op::LessEq => self.icmp_ordered(IntPred::Sle, IntPred::Ule, unsigned, lhs, rhs),
            Op::Greater => self.icmp_ordered(IntPred::Sgt, IntPred::Ugt, unsigned, lhs, rhs),
            Op::GreaterEq => self.icmp_ordered(IntPred::Sge, IntPred::Uge, unsigned, lhs, rhs),
            other => {
                return Err(BuildInterrupt::Internal(format!(
                    "binary operator `{}` survived analysis",
                    other.symbol()
                )))
            }
        })
    }

    fn icmp_ordered(
        &mut self,
        signed: IntPred,
        unsigned_pred: IntPred,
        unsigned: bool,
        lhs: Value,
        rhs: Value,
    ) -> Value {
        let pred = if unsigned { unsigned_pred } else { signed };
        self.builder.icmp(pred, lhs, rhs, "cmp")
    }

    fn float_binary(&mut self, op: Op, lhs: Value, rhs: Value) -> PassResult<Value> {
        Ok(match op {
            Op::Add => self.builder.fadd(lhs, rhs, "add"),
            Op::Sub => self.builder.fsub(lhs, rhs, "sub"),
            Op::Mul => self.builder.fmul(lhs, rhs, "mul"),
            Op::Div => self.builder.fdiv(lhs, rhs, "div"),
            Op::EqualTo => self.builder.fcmp(FloatPred::Oeq, lhs, rhs, "cmp"),
            Op::NotEqualTo => self.builder.fcmp(FloatPred::One, lhs, rhs, "cmp"),
            Op::Less => self.builder.fcmp(FloatPred::Olt, lhs, rhs, "cmp"),
            Op::LessEq => self.builder.fcmp(FloatPred::Ole, lhs, rhs, "cmp"),
            Op::Greater => self.builder.fcmp(FloatPred::Ogt, lhs, rhs, "cmp"),
            Op::GreaterEq => self.builder.fcmp(FloatPred::Oge, lhs, rhs, "cmp"),
            other => {
                return Err(BuildInterrupt::Internal(format!(
                    "binary operator `{}` survived analysis",
                    other.symbol()
                )))
            }
        })
    }

    /// `&&`/`||`: evaluate the rhs only when the lhs does not already decide
    /// the result; merge with a phi.
    fn visit_short_circuit(&mut self, expr: &Expr, op: Op, args: &[Expr]) -> PassResult<()> {
        let func = self.builder.current_function();
        let prefix = if op == Op::And { "and" } else { "or" };
        let rhs_block = self.builder.create_block(func, format!("{prefix}_rhs"));
        let merge_block = self.builder.create_block(func, format!("{prefix}_merge"));

        let lhs = self.gen_value(&args[0])?;
        if op == Op::And {
            self.builder.cond_br(lhs, rhs_block, merge_block);
        } else {
            self.builder.cond_br(lhs, merge_block, rhs_block);
        }
        let lhs_end = self.builder.current_block();

        self.builder.set_insert_point(func, rhs_block);
        let rhs = self.gen_value(&args[1])?;
        let rhs_diverges = self.is_noreturn(&args[1]);
        self.builder.br(merge_block);
        let rhs_end = self.builder.current_block();

        self.builder.set_insert_point(func, merge_block);
        let mut incomings = vec![(lhs, lhs_end)];
        if !rhs_diverges {
            incomings.push((rhs, rhs_end));
        }
        let phi = self.builder.phi(IrType::I1, incomings, prefix);
        self.init_local(Self::object_of(expr), phi, prefix);
        Ok(())
    }

    /// The five-block `if` diamond. Arms that diverge do not branch to the
    /// merge block; the merge either phis the two arm values or forwards
    /// the only live one.
    fn visit_if(
        &mut self,
        expr: &Expr,
        cond: &Expr,
        then: &Expr,
        els: Option<&Expr>,
    ) -> PassResult<()> {
        let func = self.builder.current_function();
        let then_block = self.builder.create_block(func, "if_then");
        let else_block = self.builder.create_block(func, "if_else");
        let merge_block = self.builder.create_block(func, "if_merge");

        let cond_value = self.gen_value(cond)?;
        self.builder.cond_br(cond_value, then_block, else_block);

        self.builder.set_insert_point(func, then_block);
        let then_value = self.gen_value(then)?;
        let then_diverges = self.is_noreturn(then);
        if !then_diverges {
            self.builder.br(merge_block);
        }
        let then_end = self.builder.current_block();

        self.builder.set_insert_point(func, else_block);
        let (else_value, else_diverges) = match els {
            Some(els) => {
                let value = self.gen_value(els)?;
                let diverges = self.is_noreturn(els);
                if !diverges {
                    self.builder.br(merge_block);
                }
                (value, diverges)
            }
            None => {
                self.builder.br(merge_block);
                (Value::Abstract, false)
            }
        };
        let else_end = self.builder.current_block();

        self.builder.set_insert_point(func, merge_block);
        let object = Self::object_of(expr);
        let abstract_then = then_diverges || then_value == Value::Abstract;
        let abstract_else = else_diverges || else_value == Value::Abstract;
        let result = match (abstract_then, abstract_else) {
            (false, false) => {
                let ty = ir_type(self.types, self.expr_type(then));
                self.builder.phi(
                    ty,
                    vec![(then_value, then_end), (else_value, else_end)],
                    "if_phi",
                )
            }
            // a diverging arm forwards the other arm's value directly
            (true, false) if els.is_some() && !self.types.is_void(self.expr_type(expr)) => {
                else_value
            }
            (false, true) if !self.types.is_void(self.expr_type(expr)) => then_value,
            _ => Value::Abstract,
        };
        self.init_local(object, result, "if");
        Ok(())
    }

    /// `while` lowers to condition, body and continuation blocks.
    fn visit_loop(&mut self, expr: &Expr, cond: &Expr, body: &Expr) -> PassResult<()> {
        let func = self.builder.current_function();
        let cond_block = self.builder.create_block(func, "loop_cond");
        let body_block = self.builder.create_block(func, "loop_body");
        let after_block = self.builder.create_block(func, "after_loop");

        self.builder.br(cond_block);

        self.builder.set_insert_point(func, cond_block);
        let cond_value = self.gen_value(cond)?;
        self.builder.cond_br(cond_value, body_block, after_block);

        self.builder.set_insert_point(func, body_block);
        self.visit(body)?;
        if !self.is_noreturn(body) {
            self.builder.br(cond_block);
        }

        self.builder.set_insert_point(func, after_block);
        self.init_local(Self::object_of(expr), Value::Abstract, "");
        Ok(())
    }

    fn visit_return(&mut self, expr: &Expr, value: &Expr) -> PassResult<()> {
        let result = self.gen_value(value)?;
        if self.types.is_void(self.expr_type(value)) {
            self.builder.ret_void();
        } else {
            self.builder.ret(result);
        }
        self.init_local(Self::object_of(expr), Value::Abstract, "");
        Ok(())
    }

    fn visit_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> PassResult<()> {
        self.visit(callee)?;
        let callee_addr = self.addr_of(Self::object_of(callee));

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.gen_value(arg)?);
        }

        let ret_obj_ty = self.expr_type(expr);
        let object = Self::object_of(expr);
        if self.types.is_void(ret_obj_ty) {
            self.builder
                .call(callee_addr, arg_values, IrType::Void, "");
            self.init_local(object, Value::Abstract, "");
        } else {
            let ret = ir_type(self.types, ret_obj_ty);
            let result = self.builder.call(callee_addr, arg_values, ret, "call");
            self.init_local(object, result, "call");
        }
        Ok(())
    }

    fn visit_data_def(
        &mut self,
        expr: &Expr,
        def: &veld_language::ast::DataDef,
    ) -> PassResult<()> {
        let object = Self::object_of(expr);
        let storage = self.objects.get(object).storage;

        if def.do_not_init {
            // allocate without storing; the global case was already created
            // by the forward declarator and stays zero-filled
            if storage == StorageDuration::Local && self.objects.get(object).is_stored_in_memory()
            {
                let ty = self.obj_ir_type(object);
                let addr = self
                    .builder
                    .alloca_in_entry(ty, self.names.resolve(def.name));
                self.obj_ir[object.index()].allocate_addr(addr);
            } else if storage == StorageDuration::Local {
                self.obj_ir[object.index()].mark_ssa();
            }
            return Ok(());
        }

        let init = self.gen_value(&def.ctor_args[0])?;
        if storage == StorageDuration::Static {
            // the forward declarator allocated the global
            self.initialize(object, init);
        } else {
            self.init_local(object, init, self.names.resolve(def.name));
        }
        Ok(())
    }

    fn visit_fun_def(&mut self, def: &veld_language::ast::FunDef) -> PassResult<()> {
        let object = def.object.expect("analysis decorated the definition");
        let Value::Function(func) = self.addr_of(object) else {
            return Err(BuildInterrupt::Internal(
                "function object lost its forward declaration".into(),
            ));
        };

        // a nested definition interrupts the surrounding emission context;
        // the saved insert point is restored on every exit path
        self.insert_stack.push(self.builder.insert_point());
        let entry = self.builder.create_block(func, "entry");
        self.builder.set_insert_point(func, entry);

        for (index, param) in def.params.iter().enumerate() {
            let param_object = param.object.expect("analysis decorated the parameter");
            if self.objects.get(param_object).is_stored_in_memory() {
                let ty = self.obj_ir_type(param_object);
                let addr = self
                    .builder
                    .alloca_in_entry(ty, self.names.resolve(param.name));
                self.obj_ir[param_object.index()].allocate_addr(addr);
            } else {
                self.obj_ir[param_object.index()].mark_ssa();
            }
            self.initialize(param_object, Value::Arg(index));
        }

        let result = self.gen_value(&def.body);
        if let Ok(body_value) = result {
            let body_ty = self.expr_type(&def.body);
            if self.types.is_void(body_ty) {
                self.builder.ret_void();
            } else if !self.types.is_noreturn(body_ty) {
                self.builder.ret(body_value);
            }
            self.builder.seal_function(func);
        }

        match self.insert_stack.pop().flatten() {
            Some((outer_func, outer_block)) => {
                self.builder.set_insert_point(outer_func, outer_block)
            }
            None => self.builder.clear_insert_point(),
        }
        result.map(|_| ())
    }
}

fn truncate(value: i64, to: IrType) -> i64 {
    match to {
        IrType::I1 => value & 1,
        IrType::I8 => value & 0xff,
        IrType::I32 => value as i32 as i64,
        _ => value,
    }
}

fn zero_of(ty: IrType) -> Value {
    match ty {
        IrType::F64 => Value::ConstFloat(0.0),
        IrType::Void => Value::Abstract,
        other => Value::ConstInt {
            ty: other,
            value: 0,
        },
    }
}
