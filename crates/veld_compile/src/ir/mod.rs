//! The typed SSA intermediate representation.
//!
//! A [`Module`] holds functions and global variables. Each [`Function`] owns
//! its basic blocks and instructions; instructions produce [`Value`]s that
//! later instructions reference. Blocks end in exactly one [`Terminator`].
//! The shapes and semantics follow LLVM-style typed SSA: allocas for stack
//! slots, explicit loads and stores, phi nodes at control-flow merges.
//!
//! The IR is built through the [`Builder`](builder::Builder), checked by
//! [`verify`](verify::verify) and either printed or executed by the
//! [engine](crate::engine).

pub mod builder;
pub mod verify;

use std::fmt;

/// First-class IR types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    I1,
    I8,
    I32,
    F64,
    /// An untyped address (pointer, global or function).
    Ptr,
    Void,
}

impl IrType {
    pub fn is_integer(self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I32)
    }

    pub fn bits(self) -> u32 {
        match self {
            IrType::I1 => 1,
            IrType::I8 => 8,
            IrType::I32 => 32,
            IrType::F64 | IrType::Ptr => 64,
            IrType::Void => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IrType::I1 => "i1",
            IrType::I8 => "i8",
            IrType::I32 => "i32",
            IrType::F64 => "f64",
            IrType::Ptr => "ptr",
            IrType::Void => "void",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub u32);

/// An SSA value: a constant, a function argument, an instruction result or
/// the address of a module-level entity.
///
/// [`Value::Abstract`] stands in for objects of abstract type (`void`,
/// `noreturn`) which have no runtime representation; it must never become
/// an instruction operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    ConstInt { ty: IrType, value: i64 },
    ConstFloat(f64),
    /// Argument of the containing function.
    Arg(usize),
    /// Result of an instruction of the containing function.
    Instr(InstrId),
    /// Address of a global variable.
    Global(GlobalId),
    /// Address of a function.
    Function(FuncId),
    /// The non-value of abstract objects.
    Abstract,
}

impl Value {
    pub fn is_const(self) -> bool {
        matches!(self, Value::ConstInt { .. } | Value::ConstFloat(_))
    }
}

/// Integer comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPred {
    Eq,
    Ne,
    Ult,
    Ule,
    Ugt,
    Uge,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// Ordered floating-point comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPred {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpCode {
    Add(Value, Value),
    Sub(Value, Value),
    Mul(Value, Value),
    SDiv(Value, Value),
    UDiv(Value, Value),
    FAdd(Value, Value),
    FSub(Value, Value),
    FMul(Value, Value),
    FDiv(Value, Value),
    ICmp(IntPred, Value, Value),
    FCmp(FloatPred, Value, Value),
    /// Bitwise not on i1.
    Not(Value),
    ZExt(Value),
    Trunc(Value),
    UiToFp(Value),
    SiToFp(Value),
    FpToUi(Value),
    FpToSi(Value),
    /// Stack slot for a value of the given type; result is its address.
    Alloca(IrType),
    Load { addr: Value },
    Store { value: Value, addr: Value },
    Phi { incomings: Vec<(Value, BlockId)> },
    Call { callee: Value, args: Vec<Value> },
}

/// One instruction; `ty` is the type of its result (`Void` for stores).
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub op: OpCode,
    pub ty: IrType,
    /// Name hint carried into the textual dump.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Value),
    RetVoid,
    /// Control never reaches this point; used to seal blocks behind
    /// diverging constructs.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub instrs: Vec<InstrId>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    /// Block 0 is the entry block.
    pub blocks: Vec<Block>,
    pub instrs: Vec<Instr>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0 as usize]
    }

    pub fn arg_size(&self) -> usize {
        self.params.len()
    }

    /// Type of a value as seen from inside this function.
    pub fn type_of(&self, value: Value) -> IrType {
        match value {
            Value::ConstInt { ty, .. } => ty,
            Value::ConstFloat(_) => IrType::F64,
            Value::Arg(index) => self.params[index],
            Value::Instr(id) => self.instr(id).ty,
            Value::Global(_) | Value::Function(_) => IrType::Ptr,
            Value::Abstract => IrType::Void,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    /// Constant initializer; `None` until IR generation fills it in (or for
    /// deliberately uninitialized data).
    pub init: Option<Value>,
    pub is_constant: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.0 as usize]
    }

    pub fn function_by_name(&self, name: &str) -> Option<(FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (FuncId(i as u32), f))
    }
}

// ---- textual dump ----------------------------------------------------------

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for global in &self.globals {
            write!(
                f,
                "@{} = {} {}",
                global.name,
                if global.is_constant { "constant" } else { "global" },
                global.ty.name()
            )?;
            match global.init {
                Some(init) => writeln!(f, " {}", DisplayValue(init))?,
                None => writeln!(f, " zeroinitializer")?,
            }
        }
        for function in &self.functions {
            writeln!(f)?;
            let params = function
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{} %arg{i}", p.name()))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "define {} @{}({params}) {{", function.ret.name(), function.name)?;
            for block in &function.blocks {
                writeln!(f, "{}:", block.label)?;
                for &instr in &block.instrs {
                    let i = function.instr(instr);
                    write!(f, "  ")?;
                    if i.ty != IrType::Void {
                        write!(f, "%{} = ", display_name(i, instr))?;
                    }
                    writeln!(f, "{}", DisplayOp(&i.op, i.ty))?;
                }
                match &block.terminator {
                    Some(term) => writeln!(f, "  {}", DisplayTerm(term, function))?,
                    None => writeln!(f, "  ; missing terminator")?,
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

fn display_name(instr: &Instr, id: InstrId) -> String {
    if instr.name.is_empty() {
        format!("v{}", id.0)
    } else {
        format!("{}.{}", instr.name, id.0)
    }
}

struct DisplayValue(Value);

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::ConstInt { ty, value } => write!(f, "{} {value}", ty.name()),
            Value::ConstFloat(value) => write!(f, "f64 {value:?}"),
            Value::Arg(index) => write!(f, "%arg{index}"),
            Value::Instr(id) => write!(f, "%v{}", id.0),
            Value::Global(id) => write!(f, "@g{}", id.0),
            Value::Function(id) => write!(f, "@f{}", id.0),
            Value::Abstract => write!(f, "abstract"),
        }
    }
}

struct DisplayOp<'a>(&'a OpCode, IrType);

impl fmt::Display for DisplayOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = DisplayValue;
        match self.0 {
            OpCode::Add(a, b) => write!(f, "add {} {}, {}", self.1.name(), v(*a), v(*b)),
            OpCode::Sub(a, b) => write!(f, "sub {} {}, {}", self.1.name(), v(*a), v(*b)),
            OpCode::Mul(a, b) => write!(f, "mul {} {}, {}", self.1.name(), v(*a), v(*b)),
            OpCode::SDiv(a, b) => write!(f, "sdiv {} {}, {}", self.1.name(), v(*a), v(*b)),
            OpCode::UDiv(a, b) => write!(f, "udiv {} {}, {}", self.1.name(), v(*a), v(*b)),
            OpCode::FAdd(a, b) => write!(f, "fadd {}, {}", v(*a), v(*b)),
            OpCode::FSub(a, b) => write!(f, "fsub {}, {}", v(*a), v(*b)),
            OpCode::FMul(a, b) => write!(f, "fmul {}, {}", v(*a), v(*b)),
            OpCode::FDiv(a, b) => write!(f, "fdiv {}, {}", v(*a), v(*b)),
            OpCode::ICmp(pred, a, b) => {
                write!(f, "icmp {pred:?} {}, {}", v(*a), v(*b))
            }
            OpCode::FCmp(pred, a, b) => {
                write!(f, "fcmp {pred:?} {}, {}", v(*a), v(*b))
            }
            OpCode::Not(a) => write!(f, "not {}", v(*a)),
            OpCode::ZExt(a) => write!(f, "zext {} to {}", v(*a), self.1.name()),
            OpCode::Trunc(a) => write!(f, "trunc {} to {}", v(*a), self.1.name()),
            OpCode::UiToFp(a) => write!(f, "uitofp {}", v(*a)),
            OpCode::SiToFp(a) => write!(f, "sitofp {}", v(*a)),
            OpCode::FpToUi(a) => write!(f, "fptoui {} to {}", v(*a), self.1.name()),
            OpCode::FpToSi(a) => write!(f, "fptosi {} to {}", v(*a), self.1.name()),
            OpCode::Alloca(ty) => write!(f, "alloca {}", ty.name()),
            OpCode::Load { addr } => write!(f, "load {}, {}", self.1.name(), v(*addr)),
            OpCode::Store { value, addr } => write!(f, "store {}, {}", v(*value), v(*addr)),
            OpCode::Phi { incomings } => {
                write!(f, "phi {} ", self.1.name())?;
                for (i, (value, block)) in incomings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[ {}, bb{} ]", v(*value), block.0)?;
                }
                Ok(())
            }
            OpCode::Call { callee, args } => {
                write!(f, "call {} {}(", self.1.name(), v(*callee))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v(*arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

struct DisplayTerm<'a>(&'a Terminator, &'a Function);

impl fmt::Display for DisplayTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Terminator::Br(target) => write!(f, "br label %{}", self.1.block(*target).label),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br {} , label %{}, label %{}",
                DisplayValue(*cond),
                self.1.block(*then_block).label,
                self.1.block(*else_block).label
            ),
            Terminator::Ret(value) => write!(f, "ret {}", DisplayValue(*value)),
            Terminator::RetVoid => write!(f, "ret void"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_types_know_their_widths() {
        assert_eq!(IrType::I1.bits(), 1);
        assert_eq!(IrType::I8.bits(), 8);
        assert_eq!(IrType::I32.bits(), 32);
        assert!(IrType::I32.is_integer());
        assert!(!IrType::F64.is_integer());
    }

    #[test]
    fn constants_are_const() {
        assert!(Value::ConstInt {
            ty: IrType::I32,
            value: 3
        }
        .is_const());
        assert!(Value::ConstFloat(1.0).is_const());
        assert!(!Value::Arg(0).is_const());
    }

    #[test]
    fn function_lookup_by_name() {
        let mut module = Module::new("m");
        module.functions.push(Function {
            name: "main".into(),
            params: vec![],
            ret: IrType::I32,
            blocks: vec![],
            instrs: vec![],
        });
        assert!(module.function_by_name("main").is_some());
        assert!(module.function_by_name("missing").is_none());
    }

    #[test]
    fn zero_argument_functions_report_no_args() {
        let function = Function {
            name: "f".into(),
            params: vec![],
            ret: IrType::Void,
            blocks: vec![],
            instrs: vec![],
        };
        assert_eq!(function.arg_size(), 0);
    }

    #[test]
    fn type_of_resolves_through_the_function() {
        let function = Function {
            name: "f".into(),
            params: vec![IrType::I32],
            ret: IrType::I32,
            blocks: vec![],
            instrs: vec![Instr {
                op: OpCode::Not(Value::ConstInt {
                    ty: IrType::I1,
                    value: 0,
                }),
                ty: IrType::I1,
                name: String::new(),
            }],
        };
        assert_eq!(function.type_of(Value::Arg(0)), IrType::I32);
        assert_eq!(function.type_of(Value::Instr(InstrId(0))), IrType::I1);
        assert_eq!(function.type_of(Value::Function(FuncId(0))), IrType::Ptr);
    }
}
