//! Driver: hosts the whole pipeline and runs each pass to completion.
//!
//! One [`Driver`] corresponds to one compilation: it owns the interner, the
//! environment, the object table, the type interner and the error log, so
//! several compilations can coexist without any shared state. Each stage
//! either finishes or stops at the first reported error; the caller then
//! reads the accumulated diagnostics from [`Driver::diags`].

use std::fs;
use std::io;
use std::path::Path;

use veld_base::Interner;

use veld_language::ast::Expr;
use veld_language::diag::{BuildInterrupt, Diag, ErrorLog, PassResult};
use veld_language::env::Env;
use veld_language::object::ObjectTable;
use veld_language::types::TypeInterner;
use veld_language::{analyze, filter_tokens, lex, parse, wrap_in_main};

use crate::engine;
use crate::ir::Module;
use crate::irgen;

pub struct Driver {
    file_name: String,
    source: String,
    interner: Interner,
    log: ErrorLog,
    env: Env,
    objects: ObjectTable,
    types: TypeInterner,
}

impl Driver {
    pub fn new(source: impl Into<String>) -> Self {
        Driver::with_file_name(source, "<memory>")
    }

    pub fn with_file_name(source: impl Into<String>, file_name: impl Into<String>) -> Self {
        Driver {
            file_name: file_name.into(),
            source: source.into(),
            interner: Interner::new(),
            log: ErrorLog::new(),
            env: Env::new(),
            objects: ObjectTable::new(),
            types: TypeInterner::new(),
        }
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Driver::with_file_name(source, path.display().to_string()))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn diags(&self) -> &[Diag] {
        self.log.diags()
    }

    pub fn log_mut(&mut self) -> &mut ErrorLog {
        &mut self.log
    }

    /// Lexes, filters and parses the source, wrapping the program into the
    /// implicit `main`.
    pub fn scan_and_parse(&mut self) -> PassResult<Expr> {
        let tokens = lex(&self.source, &mut self.interner, &mut self.log)?;
        let tokens = filter_tokens(tokens);
        let ast = parse(&tokens, &mut self.log)?;
        Ok(wrap_in_main(ast, &mut self.interner))
    }

    /// Runs the three semantic passes over `ast`.
    pub fn analyze(&mut self, ast: &mut Expr) -> PassResult<()> {
        analyze(
            ast,
            &mut self.env,
            &mut self.objects,
            &mut self.types,
            &self.interner,
            &mut self.log,
        )
    }

    /// Lowers the analyzed AST to a verified module.
    pub fn generate_ir(&mut self, ast: &Expr) -> PassResult<Module> {
        irgen::generate(ast, &self.objects, &self.types, &self.interner)
    }

    /// The full front half: source text to verified module.
    pub fn compile(&mut self) -> PassResult<Module> {
        let mut ast = self.scan_and_parse()?;
        self.analyze(&mut ast)?;
        self.generate_ir(&ast)
    }

    /// Compiles and executes `main`; the result is the process exit code.
    pub fn jit_exec_main(&mut self) -> PassResult<i32> {
        let module = self.compile()?;
        engine::run_main(&module)
            .map_err(|error| BuildInterrupt::Internal(error.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_language::diag::ErrorKind;

    fn run(source: &str) -> PassResult<i32> {
        Driver::new(source).jit_exec_main()
    }

    fn first_error(source: &str) -> ErrorKind {
        let mut driver = Driver::new(source);
        let result = driver.jit_exec_main();
        assert!(result.is_err(), "expected failure for {source:?}");
        driver
            .diags()
            .first()
            .map(|d| d.kind)
            .expect("an error was recorded")
    }

    #[test]
    fn a_literal_is_the_exit_code() {
        assert_eq!(run("42"), Ok(42));
    }

    #[test]
    fn addition_executes() {
        assert_eq!(run("42 + 77"), Ok(119));
    }

    #[test]
    fn both_if_branches_are_reachable() {
        assert_eq!(run("if true: 2 else 3 $"), Ok(2));
        assert_eq!(run("if false: 2 else 3 $"), Ok(3));
    }

    #[test]
    fn mutable_data_round_trips_through_memory() {
        assert_eq!(run("val foo :mut int = 42; foo = 77; foo"), Ok(77));
    }

    #[test]
    fn recursion_computes_the_factorial() {
        assert_eq!(
            run("fun fact: (x:int) int = if x==0: 1 else x*fact(x-1) $; fact(5)"),
            Ok(120)
        );
    }

    #[test]
    fn while_loops_terminate_on_their_condition() {
        assert_eq!(run("val x :mut int = 0; while x<3: x = x+1 $; x"), Ok(3));
    }

    #[test]
    fn error_scenarios_report_their_kind() {
        assert_eq!(first_error("42 = 77"), ErrorKind::WriteToImmutable);
        assert_eq!(first_error("val x :int = true"), ErrorKind::NoImplicitConversion);
        assert_eq!(first_error("return 0"), ErrorKind::NotInFunBodyContext);
        assert_eq!(first_error("x"), ErrorKind::UnknownName);
        assert_eq!(
            first_error("val x :int = 1; val x :int = 2"),
            ErrorKind::Redefinition
        );
    }

    #[test]
    fn compile_produces_a_verified_module() {
        let mut driver = Driver::new("42");
        let module = driver.compile().expect("compiles");
        assert!(crate::ir::verify::verify(&module).is_ok());
        assert!(module.function_by_name("main").is_some());
    }

    #[test]
    fn drivers_are_independent() {
        let mut a = Driver::new("1");
        let mut b = Driver::new("2");
        assert_eq!(a.jit_exec_main(), Ok(1));
        assert_eq!(b.jit_exec_main(), Ok(2));
    }

    fn main_block_labels(source: &str) -> Vec<String> {
        let mut driver = Driver::new(source);
        let module = driver.compile().expect("compiles");
        let (_, main) = module.function_by_name("main").expect("main exists");
        main.blocks.iter().map(|b| b.label.clone()).collect()
    }

    #[test]
    fn an_if_lowers_to_the_diamond_shape() {
        let labels = main_block_labels("if true: 2 else 3 $");
        assert!(labels.iter().any(|l| l.starts_with("if_then")));
        assert!(labels.iter().any(|l| l.starts_with("if_else")));
        assert!(labels.iter().any(|l| l.starts_with("if_merge")));
    }

    #[test]
    fn a_loop_lowers_to_condition_body_and_continuation() {
        let labels = main_block_labels("val x :mut int = 0; while x<3: x = x+1 $; x");
        assert!(labels.iter().any(|l| l.starts_with("loop_cond")));
        assert!(labels.iter().any(|l| l.starts_with("loop_body")));
        assert!(labels.iter().any(|l| l.starts_with("after_loop")));
    }

    #[test]
    fn short_circuit_lowers_to_an_rhs_bypass_with_a_phi() {
        let mut driver = Driver::new("val b :bool = true && false; 0");
        let module = driver.compile().expect("compiles");
        let (_, main) = module.function_by_name("main").expect("main exists");
        assert!(main.blocks.iter().any(|b| b.label.starts_with("and_rhs")));
        assert!(main.blocks.iter().any(|b| b.label.starts_with("and_merge")));
        assert!(main
            .instrs
            .iter()
            .any(|i| matches!(i.op, crate::ir::OpCode::Phi { .. })));
    }

    #[test]
    fn memory_resident_objects_alloca_in_the_entry_block() {
        let mut driver = Driver::new("val x :mut int = 0; x = 1; x");
        let module = driver.compile().expect("compiles");
        let (_, main) = module.function_by_name("main").expect("main exists");
        let entry = main.block(crate::ir::BlockId(0));
        assert!(entry
            .instrs
            .iter()
            .any(|&id| matches!(main.instr(id).op, crate::ir::OpCode::Alloca(_))));
    }

    #[test]
    fn untouched_locals_never_touch_memory() {
        let mut driver = Driver::new("val x :int = 1; x + 1");
        let module = driver.compile().expect("compiles");
        let (_, main) = module.function_by_name("main").expect("main exists");
        assert!(!main
            .instrs
            .iter()
            .any(|i| matches!(i.op, crate::ir::OpCode::Alloca(_))));
    }
}
