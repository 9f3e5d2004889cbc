//! Pass 1: populate the environment with the names of all definitions.
//!
//! Walks the AST pre-order. Every `fun` and `val`/`var` definition gets a
//! fresh, still untyped [`Object`] bound under its name in the current
//! scope; blocks and function bodies open child scopes which the AST nodes
//! remember for the later passes. Only names and storage durations are known
//! here — full types arrive with the signature augmentor.

use veld_base::Interner;

use crate::ast::{DataDef, Expr, ExprKind, FunDef};
use crate::diag::{ErrorKind, ErrorLog, PassResult};
use crate::env::{Entity, Env};
use crate::object::{Object, ObjectTable, StorageDuration};

pub struct EnvInserter<'a> {
    env: &'a mut Env,
    objects: &'a mut ObjectTable,
    names: &'a Interner,
    log: &'a mut ErrorLog,
}

impl<'a> EnvInserter<'a> {
    pub fn new(
        env: &'a mut Env,
        objects: &'a mut ObjectTable,
        names: &'a Interner,
        log: &'a mut ErrorLog,
    ) -> Self {
        EnvInserter {
            env,
            objects,
            names,
            log,
        }
    }

    pub fn run(&mut self, root: &mut Expr) -> PassResult<()> {
        self.visit(root)
    }

    fn visit(&mut self, expr: &mut Expr) -> PassResult<()> {
        match &mut expr.kind {
            ExprKind::Nop | ExprKind::Number { .. } | ExprKind::Symbol { .. } => Ok(()),
            ExprKind::Cast { arg, .. } => self.visit(arg),
            ExprKind::Operator { args, .. } | ExprKind::Seq { operands: args } => {
                for arg in args {
                    self.visit(arg)?;
                }
                Ok(())
            }
            ExprKind::Block { body, scope } => {
                *scope = Some(self.env.create_child());
                let result = self.visit(body);
                self.env.leave();
                result
            }
            ExprKind::If { cond, then, els } => {
                self.visit(cond)?;
                self.visit(then)?;
                if let Some(els) = els {
                    self.visit(els)?;
                }
                Ok(())
            }
            ExprKind::Loop { cond, body } => {
                self.visit(cond)?;
                self.visit(body)
            }
            ExprKind::Return { value } => self.visit(value),
            ExprKind::Call { callee, args } => {
                self.visit(callee)?;
                for arg in args {
                    self.visit(arg)?;
                }
                Ok(())
            }
            ExprKind::DataDef(def) => self.visit_data_def(def),
            ExprKind::FunDef(def) => self.visit_fun_def(def),
        }
    }

    fn visit_data_def(&mut self, def: &mut DataDef) -> PassResult<()> {
        let object = self.objects.alloc(Object::new(None, def.storage));
        def.object = Some(object);
        if self.env.insert(def.name, Entity::Object(object)).is_err() {
            self.log.report(
                ErrorKind::Redefinition,
                Some(def.span),
                format!("`{}` is already defined in this scope", self.names.resolve(def.name)),
            )?;
        }
        for arg in &mut def.ctor_args {
            self.visit(arg)?;
        }
        Ok(())
    }

    fn visit_fun_def(&mut self, def: &mut FunDef) -> PassResult<()> {
        // functions have whole-program lifetime
        let object = self.objects.alloc(Object::new(None, StorageDuration::Static));
        def.object = Some(object);
        if self.env.insert(def.name, Entity::Object(object)).is_err() {
            self.log.report(
                ErrorKind::Redefinition,
                Some(def.span),
                format!("`{}` is already defined in this scope", self.names.resolve(def.name)),
            )?;
        }

        def.scope = Some(self.env.create_child());
        let mut result = Ok(());
        for param in &mut def.params {
            let param_object = self.objects.alloc(Object::new(None, param.storage));
            param.object = Some(param_object);
            if self.env.insert(param.name, Entity::Object(param_object)).is_err() {
                result = self.log.report(
                    ErrorKind::SameArgWasDefinedMultipleTimes,
                    Some(param.span),
                    format!(
                        "parameter `{}` is declared twice",
                        self.names.resolve(param.name)
                    ),
                );
            }
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            result = self.visit(&mut def.body);
        }
        self.env.leave();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_tokens;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn insert(source: &str) -> (Result<(), crate::diag::BuildInterrupt>, ErrorLog) {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = filter_tokens(lex(source, &mut interner, &mut log).expect("lexes"));
        let mut ast = parse(&tokens, &mut log).expect("parses");
        let mut env = Env::new();
        let mut objects = ObjectTable::new();
        let result = EnvInserter::new(&mut env, &mut objects, &interner, &mut log).run(&mut ast);
        (result, log)
    }

    #[test]
    fn definitions_get_objects_and_names() {
        let (result, log) = insert("val x :int = 1; fun f: () int = 2 $");
        assert!(result.is_ok());
        assert!(!log.has_errors());
    }

    #[test]
    fn same_name_twice_in_one_scope_is_a_redefinition() {
        let (result, log) = insert("val x :int = 1; val x :int = 2");
        assert!(result.is_err());
        assert_eq!(log.first_kind(), Some(ErrorKind::Redefinition));
    }

    #[test]
    fn the_same_name_in_a_nested_function_scope_is_fine() {
        let (result, log) = insert("val x :int = 1; fun f: (x:int) int = x $");
        assert!(result.is_ok(), "{:?}", log.diags());
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let (result, log) = insert("fun f: (a:int, a:int) int = 1 $");
        assert!(result.is_err());
        assert_eq!(
            log.first_kind(),
            Some(ErrorKind::SameArgWasDefinedMultipleTimes)
        );
    }

    #[test]
    fn a_function_and_a_value_may_not_share_a_name() {
        let (result, log) = insert("fun f: () int = 1 $; val f :int = 2");
        assert!(result.is_err());
        assert_eq!(log.first_kind(), Some(ErrorKind::Redefinition));
    }
}
