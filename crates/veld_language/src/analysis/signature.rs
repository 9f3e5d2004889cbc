//! Pass 2: resolve declared types and type every definition's object.
//!
//! Walks the AST again, re-entering the scopes built by pass 1. Every
//! [`TypeExpr`] subtree is resolved to a canonical [`ObjTypeId`] — named
//! types are looked up in the environment, class definitions are interned
//! and their names bound — and the objects created by pass 1 receive their
//! types: data definitions get their declared type (possibly still `infer`,
//! which the semantic analyzer later replaces from the initializer), and
//! function definitions get their full function type so that forward calls
//! resolve against a complete signature.

use veld_base::Interner;

use crate::ast::{DataDef, Expr, ExprKind, FunDef, TypeExpr, TypeExprKind, TypeName};
use crate::diag::{BuildInterrupt, ErrorKind, ErrorLog, PassResult};
use crate::env::{Entity, Env};
use crate::object::ObjectTable;
use crate::types::{ObjTypeId, TypeInterner};

pub struct SignatureAugmentor<'a> {
    env: &'a mut Env,
    objects: &'a mut ObjectTable,
    types: &'a mut TypeInterner,
    names: &'a Interner,
    log: &'a mut ErrorLog,
}

impl<'a> SignatureAugmentor<'a> {
    pub fn new(
        env: &'a mut Env,
        objects: &'a mut ObjectTable,
        types: &'a mut TypeInterner,
        names: &'a Interner,
        log: &'a mut ErrorLog,
    ) -> Self {
        SignatureAugmentor {
            env,
            objects,
            types,
            names,
            log,
        }
    }

    pub fn run(&mut self, root: &mut Expr) -> PassResult<()> {
        self.visit(root)
    }

    fn visit(&mut self, expr: &mut Expr) -> PassResult<()> {
        match &mut expr.kind {
            ExprKind::Nop | ExprKind::Symbol { .. } => Ok(()),
            ExprKind::Number { ty, .. } => {
                // taking `ty` apart here avoids a second mutable borrow below
                let _ = Self::resolve_type_in(
                    self.env, self.types, self.names, self.log, ty,
                )?;
                Ok(())
            }
            ExprKind::Cast { ty, arg } => {
                Self::resolve_type_in(self.env, self.types, self.names, self.log, ty)?;
                self.visit(arg)
            }
            ExprKind::Operator { args, .. } | ExprKind::Seq { operands: args } => {
                for arg in args {
                    self.visit(arg)?;
                }
                Ok(())
            }
            ExprKind::Block { body, scope } => {
                let scope = scope.expect("pass 1 created the block scope");
                self.env.enter(scope);
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
        let ty = Self::resolve_type_in(
            self.env,
            self.types,
            self.names,
            self.log,
            &mut def.declared_ty,
        )?;
        let object = def.object.expect("pass 1 allocated the object");
        self.objects.get_mut(object).obj_type = Some(ty);
        for arg in &mut def.ctor_args {
            self.visit(arg)?;
        }
        Ok(())
    }

    fn visit_fun_def(&mut self, def: &mut FunDef) -> PassResult<()> {
        let scope = def.scope.expect("pass 1 created the function scope");
        self.env.enter(scope);

        let mut result = Ok(());
        let mut param_types = Vec::with_capacity(def.params.len());
        for param in &mut def.params {
            match Self::resolve_type_in(
                self.env,
                self.types,
                self.names,
                self.log,
                &mut param.declared_ty,
            ) {
                Ok(ty) => {
                    param_types.push(ty);
                    let object = param.object.expect("pass 1 allocated the parameter");
                    self.objects.get_mut(object).obj_type = Some(ty);
                }
                Err(interrupt) => {
                    result = Err(interrupt);
                    break;
                }
            }
        }
        let ret = if result.is_ok() {
            match Self::resolve_type_in(
                self.env,
                self.types,
                self.names,
                self.log,
                &mut def.ret_ty,
            ) {
                Ok(ret) => Some(ret),
                Err(interrupt) => {
                    result = Err(interrupt);
                    None
                }
            }
        } else {
            None
        };
        if result.is_ok() {
            result = self.visit(&mut def.body);
        }
        self.env.leave();
        result?;

        let ret = ret.expect("return type resolved above");
        let fun_type = self.types.fun(param_types, ret);
        let object = def.object.expect("pass 1 allocated the object");
        self.objects.get_mut(object).obj_type = Some(fun_type);
        Ok(())
    }

    /// Resolves a type-denoting subtree to its canonical type, memoized in
    /// the node's `resolved` annotation.
    fn resolve_type_in(
        env: &mut Env,
        types: &mut TypeInterner,
        names: &Interner,
        log: &mut ErrorLog,
        ty: &mut TypeExpr,
    ) -> PassResult<ObjTypeId> {
        if let Some(resolved) = ty.resolved {
            return Ok(resolved);
        }
        let resolved = match &mut ty.kind {
            TypeExprKind::Symbol(TypeName::Funda(funda)) => types.funda(*funda),
            TypeExprKind::Symbol(TypeName::Named(name)) => match env.find(*name) {
                Some(Entity::Type(id)) => id,
                _ => {
                    log.report(
                        ErrorKind::UnknownName,
                        Some(ty.span),
                        format!("`{}` does not name a type", names.resolve(*name)),
                    )?;
                    return Err(BuildInterrupt::Errors);
                }
            },
            TypeExprKind::Quali { quals, target } => {
                let target = Self::resolve_type_in(env, types, names, log, target)?;
                types.qualified(*quals, target)
            }
            TypeExprKind::Ptr { pointee } => {
                let pointee = Self::resolve_type_in(env, types, names, log, pointee)?;
                types.ptr_to(pointee)
            }
            TypeExprKind::ClassDef { name, members } => {
                let mut member_types = Vec::with_capacity(members.len());
                for member in members.iter_mut() {
                    member_types.push(Self::resolve_type_in(
                        env,
                        types,
                        names,
                        log,
                        &mut member.declared_ty,
                    )?);
                }
                let id = types.class(*name, member_types);
                if env.insert(*name, Entity::Type(id)).is_err() {
                    log.report(
                        ErrorKind::Redefinition,
                        Some(ty.span),
                        format!("type `{}` is already defined", names.resolve(*name)),
                    )?;
                }
                id
            }
        };
        ty.resolved = Some(resolved);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EnvInserter;
    use crate::filter::filter_tokens;
    use crate::lexer::lex;
    use crate::object::ObjectId;
    use crate::parser::parse;
    use crate::types::{FundaType, ObjType, Qualifiers};

    struct Augmented {
        ast: Expr,
        objects: ObjectTable,
        types: TypeInterner,
    }

    fn augment(source: &str) -> Augmented {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = filter_tokens(lex(source, &mut interner, &mut log).expect("lexes"));
        let mut ast = parse(&tokens, &mut log).expect("parses");
        let mut env = Env::new();
        let mut objects = ObjectTable::new();
        let mut types = TypeInterner::new();
        EnvInserter::new(&mut env, &mut objects, &interner, &mut log)
            .run(&mut ast)
            .expect("pass 1 succeeds");
        SignatureAugmentor::new(&mut env, &mut objects, &mut types, &interner, &mut log)
            .run(&mut ast)
            .expect("pass 2 succeeds");
        Augmented { ast, objects, types }
    }

    fn first_def_object(ast: &Expr) -> ObjectId {
        match &ast.kind {
            ExprKind::DataDef(def) => def.object.expect("object set"),
            ExprKind::FunDef(def) => def.object.expect("object set"),
            ExprKind::Seq { operands } => first_def_object(&operands[0]),
            _ => panic!("expected a definition"),
        }
    }

    #[test]
    fn data_definitions_receive_their_declared_type() {
        let augmented = augment("val x :int = 1");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        assert_eq!(ty, augmented.types.funda(FundaType::Int));
    }

    #[test]
    fn mut_qualifier_lands_in_the_object_type() {
        let augmented = augment("val x :mut int = 1");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        assert!(augmented.types.qualifiers(ty).is_mut());
    }

    #[test]
    fn omitted_type_stays_infer_until_semantic_analysis() {
        let augmented = augment("val x = 1");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        assert!(augmented.types.is_infer(ty));
    }

    #[test]
    fn functions_get_their_full_signature() {
        let augmented = augment("fun f: (a:int, b:bool) double = 1.0 $");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        match augmented.types.get(ty) {
            ObjType::Fun { params, ret } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[0], augmented.types.funda(FundaType::Int));
                assert_eq!(params[1], augmented.types.funda(FundaType::Bool));
                assert_eq!(*ret, augmented.types.funda(FundaType::Double));
            }
            other => panic!("expected a function type, got {other:?}"),
        }
    }

    #[test]
    fn parameter_qualifiers_survive_into_the_signature() {
        let augmented = augment("fun f: (a:mut int) int = a $");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        match augmented.types.get(ty) {
            ObjType::Fun { params, .. } => {
                assert_eq!(augmented.types.qualifiers(params[0]), Qualifiers::MUT);
            }
            other => panic!("expected a function type, got {other:?}"),
        }
    }

    #[test]
    fn class_definitions_intern_their_type_and_bind_their_name() {
        use crate::ast::{TypeExpr, TypeExprKind};
        use crate::env::Entity;
        use veld_base::Span;

        let mut interner = Interner::new();
        let point = interner.intern("Point");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let member = |name| DataDef {
            name,
            declared_ty: TypeExpr::funda(FundaType::Double, Span::default()),
            storage: crate::object::StorageDuration::Member,
            ctor_args: Vec::new(),
            do_not_init: false,
            span: Span::default(),
            object: None,
        };
        let mut class_ty = TypeExpr::new(
            TypeExprKind::ClassDef {
                name: point,
                members: vec![member(x), member(y)],
            },
            Span::default(),
        );

        let mut env = Env::new();
        let mut types = TypeInterner::new();
        let mut log = ErrorLog::new();
        let id = SignatureAugmentor::resolve_type_in(
            &mut env,
            &mut types,
            &interner,
            &mut log,
            &mut class_ty,
        )
        .expect("class resolves");

        match types.get(id) {
            ObjType::Class { name, members } => {
                assert_eq!(*name, point);
                assert_eq!(members.len(), 2);
            }
            other => panic!("expected a class type, got {other:?}"),
        }
        assert_eq!(types.size_bits(id), Some(128));
        assert_eq!(env.find(point), Some(Entity::Type(id)));
    }

    #[test]
    fn pointer_types_resolve_through_all_levels() {
        let augmented = augment("val p : *mut int $");
        let object = first_def_object(&augmented.ast);
        let ty = augmented.objects.get(object).obj_type.expect("typed");
        match augmented.types.get(ty) {
            ObjType::Ptr { pointee } => {
                assert!(augmented.types.qualifiers(*pointee).is_mut());
            }
            other => panic!("expected a pointer type, got {other:?}"),
        }
    }
}
