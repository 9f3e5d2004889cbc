//! Pass 3: semantic analysis.
//!
//! One top-down traversal with three duties at every node, in order:
//!
//! 1. **Access propagation** — the parent stamps each child with the access
//!    it imposes (read, write, take-address, ignore) before descending.
//! 2. **Checks** — type agreement, mutability, initialization order,
//!    reachability; the first violation aborts the pass.
//! 3. **Object association** — the node's denoted [`Object`] is created or
//!    shared, its accumulated access updated.
//!
//! After a successful run every expression has a non-`Undefined` access and
//! an object whose type is never `infer`.

use veld_base::{Interner, Span};

use crate::ast::{Expr, ExprKind, Op, OpClass, TypeExpr};
use crate::diag::{BuildInterrupt, ErrorKind, ErrorLog, PassResult};
use crate::env::{Entity, Env};
use crate::object::{Access, Object, ObjectTable, StorageDuration};
use crate::types::{FundaType, MatchKind, ObjType, ObjTypeId, TypeInterner};

pub struct SemanticAnalyzer<'a> {
    env: &'a mut Env,
    objects: &'a mut ObjectTable,
    types: &'a mut TypeInterner,
    names: &'a Interner,
    log: &'a mut ErrorLog,
    /// Return types of the lexically enclosing function bodies; `return`
    /// checks against the innermost entry.
    fun_ret_types: Vec<ObjTypeId>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(
        env: &'a mut Env,
        objects: &'a mut ObjectTable,
        types: &'a mut TypeInterner,
        names: &'a Interner,
        log: &'a mut ErrorLog,
    ) -> Self {
        SemanticAnalyzer {
            env,
            objects,
            types,
            names,
            log,
            fun_ret_types: Vec::new(),
        }
    }

    pub fn run(&mut self, root: &mut Expr) -> PassResult<()> {
        self.set_access_and_visit(root, Access::Ignore)
    }

    /// The two steps belong together: a node may only be visited after its
    /// parent stamped the access.
    fn set_access_and_visit(&mut self, expr: &mut Expr, access: Access) -> PassResult<()> {
        expr.access = access;
        self.visit(expr)
    }

    fn visit(&mut self, expr: &mut Expr) -> PassResult<()> {
        debug_assert!(expr.access != Access::Undefined);
        match &expr.kind {
            ExprKind::Nop => self.visit_nop(expr),
            ExprKind::Number { .. } => self.visit_number(expr),
            ExprKind::Symbol { .. } => self.visit_symbol(expr),
            ExprKind::Cast { .. } => self.visit_cast(expr),
            ExprKind::Operator { .. } => self.visit_operator(expr),
            ExprKind::Seq { .. } => self.visit_seq(expr),
            ExprKind::Block { .. } => self.visit_block(expr),
            ExprKind::If { .. } => self.visit_if(expr),
            ExprKind::Loop { .. } => self.visit_loop(expr),
            ExprKind::Return { .. } => self.visit_return(expr),
            ExprKind::Call { .. } => self.visit_call(expr),
            ExprKind::DataDef(_) => self.visit_data_def(expr),
            ExprKind::FunDef(_) => self.visit_fun_def(expr),
        }?;
        debug_assert!(expr.object.is_some(), "analysis must associate an object");
        Ok(())
    }

    // ---- helpers ----------------------------------------------------------

    fn denoted_type(&self, expr: &Expr) -> ObjTypeId {
        let object = expr.object.expect("child was analyzed before its type is read");
        self.objects
            .get(object)
            .obj_type
            .expect("analyzed object is typed")
    }

    fn is_noreturn(&self, expr: &Expr) -> bool {
        self.types.is_noreturn(self.denoted_type(expr))
    }

    /// Creates the node's temporary object and folds in the node's access.
    fn associate_local(&mut self, expr: &mut Expr, ty: ObjTypeId) {
        self.associate(expr, ty, StorageDuration::Local);
    }

    fn associate(&mut self, expr: &mut Expr, ty: ObjTypeId, storage: StorageDuration) {
        let object = self.objects.alloc(Object::new(Some(ty), storage));
        self.objects.get_mut(object).add_access(expr.access);
        expr.object = Some(object);
    }

    // ---- nodes ------------------------------------------------------------

    fn visit_nop(&mut self, expr: &mut Expr) -> PassResult<()> {
        let void = self.types.funda(FundaType::Void);
        self.associate_local(expr, void);
        Ok(())
    }

    fn visit_number(&mut self, expr: &mut Expr) -> PassResult<()> {
        let ty = match &expr.kind {
            ExprKind::Number { ty, .. } => resolved(ty),
            _ => unreachable!(),
        };
        self.associate_local(expr, ty);
        Ok(())
    }

    fn visit_symbol(&mut self, expr: &mut Expr) -> PassResult<()> {
        let name = match &expr.kind {
            ExprKind::Symbol { name } => *name,
            _ => unreachable!(),
        };
        let object = match self.env.find(name) {
            Some(Entity::Object(object)) => object,
            _ => {
                self.log.report(
                    ErrorKind::UnknownName,
                    Some(expr.span),
                    format!("no binding for `{}`", self.names.resolve(name)),
                )?;
                // without a binding there is nothing to continue with
                return Err(BuildInterrupt::Errors);
            }
        };

        // the node's own access matters here, not the object's accumulated
        // one: an ignored mention of an uninitialized object is harmless
        let obj = self.objects.get(object);
        if obj.storage == StorageDuration::Local
            && !obj.is_initialized
            && expr.access != Access::Ignore
        {
            self.log.report(
                ErrorKind::NonIgnoreAccessToLocalDataObjectBeforeItsInitialization,
                Some(expr.span),
                format!(
                    "`{}` is used before its definition is reached",
                    self.names.resolve(name)
                ),
            )?;
        }

        self.objects.get_mut(object).add_access(expr.access);
        expr.object = Some(object);
        Ok(())
    }

    fn visit_cast(&mut self, expr: &mut Expr) -> PassResult<()> {
        let dst = match &mut expr.kind {
            ExprKind::Cast { ty, arg } => {
                let dst = resolved(ty);
                self.set_access_and_visit(arg, Access::Read)?;
                dst
            }
            _ => unreachable!(),
        };

        let arg = match &expr.kind {
            ExprKind::Cast { arg, .. } => arg,
            _ => unreachable!(),
        };
        let src = self.denoted_type(arg);
        if !self.types.matches_sauf_qualifiers(src, dst) && !self.types.has_constructor(dst, src)
        {
            self.log.report(
                ErrorKind::NoSuchMember,
                Some(expr.span),
                format!(
                    "no conversion from `{}` to `{}`",
                    self.types.display(src, self.names),
                    self.types.display(dst, self.names)
                ),
            )?;
        }

        self.associate_local(expr, dst);
        Ok(())
    }

    fn visit_operator(&mut self, expr: &mut Expr) -> PassResult<()> {
        let (op, span) = match &expr.kind {
            ExprKind::Operator { op, .. } => (*op, expr.span),
            _ => unreachable!(),
        };
        let class = op.class();

        // access to the children: an assignment writes its lhs, address-of
        // reveals its operand, everything else reads
        if let ExprKind::Operator { args, .. } = &mut expr.kind {
            for (index, arg) in args.iter_mut().enumerate() {
                let access = if class == OpClass::Assignment && index == 0 {
                    Access::Write
                } else if op == Op::AddrOf {
                    Access::TakeAddress
                } else {
                    Access::Read
                };
                self.set_access_and_visit(arg, access)?;
            }
        }

        // checks
        let args = operator_args(expr);
        if args.len() == 2 {
            let lhs = self.denoted_type(&args[0]);
            let rhs = self.denoted_type(&args[1]);
            let rhs_may_diverge =
                op.is_binary_logical_short_circuit() && self.types.is_noreturn(rhs);
            if class != OpClass::Other
                && !self.types.matches_sauf_qualifiers(lhs, rhs)
                && !rhs_may_diverge
            {
                self.log.report(
                    ErrorKind::NoImplicitConversion,
                    Some(span),
                    format!(
                        "operands of `{}` differ: `{}` vs `{}`",
                        op.symbol(),
                        self.types.display(lhs, self.names),
                        self.types.display(rhs, self.names)
                    ),
                )?;
            }
        }
        let first = self.denoted_type(&args[0]);
        if class == OpClass::Assignment && !self.types.qualifiers(first).is_mut() {
            self.log.report(
                ErrorKind::WriteToImmutable,
                Some(span),
                format!(
                    "cannot assign to a value of type `{}`",
                    self.types.display(first, self.names)
                ),
            )?;
        }
        if !self.types.has_member(first, op) {
            self.log.report(
                ErrorKind::NoSuchMember,
                Some(span),
                format!(
                    "type `{}` has no operator `{}`",
                    self.types.display(first, self.names),
                    op.symbol()
                ),
            )?;
        }

        // associated object
        match op {
            Op::RefAssign => {
                // the lvalue-assignment denotes the lhs object itself
                let lhs_object = operator_args(expr)[0].object.expect("lhs analyzed");
                self.objects.get_mut(lhs_object).add_access(expr.access);
                expr.object = Some(lhs_object);
            }
            Op::Assign => {
                let void = self.types.funda(FundaType::Void);
                self.associate_local(expr, void);
            }
            Op::AddrOf => {
                let pointee = self.denoted_type(&operator_args(expr)[0]);
                let ptr = self.types.ptr_to(pointee);
                self.associate_local(expr, ptr);
            }
            Op::Deref => {
                let operand = self.denoted_type(&operator_args(expr)[0]);
                let pointee = match self.types.get(self.types.unqualified(operand)) {
                    ObjType::Ptr { pointee } => *pointee,
                    // only reachable when eNoSuchMember was masked above
                    _ => return Err(BuildInterrupt::Errors),
                };
                // the new object stands for the derefee, whose address is
                // evidently known
                self.associate(expr, pointee, StorageDuration::Unknown);
                let object = expr.object.expect("just associated");
                self.objects.get_mut(object).add_access(Access::TakeAddress);
            }
            _ if class == OpClass::Comparison => {
                let boolean = self.types.funda(FundaType::Bool);
                self.associate_local(expr, boolean);
            }
            _ => {
                // both operands agree, so either one's unqualified type is
                // the result type; the lhs survives a diverging rhs
                let first = self.denoted_type(&operator_args(expr)[0]);
                let ty = self.types.unqualified(first);
                self.associate_local(expr, ty);
            }
        }
        Ok(())
    }

    fn visit_seq(&mut self, expr: &mut Expr) -> PassResult<()> {
        let access = expr.access;
        let span = expr.span;
        let count = match &expr.kind {
            ExprKind::Seq { operands } => operands.len(),
            _ => unreachable!(),
        };
        debug_assert!(count > 0, "the parser never builds an empty sequence");

        for index in 0..count {
            let last = index + 1 == count;
            let operand_access = if last { access } else { Access::Ignore };
            if let ExprKind::Seq { operands } = &mut expr.kind {
                self.set_access_and_visit(&mut operands[index], operand_access)?;
            }
            let operand = match &expr.kind {
                ExprKind::Seq { operands } => &operands[index],
                _ => unreachable!(),
            };
            if last {
                // the sequence denotes the very object of its last operand
                let object = operand.object.expect("operand analyzed");
                self.objects.get_mut(object).add_access(access);
                expr.object = Some(object);
            } else if self.is_noreturn(operand) {
                self.log.report(
                    ErrorKind::UnreachableCode,
                    Some(span),
                    "code after an expression of type noreturn never runs",
                )?;
            } else if is_discarded_pure_value(operand) {
                self.log.report(
                    ErrorKind::ComputedValueNotUsed,
                    Some(operand.span),
                    "this value is computed but never used",
                )?;
            }
        }
        Ok(())
    }

    fn visit_block(&mut self, expr: &mut Expr) -> PassResult<()> {
        let scope = match &expr.kind {
            ExprKind::Block { scope, .. } => scope.expect("pass 1 created the scope"),
            _ => unreachable!(),
        };
        self.env.enter(scope);
        let result = match &mut expr.kind {
            ExprKind::Block { body, .. } => self.set_access_and_visit(body, Access::Read),
            _ => unreachable!(),
        };
        self.env.leave();
        result?;

        // a block's value is a temporary: the body's type, made immutable
        let body_ty = match &expr.kind {
            ExprKind::Block { body, .. } => self.denoted_type(body),
            _ => unreachable!(),
        };
        let ty = self.types.unqualified(body_ty);
        self.associate_local(expr, ty);
        Ok(())
    }

    fn visit_if(&mut self, expr: &mut Expr) -> PassResult<()> {
        let access = expr.access;
        let span = expr.span;
        if let ExprKind::If { cond, then, els } = &mut expr.kind {
            // the clauses inherit the if's own access; the condition is only
            // ever read
            self.set_access_and_visit(cond, Access::Read)?;
            self.set_access_and_visit(then, access)?;
            if let Some(els) = els {
                self.set_access_and_visit(els, access)?;
            }
        }

        let (cond, then, els) = match &expr.kind {
            ExprKind::If { cond, then, els } => (cond, then, els.as_deref()),
            _ => unreachable!(),
        };
        let boolean = self.types.funda(FundaType::Bool);
        let cond_ty = self.denoted_type(cond);
        if !self.types.matches_sauf_qualifiers(cond_ty, boolean) {
            self.log.report(
                ErrorKind::NoImplicitConversion,
                Some(cond.span),
                format!(
                    "if condition must be bool, found `{}`",
                    self.types.display(cond_ty, self.names)
                ),
            )?;
        }

        let then_ty = self.denoted_type(then);
        let then_diverges = self.types.is_noreturn(then_ty);
        let ty = if let Some(els) = els {
            let els_ty = self.denoted_type(els);
            if !self.types.matches_sauf_qualifiers(then_ty, els_ty)
                && !then_diverges
                && !self.types.is_noreturn(els_ty)
            {
                self.log.report(
                    ErrorKind::NoImplicitConversion,
                    Some(span),
                    format!(
                        "if branches differ: `{}` vs `{}`",
                        self.types.display(then_ty, self.names),
                        self.types.display(els_ty, self.names)
                    ),
                )?;
            }
            if then_diverges {
                self.types.unqualified(els_ty)
            } else {
                self.types.unqualified(then_ty)
            }
        } else {
            self.types.funda(FundaType::Void)
        };
        self.associate_local(expr, ty);
        Ok(())
    }

    fn visit_loop(&mut self, expr: &mut Expr) -> PassResult<()> {
        if let ExprKind::Loop { cond, body } = &mut expr.kind {
            self.set_access_and_visit(cond, Access::Read)?;
            self.set_access_and_visit(body, Access::Ignore)?;
        }

        let cond = match &expr.kind {
            ExprKind::Loop { cond, .. } => cond,
            _ => unreachable!(),
        };
        let boolean = self.types.funda(FundaType::Bool);
        let cond_ty = self.denoted_type(cond);
        if !self.types.matches_sauf_qualifiers(cond_ty, boolean) {
            self.log.report(
                ErrorKind::NoImplicitConversion,
                Some(cond.span),
                format!(
                    "loop condition must be bool, found `{}`",
                    self.types.display(cond_ty, self.names)
                ),
            )?;
        }

        let void = self.types.funda(FundaType::Void);
        self.associate_local(expr, void);
        Ok(())
    }

    fn visit_return(&mut self, expr: &mut Expr) -> PassResult<()> {
        let span = expr.span;
        if let ExprKind::Return { value } = &mut expr.kind {
            self.set_access_and_visit(value, Access::Read)?;
        }

        let Some(&expected) = self.fun_ret_types.last() else {
            self.log.report(
                ErrorKind::NotInFunBodyContext,
                Some(span),
                "`return` outside of a function body",
            )?;
            return Err(BuildInterrupt::Errors);
        };
        let value = match &expr.kind {
            ExprKind::Return { value } => value,
            _ => unreachable!(),
        };
        let value_ty = self.denoted_type(value);
        if !self.types.matches_sauf_qualifiers(value_ty, expected) {
            self.log.report(
                ErrorKind::NoImplicitConversion,
                Some(span),
                format!(
                    "return value `{}` does not match the declared `{}`",
                    self.types.display(value_ty, self.names),
                    self.types.display(expected, self.names)
                ),
            )?;
        }

        let noreturn = self.types.funda(FundaType::Noreturn);
        self.associate_local(expr, noreturn);
        Ok(())
    }

    fn visit_call(&mut self, expr: &mut Expr) -> PassResult<()> {
        let span = expr.span;
        if let ExprKind::Call { callee, args } = &mut expr.kind {
            self.set_access_and_visit(callee, Access::Read)?;
            for arg in args {
                self.set_access_and_visit(arg, Access::Read)?;
            }
        }

        let (callee, args) = match &expr.kind {
            ExprKind::Call { callee, args } => (callee, args),
            _ => unreachable!(),
        };
        let callee_ty = self.denoted_type(callee);
        let (params, ret) = match self.types.get(self.types.unqualified(callee_ty)) {
            ObjType::Fun { params, ret } => (params.clone(), *ret),
            _ => {
                self.log.report(
                    ErrorKind::InvalidArguments,
                    Some(span),
                    format!(
                        "`{}` is not callable",
                        self.types.display(callee_ty, self.names)
                    ),
                )?;
                return Err(BuildInterrupt::Errors);
            }
        };
        if args.len() != params.len() {
            self.log.report(
                ErrorKind::InvalidArguments,
                Some(span),
                format!("expected {} arguments, found {}", params.len(), args.len()),
            )?;
        }
        for (index, (arg, param)) in args.iter().zip(&params).enumerate() {
            let arg_ty = self.denoted_type(arg);
            if !self.types.matches_sauf_qualifiers(arg_ty, *param) {
                self.log.report(
                    ErrorKind::InvalidArguments,
                    Some(arg.span),
                    format!(
                        "argument {} has type `{}`, expected `{}`",
                        index + 1,
                        self.types.display(arg_ty, self.names),
                        self.types.display(*param, self.names)
                    ),
                )?;
            }
        }

        self.associate_local(expr, ret);
        Ok(())
    }

    fn visit_data_def(&mut self, expr: &mut Expr) -> PassResult<()> {
        let access = expr.access;
        let span = expr.span;
        let (object, storage, do_not_init, declared) = match &expr.kind {
            ExprKind::DataDef(def) => (
                def.object.expect("pass 1 allocated the object"),
                def.storage,
                def.do_not_init,
                resolved(&def.declared_ty),
            ),
            _ => unreachable!(),
        };

        if !do_not_init {
            // zero arguments means default initialization
            let needs_default = match &expr.kind {
                ExprKind::DataDef(def) => def.ctor_args.is_empty(),
                _ => unreachable!(),
            };
            if needs_default {
                let default = self.default_initializer(declared, span)?;
                if let ExprKind::DataDef(def) = &mut expr.kind {
                    def.ctor_args.push(default);
                }
            }
            let count = if let ExprKind::DataDef(def) = &mut expr.kind {
                for arg in &mut def.ctor_args {
                    self.set_access_and_visit(arg, Access::Read)?;
                }
                def.ctor_args.len()
            } else {
                unreachable!()
            };
            if count != 1 {
                self.log.report(
                    ErrorKind::InvalidArguments,
                    Some(span),
                    format!("a definition takes exactly one initializer, found {count}"),
                )?;
            }

            let initializer = match &expr.kind {
                ExprKind::DataDef(def) => &def.ctor_args[0],
                _ => unreachable!(),
            };
            let init_span = initializer.span;
            let init_ct_const = initializer.is_ct_const();
            let init_ty = self.denoted_type(initializer);
            let object_ty = if self.types.is_infer(declared) {
                // the declared qualifiers apply to the inferred type
                let quals = self.types.qualifiers(declared);
                let base = self.types.unqualified(init_ty);
                self.types.qualified(quals, base)
            } else {
                declared
            };
            self.objects.get_mut(object).obj_type = Some(object_ty);

            if self.types.match_types(init_ty, object_ty) == MatchKind::NoMatch {
                self.log.report(
                    ErrorKind::NoImplicitConversion,
                    Some(init_span),
                    format!(
                        "initializer of type `{}` does not match `{}`",
                        self.types.display(init_ty, self.names),
                        self.types.display(object_ty, self.names)
                    ),
                )?;
            }
            if storage == StorageDuration::Static && !init_ct_const {
                self.log.report(
                    ErrorKind::CtConstRequired,
                    Some(init_span),
                    "a static object needs a compile-time constant initializer",
                )?;
            }
        } else if self.types.is_infer(declared) {
            self.log.report(
                ErrorKind::InvalidArguments,
                Some(span),
                "`noinit` needs an explicit type",
            )?;
        }

        if storage != StorageDuration::Member {
            let obj = self.objects.get_mut(object);
            obj.add_access(access);
            // from the definition's position onward the object counts as
            // initialized, `noinit` included
            obj.is_initialized = true;
        }
        expr.object = Some(object);
        Ok(())
    }

    /// Fabricates the default initializer for a definition without one.
    /// Only fundamental concrete types have a default value.
    fn default_initializer(&mut self, declared: ObjTypeId, span: Span) -> PassResult<Expr> {
        let core = self.types.unqualified(declared);
        let funda = match self.types.get(core) {
            ObjType::Funda(
                funda @ (FundaType::Bool | FundaType::Char | FundaType::Int | FundaType::Double),
            ) => *funda,
            _ => {
                self.log.report(
                    ErrorKind::InvalidArguments,
                    Some(span),
                    format!(
                        "`{}` has no default value; provide an initializer",
                        self.types.display(declared, self.names)
                    ),
                )?;
                return Err(BuildInterrupt::Errors);
            }
        };
        let mut ty = TypeExpr::funda(funda, span);
        ty.resolved = Some(self.types.funda(funda));
        Ok(Expr::new(ExprKind::Number { value: 0.0, ty }, span))
    }

    fn visit_fun_def(&mut self, expr: &mut Expr) -> PassResult<()> {
        let access = expr.access;
        let (object, scope, ret, implicit, span) = match &expr.kind {
            ExprKind::FunDef(def) => (
                def.object.expect("pass 1 allocated the object"),
                def.scope.expect("pass 1 created the scope"),
                resolved(&def.ret_ty),
                def.implicit,
                def.span,
            ),
            _ => unreachable!(),
        };

        // signature checks come first so the body sees a valid signature
        if self.types.qualifiers(ret).is_mut() {
            self.log.report(
                ErrorKind::RetTypeCantHaveMutQualifier,
                Some(span),
                "a return type cannot be mutable",
            )?;
        }
        let param_storages: Vec<(StorageDuration, Span)> = match &expr.kind {
            ExprKind::FunDef(def) => def.params.iter().map(|p| (p.storage, p.span)).collect(),
            _ => unreachable!(),
        };
        for (storage, param_span) in param_storages {
            if storage != StorageDuration::Local {
                self.log.report(
                    ErrorKind::OnlyLocalStorageDurationApplicable,
                    Some(param_span),
                    "parameters always have local storage duration",
                )?;
            }
        }

        // an implicit wrapper is not a function-body context for `return`
        if !implicit {
            self.fun_ret_types.push(ret);
        }
        self.env.enter(scope);
        let result = if let ExprKind::FunDef(def) = &mut expr.kind {
            for param in &def.params {
                let param_object = param.object.expect("pass 1 allocated the parameter");
                let obj = self.objects.get_mut(param_object);
                obj.add_access(Access::Ignore);
                // the caller supplies the value
                obj.is_initialized = true;
            }
            self.set_access_and_visit(&mut def.body, Access::Read)
        } else {
            unreachable!()
        };
        self.env.leave();
        if !implicit {
            self.fun_ret_types.pop();
        }
        result?;

        let body = match &expr.kind {
            ExprKind::FunDef(def) => &def.body,
            _ => unreachable!(),
        };
        let body_ty = self.denoted_type(body);
        if !self.types.matches_sauf_qualifiers(body_ty, ret) && !self.types.is_noreturn(body_ty)
        {
            self.log.report(
                ErrorKind::NoImplicitConversion,
                Some(span),
                format!(
                    "function body has type `{}`, declared to return `{}`",
                    self.types.display(body_ty, self.names),
                    self.types.display(ret, self.names)
                ),
            )?;
        }

        // type and storage were fixed by the signature augmentor
        self.objects.get_mut(object).add_access(access);
        expr.object = Some(object);
        Ok(())
    }
}

/// A value with no side effects whose result is thrown away.
fn is_discarded_pure_value(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number { .. } | ExprKind::Symbol { .. } | ExprKind::Cast { .. } => true,
        ExprKind::Operator { op, .. } => op.class() != OpClass::Assignment,
        _ => false,
    }
}

fn resolved(ty: &TypeExpr) -> ObjTypeId {
    ty.resolved.expect("signature augmentor resolved all types")
}

fn operator_args(expr: &Expr) -> &[Expr] {
    match &expr.kind {
        ExprKind::Operator { args, .. } => args,
        _ => unreachable!(),
    }
}
