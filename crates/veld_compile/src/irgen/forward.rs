//! Pass 4: forward declaration of module-level IR entities.
//!
//! Walks the AST before any code is lowered and creates a placeholder for
//! every definition that outlives a single evaluation: functions get their
//! IR function with the full signature, static data gets an IR global with
//! no initializer yet. Each such object is decorated with its IR address so
//! that the main pass can reference forward-defined names — recursive and
//! mutually recursive calls included — before reaching their definitions.

use veld_base::Interner;

use veld_language::ast::{Expr, ExprKind};
use veld_language::object::{ObjectTable, StorageDuration};
use veld_language::types::TypeInterner;

use crate::ir::builder::Builder;
use crate::ir::Value;

use super::{ir_type, ObjIr};

pub struct ForwardDeclarator<'a> {
    objects: &'a ObjectTable,
    types: &'a TypeInterner,
    names: &'a Interner,
    builder: &'a mut Builder,
    obj_ir: &'a mut Vec<ObjIr>,
}

impl<'a> ForwardDeclarator<'a> {
    pub fn new(
        objects: &'a ObjectTable,
        types: &'a TypeInterner,
        names: &'a Interner,
        builder: &'a mut Builder,
        obj_ir: &'a mut Vec<ObjIr>,
    ) -> Self {
        ForwardDeclarator {
            objects,
            types,
            names,
            builder,
            obj_ir,
        }
    }

    pub fn run(&mut self, root: &Expr) {
        self.visit(root);
    }

    fn visit(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Nop | ExprKind::Number { .. } | ExprKind::Symbol { .. } => {}
            ExprKind::Cast { arg, .. } => self.visit(arg),
            ExprKind::Operator { args, .. } | ExprKind::Seq { operands: args } => {
                for arg in args {
                    self.visit(arg);
                }
            }
            ExprKind::Block { body, .. } => self.visit(body),
            ExprKind::If { cond, then, els } => {
                self.visit(cond);
                self.visit(then);
                if let Some(els) = els {
                    self.visit(els);
                }
            }
            ExprKind::Loop { cond, body } => {
                self.visit(cond);
                self.visit(body);
            }
            ExprKind::Return { value } => self.visit(value),
            ExprKind::Call { callee, args } => {
                self.visit(callee);
                for arg in args {
                    self.visit(arg);
                }
            }
            ExprKind::DataDef(def) => {
                for arg in &def.ctor_args {
                    self.visit(arg);
                }
                if def.storage == StorageDuration::Static {
                    let object = def.object.expect("analysis decorated the definition");
                    let ty = self
                        .objects
                        .get(object)
                        .obj_type
                        .expect("analysis typed the object");
                    let is_constant = !self.types.qualifiers(ty).is_mut();
                    let global = self.builder.create_global(
                        self.names.resolve(def.name),
                        ir_type(self.types, ty),
                        None,
                        is_constant,
                    );
                    self.obj_ir[object.index()].allocate_addr(Value::Global(global));
                }
            }
            ExprKind::FunDef(def) => {
                let object = def.object.expect("analysis decorated the definition");
                let params = def
                    .params
                    .iter()
                    .map(|param| {
                        let param_object = param.object.expect("analysis decorated the parameter");
                        let ty = self
                            .objects
                            .get(param_object)
                            .obj_type
                            .expect("analysis typed the parameter");
                        ir_type(self.types, ty)
                    })
                    .collect();
                let ret = ir_type(
                    self.types,
                    def.ret_ty.resolved.expect("analysis resolved the return type"),
                );
                let func =
                    self.builder
                        .create_function(self.names.resolve(def.name), params, ret);
                // a function is ready for use the moment it exists
                self.obj_ir[object.index()].refer_to_addr(Value::Function(func));
                self.visit(&def.body);
            }
        }
    }
}
