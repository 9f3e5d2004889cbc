//! The environment: a tree of lexical scopes mapping names to entities.
//!
//! Scopes are created once by the environment-insertion pass and *re-entered*
//! by the later passes — blocks and function definitions remember their
//! [`ScopeId`] as an AST annotation. This keeps the three traversals in
//! agreement about which bindings are visible where, without rebuilding
//! tables on every pass.
//!
//! Lookup walks from the current scope toward the root; insertion targets
//! the current scope only and reports an existing binding instead of
//! overwriting it.

use std::collections::HashMap;

use veld_base::Symbol;

use crate::object::ObjectId;
use crate::types::ObjTypeId;

/// What a name can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A runtime object (data or function).
    Object(ObjectId),
    /// A type name, e.g. a class definition.
    Type(ObjTypeId),
}

/// Handle to a scope within the [`Env`] tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(u32);

struct Scope {
    parent: Option<ScopeId>,
    table: HashMap<Symbol, Entity>,
}

/// Scope tree with a cursor for the currently active scope.
pub struct Env {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Env {
    pub fn new() -> Self {
        Env {
            scopes: vec![Scope {
                parent: None,
                table: HashMap::new(),
            }],
            current: ScopeId(0),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Creates a child of the current scope and enters it.
    pub fn create_child(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(self.current),
            table: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Re-enters a scope created by an earlier pass.
    pub fn enter(&mut self, id: ScopeId) {
        debug_assert!((id.0 as usize) < self.scopes.len());
        self.current = id;
    }

    /// Leaves the current scope toward its parent. Leaving the root is a
    /// programming error.
    pub fn leave(&mut self) {
        let parent = self.scopes[self.current.0 as usize]
            .parent
            .expect("cannot leave the root scope");
        self.current = parent;
    }

    /// Binds `name` in the current scope. On a clash the existing entity is
    /// returned and the scope is left unchanged.
    pub fn insert(&mut self, name: Symbol, entity: Entity) -> Result<(), Entity> {
        let table = &mut self.scopes[self.current.0 as usize].table;
        if let Some(&existing) = table.get(&name) {
            return Err(existing);
        }
        table.insert(name, entity);
        Ok(())
    }

    /// Innermost binding of `name`, walking from the current scope outward.
    pub fn find(&self, name: Symbol) -> Option<Entity> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.0 as usize];
            if let Some(&entity) = scope.table.get(&name) {
                return Some(entity);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Binding of `name` in the current scope only.
    pub fn find_local(&self, name: Symbol) -> Option<Entity> {
        self.scopes[self.current.0 as usize].table.get(&name).copied()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, ObjectTable, StorageDuration};

    fn object_entity(table: &mut ObjectTable) -> Entity {
        Entity::Object(table.alloc(Object::new(None, StorageDuration::Local)))
    }

    #[test]
    fn find_returns_what_insert_bound() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let entity = object_entity(&mut objects);
        env.insert(x, entity).unwrap();
        assert_eq!(env.find(x), Some(entity));
    }

    #[test]
    fn unbound_names_are_not_found() {
        let env = Env::new();
        let mut names = veld_base::Interner::new();
        assert_eq!(env.find(names.intern("ghost")), None);
    }

    #[test]
    fn inner_scopes_shadow_outer_bindings() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let outer = object_entity(&mut objects);
        let inner = object_entity(&mut objects);

        env.insert(x, outer).unwrap();
        env.create_child();
        env.insert(x, inner).unwrap();
        assert_eq!(env.find(x), Some(inner));
        env.leave();
        assert_eq!(env.find(x), Some(outer));
    }

    #[test]
    fn outer_bindings_are_visible_from_inner_scopes() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let entity = object_entity(&mut objects);
        env.insert(x, entity).unwrap();
        env.create_child();
        assert_eq!(env.find(x), Some(entity));
    }

    #[test]
    fn double_insert_in_one_scope_reports_the_existing_entity() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let first = object_entity(&mut objects);
        let second = object_entity(&mut objects);
        env.insert(x, first).unwrap();
        assert_eq!(env.insert(x, second), Err(first));
        assert_eq!(env.find(x), Some(first));
    }

    #[test]
    fn scopes_can_be_reentered_by_id() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let entity = object_entity(&mut objects);

        let inner = env.create_child();
        env.insert(x, entity).unwrap();
        env.leave();
        assert_eq!(env.find(x), None);

        env.enter(inner);
        assert_eq!(env.find(x), Some(entity));
        env.leave();
        assert_eq!(env.current(), env.root());
    }

    #[test]
    fn find_local_ignores_outer_scopes() {
        let mut objects = ObjectTable::new();
        let mut env = Env::new();
        let mut names = veld_base::Interner::new();
        let x = names.intern("x");
        let entity = object_entity(&mut objects);
        env.insert(x, entity).unwrap();
        env.create_child();
        assert_eq!(env.find_local(x), None);
        assert_eq!(env.find(x), Some(entity));
    }
}
