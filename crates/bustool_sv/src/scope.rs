//! Collision-checked name scopes for entity rendering.

use bustool_expr::RenderScope;
use bustool_ir::{BlockStatement, EntityDecl, Port, Statement};
use indexmap::IndexMap;

use crate::errors::RenderError;

/// Every name visible inside one entity, mapped to the text that refers to it.
///
/// Built once from a complete [`EntityDecl`]; a name contributed twice fails
/// construction with [`RenderError::DuplicateIdentifier`].
#[derive(Debug, Clone, Default)]
pub struct EntityScope {
    names: IndexMap<String, String>,
}

impl EntityScope {
    /// Collects parameters, ports, bus members, body declarations and
    /// aliases of `decl`, in that order.
    pub fn build(decl: &EntityDecl) -> Result<Self, RenderError> {
        let mut builder = ScopeBuilder {
            entity: &decl.id,
            scope: EntityScope::default(),
        };
        for param in &decl.parameters {
            builder.declare(&param.id)?;
        }
        for port in &decl.ports {
            builder.declare(port.id())?;
            if let Port::Bus(bus) = port {
                for member in bus.member_paths() {
                    builder.declare(&member)?;
                }
            }
        }
        for stmt in &decl.body {
            builder.statement(stmt)?;
        }
        for (name, target) in &decl.aliases {
            builder.insert(name, target)?;
        }
        Ok(builder.scope)
    }

    /// Returns `true` if `name` is in scope.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Returns the number of names in scope.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no names are in scope.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates names and their reference text in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl RenderScope for EntityScope {
    fn resolve(&self, name: &str) -> Option<String> {
        self.names.get(name).cloned()
    }
}

struct ScopeBuilder<'a> {
    entity: &'a str,
    scope: EntityScope,
}

impl ScopeBuilder<'_> {
    fn declare(&mut self, name: &str) -> Result<(), RenderError> {
        self.insert(name, name)
    }

    fn insert(&mut self, name: &str, target: &str) -> Result<(), RenderError> {
        if self.scope.names.contains_key(name) {
            return Err(RenderError::DuplicateIdentifier {
                entity: self.entity.to_string(),
                id: name.to_string(),
            });
        }
        self.scope
            .names
            .insert(name.to_string(), target.to_string());
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement) -> Result<(), RenderError> {
        match stmt {
            Statement::Signal(signal) => self.declare(&signal.id),
            Statement::Parameter(param) => self.declare(&param.id),
            Statement::GenVar(decl) | Statement::Integer(decl) => self.declare(&decl.id),
            Statement::Instance(inst) => self.declare(&inst.id),
            Statement::RoleView(view) => self.declare(&view.role),
            Statement::Block(block) => self.block(&block.body),
            Statement::GenBlock(block) => self.block(&block.body),
            Statement::Assign(_) => Ok(()),
        }
    }

    fn block(&mut self, body: &[BlockStatement]) -> Result<(), RenderError> {
        for stmt in body {
            match stmt {
                BlockStatement::GenVar(decl) | BlockStatement::Integer(decl) => {
                    self.declare(&decl.id)?
                }
                BlockStatement::For(f) => self.block(&f.body)?,
                BlockStatement::While(w) => self.block(&w.body)?,
                BlockStatement::If(i) => {
                    self.block(&i.body)?;
                    for (_, body) in &i.elifs {
                        self.block(body)?;
                    }
                    if let Some(body) = &i.else_body {
                        self.block(body)?;
                    }
                }
                BlockStatement::Assign(_) => {}
            }
        }
        Ok(())
    }
}
