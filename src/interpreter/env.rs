use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ast::Expr, error::RuntimeError, interpreter::value::core::Value};

/// Native implementation of a builtin function.
///
/// A builtin receives the slice of evaluated argument values; arity has
/// already been checked by the evaluator.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, RuntimeError>;

/// A user-defined function: parameter names and the body expression.
///
/// This is the serializable payload the persistence layer round-trips via
/// [`Environment::export_bindings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFunction {
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// The body expression evaluated on each call.
    pub body:   Expr,
}

/// How a function entry is implemented.
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// A native function installed at root construction. Protected: it can
    /// never be overwritten or deleted.
    Builtin(BuiltinFn),
    /// A function defined by the user with `def`.
    User(UserFunction),
}

/// A function bound in some scope: its declared arity and implementation.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// The fixed number of arguments the function accepts.
    pub arity: usize,
    /// Builtin or user-defined body.
    pub kind:  FunctionKind,
}

impl FunctionEntry {
    /// Returns `true` for protected builtin entries.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        matches!(self.kind, FunctionKind::Builtin(_))
    }
}

/// Identifies one scope inside an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// One lexical scope: variable and function bindings plus an optional
/// parent link for delegated lookup.
#[derive(Debug)]
struct Scope {
    variables: HashMap<String, Value>,
    functions: HashMap<String, FunctionEntry>,
    parent:    Option<ScopeId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self { variables: HashMap::new(),
               functions: HashMap::new(),
               parent }
    }
}

/// A session's binding store: a tree of scopes with delegation to the root.
///
/// Scope 0 is the session root, created once per session and pre-populated
/// with the constants `e` and `pi` and the builtin function table. All other
/// scopes are transient, created per function call with their parent set to
/// the *caller's* scope (dynamic scoping) and discarded when the call
/// returns.
///
/// Lookups and deletions walk the chain from the given scope toward the
/// root: local map first, then the parent. Deletion is a no-op when the name
/// is absent everywhere; lookup fails. A deletion in a child scope never
/// touches an ancestor's binding unless the child has no local entry for the
/// name, in which case it is forwarded upward.
///
/// # Example
/// ```
/// use mensura::interpreter::{env::Environment, value::core::Value};
///
/// let mut env = Environment::new();
/// env.set_var(Environment::ROOT, "x", Value::Real(1.0));
///
/// let child = env.child_scope(Environment::ROOT);
/// env.set_var(child, "x", Value::Real(2.0));
/// assert_eq!(env.get_var(child, "x").unwrap(), &Value::Real(2.0));
///
/// // Deleting in the child falls back to the root binding.
/// env.del_var(child, "x");
/// assert_eq!(env.get_var(child, "x").unwrap(), &Value::Real(1.0));
///
/// // Deleting again forwards to the root; a third delete is a no-op.
/// env.del_var(child, "x");
/// assert!(env.get_var(child, "x").is_err());
/// env.del_var(child, "x");
/// ```
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// The session root scope.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Creates a session environment: a single root scope holding the
    /// constants `e` and `pi` and the builtin function table.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Self { scopes: vec![Scope::new(None)], };

        env.set_var(Self::ROOT, "e", Value::Real(std::f64::consts::E));
        env.set_var(Self::ROOT, "pi", Value::Real(std::f64::consts::PI));

        crate::interpreter::evaluator::builtin::install(&mut env);

        env
    }

    /// Creates a transient scope whose lookups delegate to `parent`.
    pub fn child_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(parent)));
        id
    }

    /// The number of live scopes, used to mark a point to unwind to.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Discards every scope created after `mark`. Called when a function
    /// call returns; transient call scopes hold no state worth keeping.
    pub fn truncate_scopes(&mut self, mark: usize) {
        self.scopes.truncate(mark.max(1));
    }

    /// Binds a variable in exactly the given scope, never in an ancestor.
    pub fn set_var(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0].variables.insert(name.to_string(), value);
    }

    /// Looks up a variable, walking from `scope` toward the root.
    ///
    /// # Errors
    /// Fails with `UnboundVariable` when no scope along the chain binds the
    /// name.
    pub fn get_var(&self, scope: ScopeId, name: &str) -> Result<&Value, RuntimeError> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(value) = scope.variables.get(name) {
                return Ok(value);
            }
            current = scope.parent;
        }

        Err(RuntimeError::UnboundVariable { name: name.to_string(), })
    }

    /// Removes the nearest binding of a variable, walking from `scope`
    /// toward the root. A no-op when the name is absent everywhere.
    pub fn del_var(&mut self, scope: ScopeId, name: &str) {
        let mut current = Some(scope);

        while let Some(id) = current {
            if self.scopes[id.0].variables.remove(name).is_some() {
                return;
            }
            current = self.scopes[id.0].parent;
        }
    }

    /// Registers a user-defined function in exactly the given scope.
    ///
    /// # Errors
    /// Fails with `ProtectedRedefinition` if the name already resolves to a
    /// builtin anywhere along the chain to the root.
    pub fn set_function(&mut self,
                        scope: ScopeId,
                        name: &str,
                        function: UserFunction)
                        -> Result<(), RuntimeError> {
        if let Ok(existing) = self.get_function(scope, name) {
            if existing.is_builtin() {
                return Err(RuntimeError::ProtectedRedefinition { name: name.to_string(), });
            }
        }

        let entry = FunctionEntry { arity: function.params.len(),
                                    kind:  FunctionKind::User(function), };
        self.scopes[scope.0].functions.insert(name.to_string(), entry);

        Ok(())
    }

    /// Looks up a function, walking from `scope` toward the root.
    ///
    /// # Errors
    /// Fails with `UnboundFunction` when no scope along the chain binds the
    /// name.
    pub fn get_function(&self, scope: ScopeId, name: &str) -> Result<&FunctionEntry, RuntimeError> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(entry) = scope.functions.get(name) {
                return Ok(entry);
            }
            current = scope.parent;
        }

        Err(RuntimeError::UnboundFunction { name: name.to_string(), })
    }

    /// Removes the nearest user binding of a function, walking from `scope`
    /// toward the root. Builtin entries are protected and survive; absence
    /// is a no-op.
    pub fn del_function(&mut self, scope: ScopeId, name: &str) {
        let mut current = Some(scope);

        while let Some(id) = current {
            if let Some(entry) = self.scopes[id.0].functions.get(name) {
                let protected = entry.is_builtin();
                if !protected {
                    self.scopes[id.0].functions.remove(name);
                }
                return;
            }
            current = self.scopes[id.0].parent;
        }
    }

    /// Installs a protected builtin into the root scope. Only called while
    /// constructing the session environment.
    pub(crate) fn install_builtin(&mut self, name: &str, arity: usize, func: BuiltinFn) {
        let entry = FunctionEntry { arity,
                                    kind: FunctionKind::Builtin(func), };
        self.scopes[Self::ROOT.0].functions.insert(name.to_string(), entry);
    }

    /// Exports the root scope's bindings for persistence: all variables and
    /// every *user-defined* function. Builtin entries are never exported;
    /// they are re-installed at construction.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::{env::Environment, value::core::Value};
    ///
    /// let mut env = Environment::new();
    /// env.set_var(Environment::ROOT, "x", Value::Real(3.0));
    ///
    /// let (variables, functions) = env.export_bindings();
    /// assert_eq!(variables.get("x"), Some(&Value::Real(3.0)));
    /// assert!(functions.is_empty());
    /// ```
    #[must_use]
    pub fn export_bindings(&self) -> (HashMap<String, Value>, HashMap<String, UserFunction>) {
        let root = &self.scopes[Self::ROOT.0];

        let variables = root.variables.clone();
        let functions = root.functions
                            .iter()
                            .filter_map(|(name, entry)| match &entry.kind {
                                FunctionKind::User(function) => {
                                    Some((name.clone(), function.clone()))
                                },
                                FunctionKind::Builtin(_) => None,
                            })
                            .collect();

        (variables, functions)
    }

    /// Restores previously exported bindings into the root scope.
    ///
    /// # Errors
    /// Fails with `ProtectedRedefinition` if a function name collides with a
    /// builtin, which can only happen with a payload not produced by
    /// [`Environment::export_bindings`].
    pub fn import_bindings(&mut self,
                           variables: HashMap<String, Value>,
                           functions: HashMap<String, UserFunction>)
                           -> Result<(), RuntimeError> {
        for (name, value) in variables {
            self.set_var(Self::ROOT, &name, value);
        }

        for (name, function) in functions {
            self.set_function(Self::ROOT, &name, function)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegation_shadows_and_falls_through() {
        let mut env = Environment::new();
        env.set_var(Environment::ROOT, "x", Value::Real(1.0));

        let child = env.child_scope(Environment::ROOT);
        env.set_var(child, "x", Value::Real(2.0));

        assert_eq!(env.get_var(child, "x").unwrap(), &Value::Real(2.0));
        assert_eq!(env.get_var(Environment::ROOT, "x").unwrap(), &Value::Real(1.0));

        env.del_var(child, "x");
        assert_eq!(env.get_var(child, "x").unwrap(), &Value::Real(1.0));

        env.del_var(child, "x");
        assert!(matches!(env.get_var(child, "x"),
                         Err(RuntimeError::UnboundVariable { .. })));

        // Absent everywhere: deletion stays a no-op.
        env.del_var(child, "x");
    }

    #[test]
    fn function_shadowing_and_delegated_delete() {
        let mut env = Environment::new();
        let body = Expr::Variable("x".to_string());

        let outer = UserFunction { params: vec!["x".to_string()],
                                   body:   body.clone(), };
        let inner = UserFunction { params: vec!["x".to_string(), "y".to_string()],
                                   body, };

        env.set_function(Environment::ROOT, "f", outer).unwrap();

        let child = env.child_scope(Environment::ROOT);
        env.set_function(child, "f", inner).unwrap();

        assert_eq!(env.get_function(child, "f").unwrap().arity, 2);

        env.del_function(child, "f");
        assert_eq!(env.get_function(child, "f").unwrap().arity, 1);

        env.del_function(child, "f");
        assert!(matches!(env.get_function(child, "f"),
                         Err(RuntimeError::UnboundFunction { .. })));
    }

    #[test]
    fn builtins_are_protected_from_redefinition_and_deletion() {
        let mut env = Environment::new();
        let function = UserFunction { params: vec!["x".to_string()],
                                      body:   Expr::Variable("x".to_string()), };

        assert!(matches!(env.set_function(Environment::ROOT, "sqrt", function),
                         Err(RuntimeError::ProtectedRedefinition { .. })));

        env.del_function(Environment::ROOT, "sqrt");
        assert!(env.get_function(Environment::ROOT, "sqrt").is_ok());
    }

    #[test]
    fn export_skips_builtins_and_round_trips_user_state() {
        let mut env = Environment::new();
        env.set_var(Environment::ROOT, "x", Value::Real(3.0));
        env.set_function(Environment::ROOT,
                          "f",
                          UserFunction { params: vec!["a".to_string()],
                                         body:   Expr::Variable("a".to_string()), })
           .unwrap();

        let (variables, functions) = env.export_bindings();
        assert!(functions.contains_key("f"));
        assert!(!functions.contains_key("sin"));

        let mut restored = Environment::new();
        restored.import_bindings(variables, functions).unwrap();

        assert_eq!(restored.get_var(Environment::ROOT, "x").unwrap(), &Value::Real(3.0));
        assert_eq!(restored.get_function(Environment::ROOT, "f").unwrap().arity, 1);
    }
}
