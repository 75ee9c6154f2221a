//! Program variable store.
//!
//! One flat environment per run.  Variables come into existence on first
//! assignment, `FOR` or `get`; there is no scoping and no deletion.

use std::collections::HashMap;

use crate::script::expr::EvalContext;
use crate::script::value::Value;

/// Name → value table for a single program run.
#[derive(Debug, Default, Clone)]
pub struct Variables {
    vars: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Mutable access, used for in-place element assignment.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    /// Numeric view of a variable, reading stored decimal text as a number
    /// the same way an expression does (see [`Value::reread`]).
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.vars.get(name)?.clone().reread().as_number()
    }

    /// Returns `true` if the variable is set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EvalContext for Variables {
    fn get_var(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut vars = Variables::new();
        vars.set("x", Value::Num(1.0));
        assert_eq!(vars.get("x"), Some(&Value::Num(1.0)));
    }

    #[test]
    fn overwrite_changes_type() {
        let mut vars = Variables::new();
        vars.set("x", Value::Num(1.0));
        vars.set("x", Value::Str("one".into()));
        assert_eq!(vars.get("x"), Some(&Value::Str("one".into())));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn get_number_accepts_numeric_text() {
        let mut vars = Variables::new();
        vars.set("n", Value::Str("8".into()));
        vars.set("name", Value::Str("hello".into()));
        assert_eq!(vars.get_number("n"), Some(8.0));
        assert_eq!(vars.get_number("name"), None);
    }

    #[test]
    fn element_update_through_get_mut() {
        let mut vars = Variables::new();
        vars.set("a", Value::Array(vec![Value::Num(1.0)]));
        if let Some(Value::Array(items)) = vars.get_mut("a") {
            items.push(Value::Num(2.0));
        }
        assert_eq!(vars.get("a").map(Value::to_string).as_deref(), Some("{1, 2}"));
    }

    #[test]
    fn missing_returns_none() {
        let vars = Variables::new();
        assert_eq!(vars.get("nope"), None);
        assert!(!vars.contains("nope"));
        assert!(vars.is_empty());
    }

    #[test]
    fn context_lookup() {
        let mut vars = Variables::new();
        vars.set("y", Value::Bool(true));
        let ctx: &dyn EvalContext = &vars;
        assert_eq!(ctx.get_var("y"), Some(&Value::Bool(true)));
    }
}
