//! Runtime value type for the pseudocode language.
//!
//! Values are dynamically typed.  A string that reads as a decimal number is
//! accepted wherever a number is expected, and `"true"` / `"false"` wherever
//! a boolean is expected; everything else must match its operator's declared
//! operand types exactly (see [`expr`](super::expr)).

use std::fmt;

/// A pseudocode runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64's Display already drops a zero fraction: 14.0 prints "14".
            // Adding 0.0 folds -0.0 into 0.0.
            Value::Num(x) => write!(f, "{}", x + 0.0),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read a stored string back as the literal it spells.
    ///
    /// Decimal text becomes a number and `true` / `false` become booleans, so
    /// a line read by `get` can be used in arithmetic once it sits in a
    /// variable.  A quoted literal in an expression never goes through this
    /// and keeps its string type.
    pub fn reread(self) -> Value {
        match self {
            Value::Str(s) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => match parse_number(&s) {
                    Some(x) => Value::Num(x),
                    None => Value::Str(s),
                },
            },
            other => other,
        }
    }

    /// Array subscript view: a non-negative whole number.
    pub fn as_index(&self) -> Option<usize> {
        let x = self.as_number()?;
        if x >= 0.0 && x.fract() == 0.0 && x <= usize::MAX as f64 {
            Some(x as usize)
        } else {
            None
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_))
    }

    /// Name of the type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "array",
        }
    }
}

/// Parse decimal text the way the tokenizer recognises numbers
/// (`12`, `3.5`, optionally signed), ignoring surrounding whitespace.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || frac.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    t.parse().ok()
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
