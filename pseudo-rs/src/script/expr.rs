//! Expression evaluator.
//!
//! Evaluation works directly on the flat token sequence produced by
//! [`tokenize`](super::token::tokenize); there is no expression tree.
//!
//! 1. **Brackets** — the first `)` and the nearest `(` before it are
//!    evaluated recursively and replaced by the resulting literal, until no
//!    brackets remain.
//! 2. **Operands** — leftover fragments become literals (quoted text,
//!    numbers, `true`/`false`, brace lists).  An identifier that survived
//!    variable substitution is taken as a string equal to its own name.
//! 3. **Folding** — operators are reduced one precedence level at a time:
//!
//!    negation → `*` `/` → `+` `-` → `==` `!=` `>` `>=` `<` `<=` → `NOT` →
//!    `AND` → `OR`
//!
//!    Within a level the leftmost operator is folded first and the scan
//!    restarts, so operators of one level associate to the left.
//!
//! Every operator carries an ordered list of typed variants.  The first
//! variant whose operand constraints admit the operands is applied; if none
//! does, evaluation fails with [`EvalError::TypeMismatch`].

use std::cmp::Ordering;
use std::fmt;

use super::expand::substitute;
use super::token::{tokenize, Symbol, Token};
use super::value::Value;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Variable lookup used by substitution.
///
/// The interpreter's [`Variables`](crate::var::Variables) implements this;
/// tests may supply their own.
pub trait EvalContext {
    fn get_var(&self, name: &str) -> Option<&Value>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// An expression could not be reduced to a single literal.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A `(` without a matching `)`, or the reverse.
    UnbalancedBracket,
    /// Structurally invalid expression (missing operand, empty brackets, …).
    Malformed(String),
    /// No typed variant of `op` accepts these operand types.
    TypeMismatch {
        op: &'static str,
        operands: Vec<&'static str>,
    },
    /// A condition evaluated to something other than a boolean.
    ExpectedBoolean { found: &'static str },
    DivisionByZero,
    /// `name[i]` where `name` was never assigned.
    UndefinedVariable(String),
    NotAnArray { name: String, found: &'static str },
    /// A subscript that is not a non-negative whole number.
    BadIndex { name: String, index: String },
    IndexOutOfBounds { name: String, index: usize, len: usize },
    UnexpectedSymbol(char),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnbalancedBracket => write!(f, "unbalanced brackets"),
            EvalError::Malformed(msg) => write!(f, "malformed expression: {msg}"),
            EvalError::TypeMismatch { op, operands } => {
                write!(f, "type mismatch: '{op}' cannot be applied to {}", operands.join(" and "))
            }
            EvalError::ExpectedBoolean { found } => {
                write!(f, "condition must be a boolean, found {found}")
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::UndefinedVariable(name) => write!(f, "undefined variable '{name}'"),
            EvalError::NotAnArray { name, found } => {
                write!(f, "'{name}' is a {found}, not an array")
            }
            EvalError::BadIndex { name, index } => {
                write!(f, "invalid index '{index}' for '{name}'")
            }
            EvalError::IndexOutOfBounds { name, index, len } => {
                write!(f, "index {index} out of bounds for '{name}' (length {len})")
            }
            EvalError::UnexpectedSymbol(c) => write!(f, "unexpected symbol '{c}'"),
        }
    }
}

impl std::error::Error for EvalError {}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Neg,
    Mul,
    Div,
    Add,
    Sub,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Not,
    And,
    Or,
}

/// Folding order, highest precedence first.
const LEVELS: &[&[Operator]] = &[
    &[Operator::Neg],
    &[Operator::Mul, Operator::Div],
    &[Operator::Add, Operator::Sub],
    &[
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
    ],
    &[Operator::Not],
    &[Operator::And],
    &[Operator::Or],
];

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Neg => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Not => "NOT",
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, Operator::Neg | Operator::Not)
    }

    fn variants(self) -> Variants {
        match self {
            Operator::Neg => Variants::Unary(NEG),
            Operator::Not => Variants::Unary(NOT),
            Operator::Mul => Variants::Binary(MUL),
            Operator::Div => Variants::Binary(DIV),
            Operator::Add => Variants::Binary(ADD),
            Operator::Sub => Variants::Binary(SUB),
            Operator::Eq => Variants::Binary(EQ),
            Operator::Ne => Variants::Binary(NE),
            Operator::Gt => Variants::Binary(GT),
            Operator::Ge => Variants::Binary(GE),
            Operator::Lt => Variants::Binary(LT),
            Operator::Le => Variants::Binary(LE),
            Operator::And => Variants::Binary(AND),
            Operator::Or => Variants::Binary(OR),
        }
    }
}

// ── Typed variants ────────────────────────────────────────────────────────────

/// Operand type constraint of a variant.
#[derive(Debug, Clone, Copy)]
enum Ty {
    Number,
    /// A string.
    Text,
    Boolean,
    /// Anything but an array.
    Scalar,
    Any,
}

impl Ty {
    fn admits(self, v: &Value) -> bool {
        match self {
            Ty::Number => v.as_number().is_some(),
            Ty::Text => matches!(v, Value::Str(_)),
            Ty::Boolean => v.as_bool().is_some(),
            Ty::Scalar => v.is_scalar(),
            Ty::Any => true,
        }
    }
}

type BinaryFn = fn(&Value, &Value) -> Result<Value, EvalError>;
type UnaryFn = fn(&Value) -> Result<Value, EvalError>;

struct Variant {
    lhs: Ty,
    rhs: Ty,
    apply: BinaryFn,
}

struct UnaryVariant {
    operand: Ty,
    apply: UnaryFn,
}

enum Variants {
    Binary(&'static [Variant]),
    Unary(&'static [UnaryVariant]),
}

const fn bin(lhs: Ty, rhs: Ty, apply: BinaryFn) -> Variant {
    Variant { lhs, rhs, apply }
}

const NEG: &[UnaryVariant] = &[UnaryVariant { operand: Ty::Number, apply: negate }];
const NOT: &[UnaryVariant] = &[UnaryVariant { operand: Ty::Boolean, apply: invert }];
const MUL: &[Variant] = &[bin(Ty::Number, Ty::Number, multiply)];
const DIV: &[Variant] = &[bin(Ty::Number, Ty::Number, divide)];
const ADD: &[Variant] = &[
    bin(Ty::Number, Ty::Number, add),
    bin(Ty::Text, Ty::Scalar, concat),
    bin(Ty::Scalar, Ty::Text, concat),
];
const SUB: &[Variant] = &[bin(Ty::Number, Ty::Number, subtract)];
const EQ: &[Variant] = &[bin(Ty::Number, Ty::Number, num_eq), bin(Ty::Any, Ty::Any, same)];
const NE: &[Variant] = &[bin(Ty::Number, Ty::Number, num_ne), bin(Ty::Any, Ty::Any, differ)];
const GT: &[Variant] = &[bin(Ty::Number, Ty::Number, num_gt), bin(Ty::Text, Ty::Text, text_gt)];
const GE: &[Variant] = &[bin(Ty::Number, Ty::Number, num_ge), bin(Ty::Text, Ty::Text, text_ge)];
const LT: &[Variant] = &[bin(Ty::Number, Ty::Number, num_lt), bin(Ty::Text, Ty::Text, text_lt)];
const LE: &[Variant] = &[bin(Ty::Number, Ty::Number, num_le), bin(Ty::Text, Ty::Text, text_le)];
const AND: &[Variant] = &[bin(Ty::Boolean, Ty::Boolean, both)];
const OR: &[Variant] = &[bin(Ty::Boolean, Ty::Boolean, either)];

fn number(v: &Value) -> Result<f64, EvalError> {
    v.as_number()
        .ok_or_else(|| EvalError::Malformed(format!("'{v}' is not a number")))
}

fn numbers(a: &Value, b: &Value) -> Result<(f64, f64), EvalError> {
    Ok((number(a)?, number(b)?))
}

fn boolean(v: &Value) -> Result<bool, EvalError> {
    v.as_bool()
        .ok_or(EvalError::ExpectedBoolean { found: v.type_name() })
}

fn negate(v: &Value) -> Result<Value, EvalError> {
    Ok(Value::Num(-number(v)?))
}

fn invert(v: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(!boolean(v)?))
}

fn add(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y) = numbers(a, b)?;
    Ok(Value::Num(x + y))
}

fn subtract(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y) = numbers(a, b)?;
    Ok(Value::Num(x - y))
}

fn multiply(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y) = numbers(a, b)?;
    Ok(Value::Num(x * y))
}

fn divide(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y) = numbers(a, b)?;
    if y == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Num(x / y))
}

fn concat(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Str(format!("{a}{b}")))
}

fn num_order(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    let (x, y) = numbers(a, b)?;
    x.partial_cmp(&y)
        .ok_or_else(|| EvalError::Malformed("numbers cannot be ordered".into()))
}

fn text_order(a: &Value, b: &Value) -> Ordering {
    a.to_string().cmp(&b.to_string())
}

fn num_eq(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? == Ordering::Equal))
}

fn num_ne(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? != Ordering::Equal))
}

fn same(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(a == b))
}

fn differ(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(a != b))
}

fn num_gt(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? == Ordering::Greater))
}

fn num_ge(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? != Ordering::Less))
}

fn num_lt(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? == Ordering::Less))
}

fn num_le(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(num_order(a, b)? != Ordering::Greater))
}

fn text_gt(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(text_order(a, b) == Ordering::Greater))
}

fn text_ge(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(text_order(a, b) != Ordering::Less))
}

fn text_lt(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(text_order(a, b) == Ordering::Less))
}

fn text_le(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(text_order(a, b) != Ordering::Greater))
}

fn both(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(boolean(a)? && boolean(b)?))
}

fn either(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(boolean(a)? || boolean(b)?))
}

// ── Evaluation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Item {
    Operand(Value),
    Operator(Operator),
}

/// Reduce a token sequence to a single literal.
///
/// Tokens should already have been through
/// [`substitute`](super::expand::substitute); identifiers that remain are
/// treated as strings.
pub fn evaluate(mut tokens: Vec<Token>) -> Result<Value, EvalError> {
    resolve_brackets(&mut tokens)?;
    let mut items = to_items(tokens)?;
    for level in LEVELS {
        fold_level(&mut items, level)?;
    }

    let mut rest = items.into_iter();
    match (rest.next(), rest.next()) {
        (Some(Item::Operand(v)), None) => Ok(v),
        (None, _) => Err(EvalError::Malformed("empty expression".into())),
        (Some(Item::Operator(op)), None) => Err(EvalError::Malformed(format!(
            "operator '{}' has no operands",
            op.symbol()
        ))),
        _ => Err(EvalError::Malformed("missing operator between operands".into())),
    }
}

/// Tokenize `src`, substitute variables from `ctx`, and evaluate.
pub fn eval_str(src: &str, ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    let tokens = substitute(tokenize(src), ctx)?;
    evaluate(tokens)
}

/// Like [`eval_str`], but the result must be a boolean.
pub fn eval_condition(src: &str, ctx: &dyn EvalContext) -> Result<bool, EvalError> {
    let value = eval_str(src, ctx)?;
    value
        .as_bool()
        .ok_or(EvalError::ExpectedBoolean { found: value.type_name() })
}

fn resolve_brackets(tokens: &mut Vec<Token>) -> Result<(), EvalError> {
    while let Some(close) = tokens.iter().position(|t| matches!(t, Token::RParen)) {
        let open = tokens[..close]
            .iter()
            .rposition(|t| matches!(t, Token::LParen))
            .ok_or(EvalError::UnbalancedBracket)?;
        if close == open + 1 {
            return Err(EvalError::Malformed("empty parentheses".into()));
        }
        let inner: Vec<Token> = tokens.drain(open..=close).collect();
        let value = evaluate(inner[1..inner.len() - 1].to_vec())?;
        tokens.insert(open, Token::Value(value));
    }
    if tokens.iter().any(|t| matches!(t, Token::LParen)) {
        return Err(EvalError::UnbalancedBracket);
    }
    Ok(())
}

fn to_items(tokens: Vec<Token>) -> Result<Vec<Item>, EvalError> {
    let mut items: Vec<Item> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let item = match tok {
            Token::Value(v) => Item::Operand(v),
            Token::Quoted(s) => Item::Operand(Value::Str(s)),
            Token::Number(text) => {
                let x = text
                    .parse()
                    .map_err(|_| EvalError::Malformed(format!("bad number '{text}'")))?;
                Item::Operand(Value::Num(x))
            }
            Token::Ident(word) => match word.as_str() {
                "AND" => Item::Operator(Operator::And),
                "OR" => Item::Operator(Operator::Or),
                "NOT" => Item::Operator(Operator::Not),
                "true" => Item::Operand(Value::Bool(true)),
                "false" => Item::Operand(Value::Bool(false)),
                // Unbound names evaluate to their own text.
                _ => Item::Operand(Value::Str(word)),
            },
            Token::Indexed { name, index } => Item::Operand(Value::Str(format!("{name}[{index}]"))),
            Token::List(elements) => Item::Operand(build_array(elements)?),
            Token::Op(sym) => {
                let after_operand = matches!(items.last(), Some(Item::Operand(_)));
                Item::Operator(match sym {
                    Symbol::Minus if !after_operand => Operator::Neg,
                    Symbol::Minus => Operator::Sub,
                    Symbol::Plus => Operator::Add,
                    Symbol::Star => Operator::Mul,
                    Symbol::Slash => Operator::Div,
                    Symbol::Eq => Operator::Eq,
                    Symbol::Ne => Operator::Ne,
                    Symbol::Lt => Operator::Lt,
                    Symbol::Le => Operator::Le,
                    Symbol::Gt => Operator::Gt,
                    Symbol::Ge => Operator::Ge,
                })
            }
            Token::LParen | Token::RParen => return Err(EvalError::UnbalancedBracket),
            Token::Other(c) => return Err(EvalError::UnexpectedSymbol(c)),
        };
        items.push(item);
    }
    Ok(items)
}

fn build_array(elements: Vec<Vec<Token>>) -> Result<Value, EvalError> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        let v = evaluate(element)?;
        if !v.is_scalar() {
            return Err(EvalError::Malformed("array elements must be scalars".into()));
        }
        values.push(v);
    }
    Ok(Value::Array(values))
}

/// Leftmost operator of `level` that can be folded now.
///
/// A unary operator is only ready once its right-hand side is an operand;
/// if none is ready the first candidate is returned so folding reports it.
fn next_in_level(items: &[Item], level: &[Operator]) -> Option<(usize, Operator)> {
    let mut first = None;
    for (i, item) in items.iter().enumerate() {
        let Item::Operator(op) = item else { continue };
        if !level.contains(op) {
            continue;
        }
        if !op.is_unary() || matches!(items.get(i + 1), Some(Item::Operand(_))) {
            return Some((i, *op));
        }
        first.get_or_insert((i, *op));
    }
    first
}

fn operand(items: &[Item], at: Option<usize>, op: Operator) -> Result<&Value, EvalError> {
    match at.and_then(|i| items.get(i)) {
        Some(Item::Operand(v)) => Ok(v),
        _ => Err(EvalError::Malformed(format!(
            "operator '{}' is missing an operand",
            op.symbol()
        ))),
    }
}

fn fold_level(items: &mut Vec<Item>, level: &[Operator]) -> Result<(), EvalError> {
    while let Some((i, op)) = next_in_level(items, level) {
        match op.variants() {
            Variants::Unary(variants) => {
                let rhs = operand(items, Some(i + 1), op)?;
                let variant = variants
                    .iter()
                    .find(|v| v.operand.admits(rhs))
                    .ok_or_else(|| mismatch(op, &[rhs]))?;
                let result = (variant.apply)(rhs)?;
                items[i] = Item::Operand(result);
                items.remove(i + 1);
            }
            Variants::Binary(variants) => {
                let lhs = operand(items, i.checked_sub(1), op)?;
                let rhs = operand(items, Some(i + 1), op)?;
                let variant = variants
                    .iter()
                    .find(|v| v.lhs.admits(lhs) && v.rhs.admits(rhs))
                    .ok_or_else(|| mismatch(op, &[lhs, rhs]))?;
                let result = (variant.apply)(lhs, rhs)?;
                items[i - 1] = Item::Operand(result);
                items.remove(i + 1);
                items.remove(i);
            }
        }
    }
    Ok(())
}

fn mismatch(op: Operator, operands: &[&Value]) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        operands: operands.iter().map(|v| v.type_name()).collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
