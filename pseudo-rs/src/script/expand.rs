//! Variable substitution.
//!
//! Runs between tokenizing and evaluating a capture:
//!
//! | Token            | Replaced by                                        |
//! |------------------|----------------------------------------------------|
//! | `name`           | the bound value of `name`, if any                  |
//! | `name[expr]`     | element `expr` of the array bound to `name`        |
//! | `{a, b}`         | the same list with each element substituted        |
//!
//! `AND`, `OR`, `NOT`, `true` and `false` are never looked up, so a variable
//! cannot shadow them.  An unbound plain identifier is left alone; the
//! evaluator turns it into a string.  An unbound *indexed* identifier is an
//! error, since there is nothing sensible to index.
//!
//! Substituted strings are re-read as literals (see [`Value::reread`]): a
//! variable holding `"12"` enters the expression as the number 12.

use super::expr::{eval_str, EvalContext, EvalError};
use super::token::Token;
use super::value::Value;

/// Substitute bound variables into `tokens`.
pub fn substitute(tokens: Vec<Token>, ctx: &dyn EvalContext) -> Result<Vec<Token>, EvalError> {
    tokens.into_iter().map(|tok| substitute_one(tok, ctx)).collect()
}

fn substitute_one(tok: Token, ctx: &dyn EvalContext) -> Result<Token, EvalError> {
    match tok {
        Token::Ident(name) if !is_reserved(&name) => Ok(match ctx.get_var(&name) {
            Some(v) => Token::Value(v.clone().reread()),
            None => Token::Ident(name),
        }),
        Token::Indexed { name, index } => {
            element(&name, &index, ctx).map(|v| Token::Value(v.reread()))
        }
        Token::List(elements) => elements
            .into_iter()
            .map(|e| substitute(e, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Token::List),
        other => Ok(other),
    }
}

/// Words the evaluator gives a fixed meaning.
pub fn is_reserved(word: &str) -> bool {
    matches!(word, "AND" | "OR" | "NOT" | "true" | "false")
}

/// Evaluate a subscript expression to an array position.
pub fn eval_index(name: &str, index: &str, ctx: &dyn EvalContext) -> Result<usize, EvalError> {
    eval_str(index, ctx)?.as_index().ok_or_else(|| EvalError::BadIndex {
        name: name.to_owned(),
        index: index.trim().to_owned(),
    })
}

fn element(name: &str, index: &str, ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    let target = ctx
        .get_var(name)
        .ok_or_else(|| EvalError::UndefinedVariable(name.to_owned()))?;
    let Value::Array(items) = target else {
        return Err(EvalError::NotAnArray {
            name: name.to_owned(),
            found: target.type_name(),
        });
    };
    let i = eval_index(name, index, ctx)?;
    items.get(i).cloned().ok_or(EvalError::IndexOutOfBounds {
        name: name.to_owned(),
        index: i,
        len: items.len(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::token::tokenize;
    use crate::var::Variables;

    fn vars() -> Variables {
        let mut v = Variables::new();
        v.set("x", Value::Num(3.0));
        v.set("AND", Value::Num(1.0));
        v.set("a", Value::Array(vec!["p".into(), "q".into(), "r".into()]));
        v
    }

    #[test]
    fn bound_identifier_becomes_value() {
        let out = substitute(tokenize("x"), &vars()).unwrap();
        assert_eq!(out, vec![Token::Value(Value::Num(3.0))]);
    }

    #[test]
    fn stored_text_is_reread() {
        let mut v = vars();
        v.set("n", Value::Str("7".into()));
        v.set("ok", Value::Str("false".into()));
        v.set("digits", Value::Array(vec!["5".into()]));
        let out = substitute(tokenize("n ok digits[0]"), &v).unwrap();
        assert_eq!(
            out,
            vec![
                Token::Value(Value::Num(7.0)),
                Token::Value(Value::Bool(false)),
                Token::Value(Value::Num(5.0)),
            ]
        );
        let out = substitute(tokenize("a[0]"), &v).unwrap();
        assert_eq!(out, vec![Token::Value(Value::Str("p".into()))]);
    }

    #[test]
    fn unbound_identifier_is_kept() {
        let out = substitute(tokenize("y"), &vars()).unwrap();
        assert_eq!(out, vec![Token::Ident("y".into())]);
    }

    #[test]
    fn reserved_words_are_not_looked_up() {
        let out = substitute(tokenize("AND"), &vars()).unwrap();
        assert_eq!(out, vec![Token::Ident("AND".into())]);
    }

    #[test]
    fn indexed_lookup_evaluates_subscript() {
        let out = substitute(tokenize("a[x - 1]"), &vars()).unwrap();
        assert_eq!(out, vec![Token::Value(Value::Str("r".into()))]);
    }

    #[test]
    fn indexed_errors() {
        let v = vars();
        assert_eq!(
            substitute(tokenize("b[0]"), &v),
            Err(EvalError::UndefinedVariable("b".into()))
        );
        assert!(matches!(
            substitute(tokenize("x[0]"), &v),
            Err(EvalError::NotAnArray { found: "number", .. })
        ));
        assert!(matches!(
            substitute(tokenize("a[3]"), &v),
            Err(EvalError::IndexOutOfBounds { index: 3, len: 3, .. })
        ));
        assert!(matches!(substitute(tokenize("a[0.5]"), &v), Err(EvalError::BadIndex { .. })));
    }

    #[test]
    fn list_elements_are_substituted() {
        let out = substitute(tokenize("{x, 1}"), &vars()).unwrap();
        assert_eq!(
            out,
            vec![Token::List(vec![
                vec![Token::Value(Value::Num(3.0))],
                vec![Token::Number("1".into())],
            ])]
        );
    }
}
