//! Line classifier.
//!
//! A pseudocode program is a sequence of lines.  Each non-blank line is
//! matched, after trimming, against an ordered table of patterns; the first
//! match decides the [`Statement`].  Nothing is parsed ahead of time: the
//! interpreter classifies each line as it reaches it.
//!
//! Keywords are case-sensitive.  Note that `FOR` uses a lower-case `to`.
//!
//! ```text
//! IF cond THEN            ELSE IF cond THEN       ELSE        ENDIF
//! WHILE cond              ENDWHILE
//! FOR i = a to b [STEP s] NEXT [i]
//! REPEAT                  UNTIL cond
//! BEGIN                   END
//! display expr            get name                name[index] = expr
//! ```

use std::sync::OnceLock;

use regex::{Captures, Regex};

// ── Statement ─────────────────────────────────────────────────────────────────

/// A classified line.  Expression fields hold raw source text; they are
/// substituted and evaluated only when the interpreter needs them.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    If { cond: String },
    ElseIf { cond: String },
    Else,
    EndIf,
    While { cond: String },
    EndWhile,
    /// `FOR var = start to end [STEP step]`
    For {
        var: String,
        start: String,
        end: String,
        step: Option<String>,
    },
    Next,
    Repeat,
    Until { cond: String },
    Begin,
    End,
    Display { expr: String },
    Get { var: String },
    /// `name = expr` or `name[index] = expr`
    Assign {
        name: String,
        index: Option<String>,
        expr: String,
    },
}

/// How a statement affects block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Opener,
    Mid,
    Closer,
    Plain,
}

impl Statement {
    pub fn role(&self) -> Role {
        match self {
            Statement::If { .. }
            | Statement::While { .. }
            | Statement::For { .. }
            | Statement::Repeat
            | Statement::Begin => Role::Opener,
            Statement::ElseIf { .. } | Statement::Else => Role::Mid,
            Statement::EndIf
            | Statement::EndWhile
            | Statement::Next
            | Statement::Until { .. }
            | Statement::End => Role::Closer,
            Statement::Display { .. } | Statement::Get { .. } | Statement::Assign { .. } => {
                Role::Plain
            }
        }
    }

    /// Leading keyword, for diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::If { .. } => "IF",
            Statement::ElseIf { .. } => "ELSE IF",
            Statement::Else => "ELSE",
            Statement::EndIf => "ENDIF",
            Statement::While { .. } => "WHILE",
            Statement::EndWhile => "ENDWHILE",
            Statement::For { .. } => "FOR",
            Statement::Next => "NEXT",
            Statement::Repeat => "REPEAT",
            Statement::Until { .. } => "UNTIL",
            Statement::Begin => "BEGIN",
            Statement::End => "END",
            Statement::Display { .. } => "display",
            Statement::Get { .. } => "get",
            Statement::Assign { .. } => "assignment",
        }
    }
}

// ── Pattern table ─────────────────────────────────────────────────────────────

type Build = fn(&Captures<'_>) -> Statement;

const PATTERNS: &[(&str, Build)] = &[
    (r"^IF\s+(.+?)\s+THEN$", build_if),
    (r"^ELSE\s+IF\s+(.+?)\s+THEN$", build_else_if),
    (r"^ELSE$", |_| Statement::Else),
    (r"^ENDIF$", |_| Statement::EndIf),
    (r"^WHILE\s+(.+)$", build_while),
    (r"^ENDWHILE$", |_| Statement::EndWhile),
    (
        r"^FOR\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+?)\s+to\s+(.+?)(?:\s+STEP\s+(.+))?$",
        build_for,
    ),
    (r"^NEXT(?:\s+[A-Za-z_][A-Za-z0-9_]*)?$", |_| Statement::Next),
    (r"^REPEAT$", |_| Statement::Repeat),
    (r"^UNTIL\s+(.+)$", build_until),
    (r"^BEGIN$", |_| Statement::Begin),
    (r"^END$", |_| Statement::End),
    (r"^display\s+(.+)$", build_display),
    (r"^get\s+([A-Za-z_][A-Za-z0-9_]*)$", build_get),
    (r"^([A-Za-z_][A-Za-z0-9_]*)(?:\[(.+?)\])?\s*=([^=].*)$", build_assign),
];

fn build_if(c: &Captures<'_>) -> Statement {
    Statement::If { cond: group(c, 1) }
}

fn build_else_if(c: &Captures<'_>) -> Statement {
    Statement::ElseIf { cond: group(c, 1) }
}

fn build_while(c: &Captures<'_>) -> Statement {
    Statement::While { cond: group(c, 1) }
}

fn build_for(c: &Captures<'_>) -> Statement {
    Statement::For {
        var: group(c, 1),
        start: group(c, 2),
        end: group(c, 3),
        step: optional_group(c, 4),
    }
}

fn build_until(c: &Captures<'_>) -> Statement {
    Statement::Until { cond: group(c, 1) }
}

fn build_display(c: &Captures<'_>) -> Statement {
    Statement::Display { expr: group(c, 1) }
}

fn build_get(c: &Captures<'_>) -> Statement {
    Statement::Get { var: group(c, 1) }
}

fn build_assign(c: &Captures<'_>) -> Statement {
    Statement::Assign {
        name: group(c, 1),
        index: optional_group(c, 2),
        expr: group(c, 3),
    }
}

fn optional_group(c: &Captures<'_>, i: usize) -> Option<String> {
    c.get(i).map(|m| m.as_str().trim().to_owned())
}

fn group(c: &Captures<'_>, i: usize) -> String {
    c.get(i).map_or_else(String::new, |m| m.as_str().trim().to_owned())
}

fn table() -> &'static [(Regex, Build)] {
    static TABLE: OnceLock<Vec<(Regex, Build)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|&(src, build)| Regex::new(src).ok().map(|re| (re, build)))
            .collect()
    })
}

/// Classify one source line.  Blank or unrecognised text yields `None`.
pub fn classify(line: &str) -> Option<Statement> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }
    table()
        .iter()
        .find_map(|(re, build)| re.captures(text).map(|c| build(&c)))
}

// ── Indentation ───────────────────────────────────────────────────────────────

/// Unicode spaces that editors paste in place of ordinary indentation.
fn is_wide_space(c: char) -> bool {
    matches!(c, '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}')
}

/// Lexical depth of `line`: leading columns divided by `width`, rounded up.
/// A tab counts as `width` columns.
pub fn indent_level(line: &str, width: usize) -> usize {
    let width = width.max(1);
    let mut columns = 0usize;
    for c in line.chars() {
        match c {
            '\t' => columns += width,
            ' ' => columns += 1,
            c if is_wide_space(c) => columns += 1,
            _ => break,
        }
    }
    columns.div_ceil(width)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        assert_eq!(table().len(), PATTERNS.len());
    }

    #[test]
    fn if_family() {
        assert_eq!(classify("IF x > 3 THEN"), Some(Statement::If { cond: "x > 3".into() }));
        assert_eq!(
            classify("  ELSE IF x == 1 THEN"),
            Some(Statement::ElseIf { cond: "x == 1".into() })
        );
        assert_eq!(classify("ELSE"), Some(Statement::Else));
        assert_eq!(classify("ENDIF"), Some(Statement::EndIf));
    }

    #[test]
    fn loops() {
        assert_eq!(classify("WHILE i < 10"), Some(Statement::While { cond: "i < 10".into() }));
        assert_eq!(classify("ENDWHILE"), Some(Statement::EndWhile));
        assert_eq!(classify("REPEAT"), Some(Statement::Repeat));
        assert_eq!(classify("UNTIL done"), Some(Statement::Until { cond: "done".into() }));
    }

    #[test]
    fn for_with_and_without_step() {
        assert_eq!(
            classify("FOR i = 1 to 10 STEP 2"),
            Some(Statement::For {
                var: "i".into(),
                start: "1".into(),
                end: "10".into(),
                step: Some("2".into()),
            })
        );
        assert_eq!(
            classify("FOR k=n - 1 to 0 STEP -1"),
            Some(Statement::For {
                var: "k".into(),
                start: "n - 1".into(),
                end: "0".into(),
                step: Some("-1".into()),
            })
        );
        assert_eq!(
            classify("FOR i = 1 to 3"),
            Some(Statement::For {
                var: "i".into(),
                start: "1".into(),
                end: "3".into(),
                step: None,
            })
        );
        assert_eq!(classify("NEXT"), Some(Statement::Next));
        assert_eq!(classify("NEXT i"), Some(Statement::Next));
    }

    #[test]
    fn plain_statements() {
        assert_eq!(
            classify("display \"hi\" + x"),
            Some(Statement::Display { expr: "\"hi\" + x".into() })
        );
        assert_eq!(classify("get name"), Some(Statement::Get { var: "name".into() }));
        assert_eq!(
            classify("total = total + 1"),
            Some(Statement::Assign {
                name: "total".into(),
                index: None,
                expr: "total + 1".into(),
            })
        );
        assert_eq!(
            classify("a[i + 1] = 0"),
            Some(Statement::Assign {
                name: "a".into(),
                index: Some("i + 1".into()),
                expr: "0".into(),
            })
        );
    }

    #[test]
    fn roles() {
        assert_eq!(classify("BEGIN").map(|s| s.role()), Some(Role::Opener));
        assert_eq!(classify("END").map(|s| s.role()), Some(Role::Closer));
        assert_eq!(classify("ELSE").map(|s| s.role()), Some(Role::Mid));
        assert_eq!(classify("x = 1").map(|s| s.role()), Some(Role::Plain));
    }

    #[test]
    fn unrecognised() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
        assert_eq!(classify("if x then"), None);
        assert_eq!(classify("x == 3"), None);
        assert_eq!(classify("IF x"), None);
        assert_eq!(classify("display"), None);
        assert_eq!(classify("ENDIFX"), None);
    }

    #[test]
    fn indentation() {
        assert_eq!(indent_level("x = 1", 4), 0);
        assert_eq!(indent_level("    x = 1", 4), 1);
        assert_eq!(indent_level("  x = 1", 4), 1);
        assert_eq!(indent_level("     x = 1", 4), 2);
        assert_eq!(indent_level("\t\tx = 1", 4), 2);
        assert_eq!(indent_level("\u{00A0}\u{00A0}\u{00A0}\u{00A0}x", 4), 1);
        assert_eq!(indent_level("\u{3000}x", 2), 1);
        assert_eq!(indent_level("", 4), 0);
    }
}
