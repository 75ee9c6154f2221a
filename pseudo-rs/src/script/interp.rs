//! Line-by-line program interpreter.
//!
//! The [`Interpreter`] walks the source lines directly.  For every line it
//! measures the lexical indentation, classifies the text, and hands the
//! [`Statement`] to its handler.  Block structure is reconstructed on the
//! fly from two numbers:
//!
//! - `real`: the line's lexical depth (leading columns ÷ indent width,
//!   rounded up), and
//! - `current`: the logical depth, i.e. the number of blocks that are
//!   actually open and executing.
//!
//! A line executes only when `current == real`.  A line nested under a block
//! whose opener did not fire is deeper than `current` and is skipped.
//! Closers fire when `current > real`, i.e. when the block they end is open.
//! Loops work by jumping back to their opener's line.
//!
//! `get` is the only statement that suspends: it awaits the host's input
//! future.  The loop also yields to the runtime before each line (unless
//! disabled in [`Config`]) and polls [`Host::should_stop`].

use std::fmt;

use tracing::{debug, info, trace};

use super::expand::eval_index;
use super::expr::{eval_condition, eval_str, EvalError};
use super::frame::{BlockKind, Frame, IndentStack};
use super::stmt::{classify, indent_level, Statement};
use super::value::Value;
use crate::config::Config;
use crate::host::Host;
use crate::var::Variables;

// ── RunError ──────────────────────────────────────────────────────────────────

/// Why a run ended early.  Every variant carries the 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// A non-blank line that matches no statement pattern.
    Syntax { line: usize, text: String },
    /// Evaluating one of the line's expressions failed.
    Eval { line: usize, source: EvalError },
    /// A closer (or `ELSE`) ended a block opened by a different keyword.
    UnexpectedCloser {
        line: usize,
        closer: &'static str,
        open: BlockKind,
    },
    /// `get` found no more input.
    InputClosed { line: usize },
    /// The configured step limit was reached.
    StepLimit { line: usize, limit: u64 },
    /// The host asked the run to stop.
    Cancelled { line: usize },
}

impl RunError {
    pub fn line(&self) -> usize {
        match self {
            RunError::Syntax { line, .. }
            | RunError::Eval { line, .. }
            | RunError::UnexpectedCloser { line, .. }
            | RunError::InputClosed { line }
            | RunError::StepLimit { line, .. }
            | RunError::Cancelled { line } => *line,
        }
    }

    /// `true` for a requested stop rather than a program fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled { .. })
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Syntax { line, text } => {
                write!(f, "line {line}: syntax error: unrecognised statement '{text}'")
            }
            RunError::Eval { line, source } => write!(f, "line {line}: {source}"),
            RunError::UnexpectedCloser { line, closer, open } => {
                write!(f, "line {line}: {closer} does not close the open {open} block")
            }
            RunError::InputClosed { line } => write!(f, "line {line}: input closed"),
            RunError::StepLimit { line, limit } => {
                write!(f, "line {line}: step limit of {limit} reached")
            }
            RunError::Cancelled { line } => write!(f, "line {line}: stopped"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Eval { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Attach a line number to an expression error.
fn at(line: usize) -> impl Fn(EvalError) -> RunError {
    move |source| RunError::Eval { line, source }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// What the run loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    Jump(usize),
}

/// Executes one program.  State is reset at the start of every [`run`].
///
/// [`run`]: Interpreter::run
#[derive(Debug)]
pub struct Interpreter {
    lines: Vec<String>,
    /// 1-based line about to execute.
    pc: usize,
    /// Logical depth; `-1` after `END`.
    current: i64,
    /// Lexical depth of the line being executed.
    real: i64,
    stack: IndentStack,
    vars: Variables,
    /// Set by `NEXT` to the `FOR` line it jumps back to, so that `FOR` can
    /// tell a new iteration from a fresh start.
    for_reentry: Option<usize>,
    steps: u64,
    indent_width: usize,
    yield_each_line: bool,
    max_steps: Option<u64>,
}

impl Interpreter {
    pub fn new(src: &str) -> Self {
        Self::with_config(src, &Config::default())
    }

    pub fn with_config(src: &str, config: &Config) -> Self {
        Interpreter {
            lines: src.lines().map(str::to_owned).collect(),
            pc: 1,
            current: 0,
            real: 0,
            stack: IndentStack::new(),
            vars: Variables::new(),
            for_reentry: None,
            steps: 0,
            indent_width: config.indent_width,
            yield_each_line: config.yield_each_line,
            max_steps: config.max_steps,
        }
    }

    /// Variables as left by the last run.
    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Lines executed (including skipped ones) by the last run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn reset(&mut self) {
        self.pc = 1;
        self.current = 0;
        self.real = 0;
        self.stack.reset();
        self.vars = Variables::new();
        self.for_reentry = None;
        self.steps = 0;
    }

    /// Run the program to completion against `host`.
    pub async fn run<H: Host>(&mut self, host: &mut H) -> Result<(), RunError> {
        self.reset();
        info!(lines = self.lines.len(), "program started");

        while self.pc <= self.lines.len() {
            if self.yield_each_line {
                tokio::task::yield_now().await;
            }
            if host.should_stop() {
                info!(line = self.pc, "program stopped");
                return Err(RunError::Cancelled { line: self.pc });
            }
            self.steps += 1;
            if let Some(limit) = self.max_steps {
                if self.steps > limit {
                    return Err(RunError::StepLimit { line: self.pc, limit });
                }
            }

            match self.exec_line(host).await? {
                Step::Next => self.pc += 1,
                Step::Jump(line) => self.pc = line,
            }
        }

        info!(steps = self.steps, "program finished");
        Ok(())
    }

    async fn exec_line<H: Host>(&mut self, host: &mut H) -> Result<Step, RunError> {
        let line = self.pc;
        let text = &self.lines[line - 1];
        let Some(stmt) = classify(text) else {
            if text.trim().is_empty() {
                return Ok(Step::Next);
            }
            return Err(RunError::Syntax { line, text: text.trim().to_owned() });
        };
        self.real = indent_level(text, self.indent_width) as i64;

        debug!(
            line,
            keyword = stmt.keyword(),
            role = ?stmt.role(),
            current = self.current,
            real = self.real,
            "statement"
        );

        match stmt {
            Statement::If { cond } => self.exec_if(&cond),
            Statement::ElseIf { cond } => self.exec_else(Some(cond.as_str())),
            Statement::Else => self.exec_else(None),
            Statement::EndIf => self.exec_endif(),
            Statement::While { cond } => self.exec_while(&cond),
            Statement::EndWhile => self.exec_close_loop(BlockKind::While, "ENDWHILE"),
            Statement::For { var, start, end, step } => {
                self.exec_for(&var, &start, &end, step.as_deref())
            }
            Statement::Next => self.exec_close_loop(BlockKind::For, "NEXT"),
            Statement::Repeat => self.exec_repeat(),
            Statement::Until { cond } => self.exec_until(&cond),
            Statement::Begin => self.exec_begin(),
            Statement::End => self.exec_end(),
            Statement::Display { expr } => self.exec_display(&expr, host),
            Statement::Get { var } => self.exec_get(&var, host).await,
            Statement::Assign { name, index, expr } => {
                self.exec_assign(&name, index.as_deref(), &expr)
            }
        }
    }

    // ── Depth gates ───────────────────────────────────────────────────────────

    fn at_depth(&self) -> bool {
        self.current == self.real
    }

    fn inside(&self) -> bool {
        self.current > self.real
    }

    fn open(&mut self, kind: BlockKind) {
        trace!(line = self.pc, %kind, depth = self.current + 1, "open block");
        self.stack.push(Frame::new(kind, self.pc));
        self.current += 1;
    }

    /// Close the innermost block, which must have been opened by `kind`.
    fn close(&mut self, kind: BlockKind, closer: &'static str) -> Result<Frame, RunError> {
        let open = self.stack.top().kind;
        if open != kind {
            return Err(RunError::UnexpectedCloser { line: self.pc, closer, open });
        }
        let frame = self
            .stack
            .pop()
            .ok_or(RunError::UnexpectedCloser { line: self.pc, closer, open })?;
        self.current -= 1;
        trace!(line = self.pc, %kind, depth = self.current, "close block");
        Ok(frame)
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    fn exec_if(&mut self, cond: &str) -> Result<Step, RunError> {
        if self.at_depth() {
            let taken = eval_condition(cond, &self.vars).map_err(at(self.pc))?;
            // A new chain starts here; later ELSE branches consult this flag.
            self.stack.top_mut().triggered = taken;
            if taken {
                self.open(BlockKind::If);
            }
        }
        Ok(Step::Next)
    }

    /// `ELSE IF cond` (`Some`) or `ELSE` (`None`).
    fn exec_else(&mut self, cond: Option<&str>) -> Result<Step, RunError> {
        let keyword = if cond.is_some() { "ELSE IF" } else { "ELSE" };
        if self.at_depth() {
            if self.stack.top().triggered {
                return Ok(Step::Next);
            }
            let taken = match cond {
                Some(c) => eval_condition(c, &self.vars).map_err(at(self.pc))?,
                None => true,
            };
            if taken {
                self.stack.top_mut().triggered = true;
                self.open(BlockKind::If);
            }
        } else if self.current == self.real + 1 {
            // End of the branch that ran.
            self.close(BlockKind::If, keyword)?;
        }
        Ok(Step::Next)
    }

    fn exec_endif(&mut self) -> Result<Step, RunError> {
        if self.inside() {
            self.close(BlockKind::If, "ENDIF")?;
        }
        if self.at_depth() {
            self.stack.top_mut().triggered = false;
        }
        Ok(Step::Next)
    }

    fn exec_while(&mut self, cond: &str) -> Result<Step, RunError> {
        if self.at_depth() && eval_condition(cond, &self.vars).map_err(at(self.pc))? {
            self.open(BlockKind::While);
        }
        Ok(Step::Next)
    }

    /// `ENDWHILE` / `NEXT`: close the loop and go back to its opener.
    fn exec_close_loop(&mut self, kind: BlockKind, closer: &'static str) -> Result<Step, RunError> {
        if !self.inside() {
            return Ok(Step::Next);
        }
        let frame = self.close(kind, closer)?;
        if kind == BlockKind::For {
            self.for_reentry = Some(frame.begin_line);
        }
        Ok(Step::Jump(frame.begin_line))
    }

    fn exec_for(
        &mut self,
        var: &str,
        start: &str,
        end: &str,
        step: Option<&str>,
    ) -> Result<Step, RunError> {
        let reentry = self.for_reentry.take() == Some(self.pc);
        if !self.at_depth() {
            return Ok(Step::Next);
        }
        let line = self.pc;
        let number = |src: &str, vars: &Variables| -> Result<f64, RunError> {
            let v = eval_str(src, vars).map_err(at(line))?;
            v.as_number().ok_or_else(|| {
                at(line)(EvalError::TypeMismatch { op: "FOR", operands: vec![v.type_name()] })
            })
        };

        let step = match step {
            Some(s) => number(s, &self.vars)?,
            None => 1.0,
        };
        let value = if reentry {
            let prev = self.vars.get_number(var).ok_or_else(|| {
                let found = self.vars.get(var).map_or("nothing", Value::type_name);
                at(line)(EvalError::TypeMismatch { op: "FOR", operands: vec![found] })
            })?;
            prev + step
        } else {
            number(start, &self.vars)?
        };
        self.vars.set(var, Value::Num(value));

        let bound = number(end, &self.vars)?;
        let within = if step < 0.0 { value >= bound } else { value <= bound };
        if within {
            self.open(BlockKind::For);
        }
        Ok(Step::Next)
    }

    fn exec_repeat(&mut self) -> Result<Step, RunError> {
        if self.at_depth() {
            self.open(BlockKind::Repeat);
        }
        Ok(Step::Next)
    }

    fn exec_until(&mut self, cond: &str) -> Result<Step, RunError> {
        if !self.inside() {
            return Ok(Step::Next);
        }
        let frame = self.close(BlockKind::Repeat, "UNTIL")?;
        if eval_condition(cond, &self.vars).map_err(at(self.pc))? {
            Ok(Step::Next)
        } else {
            Ok(Step::Jump(frame.begin_line))
        }
    }

    fn exec_begin(&mut self) -> Result<Step, RunError> {
        self.stack.reset();
        self.current = 0;
        self.open(BlockKind::Begin);
        Ok(Step::Next)
    }

    fn exec_end(&mut self) -> Result<Step, RunError> {
        if self.current >= self.real {
            trace!(line = self.pc, "end of program body");
            self.stack.reset();
            self.current = -1;
        }
        Ok(Step::Next)
    }

    fn exec_display<H: Host>(&mut self, expr: &str, host: &mut H) -> Result<Step, RunError> {
        if self.at_depth() {
            let value = eval_str(expr, &self.vars).map_err(at(self.pc))?;
            host.emit(&value.to_string());
        }
        Ok(Step::Next)
    }

    async fn exec_get<H: Host>(&mut self, var: &str, host: &mut H) -> Result<Step, RunError> {
        if !self.at_depth() {
            return Ok(Step::Next);
        }
        let line = host
            .request_input(var)
            .await
            .ok_or(RunError::InputClosed { line: self.pc })?;
        let text = line.trim_end_matches(['\r', '\n']);
        self.vars.set(var, Value::Str(text.to_owned()));
        Ok(Step::Next)
    }

    fn exec_assign(&mut self, name: &str, index: Option<&str>, expr: &str) -> Result<Step, RunError> {
        if !self.at_depth() {
            return Ok(Step::Next);
        }
        let line = self.pc;
        let value = eval_str(expr, &self.vars).map_err(at(line))?;
        let Some(index) = index else {
            self.vars.set(name, value);
            return Ok(Step::Next);
        };

        if !value.is_scalar() {
            return Err(at(line)(EvalError::Malformed("array elements must be scalars".into())));
        }
        let i = eval_index(name, index, &self.vars).map_err(at(line))?;
        match self.vars.get_mut(name) {
            Some(Value::Array(items)) if i < items.len() => items[i] = value,
            Some(Value::Array(items)) if i == items.len() => items.push(value),
            Some(Value::Array(items)) => {
                let len = items.len();
                return Err(at(line)(EvalError::IndexOutOfBounds {
                    name: name.to_owned(),
                    index: i,
                    len,
                }));
            }
            Some(other) => {
                let found = other.type_name();
                return Err(at(line)(EvalError::NotAnArray { name: name.to_owned(), found }));
            }
            None if i == 0 => self.vars.set(name, Value::Array(vec![value])),
            None => return Err(at(line)(EvalError::UndefinedVariable(name.to_owned()))),
        }
        Ok(Step::Next)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
