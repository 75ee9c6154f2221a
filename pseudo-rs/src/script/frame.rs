//! Block nesting state.
//!
//! The interpreter never builds a tree; it keeps one [`Frame`] per open
//! block, pushed by an opener that fires and popped by its closer.  The
//! stack always holds a base frame for the program itself, which is never
//! popped, so `depth()` is the logical indentation of the innermost open
//! block.

use std::fmt;

/// What opened a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Program,
    Begin,
    If,
    While,
    For,
    Repeat,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockKind::Program => "program",
            BlockKind::Begin => "BEGIN",
            BlockKind::If => "IF",
            BlockKind::While => "WHILE",
            BlockKind::For => "FOR",
            BlockKind::Repeat => "REPEAT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: BlockKind,
    /// 1-based line of the opener; loop closers jump back here.
    pub begin_line: usize,
    /// An `IF` chain directly inside this block has already taken a branch,
    /// so later `ELSE IF` / `ELSE` lines of that chain must stay closed.
    pub triggered: bool,
}

impl Frame {
    pub fn new(kind: BlockKind, begin_line: usize) -> Self {
        Frame { kind, begin_line, triggered: false }
    }
}

/// Stack of open blocks over a permanent base frame.
#[derive(Debug, Clone)]
pub struct IndentStack {
    frames: Vec<Frame>,
}

impl Default for IndentStack {
    fn default() -> Self {
        Self::new()
    }
}

impl IndentStack {
    pub fn new() -> Self {
        IndentStack { frames: vec![Frame::new(BlockKind::Program, 0)] }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the innermost block.  Returns `None` when only the base frame is
    /// left.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Innermost frame; the base frame when no block is open.
    pub fn top(&self) -> &Frame {
        // The base frame is never removed.
        &self.frames[self.frames.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Discard every open block, keeping the base frame.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
        self.frames[0].triggered = false;
    }

    /// Number of open blocks above the base frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_frame_is_never_popped() {
        let mut stack = IndentStack::new();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.top().kind, BlockKind::Program);
    }

    #[test]
    fn push_pop() {
        let mut stack = IndentStack::new();
        stack.push(Frame::new(BlockKind::While, 3));
        stack.push(Frame::new(BlockKind::If, 4));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().map(|f| f.kind), Some(BlockKind::If));
        assert_eq!(stack.top().begin_line, 3);
    }

    #[test]
    fn triggered_flag_on_top() {
        let mut stack = IndentStack::new();
        stack.top_mut().triggered = true;
        assert!(stack.top().triggered);
        stack.push(Frame::new(BlockKind::If, 1));
        assert!(!stack.top().triggered);
    }

    #[test]
    fn reset_keeps_base() {
        let mut stack = IndentStack::new();
        stack.top_mut().triggered = true;
        stack.push(Frame::new(BlockKind::Repeat, 2));
        stack.push(Frame::new(BlockKind::For, 5));
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert!(!stack.top().triggered);
    }

    #[test]
    fn kind_display() {
        assert_eq!(BlockKind::While.to_string(), "WHILE");
        assert_eq!(BlockKind::Program.to_string(), "program");
    }
}
