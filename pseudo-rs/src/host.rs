//! The interpreter's view of the outside world.
//!
//! A running program talks to its embedder through three calls on [`Host`]:
//! emit a line of output, ask for a line of input, and check whether it has
//! been asked to stop.  Three implementations live here:
//!
//! - [`ConsoleHost`]: stdout and stdin, used by the `pseudo` binary.
//! - [`ChannelHost`]: forwards everything over a tokio channel, for
//!   embedding the interpreter under a UI task.
//! - [`ScriptedHost`]: canned input and captured output, for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

// ── Host trait ────────────────────────────────────────────────────────────────

pub trait Host {
    /// Deliver one line of program output.
    fn emit(&mut self, line: &str);

    /// Wait for one line of input.  `None` means no more input will come.
    fn request_input(&mut self, prompt: &str) -> impl Future<Output = Option<String>> + Send;

    /// Polled before every line; returning `true` cancels the run.
    fn should_stop(&mut self) -> bool;
}

// ── StopHandle ────────────────────────────────────────────────────────────────

/// Shared cancellation flag.  Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── ConsoleHost ───────────────────────────────────────────────────────────────

/// Host bound to the process's stdin and stdout.
///
/// Input prompts are only printed when stdin is a terminal, so piped input
/// produces clean output.
pub struct ConsoleHost {
    input_prompt: String,
    interactive: bool,
    lines: Option<mpsc::Receiver<String>>,
    stop: StopHandle,
}

impl ConsoleHost {
    /// `input_prompt` is appended to the variable name when prompting.
    pub fn new(input_prompt: impl Into<String>) -> Self {
        // SAFETY: isatty only inspects the descriptor.
        let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 };
        ConsoleHost {
            input_prompt: input_prompt.into(),
            interactive,
            lines: None,
            stop: StopHandle::new(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Start the stdin reader on first use.
    ///
    /// Stdin is read on a dedicated thread that owns the handle and forwards
    /// lines over a channel; the thread ends at EOF or when the receiver is
    /// dropped.
    fn reader(&mut self) -> &mut mpsc::Receiver<String> {
        self.lines.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel::<String>(16);
            std::thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        })
    }
}

impl Host for ConsoleHost {
    fn emit(&mut self, line: &str) {
        println!("{line}");
    }

    async fn request_input(&mut self, prompt: &str) -> Option<String> {
        if self.interactive {
            let mut out = std::io::stdout().lock();
            // A failed prompt write must not prevent reading the answer.
            let _ = write!(out, "{prompt}{}", self.input_prompt);
            let _ = out.flush();
        }
        let line = self.reader().recv().await;
        if line.is_none() {
            debug!("stdin closed");
        }
        line
    }

    fn should_stop(&mut self) -> bool {
        self.stop.is_stopped()
    }
}

// ── ChannelHost ───────────────────────────────────────────────────────────────

/// Message from a running program to whoever holds the receiving end of a
/// [`ChannelHost`].
#[derive(Debug)]
pub enum HostEvent {
    Output(String),
    /// The program is suspended until `reply` receives a line.  Dropping
    /// `reply` ends input.
    Input {
        prompt: String,
        reply: oneshot::Sender<String>,
    },
}

/// Host that forwards output and input requests over an unbounded channel.
///
/// The run stops on its own once the receiving side is dropped.
pub struct ChannelHost {
    events: mpsc::UnboundedSender<HostEvent>,
    stop: StopHandle,
}

impl ChannelHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (ChannelHost { events, stop: StopHandle::new() }, rx)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl Host for ChannelHost {
    fn emit(&mut self, line: &str) {
        // Nobody listening: the next stop poll ends the run.
        let _ = self.events.send(HostEvent::Output(line.to_owned()));
    }

    async fn request_input(&mut self, prompt: &str) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        self.events
            .send(HostEvent::Input { prompt: prompt.to_owned(), reply })
            .ok()?;
        answer.await.ok()
    }

    fn should_stop(&mut self) -> bool {
        self.stop.is_stopped() || self.events.is_closed()
    }
}

// ── ScriptedHost ──────────────────────────────────────────────────────────────

/// Host with canned input that records everything the program does.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    inputs: VecDeque<String>,
    /// Emitted lines, in order.
    pub output: Vec<String>,
    /// Prompts passed to `request_input`, in order.
    pub prompts: Vec<String>,
    stop_after: Option<usize>,
    polls: usize,
    stop: StopHandle,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedHost {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Answer `false` to the first `polls` stop checks, then `true`.
    pub fn stop_after(mut self, polls: usize) -> Self {
        self.stop_after = Some(polls);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of times `should_stop` has been called.
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Host for ScriptedHost {
    fn emit(&mut self, line: &str) {
        self.output.push(line.to_owned());
    }

    async fn request_input(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_owned());
        self.inputs.pop_front()
    }

    fn should_stop(&mut self) -> bool {
        self.polls += 1;
        self.stop.is_stopped() || self.stop_after.is_some_and(|n| self.polls > n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
