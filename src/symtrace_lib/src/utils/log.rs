//! Operational log messages, i.e. diagnostics about the *run* of the
//! analyzer itself (progress, debug traces) as opposed to the
//! analysis-visible warnings that end up in `SymbolicState::warnings`.

use crossbeam_channel::{Receiver, Sender};

use crate::prelude::*;

/// Severity of a [`LogMessage`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogLevel {
    /// Fine-grained trace output, only emitted when `debug_ip` matches.
    Debug,
    /// Progress / informational output.
    Info,
    /// Something unexpected happened but the run continues.
    Error,
}

/// One message on the operational log channel.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogMessage {
    /// Human-readable text of the message.
    pub text: String,
    /// Severity of the message.
    pub level: LogLevel,
    /// The term (instruction, block, function) the message pertains to, if any.
    pub location: Option<Tid>,
}

impl LogMessage {
    /// Build a new info-level message.
    pub fn new_info<T: ToString>(text: T) -> LogMessage {
        LogMessage {
            text: text.to_string(),
            level: LogLevel::Info,
            location: None,
        }
    }

    /// Build a new error-level message.
    pub fn new_error<T: ToString>(text: T) -> LogMessage {
        LogMessage {
            text: text.to_string(),
            level: LogLevel::Error,
            location: None,
        }
    }

    /// Build a new debug-level message.
    pub fn new_debug<T: ToString>(text: T) -> LogMessage {
        LogMessage {
            text: text.to_string(),
            level: LogLevel::Debug,
            location: None,
        }
    }

    /// Attach a location to the message.
    pub fn location(mut self, tid: Tid) -> LogMessage {
        self.location = Some(tid);
        self
    }
}

/// A `crossbeam_channel`-backed sender for log messages, shared (cheaply
/// cloneable) across the evaluator and the associator so neither has to know
/// who, if anyone, is listening.
pub type LogSender = Sender<LogMessage>;

/// Create a channel for shipping log messages off the hot analysis path.
/// The returned receiver is meant to be drained by a dedicated consumer
/// (see [`LogThread`]) so that producers never block on a slow consumer
/// filling up a bounded channel.
pub fn log_channel() -> (LogSender, Receiver<LogMessage>) {
    crossbeam_channel::unbounded()
}

/// A minimal consumer that drains a log channel and writes each message to
/// stderr until the channel's senders are all dropped. The CLI front end
/// spins this up once per run; library code never constructs one itself.
pub struct LogThread {
    receiver: Receiver<LogMessage>,
}

impl LogThread {
    /// Wrap a receiver end of a [`log_channel`].
    pub fn new(receiver: Receiver<LogMessage>) -> LogThread {
        LogThread { receiver }
    }

    /// Drain all currently queued and future messages, printing each one,
    /// until the channel is closed. Intended to run on its own thread.
    pub fn run(self) {
        for msg in self.receiver.iter() {
            match msg.level {
                LogLevel::Debug => eprintln!("[debug] {}", format_message(&msg)),
                LogLevel::Info => eprintln!("[info] {}", format_message(&msg)),
                LogLevel::Error => eprintln!("[error] {}", format_message(&msg)),
            }
        }
    }
}

fn format_message(msg: &LogMessage) -> String {
    match &msg.location {
        Some(tid) => format!("({}) {}", tid, msg.text),
        None => msg.text.clone(),
    }
}
