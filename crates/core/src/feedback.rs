use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Info,
    Success,
    Error,
}

/// A human-readable status line emitted by a workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub category: Category,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: Category::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: Category::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: Category::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receiver of workflow feedback.
///
/// Fire-and-forget: `emit` must return promptly and must not fail the caller.
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, feedback: Feedback);
}

/// Writes feedback to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl FeedbackSink for TracingSink {
    fn emit(&self, feedback: Feedback) {
        match feedback.category {
            Category::Info => info!("{}", feedback.message),
            Category::Success => info!("✅ {}", feedback.message),
            Category::Error => error!("❌ {}", feedback.message),
        }
    }
}

/// Forwards feedback into an unbounded channel; dropped receivers are ignored.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Feedback>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Feedback>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FeedbackSink for ChannelSink {
    fn emit(&self, feedback: Feedback) {
        let _ = self.tx.send(feedback);
    }
}

impl<S: FeedbackSink + ?Sized> FeedbackSink for &S {
    fn emit(&self, feedback: Feedback) {
        (**self).emit(feedback)
    }
}
