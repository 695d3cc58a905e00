//! Append-only message sinks for progress and diagnostic output.

use std::sync::Mutex;

/// Receives progress text, optionally with a table of rows.
pub trait LogSink: Send + Sync {
    fn emit(&self, text: &str, table: Option<&[Vec<String>]>);
}

/// Forwards messages to `tracing` at info level.
///
/// Long lines are truncated with an ellipsis and long tables are cut after
/// `line_limit` rows.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    pub line_wrap: usize,
    pub line_limit: usize,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self {
            line_wrap: 240,
            line_limit: 256,
        }
    }
}

const ELLIPSIS: &str = "...";

impl TracingSink {
    fn truncate(&self, line: &str) -> String {
        let keep = self.line_wrap.saturating_sub(ELLIPSIS.len());
        if line.chars().count() <= keep {
            line.to_string()
        } else {
            let mut ans: String = line.chars().take(keep).collect();
            ans.push_str(ELLIPSIS);
            ans
        }
    }

    fn lines(&self, text: &str, table: Option<&[Vec<String>]>) -> Vec<String> {
        let mut ans: Vec<String> = text
            .lines()
            .take(self.line_limit)
            .map(|l| self.truncate(l))
            .collect();
        if text.lines().count() > self.line_limit {
            ans.push(ELLIPSIS.to_string());
        }
        if let Some(rows) = table {
            ans.extend(
                rows.iter()
                    .take(self.line_limit)
                    .map(|r| self.truncate(&r.join(","))),
            );
            if rows.len() > self.line_limit {
                ans.push(ELLIPSIS.to_string());
            }
        }
        ans
    }
}

impl LogSink for TracingSink {
    fn emit(&self, text: &str, table: Option<&[Vec<String>]>) {
        for line in self.lines(text, table) {
            info!("{}", line);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub table: Option<Vec<Vec<String>>>,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, text: &str, table: Option<&[Vec<String>]>) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(Message {
                text: text.to_string(),
                table: table.map(|t| t.to_vec()),
            });
        }
    }
}
