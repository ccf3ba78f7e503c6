use std::io::{self, Write};

/// Destination for the human-readable lines some instructions emit.
pub trait OutputSink {
    fn emit(&mut self, line: &str);
}

/// Captures emitted lines in order.
impl OutputSink for Vec<String> {
    fn emit(&mut self, line: &str) {
        self.push(String::from(line));
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _line: &str) {}
}

/// Writes each line to stdout, optionally behind a fixed prefix.
#[derive(Clone, Debug, Default)]
pub struct StdoutSink {
    prefix: Option<String>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(String::from(prefix)),
        }
    }
}

impl OutputSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        let mut stdout = io::stdout().lock();
        let result = match &self.prefix {
            Some(prefix) => writeln!(stdout, "{} {}", prefix, line),
            None => writeln!(stdout, "{}", line),
        };
        if let Err(err) = result {
            tracing::warn!("failed to write instruction output: {}", err);
        }
    }
}
