use std::io::{self, Write};

use tokio::sync::mpsc::UnboundedSender;

/// Receives each text fragment the moment it is decoded.
///
/// Display is best effort: a sink that cannot write logs and moves on, the
/// accumulated result is unaffected.
pub trait TextSink {
    fn emit(&mut self, fragment: &str);
}

impl<F> TextSink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, fragment: &str) {
        self(fragment);
    }
}

/// Prints fragments to standard output, flushing after each one.
#[derive(Debug)]
pub struct StdoutSink {
    stdout: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSink for StdoutSink {
    fn emit(&mut self, fragment: &str) {
        let mut lock = self.stdout.lock();
        if let Err(e) = lock.write_all(fragment.as_bytes()).and_then(|()| lock.flush()) {
            log::warn!("Failed to write stream fragment to stdout: {e}");
        }
    }
}

/// Forwards fragments to another task.
impl TextSink for UnboundedSender<String> {
    fn emit(&mut self, fragment: &str) {
        if self.send(fragment.to_string()).is_err() {
            log::warn!("Stream fragment receiver dropped, fragment not displayed");
        }
    }
}
