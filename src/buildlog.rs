//! Platform-facing build log.
//!
//! The platform's observability contract requires every diagnostic to go to
//! stdout (never to files), in the classic buildpack protocol: step lines
//! prefixed with `----->`, warnings and errors with a bold header, and
//! continuation lines indented. Every line is also recorded in order so the
//! pipeline can return it as part of the terminal `BuildOutcome`.
//!
//! This is deliberately separate from the `tracing` operator diagnostics on
//! stderr: the build log is an output format consumed by deployment tooling
//! and by humans reading build output, not an operator log.

use std::sync::{Arc, Mutex};

const STEP_PREFIX: &str = "----->";
const MSG_PREFIX: &str = "      ";
const WARNING_HEADER: &str = "       **WARNING**";
const ERROR_HEADER: &str = "       **ERROR**";

/// Ordered, shareable sink for build diagnostics.
///
/// Cloning is cheap; all clones append to the same line buffer. The hook
/// runner's stream-drain tasks hold clones across task boundaries.
#[derive(Debug, Clone)]
pub struct BuildLog {
    lines: Arc<Mutex<Vec<String>>>,
    debug: bool,
    quiet: bool,
}

impl BuildLog {
    pub fn new(debug: bool) -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            debug,
            quiet: false,
        }
    }

    /// A log that records lines without printing them. Used by tests.
    pub fn silent(debug: bool) -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            debug,
            quiet: true,
        }
    }

    /// Stage-start line: `-----> message`.
    pub fn begin_step(&self, msg: impl AsRef<str>) {
        self.emit(STEP_PREFIX, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.emit(MSG_PREFIX, msg.as_ref());
    }

    pub fn warning(&self, msg: impl AsRef<str>) {
        self.emit(WARNING_HEADER, msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.emit(ERROR_HEADER, msg.as_ref());
    }

    /// Emitted only when the platform debug flag is set.
    pub fn debug(&self, msg: impl AsRef<str>) {
        if self.debug {
            self.emit("       DEBUG:", msg.as_ref());
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// The ordered diagnostic lines emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn emit(&self, header: &str, msg: &str) {
        // Continuation lines keep the protocol's indentation.
        let msg = msg.replace('\n', "\n       ");
        let line = format!("{} {}", header, msg);
        if !self.quiet {
            println!("{}", line);
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}
