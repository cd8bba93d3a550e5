//! Single-line progress reporting
//!
//! One carriage-return-overwritten line per iteration, a newline-terminated
//! summary at the end of each phase. The sink is injectable so tests can
//! capture output.

use std::io::{self, Write};

pub(crate) struct ProgressLine {
    out: Box<dyn Write>,
}

impl ProgressLine {
    pub(crate) fn stdout() -> Self {
        Self {
            out: Box::new(io::stdout()),
        }
    }

    #[cfg(test)]
    pub(crate) fn sink() -> Self {
        Self {
            out: Box::new(io::sink()),
        }
    }

    /// Overwrite the current line with a training step report.
    pub(crate) fn train_step(&mut self, step: usize, loss: f32, accuracy: f32) -> io::Result<()> {
        write!(
            self.out,
            "\rstep: {step:4} | loss: {loss:2.6}, accuracy: {:3.2}%",
            100.0 * accuracy
        )?;
        self.out.flush()
    }

    /// Overwrite the current line with an evaluation step report.
    pub(crate) fn eval_step(&mut self, step: usize, accuracy: f32) -> io::Result<()> {
        write!(
            self.out,
            "\r[EVAL] step: {step:4} | accuracy: {:3.2}%",
            100.0 * accuracy
        )?;
        self.out.flush()
    }

    /// Terminate the in-progress line.
    pub(crate) fn newline(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Newline-terminated phase summary.
    pub(crate) fn summary(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }
}
