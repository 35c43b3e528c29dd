use crate::core::metrics::render_line;
use crate::core::model::ProgressReport;
use crate::i18n::Messages;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// The continuously redrawn console line.
pub struct ProgressLine {
    bar: ProgressBar,
}

impl ProgressLine {
    pub fn stdout() -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
        let style = ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }

    /// Console log output that clears the bar, writes, and redraws it below.
    pub fn log_writer(&self) -> BarWriter<fn() -> io::Stdout> {
        self.writer_to(io::stdout as fn() -> io::Stdout)
    }

    pub fn writer_to<M>(&self, inner: M) -> BarWriter<M> {
        BarWriter { bar: self.bar.clone(), inner }
    }

    pub fn set_name(&self, name: &str) {
        self.bar.set_prefix(name.to_string());
    }

    pub fn update(&self, report: &ProgressReport, msgs: &Messages) {
        self.bar.set_position(report.percent as u64);
        self.bar.set_message(render_line(report, msgs));
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// `MakeWriter` for the console log layer. Log lines never tear the bar.
pub struct BarWriter<M> {
    bar: ProgressBar,
    inner: M,
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for BarWriter<M> {
    type Writer = Suspended<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Suspended { bar: &self.bar, inner: self.inner.make_writer() }
    }
}

pub struct Suspended<'a, W> {
    bar: &'a ProgressBar,
    inner: W,
}

impl<W: Write> Write for Suspended<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
