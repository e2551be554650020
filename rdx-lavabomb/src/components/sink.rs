//! Renders the emitter's line stream.

use crate::common::Cadence;
use crate::error::{LavaError, Result};
use crate::events::NoiseLine;
use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Anything that can display a [`NoiseLine`].
pub trait NoiseSink: Send + 'static {
    /// Renders one line.
    ///
    /// # Errors
    ///
    /// Returns [`LavaError::Render`] if the line could not be written.
    fn render(&mut self, line: &NoiseLine) -> Result<()>;
}

/// Collects rendered lines in memory.
impl NoiseSink for Vec<String> {
    fn render(&mut self, line: &NoiseLine) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes one line per noise to any [`Write`] implementor.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    color: bool,
}

impl WriterSink<io::Stdout> {
    /// The console sink.
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout()).with_color(color)
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            color: false,
        }
    }

    /// Highlights minute and hour noises.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &NoiseLine) -> io::Result<()> {
        if self.color {
            writeln!(self.writer, "{}  ...  {}", line.tick, paint(line))?;
        } else {
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()
    }
}

impl<W: Write + Send + 'static> NoiseSink for WriterSink<W> {
    fn render(&mut self, line: &NoiseLine) -> Result<()> {
        self.write_line(line).map_err(LavaError::Render)
    }
}

fn paint(line: &NoiseLine) -> ColoredString {
    match line.cadence {
        Cadence::Second => line.message.as_str().normal(),
        Cadence::Minute => line.message.as_str().yellow().bold(),
        Cadence::Hour => line.message.as_str().red().bold(),
    }
}

/// What the printer did before the stream closed.
#[derive(Debug)]
pub struct PrintReport<S> {
    /// The sink, handed back to the caller.
    pub sink: S,
    pub rendered: usize,
    pub failed: usize,
}

/// Consumes the line stream and renders each line as it arrives.
pub struct Printer<S> {
    sink: S,
}

impl<S: NoiseSink> Printer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Renders until the stream closes.
    ///
    /// A line that fails to render is logged and dropped; it does not stop
    /// the printer.
    pub async fn run(mut self, mut lines: mpsc::Receiver<NoiseLine>) -> PrintReport<S> {
        let mut rendered = 0;
        let mut failed = 0;
        while let Some(line) = lines.recv().await {
            match self.sink.render(&line) {
                Ok(()) => rendered += 1,
                Err(err) => {
                    warn!("Dropping line #{}: {}", line.tick, err);
                    failed += 1;
                }
            }
        }
        debug!("Printer finished: {} rendered, {} failed.", rendered, failed);
        PrintReport {
            sink: self.sink,
            rendered,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl NoiseSink for BrokenSink {
        fn render(&mut self, _line: &NoiseLine) -> Result<()> {
            Err(LavaError::Render(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "closed",
            )))
        }
    }

    #[test]
    fn writer_sink_writes_one_line_per_noise() {
        let mut sink = WriterSink::new(Vec::new());
        sink.render(&NoiseLine::new(1, Cadence::Second, "rumble"))
            .unwrap();
        sink.render(&NoiseLine::new(60, Cadence::Minute, "RUMBLE"))
            .unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(written, "1  ...  rumble\n60  ...  RUMBLE\n");
    }

    #[test]
    fn colored_sink_keeps_the_message() {
        let mut sink = WriterSink::new(Vec::new()).with_color(true);
        sink.render(&NoiseLine::new(3600, Cadence::Hour, "LAVAOVERFLOW"))
            .unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert!(written.starts_with("3600  ...  "));
        assert!(written.contains("LAVAOVERFLOW"));
    }

    #[tokio::test]
    async fn printer_preserves_arrival_order() {
        let (tx, rx) = mpsc::channel(4);
        let printer = tokio::spawn(Printer::new(Vec::<String>::new()).run(rx));

        for tick in 1..=3 {
            tx.send(NoiseLine::new(tick, Cadence::Second, "rumble"))
                .await
                .unwrap();
        }
        drop(tx);

        let report = printer.await.unwrap();
        assert_eq!(report.rendered, 3);
        assert_eq!(
            report.sink,
            vec!["1  ...  rumble", "2  ...  rumble", "3  ...  rumble"]
        );
    }

    #[tokio::test]
    async fn render_failures_are_counted_not_fatal() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(NoiseLine::new(1, Cadence::Second, "rumble"))
            .await
            .unwrap();
        tx.send(NoiseLine::new(2, Cadence::Second, "rumble"))
            .await
            .unwrap();
        drop(tx);

        let report = Printer::new(BrokenSink).run(rx).await;
        assert_eq!(report.failed, 2);
        assert_eq!(report.rendered, 0);
    }
}
