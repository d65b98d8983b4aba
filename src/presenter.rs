//!
//! # Presentation layer
//! Consumes fetch events on the terminal; workers never touch this state
//!

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{MoveToColumn, MoveToPreviousLine};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::fetch::{FetchEvent, FetchEventKind, FetchProgress};
use crate::progress_bar::ProgressBar;

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);
const MAX_LINE_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Bars,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Connecting,
    Transferring,
    Succeeded,
    Failed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

struct Row {
    label: String,
    bar: ProgressBar,
    progress: FetchProgress,
    status: RowStatus,
}

pub struct Presenter {
    mode: OutputMode,
    rows: Vec<Row>,
    index: HashMap<Uuid, usize>,
    // Bar lines currently on screen, the cursor sits right below them
    drawn_lines: u16,
    last_draw: Option<Instant>,
    log_lines: Option<mpsc::UnboundedReceiver<String>>,
    summary: Summary,
}

impl Presenter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            rows: Vec::new(),
            index: HashMap::new(),
            drawn_lines: 0,
            last_draw: None,
            log_lines: None,
            summary: Summary::default(),
        }
    }

    /// Log lines received here are printed above the bars instead of through them
    pub fn with_log_lines(mut self, receiver: mpsc::UnboundedReceiver<String>) -> Self {
        self.log_lines = Some(receiver);
        self
    }

    /// Rows are drawn in registration order
    pub fn register(&mut self, id: Uuid, label: impl Into<String>) {
        if self.index.contains_key(&id) {
            return;
        }

        self.index.insert(id, self.rows.len());
        self.rows.push(Row {
            label: label.into(),
            bar: ProgressBar::new(MAX_LINE_WIDTH),
            progress: FetchProgress { transferred: 0, content_length: None },
            status: RowStatus::Connecting,
        });
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn status(&self, id: &Uuid) -> Option<RowStatus> {
        self.index.get(id).map(|&i| self.rows[i].status)
    }

    pub fn progress(&self, id: &Uuid) -> Option<FetchProgress> {
        self.index.get(id).map(|&i| self.rows[i].progress)
    }

    /// Updates the row for `event`, returns true when the event ended a fetch
    pub fn apply(&mut self, event: &FetchEvent) -> bool {
        if !self.index.contains_key(&event.id) {
            self.register(event.id, event.id.to_string());
        }
        let row = &mut self.rows[self.index[&event.id]];

        if let Some(progress) = event.kind.progress() {
            row.progress.transferred = progress.transferred;
            if !event.kind.is_terminal() {
                row.progress.content_length = progress.content_length;
            }
        }

        match &event.kind {
            FetchEventKind::Connecting => row.status = RowStatus::Connecting,
            FetchEventKind::Transferring { .. } => row.status = RowStatus::Transferring,
            FetchEventKind::Progress { .. } => {}
            FetchEventKind::Succeeded { .. } => {
                row.status = RowStatus::Succeeded;
                row.bar.finish();
                self.summary.succeeded += 1;
            }
            FetchEventKind::Failed { .. } => {
                row.status = RowStatus::Failed;
                row.bar.finish();
                self.summary.failed += 1;
            }
        }

        event.kind.is_terminal()
    }

    /// Runs until every event sender is dropped
    pub async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<FetchEvent>) -> io::Result<Summary> {
        let mut log_lines = self.log_lines.take();

        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => self.handle_event(&event)?,
                    None => break,
                },
                Some(line) = next_log_line(&mut log_lines) => self.print_log(&line)?,
            }
        }

        if let Some(log_lines) = log_lines.as_mut() {
            while let Ok(line) = log_lines.try_recv() {
                self.print_log(&line)?;
            }
        }
        if self.mode == OutputMode::Bars {
            self.draw_to(&mut io::stdout().lock())?;
        }

        Ok(self.summary)
    }

    fn handle_event(&mut self, event: &FetchEvent) -> io::Result<()> {
        let terminal = self.apply(event);
        match self.mode {
            OutputMode::Json => self.print_json(event),
            OutputMode::Bars => {
                let due = self.last_draw.map_or(true, |at| at.elapsed() >= REDRAW_INTERVAL);
                if terminal || due {
                    self.draw_to(&mut io::stdout().lock())?;
                }
                Ok(())
            }
        }
    }

    fn print_json(&self, event: &FetchEvent) -> io::Result<()> {
        let line = serde_json::to_string(event).map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()
    }

    fn print_log(&mut self, line: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Bars => self.print_log_to(&mut io::stdout().lock(), line),
            // stdout carries only JSON events
            OutputMode::Json => writeln!(io::stderr().lock(), "{}", line),
        }
    }

    /// Prints `line` where the bars start, then redraws the bars below it
    pub fn print_log_to<W: Write>(&mut self, out: &mut W, line: &str) -> io::Result<()> {
        if self.drawn_lines > 0 {
            queue!(out, MoveToPreviousLine(self.drawn_lines))?;
        }
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line), Print("\n"))?;
        self.drawn_lines = 0;

        if self.mode == OutputMode::Bars && !self.rows.is_empty() {
            self.draw_to(out)
        } else {
            out.flush()
        }
    }

    pub fn draw_to<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.drawn_lines > 0 {
            queue!(out, MoveToPreviousLine(self.drawn_lines))?;
        }

        for row in self.rows.iter_mut() {
            let status = match row.status {
                RowStatus::Connecting => Some("connecting"),
                RowStatus::Transferring => None,
                RowStatus::Succeeded => Some("done"),
                RowStatus::Failed => Some("failed"),
            };
            let line = row
                .bar
                .update(&row.label, row.progress, status)
                .map_err(io::Error::other)?;
            queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line), Print("\n"))?;
        }

        out.flush()?;
        self.drawn_lines = u16::try_from(self.rows.len()).unwrap_or(u16::MAX);
        self.last_draw = Some(Instant::now());

        Ok(())
    }
}

async fn next_log_line(receiver: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
