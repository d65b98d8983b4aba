use std::fmt::Write;
use std::time::{Duration, Instant};

use crate::fetch::FetchProgress;

const MIN_BAR_WIDTH: usize = 10;

/// Renders one fetch as a single terminal line
pub struct ProgressBar {
    bar_buf: String,
    buf: String,
    start_instant: Instant,
    finished_after: Option<Duration>,
    line_width: usize,
}

impl ProgressBar {
    pub fn new(max_width: usize) -> Self {
        Self::with_width(
            crossterm::terminal::size()
                .ok()
                .map(|(cols, _rows)| usize::from(cols))
                .unwrap_or(max_width)
                .min(max_width),
        )
    }

    pub fn with_width(line_width: usize) -> Self {
        Self {
            buf: String::new(),
            bar_buf: String::new(),
            start_instant: Instant::now(),
            finished_after: None,
            line_width,
        }
    }

    /// Stops the clock; later updates keep the final elapsed time and speed
    pub fn finish(&mut self) {
        if self.finished_after.is_none() {
            self.finished_after = Some(self.start_instant.elapsed());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_after.unwrap_or_else(|| self.start_instant.elapsed())
    }

    pub fn update(&mut self, label: &str, progress: FetchProgress, status: Option<&str>) -> Result<&str, std::fmt::Error> {
        let elapsed = self.elapsed();
        let speed = match elapsed.as_secs_f64() {
            secs if secs > 0.0 => (progress.transferred as f64 / secs) as u64,
            _ => 0,
        };
        self.render(label, progress, speed, elapsed, status)
    }

    /// `status` replaces the percentage column, e.g. for finished or failed rows
    pub fn render(
        &mut self,
        label: &str,
        progress: FetchProgress,
        speed: u64,
        elapsed: Duration,
        status: Option<&str>,
    ) -> Result<&str, std::fmt::Error> {
        let downloaded_len = progress.transferred;
        let total_len = progress.content_length;
        let progress = progress.fraction().map(|fraction| (fraction * 100.0) as usize);

        let (downloaded_len_size, downloaded_len_unit) = Self::byte_unit(downloaded_len);
        let (speed_size, speed_unit) = Self::byte_unit(speed);

        self.bar_buf.clear();
        self.buf.clear();
        match total_len {
            Some(total) => {
                let (total_len_size, total_len_unit) = Self::byte_unit(total);
                write!(self.buf, " {downloaded_len_size:.2} {downloaded_len_unit} / {total_len_size:.2} {total_len_unit}")?;
            }
            None => write!(self.buf, " {downloaded_len_size:.2} {downloaded_len_unit} / ?")?,
        }
        match (status, progress) {
            (Some(status), _) => write!(self.buf, " - {status}")?,
            (None, Some(progress)) => write!(self.buf, " - {progress} %")?,
            (None, None) => write!(self.buf, " - -- %")?,
        }
        write!(self.buf, " - {speed_size:.2} {speed_unit}/s - elapsed: {elapsed:.2?}")?;

        write!(self.bar_buf, "{label} ")?;
        let bar_p_width = self
            .line_width
            .saturating_sub(self.bar_buf.chars().count() + self.buf.chars().count() + 2)
            .max(MIN_BAR_WIDTH);
        let progress_width = progress.map(|p| p * bar_p_width / 100).unwrap_or(0);
        self.bar_buf.push('[');
        for _ in 0..progress_width {
            self.bar_buf.push('█');
        }
        for _ in progress_width..bar_p_width {
            self.bar_buf.push(if progress.is_none() { '-' } else { ' ' });
        }
        self.bar_buf.push(']');
        self.bar_buf.push_str(&self.buf);

        Ok(&self.bar_buf)
    }

    pub fn byte_unit(bytes_count: u64) -> (f32, &'static str) {
        const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

        let mut i = 0;
        let mut bytes_count = bytes_count as f32;
        while bytes_count >= 1024.0 && i < UNITS.len() - 1 {
            i += 1;
            bytes_count /= 1024.0;
        }
        (bytes_count, UNITS[i])
    }
}
