use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }

    fn use_pretty(&self, is_tty: bool) -> bool {
        is_tty && !matches!(self, UiMode::Plain)
    }
}

/// Live one-line pursuit status on stderr.
///
/// Pretty mode redraws a spinner line in place. Plain mode prints a line only
/// when the pursuit status word changes, plus a periodic heartbeat.
pub struct StatusLine {
    spinner: Option<ProgressBar>,
    last_status: Option<String>,
    last_print: Instant,
    heartbeat: Duration,
    started: Instant,
}

impl StatusLine {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        let spinner = if mode.use_pretty(is_tty) {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            Some(spinner)
        } else {
            None
        };
        Self {
            spinner,
            last_status: None,
            last_print: Instant::now(),
            heartbeat: Duration::from_secs(5),
            started: Instant::now(),
        }
    }

    /// `status` is the pursuit word (CHASING, SEEKING, IDLE); `detail` the rest.
    pub fn update(&mut self, status: &str, detail: &str) {
        let line = format!("{status} | {detail}");
        if let Some(spinner) = &self.spinner {
            spinner.set_message(line);
            return;
        }
        let changed = self.last_status.as_deref() != Some(status);
        if changed || self.last_print.elapsed() >= self.heartbeat {
            eprintln!("==> {line}");
            self.last_print = Instant::now();
        }
        if changed {
            self.last_status = Some(status.to_string());
        }
    }

    pub fn finish(self, summary: &str) {
        let message = format!("✔ {} ({})", summary, format_duration(self.started.elapsed()));
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

/// Announce a startup stage on stderr.
pub fn stage(name: &str) {
    eprintln!("==> {}", name);
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
