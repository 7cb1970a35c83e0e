use client_core::FormView;
use tracing::debug;
use url::Url;

const PROGRESS_BAR_WIDTH: usize = 40;

/// Terminal rendering of the submission form: build log on stdout, error
/// lines and failures on stderr.
#[derive(Default)]
pub struct ConsoleView;

fn render_bar(done_percent: f64, width: usize) -> String {
    let filled = ((done_percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        " ".repeat(width - filled),
        done_percent
    )
}

impl FormView for ConsoleView {
    fn append_log(&mut self, line: &str) {
        println!("{line}");
    }

    fn append_error_log(&mut self, line: &str) {
        eprintln!("error: {line}");
    }

    fn set_progress(&mut self, done_percent: f64) {
        println!("{}", render_bar(done_percent, PROGRESS_BAR_WIDTH));
    }

    fn set_generate_enabled(&mut self, enabled: bool) {
        debug!(enabled, "generate control toggled");
    }

    fn show_download(&mut self, href: &Url) {
        println!("download ready: {href}");
    }

    fn show_failure(&mut self, reason: &str) {
        eprintln!("failed: {reason}");
    }
}
