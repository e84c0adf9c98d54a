//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::{Duration, Instant};

/// One spinner per pipeline stage; starting a stage finishes the previous one
#[derive(Debug)]
pub struct ProgressReporter {
    current: RefCell<Option<ProgressBar>>,
    show_progress: bool,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create progress reporter for diff operations
    pub fn new_for_diff() -> Self {
        Self {
            current: RefCell::new(None),
            show_progress: true,
            start_time: Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            current: RefCell::new(None),
            show_progress: false,
            start_time: Instant::now(),
        }
    }

    /// Mark the running stage as done and start a spinner for the next one
    pub fn start_stage(&self, message: &str) {
        self.finish_current();
        if self.show_progress {
            *self.current.borrow_mut() = Some(create_spinner(message));
        }
    }

    /// Finish the running stage and print a closing message with the total time
    pub fn finish(&self, message: &str) {
        self.finish_current();
        if self.show_progress {
            let closing = self.closing_message(message);
            let pb = create_spinner(&closing);
            pb.finish_with_message(closing);
        }
    }

    fn closing_message(&self, message: &str) -> String {
        format!("✅ {} in {:.2?}", message, self.elapsed())
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn is_active(&self) -> bool {
        self.current.borrow().is_some()
    }

    fn finish_current(&self) {
        if let Some(pb) = self.current.borrow_mut().take() {
            let message = pb.message();
            pb.finish_with_message(format!("✅ {}", message));
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.current.get_mut().take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
