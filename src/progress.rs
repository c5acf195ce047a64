//! Progress bar for plan execution

use indicatif::{ProgressBar, ProgressStyle};

/// One bar over the steps of a plan
///
/// Prompts and streamed command output must run inside [`suspend`](Self::suspend)
/// so they are not drawn over by the bar.
pub struct StepProgress {
    pb: ProgressBar,
}

impl StepProgress {
    /// Visible bar over `total_steps`; indicatif hides it when stderr is not a terminal
    pub fn new(total_steps: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let pb = ProgressBar::new(total_steps);
        pb.set_style(style);
        Self { pb }
    }

    /// No output at all
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn start_step(&self, label: &str) {
        self.pb.set_message(label.to_string());
    }

    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.pb.suspend(f)
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}
