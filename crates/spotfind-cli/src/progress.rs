use indicatif::{ProgressBar, ProgressStyle};
use spotfind_core::ProgressSink;

/// Terminal progress bar fed by the peak finder.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}%")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarSink {
    fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    fn set_progress(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }

    fn log(&self, message: &str) {
        tracing::debug!("{message}");
    }
}
