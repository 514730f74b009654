use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use starstack_core::progress::{ProcessStage, ProgressReporter};

/// Indicatif-backed progress reporter for the CLI.
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: ProcessStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg} [{bar:40}] {pos}/{len}")
                        .expect("valid template")
                        .progress_chars("=> "),
                );
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(stage.to_string());
        *self.bar.lock().expect("not poisoned") = Some(bar);
    }

    fn advance(&self, items_done: usize) {
        if let Some(bar) = self.bar.lock().expect("not poisoned").as_ref() {
            bar.set_position(items_done as u64);
        }
    }

    fn message(&self, text: &str) {
        if let Some(bar) = self.bar.lock().expect("not poisoned").as_ref() {
            bar.println(text);
        }
    }

    fn finish_stage(&self) {
        if let Some(bar) = self.bar.lock().expect("not poisoned").take() {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_stage_runs_as_a_spinner() {
        let reporter = BarReporter::new();
        reporter.begin_stage(ProcessStage::Writing, None);
        reporter.message("saving");
        reporter.finish_stage();
        assert!(reporter.bar.lock().unwrap().is_none());
    }

    #[test]
    fn bounded_stage_tracks_position() {
        let reporter = BarReporter::new();
        reporter.begin_stage(ProcessStage::Stacking, Some(3));
        reporter.advance(2);
        let guard = reporter.bar.lock().unwrap();
        assert_eq!(guard.as_ref().unwrap().position(), 2);
    }
}
