use crate::pipeline::{PipelineObserver, PipelineStep};
use console::{style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Terminal rendering of the pipeline script: one spinner line per step.
pub struct PipelineTerminalUI {
    term: Term,
    multi_progress: MultiProgress,
    bars: Vec<ProgressBar>,
    quiet: bool,
}

impl PipelineTerminalUI {
    pub fn new(quiet: bool) -> Self {
        let multi_progress = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        Self {
            term: Term::stdout(),
            multi_progress,
            bars: Vec::new(),
            quiet,
        }
    }

    fn loading_style() -> ProgressStyle {
        ProgressStyle::with_template("  {prefix} {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["▰▱▱▱", "▰▰▱▱", "▰▰▰▱", "▰▰▰▰", "▱▰▰▰", "▱▱▰▰", "▱▱▱▰", "✓"])
    }

    fn done_style() -> ProgressStyle {
        ProgressStyle::with_template("  {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn step_prefix(step: &PipelineStep) -> String {
        style(format!("[{}] {:<20}", step.id, step.name)).white().bold().to_string()
    }
}

impl PipelineObserver for PipelineTerminalUI {
    fn on_reset(&mut self, steps: &[PipelineStep]) {
        if !self.quiet {
            let _ = self.term.hide_cursor();
        }

        self.bars = steps
            .iter()
            .map(|step| {
                let bar = self.multi_progress.add(ProgressBar::new_spinner());
                bar.set_style(Self::loading_style());
                bar.set_prefix(Self::step_prefix(step));
                bar.set_message(style("Processing...").dim().to_string());
                bar
            })
            .collect();
    }

    fn on_step_started(&mut self, index: usize, step: &PipelineStep) {
        log::debug!("UI: step started - {}", step.name);
        if let Some(bar) = self.bars.get(index) {
            bar.enable_steady_tick(Duration::from_millis(120));
        }
    }

    fn on_step_completed(&mut self, index: usize, step: &PipelineStep) {
        log::debug!("UI: step completed - {}", step.name);
        if let Some(bar) = self.bars.get(index) {
            bar.set_style(Self::done_style());
            bar.finish_with_message(format!(
                "{} {}",
                style("✓").green().bold(),
                style(step.annotation).green()
            ));
        }
    }

    fn on_finished(&mut self, elapsed: Duration) {
        log::debug!("UI: pipeline complete after {:.1}s", elapsed.as_secs_f64());
        if !self.quiet {
            let _ = self.term.show_cursor();
        }
    }
}

impl Drop for PipelineTerminalUI {
    fn drop(&mut self) {
        let _ = self.term.show_cursor();
    }
}

/// Typing indicator shown while the assistant "thinks".
pub fn typing_indicator(quiet: bool) -> ProgressBar {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_style(
        ProgressStyle::with_template("  {spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["●∙∙", "∙●∙", "∙∙●", "∙∙∙"]),
    );
    bar.set_message(style("Assistant is typing").dim().to_string());
    bar.enable_steady_tick(Duration::from_millis(150));
    bar
}
