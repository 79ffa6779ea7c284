//! Staged loading animation.
//!
//! Plays a fixed script of pipeline steps before any result is shown. The
//! durations are constants and have nothing to do with how long resolution
//! actually took. Steps run strictly one after another.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub id: u8,
    pub name: &'static str,
    pub duration: Duration,
    pub annotation: &'static str,
}

/// Delay between the last step completing and results being revealed.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const DEMO_STEPS: [PipelineStep; 5] = [
    PipelineStep {
        id: 1,
        name: "Binary Lifting",
        duration: Duration::from_millis(2300),
        annotation: "Completed in 2.3s",
    },
    PipelineStep {
        id: 2,
        name: "Feature Extraction",
        duration: Duration::from_millis(1500),
        annotation: "824 features extracted",
    },
    PipelineStep {
        id: 3,
        name: "ML Classification",
        duration: Duration::from_millis(1800),
        annotation: "3 functions • 94.2% confidence",
    },
    PipelineStep {
        id: 4,
        name: "Similarity Search",
        duration: Duration::from_millis(1200),
        annotation: "Database scan complete",
    },
    PipelineStep {
        id: 5,
        name: "Protocol Inferred",
        duration: Duration::from_millis(1000),
        annotation: "TLS 1.2 detected",
    },
];

/// Receives step-local state changes while the script plays.
pub trait PipelineObserver {
    /// All steps go back to "Processing..." before the first one starts.
    fn on_reset(&mut self, _steps: &[PipelineStep]) {}
    fn on_step_started(&mut self, index: usize, step: &PipelineStep);
    fn on_step_completed(&mut self, index: usize, step: &PipelineStep);
    /// Called exactly once, after the settle delay.
    fn on_finished(&mut self, elapsed: Duration);
}

/// Observer that ignores everything.
pub struct SilentObserver;

impl PipelineObserver for SilentObserver {
    fn on_step_started(&mut self, _index: usize, _step: &PipelineStep) {}
    fn on_step_completed(&mut self, _index: usize, _step: &PipelineStep) {}
    fn on_finished(&mut self, _elapsed: Duration) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub steps_completed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineSequencer {
    steps: Vec<PipelineStep>,
    settle: Duration,
    time_scale: f64,
}

impl Default for PipelineSequencer {
    fn default() -> Self {
        Self::new(DEMO_STEPS.to_vec(), SETTLE_DELAY)
    }
}

impl PipelineSequencer {
    pub fn new(steps: Vec<PipelineStep>, settle: Duration) -> Self {
        Self {
            steps,
            settle,
            time_scale: 1.0,
        }
    }

    /// Scale every hold; `0.0` plays the script instantly.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale.max(0.0);
        self
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Nominal wall time of one run at the configured scale.
    pub fn total_duration(&self) -> Duration {
        let nominal: Duration = self.steps.iter().map(|s| s.duration).sum::<Duration>() + self.settle;
        nominal.mul_f64(self.time_scale)
    }

    fn hold(&self, duration: Duration) -> Duration {
        duration.mul_f64(self.time_scale)
    }

    pub async fn run<O: PipelineObserver + ?Sized>(&self, observer: &mut O) -> PipelineReport {
        let start = Instant::now();
        observer.on_reset(&self.steps);

        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("Pipeline step {} started: {}", step.id, step.name);
            observer.on_step_started(index, step);
            tokio::time::sleep(self.hold(step.duration)).await;
            observer.on_step_completed(index, step);
        }

        tokio::time::sleep(self.hold(self.settle)).await;

        let elapsed = start.elapsed();
        observer.on_finished(elapsed);
        log::debug!("Pipeline finished in {:?}", elapsed);

        PipelineReport {
            steps_completed: self.steps.len(),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Reset(usize),
        Started(usize, Duration),
        Completed(usize, Duration),
        Finished,
    }

    struct Recorder {
        start: Instant,
        events: Vec<Event>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                events: Vec::new(),
            }
        }

        fn at(&self) -> Duration {
            self.start.elapsed()
        }
    }

    impl PipelineObserver for Recorder {
        fn on_reset(&mut self, steps: &[PipelineStep]) {
            self.events.push(Event::Reset(steps.len()));
        }

        fn on_step_started(&mut self, index: usize, _step: &PipelineStep) {
            let at = self.at();
            self.events.push(Event::Started(index, at));
        }

        fn on_step_completed(&mut self, index: usize, _step: &PipelineStep) {
            let at = self.at();
            self.events.push(Event::Completed(index, at));
        }

        fn on_finished(&mut self, _elapsed: Duration) {
            self.events.push(Event::Finished);
        }
    }

    fn millis(d: Duration) -> u128 {
        d.as_millis()
    }

    #[test]
    fn test_demo_script_total() {
        assert_eq!(
            PipelineSequencer::default().total_duration(),
            Duration::from_millis(8300)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_elapsed_matches_script() {
        let sequencer = PipelineSequencer::default();
        let report = sequencer.run(&mut SilentObserver).await;

        assert_eq!(report.steps_completed, 5);
        assert!(millis(report.elapsed) >= 8300);
        assert!(millis(report.elapsed) < 8310);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_complete_in_order_without_overlap() {
        let sequencer = PipelineSequencer::default();
        let mut recorder = Recorder::new();
        sequencer.run(&mut recorder).await;

        assert_eq!(recorder.events.first(), Some(&Event::Reset(5)));
        assert_eq!(recorder.events.last(), Some(&Event::Finished));
        assert_eq!(
            recorder
                .events
                .iter()
                .filter(|e| matches!(e, Event::Finished))
                .count(),
            1
        );

        // Started(i), Completed(i) alternate and each hold is the step's own duration.
        let mut previous_completion = Duration::ZERO;
        for (index, step) in DEMO_STEPS.iter().enumerate() {
            let started = &recorder.events[1 + index * 2];
            let completed = &recorder.events[2 + index * 2];
            match (started, completed) {
                (Event::Started(s_idx, s_at), Event::Completed(c_idx, c_at)) => {
                    assert_eq!(*s_idx, index);
                    assert_eq!(*c_idx, index);
                    assert!(*s_at >= previous_completion);
                    let held = millis(*c_at - *s_at);
                    assert!(held >= step.duration.as_millis());
                    assert!(held < step.duration.as_millis() + 5);
                    previous_completion = *c_at;
                }
                other => panic!("unexpected event order: {:?}", other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_time_scale_is_instant() {
        let sequencer = PipelineSequencer::default().with_time_scale(0.0);
        let mut recorder = Recorder::new();
        let report = sequencer.run(&mut recorder).await;

        assert_eq!(report.elapsed, Duration::ZERO);
        assert_eq!(recorder.events.len(), 1 + 5 * 2 + 1);
    }
}
