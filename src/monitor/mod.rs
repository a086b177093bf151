//! Vibration monitoring engine.
//!
//! One call to [`Monitor::tick`] per sample: the reading runs through the
//! [`SamplePipeline`], the activity metric drives the [`VibrationClassifier`]
//! counter, the counter drives the [`MachineStateMachine`], and the
//! [`DutyCycleScheduler`] picks the pause before the next tick. The engine does
//! no I/O and never reads a clock itself, so it can be driven in simulated time.

pub mod classifier;
pub mod machine;
pub mod pipeline;

pub use classifier::VibrationClassifier;
pub use machine::{MachineState, MachineStateMachine, MachineUpdate, Transition};
pub use pipeline::{PipelineOutput, SamplePipeline};

use crate::config::Config;
use crate::hardware::RawSample;
use crate::scheduler::{Delay, DutyCycleScheduler};

/// Everything one tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub output: PipelineOutput,
    pub counter: u32,
    pub state: MachineState,
    pub transition: Option<Transition>,
    pub progress: Option<u32>,
    pub delay: Delay,
}

impl TickReport {
    pub fn timestamp_ms(&self) -> u64 {
        self.output.sample.timestamp_ms
    }
}

pub struct Monitor {
    pipeline: SamplePipeline,
    classifier: VibrationClassifier,
    machine: MachineStateMachine,
    scheduler: DutyCycleScheduler,
    ticks: u64,
}

impl Monitor {
    /// `now_ms` opens the initial wake window.
    pub fn new(config: &Config, now_ms: u64) -> Self {
        Self {
            pipeline: SamplePipeline::new(&config.filter, config.sensor.scale_lsb_per_g),
            classifier: VibrationClassifier::new(&config.detection),
            machine: MachineStateMachine::new(&config.detection),
            scheduler: DutyCycleScheduler::new(&config.schedule, now_ms),
            ticks: 0,
        }
    }

    pub fn tick(&mut self, raw: RawSample, now_ms: u64) -> TickReport {
        self.ticks += 1;
        let output = self.pipeline.process(raw, now_ms);
        let counter = self.classifier.update(output.activity);
        let MachineUpdate { transition, progress } = self.machine.update(counter, now_ms);

        match transition {
            Some(Transition::Started { at_ms }) => {
                tracing::info!("Machine running (vibration counter {} at {} ms)", counter, at_ms);
            }
            Some(Transition::Finished { at_ms, run_started_ms, last_active_ms }) => {
                tracing::info!(
                    "Machine finished at {} ms: ran {} s, still for {} s",
                    at_ms,
                    last_active_ms.saturating_sub(run_started_ms) / 1000,
                    at_ms.saturating_sub(last_active_ms) / 1000
                );
            }
            None => {}
        }

        let delay = self.scheduler.next_delay(counter, now_ms);
        TickReport {
            output,
            counter,
            state: self.machine.state(),
            transition,
            progress,
            delay,
        }
    }

    /// Call after sleeping out a [`Delay::Sleep`].
    pub fn woke(&mut self, now_ms: u64) {
        self.scheduler.woke(now_ms);
    }

    pub fn counter(&self) -> u32 {
        self.classifier.counter()
    }

    pub fn state(&self) -> MachineState {
        self.machine.state()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
