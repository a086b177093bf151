// src/monitor/machine.rs - Idle / Running / Finished detection
use crate::config::DetectionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    Running,
}

/// State change produced by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started { at_ms: u64 },
    /// The run is over. `last_active_ms` is the last tick the counter was above
    /// the machine-on threshold.
    Finished { at_ms: u64, run_started_ms: u64, last_active_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineUpdate {
    pub transition: Option<Transition>,
    /// Counter value to publish on the progress channel.
    pub progress: Option<u32>,
}

/// Debounced washing-machine state driven by the vibration counter.
///
/// Finishing is a momentary event: the machine drops straight back to idle once
/// the counter has sat at zero for longer than the off delay since the last
/// confirmed running tick.
#[derive(Debug, Clone)]
pub struct MachineStateMachine {
    on_threshold: u32,
    off_delay_ms: u64,
    push_interval_ms: u64,
    state: MachineState,
    run_started_ms: Option<u64>,
    last_active_ms: Option<u64>,
    last_push_ms: Option<u64>,
}

impl MachineStateMachine {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            on_threshold: config.machine_on_threshold,
            off_delay_ms: config.machine_off_delay_ms,
            push_interval_ms: config.push_interval_ms,
            state: MachineState::Idle,
            run_started_ms: None,
            last_active_ms: None,
            last_push_ms: None,
        }
    }

    pub fn update(&mut self, counter: u32, now_ms: u64) -> MachineUpdate {
        let mut update = MachineUpdate::default();

        if counter > self.on_threshold {
            if self.state == MachineState::Idle {
                self.state = MachineState::Running;
                self.run_started_ms = Some(now_ms);
                update.transition = Some(Transition::Started { at_ms: now_ms });
            }
            self.last_active_ms = Some(now_ms);
        }

        if let Some(last_active) = self.finish_due(counter, now_ms) {
            let run_started_ms = self.run_started_ms.take().unwrap_or(last_active);
            self.last_active_ms = None;
            self.state = MachineState::Idle;
            update.transition = Some(Transition::Finished {
                at_ms: now_ms,
                run_started_ms,
                last_active_ms: last_active,
            });
        } else if counter > 0 && self.push_due(now_ms) {
            self.last_push_ms = Some(now_ms);
            update.progress = Some(counter);
        }

        update
    }

    fn finish_due(&self, counter: u32, now_ms: u64) -> Option<u64> {
        let last_active = self.last_active_ms?;
        (counter == 0 && now_ms.saturating_sub(last_active) > self.off_delay_ms).then_some(last_active)
    }

    fn push_due(&self, now_ms: u64) -> bool {
        match self.last_push_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.push_interval_ms,
            None => true,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn run_started_ms(&self) -> Option<u64> {
        self.run_started_ms
    }

    pub fn last_active_ms(&self) -> Option<u64> {
        self.last_active_ms
    }
}
