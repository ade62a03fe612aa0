//! Day/night clock state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Day,
    Night,
}

/// A phase boundary crossed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseTransition {
    /// Day `day_index` closed; the shop is now in Night.
    DayEnded { day_index: u32 },
    /// Day `day_index` opened.
    DayStarted { day_index: u32 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DayNightClock {
    pub phase: Phase,
    /// Always below the current phase's duration.
    pub elapsed_in_phase: f64,
    /// 0-based.
    pub day_index: u32,
    pub paused: bool,
    /// Time past a boundary not yet applied; consumed on the next tick.
    pub carry_over: f64,
}

impl DayNightClock {
    pub fn is_open(&self) -> bool {
        self.phase == Phase::Day && !self.paused
    }

    pub fn phase_duration(&self, day_duration: f64, night_duration: f64) -> f64 {
        match self.phase {
            Phase::Day => day_duration,
            Phase::Night => night_duration,
        }
    }

    /// Seconds left in the current phase.
    pub fn remaining(&self, day_duration: f64, night_duration: f64) -> f64 {
        (self.phase_duration(day_duration, night_duration) - self.elapsed_in_phase).max(0.0)
    }
}
