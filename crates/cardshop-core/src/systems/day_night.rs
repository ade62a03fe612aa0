//! Day/night clock advance and phase-change side effects.

use cardshop_logic::economy::{daily_customer_count, ArrivalPacer};

use super::analytics::EventKind;
use crate::components::{DayNightClock, Phase, PhaseTransition, StaffState};
use crate::world::ShopWorld;

/// Advance the phase clock by `dt` seconds.
///
/// At most one boundary is crossed per call. Time past the boundary is held
/// in `carry_over` and applied at the start of the next call, so
/// `elapsed_in_phase` always stays below the phase duration. Paused clocks
/// do not move.
pub fn advance_clock(
    clock: &mut DayNightClock,
    dt: f64,
    day_duration: f64,
    night_duration: f64,
) -> Option<PhaseTransition> {
    if clock.paused {
        return None;
    }
    let budget = dt.max(0.0) + clock.carry_over;
    clock.carry_over = 0.0;

    let remaining = clock.remaining(day_duration, night_duration);
    if budget < remaining {
        clock.elapsed_in_phase += budget;
        return None;
    }

    clock.carry_over = budget - remaining;
    clock.elapsed_in_phase = 0.0;
    let transition = match clock.phase {
        Phase::Day => {
            clock.phase = Phase::Night;
            PhaseTransition::DayEnded {
                day_index: clock.day_index,
            }
        }
        Phase::Night => {
            clock.phase = Phase::Day;
            clock.day_index += 1;
            PhaseTransition::DayStarted {
                day_index: clock.day_index,
            }
        }
    };
    Some(transition)
}

/// World-side effects of a phase change. Autosave is handled by the engine.
pub fn apply_transition(world: &mut ShopWorld, transition: PhaseTransition) {
    let t = world.time_seconds;
    match transition {
        PhaseTransition::DayEnded { day_index } => {
            log::info!("day {day_index} closed at t={t:.1}s");
            world
                .analytics
                .log(day_index, t, EventKind::Phase, format!("Day {day_index} closed"));
        }
        PhaseTransition::DayStarted { day_index } => {
            let rolled = daily_customer_count(day_index, &mut world.rng);
            let target = rolled.min(world.config.max_customers_per_day);
            world.pacer = ArrivalPacer::for_day(target);
            if let StaffState::Idle { scan_cooldown } = &mut world.staff.state {
                *scan_cooldown = 0.0;
            }
            log::info!("day {day_index} opened, expecting {target} customers");
            world
                .analytics
                .log(day_index, t, EventKind::Phase, format!("Day {day_index} opened"));
        }
    }
}
