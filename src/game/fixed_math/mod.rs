//! Deterministic fixed-point mathematics.
//!
//! Every position, distance and rate the order system touches goes through
//! these types so that two machines replaying the same command stream reach
//! bit-identical simulation states.

use fixed::types::I48F16;

pub use vec2::FixedVec2;

mod vec2;

/// Fixed-point number type used throughout the simulation.
///
/// Uses I48F16 format: 48 bits for the integer part, 16 bits for the fractional part.
pub type FixedNum = I48F16;

/// Outcome of moving a point a bounded distance toward a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub position: FixedVec2,
    /// True when the resulting position is within the requested stopping distance.
    pub arrived: bool,
}

/// Move `from` toward `to` by at most `max_step`, stopping once within `stop_distance`.
///
/// Units travel in straight lines; there is no obstacle avoidance here.
pub fn step_towards(from: FixedVec2, to: FixedVec2, max_step: FixedNum, stop_distance: FixedNum) -> Step {
    let delta = to - from;
    let dist = delta.length();

    if dist <= stop_distance {
        return Step { position: from, arrived: true };
    }

    let travel = dist - stop_distance;
    if travel <= max_step {
        let position = from + delta.normalize() * travel;
        return Step { position, arrived: true };
    }

    Step {
        position: from + delta.normalize() * max_step,
        arrived: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> FixedVec2 {
        FixedVec2::from_f32(x, y)
    }

    #[test]
    fn step_stops_short_of_goal() {
        let step = step_towards(v(0.0, 0.0), v(10.0, 0.0), FixedNum::from_num(2), FixedNum::from_num(1));
        assert!(!step.arrived);
        assert_eq!(step.position, v(2.0, 0.0));
    }

    #[test]
    fn step_lands_on_stopping_ring() {
        let step = step_towards(v(0.0, 0.0), v(3.0, 0.0), FixedNum::from_num(5), FixedNum::from_num(1));
        assert!(step.arrived);
        assert_eq!(step.position, v(2.0, 0.0));
    }

    #[test]
    fn already_inside_stopping_distance() {
        let step = step_towards(v(0.5, 0.0), v(0.0, 0.0), FixedNum::from_num(5), FixedNum::from_num(1));
        assert!(step.arrived);
        assert_eq!(step.position, v(0.5, 0.0));
    }
}
