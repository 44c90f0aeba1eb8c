//! Input snapshots and press/release edge detection

use serde::{Deserialize, Serialize};

/// One tick's worth of input device state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Analog movement (-1.0 = full left/back, 1.0 = full right/forward)
    pub move_x: f32,
    pub move_y: f32,
    pub sprint: bool,
    pub jump: bool,
    pub fire: bool,
    pub aim: bool,
    pub duck: bool,
    /// Doubles as the "enter as passenger" key while on foot
    pub horn: bool,
    pub enter_exit_vehicle: bool,
}

/// Digital controls that support edge queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Sprint,
    Jump,
    Fire,
    Aim,
    Duck,
    Horn,
    EnterExitVehicle,
}

impl ControlState {
    /// Neutral snapshot pushed on death and reset
    pub const NEUTRAL: ControlState = ControlState {
        move_x: 0.0,
        move_y: 0.0,
        sprint: false,
        jump: false,
        fire: false,
        aim: false,
        duck: false,
        horn: false,
        enter_exit_vehicle: false,
    };

    pub fn is_pressed(&self, control: Control) -> bool {
        match control {
            Control::Sprint => self.sprint,
            Control::Jump => self.jump,
            Control::Fire => self.fire,
            Control::Aim => self.aim,
            Control::Duck => self.duck,
            Control::Horn => self.horn,
            Control::EnterExitVehicle => self.enter_exit_vehicle,
        }
    }
}

/// Current and previous snapshot of one player's controls
#[derive(Debug, Clone, Default)]
pub struct ControlReplicator {
    current: ControlState,
    previous: ControlState,
}

impl ControlReplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift current into previous and record `state`
    pub fn push(&mut self, state: ControlState) {
        self.previous = self.current;
        self.current = state;
    }

    pub fn current(&self) -> &ControlState {
        &self.current
    }

    pub fn previous(&self) -> &ControlState {
        &self.previous
    }

    pub fn just_pressed(&self, control: Control) -> bool {
        self.current.is_pressed(control) && !self.previous.is_pressed(control)
    }

    pub fn just_released(&self, control: Control) -> bool {
        !self.current.is_pressed(control) && self.previous.is_pressed(control)
    }

    /// Forget both snapshots so no edge fires on the next tick
    pub fn reset(&mut self) {
        self.current = ControlState::NEUTRAL;
        self.previous = ControlState::NEUTRAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_enter(pressed: bool) -> ControlState {
        ControlState {
            enter_exit_vehicle: pressed,
            ..ControlState::default()
        }
    }

    #[test]
    fn edges_fire_exactly_once() {
        let mut controls = ControlReplicator::new();

        controls.push(with_enter(true));
        assert!(controls.just_pressed(Control::EnterExitVehicle));
        assert!(!controls.just_released(Control::EnterExitVehicle));

        controls.push(with_enter(true));
        assert!(!controls.just_pressed(Control::EnterExitVehicle));

        controls.push(with_enter(false));
        assert!(controls.just_released(Control::EnterExitVehicle));

        controls.push(with_enter(false));
        assert!(!controls.just_released(Control::EnterExitVehicle));
    }

    #[test]
    fn reset_swallows_pending_release() {
        let mut controls = ControlReplicator::new();
        controls.push(with_enter(true));
        controls.reset();
        controls.push(with_enter(false));
        assert!(!controls.just_released(Control::EnterExitVehicle));
    }
}
