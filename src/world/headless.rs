//! In-memory world engine used by the harness binary and the test suite
//!
//! Actions take a fixed number of `step()` calls to finish. A finished
//! entry action seats the ped, a finished exit action puts it beside the
//! vehicle, and a death action stays until removed.

use std::collections::HashMap;

use super::simulation::{
    Action, ActionKind, ActionPriority, Door, EntityRef, PedHandle, Simulation, VehicleHandle,
};
use crate::player::controls::ControlState;
use crate::util::Vec3;

/// Steps an entry or exit action runs before completing
pub const DEFAULT_ACTION_STEPS: u32 = 3;

/// Drawable variations per body part in the headless wardrobe
const DRAWABLES_PER_PART: u32 = 3;
/// Texture variations per drawable in the headless wardrobe
const TEXTURES_PER_DRAWABLE: u32 = 2;

#[derive(Debug, Clone)]
struct RunningAction {
    action: Action,
    remaining: u32,
}

/// Ped state kept by the headless engine
#[derive(Debug, Clone)]
pub struct HeadlessPed {
    pub model: u32,
    pub position: Vec3,
    pub health: u32,
    pub armour: u32,
    pub vehicle: Option<VehicleHandle>,
    pub last_damage: Option<EntityRef>,
    pub weapon: u32,
    /// Last (previous, current) snapshot pushed into this ped's pad
    pub pad: Option<(ControlState, ControlState)>,
    /// (drawable, texture) per body part
    pub components: HashMap<u8, (u32, u32)>,
    actions: HashMap<ActionPriority, RunningAction>,
}

impl HeadlessPed {
    fn new(model: u32) -> Self {
        Self {
            model,
            position: Vec3::ZERO,
            health: 200,
            armour: 0,
            vehicle: None,
            last_damage: None,
            weapon: 0,
            pad: None,
            components: HashMap::new(),
            actions: HashMap::new(),
        }
    }
}

/// Vehicle state kept by the headless engine
#[derive(Debug, Clone)]
pub struct HeadlessVehicle {
    pub position: Vec3,
    pub move_speed: Vec3,
    pub health: f32,
    pub petrol_tank_health: f32,
    pub dead: bool,
    pub damageable: bool,
}

pub struct HeadlessSimulation {
    peds: HashMap<PedHandle, HeadlessPed>,
    vehicles: HashMap<VehicleHandle, HeadlessVehicle>,
    local_ped: PedHandle,
    /// Remote ped slots (the local ped is not counted)
    ped_capacity: usize,
    action_steps: u32,
    next_handle: u32,
    local_input: ControlState,
    input_enabled: bool,
}

impl HeadlessSimulation {
    /// Create an engine holding only the local ped
    pub fn new(ped_capacity: usize) -> Self {
        let local_ped = PedHandle(1);
        let mut peds = HashMap::new();
        peds.insert(local_ped, HeadlessPed::new(0));

        Self {
            peds,
            vehicles: HashMap::new(),
            local_ped,
            ped_capacity,
            action_steps: DEFAULT_ACTION_STEPS,
            next_handle: 2,
            local_input: ControlState::default(),
            input_enabled: true,
        }
    }

    pub fn with_action_steps(mut self, steps: u32) -> Self {
        self.action_steps = steps.max(1);
        self
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    pub fn add_vehicle(&mut self, position: Vec3) -> VehicleHandle {
        let handle = VehicleHandle(self.allocate_handle());
        self.vehicles.insert(
            handle,
            HeadlessVehicle {
                position,
                move_speed: Vec3::ZERO,
                health: 1000.0,
                petrol_tank_health: 1000.0,
                dead: false,
                damageable: false,
            },
        );
        handle
    }

    pub fn remove_vehicle(&mut self, handle: VehicleHandle) {
        self.vehicles.remove(&handle);
        for ped in self.peds.values_mut() {
            if ped.vehicle == Some(handle) {
                ped.vehicle = None;
            }
        }
    }

    pub fn ped(&self, ped: PedHandle) -> Option<&HeadlessPed> {
        self.peds.get(&ped)
    }

    pub fn ped_mut(&mut self, ped: PedHandle) -> Option<&mut HeadlessPed> {
        self.peds.get_mut(&ped)
    }

    pub fn vehicle(&self, vehicle: VehicleHandle) -> Option<&HeadlessVehicle> {
        self.vehicles.get(&vehicle)
    }

    pub fn vehicle_mut(&mut self, vehicle: VehicleHandle) -> Option<&mut HeadlessVehicle> {
        self.vehicles.get_mut(&vehicle)
    }

    /// Number of remote peds currently allocated
    pub fn remote_ped_count(&self) -> usize {
        self.peds.len() - 1
    }

    pub fn set_local_input(&mut self, input: ControlState) {
        self.local_input = input;
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    /// Drop an action without letting it complete, as the engine does when
    /// something interrupts an animation.
    pub fn abort_action(&mut self, ped: PedHandle, priority: ActionPriority) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.actions.remove(&priority);
        }
    }

    /// Throw a ped out of its vehicle (windscreen ejection, wreck)
    pub fn eject(&mut self, ped: PedHandle) {
        if let Some(p) = self.peds.get_mut(&ped) {
            if let Some(vehicle) = p.vehicle.take() {
                if let Some(v) = self.vehicles.get(&vehicle) {
                    p.position = v.position + Vec3::new(0.0, 3.0, 0.0);
                }
            }
        }
    }

    /// Advance every running action by one engine frame
    pub fn step(&mut self) {
        let vehicles = &self.vehicles;
        for ped in self.peds.values_mut() {
            let mut finished = Vec::new();
            for (priority, running) in ped.actions.iter_mut() {
                if matches!(running.action, Action::Die) {
                    continue;
                }
                running.remaining = running.remaining.saturating_sub(1);
                if running.remaining == 0 {
                    finished.push(*priority);
                }
            }

            for priority in finished {
                let Some(running) = ped.actions.remove(&priority) else {
                    continue;
                };
                match running.action {
                    Action::EnterVehicle { vehicle, .. } => {
                        if let Some(v) = vehicles.get(&vehicle) {
                            ped.vehicle = Some(vehicle);
                            ped.position = v.position;
                        }
                    }
                    Action::ExitVehicle { vehicle, .. } => {
                        if ped.vehicle == Some(vehicle) {
                            ped.vehicle = None;
                            if let Some(v) = vehicles.get(&vehicle) {
                                ped.position = v.position + Vec3::new(1.5, 0.0, 0.0);
                            }
                        }
                    }
                    Action::Die => {}
                }
            }
        }
    }
}

impl Simulation for HeadlessSimulation {
    fn spawn_ped(&mut self, model: u32) -> Option<PedHandle> {
        if self.remote_ped_count() >= self.ped_capacity {
            return None;
        }
        let handle = PedHandle(self.allocate_handle());
        self.peds.insert(handle, HeadlessPed::new(model));
        Some(handle)
    }

    fn despawn_ped(&mut self, ped: PedHandle) {
        if ped != self.local_ped {
            self.peds.remove(&ped);
        }
    }

    fn local_ped(&self) -> PedHandle {
        self.local_ped
    }

    fn ped_position(&self, ped: PedHandle) -> Vec3 {
        match self.peds.get(&ped) {
            Some(p) => match p.vehicle.and_then(|v| self.vehicles.get(&v)) {
                Some(vehicle) => vehicle.position,
                None => p.position,
            },
            None => Vec3::ZERO,
        }
    }

    fn set_ped_position(&mut self, ped: PedHandle, position: Vec3) {
        if let Some(p) = self.peds.get_mut(&ped) {
            if p.vehicle.is_none() {
                p.position = position;
            }
        }
    }

    fn warp_ped(&mut self, ped: PedHandle, position: Vec3) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.vehicle = None;
            p.position = position;
        }
    }

    fn ped_health(&self, ped: PedHandle) -> u32 {
        self.peds.get(&ped).map(|p| p.health).unwrap_or(0)
    }

    fn set_ped_health(&mut self, ped: PedHandle, health: u32) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.health = health;
        }
    }

    fn ped_armour(&self, ped: PedHandle) -> u32 {
        self.peds.get(&ped).map(|p| p.armour).unwrap_or(0)
    }

    fn set_ped_armour(&mut self, ped: PedHandle, armour: u32) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.armour = armour;
        }
    }

    fn ped_vehicle(&self, ped: PedHandle) -> Option<VehicleHandle> {
        self.peds.get(&ped).and_then(|p| p.vehicle)
    }

    fn warp_ped_into_vehicle(&mut self, ped: PedHandle, vehicle: VehicleHandle, _door: Door) {
        let Some(position) = self.vehicles.get(&vehicle).map(|v| v.position) else {
            return;
        };
        if let Some(p) = self.peds.get_mut(&ped) {
            p.vehicle = Some(vehicle);
            p.position = position;
        }
    }

    fn warp_ped_out_of_vehicle(&mut self, ped: PedHandle, vehicle: VehicleHandle) {
        if let Some(p) = self.peds.get_mut(&ped) {
            if p.vehicle == Some(vehicle) {
                p.vehicle = None;
            }
        }
    }

    fn run_action(&mut self, ped: PedHandle, action: Action, priority: ActionPriority) {
        let remaining = self.action_steps;
        if let Some(p) = self.peds.get_mut(&ped) {
            p.actions
                .insert(priority, RunningAction { action, remaining });
        }
    }

    fn active_action(&self, ped: PedHandle, priority: ActionPriority) -> Option<ActionKind> {
        self.peds
            .get(&ped)
            .and_then(|p| p.actions.get(&priority))
            .map(|running| running.action.kind())
    }

    fn remove_action(&mut self, ped: PedHandle, priority: ActionPriority) {
        self.abort_action(ped, priority);
    }

    fn last_damage_entity(&self, ped: PedHandle) -> Option<EntityRef> {
        self.peds.get(&ped).and_then(|p| p.last_damage)
    }

    fn current_weapon(&self, ped: PedHandle) -> u32 {
        self.peds.get(&ped).map(|p| p.weapon).unwrap_or(0)
    }

    fn apply_control_state(&mut self, ped: PedHandle, previous: &ControlState, current: &ControlState) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.pad = Some((*previous, *current));
        }
    }

    fn read_control_state(&self) -> ControlState {
        self.local_input
    }

    fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    fn drawable_variations(&self, ped: PedHandle, _body_part: u8) -> u32 {
        if self.peds.contains_key(&ped) {
            DRAWABLES_PER_PART
        } else {
            0
        }
    }

    fn texture_variations(&self, ped: PedHandle, _body_part: u8, drawable: u32) -> u32 {
        if self.peds.contains_key(&ped) && drawable < DRAWABLES_PER_PART {
            TEXTURES_PER_DRAWABLE
        } else {
            0
        }
    }

    fn set_component_variation(&mut self, ped: PedHandle, body_part: u8, drawable: u32, texture: u32) {
        if let Some(p) = self.peds.get_mut(&ped) {
            p.components.insert(body_part, (drawable, texture));
        }
    }

    fn vehicle_position(&self, vehicle: VehicleHandle) -> Vec3 {
        self.vehicles
            .get(&vehicle)
            .map(|v| v.position)
            .unwrap_or(Vec3::ZERO)
    }

    fn vehicle_move_speed(&self, vehicle: VehicleHandle) -> Vec3 {
        self.vehicles
            .get(&vehicle)
            .map(|v| v.move_speed)
            .unwrap_or(Vec3::ZERO)
    }

    fn vehicle_health(&self, vehicle: VehicleHandle) -> f32 {
        self.vehicles.get(&vehicle).map(|v| v.health).unwrap_or(0.0)
    }

    fn petrol_tank_health(&self, vehicle: VehicleHandle) -> f32 {
        self.vehicles
            .get(&vehicle)
            .map(|v| v.petrol_tank_health)
            .unwrap_or(0.0)
    }

    fn is_vehicle_dead(&self, vehicle: VehicleHandle) -> bool {
        self.vehicles.get(&vehicle).map(|v| v.dead).unwrap_or(false)
    }

    fn set_vehicle_damageable(&mut self, vehicle: VehicleHandle, damageable: bool) {
        if let Some(v) = self.vehicles.get_mut(&vehicle) {
            v.damageable = damageable;
        }
    }
}
