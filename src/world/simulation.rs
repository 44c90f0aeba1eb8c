//! Interface to the simulated world engine
//!
//! The engine owns peds, vehicles, physics and animation tasks. This crate
//! only drives it through the narrow calls below.

use crate::player::controls::ControlState;
use crate::util::Vec3;

/// Opaque engine handle of a ped (player avatar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PedHandle(pub u32);

/// Opaque engine handle of a spawned vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleHandle(pub u32);

/// Last entity that damaged a ped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Ped(PedHandle),
    Vehicle(VehicleHandle),
}

/// Task slots an action can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPriority {
    /// Movement and vehicle entry/exit
    Primary,
    /// Death and other event responses
    EventResponse,
}

/// Vehicle door used for entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Door {
    Index(u8),
    /// Let the engine pick the nearest usable door
    Any,
}

/// Exit animation chosen for a vehicle exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStyle {
    /// Normal get-out from a slow or stationary vehicle
    GetOut,
    /// Get-out played when the occupant is being jacked
    GetOutJacked,
    /// Dive-out used by trucks and vans
    DiveOutTruck,
    /// Dive-out used by other road vehicles
    DiveOut,
}

/// Action the engine runs on a ped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    EnterVehicle {
        vehicle: VehicleHandle,
        door: Door,
        seat: u8,
    },
    ExitVehicle {
        vehicle: VehicleHandle,
        style: ExitStyle,
    },
    Die,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::EnterVehicle { .. } => ActionKind::EnterVehicle,
            Action::ExitVehicle { .. } => ActionKind::ExitVehicle,
            Action::Die => ActionKind::Die,
        }
    }
}

/// Kind of the action currently occupying a priority slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    EnterVehicle,
    ExitVehicle,
    /// Dragging an occupant out of a vehicle
    JackVehicle,
    /// Being dragged out of a vehicle
    BeingJacked,
    Die,
}

/// Calls consumed from the simulated world.
///
/// Every query on a handle the engine no longer knows returns a neutral
/// default (zero vector, zero health, `None`).
pub trait Simulation {
    // --- Peds ---

    /// Allocate a ped. `None` when the engine has no free slot.
    fn spawn_ped(&mut self, model: u32) -> Option<PedHandle>;
    fn despawn_ped(&mut self, ped: PedHandle);
    /// Ped controlled by this machine's input device
    fn local_ped(&self) -> PedHandle;

    fn ped_position(&self, ped: PedHandle) -> Vec3;
    fn set_ped_position(&mut self, ped: PedHandle, position: Vec3);
    /// Place the ped at `position`, pulling it out of any vehicle first
    fn warp_ped(&mut self, ped: PedHandle, position: Vec3);

    fn ped_health(&self, ped: PedHandle) -> u32;
    fn set_ped_health(&mut self, ped: PedHandle, health: u32);
    fn ped_armour(&self, ped: PedHandle) -> u32;
    fn set_ped_armour(&mut self, ped: PedHandle, armour: u32);

    /// Vehicle the engine currently has the ped seated in
    fn ped_vehicle(&self, ped: PedHandle) -> Option<VehicleHandle>;
    fn warp_ped_into_vehicle(&mut self, ped: PedHandle, vehicle: VehicleHandle, door: Door);
    fn warp_ped_out_of_vehicle(&mut self, ped: PedHandle, vehicle: VehicleHandle);

    fn run_action(&mut self, ped: PedHandle, action: Action, priority: ActionPriority);
    fn active_action(&self, ped: PedHandle, priority: ActionPriority) -> Option<ActionKind>;
    fn remove_action(&mut self, ped: PedHandle, priority: ActionPriority);

    fn last_damage_entity(&self, ped: PedHandle) -> Option<EntityRef>;
    fn current_weapon(&self, ped: PedHandle) -> u32;

    // --- Input ---

    /// Push a control snapshot into the ped's control surface (pad)
    fn apply_control_state(&mut self, ped: PedHandle, previous: &ControlState, current: &ControlState);
    /// Read the local input device
    fn read_control_state(&self) -> ControlState;
    /// False while menus or chat capture input
    fn input_enabled(&self) -> bool;

    // --- Clothing ---

    fn drawable_variations(&self, ped: PedHandle, body_part: u8) -> u32;
    fn texture_variations(&self, ped: PedHandle, body_part: u8, drawable: u32) -> u32;
    fn set_component_variation(&mut self, ped: PedHandle, body_part: u8, drawable: u32, texture: u32);

    // --- Vehicles ---

    fn vehicle_position(&self, vehicle: VehicleHandle) -> Vec3;
    fn vehicle_move_speed(&self, vehicle: VehicleHandle) -> Vec3;
    fn vehicle_health(&self, vehicle: VehicleHandle) -> f32;
    fn petrol_tank_health(&self, vehicle: VehicleHandle) -> f32;
    fn is_vehicle_dead(&self, vehicle: VehicleHandle) -> bool;
    fn set_vehicle_damageable(&mut self, vehicle: VehicleHandle, damageable: bool);
}

/// True when the ped's slot at `priority` holds an action of `kind`
pub fn has_action(
    sim: &dyn Simulation,
    ped: PedHandle,
    priority: ActionPriority,
    kind: ActionKind,
) -> bool {
    sim.active_action(ped, priority) == Some(kind)
}

/// Remove the action at `priority` only if it is of `kind`
pub fn clear_action(
    sim: &mut dyn Simulation,
    ped: PedHandle,
    priority: ActionPriority,
    kind: ActionKind,
) -> bool {
    if has_action(sim, ped, priority, kind) {
        sim.remove_action(ped, priority);
        true
    } else {
        false
    }
}
