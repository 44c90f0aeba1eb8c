//! Per-player entity state
//!
//! A `NetworkPlayer` exists for every connected identity. While despawned it
//! keeps the last known position and health so a later stream-in can restore
//! them; every simulation call against a missing ped is skipped and every
//! query falls back to a neutral default.

use tracing::{debug, info};

use super::attribute_lock::{Attribute, AttributeLock};
use super::clothes::Wardrobe;
use super::controls::{ControlReplicator, ControlState};
use super::interpolation::PositionInterpolator;
use super::possession::{SeatRef, VehicleEnterExit};
use crate::util::Vec3;
use crate::world::simulation::has_action;
use crate::world::vehicle::DRIVER_SEAT;
use crate::world::{ActionKind, ActionPriority, PedHandle, PlayerId, Simulation, VehicleId, VehicleRegistry};

/// Health a freshly created ped starts with
pub const SPAWN_HEALTH: u32 = 200;

/// Ped model used for remote players unless told otherwise
pub const DEFAULT_PED_MODEL: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("Player {0} is already spawned")]
    AlreadySpawned(PlayerId),

    #[error("Player {0} is the local player and is never re-created")]
    LocalPlayer(PlayerId),

    #[error("No free ped slot for player {0}")]
    NoFreeSlot(PlayerId),

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),
}

#[derive(Debug)]
pub struct NetworkPlayer {
    pub(super) id: PlayerId,
    pub(super) local: bool,
    pub(super) ped: Option<PedHandle>,
    model: u32,

    // Valid only while despawned
    cached_position: Vec3,
    cached_health: u32,

    pub(super) health: AttributeLock,
    pub(super) armour: AttributeLock,

    pub(super) occupancy: Option<SeatRef>,
    pub(super) enter_exit: VehicleEnterExit,
    /// Poll the occupied vehicle for death until it fires once
    pub(super) vehicle_death_check: bool,

    pub(super) interp: PositionInterpolator,
    pub(super) controls: ControlReplicator,

    aim_target: Vec3,
    shot_source: Vec3,
    shot_target: Vec3,
    wardrobe: Wardrobe,
}

impl NetworkPlayer {
    fn with_identity(id: PlayerId, local: bool, model: u32) -> Self {
        Self {
            id,
            local,
            ped: None,
            model,
            cached_position: Vec3::ZERO,
            cached_health: SPAWN_HEALTH,
            health: AttributeLock::new(Attribute::Health),
            armour: AttributeLock::new(Attribute::Armour),
            occupancy: None,
            enter_exit: VehicleEnterExit::default(),
            vehicle_death_check: false,
            interp: PositionInterpolator::new(),
            controls: ControlReplicator::new(),
            aim_target: Vec3::ZERO,
            shot_source: Vec3::ZERO,
            shot_target: Vec3::ZERO,
            wardrobe: Wardrobe::new(),
        }
    }

    /// The player driven by this machine's input. Its ped already exists.
    pub fn new_local(id: PlayerId, sim: &dyn Simulation) -> Self {
        let mut player = Self::with_identity(id, true, DEFAULT_PED_MODEL);
        player.ped = Some(sim.local_ped());
        player
    }

    /// A player controlled elsewhere. Starts despawned.
    pub fn new_remote(id: PlayerId, model: u32) -> Self {
        Self::with_identity(id, false, model)
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn ped(&self) -> Option<PedHandle> {
        self.ped
    }

    pub fn is_spawned(&self) -> bool {
        self.ped.is_some()
    }

    // --- Lifecycle ---

    /// Allocate a ped for this player
    pub fn create(&mut self, sim: &mut dyn Simulation) -> Result<(), SpawnError> {
        if self.local {
            return Err(SpawnError::LocalPlayer(self.id));
        }
        if self.ped.is_some() {
            return Err(SpawnError::AlreadySpawned(self.id));
        }

        let ped = sim
            .spawn_ped(self.model)
            .ok_or(SpawnError::NoFreeSlot(self.id))?;
        self.ped = Some(ped);

        self.health.set(sim, self.ped, SPAWN_HEALTH);
        self.wardrobe.apply(sim, ped);
        self.interp.clear();
        self.enter_exit = VehicleEnterExit::default();

        info!(player_id = %self.id, ped = ped.0, "Player created");
        Ok(())
    }

    /// Release the ped. The local player's ped is never released.
    pub fn destroy(&mut self, sim: &mut dyn Simulation, vehicles: &mut VehicleRegistry) {
        if self.local {
            return;
        }
        let Some(ped) = self.ped else {
            return;
        };

        self.release_seat(vehicles);
        self.occupancy = None;
        self.enter_exit = VehicleEnterExit::default();
        self.interp.clear();
        sim.despawn_ped(ped);
        self.ped = None;

        info!(player_id = %self.id, "Player destroyed");
    }

    /// Create, then restore what was cached at stream-out
    pub fn stream_in(&mut self, sim: &mut dyn Simulation) -> Result<(), SpawnError> {
        self.create(sim)?;
        let position = self.cached_position;
        let health = self.cached_health;
        self.set_position(sim, position, true);
        self.set_health(sim, health);
        Ok(())
    }

    /// Cache position and health, then destroy
    pub fn stream_out(&mut self, sim: &mut dyn Simulation, vehicles: &mut VehicleRegistry) {
        if self.ped.is_none() {
            return;
        }
        self.cached_position = self.position(sim, vehicles);
        self.cached_health = self.health(sim);
        self.destroy(sim, vehicles);
    }

    /// Kill the player. Without `instantly` a death action is played first.
    pub fn kill(&mut self, sim: &mut dyn Simulation, instantly: bool) {
        let Some(ped) = self.ped else {
            return;
        };
        if self.is_dying(sim) {
            return;
        }

        if !instantly {
            sim.run_action(ped, crate::world::Action::Die, ActionPriority::EventResponse);
        }

        self.set_health(sim, 0);
        self.set_armour(sim, 0);
        self.set_control_state(sim, ControlState::NEUTRAL);
        // Keys held at death must not fire release edges afterwards
        self.controls.reset();
        self.reset_vehicle_enter_exit(sim);
        self.interp.clear();

        info!(player_id = %self.id, instantly, "Player killed");
    }

    pub fn is_dying(&self, sim: &dyn Simulation) -> bool {
        self.ped
            .map(|ped| has_action(sim, ped, ActionPriority::EventResponse, ActionKind::Die))
            .unwrap_or(false)
    }

    // --- Position ---

    /// Move the ped on foot. Ignored while seated or getting in or out.
    pub fn set_position(&mut self, sim: &mut dyn Simulation, position: Vec3, reset_interpolation: bool) {
        match self.ped {
            Some(ped) => {
                if sim.ped_vehicle(ped).is_none() && !self.enter_exit.in_transition() {
                    sim.set_ped_position(ped, position);
                }
            }
            None => self.cached_position = position,
        }

        if reset_interpolation {
            self.interp.clear();
        }
    }

    /// Move the ped even if it is in a vehicle
    pub fn teleport(&mut self, sim: &mut dyn Simulation, position: Vec3, reset_interpolation: bool) {
        match self.ped {
            Some(ped) => sim.warp_ped(ped, position),
            None => self.cached_position = position,
        }

        if reset_interpolation {
            self.interp.clear();
        }
    }

    /// Vehicle position while seated, ped position on foot, zero while
    /// despawned
    pub fn position(&self, sim: &dyn Simulation, vehicles: &VehicleRegistry) -> Vec3 {
        let Some(ped) = self.ped else {
            return Vec3::ZERO;
        };

        let vehicle = self
            .occupancy
            .and_then(|o| vehicles.get(o.vehicle))
            .and_then(|v| v.handle());

        match vehicle {
            Some(handle) => sim.vehicle_position(handle),
            None => sim.ped_position(ped),
        }
    }

    /// Where the player will reappear on the next stream-in
    pub fn cached_position(&self) -> Vec3 {
        self.cached_position
    }

    // --- Interpolation ---

    /// Smooth the ped towards `target` over `delay_ms`
    pub fn set_target_position(&mut self, sim: &mut dyn Simulation, target: Vec3, delay_ms: u64, now: u64) {
        let Some(ped) = self.ped else {
            return;
        };

        self.update_target_position(sim, now);
        let current = sim.ped_position(ped);
        self.interp.begin(current, target, delay_ms, now);
    }

    pub fn remove_target_position(&mut self) {
        self.interp.clear();
    }

    pub fn has_target_position(&self) -> bool {
        self.interp.is_active()
    }

    /// Apply this tick's share of the pending correction
    pub fn update_target_position(&mut self, sim: &mut dyn Simulation, now: u64) {
        let Some(ped) = self.ped else {
            return;
        };

        let current = sim.ped_position(ped);
        if let Some(next) = self.interp.step(current, now) {
            self.set_position(sim, next, false);
        }
    }

    // --- Attributes ---

    pub fn health(&self, sim: &dyn Simulation) -> u32 {
        self.health.get(sim, self.ped)
    }

    /// Write through and unlock. Dropped while despawned.
    pub fn set_health(&mut self, sim: &mut dyn Simulation, health: u32) {
        self.health.set(sim, self.ped, health);
    }

    pub fn lock_health(&mut self, sim: &mut dyn Simulation, health: u32) {
        self.health.lock(sim, self.ped, health);
    }

    pub fn armour(&self, sim: &dyn Simulation) -> u32 {
        self.armour.get(sim, self.ped)
    }

    pub fn set_armour(&mut self, sim: &mut dyn Simulation, armour: u32) {
        self.armour.set(sim, self.ped, armour);
    }

    pub fn lock_armour(&mut self, sim: &mut dyn Simulation, armour: u32) {
        self.armour.lock(sim, self.ped, armour);
    }

    /// Re-apply locked attributes over whatever the simulation did
    pub fn maintain_locks(&self, sim: &mut dyn Simulation) {
        self.health.maintain(sim, self.ped);
        self.armour.maintain(sim, self.ped);
    }

    // --- Controls ---

    /// Record a new snapshot. Only the local player's pad is driven from here.
    pub fn set_control_state(&mut self, sim: &mut dyn Simulation, state: ControlState) {
        if let (true, Some(ped)) = (self.local, self.ped) {
            sim.apply_control_state(ped, self.controls.current(), &state);
        }
        self.controls.push(state);
    }

    /// Capture this tick's input from the local device
    pub(super) fn sample_local_controls(&mut self, sim: &dyn Simulation) {
        if self.local && self.ped.is_some() {
            self.controls.push(sim.read_control_state());
        }
    }

    pub fn controls(&self) -> &ControlReplicator {
        &self.controls
    }

    // --- Vehicle occupancy ---

    pub fn is_in_vehicle(&self) -> bool {
        self.occupancy.is_some()
    }

    pub fn occupancy(&self) -> Option<SeatRef> {
        self.occupancy
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.occupancy.map(|o| o.vehicle)
    }

    pub fn seat(&self) -> Option<u8> {
        self.occupancy.map(|o| o.seat)
    }

    pub fn is_a_passenger(&self) -> bool {
        self.occupancy
            .map(|o| o.seat != DRIVER_SEAT)
            .unwrap_or(false)
    }

    pub fn enter_exit(&self) -> &VehicleEnterExit {
        &self.enter_exit
    }

    /// Clear this player's slot in the occupant table
    pub(super) fn release_seat(&self, vehicles: &mut VehicleRegistry) {
        let Some(occupancy) = self.occupancy else {
            return;
        };
        if let Some(vehicle) = vehicles.get_mut(occupancy.vehicle) {
            if !vehicle.release_occupant(occupancy.seat, self.id) {
                debug!(
                    player_id = %self.id,
                    vehicle_id = %occupancy.vehicle,
                    seat = occupancy.seat,
                    "Seat already taken over, nothing to release"
                );
            }
        }
    }

    // --- Aim and shot data ---

    pub fn set_aim_target(&mut self, target: Vec3) {
        self.aim_target = target;
    }

    pub fn aim_target(&self) -> Vec3 {
        self.aim_target
    }

    pub fn set_shot_source(&mut self, source: Vec3) {
        self.shot_source = source;
    }

    pub fn shot_source(&self) -> Vec3 {
        self.shot_source
    }

    pub fn set_shot_target(&mut self, target: Vec3) {
        self.shot_target = target;
    }

    pub fn shot_target(&self) -> Vec3 {
        self.shot_target
    }

    // --- Clothes ---

    pub fn set_clothes(&mut self, sim: &mut dyn Simulation, body_part: u8, index: u8) {
        self.wardrobe.set(sim, self.ped, body_part, index);
    }

    pub fn clothes(&self, body_part: u8) -> u8 {
        self.wardrobe.get(body_part)
    }
}
