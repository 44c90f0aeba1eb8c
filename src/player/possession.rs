//! Vehicle entry/exit negotiation
//!
//! Network vehicles need the authority to grant an entry or exit before the
//! animation starts, and every completed transition is announced back.
//! Vehicles that are not network tracked transition locally right away.
//!
//! The engine has the final word on where a ped is: each tick the recorded
//! occupancy is reconciled against what the simulation reports, which is how
//! aborted entries and forced exits are detected.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::controls::Control;
use super::network_player::NetworkPlayer;
use crate::net::protocol::{ClientMsg, ServerMsg};
use crate::util::Vec3;
use crate::world::simulation::{clear_action, has_action};
use crate::world::{
    Action, ActionKind, ActionPriority, Door, ExitStyle, Simulation, TickContext, VehicleId,
    VehicleRegistry,
};

/// Farthest a vehicle can be for the enter key to pick it
pub const MAX_VEHICLE_SEARCH_DISTANCE: f32 = 6.0;

/// Times a remote player's aborted entry is re-issued before giving up
pub const MAX_ENTRY_RESTARTS: u32 = 8;

/// Planar speed above which an exit becomes a dive
const DIVE_OUT_SPEED: f32 = 10.0;

/// Vehicle models that use the truck dive-out
const TRUCK_DIVE_MODELS: [u16; 23] = [
    2, 4, 5, 7, 8, 10, 11, 31, 32, 49, 50, 51, 52, 53, 55, 56, 60, 66, 73, 85, 86, 94, 104,
];

/// First model id past the road vehicles
const FIRST_NON_ROAD_MODEL: u16 = 166;

/// Road model without a dive-out animation
const NO_DIVE_MODEL: u16 = 12;

/// A seat in a specific vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatRef {
    pub vehicle: VehicleId,
    pub seat: u8,
    /// Whether the vehicle was network tracked when the seat was taken
    pub network: bool,
}

/// How the player leaves a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitVehicleMode {
    #[default]
    Normal,
    /// Someone is taking the seat
    Jacked,
}

/// Transient entry/exit flags. `entering` and `exiting` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleEnterExit {
    pub(super) entering: bool,
    pub(super) exiting: bool,
    /// A request is waiting for the authority
    pub(super) requesting: bool,
    /// Seat being entered, or asked for while requesting entry
    pub(super) pending: Option<SeatRef>,
    pub(super) restarts: u32,
}

impl VehicleEnterExit {
    pub fn is_entering(&self) -> bool {
        self.entering
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn is_requesting(&self) -> bool {
        self.requesting
    }

    pub fn pending(&self) -> Option<SeatRef> {
        self.pending
    }

    pub fn in_transition(&self) -> bool {
        self.entering || self.exiting
    }
}

/// Where a player stands in the entry/exit negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessionState {
    Idle,
    RequestingEntry { vehicle: VehicleId, seat: u8 },
    Entering { vehicle: VehicleId, seat: u8 },
    InVehicle { vehicle: VehicleId, seat: u8 },
    RequestingExit { vehicle: VehicleId, seat: u8 },
    Exiting { vehicle: VehicleId, seat: u8 },
}

/// Door a ped uses to reach `seat`
pub fn seat_to_door(seat: u8) -> Door {
    match seat {
        0 => Door::Index(0),
        1 => Door::Index(2),
        2 => Door::Index(1),
        3 => Door::Index(3),
        _ => Door::Any,
    }
}

impl ExitStyle {
    /// Pick the exit animation for a vehicle moving at `speed`
    pub fn select(mode: ExitVehicleMode, speed: Vec3, model_id: u16) -> ExitStyle {
        if mode == ExitVehicleMode::Jacked {
            return ExitStyle::GetOutJacked;
        }

        let fast = speed.x.abs() > DIVE_OUT_SPEED || speed.y.abs() > DIVE_OUT_SPEED;
        if !fast {
            return ExitStyle::GetOut;
        }

        if TRUCK_DIVE_MODELS.contains(&model_id) {
            ExitStyle::DiveOutTruck
        } else if model_id != NO_DIVE_MODEL && model_id < FIRST_NON_ROAD_MODEL {
            ExitStyle::DiveOut
        } else {
            ExitStyle::GetOut
        }
    }
}

/// Closest streamed-in vehicle within reach of `origin`, with the seat to
/// take. A passenger search takes the first free passenger seat and fails
/// when there is none.
pub fn find_closest_vehicle(
    origin: Vec3,
    vehicles: &VehicleRegistry,
    sim: &dyn Simulation,
    passenger: bool,
) -> Option<(VehicleId, u8)> {
    let mut best_distance = MAX_VEHICLE_SEARCH_DISTANCE;
    let mut closest = None;

    for vehicle in vehicles.streamed_in() {
        let Some(handle) = vehicle.handle() else {
            continue;
        };
        let distance = origin.distance(sim.vehicle_position(handle));
        if distance < best_distance {
            best_distance = distance;
            closest = Some(vehicle);
        }
    }

    let vehicle = closest?;
    if !passenger {
        return Some((vehicle.id(), 0));
    }

    (0..vehicle.max_passengers())
        .find(|&i| vehicle.passenger(i).is_none())
        .map(|i| (vehicle.id(), i + 1))
}

impl NetworkPlayer {
    pub fn possession_state(&self) -> PossessionState {
        let ee = &self.enter_exit;
        if let Some(occ) = self.occupancy {
            let (vehicle, seat) = (occ.vehicle, occ.seat);
            return if ee.exiting {
                PossessionState::Exiting { vehicle, seat }
            } else if ee.requesting {
                PossessionState::RequestingExit { vehicle, seat }
            } else {
                PossessionState::InVehicle { vehicle, seat }
            };
        }

        match ee.pending {
            Some(p) if ee.entering => PossessionState::Entering {
                vehicle: p.vehicle,
                seat: p.seat,
            },
            Some(p) if ee.requesting => PossessionState::RequestingEntry {
                vehicle: p.vehicle,
                seat: p.seat,
            },
            _ => PossessionState::Idle,
        }
    }

    /// Clear every entry/exit flag and drop any running entry or exit action
    pub fn reset_vehicle_enter_exit(&mut self, sim: &mut dyn Simulation) {
        self.enter_exit = Default::default();
        if let Some(ped) = self.ped {
            clear_action(sim, ped, ActionPriority::Primary, ActionKind::EnterVehicle);
            clear_action(sim, ped, ActionPriority::Primary, ActionKind::ExitVehicle);
        }
    }

    // --- Requests ---

    /// Ask to enter `vehicle_id` at `seat`. Network vehicles go through the
    /// authority; others are entered right away.
    pub fn request_enter_vehicle(&mut self, ctx: &mut TickContext<'_>, vehicle_id: VehicleId, seat: u8) {
        if self.ped.is_none() || self.occupancy.is_some() || self.enter_exit.entering {
            return;
        }
        if self.enter_exit.requesting {
            warn!(player_id = %self.id, "Already requesting vehicle entry/exit");
            return;
        }

        let Some(vehicle) = ctx.vehicles.get(vehicle_id) else {
            debug!(player_id = %self.id, vehicle_id = %vehicle_id, "Entry target is unknown");
            return;
        };

        if vehicle.door_lock_state() > 0 {
            debug!(
                player_id = %self.id,
                vehicle_id = %vehicle_id,
                lock = vehicle.door_lock_state(),
                "Vehicle doors locked, entry abandoned"
            );
            return;
        }

        if vehicle.is_network_vehicle() {
            ctx.transport.send(ClientMsg::EntryRequest {
                player_id: self.id,
                vehicle_id,
                seat,
            });
            self.enter_exit.requesting = true;
            self.enter_exit.pending = Some(SeatRef {
                vehicle: vehicle_id,
                seat,
                network: true,
            });
            info!(player_id = %self.id, vehicle_id = %vehicle_id, seat, "Vehicle entry requested");
        } else {
            self.enter_vehicle(ctx, vehicle_id, seat);
        }
    }

    /// Ask to leave the current vehicle
    pub fn request_exit_vehicle(&mut self, ctx: &mut TickContext<'_>, mode: ExitVehicleMode) {
        let Some(occupancy) = self.occupancy else {
            return;
        };
        if self.ped.is_none() || self.enter_exit.exiting {
            return;
        }
        if self.enter_exit.requesting {
            warn!(player_id = %self.id, "Already requesting vehicle entry/exit");
            return;
        }

        let network = ctx
            .vehicles
            .get(occupancy.vehicle)
            .map(|v| v.is_network_vehicle())
            .unwrap_or(false);

        if network {
            ctx.transport.send(ClientMsg::ExitRequest {
                player_id: self.id,
                vehicle_id: occupancy.vehicle,
            });
            self.enter_exit.requesting = true;
            info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, "Vehicle exit requested");
        } else {
            self.exit_vehicle(ctx, mode);
        }
    }

    /// Turn enter/exit key edges into requests. Exits fire on press; entries
    /// fire on release of the enter key (driver) or the horn (passenger).
    pub fn check_vehicle_entry_exit_key(&mut self, ctx: &mut TickContext<'_>) {
        if !self.local || self.ped.is_none() || !ctx.sim.input_enabled() {
            return;
        }

        if self.controls.just_pressed(Control::EnterExitVehicle) {
            if self.occupancy.is_some() && !self.enter_exit.exiting {
                self.request_exit_vehicle(ctx, ExitVehicleMode::Normal);
            }
            return;
        }

        let enter_released = self.controls.just_released(Control::EnterExitVehicle);
        let horn_released = self.controls.just_released(Control::Horn);
        if !enter_released && !horn_released {
            return;
        }

        if self.enter_exit.requesting {
            warn!(player_id = %self.id, "Already requesting vehicle entry/exit");
            return;
        }
        if self.occupancy.is_some() || self.enter_exit.entering {
            return;
        }

        let origin = self.position(ctx.sim, ctx.vehicles);
        let passenger = horn_released && !enter_released;
        match find_closest_vehicle(origin, ctx.vehicles, ctx.sim, passenger) {
            Some((vehicle_id, seat)) => self.request_enter_vehicle(ctx, vehicle_id, seat),
            None => debug!(player_id = %self.id, passenger, "No vehicle in reach"),
        }
    }

    // --- Granted transitions ---

    /// Start the entry animation towards `seat` of `vehicle_id`. Returns
    /// false when the entry could not be started.
    pub fn enter_vehicle(&mut self, ctx: &mut TickContext<'_>, vehicle_id: VehicleId, seat: u8) -> bool {
        self.enter_exit.restarts = 0;
        self.begin_entry(ctx, vehicle_id, seat)
    }

    fn begin_entry(&mut self, ctx: &mut TickContext<'_>, vehicle_id: VehicleId, seat: u8) -> bool {
        let Some(ped) = self.ped else {
            return false;
        };
        if self.occupancy.is_some() {
            return false;
        }

        let Some(vehicle) = ctx.vehicles.get(vehicle_id) else {
            return false;
        };
        let Some(handle) = vehicle.handle() else {
            debug!(player_id = %self.id, vehicle_id = %vehicle_id, "Entry target not streamed in");
            return false;
        };
        if vehicle.door_lock_state() > 0 {
            return false;
        }

        ctx.sim.run_action(
            ped,
            Action::EnterVehicle {
                vehicle: handle,
                door: seat_to_door(seat),
                seat,
            },
            ActionPriority::Primary,
        );

        self.enter_exit.entering = true;
        self.enter_exit.exiting = false;
        self.enter_exit.pending = Some(SeatRef {
            vehicle: vehicle_id,
            seat,
            network: vehicle.is_network_vehicle(),
        });
        self.interp.clear();
        true
    }

    /// Start the exit animation. While only entering, the entry is dropped
    /// instead.
    pub fn exit_vehicle(&mut self, ctx: &mut TickContext<'_>, mode: ExitVehicleMode) {
        let Some(ped) = self.ped else {
            return;
        };

        let Some(occupancy) = self.occupancy else {
            if self.enter_exit.entering {
                if self.local {
                    // Cancellation is reported on the next tick
                    clear_action(ctx.sim, ped, ActionPriority::Primary, ActionKind::EnterVehicle);
                } else {
                    self.reset_vehicle_enter_exit(ctx.sim);
                }
            }
            self.interp.clear();
            return;
        };

        let Some(vehicle) = ctx.vehicles.get(occupancy.vehicle) else {
            return;
        };
        let Some(handle) = vehicle.handle() else {
            return;
        };

        let style = ExitStyle::select(mode, ctx.sim.vehicle_move_speed(handle), vehicle.model_id());
        ctx.sim.run_action(
            ped,
            Action::ExitVehicle {
                vehicle: handle,
                style,
            },
            ActionPriority::Primary,
        );
        self.enter_exit.exiting = true;
        self.enter_exit.entering = false;

        if ctx.sim.vehicle_health(handle) < 0.0 || ctx.sim.petrol_tank_health(handle) < 0.0 {
            self.vehicle_death_check = true;
            if ctx.sim.is_vehicle_dead(handle) {
                ctx.transport.send(ClientMsg::VehicleDied {
                    vehicle_id: occupancy.vehicle,
                });
                self.vehicle_death_check = false;
            }
        }

        self.interp.clear();
        info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, ?style, "Vehicle exit started");
    }

    /// Seat the player immediately, leaving any current vehicle first
    pub fn put_in_vehicle(
        &mut self,
        ctx: &mut TickContext<'_>,
        vehicle_id: VehicleId,
        seat: u8,
        announce: bool,
    ) {
        let Some(ped) = self.ped else {
            return;
        };
        let Some((handle, network)) = ctx
            .vehicles
            .get(vehicle_id)
            .and_then(|v| v.handle().map(|h| (h, v.is_network_vehicle())))
        else {
            debug!(player_id = %self.id, vehicle_id = %vehicle_id, "Cannot seat in a vehicle that is not streamed in");
            return;
        };

        if self.occupancy.is_some() {
            self.remove_from_vehicle(ctx);
        }

        if ctx.sim.ped_vehicle(ped).is_none() {
            ctx.sim.warp_ped_into_vehicle(ped, handle, seat_to_door(seat));
        }

        self.reset_vehicle_enter_exit(ctx.sim);
        let seat_ref = SeatRef {
            vehicle: vehicle_id,
            seat,
            network,
        };
        self.claim_seat(ctx.vehicles, seat_ref);
        ctx.sim.set_vehicle_damageable(handle, true);
        self.occupancy = Some(seat_ref);

        if announce && network {
            ctx.transport.send(ClientMsg::EntryComplete {
                player_id: self.id,
                vehicle_id,
                seat,
            });
        }

        info!(player_id = %self.id, vehicle_id = %vehicle_id, seat, "Player put in vehicle");
    }

    /// Take the player out of its vehicle immediately
    pub fn remove_from_vehicle(&mut self, ctx: &mut TickContext<'_>) {
        let (Some(ped), Some(occupancy)) = (self.ped, self.occupancy) else {
            return;
        };

        if let Some(handle) = ctx.vehicles.get(occupancy.vehicle).and_then(|v| v.handle()) {
            ctx.sim.set_vehicle_damageable(handle, false);
            ctx.sim.warp_ped_out_of_vehicle(ped, handle);
        }

        self.release_seat(ctx.vehicles);
        self.occupancy = None;
        self.reset_vehicle_enter_exit(ctx.sim);

        info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, "Player removed from vehicle");
    }

    fn claim_seat(&self, vehicles: &mut VehicleRegistry, seat: SeatRef) {
        let Some(vehicle) = vehicles.get_mut(seat.vehicle) else {
            return;
        };
        match vehicle.set_occupant(seat.seat, self.id) {
            Ok(Some(previous)) => warn!(
                player_id = %self.id,
                displaced = %previous,
                vehicle_id = %seat.vehicle,
                seat = seat.seat,
                "Seat was held by another player"
            ),
            Ok(None) => {}
            Err(e) => warn!(player_id = %self.id, vehicle_id = %seat.vehicle, error = %e, "Seat claim rejected"),
        }
    }

    // --- Per-tick reconciliation ---

    /// Reconcile entry/exit flags with what the simulation reports
    pub fn process_vehicle_entry_exit(&mut self, ctx: &mut TickContext<'_>) {
        let Some(ped) = self.ped else {
            return;
        };

        let entry_running = has_action(ctx.sim, ped, ActionPriority::Primary, ActionKind::EnterVehicle);
        let exit_running = has_action(ctx.sim, ped, ActionPriority::Primary, ActionKind::ExitVehicle);

        if ctx.sim.ped_vehicle(ped).is_some() {
            if self.enter_exit.entering && !entry_running {
                self.complete_entry(ctx);
            }
            if !self.enter_exit.exiting && self.seat_lost(ctx.vehicles) {
                self.force_exit(ctx);
            }
            return;
        }

        if self.enter_exit.entering {
            if !entry_running {
                self.entry_interrupted(ctx);
            }
        } else if clear_action(ctx.sim, ped, ActionPriority::Primary, ActionKind::EnterVehicle) {
            debug!(player_id = %self.id, "Stray vehicle entry removed");
        }

        if self.enter_exit.exiting {
            if !exit_running {
                self.complete_exit(ctx);
            }
        } else {
            if exit_running {
                ctx.sim.remove_action(ped, ActionPriority::Primary);
                debug!(player_id = %self.id, "Stray vehicle exit removed");
            }
            if self.occupancy.is_some() {
                self.force_exit(ctx);
            }
        }
    }

    /// True when the occupant table no longer has this player in its seat
    fn seat_lost(&self, vehicles: &VehicleRegistry) -> bool {
        match self.occupancy {
            Some(occ) => match vehicles.get(occ.vehicle) {
                Some(vehicle) => vehicle.occupant(occ.seat) != Some(self.id),
                None => true,
            },
            None => false,
        }
    }

    fn complete_entry(&mut self, ctx: &mut TickContext<'_>) {
        let Some(pending) = self.enter_exit.pending.take() else {
            self.enter_exit.entering = false;
            return;
        };

        self.enter_exit.entering = false;
        self.enter_exit.restarts = 0;
        if let Some(handle) = ctx.vehicles.get(pending.vehicle).and_then(|v| v.handle()) {
            ctx.sim.set_vehicle_damageable(handle, true);
        }
        self.claim_seat(ctx.vehicles, pending);
        self.occupancy = Some(pending);

        if pending.network {
            ctx.transport.send(ClientMsg::EntryComplete {
                player_id: self.id,
                vehicle_id: pending.vehicle,
                seat: pending.seat,
            });
        }

        info!(player_id = %self.id, vehicle_id = %pending.vehicle, seat = pending.seat, "Vehicle entry complete");
    }

    fn entry_interrupted(&mut self, ctx: &mut TickContext<'_>) {
        let Some(pending) = self.enter_exit.pending else {
            self.enter_exit.entering = false;
            return;
        };

        if self.local {
            if pending.network {
                if let Some(handle) = ctx.vehicles.get(pending.vehicle).and_then(|v| v.handle()) {
                    ctx.sim.set_vehicle_damageable(handle, false);
                }
                ctx.transport.send(ClientMsg::EntryCancelled {
                    player_id: self.id,
                    vehicle_id: pending.vehicle,
                    seat: pending.seat,
                });
            }
            self.enter_exit.entering = false;
            self.enter_exit.pending = None;
            info!(player_id = %self.id, vehicle_id = %pending.vehicle, "Vehicle entry cancelled");
            return;
        }

        // Remote entries must finish; re-issue a bounded number of times
        if self.enter_exit.restarts >= MAX_ENTRY_RESTARTS {
            warn!(
                player_id = %self.id,
                vehicle_id = %pending.vehicle,
                restarts = self.enter_exit.restarts,
                "Vehicle entry keeps aborting, giving up"
            );
            self.reset_vehicle_enter_exit(ctx.sim);
            return;
        }

        let restarts = self.enter_exit.restarts + 1;
        if self.begin_entry(ctx, pending.vehicle, pending.seat) {
            self.enter_exit.restarts = restarts;
            info!(player_id = %self.id, vehicle_id = %pending.vehicle, restarts, "Vehicle entry restarted");
        } else {
            warn!(player_id = %self.id, vehicle_id = %pending.vehicle, "Vehicle entry cannot be restarted");
            self.reset_vehicle_enter_exit(ctx.sim);
        }
    }

    fn complete_exit(&mut self, ctx: &mut TickContext<'_>) {
        self.enter_exit.exiting = false;
        let Some(occupancy) = self.occupancy.take() else {
            return;
        };

        if occupancy.network {
            ctx.transport.send(ClientMsg::ExitComplete {
                player_id: self.id,
                vehicle_id: occupancy.vehicle,
            });
        }

        self.release(ctx, occupancy);
        info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, "Vehicle exit complete");
    }

    fn force_exit(&mut self, ctx: &mut TickContext<'_>) {
        let Some(occupancy) = self.occupancy.take() else {
            return;
        };

        if let (Some(ped), Some(handle)) = (
            self.ped,
            ctx.vehicles.get(occupancy.vehicle).and_then(|v| v.handle()),
        ) {
            if ctx.sim.ped_vehicle(ped) == Some(handle) {
                ctx.sim.warp_ped_out_of_vehicle(ped, handle);
            }
        }

        if occupancy.network {
            ctx.transport.send(ClientMsg::ExitForceful {
                player_id: self.id,
                vehicle_id: occupancy.vehicle,
            });
        }

        self.release(ctx, occupancy);
        self.enter_exit.requesting = false;
        info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, "Vehicle forceful exit");
    }

    /// Free the seat and make the vehicle non-damageable
    fn release(&mut self, ctx: &mut TickContext<'_>, occupancy: SeatRef) {
        if let Some(vehicle) = ctx.vehicles.get_mut(occupancy.vehicle) {
            vehicle.release_occupant(occupancy.seat, self.id);
            if let Some(handle) = vehicle.handle() {
                ctx.sim.set_vehicle_damageable(handle, false);
            }
        }
    }

    /// Report the occupied vehicle's death once while nobody drives it
    pub fn check_vehicle_death(&mut self, ctx: &mut TickContext<'_>) {
        if !self.local || !self.vehicle_death_check {
            return;
        }

        let Some(occupancy) = self.occupancy else {
            self.vehicle_death_check = false;
            return;
        };
        let Some(vehicle) = ctx.vehicles.get(occupancy.vehicle) else {
            self.vehicle_death_check = false;
            return;
        };

        // A driver who is on the way out no longer counts
        let driverless = match vehicle.driver() {
            None => true,
            Some(driver) => driver == self.id && self.enter_exit.exiting,
        };
        if !driverless {
            self.vehicle_death_check = false;
            return;
        }

        if let Some(handle) = vehicle.handle() {
            if ctx.sim.is_vehicle_dead(handle) {
                ctx.transport.send(ClientMsg::VehicleDied {
                    vehicle_id: occupancy.vehicle,
                });
                self.vehicle_death_check = false;
                info!(player_id = %self.id, vehicle_id = %occupancy.vehicle, "Vehicle died");
            }
        }
    }

    // --- Inbound ---

    /// Apply an entry/exit message from the authority. Sync updates are
    /// handled by the player manager.
    pub fn handle_server_msg(&mut self, ctx: &mut TickContext<'_>, msg: &ServerMsg) {
        match *msg {
            ServerMsg::EntryGranted {
                vehicle_id, seat, ..
            } => {
                if self.local && !self.enter_exit.requesting {
                    warn!(player_id = %self.id, vehicle_id = %vehicle_id, "Unrequested entry grant dropped");
                    return;
                }
                self.enter_exit.requesting = false;
                self.enter_exit.pending = None;
                if !self.enter_vehicle(ctx, vehicle_id, seat) && self.local {
                    // Release the seat the authority reserved for us
                    ctx.transport.send(ClientMsg::EntryCancelled {
                        player_id: self.id,
                        vehicle_id,
                        seat,
                    });
                    info!(player_id = %self.id, vehicle_id = %vehicle_id, seat, "Granted entry could not start, cancelled");
                }
            }
            ServerMsg::ExitGranted {
                vehicle_id, mode, ..
            } => {
                if self.local && !self.enter_exit.requesting {
                    warn!(player_id = %self.id, vehicle_id = %vehicle_id, "Unrequested exit grant dropped");
                    return;
                }
                self.enter_exit.requesting = false;
                if self.vehicle_id() != Some(vehicle_id) {
                    warn!(player_id = %self.id, vehicle_id = %vehicle_id, "Exit grant for a vehicle the player is not in");
                    return;
                }
                self.exit_vehicle(ctx, mode);
            }
            ServerMsg::EntryComplete {
                vehicle_id, seat, ..
            } => {
                self.put_in_vehicle(ctx, vehicle_id, seat, false);
            }
            ServerMsg::EntryCancelled { vehicle_id, .. } => {
                debug!(player_id = %self.id, vehicle_id = %vehicle_id, "Vehicle entry cancelled by authority");
                self.reset_vehicle_enter_exit(ctx.sim);
            }
            ServerMsg::ExitComplete { vehicle_id, .. } | ServerMsg::ExitForceful { vehicle_id, .. } => {
                if self.vehicle_id() == Some(vehicle_id) {
                    self.remove_from_vehicle(ctx);
                } else {
                    debug!(player_id = %self.id, vehicle_id = %vehicle_id, "Exit for a vehicle the player is not in");
                }
            }
            ServerMsg::PlayerSync { .. } => {}
        }
    }
}
