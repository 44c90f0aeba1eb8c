//! Vehicle store and occupant tables

use std::collections::BTreeMap;

use super::simulation::VehicleHandle;
use super::{PlayerId, VehicleId};

/// Highest passenger count any vehicle model supports
pub const MAX_PASSENGERS: u8 = 8;

/// Driver seat index
pub const DRIVER_SEAT: u8 = 0;

/// Seat index past the vehicle's occupant table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Vehicle has no seat {0}")]
pub struct InvalidSeat(pub u8);

/// A vehicle known to this client.
///
/// The occupant table holds player ids, not players. Seat 0 is the driver,
/// seats 1..=max_passengers are passengers.
#[derive(Debug, Clone)]
pub struct NetworkVehicle {
    id: VehicleId,
    model_id: u16,
    /// Engine handle while streamed in
    handle: Option<VehicleHandle>,
    /// Tracked by the sync layer (occupancy changes need peer confirmation)
    network: bool,
    door_lock_state: u8,
    occupants: Vec<Option<PlayerId>>,
}

impl NetworkVehicle {
    pub fn new(id: VehicleId, model_id: u16, max_passengers: u8, network: bool) -> Self {
        let seats = max_passengers.min(MAX_PASSENGERS) as usize + 1;
        Self {
            id,
            model_id,
            handle: None,
            network,
            door_lock_state: 0,
            occupants: vec![None; seats],
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn model_id(&self) -> u16 {
        self.model_id
    }

    pub fn handle(&self) -> Option<VehicleHandle> {
        self.handle
    }

    pub fn is_streamed_in(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stream_in(&mut self, handle: VehicleHandle) {
        self.handle = Some(handle);
    }

    pub fn stream_out(&mut self) -> Option<VehicleHandle> {
        self.handle.take()
    }

    pub fn is_network_vehicle(&self) -> bool {
        self.network
    }

    /// 0 = unlocked, anything else keeps players out
    pub fn door_lock_state(&self) -> u8 {
        self.door_lock_state
    }

    pub fn set_door_lock_state(&mut self, state: u8) {
        self.door_lock_state = state;
    }

    pub fn max_passengers(&self) -> u8 {
        (self.occupants.len() - 1) as u8
    }

    pub fn driver(&self) -> Option<PlayerId> {
        self.occupant(DRIVER_SEAT)
    }

    /// Passenger by zero-based passenger index (seat `index + 1`)
    pub fn passenger(&self, index: u8) -> Option<PlayerId> {
        self.occupant(index.saturating_add(1))
    }

    pub fn occupant(&self, seat: u8) -> Option<PlayerId> {
        self.occupants.get(seat as usize).copied().flatten()
    }

    /// Put `player` in `seat`. Returns the previous occupant if the seat was
    /// taken by someone else.
    pub fn set_occupant(
        &mut self,
        seat: u8,
        player: PlayerId,
    ) -> Result<Option<PlayerId>, InvalidSeat> {
        let slot = self.occupants.get_mut(seat as usize).ok_or(InvalidSeat(seat))?;
        let previous = slot.replace(player);
        Ok(previous.filter(|p| *p != player))
    }

    /// Clear `seat` if and only if `player` holds it
    pub fn release_occupant(&mut self, seat: u8, player: PlayerId) -> bool {
        match self.occupants.get_mut(seat as usize) {
            Some(slot) if *slot == Some(player) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Clear a seat regardless of who holds it (engine-driven ejection)
    pub fn clear_occupant(&mut self, seat: u8) -> Option<PlayerId> {
        self.occupants.get_mut(seat as usize).and_then(Option::take)
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<u8> {
        self.occupants
            .iter()
            .position(|o| *o == Some(player))
            .map(|s| s as u8)
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_some()).count()
    }
}

/// Indexed store of every vehicle this client knows about
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    vehicles: BTreeMap<VehicleId, NetworkVehicle>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vehicle: NetworkVehicle) -> Option<NetworkVehicle> {
        self.vehicles.insert(vehicle.id(), vehicle)
    }

    pub fn remove(&mut self, id: VehicleId) -> Option<NetworkVehicle> {
        self.vehicles.remove(&id)
    }

    pub fn get(&self, id: VehicleId) -> Option<&NetworkVehicle> {
        self.vehicles.get(&id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut NetworkVehicle> {
        self.vehicles.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkVehicle> {
        self.vehicles.values()
    }

    /// Vehicles currently spawned in the engine
    pub fn streamed_in(&self) -> impl Iterator<Item = &NetworkVehicle> {
        self.vehicles.values().filter(|v| v.is_streamed_in())
    }

    pub fn by_handle(&self, handle: VehicleHandle) -> Option<&NetworkVehicle> {
        self.streamed_in().find(|v| v.handle() == Some(handle))
    }

    /// Every (vehicle, seat) the player occupies. More than one entry means
    /// the occupancy invariant is broken.
    pub fn seats_of(&self, player: PlayerId) -> Vec<(VehicleId, u8)> {
        self.vehicles
            .values()
            .filter_map(|v| v.seat_of(player).map(|seat| (v.id(), seat)))
            .collect()
    }
}
