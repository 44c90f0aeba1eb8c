//! World-side bookkeeping shared by every player
//!
//! Entities are addressed by network ids and simulation handles, never by
//! references. A lookup against an id that is no longer registered reads as
//! "not present".

pub mod headless;
pub mod simulation;
pub mod vehicle;

pub use headless::HeadlessSimulation;
pub use simulation::{
    Action, ActionKind, ActionPriority, Door, EntityRef, ExitStyle, PedHandle, Simulation,
    VehicleHandle,
};
pub use vehicle::{NetworkVehicle, VehicleRegistry};

use serde::{Deserialize, Serialize};

use crate::net::transport::Transport;
use crate::util::time::Clock;

/// Network identity of a connected player, stable for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u16);

/// Network identity of a vehicle tracked by the sync layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u16);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a player needs to run one tick: the simulation, the vehicle
/// store, the outbound transport and the clock.
pub struct TickContext<'a> {
    pub sim: &'a mut dyn Simulation,
    pub vehicles: &'a mut VehicleRegistry,
    pub transport: &'a mut dyn Transport,
    pub clock: &'a dyn Clock,
}

impl<'a> TickContext<'a> {
    pub fn new(
        sim: &'a mut dyn Simulation,
        vehicles: &'a mut VehicleRegistry,
        transport: &'a mut dyn Transport,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            sim,
            vehicles,
            transport,
            clock,
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }
}
