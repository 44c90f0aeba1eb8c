//! Player Sync Client - client-side player possession and interpolation
//!
//! Keeps remote players' positions, vehicle occupancy, attributes and inputs
//! consistent with an authority while the local simulation runs at its own
//! rate:
//! - Vehicle entry/exit negotiation against the simulation and the authority
//! - Interpolation of position corrections
//! - Health/armour locks
//! - Input replication with edge detection

pub mod app;
pub mod config;
pub mod net;
pub mod player;
pub mod util;
pub mod world;
