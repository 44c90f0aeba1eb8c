//! Player entities: possession, interpolation, attribute locks and input

pub mod attribute_lock;
pub mod clothes;
pub mod controls;
pub mod interpolation;
pub mod kill_info;
pub mod manager;
pub mod network_player;
pub mod possession;

pub use controls::{Control, ControlState};
pub use kill_info::KillInfo;
pub use manager::PlayerManager;
pub use network_player::{NetworkPlayer, SpawnError};
pub use possession::{ExitVehicleMode, PossessionState, SeatRef};
