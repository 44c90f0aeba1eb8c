//! Vehicle enter/exit and player sync message definitions
//! These are the logical messages exchanged with the session authority

use serde::{Deserialize, Serialize};

use crate::player::controls::ControlState;
use crate::player::possession::ExitVehicleMode;
use crate::util::Vec3;
use crate::world::{PlayerId, VehicleId};

/// Delivery class a message must be sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Delivered, in send order
    ReliableOrdered,
    /// May be lost; late arrivals are dropped
    UnreliableSequenced,
}

/// Messages sent from this client to the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Ask for a seat in a network vehicle
    EntryRequest {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Entry animation finished and the seat is taken
    EntryComplete {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Entry was interrupted before the player was seated
    EntryCancelled {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Ask to leave the current network vehicle
    ExitRequest {
        player_id: PlayerId,
        vehicle_id: VehicleId,
    },

    /// Exit animation finished and the seat is free
    ExitComplete {
        player_id: PlayerId,
        vehicle_id: VehicleId,
    },

    /// Player left the vehicle without an exit (ejected, vehicle destroyed)
    ExitForceful {
        player_id: PlayerId,
        vehicle_id: VehicleId,
    },

    /// A driverless vehicle this client occupies was destroyed
    VehicleDied {
        vehicle_id: VehicleId,
    },
}

impl ClientMsg {
    pub fn reliability(&self) -> Reliability {
        match self {
            ClientMsg::VehicleDied { .. } => Reliability::UnreliableSequenced,
            _ => Reliability::ReliableOrdered,
        }
    }
}

/// Messages delivered to this client by the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Entry approved; start the entry animation
    EntryGranted {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Exit approved; start the exit animation
    ExitGranted {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        mode: ExitVehicleMode,
    },

    /// Place the player in the seat directly
    EntryComplete {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Entry denied or abandoned
    EntryCancelled {
        player_id: PlayerId,
        vehicle_id: VehicleId,
        seat: u8,
    },

    /// Take the player out of the vehicle directly
    ExitComplete {
        player_id: PlayerId,
        vehicle_id: VehicleId,
    },

    /// Player was forced out on another machine
    ExitForceful {
        player_id: PlayerId,
        vehicle_id: VehicleId,
    },

    /// Periodic on-foot state of a remote player
    PlayerSync {
        player_id: PlayerId,
        /// Increases per update; older updates are dropped
        seq: u32,
        position: Vec3,
        health: u32,
        armour: u32,
        controls: ControlState,
    },
}

impl ServerMsg {
    /// Player the message is addressed to
    pub fn player_id(&self) -> PlayerId {
        match self {
            ServerMsg::EntryGranted { player_id, .. }
            | ServerMsg::ExitGranted { player_id, .. }
            | ServerMsg::EntryComplete { player_id, .. }
            | ServerMsg::EntryCancelled { player_id, .. }
            | ServerMsg::ExitComplete { player_id, .. }
            | ServerMsg::ExitForceful { player_id, .. }
            | ServerMsg::PlayerSync { player_id, .. } => *player_id,
        }
    }
}

/// Outbound frame: a message tagged with its delivery class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub reliability: Reliability,
    pub msg: ClientMsg,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn encode_frame(frame: &Frame) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(frame)?)
}

pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_server_msg(msg: &ServerMsg) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode_server_msg(text: &str) -> Result<ServerMsg, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}
