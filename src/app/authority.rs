//! Loopback session authority for the headless harness
//!
//! Grants entry and exit requests, tracks who holds which seat, and sends
//! the answers back as JSON frames. It stands in for the remote server.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::net::protocol::{decode_frame, encode_server_msg, ClientMsg, ServerMsg};
use crate::player::possession::ExitVehicleMode;
use crate::world::{PlayerId, VehicleId};

pub struct LoopbackAuthority {
    /// (vehicle, seat) -> holder
    seats: Arc<DashMap<(VehicleId, u8), PlayerId>>,
}

impl LoopbackAuthority {
    pub fn new() -> Self {
        Self {
            seats: Arc::new(DashMap::new()),
        }
    }

    /// Seat table shared with observers
    pub fn seats(&self) -> Arc<DashMap<(VehicleId, u8), PlayerId>> {
        self.seats.clone()
    }

    fn seat_free_for(&self, vehicle_id: VehicleId, seat: u8, player_id: PlayerId) -> bool {
        self.seats
            .get(&(vehicle_id, seat))
            .map(|holder| *holder == player_id)
            .unwrap_or(true)
    }

    fn release_all(&self, vehicle_id: VehicleId, player_id: PlayerId) {
        self.seats
            .retain(|(vehicle, _), holder| !(*vehicle == vehicle_id && *holder == player_id));
    }

    /// Answer one client intent
    pub fn handle(&self, msg: ClientMsg) -> Option<ServerMsg> {
        match msg {
            ClientMsg::EntryRequest {
                player_id,
                vehicle_id,
                seat,
            } => {
                if self.seat_free_for(vehicle_id, seat, player_id) {
                    info!(player_id = %player_id, vehicle_id = %vehicle_id, seat, "Entry granted");
                    Some(ServerMsg::EntryGranted {
                        player_id,
                        vehicle_id,
                        seat,
                    })
                } else {
                    info!(player_id = %player_id, vehicle_id = %vehicle_id, seat, "Entry denied, seat taken");
                    Some(ServerMsg::EntryCancelled {
                        player_id,
                        vehicle_id,
                        seat,
                    })
                }
            }
            ClientMsg::EntryComplete {
                player_id,
                vehicle_id,
                seat,
            } => {
                self.seats.insert((vehicle_id, seat), player_id);
                None
            }
            ClientMsg::EntryCancelled { .. } => None,
            ClientMsg::ExitRequest {
                player_id,
                vehicle_id,
            } => Some(ServerMsg::ExitGranted {
                player_id,
                vehicle_id,
                mode: ExitVehicleMode::Normal,
            }),
            ClientMsg::ExitComplete {
                player_id,
                vehicle_id,
            }
            | ClientMsg::ExitForceful {
                player_id,
                vehicle_id,
            } => {
                self.release_all(vehicle_id, player_id);
                None
            }
            ClientMsg::VehicleDied { vehicle_id } => {
                warn!(vehicle_id = %vehicle_id, "Vehicle reported dead");
                self.seats.retain(|(vehicle, _), _| *vehicle != vehicle_id);
                None
            }
        }
    }

    /// Consume outbound frames until the channel closes
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<String>, tx: mpsc::Sender<String>) {
        info!("Loopback authority started");

        while let Some(text) = rx.recv().await {
            let frame = match decode_frame(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Failed to parse client frame");
                    continue;
                }
            };

            debug!(reliability = ?frame.reliability, msg = ?frame.msg, "Client frame");
            let Some(reply) = self.handle(frame.msg) else {
                continue;
            };

            match encode_server_msg(&reply) {
                Ok(json) => {
                    if tx.send(json).await.is_err() {
                        debug!("Reply channel closed");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to encode reply"),
            }
        }

        info!("Loopback authority stopped");
    }
}

impl Default for LoopbackAuthority {
    fn default() -> Self {
        Self::new()
    }
}
