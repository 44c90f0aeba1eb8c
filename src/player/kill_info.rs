//! Killer attribution from last-damage information

use std::collections::BTreeMap;

use super::network_player::NetworkPlayer;
use crate::world::vehicle::DRIVER_SEAT;
use crate::world::{EntityRef, PlayerId, Simulation, VehicleId, VehicleRegistry};

/// Who killed a player, as far as this client can tell. `weapon` is the
/// killer's current weapon and stays `None` without a killing player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KillInfo {
    pub killer: Option<PlayerId>,
    pub vehicle: Option<VehicleId>,
    pub weapon: Option<u32>,
}

/// Resolve the killer of `victim`. `None` while the victim is despawned.
pub fn resolve_killer(
    victim: &NetworkPlayer,
    players: &BTreeMap<PlayerId, NetworkPlayer>,
    vehicles: &VehicleRegistry,
    sim: &dyn Simulation,
) -> Option<KillInfo> {
    let victim_ped = victim.ped()?;
    let mut info = KillInfo::default();

    let Some(source) = sim.last_damage_entity(victim_ped) else {
        return Some(info);
    };

    for player in players.values() {
        let Some(ped) = player.ped() else {
            continue;
        };

        if source == EntityRef::Ped(ped) {
            info.killer = Some(player.id());
            info.weapon = Some(sim.current_weapon(ped));
            return Some(info);
        }

        if let Some(occupancy) = player.occupancy() {
            if occupancy.seat != DRIVER_SEAT {
                continue;
            }
            let handle = vehicles.get(occupancy.vehicle).and_then(|v| v.handle());
            if let Some(handle) = handle {
                if source == EntityRef::Vehicle(handle) {
                    info.killer = Some(player.id());
                    info.vehicle = Some(occupancy.vehicle);
                    info.weapon = Some(sim.current_weapon(ped));
                    return Some(info);
                }
            }
        }
    }

    if let EntityRef::Vehicle(handle) = source {
        info.vehicle = vehicles.by_handle(handle).map(|v| v.id());
    }

    Some(info)
}
