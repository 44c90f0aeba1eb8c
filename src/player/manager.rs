//! Owner of every player and of the vehicle registry
//!
//! `pulse()` drives one tick in a fixed order: control replication and lock
//! maintenance, inbound message application, possession processing, then
//! interpolation.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, info, trace};

use super::kill_info::{resolve_killer, KillInfo};
use super::network_player::{NetworkPlayer, SpawnError};
use super::possession::ExitVehicleMode;
use crate::net::protocol::ServerMsg;
use crate::net::transport::Transport;
use crate::util::time::Clock;
use crate::util::Vec3;
use crate::world::{PlayerId, Simulation, TickContext, VehicleId, VehicleRegistry};

pub struct PlayerManager {
    players: BTreeMap<PlayerId, NetworkPlayer>,
    local_id: PlayerId,
    vehicles: VehicleRegistry,
    /// Messages received since the last pulse
    inbound: VecDeque<ServerMsg>,
    /// Highest sync sequence applied per remote player
    last_sync_seq: HashMap<PlayerId, u32>,
    /// Interpolation window for sync updates
    sync_delay_ms: u64,
}

impl PlayerManager {
    pub fn new(local_id: PlayerId, sim: &dyn Simulation, sync_delay_ms: u64) -> Self {
        let mut players = BTreeMap::new();
        players.insert(local_id, NetworkPlayer::new_local(local_id, sim));

        Self {
            players,
            local_id,
            vehicles: VehicleRegistry::new(),
            inbound: VecDeque::new(),
            last_sync_seq: HashMap::new(),
            sync_delay_ms,
        }
    }

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    pub fn local_player(&self) -> Option<&NetworkPlayer> {
        self.players.get(&self.local_id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&NetworkPlayer> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut NetworkPlayer> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &NetworkPlayer> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn vehicles(&self) -> &VehicleRegistry {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut VehicleRegistry {
        &mut self.vehicles
    }

    /// Register a remote player. Returns false if the id is taken.
    pub fn add_remote(&mut self, id: PlayerId, model: u32) -> bool {
        if self.players.contains_key(&id) {
            return false;
        }
        self.players.insert(id, NetworkPlayer::new_remote(id, model));
        info!(player_id = %id, "Remote player added");
        true
    }

    /// Forget a remote player, releasing its ped and seat
    pub fn remove_player(&mut self, id: PlayerId, sim: &mut dyn Simulation) -> bool {
        if id == self.local_id {
            return false;
        }
        let Some(mut player) = self.players.remove(&id) else {
            return false;
        };
        player.destroy(sim, &mut self.vehicles);
        self.last_sync_seq.remove(&id);
        info!(player_id = %id, "Remote player removed");
        true
    }

    pub fn stream_in(&mut self, id: PlayerId, sim: &mut dyn Simulation) -> Result<(), SpawnError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(SpawnError::UnknownPlayer(id))?;
        player.stream_in(sim)
    }

    pub fn stream_out(&mut self, id: PlayerId, sim: &mut dyn Simulation) {
        if let Some(player) = self.players.get_mut(&id) {
            player.stream_out(sim, &mut self.vehicles);
        }
    }

    /// Queue a message for the next pulse
    pub fn queue_inbound(&mut self, msg: ServerMsg) {
        self.inbound.push_back(msg);
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Run `f` against one player with a tick context built from the parts
    pub fn with_player<R>(
        &mut self,
        id: PlayerId,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        clock: &dyn Clock,
        f: impl FnOnce(&mut NetworkPlayer, &mut TickContext<'_>) -> R,
    ) -> Option<R> {
        let player = self.players.get_mut(&id)?;
        let mut ctx = TickContext::new(sim, &mut self.vehicles, transport, clock);
        Some(f(player, &mut ctx))
    }

    /// Drive one tick
    pub fn pulse(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport, clock: &dyn Clock) {
        let Self {
            players,
            vehicles,
            inbound,
            last_sync_seq,
            sync_delay_ms,
            ..
        } = self;
        let mut ctx = TickContext::new(sim, vehicles, transport, clock);

        for player in players.values_mut() {
            player.sample_local_controls(ctx.sim);
            player.maintain_locks(ctx.sim);
        }

        while let Some(msg) = inbound.pop_front() {
            apply_inbound(players, last_sync_seq, *sync_delay_ms, &mut ctx, msg);
        }

        for player in players.values_mut() {
            player.process_vehicle_entry_exit(&mut ctx);
            player.check_vehicle_entry_exit_key(&mut ctx);
            player.check_vehicle_death(&mut ctx);
        }

        let now = ctx.now_millis();
        for player in players.values_mut() {
            if !player.is_in_vehicle() && !player.enter_exit().in_transition() {
                player.update_target_position(ctx.sim, now);
            }
        }

        trace!(players = players.len(), now, "Pulse complete");
    }

    pub fn set_target_position(
        &mut self,
        id: PlayerId,
        sim: &mut dyn Simulation,
        clock: &dyn Clock,
        position: Vec3,
        delay_ms: u64,
    ) {
        if let Some(player) = self.players.get_mut(&id) {
            player.set_target_position(sim, position, delay_ms, clock.now_millis());
        }
    }

    pub fn request_enter_vehicle(
        &mut self,
        id: PlayerId,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        clock: &dyn Clock,
        vehicle_id: VehicleId,
        seat: u8,
    ) {
        self.with_player(id, sim, transport, clock, |player, ctx| {
            player.request_enter_vehicle(ctx, vehicle_id, seat)
        });
    }

    pub fn request_exit_vehicle(
        &mut self,
        id: PlayerId,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        clock: &dyn Clock,
        mode: ExitVehicleMode,
    ) {
        self.with_player(id, sim, transport, clock, |player, ctx| {
            player.request_exit_vehicle(ctx, mode)
        });
    }

    pub fn lock_health(&mut self, id: PlayerId, sim: &mut dyn Simulation, health: u32) {
        if let Some(player) = self.players.get_mut(&id) {
            player.lock_health(sim, health);
        }
    }

    pub fn lock_armour(&mut self, id: PlayerId, sim: &mut dyn Simulation, armour: u32) {
        if let Some(player) = self.players.get_mut(&id) {
            player.lock_armour(sim, armour);
        }
    }

    pub fn kill(&mut self, id: PlayerId, sim: &mut dyn Simulation, instantly: bool) {
        if let Some(player) = self.players.get_mut(&id) {
            player.kill(sim, instantly);
        }
    }

    /// Killer of `victim`, if the victim is spawned
    pub fn resolve_killer(&self, victim: PlayerId, sim: &dyn Simulation) -> Option<KillInfo> {
        let player = self.players.get(&victim)?;
        resolve_killer(player, &self.players, &self.vehicles, sim)
    }
}

fn apply_inbound(
    players: &mut BTreeMap<PlayerId, NetworkPlayer>,
    last_sync_seq: &mut HashMap<PlayerId, u32>,
    sync_delay_ms: u64,
    ctx: &mut TickContext<'_>,
    msg: ServerMsg,
) {
    let player_id = msg.player_id();
    let Some(player) = players.get_mut(&player_id) else {
        debug!(player_id = %player_id, "Message for unknown player dropped");
        return;
    };

    let ServerMsg::PlayerSync {
        seq,
        position,
        health,
        armour,
        controls,
        ..
    } = msg
    else {
        player.handle_server_msg(ctx, &msg);
        return;
    };

    if player.is_local() {
        debug!(player_id = %player_id, "Sync update for the local player ignored");
        return;
    }
    if let Some(&last) = last_sync_seq.get(&player_id) {
        if seq <= last {
            trace!(player_id = %player_id, seq, last, "Stale sync update dropped");
            return;
        }
    }
    last_sync_seq.insert(player_id, seq);

    player.set_control_state(ctx.sim, controls);
    if !player.is_in_vehicle() && !player.enter_exit().in_transition() {
        let now = ctx.now_millis();
        player.set_target_position(ctx.sim, position, sync_delay_ms, now);
    }
    player.lock_health(ctx.sim, health);
    player.lock_armour(ctx.sim, armour);
}
