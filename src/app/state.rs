//! Headless harness state: world, players and the scripted session

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::authority::LoopbackAuthority;
use crate::config::Config;
use crate::net::protocol::{decode_server_msg, ServerMsg};
use crate::net::transport::ChannelTransport;
use crate::player::{ControlState, PlayerManager};
use crate::util::time::{tick_duration, unix_millis, SystemClock, Timer};
use crate::util::Vec3;
use crate::world::vehicle::NetworkVehicle;
use crate::world::{HeadlessSimulation, PlayerId, VehicleId};

/// Id the local player is known by
pub const LOCAL_PLAYER_ID: PlayerId = PlayerId(0);

/// Vehicle models the harness picks from
const VEHICLE_MODELS: [u16; 6] = [2, 12, 20, 31, 90, 170];

/// Seconds between scripted enter/exit key presses
const KEY_CYCLE_SECS: u64 = 3;

/// Ticks between remote sync updates
const SYNC_EVERY_TICKS: u64 = 3;

/// Chance per tick that the local ped is thrown out of its vehicle
const EJECT_CHANCE: f64 = 0.002;

/// Channel ends the loopback authority runs on
pub struct AuthorityLink {
    pub authority: LoopbackAuthority,
    pub frames: mpsc::UnboundedReceiver<String>,
    pub replies: mpsc::Sender<String>,
}

/// Counters reported while the harness runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessSummary {
    pub tick: u64,
    pub players: usize,
    pub spawned: usize,
    pub seated: usize,
    pub vehicles: usize,
}

pub struct Harness {
    config: Config,
    sim: HeadlessSimulation,
    manager: PlayerManager,
    clock: SystemClock,
    transport: ChannelTransport,
    replies: mpsc::Receiver<String>,
    rng: ChaCha8Rng,
    tick: u64,
    started_at: u64,
    sync_seq: u32,
    /// Where each scripted remote player is heading
    remote_positions: BTreeMap<PlayerId, Vec3>,
    use_horn: bool,
    eject_chance: f64,
}

impl Harness {
    pub fn new(config: Config) -> (Self, AuthorityLink) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel::<String>(256);

        let mut rng = ChaCha8Rng::seed_from_u64(config.world_seed);
        let mut sim = HeadlessSimulation::new(config.remote_players as usize);
        let mut manager = PlayerManager::new(LOCAL_PLAYER_ID, &sim, config.sync_delay_ms);

        for i in 0..config.vehicles {
            let position = if i == 0 {
                Vec3::new(2.0, 0.0, 0.0)
            } else {
                Vec3::new(i as f32 * 8.0, rng.gen_range(-4.0..4.0), 0.0)
            };
            let model = VEHICLE_MODELS[rng.gen_range(0..VEHICLE_MODELS.len())];
            let network = i % 2 == 0;
            let mut vehicle = NetworkVehicle::new(VehicleId(i), model, 3, network);
            vehicle.stream_in(sim.add_vehicle(position));
            manager.vehicles_mut().insert(vehicle);
        }

        let mut remote_positions = BTreeMap::new();
        for i in 1..=config.remote_players {
            let id = PlayerId(i);
            manager.add_remote(id, 0);
            if let Err(e) = manager.stream_in(id, &mut sim) {
                warn!(player_id = %id, error = %e, "Failed to stream in remote player");
                continue;
            }
            remote_positions.insert(id, Vec3::new(0.0, 10.0 + i as f32 * 3.0, 0.0));
        }

        info!(
            vehicles = config.vehicles,
            remote_players = config.remote_players,
            seed = config.world_seed,
            "Harness world ready"
        );

        let harness = Self {
            config,
            sim,
            manager,
            clock: SystemClock::new(),
            transport: ChannelTransport::new(frame_tx),
            replies: reply_rx,
            rng,
            tick: 0,
            started_at: unix_millis(),
            sync_seq: 0,
            remote_positions,
            use_horn: false,
            eject_chance: EJECT_CHANCE,
        };

        let link = AuthorityLink {
            authority: LoopbackAuthority::new(),
            frames: frame_rx,
            replies: reply_tx,
        };

        (harness, link)
    }

    pub fn manager(&self) -> &PlayerManager {
        &self.manager
    }

    pub fn sim(&self) -> &HeadlessSimulation {
        &self.sim
    }

    /// Chance per tick that the seated local ped gets ejected (0 disables)
    pub fn set_eject_chance(&mut self, chance: f64) {
        self.eject_chance = chance.clamp(0.0, 1.0);
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Pulse on the configured interval until `run_ticks` is reached
    pub async fn run(&mut self) {
        let mut tick_interval = interval(tick_duration(self.config.tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.tick();

            if self.config.run_ticks != 0 && self.tick >= self.config.run_ticks {
                info!(ticks = self.tick, "Tick budget reached");
                break;
            }
        }
    }

    /// One harness frame: inbound replies, scripted input, pulse, engine step
    pub fn tick(&mut self) {
        let timer = Timer::new();

        self.drain_replies();
        self.script_local_input();
        if self.tick % SYNC_EVERY_TICKS == 0 {
            self.script_remote_sync();
        }

        self.manager
            .pulse(&mut self.sim, &mut self.transport, &self.clock);
        self.sim.step();
        self.tick += 1;

        debug!(tick = self.tick, elapsed_ms = timer.elapsed_ms(), "Harness tick");

        let report_every = self.config.tick_rate.max(1) as u64 * 5;
        if self.tick % report_every == 0 {
            let summary = self.summary();
            info!(
                tick = summary.tick,
                players = summary.players,
                spawned = summary.spawned,
                seated = summary.seated,
                vehicles = summary.vehicles,
                uptime_ms = unix_millis().saturating_sub(self.started_at),
                "Harness status"
            );
        }
    }

    fn drain_replies(&mut self) {
        while let Ok(text) = self.replies.try_recv() {
            match decode_server_msg(&text) {
                Ok(msg) => self.manager.queue_inbound(msg),
                Err(e) => warn!(error = %e, "Failed to parse authority reply"),
            }
        }
    }

    fn script_local_input(&mut self) {
        let cycle = KEY_CYCLE_SECS * self.config.tick_rate.max(1) as u64;
        let phase = self.tick % cycle;
        if phase == 0 {
            self.use_horn = self.rng.gen_bool(0.3);
        }

        // Held for one tick: press edge on phase 0, release edge on phase 1
        let held = phase == 0;
        let input = ControlState {
            move_x: self.rng.gen_range(-1.0..1.0),
            move_y: self.rng.gen_range(-1.0..1.0),
            enter_exit_vehicle: held && !self.use_horn,
            horn: held && self.use_horn,
            ..ControlState::default()
        };
        self.sim.set_local_input(input);

        let local_ped = self.manager.local_player().and_then(|p| p.ped());
        let seated = self.manager.local_player().map(|p| p.is_in_vehicle()).unwrap_or(false);
        if let (Some(ped), true) = (local_ped, seated) {
            if self.eject_chance > 0.0 && self.rng.gen_bool(self.eject_chance) {
                info!("Ejecting local player");
                self.sim.eject(ped);
            }
        }
    }

    fn script_remote_sync(&mut self) {
        self.sync_seq = self.sync_seq.wrapping_add(1);
        for (id, position) in self.remote_positions.iter_mut() {
            *position += Vec3::new(
                self.rng.gen_range(-0.5..0.5),
                self.rng.gen_range(-0.5..0.5),
                0.0,
            );

            self.manager.queue_inbound(ServerMsg::PlayerSync {
                player_id: *id,
                seq: self.sync_seq,
                position: *position,
                health: 200,
                armour: 0,
                controls: ControlState {
                    sprint: self.rng.gen_bool(0.2),
                    ..ControlState::default()
                },
            });
        }
    }

    pub fn summary(&self) -> HarnessSummary {
        let players = self.manager.player_count();
        let spawned = self.manager.players().filter(|p| p.is_spawned()).count();
        let seated = self.manager.players().filter(|p| p.is_in_vehicle()).count();
        HarnessSummary {
            tick: self.tick,
            players,
            spawned,
            seated,
            vehicles: self.manager.vehicles().len(),
        }
    }
}
