//! End-to-end possession scenarios against the headless world

use player_sync_client::net::protocol::{decode_frame, ClientMsg, Reliability, ServerMsg};
use player_sync_client::net::transport::{ChannelTransport, RecordingTransport, Transport};
use player_sync_client::player::possession::MAX_ENTRY_RESTARTS;
use player_sync_client::player::{
    ControlState, ExitVehicleMode, KillInfo, PlayerManager, PossessionState,
};
use player_sync_client::util::time::ManualClock;
use player_sync_client::util::Vec3;
use player_sync_client::world::{
    ActionPriority, EntityRef, HeadlessSimulation, NetworkVehicle, PlayerId, Simulation,
    VehicleHandle, VehicleId,
};
use tokio::sync::mpsc;

const LOCAL: PlayerId = PlayerId(0);

struct World {
    sim: HeadlessSimulation,
    manager: PlayerManager,
    transport: RecordingTransport,
    clock: ManualClock,
}

impl World {
    fn new() -> Self {
        let sim = HeadlessSimulation::new(8);
        let manager = PlayerManager::new(LOCAL, &sim, 100);
        Self {
            sim,
            manager,
            transport: RecordingTransport::new(),
            clock: ManualClock::new(1_000),
        }
    }

    fn add_vehicle(&mut self, id: u16, position: Vec3, network: bool) -> VehicleHandle {
        let handle = self.sim.add_vehicle(position);
        let mut vehicle = NetworkVehicle::new(VehicleId(id), 20, 3, network);
        vehicle.stream_in(handle);
        self.manager.vehicles_mut().insert(vehicle);
        handle
    }

    fn add_remote(&mut self, id: u16) {
        assert!(self.manager.add_remote(PlayerId(id), 0));
        self.manager.stream_in(PlayerId(id), &mut self.sim).unwrap();
    }

    fn pulse(&mut self) {
        self.manager
            .pulse(&mut self.sim, &mut self.transport, &self.clock);
    }

    /// Pulse, then advance the engine one frame
    fn tick(&mut self) {
        self.pulse();
        self.sim.step();
        self.clock.advance(33);
    }

    /// Hold `input` for one tick, then let go for one tick
    fn tap(&mut self, input: ControlState) {
        self.sim.set_local_input(input);
        self.tick();
        self.sim.set_local_input(ControlState::NEUTRAL);
        self.tick();
    }

    fn tap_enter_exit(&mut self) {
        self.tap(ControlState {
            enter_exit_vehicle: true,
            ..ControlState::NEUTRAL
        });
    }

    fn state(&self, id: PlayerId) -> PossessionState {
        self.manager.player(id).unwrap().possession_state()
    }

    fn sent(&mut self) -> Vec<(ClientMsg, Reliability)> {
        self.transport.drain()
    }

    fn seat_local(&mut self, vehicle: u16, seat: u8) {
        self.manager.queue_inbound(ServerMsg::EntryComplete {
            player_id: LOCAL,
            vehicle_id: VehicleId(vehicle),
            seat,
        });
        self.pulse();
        assert_eq!(
            self.state(LOCAL),
            PossessionState::InVehicle {
                vehicle: VehicleId(vehicle),
                seat
            }
        );
    }

    fn assert_invariants(&self) {
        for player in self.manager.players() {
            let ee = player.enter_exit();
            assert!(!(ee.is_entering() && ee.is_exiting()), "{} both entering and exiting", player.id());
            assert!(self.manager.vehicles().seats_of(player.id()).len() <= 1);
        }
    }
}

#[test]
fn horn_release_requests_a_passenger_seat_and_entry_complete_seats_the_player() {
    let mut world = World::new();
    world.add_vehicle(4, Vec3::new(3.0, 0.0, 0.0), true);

    world.tap(ControlState {
        horn: true,
        ..ControlState::NEUTRAL
    });

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::EntryRequest {
                player_id: LOCAL,
                vehicle_id: VehicleId(4),
                seat: 1,
            },
            Reliability::ReliableOrdered
        )]
    );
    assert_eq!(
        world.state(LOCAL),
        PossessionState::RequestingEntry {
            vehicle: VehicleId(4),
            seat: 1
        }
    );

    world.seat_local(4, 1);

    let vehicle = world.manager.vehicles().get(VehicleId(4)).unwrap();
    assert_eq!(vehicle.occupant(1), Some(LOCAL));
    assert_eq!(vehicle.driver(), None);
    assert!(world.sent().is_empty());
    world.assert_invariants();
}

#[test]
fn cleared_occupant_slot_forces_the_player_out() {
    let mut world = World::new();
    let handle = world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), true);
    world.seat_local(1, 0);
    assert_eq!(world.sim.ped_vehicle(world.sim.local_ped()), Some(handle));

    world
        .manager
        .vehicles_mut()
        .get_mut(VehicleId(1))
        .unwrap()
        .clear_occupant(0);
    world.pulse();

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::ExitForceful {
                player_id: LOCAL,
                vehicle_id: VehicleId(1),
            },
            Reliability::ReliableOrdered
        )]
    );
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(world.sim.ped_vehicle(world.sim.local_ped()), None);
    assert_eq!(world.manager.vehicles().get(VehicleId(1)).unwrap().occupant_count(), 0);
}

#[test]
fn ejected_ped_is_forced_out_and_releases_the_seat() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), true);
    world.seat_local(1, 0);

    world.sim.eject(world.sim.local_ped());
    world.pulse();

    let sent = world.sent();
    assert!(sent.iter().any(|(msg, _)| matches!(msg, ClientMsg::ExitForceful { .. })));
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(world.manager.vehicles().get(VehicleId(1)).unwrap().driver(), None);
}

#[test]
fn locked_health_survives_external_writes() {
    let mut world = World::new();
    let ped = world.sim.local_ped();

    world.manager.lock_health(LOCAL, &mut world.sim, 50);
    world.sim.set_ped_health(ped, 10);
    assert_eq!(world.manager.local_player().unwrap().health(&world.sim), 50);

    world.pulse();
    assert_eq!(world.sim.ped_health(ped), 50);
    assert_eq!(world.manager.local_player().unwrap().health(&world.sim), 50);

    world
        .manager
        .player_mut(LOCAL)
        .unwrap()
        .set_health(&mut world.sim, 80);
    world.sim.set_ped_health(ped, 10);
    world.pulse();
    assert_eq!(world.sim.ped_health(ped), 10);
}

#[test]
fn closest_vehicle_within_reach_is_entered() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(5.5, 0.0, 0.0), false);
    world.add_vehicle(2, Vec3::new(0.0, 3.0, 0.0), false);

    world.tap_enter_exit();

    assert_eq!(
        world.state(LOCAL),
        PossessionState::Entering {
            vehicle: VehicleId(2),
            seat: 0
        }
    );
    assert!(world.sent().is_empty());
}

#[test]
fn nothing_happens_when_every_vehicle_is_out_of_reach() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(7.0, 0.0, 0.0), true);
    world.add_vehicle(2, Vec3::new(0.0, -8.0, 0.0), true);

    world.tap_enter_exit();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert!(world.sent().is_empty());
}

#[test]
fn locked_doors_abandon_entry_silently() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), true);
    world
        .manager
        .vehicles_mut()
        .get_mut(VehicleId(1))
        .unwrap()
        .set_door_lock_state(2);

    world.tap_enter_exit();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert!(world.sent().is_empty());
}

#[test]
fn local_vehicle_round_trip_without_the_authority() {
    let mut world = World::new();
    world.add_vehicle(3, Vec3::new(2.0, 0.0, 0.0), false);

    world.tap_enter_exit();
    for _ in 0..4 {
        world.tick();
        world.assert_invariants();
    }
    assert_eq!(
        world.state(LOCAL),
        PossessionState::InVehicle {
            vehicle: VehicleId(3),
            seat: 0
        }
    );
    assert_eq!(
        world.manager.vehicles().get(VehicleId(3)).unwrap().driver(),
        Some(LOCAL)
    );

    // Exit fires on the press edge
    world.sim.set_local_input(ControlState {
        enter_exit_vehicle: true,
        ..ControlState::NEUTRAL
    });
    world.pulse();
    assert_eq!(
        world.state(LOCAL),
        PossessionState::Exiting {
            vehicle: VehicleId(3),
            seat: 0
        }
    );

    world.sim.set_local_input(ControlState::NEUTRAL);
    for _ in 0..5 {
        world.tick();
        world.assert_invariants();
    }
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(world.manager.vehicles().get(VehicleId(3)).unwrap().driver(), None);
    assert!(world.sent().is_empty());
}

#[test]
fn granted_network_entry_reports_completion() {
    let mut world = World::new();
    world.add_vehicle(6, Vec3::new(2.0, 0.0, 0.0), true);

    world.tap_enter_exit();
    assert_eq!(world.sent().len(), 1);

    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(6),
        seat: 0,
    });
    world.tick();
    assert_eq!(
        world.state(LOCAL),
        PossessionState::Entering {
            vehicle: VehicleId(6),
            seat: 0
        }
    );

    for _ in 0..4 {
        world.tick();
        world.assert_invariants();
    }

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::EntryComplete {
                player_id: LOCAL,
                vehicle_id: VehicleId(6),
                seat: 0,
            },
            Reliability::ReliableOrdered
        )]
    );
    let handle = world.manager.vehicles().get(VehicleId(6)).unwrap().handle().unwrap();
    assert!(world.sim.vehicle(handle).unwrap().damageable);
}

#[test]
fn unrequested_grant_is_ignored_for_the_local_player() {
    let mut world = World::new();
    world.add_vehicle(6, Vec3::new(2.0, 0.0, 0.0), true);

    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(6),
        seat: 0,
    });
    world.pulse();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
}

#[test]
fn second_press_while_requesting_sends_nothing() {
    let mut world = World::new();
    world.add_vehicle(6, Vec3::new(2.0, 0.0, 0.0), true);

    world.tap_enter_exit();
    world.tap_enter_exit();

    assert_eq!(world.sent().len(), 1);
}

#[test]
fn aborted_local_entry_is_reported_as_cancelled() {
    let mut world = World::new();
    let handle = world.add_vehicle(6, Vec3::new(2.0, 0.0, 0.0), true);

    world.tap_enter_exit();
    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(6),
        seat: 0,
    });
    world.pulse();
    world.sent();

    world
        .sim
        .abort_action(world.sim.local_ped(), ActionPriority::Primary);
    world.pulse();

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::EntryCancelled {
                player_id: LOCAL,
                vehicle_id: VehicleId(6),
                seat: 0,
            },
            Reliability::ReliableOrdered
        )]
    );
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert!(!world.sim.vehicle(handle).unwrap().damageable);
}

#[test]
fn aborted_remote_entry_restarts_a_bounded_number_of_times() {
    let mut world = World::new();
    world.add_remote(1);
    world.add_vehicle(6, Vec3::new(2.0, 0.0, 0.0), true);
    let remote = PlayerId(1);
    let ped = world.manager.player(remote).unwrap().ped().unwrap();

    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: remote,
        vehicle_id: VehicleId(6),
        seat: 0,
    });
    world.pulse();

    let entering = PossessionState::Entering {
        vehicle: VehicleId(6),
        seat: 0,
    };
    for _ in 0..MAX_ENTRY_RESTARTS {
        world.sim.abort_action(ped, ActionPriority::Primary);
        world.pulse();
        assert_eq!(world.state(remote), entering);
    }

    world.sim.abort_action(ped, ActionPriority::Primary);
    world.pulse();
    assert_eq!(world.state(remote), PossessionState::Idle);
}

#[test]
fn exit_grant_runs_the_exit_and_reports_completion() {
    let mut world = World::new();
    world.add_vehicle(2, Vec3::new(2.0, 0.0, 0.0), true);
    world.seat_local(2, 0);

    world.tap_enter_exit();
    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::ExitRequest {
                player_id: LOCAL,
                vehicle_id: VehicleId(2),
            },
            Reliability::ReliableOrdered
        )]
    );
    assert_eq!(
        world.state(LOCAL),
        PossessionState::RequestingExit {
            vehicle: VehicleId(2),
            seat: 0
        }
    );

    world.manager.queue_inbound(ServerMsg::ExitGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(2),
        mode: Default::default(),
    });
    for _ in 0..5 {
        world.tick();
        world.assert_invariants();
    }

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::ExitComplete {
                player_id: LOCAL,
                vehicle_id: VehicleId(2),
            },
            Reliability::ReliableOrdered
        )]
    );
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    let position = world.manager.local_player().unwrap().position(&world.sim, world.manager.vehicles());
    assert!(position.distance(Vec3::new(3.5, 0.0, 0.0)) < 1e-4);
}

#[test]
fn wrecked_vehicle_is_reported_once_while_leaving() {
    let mut world = World::new();
    let handle = world.add_vehicle(5, Vec3::new(2.0, 0.0, 0.0), false);
    world.seat_local(5, 0);
    world.sim.vehicle_mut(handle).unwrap().health = -50.0;

    world.sim.set_local_input(ControlState {
        enter_exit_vehicle: true,
        ..ControlState::NEUTRAL
    });
    world.pulse();
    assert!(world.sent().is_empty());

    world.sim.vehicle_mut(handle).unwrap().dead = true;
    world.sim.set_local_input(ControlState::NEUTRAL);
    world.pulse();
    world.pulse();

    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::VehicleDied {
                vehicle_id: VehicleId(5)
            },
            Reliability::UnreliableSequenced
        )]
    );
}

#[test]
fn seats_stay_unique_when_the_authority_double_books() {
    let mut world = World::new();
    world.add_remote(1);
    world.add_remote(2);
    world.add_vehicle(8, Vec3::new(20.0, 0.0, 0.0), true);

    for id in [1, 2] {
        world.manager.queue_inbound(ServerMsg::EntryComplete {
            player_id: PlayerId(id),
            vehicle_id: VehicleId(8),
            seat: 0,
        });
        world.pulse();
        world.assert_invariants();
    }

    let vehicle = world.manager.vehicles().get(VehicleId(8)).unwrap();
    assert_eq!(vehicle.driver(), Some(PlayerId(2)));
    assert_eq!(vehicle.occupant_count(), 1);
    assert_eq!(world.state(PlayerId(1)), PossessionState::Idle);
    assert_eq!(
        world.state(PlayerId(2)),
        PossessionState::InVehicle {
            vehicle: VehicleId(8),
            seat: 0
        }
    );
}

#[test]
fn sync_updates_interpolate_to_the_target() {
    let mut world = World::new();
    world.add_remote(1);
    let remote = PlayerId(1);

    world
        .manager
        .set_target_position(remote, &mut world.sim, &world.clock, Vec3::new(3.0, 1.0, 0.0), 1_000);
    for _ in 0..10 {
        world.clock.advance(100);
        world.pulse();
    }

    let player = world.manager.player(remote).unwrap();
    let position = player.position(&world.sim, world.manager.vehicles());
    assert!(position.distance(Vec3::new(3.0, 1.0, 0.0)) < 1e-3);
    assert!(!player.has_target_position());
}

#[test]
fn far_targets_snap_on_the_next_pulse() {
    let mut world = World::new();
    world.add_remote(1);
    let remote = PlayerId(1);
    let target = Vec3::new(40.0, -2.0, 1.0);

    world
        .manager
        .set_target_position(remote, &mut world.sim, &world.clock, target, 1_000);
    world.clock.advance(10);
    world.pulse();

    let player = world.manager.player(remote).unwrap();
    assert_eq!(player.position(&world.sim, world.manager.vehicles()), target);
    assert!(!player.has_target_position());
}

#[test]
fn kills_are_attributed_to_peds_and_drivers() {
    let mut world = World::new();
    world.add_remote(1);
    world.add_remote(2);
    let driven = world.add_vehicle(1, Vec3::new(10.0, 0.0, 0.0), true);
    let parked = world.add_vehicle(2, Vec3::new(30.0, 0.0, 0.0), true);

    world.manager.queue_inbound(ServerMsg::EntryComplete {
        player_id: PlayerId(2),
        vehicle_id: VehicleId(1),
        seat: 0,
    });
    world.pulse();

    let local_ped = world.sim.local_ped();
    let shooter = world.manager.player(PlayerId(1)).unwrap().ped().unwrap();
    let driver = world.manager.player(PlayerId(2)).unwrap().ped().unwrap();
    world.sim.ped_mut(local_ped).unwrap().weapon = 3;
    world.sim.ped_mut(shooter).unwrap().weapon = 15;
    world.sim.ped_mut(driver).unwrap().weapon = 22;

    let info = world.manager.resolve_killer(LOCAL, &world.sim).unwrap();
    assert_eq!(info, KillInfo::default());

    world.sim.ped_mut(local_ped).unwrap().last_damage = Some(EntityRef::Ped(shooter));
    let info = world.manager.resolve_killer(LOCAL, &world.sim).unwrap();
    assert_eq!(info.killer, Some(PlayerId(1)));
    assert_eq!(info.vehicle, None);
    assert_eq!(info.weapon, Some(15));

    world.sim.ped_mut(local_ped).unwrap().last_damage = Some(EntityRef::Vehicle(driven));
    let info = world.manager.resolve_killer(LOCAL, &world.sim).unwrap();
    assert_eq!(info.killer, Some(PlayerId(2)));
    assert_eq!(info.vehicle, Some(VehicleId(1)));
    assert_eq!(info.weapon, Some(22));

    world.sim.ped_mut(local_ped).unwrap().last_damage = Some(EntityRef::Vehicle(parked));
    let info = world.manager.resolve_killer(LOCAL, &world.sim).unwrap();
    assert_eq!(info.killer, None);
    assert_eq!(info.vehicle, Some(VehicleId(2)));
    assert_eq!(info.weapon, None);

    world.manager.stream_out(PlayerId(1), &mut world.sim);
    assert_eq!(world.manager.resolve_killer(PlayerId(1), &world.sim), None);
}

#[test]
fn streaming_out_a_seated_player_frees_the_seat() {
    let mut world = World::new();
    world.add_remote(1);
    world.add_vehicle(1, Vec3::new(10.0, 0.0, 0.0), true);
    world.manager.queue_inbound(ServerMsg::EntryComplete {
        player_id: PlayerId(1),
        vehicle_id: VehicleId(1),
        seat: 2,
    });
    world.pulse();
    assert_eq!(world.manager.vehicles().get(VehicleId(1)).unwrap().occupant(2), Some(PlayerId(1)));

    world.manager.stream_out(PlayerId(1), &mut world.sim);

    let player = world.manager.player(PlayerId(1)).unwrap();
    assert!(!player.is_spawned());
    assert!(!player.is_in_vehicle());
    assert!(player.cached_position().distance(Vec3::new(10.0, 0.0, 0.0)) < 1e-4);
    assert_eq!(world.manager.vehicles().get(VehicleId(1)).unwrap().occupant_count(), 0);
    assert_eq!(world.sim.remote_ped_count(), 0);
}

#[test]
fn captured_input_does_not_trigger_entry() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), false);
    world.sim.set_input_enabled(false);

    world.tap_enter_exit();
    assert_eq!(world.state(LOCAL), PossessionState::Idle);

    world.sim.set_input_enabled(true);
    world.tap_enter_exit();
    assert!(matches!(world.state(LOCAL), PossessionState::Entering { .. }));
}

#[test]
fn vehicle_removed_by_the_engine_unseats_the_passenger() {
    let mut world = World::new();
    let handle = world.add_vehicle(3, Vec3::new(2.0, 0.0, 0.0), true);
    world.seat_local(3, 2);
    assert!(world.manager.local_player().unwrap().is_a_passenger());

    world.sim.remove_vehicle(handle);
    world.pulse();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert!(!world.manager.local_player().unwrap().is_a_passenger());
    assert!(world
        .sent()
        .iter()
        .any(|(msg, _)| matches!(msg, ClientMsg::ExitForceful { vehicle_id: VehicleId(3), .. })));
}

#[test]
fn teleport_pulls_a_seated_player_out() {
    let mut world = World::new();
    world.add_vehicle(3, Vec3::new(2.0, 0.0, 0.0), false);
    world.seat_local(3, 0);

    let target = Vec3::new(-20.0, 4.0, 0.0);
    world
        .manager
        .player_mut(LOCAL)
        .unwrap()
        .teleport(&mut world.sim, target, true);
    world.pulse();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(
        world.manager.local_player().unwrap().position(&world.sim, world.manager.vehicles()),
        target
    );
    // Non-network vehicle: nothing to tell the authority
    assert!(world.sent().is_empty());
}

#[test]
fn removed_target_stops_interpolation() {
    let mut world = World::new();
    world.add_remote(1);
    let remote = PlayerId(1);

    world
        .manager
        .set_target_position(remote, &mut world.sim, &world.clock, Vec3::new(2.0, 0.0, 0.0), 1_000);
    world.manager.player_mut(remote).unwrap().remove_target_position();
    world.clock.advance(1_000);
    world.pulse();

    let player = world.manager.player(remote).unwrap();
    assert_eq!(player.position(&world.sim, world.manager.vehicles()), Vec3::ZERO);
}

#[test]
fn aim_and_shot_vectors_outlive_stream_out() {
    let mut world = World::new();
    world.add_remote(1);
    let remote = PlayerId(1);

    {
        let player = world.manager.player_mut(remote).unwrap();
        player.set_aim_target(Vec3::new(1.0, 2.0, 3.0));
        player.set_shot_source(Vec3::new(0.0, 0.0, 1.0));
        player.set_shot_target(Vec3::new(5.0, 5.0, 1.0));
    }
    world.manager.stream_out(remote, &mut world.sim);

    let player = world.manager.player(remote).unwrap();
    assert_eq!(player.aim_target(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(player.shot_source(), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(player.shot_target(), Vec3::new(5.0, 5.0, 1.0));
}

#[test]
fn direct_requests_drive_a_local_vehicle_and_death_resets_them() {
    let mut world = World::new();
    world.add_vehicle(3, Vec3::new(2.0, 0.0, 0.0), false);

    world.manager.request_enter_vehicle(
        LOCAL,
        &mut world.sim,
        &mut world.transport,
        &world.clock,
        VehicleId(3),
        0,
    );
    for _ in 0..4 {
        world.tick();
    }
    assert!(world.manager.local_player().unwrap().is_in_vehicle());

    world.manager.request_exit_vehicle(
        LOCAL,
        &mut world.sim,
        &mut world.transport,
        &world.clock,
        ExitVehicleMode::Jacked,
    );
    assert!(matches!(world.state(LOCAL), PossessionState::Exiting { .. }));
    for _ in 0..5 {
        world.tick();
    }
    assert_eq!(world.state(LOCAL), PossessionState::Idle);

    world.manager.request_enter_vehicle(
        LOCAL,
        &mut world.sim,
        &mut world.transport,
        &world.clock,
        VehicleId(3),
        0,
    );
    world.manager.kill(LOCAL, &mut world.sim, false);
    world.pulse();

    let local = world.manager.local_player().unwrap();
    assert!(local.is_dying(&world.sim));
    assert_eq!(local.health(&world.sim), 0);
    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert!(world.sent().is_empty());
}

#[test]
fn grant_for_a_streamed_out_vehicle_is_cancelled() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), true);

    world.tap_enter_exit();
    assert_eq!(world.sent().len(), 1);

    world
        .manager
        .vehicles_mut()
        .get_mut(VehicleId(1))
        .unwrap()
        .stream_out();
    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(1),
        seat: 0,
    });
    world.pulse();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::EntryCancelled {
                player_id: LOCAL,
                vehicle_id: VehicleId(1),
                seat: 0,
            },
            Reliability::ReliableOrdered
        )]
    );
    assert!(world.manager.vehicles().seats_of(LOCAL).is_empty());
}

#[test]
fn grant_for_a_vehicle_locked_meanwhile_is_cancelled() {
    let mut world = World::new();
    world.add_vehicle(3, Vec3::new(2.0, 0.0, 0.0), true);
    world.add_remote(1);

    world.tap_enter_exit();
    assert_eq!(world.sent().len(), 1);

    world
        .manager
        .vehicles_mut()
        .get_mut(VehicleId(3))
        .unwrap()
        .set_door_lock_state(2);
    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: LOCAL,
        vehicle_id: VehicleId(3),
        seat: 0,
    });
    world.manager.queue_inbound(ServerMsg::EntryGranted {
        player_id: PlayerId(1),
        vehicle_id: VehicleId(3),
        seat: 1,
    });
    world.pulse();

    assert_eq!(world.state(LOCAL), PossessionState::Idle);
    assert_eq!(world.state(PlayerId(1)), PossessionState::Idle);
    // Remote players cancel through their own client
    assert_eq!(
        world.sent(),
        vec![(
            ClientMsg::EntryCancelled {
                player_id: LOCAL,
                vehicle_id: VehicleId(3),
                seat: 0,
            },
            Reliability::ReliableOrdered
        )]
    );
    let ped = world.sim.local_ped();
    assert_eq!(world.sim.active_action(ped, ActionPriority::Primary), None);
}

#[test]
fn entry_request_goes_out_behind_a_long_backlog() {
    let mut world = World::new();
    world.add_vehicle(1, Vec3::new(2.0, 0.0, 0.0), true);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut transport = ChannelTransport::new(tx);
    for i in 0..300u16 {
        transport.send(ClientMsg::ExitRequest {
            player_id: PlayerId(i),
            vehicle_id: VehicleId(9),
        });
    }

    world.manager.request_enter_vehicle(
        LOCAL,
        &mut world.sim,
        &mut transport,
        &world.clock,
        VehicleId(1),
        0,
    );

    let mut frames = Vec::new();
    while let Ok(text) = rx.try_recv() {
        frames.push(decode_frame(&text).unwrap());
    }
    assert_eq!(frames.len(), 301);
    let last = frames.pop().unwrap();
    assert_eq!(last.reliability, Reliability::ReliableOrdered);
    assert_eq!(
        last.msg,
        ClientMsg::EntryRequest {
            player_id: LOCAL,
            vehicle_id: VehicleId(1),
            seat: 0,
        }
    );
    assert_eq!(
        world.state(LOCAL),
        PossessionState::RequestingEntry {
            vehicle: VehicleId(1),
            seat: 0
        }
    );
}
