//! Convergence tests: random intent interleavings from several participants
//! must leave every replica identical to the authority.

use concord_networking::{AuthorityConfig, AuthorityServer, Downlink, ReplicaClient, SyncBus};
use concord_shared::{Confirmation, Handedness, Intent, ParticipantId, Quaternion, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_intent(rng: &mut StdRng, participant: ParticipantId) -> Intent {
    match rng.gen_range(0..5) {
        0 => Intent::Pickup {
            participant,
            handedness: if rng.gen_bool(0.5) {
                Handedness::Left
            } else {
                Handedness::Right
            },
        },
        1 => Intent::Move {
            position: Vec3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(0.0..2.0),
                rng.gen_range(-5.0..0.0),
            ),
            quaternion: Quaternion::IDENTITY,
        },
        2 => Intent::Drop { participant },
        3 => Intent::Scale {
            participant,
            // Small value set so equal-scale suppression is exercised
            scale: Vec3::splat(f32::from(rng.gen_range(1u8..4)) * 0.5),
        },
        _ => Intent::TogglePin { participant },
    }
}

#[test]
fn test_random_interleavings_converge() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());

        let mut clients: Vec<ReplicaClient> = (1..=4)
            .map(|id| ReplicaClient::new(bus.connect(ParticipantId(id)).unwrap()))
            .collect();

        for _round in 0..50 {
            // Several participants fire before the authority gets to run
            for _ in 0..rng.gen_range(1..6) {
                let index = rng.gen_range(0..clients.len());
                let client = &mut clients[index];
                let intent = random_intent(&mut rng, client.participant());
                client.send(&intent).unwrap();
            }
            server.pump();
            if rng.gen_bool(0.5) {
                for client in &mut clients {
                    client.poll();
                }
            }
        }

        server.pump();
        for client in &mut clients {
            client.poll();
            assert_eq!(client.replica(), server.state(), "seed {seed}");
        }
    }
}

#[test]
fn test_concurrent_pickups_exactly_one_wins() {
    let (bus, endpoint) = SyncBus::open();
    let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
    let mut clients: Vec<ReplicaClient> = (1..=8)
        .map(|id| ReplicaClient::new(bus.connect(ParticipantId(id)).unwrap()))
        .collect();
    server.pump();

    for client in &mut clients {
        let participant = client.participant();
        client
            .send(&Intent::Pickup {
                participant,
                handedness: Handedness::Right,
            })
            .unwrap();
    }
    server.pump();

    assert_eq!(server.state().held_by(), Some(ParticipantId(1)));
    assert_eq!(server.stats().intents_applied, 1);
    assert_eq!(server.stats().intents_ignored, 7);

    for client in &mut clients {
        let pickups: Vec<_> = client
            .poll()
            .into_iter()
            .filter(|c| matches!(c, Confirmation::Pickup { .. }))
            .collect();
        assert_eq!(pickups.len(), 1);
        assert_eq!(client.replica().held_by(), Some(ParticipantId(1)));
    }
}

#[test]
fn test_pickup_drop_handoff() {
    let (bus, endpoint) = SyncBus::open();
    let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
    let mut a = ReplicaClient::new(bus.connect(ParticipantId(1)).unwrap());
    let mut b = ReplicaClient::new(bus.connect(ParticipantId(2)).unwrap());

    let pickup = |id| Intent::Pickup {
        participant: ParticipantId(id),
        handedness: Handedness::Left,
    };

    a.send(&pickup(1)).unwrap();
    b.send(&pickup(2)).unwrap();
    server.pump();
    assert_eq!(server.state().held_by(), Some(ParticipantId(1)));

    b.send(&Intent::Drop {
        participant: ParticipantId(2),
    })
    .unwrap();
    server.pump();
    assert_eq!(server.state().held_by(), Some(ParticipantId(1)));

    a.send(&Intent::Drop {
        participant: ParticipantId(1),
    })
    .unwrap();
    server.pump();
    assert_eq!(server.state().held_by(), None);

    b.send(&pickup(2)).unwrap();
    server.pump();
    a.poll();
    b.poll();
    assert_eq!(a.replica().held_by(), Some(ParticipantId(2)));
    assert_eq!(b.replica().held_by(), Some(ParticipantId(2)));
}

#[test]
fn test_participants_connect_from_other_threads() {
    let (bus, endpoint) = SyncBus::open();
    let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());

    let handles: Vec<_> = (1..=4u32)
        .map(|id| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                let mut link = bus.connect(ParticipantId(id)).unwrap();
                link.send_intent(&Intent::TogglePin {
                    participant: ParticipantId(id),
                })
                .unwrap();
                link
            })
        })
        .collect();
    let mut links: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    server.pump();
    assert_eq!(server.participant_count(), 4);
    assert_eq!(server.stats().intents_applied, 4);
    // Four toggles cancel out, but the latch stays
    assert!(!server.state().is_pinned());
    assert!(server.state().has_ever_been_pinned());

    for link in &mut links {
        let frames = link.drain();
        assert!(matches!(frames.first(), Some(Downlink::Snapshot(_))));
        let toggles = frames
            .iter()
            .filter(|f| matches!(f, Downlink::Confirmation(Confirmation::TogglePin { .. })))
            .count();
        assert!(toggles <= 4);
    }
}
