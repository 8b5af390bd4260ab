//! # Authority Throughput Benchmark
//!
//! Measures the authority path: decode intent, apply, encode and fan out
//! the confirmation.
//!
//! Run with: `cargo bench --package concord_networking`

#![allow(missing_docs)]

use concord_networking::protocol::{PacketDeserializer, PacketHeader, PacketSerializer};
use concord_networking::{AuthorityConfig, AuthorityServer, ReplicatedObjectState, SyncBus};
use concord_shared::{Handedness, Intent, ParticipantId, Quaternion, Vec3};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sample_intents() -> Vec<Intent> {
    let a = ParticipantId(1);
    (0..64)
        .map(|i| match i % 4 {
            0 => Intent::Pickup {
                participant: a,
                handedness: Handedness::Right,
            },
            1 => Intent::Move {
                position: Vec3::new(0.0, 1.0, -(i as f32) * 0.01),
                quaternion: Quaternion::IDENTITY,
            },
            2 => Intent::Scale {
                participant: a,
                scale: Vec3::splat(1.0 + i as f32 * 0.01),
            },
            _ => Intent::Drop { participant: a },
        })
        .collect()
}

fn bench_state_machine(c: &mut Criterion) {
    let intents = sample_intents();
    c.bench_function("apply_64_intents", |b| {
        b.iter(|| {
            let mut state = ReplicatedObjectState::new();
            for intent in &intents {
                black_box(state.apply(intent));
            }
            state
        });
    });
}

fn bench_codec(c: &mut Criterion) {
    let intent = Intent::Move {
        position: Vec3::new(0.3, 1.2, -2.5),
        quaternion: Quaternion::IDENTITY,
    };
    let header = PacketHeader::new(1, 1);
    let mut serializer = PacketSerializer::new();

    c.bench_function("move_encode_decode", |b| {
        b.iter(|| {
            serializer.serialize_intent(&header, black_box(&intent));
            black_box(PacketDeserializer::new(serializer.as_slice()).deserialize())
        });
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("authority_fan_out");
    let intent = Intent::Move {
        position: Vec3::new(0.0, 1.5, -2.0),
        quaternion: Quaternion::IDENTITY,
    };

    for participants in [2u32, 8, 32] {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let mut links: Vec<_> = (0..participants)
            .filter_map(|id| bus.connect(ParticipantId(id)).ok())
            .collect();
        server.pump();

        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &participants,
            |b, _| {
                b.iter(|| {
                    black_box(server.apply_intent(ParticipantId(0), &intent));
                    for link in &mut links {
                        black_box(link.drain());
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_state_machine, bench_codec, bench_fan_out);
criterion_main!(benches);
