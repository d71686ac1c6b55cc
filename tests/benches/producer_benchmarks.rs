//! # Block Producer Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Quorum certifier | witness admission up to certification |
//! | Committee | one ordering round across a 4-member committee |
//! | Unit codec | packing and decoding a full unit |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use qc_block_producer::adapters::sign_validation;
use qc_block_producer::{HashedBlock, ProducerConfig, QuorumCertifier};
use qc_tests::integration::committee::keypair;
use qc_tests::integration::Committee;
use shared_types::{Block, BlockBody, Digest, Transaction, UnitData};
use std::time::Duration;

fn block(height: u64) -> HashedBlock {
    HashedBlock::new(Block {
        height,
        previous_hash: Digest([height as u8; 32]),
        body: BlockBody::Executions(vec![Transaction::new(height, vec![0u8; 64])]),
    })
    .unwrap()
}

fn bench_certifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("quorum-certifier");
    group.measurement_time(Duration::from_secs(5));

    let keys: Vec<_> = (1..=4u8).map(keypair).collect();
    for tolerance in [1usize, 2] {
        let quorum = tolerance + 1;
        group.throughput(Throughput::Elements(quorum as u64));
        group.bench_with_input(BenchmarkId::new("admit_to_quorum", tolerance), &tolerance, |b, &f| {
            b.iter(|| {
                let certifier = QuorumCertifier::new(f);
                let pending = block(1);
                let hash = pending.hash;
                certifier.register(pending, sign_validation(&keys[0], hash));
                let mut certified = None;
                for key in &keys[1..quorum.min(keys.len())] {
                    certified = certifier.admit(sign_validation(key, hash), |_, _| true);
                }
                black_box(certified)
            })
        });
    }
    group.finish();
}

fn bench_committee_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("committee");
    group.measurement_time(Duration::from_secs(5));

    for batch in [0usize, 16, 256] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("round", batch), &batch, |b, &batch| {
            b.iter_batched(
                || {
                    let config = ProducerConfig {
                        reconfiguration_countdown: 1_000,
                        ..Default::default()
                    };
                    let committee = Committee::new(config, &[1, 2, 3, 4]).unwrap();
                    committee.start();
                    for nonce in 0..batch as u64 {
                        let _ = committee.submit((nonce % 4) as usize, Transaction::new(nonce, vec![1u8; 32]));
                    }
                    committee
                },
                |committee| {
                    committee.round(false);
                    committee.round(false);
                    black_box(committee.published(0).len())
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_unit_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit-codec");
    let key = keypair(1);
    let unit = UnitData {
        transactions: (0..1_000u64).map(|n| Transaction::new(n, vec![7u8; 128])).collect(),
        validations: (0..64u8).map(|n| sign_validation(&key, Digest([n; 32]))).collect(),
    };
    let bytes = unit.encode().unwrap();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| b.iter(|| black_box(unit.encode().unwrap())));
    group.bench_function("decode", |b| b.iter(|| black_box(UnitData::decode(&bytes).unwrap())));
    group.finish();
}

criterion_group!(benches, bench_certifier, bench_committee_round, bench_unit_codec);
criterion_main!(benches);
