//! # Committee Flows
//!
//! Whole-committee scenarios over [`Committee`]:
//!
//! 1. **Steady state**: every block is certified and published everywhere
//! 2. **Reconfiguration epoch**: the committee stops taking transactions
//! 3. **Hand-off**: assembly, election and the reconfiguration block
//! 4. **Failed hand-off**: too few joiners end the view
//! 5. **Concurrent clients**: parallel submissions all reach the chain

#[cfg(test)]
mod tests {
    use crate::integration::Committee;
    use qc_block_producer::{
        BlockProducerApi, EarnerState, ProducerConfig, ProductionError, ReconfigurationState,
    };
    use qc_telemetry::{init_tracing, TelemetryConfig};
    use shared_types::{BlockBody, CertifiedBlock, Digest, Transaction};
    use std::sync::Arc;

    const SEEDS: [u8; 4] = [1, 2, 3, 4];

    fn init_logging() {
        // Another test may already own the global subscriber.
        let _ = init_tracing(&TelemetryConfig::for_member("committee"));
    }

    fn quiet() -> ProducerConfig {
        ProducerConfig {
            reconfiguration_countdown: 100,
            ..Default::default()
        }
    }

    fn hashes(blocks: &[CertifiedBlock]) -> Vec<Digest> {
        blocks.iter().map(|b| b.hash).collect()
    }

    fn states(committee: &Committee) -> Vec<EarnerState> {
        committee.members.iter().map(|m| m.producer.status().state).collect()
    }

    fn assert_all(committee: &Committee, state: EarnerState) {
        assert!(states(committee).iter().all(|s| *s == state), "{:?}", states(committee));
    }

    /// Rounds until assembly opens under the default countdown.
    fn open_assembly(committee: &Committee) -> Digest {
        committee.start();
        for _ in 0..3 {
            committee.round(false);
        }
        let next_view = committee.next_view().expect("assembly opened");
        let tip = committee.tip().expect("members agree");
        assert_eq!(tip.block.body, BlockBody::Assemble { next_view });
        next_view
    }

    #[test]
    fn test_committee_certifies_every_block() {
        init_logging();
        let committee = Committee::new(quiet(), &SEEDS).unwrap();
        committee.start();

        for nonce in 0..8u64 {
            committee
                .submit((nonce % 4) as usize, Transaction::new(nonce, b"payment".to_vec()))
                .unwrap();
            committee.round(false);
        }
        committee.round(true);

        let tip = committee.tip().expect("members agree");
        let reference = committee.published(0);
        assert_eq!(reference.len() as u64, tip.height() - 1);
        assert_eq!(reference[0].block.previous_hash, committee.genesis.hash);
        for pair in reference.windows(2) {
            assert_eq!(pair[1].block.previous_hash, pair[0].hash);
        }
        for block in &reference {
            assert_eq!(block.certifications.len(), SEEDS.len());
        }
        for index in 1..SEEDS.len() {
            assert_eq!(hashes(&committee.published(index)), hashes(&reference));
        }

        assert_all(&committee, EarnerState::Complete);
        for member in &committee.members {
            assert_eq!(member.engine.starts(), 1);
            assert_eq!(member.engine.stops(), 1);
            assert!(member.buffer.is_closed());
        }
    }

    #[test]
    fn test_reconfiguration_epoch_stops_transactions() {
        init_logging();
        let committee = Committee::new(quiet(), &SEEDS).unwrap();
        committee.start();

        let accepted = Transaction::new(1, b"early".to_vec());
        committee.submit(0, accepted.clone()).unwrap();
        committee.round(false);
        let tip = committee.tip().expect("members agree");
        assert_eq!(tip.block.body, BlockBody::Executions(vec![accepted]));

        committee.epoch(2);
        assert_all(&committee, EarnerState::Reconfiguring);
        for index in 0..SEEDS.len() {
            let refused = committee.submit(index, Transaction::new(2, b"late".to_vec()));
            assert!(matches!(refused, Err(ProductionError::BufferFull { .. })));
        }

        committee.round(false);
        let tip = committee.tip().expect("members agree");
        assert_eq!(tip.block.body, BlockBody::Executions(vec![]));
        assert_eq!(committee.published(0).len(), 1);
    }

    #[test]
    fn test_committee_hands_off_to_next_view() {
        init_logging();
        let committee = Committee::new(ProducerConfig::default(), &SEEDS).unwrap();
        let next_view = open_assembly(&committee);

        assert_eq!(committee.join(&SEEDS), SEEDS.len() * SEEDS.len());
        for member in &committee.members {
            let assembly = member.assembly(&next_view).expect("assembly opened");
            assert_eq!(assembly.state(), ReconfigurationState::Reconfigured);
            assert_eq!(member.producer.status().joins, SEEDS.len());
        }
        assert_all(&committee, EarnerState::Producing);

        committee.epoch(2);
        assert_all(&committee, EarnerState::ViewComplete);
        let tip = committee.tip().expect("members agree");
        let BlockBody::Reconfigure(body) = &tip.block.body else {
            panic!("expected reconfiguration, got {}", tip.block.body.kind());
        };
        assert_eq!(body.id, next_view);
        assert_eq!(body.members.len(), SEEDS.len());
        assert_eq!(body.checkpoint_target, 10);

        committee.round(false);
        committee.round(true);
        assert_all(&committee, EarnerState::Complete);

        let published = committee.published(0);
        let reconfigurations = published
            .iter()
            .filter(|b| matches!(b.block.body, BlockBody::Reconfigure(_)))
            .count();
        assert_eq!(reconfigurations, 1);
        for index in 1..SEEDS.len() {
            assert_eq!(hashes(&committee.published(index)), hashes(&published));
        }
    }

    #[test]
    fn test_partial_assembly_elected_on_demand() {
        init_logging();
        let committee = Committee::new(ProducerConfig::default(), &SEEDS).unwrap();
        let next_view = open_assembly(&committee);

        committee.join(&[1, 2, 3]);
        for member in &committee.members {
            let assembly = member.assembly(&next_view).expect("assembly opened");
            assert_eq!(assembly.state(), ReconfigurationState::Certification);
        }

        committee.elect();
        committee.epoch(2);

        let tip = committee.tip().expect("members agree");
        let BlockBody::Reconfigure(body) = &tip.block.body else {
            panic!("expected reconfiguration, got {}", tip.block.body.kind());
        };
        assert_eq!(body.members.len(), 3);
        assert_all(&committee, EarnerState::ViewComplete);
    }

    #[test]
    fn test_too_few_joiners_fail_the_view() {
        init_logging();
        let committee = Committee::new(ProducerConfig::default(), &SEEDS).unwrap();
        let next_view = open_assembly(&committee);
        let assemble = committee.tip().expect("members agree");

        committee.join(&[1]);
        committee.elect();
        committee.epoch(2);

        assert_all(&committee, EarnerState::Failed);
        assert_eq!(committee.tip().expect("members agree").hash, assemble.hash);
        for member in &committee.members {
            let status = member.producer.status();
            assert!(!status.running);
            assert_eq!(status.joins, 1);
            assert_eq!(status.next_view_id, None);
            assert_eq!(member.engine.stops(), 1);
            assert!(member.assembly(&next_view).is_some());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_all_land() {
        init_logging();
        let committee = Arc::new(Committee::new(quiet(), &SEEDS).unwrap());
        committee.start();

        let handles: Vec<_> = (0..32u64)
            .map(|nonce| {
                let committee = Arc::clone(&committee);
                tokio::spawn(async move {
                    let tx = Transaction::new(nonce, nonce.to_le_bytes().to_vec());
                    committee.submit((nonce % 4) as usize, tx)
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        committee.round(false);
        committee.round(true);

        let included: usize = committee
            .published(0)
            .iter()
            .map(|b| match &b.block.body {
                BlockBody::Executions(txs) => txs.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(included, 32);
    }
}
