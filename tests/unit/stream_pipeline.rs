//! Sampler and wire codec over a live generated book.

use lobsim::stream::wire;
use lobsim::{MarketGenerator, SimConfig, SnapshotSampler};

#[test]
fn test_sampled_snapshots_round_trip_through_wire() {
    let config = SimConfig {
        seed: 11,
        ..SimConfig::default()
    };
    let mut generator = MarketGenerator::new(config.clone());
    generator.seed_book();
    let mut sampler = SnapshotSampler::new(generator.book(), &config);

    for _ in 0..20 {
        for _ in 0..25 {
            generator.step();
        }
        let snapshot = sampler.sample();
        let frame = wire::encode_snapshot(&snapshot).unwrap();
        let decoded = wire::decode_snapshot(&frame).unwrap();
        assert_eq!(decoded, snapshot);
    }
}

#[test]
fn test_snapshot_sequence_and_ordering_over_generation() {
    let config = SimConfig {
        seed: 23,
        depth: 10,
        ..SimConfig::default()
    };
    let mut generator = MarketGenerator::new(config.clone());
    generator.seed_book();
    let mut sampler = SnapshotSampler::new(generator.book(), &config);

    let mut last_seq = 0;
    let mut last_ts = 0;
    for _ in 0..40 {
        for _ in 0..10 {
            generator.step();
        }
        let snapshot = sampler.sample();

        assert!(snapshot.seq > last_seq, "seq must strictly increase");
        assert!(snapshot.ts >= last_ts, "capture time must not go backwards");
        last_seq = snapshot.seq;
        last_ts = snapshot.ts;

        assert!(snapshot.bids.len() <= 10);
        assert!(snapshot.asks.len() <= 10);
        for pair in snapshot.bids.windows(2) {
            assert!(pair[0].0 > pair[1].0, "bids must descend");
        }
        for pair in snapshot.asks.windows(2) {
            assert!(pair[0].0 < pair[1].0, "asks must ascend");
        }
        if let (Some((bid, _)), Some((ask, _))) = (snapshot.best_bid(), snapshot.best_ask()) {
            assert!(bid < ask, "snapshot must not be crossed");
        }
    }
}
