//! Property tests for zoom-level pyramids.
//!
//! Tests verify:
//! 1. Conservation: block counts of every level sum to the record count
//! 2. Cadence: each level holds floor(last / width) + 1 contiguous blocks
//! 3. Block placement: a record at position p lands in block p / width
//! 4. Ordering violations surface as distinguishable errors
//!
//! Random streams use a seeded SmallRng for reproducibility.

use catzoom::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const CATEGORIES: [&str; 3] = ["A", "B", "C"];

fn config() -> PyramidConfig {
    PyramidConfig::new(10, 3, 810)
        .with_categories(CATEGORIES)
        .with_other_category(None)
}

/// Generate sorted records over a few chromosomes with sparse gaps.
fn random_records(seed: u64) -> Vec<Record> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut records = Vec::new();
    for chrom in ["chr1", "chr2", "chrM"] {
        let mut pos: u64 = rng.gen_range(0..50);
        let n = rng.gen_range(1..200);
        for _ in 0..n {
            let value = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
            records.push(Record::new(chrom, pos, value));
            // Mostly dense, occasionally a gap spanning many blocks
            let step = if rng.gen_bool(0.05) {
                rng.gen_range(100..3000)
            } else {
                rng.gen_range(1..8)
            };
            pos += step;
        }
    }
    records
}

fn decode_level(factory: &MemorySinkFactory, chrom: &str, width: u64) -> Vec<Vec<u64>> {
    let encoder = RawCountEncoder::new(CATEGORIES.len());
    factory
        .blocks(chrom, width)
        .expect("level was finalized")
        .iter()
        .map(|block| encoder.decode(block).unwrap())
        .collect()
}

fn build(records: &[Record]) -> (MemorySinkFactory, SummaryStats) {
    let factory = MemorySinkFactory::new();
    let mut driver =
        PyramidDriver::new(&config(), factory.clone(), RawCountEncoder::new(3)).unwrap();
    for record in records {
        driver.push_record(record).unwrap();
    }
    let stats = driver.finish().unwrap();
    (factory, stats)
}

#[test]
fn test_level_widths() {
    let config = PyramidConfig::new(10, 2, 40).with_category_list("A;B");
    assert_eq!(config.level_widths(), vec![10, 20, 40]);
    assert_eq!(
        LevelTemplate::from_config(&config).unwrap().widths(),
        &[10, 20, 40]
    );
}

#[test]
fn test_conservation_and_cadence_random() {
    let widths = config().level_widths();
    assert_eq!(widths, vec![10, 30, 90, 270, 810]);

    for seed in 0..20 {
        let records = random_records(seed);
        let (factory, stats) = build(&records);
        assert_eq!(stats.records, records.len() as u64);
        assert_eq!(stats.unresolved, 0);
        assert_eq!(stats.chromosomes, 3);

        for chrom in ["chr1", "chr2", "chrM"] {
            let chrom_records: Vec<&Record> =
                records.iter().filter(|r| r.chrom == chrom).collect();
            let last = chrom_records.last().unwrap().position;

            for &width in &widths {
                let blocks = decode_level(&factory, chrom, width);

                // Cadence
                assert_eq!(
                    blocks.len() as u64,
                    last / width + 1,
                    "seed {} {} width {}",
                    seed,
                    chrom,
                    width
                );

                // Conservation
                let total: u64 = blocks.iter().flatten().sum();
                assert_eq!(total, chrom_records.len() as u64);

                // Placement
                let mut expected = vec![vec![0u64; CATEGORIES.len()]; blocks.len()];
                for r in &chrom_records {
                    let cat = CATEGORIES.iter().position(|c| *c == r.value).unwrap();
                    expected[(r.position / width) as usize][cat] += 1;
                }
                assert_eq!(blocks, expected);
            }
        }
    }
}

#[test]
fn test_scenario_from_three_records() {
    let config = PyramidConfig::new(10, 2, 10).with_category_list("A;B");
    let factory = MemorySinkFactory::new();
    let mut driver =
        PyramidDriver::new(&config, factory.clone(), RawCountEncoder::new(2)).unwrap();

    driver.push("chr1", 1, "A").unwrap();
    driver.push("chr1", 5, "B").unwrap();
    driver.push("chr1", 12, "A").unwrap();
    driver.push("chr1", 25, "A").unwrap();
    driver.finish().unwrap();

    let encoder = RawCountEncoder::new(2);
    let blocks: Vec<Vec<u64>> = factory
        .blocks("chr1", 10)
        .unwrap()
        .iter()
        .map(|b| encoder.decode(b).unwrap())
        .collect();
    assert_eq!(blocks, vec![vec![1, 1], vec![1, 0], vec![1, 0]]);
}

#[test]
fn test_out_of_order_is_distinguishable() {
    let factory = MemorySinkFactory::new();
    let mut driver =
        PyramidDriver::new(&config(), factory.clone(), RawCountEncoder::new(3)).unwrap();
    driver.push("chr1", 100, "A").unwrap();

    let err = driver.push("chr1", 100, "B").unwrap_err();
    match err {
        SummaryError::OutOfOrderPosition {
            chrom,
            position,
            last,
        } => {
            assert_eq!(chrom, "chr1");
            assert_eq!(position, 100);
            assert_eq!(last, 100);
        }
        other => panic!("unexpected error: {}", other),
    }

    // Blocks closed before the failure are intact
    assert_eq!(decode_level(&factory, "chr1", 10).len(), 11);
}

#[test]
fn test_chromosome_repeat_is_distinguishable() {
    let factory = MemorySinkFactory::new();
    let mut driver =
        PyramidDriver::new(&config(), factory.clone(), RawCountEncoder::new(3)).unwrap();
    driver.push("chr1", 1, "A").unwrap();
    driver.push("chr2", 1, "A").unwrap();

    let err = driver.push("chr1", 2, "A").unwrap_err();
    assert!(err.is_ordering_violation());
    assert!(matches!(err, SummaryError::ChromosomeRepeat { .. }));
}

#[test]
fn test_unresolved_values_do_not_affect_other_records() {
    let factory = MemorySinkFactory::new();
    let mut driver =
        PyramidDriver::new(&config(), factory.clone(), RawCountEncoder::new(3)).unwrap();
    driver.push("chr1", 1, "A").unwrap();
    driver.push("chr1", 2, "unknown").unwrap();
    driver.push("chr1", 3, "C").unwrap();
    let stats = driver.finish().unwrap();

    assert_eq!(stats.records, 3);
    assert_eq!(stats.unresolved, 1);
    assert_eq!(decode_level(&factory, "chr1", 10), vec![vec![1, 0, 1]]);
}
