//! # Chain-Scan Subsystem Benchmarks
//!
//! | Subsystem | Operation | Scales with |
//! |-----------|-----------|-------------|
//! | cs-01 Binary Codec | CompactSize encode/decode | - |
//! | cs-02 GCS Filter | build, match | element count |
//! | cs-03 Bloom Filter | insert, test | element count |
//! | cs-04 Tx Codec | block parse, filter elements | transaction count |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::time::Duration;

use cs_01_binary_codec::CompactSize;
use cs_02_gcs_filter::GcsFilter;
use cs_03_bloom_filter::{BloomFilter, BloomUpdateFlag};
use cs_04_tx_codec::test_utils::{build_block, coinbase_tx, p2pkh_output, spend_tx, EASY_BITS};
use cs_04_tx_codec::{compute_block_filter, Block};
use shared_types::{ChainType, FilterType, Outpoint, NULL_HASH};

fn random_elements(count: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut element = vec![0u8; 25];
            rng.fill(element.as_mut_slice());
            element
        })
        .collect()
}

fn block_with(tx_count: usize) -> Block {
    let mut txs = vec![coinbase_tx(0, vec![p2pkh_output(50, 0)])];
    for i in 1..tx_count {
        let previous = Outpoint::new([i as u8; 32], i as u32);
        txs.push(spend_tx(&[previous], vec![p2pkh_output(10, i as u8), p2pkh_output(5, 0xff)]));
    }
    build_block(ChainType::UnitTest, NULL_HASH, EASY_BITS, 1, txs)
}

// ============================================================================
// CS-01: Binary Codec
// ============================================================================

fn bench_compact_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("cs-01-binary-codec");

    for value in [0xfcu64, 0xffff, 0xffff_ffff, u64::MAX] {
        let encoded = CompactSize::new(value).encode();
        group.bench_with_input(BenchmarkId::new("encode", value), &value, |b, v| {
            b.iter(|| black_box(CompactSize::new(*v).encode()))
        });
        group.bench_with_input(BenchmarkId::new("decode_stream", value), &encoded, |b, bytes| {
            b.iter(|| {
                let mut offset = 0;
                let mut expected = 0;
                black_box(CompactSize::decode_from_payload(bytes, &mut offset, &mut expected))
            })
        });
    }

    group.finish();
}

// ============================================================================
// CS-02: GCS Filter
// ============================================================================

fn bench_gcs_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("cs-02-gcs-filter");
    group.measurement_time(Duration::from_secs(10));
    let block_hash = [0x11u8; 32];

    for size in [100usize, 1_000, 10_000] {
        let elements = random_elements(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &elements, |b, elements| {
            b.iter(|| black_box(GcsFilter::for_block(FilterType::BasicBip158, &block_hash, elements)))
        });

        let filter = match GcsFilter::for_block(FilterType::BasicBip158, &block_hash, &elements) {
            Ok(filter) => filter,
            Err(e) => panic!("filter build failed: {e}"),
        };
        let encoded = filter.encode();
        let targets = random_elements(100);
        group.bench_with_input(BenchmarkId::new("match_100_cold", size), &encoded, |b, encoded| {
            b.iter(|| {
                let decoded = GcsFilter::decode_for_block(FilterType::BasicBip158, &block_hash, encoded);
                black_box(decoded.map(|f| f.test_any(&targets)))
            })
        });
    }

    group.finish();
}

// ============================================================================
// CS-03: Bloom Filter
// ============================================================================

fn bench_bloom_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("cs-03-bloom-filter");

    for size in [100usize, 1_000, 10_000] {
        let elements = random_elements(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("insert", size), &elements, |b, elements| {
            b.iter(|| {
                let mut filter = match BloomFilter::new(elements.len(), 0.001, 7, BloomUpdateFlag::None) {
                    Ok(filter) => filter,
                    Err(e) => panic!("bloom sizing failed: {e}"),
                };
                for element in elements {
                    filter.add_element(element);
                }
                black_box(filter)
            })
        });
    }

    let elements = random_elements(1_000);
    let mut filter = match BloomFilter::new(elements.len(), 0.001, 7, BloomUpdateFlag::None) {
        Ok(filter) => filter,
        Err(e) => panic!("bloom sizing failed: {e}"),
    };
    for element in &elements {
        filter.add_element(element);
    }
    group.bench_function("test_member", |b| b.iter(|| black_box(filter.test(&elements[500]))));
    group.bench_function("test_absent", |b| b.iter(|| black_box(filter.test(b"absent element"))));

    group.finish();
}

// ============================================================================
// CS-04: Transaction Codec
// ============================================================================

fn bench_block_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("cs-04-tx-codec");
    group.measurement_time(Duration::from_secs(10));

    for tx_count in [10usize, 100, 1_000] {
        let block = block_with(tx_count);
        let bytes = block.serialize();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_block", tx_count), &bytes, |b, bytes| {
            b.iter(|| black_box(Block::parse(ChainType::UnitTest, bytes)))
        });

        let previous: Vec<Vec<u8>> = (1..tx_count)
            .map(|i| p2pkh_output(1, i as u8).script().serialize())
            .collect();
        group.bench_with_input(BenchmarkId::new("block_filter", tx_count), &block, |b, block| {
            b.iter(|| black_box(compute_block_filter(block, FilterType::BasicBip158, &previous)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compact_size,
    bench_gcs_filter,
    bench_bloom_filter,
    bench_block_codec,
);

criterion_main!(benches);
