//! # Filter Flows
//!
//! Filters built by the block indexer feeding the wallet scanner.
//!
//! 1. **Oracle (05) → Indexer (07)**: only connected best-chain headers are indexed
//! 2. **Indexer (07) → Wallet (06)**: stored filters decode and match wallet patterns
//! 3. **Bloom (03) ↔ Codec (04)**: a peer-side bloom filter agrees with the GCS match

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cs_02_gcs_filter::{compute_filter_headers, GcsFilter, GENESIS_PREVIOUS_HEADER};
    use cs_03_bloom_filter::{BloomFilter, BloomUpdateFlag};
    use cs_04_tx_codec::test_utils::{build_block, coinbase_tx, p2pkh_output, spend_tx, EASY_BITS};
    use cs_04_tx_codec::{Block, Output};
    use cs_05_header_oracle::{HeaderOracle, HeaderOracleApi, InMemoryHeaderStorage, OracleConfig};
    use cs_06_wallet_index::{
        InMemoryChainData, InMemoryWalletStorage, ScanProgress, ScannerDeps, ScriptPatternSource,
        Subchain, SubchainKey, SubchainScanner, WalletConfig, WalletIndex, WalletIndexApi,
    };
    use cs_07_block_indexer::{
        BlockIndexerApi, ChannelBlockFetcher, FilterPipeline, IndexerConfig, InMemoryFilterStorage,
        InMemoryPreviousOutputs,
    };
    use cs_telemetry::TelemetryContext;
    use shared_types::{ChainType, FilterType, Hash, Outpoint, Position};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn key() -> SubchainKey {
        SubchainKey::new([9u8; 32], Subchain::Internal, FilterType::BasicBip158, 1)
    }

    fn pay(value: i64, index: u32) -> Output {
        Output::from_script(value, ScriptPatternSource::script(&key(), index))
    }

    fn oracle() -> Arc<HeaderOracle<InMemoryHeaderStorage>> {
        Arc::new(
            HeaderOracle::new(
                Arc::new(InMemoryHeaderStorage::new()),
                OracleConfig::for_testing(),
                TelemetryContext::default(),
            )
            .unwrap(),
        )
    }

    /// Four blocks: the wallet is paid at height 2 and spends that output at
    /// height 4.
    fn chain(oracle: &HeaderOracle<InMemoryHeaderStorage>) -> Vec<Block> {
        let genesis = OracleConfig::for_testing().genesis_header().unwrap().hash();
        let mut blocks: Vec<Block> = Vec::new();
        let mut previous = genesis;
        for height in 1..=4u32 {
            let mut txs = vec![coinbase_tx(height, vec![p2pkh_output(50, height as u8)])];
            match height {
                2 => txs[0] = coinbase_tx(height, vec![pay(800, 0)]),
                4 => {
                    let funding = blocks[1].transactions()[0].txid();
                    txs.push(spend_tx(&[Outpoint::new(funding, 0)], vec![p2pkh_output(790, 0x33)]));
                }
                _ => {}
            }
            let block = build_block(ChainType::UnitTest, previous, EASY_BITS, height, txs);
            oracle.add_header(block.header().clone()).unwrap();
            previous = block.hash();
            blocks.push(block);
        }
        blocks
    }

    fn pipeline(
        oracle: Arc<HeaderOracle<InMemoryHeaderStorage>>,
        blocks: &[Block],
    ) -> FilterPipeline<InMemoryFilterStorage> {
        let outputs = Arc::new(InMemoryPreviousOutputs::new());
        for block in blocks {
            outputs.add_block(block);
        }
        let (fetcher, _requests) = ChannelBlockFetcher::new();
        FilterPipeline::new(
            IndexerConfig::for_testing(),
            Arc::new(fetcher),
            oracle,
            Arc::new(InMemoryFilterStorage::new()),
            outputs,
            TelemetryContext::default(),
        )
        .unwrap()
    }

    // =========================================================================
    // INDEXER → WALLET
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_indexed_filters_drive_wallet_scan() {
        let oracle = oracle();
        let blocks = chain(&oracle);
        let pipeline = pipeline(oracle.clone(), &blocks);
        for block in &blocks {
            pipeline.cache().insert(Arc::new(block.clone())).unwrap();
        }
        let positions: Vec<Position> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| Position::new(i as i64 + 1, b.hash()))
            .collect();
        let indexed = tokio::time::timeout(Duration::from_secs(10), pipeline.index_blocks(positions))
            .await
            .unwrap()
            .unwrap();

        let hashes: Vec<Hash> = indexed.iter().map(|f| f.filter_hash).collect();
        let headers = compute_filter_headers(&GENESIS_PREVIOUS_HEADER, &hashes);
        assert_eq!(indexed.iter().map(|f| f.header).collect::<Vec<_>>(), headers);

        // Hand the stored filters and blocks to the wallet side.
        let chain_data = Arc::new(InMemoryChainData::new());
        for (block, stored) in blocks.iter().zip(&indexed) {
            let filter =
                GcsFilter::decode_for_block(FilterType::BasicBip158, &block.hash(), &stored.filter).unwrap();
            chain_data.insert_filter(FilterType::BasicBip158, block.hash(), filter);
            chain_data.insert_block_only(Arc::new(block.clone()));
        }
        let index = Arc::new(
            WalletIndex::new(Arc::new(InMemoryWalletStorage::new()), TelemetryContext::default()).unwrap(),
        );
        let deps = ScannerDeps {
            index: index.clone(),
            oracle,
            chain_data,
            patterns: Arc::new(ScriptPatternSource),
        };
        let config = WalletConfig::for_testing().with_start_height(1);
        let mut scanner = SubchainScanner::new(key(), config, deps, TelemetryContext::default()).unwrap();

        let mut steps = 0;
        while scanner.step().unwrap() != ScanProgress::Idle {
            steps += 1;
            assert!(steps < 50, "scanner did not go idle");
        }

        // The spend at height 4 matches through the spent script in its filter.
        let balance = index.get_balance().unwrap();
        assert_eq!(balance.confirmed, 0);
        assert_eq!(index.get_transactions().len(), 2);
        assert_eq!(index.subchain_last_used(scanner.id()).unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_indexer_rejects_headers_off_the_best_chain() {
        let oracle = oracle();
        let blocks = chain(&oracle);
        let pipeline = pipeline(oracle.clone(), &blocks);

        let stray = build_block(
            ChainType::UnitTest,
            [0x42; 32],
            EASY_BITS,
            99,
            vec![coinbase_tx(99, vec![p2pkh_output(1, 1)])],
        );
        oracle.add_header(stray.header().clone()).unwrap();
        let result = pipeline.index_blocks(vec![Position::new(1, stray.hash())]).await;
        assert!(result.is_err());
        assert_eq!(pipeline.metrics().blocks_requested, 0);
    }

    // =========================================================================
    // BLOOM ↔ GCS
    // =========================================================================

    #[test]
    fn test_bloom_and_gcs_agree_on_wallet_payment() {
        let oracle = oracle();
        let blocks = chain(&oracle);
        let script = ScriptPatternSource::script(&key(), 0).serialize();

        let mut bloom = BloomFilter::new(10, 0.0001, 0x5eed, BloomUpdateFlag::All).unwrap();
        bloom.add_element(&script);

        let paid = &blocks[1];
        let output_script = paid.transactions()[0].outputs()[0].script().serialize();
        assert!(bloom.test(&output_script));

        let gcs = GcsFilter::for_block(FilterType::BasicBip158, &paid.hash(), &[output_script]).unwrap();
        assert!(gcs.test(&script));
    }
}
