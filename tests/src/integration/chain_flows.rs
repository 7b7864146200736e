//! # Chain Flows
//!
//! Header oracle fork choice driving the wallet index.
//!
//! 1. **Oracle (05) → Wallet (06)**: `ChainUpdate::undone` orphans wallet outputs
//! 2. **Oracle (05) → Scanner (06)**: the scanner rewinds to the fork point and rescans
//! 3. **Checkpoints**: a pinned header keeps a heavier fork out of the best chain

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_04_tx_codec::test_utils::{build_block, coinbase_tx, p2pkh_output, DOUBLE_BITS, EASY_BITS};
    use cs_04_tx_codec::{Block, Output};
    use cs_05_header_oracle::{HeaderOracle, HeaderOracleApi, HeaderStatus, InMemoryHeaderStorage, OracleConfig};
    use cs_06_wallet_index::{
        InMemoryChainData, InMemoryWalletStorage, OutputState, ScanProgress, ScannerDeps,
        ScriptPatternSource, Subchain, SubchainKey, SubchainScanner, WalletConfig, WalletIndex,
        WalletIndexApi,
    };
    use cs_telemetry::TelemetryContext;
    use shared_types::{BlockHash, ChainType, FilterType, Position};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    struct Node {
        oracle: Arc<HeaderOracle<InMemoryHeaderStorage>>,
        index: Arc<WalletIndex<InMemoryWalletStorage>>,
        chain_data: Arc<InMemoryChainData>,
        genesis: BlockHash,
    }

    fn key() -> SubchainKey {
        SubchainKey::new([7u8; 32], Subchain::External, FilterType::BasicBip158, 1)
    }

    fn pay(value: i64, index: u32) -> Output {
        Output::from_script(value, ScriptPatternSource::script(&key(), index))
    }

    fn node() -> Node {
        let config = OracleConfig::for_testing();
        let genesis = config.genesis_header().unwrap().hash();
        Node {
            oracle: Arc::new(
                HeaderOracle::new(
                    Arc::new(InMemoryHeaderStorage::new()),
                    config,
                    TelemetryContext::default(),
                )
                .unwrap(),
            ),
            index: Arc::new(
                WalletIndex::new(Arc::new(InMemoryWalletStorage::new()), TelemetryContext::default())
                    .unwrap(),
            ),
            chain_data: Arc::new(InMemoryChainData::new()),
            genesis,
        }
    }

    impl Node {
        /// Blocks on top of `parent`, one coinbase each paying `outputs[i]`.
        /// Headers are not yet given to the oracle.
        fn mine(&self, parent: BlockHash, nbits: u32, salt: u32, outputs: Vec<Vec<Output>>) -> Vec<Block> {
            let mut previous = parent;
            outputs
                .into_iter()
                .enumerate()
                .map(|(i, mut outs)| {
                    outs.push(p2pkh_output(1, 0xee));
                    let tx = coinbase_tx(salt * 100 + i as u32, outs);
                    let block = build_block(ChainType::UnitTest, previous, nbits, salt, vec![tx]);
                    previous = block.hash();
                    block
                })
                .collect()
        }

        fn publish(&self, blocks: &[Block]) {
            for block in blocks {
                self.chain_data
                    .insert_block(Arc::new(block.clone()), FilterType::BasicBip158)
                    .unwrap();
            }
        }

        fn scanner(&self) -> SubchainScanner {
            let deps = ScannerDeps {
                index: self.index.clone(),
                oracle: self.oracle.clone(),
                chain_data: self.chain_data.clone(),
                patterns: Arc::new(ScriptPatternSource),
            };
            let config = WalletConfig::for_testing().with_start_height(1);
            SubchainScanner::new(key(), config, deps, TelemetryContext::default())
                .unwrap()
        }
    }

    fn run_to_idle(scanner: &mut SubchainScanner) {
        for _ in 0..100 {
            if scanner.step().unwrap() == ScanProgress::Idle {
                return;
            }
        }
        panic!("scanner did not go idle");
    }

    // =========================================================================
    // ORACLE → WALLET
    // =========================================================================

    #[test]
    fn test_heavier_fork_orphans_and_rescans_wallet_outputs() {
        let node = node();
        let mut scanner = node.scanner();

        // Chain A: payment of 500 at height 2.
        let chain_a = node.mine(node.genesis, EASY_BITS, 1, vec![vec![], vec![pay(500, 0)], vec![]]);
        node.oracle
            .add_headers(chain_a.iter().map(|b| b.header().clone()).collect())
            .unwrap();
        node.publish(&chain_a);
        run_to_idle(&mut scanner);
        assert_eq!(node.index.get_balance().unwrap().confirmed, 500);

        // Chain B: two double-work blocks outweigh A; payment of 300 at height 1.
        let chain_b = node.mine(node.genesis, DOUBLE_BITS, 2, vec![vec![pay(300, 1)], vec![]]);
        let update = node
            .oracle
            .add_headers(chain_b.iter().map(|b| b.header().clone()).collect())
            .unwrap();
        assert_eq!(update.best, Position::new(2, chain_b[1].hash()));
        assert_eq!(update.reorg_parent, Some(Position::new(0, node.genesis)));
        assert_eq!(update.undone.len(), 3);

        let affected = node.index.reorg(&update.undone).unwrap();
        assert_eq!(affected.len(), 1);
        assert_eq!(node.index.get_balance().unwrap().confirmed, 0);
        assert_eq!(node.index.get_outputs(OutputState::OrphanedNew).len(), 1);

        node.publish(&chain_b);
        run_to_idle(&mut scanner);
        assert_eq!(node.index.get_balance().unwrap().confirmed, 300);
        assert_eq!(
            node.index.subchain_last_scanned(scanner.id()).unwrap(),
            Some(Position::new(2, chain_b[1].hash()))
        );
    }

    #[test]
    fn test_scanner_waits_for_blocks_of_new_best_chain() {
        let node = node();
        let mut scanner = node.scanner();
        let chain = node.mine(node.genesis, EASY_BITS, 3, vec![vec![pay(50, 0)], vec![]]);
        node.oracle
            .add_headers(chain.iter().map(|b| b.header().clone()).collect())
            .unwrap();

        assert_eq!(scanner.step().unwrap(), ScanProgress::Waiting);
        assert_eq!(node.index.get_balance().unwrap().confirmed, 0);

        node.publish(&chain);
        run_to_idle(&mut scanner);
        assert_eq!(node.index.get_balance().unwrap().confirmed, 50);
    }

    // =========================================================================
    // CHECKPOINTS
    // =========================================================================

    #[test]
    fn test_checkpoint_keeps_lighter_chain_best() {
        let node = node();
        let chain_a = node.mine(node.genesis, EASY_BITS, 4, vec![vec![], vec![]]);
        node.oracle
            .add_headers(chain_a.iter().map(|b| b.header().clone()).collect())
            .unwrap();
        node.oracle
            .add_checkpoint(Position::new(1, chain_a[0].hash()))
            .unwrap();

        let chain_b = node.mine(node.genesis, DOUBLE_BITS, 5, vec![vec![], vec![], vec![]]);
        let update = node
            .oracle
            .add_headers(chain_b.iter().map(|b| b.header().clone()).collect())
            .unwrap();

        assert!(update.undone.is_empty());
        assert_eq!(node.oracle.best_chain().unwrap(), Position::new(2, chain_a[1].hash()));
        let banned = node.oracle.load_header(&chain_b[0].hash()).unwrap().unwrap();
        assert_eq!(banned.status, HeaderStatus::CheckpointBanned);

        // Lifting the checkpoint lets the heavier fork win.
        let update = node.oracle.delete_checkpoint().unwrap();
        assert_eq!(update.best, Position::new(3, chain_b[2].hash()));
        assert_eq!(update.undone.len(), 2);
    }
}
