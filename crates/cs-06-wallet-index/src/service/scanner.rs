//! # Subchain Scanner
//!
//! Cooperative scan loop for one subchain. Each [`SubchainScanner::step`]
//! does a bounded amount of work and reports whether more remains, so many
//! scanners can share one worker pool.
//!
//! Per block on the best chain:
//!
//! 1. patterns not yet tested against the block are checked with its filter
//! 2. on a filter hit the block is fetched and matched exactly
//! 3. the tested patterns are recorded and the scan position advances
//!
//! Lookahead keeps `lookahead` derived indices past the last used one. When
//! a block uses an index and new patterns get derived, the same block is
//! tested again with only those new patterns.
//!
//! The scanner rewinds its own position on a reorg. Rolling back wallet
//! outputs is driven by the owner of the header oracle through
//! [`WalletIndexApi::reorg`].

use std::sync::Arc;

use cs_05_header_oracle::HeaderOracleApi;
use cs_telemetry::TelemetryContext;
use shared_types::{display_hash, Height, Position};
use tracing::{debug, info, warn};

use crate::config::WalletConfig;
use crate::domain::{Bip32Index, SubchainId, SubchainKey};
use crate::error::WalletError;
use crate::ports::inbound::WalletIndexApi;
use crate::ports::outbound::{ChainDataSource, PatternSource};

/// Outcome of one scanner step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanProgress {
    /// Stopped at the batch limit; call again.
    MoreWork,
    /// Caught up with the best chain.
    Idle,
    /// A filter or block has not arrived yet.
    Waiting,
}

/// Collaborators shared by every scanner of one wallet.
#[derive(Clone)]
pub struct ScannerDeps {
    pub index: Arc<dyn WalletIndexApi>,
    pub oracle: Arc<dyn HeaderOracleApi>,
    pub chain_data: Arc<dyn ChainDataSource>,
    pub patterns: Arc<dyn PatternSource>,
}

enum BlockScan {
    Waiting,
    Done { retest: bool },
}

pub struct SubchainScanner {
    key: SubchainKey,
    id: SubchainId,
    config: WalletConfig,
    deps: ScannerDeps,
    telemetry: TelemetryContext,
}

impl SubchainScanner {
    /// Register the subchain and derive its initial lookahead window.
    pub fn new(
        key: SubchainKey,
        config: WalletConfig,
        deps: ScannerDeps,
        telemetry: TelemetryContext,
    ) -> Result<Self, WalletError> {
        config.validate()?;
        let id = deps.index.subchain_add_elements(&key, Vec::new())?;
        let scanner = Self {
            key,
            id,
            config,
            deps,
            telemetry: telemetry.child("subchain-scanner"),
        };
        scanner.ensure_lookahead()?;
        Ok(scanner)
    }

    pub fn id(&self) -> &SubchainId {
        &self.id
    }

    pub fn key(&self) -> &SubchainKey {
        &self.key
    }

    /// Derive indices up to `last_used + lookahead`. Returns whether any
    /// were added.
    fn ensure_lookahead(&self) -> Result<bool, WalletError> {
        let index = &self.deps.index;
        let target = match index.subchain_last_used(&self.id)? {
            Some(used) => used.saturating_add(self.config.lookahead),
            None => self.config.lookahead - 1,
        };
        let next: Bip32Index = index
            .subchain_last_indexed(&self.id)?
            .map_or(0, |last| last.saturating_add(1));
        if next > target {
            return Ok(false);
        }

        let elements = (next..=target)
            .map(|i| Ok((i, self.deps.patterns.derive(&self.key, i)?)))
            .collect::<Result<Vec<_>, WalletError>>()?;
        index.subchain_add_elements(&self.key, elements)?;
        debug!(subchain = %self.key, from = next, to = target, "Extended lookahead");
        Ok(true)
    }

    /// Position the next step resumes from, rewinding after a reorg.
    fn resume_height(&self) -> Result<Option<Height>, WalletError> {
        let Some(scanned) = self.deps.index.subchain_last_scanned(&self.id)? else {
            return Ok(Some(self.config.start_height));
        };
        if self.deps.oracle.is_in_best_chain(&scanned)? {
            return Ok(Some(scanned.height + 1));
        }

        let parent = self
            .deps
            .oracle
            .common_parent(&scanned)?
            .map(|(ancestor, _)| ancestor);
        warn!(
            subchain = %self.key,
            scanned = %scanned,
            rewind_to = ?parent.map(|p| p.height),
            "Scan position left the best chain"
        );
        self.deps.index.subchain_set_last_scanned(&self.id, parent)?;
        Ok(None)
    }

    /// Do up to `batch_size` blocks of work.
    pub fn step(&mut self) -> Result<ScanProgress, WalletError> {
        let _span = self.telemetry.span().entered();
        let Some(mut height) = self.resume_height()? else {
            return Ok(ScanProgress::MoreWork);
        };
        let tip = self.deps.oracle.best_chain()?;

        let mut processed = 0;
        while processed < self.config.batch_size && height <= tip.height {
            let Some(hash) = self.deps.oracle.best_hash(height)? else {
                break;
            };
            let position = Position::new(height, hash);
            match self.scan_block(position)? {
                BlockScan::Waiting => return Ok(ScanProgress::Waiting),
                BlockScan::Done { retest: true } => {}
                BlockScan::Done { retest: false } => {
                    self.deps
                        .index
                        .subchain_set_last_scanned(&self.id, Some(position))?;
                    height += 1;
                }
            }
            processed += 1;
        }

        if height > tip.height {
            debug!(subchain = %self.key, height = tip.height, "Subchain caught up");
            Ok(ScanProgress::Idle)
        } else {
            Ok(ScanProgress::MoreWork)
        }
    }

    fn scan_block(&self, position: Position) -> Result<BlockScan, WalletError> {
        let untested = self
            .deps
            .index
            .get_untested_patterns(&self.id, &position.hash)?;
        if untested.is_empty() {
            return Ok(BlockScan::Done { retest: false });
        }

        let Some(filter) = self
            .deps
            .chain_data
            .filter(self.key.filter_type, &position.hash)
        else {
            debug!(height = position.height, "Waiting for filter");
            return Ok(BlockScan::Waiting);
        };
        let targets: Vec<&Vec<u8>> = untested.iter().flat_map(|p| &p.elements).collect();

        let mut retest = false;
        if filter.test_any(&targets) {
            let Some(block) = self.deps.chain_data.block(&position.hash) else {
                debug!(height = position.height, "Waiting for block");
                return Ok(BlockScan::Waiting);
            };
            let changes = self
                .deps
                .index
                .add_confirmed_block(&self.id, position, &block)?;
            if !changes.created.is_empty() {
                info!(
                    subchain = %self.key,
                    height = position.height,
                    block_hash = %display_hash(&position.hash),
                    outputs = changes.created.len(),
                    "Found wallet outputs"
                );
                retest = self.ensure_lookahead()? && self.config.rescan_enabled;
            }
        }

        let tested = untested.into_iter().map(|p| p.id).collect();
        self.deps
            .index
            .subchain_match_block(&self.id, &position.hash, tested)?;
        Ok(BlockScan::Done { retest })
    }
}
