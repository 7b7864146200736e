//! # Header Oracle Service
//!
//! Owns the single lock around the header DAG. Each mutating call opens an
//! [`UpdateTransaction`], runs the fork-choice transitions against it and
//! commits the resulting batch in one `apply_update`. Any error before the
//! commit drops the batch, so a failed call leaves storage exactly as it was.

use std::sync::Arc;

use cs_04_tx_codec::Header;
use cs_telemetry::{log_block_event, TelemetryContext};
use parking_lot::Mutex;
use shared_types::{display_hash, BlockHash, Height, Position};
use tracing::{debug, info, warn};

use super::fork_choice;
use super::transaction::UpdateTransaction;
use crate::config::OracleConfig;
use crate::domain::HeaderRecord;
use crate::error::OracleError;
use crate::ports::inbound::{ChainUpdate, HeaderOracleApi};
use crate::ports::outbound::HeaderStorage;

const COMPONENT: &str = "header-oracle";

/// Best-chain tracker over a [`HeaderStorage`].
pub struct HeaderOracle<S: HeaderStorage> {
    storage: Arc<S>,
    config: OracleConfig,
    telemetry: TelemetryContext,
    lock: Mutex<()>,
}

impl<S: HeaderStorage> HeaderOracle<S> {
    /// Open the oracle, installing genesis into empty storage.
    ///
    /// Fails with [`OracleError::GenesisMismatch`] if storage was built from
    /// a different genesis header.
    pub fn new(
        storage: Arc<S>,
        config: OracleConfig,
        telemetry: TelemetryContext,
    ) -> Result<Self, OracleError> {
        config.validate()?;
        let oracle = Self {
            storage,
            telemetry: telemetry.with_chain(config.chain),
            config,
            lock: Mutex::new(()),
        };
        oracle.initialize()?;
        Ok(oracle)
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn initialize(&self) -> Result<(), OracleError> {
        let _span = self.telemetry.span().entered();
        let genesis = HeaderRecord::genesis(self.config.genesis_header()?);

        let mut txn = UpdateTransaction::new(self.storage.as_ref(), self.config.chain);
        match self.storage.best_hash(0)? {
            Some(stored) if stored != genesis.hash() => {
                return Err(OracleError::GenesisMismatch {
                    stored: display_hash(&stored),
                    configured: genesis.header.display_hash(),
                });
            }
            Some(_) => {}
            None => {
                info!(block_hash = %genesis.header.display_hash(), "Installing genesis header");
                txn.push_best(genesis.position());
                txn.put(genesis);
            }
        }

        if let Some(checkpoint) = self.config.checkpoint {
            if self.config.install_default_checkpoint && txn.checkpoint()?.is_none() {
                info!(checkpoint = %checkpoint, "Installing default checkpoint");
                fork_choice::apply_checkpoint(&mut txn, checkpoint)?;
            }
        }

        let batch = txn.into_batch();
        if !batch.is_empty() {
            self.storage.apply_update(batch)?;
        }
        Ok(())
    }

    /// Run `operation` inside one transaction and commit it.
    fn mutate<F>(&self, operation: F) -> Result<ChainUpdate, OracleError>
    where
        F: FnOnce(&mut UpdateTransaction<'_>) -> Result<(), OracleError>,
    {
        let _guard = self.lock.lock();
        let mut txn = UpdateTransaction::new(self.storage.as_ref(), self.config.chain);
        let previous_best = txn.tip()?;
        operation(&mut txn)?;
        let update = fork_choice::chain_update(&txn, previous_best)?;
        self.storage.apply_update(txn.into_batch())?;
        self.report(&update);
        Ok(update)
    }

    fn report(&self, update: &ChainUpdate) {
        if let Some(parent) = update.reorg_parent {
            log_block_event!(
                info,
                COMPONENT,
                "Best chain reorganized",
                update.best.height,
                display_hash(&update.best.hash),
                fork_height = parent.height,
                undone = update.undone.len()
            );
        } else if update.tip_changed() {
            log_block_event!(
                debug,
                COMPONENT,
                "Best chain extended",
                update.best.height,
                display_hash(&update.best.hash)
            );
        }
    }

    /// Read-only view for queries.
    fn read<T, F>(&self, query: F) -> Result<T, OracleError>
    where
        F: FnOnce(&UpdateTransaction<'_>) -> Result<T, OracleError>,
    {
        let _guard = self.lock.lock();
        let txn = UpdateTransaction::new(self.storage.as_ref(), self.config.chain);
        query(&txn)
    }

    fn connected(txn: &UpdateTransaction<'_>, hash: &BlockHash) -> Result<Option<HeaderRecord>, OracleError> {
        Ok(txn.load(hash)?.filter(HeaderRecord::is_connected))
    }
}

impl<S: HeaderStorage> HeaderOracleApi for HeaderOracle<S> {
    fn add_header(&self, header: Header) -> Result<ChainUpdate, OracleError> {
        self.add_headers(vec![header])
    }

    fn add_headers(&self, headers: Vec<Header>) -> Result<ChainUpdate, OracleError> {
        let _span = self.telemetry.span().entered();
        let count = headers.len();
        let result = self.mutate(|txn| {
            for header in headers {
                fork_choice::add_header(txn, header)?;
            }
            Ok(())
        });
        match &result {
            Ok(update) => debug!(count, best = %update.best, "Headers ingested"),
            Err(e) => warn!(count, error = %e, "Header batch rejected"),
        }
        result
    }

    fn best_chain(&self) -> Result<Position, OracleError> {
        self.read(|txn| txn.tip())
    }

    fn best_hash(&self, height: Height) -> Result<Option<BlockHash>, OracleError> {
        self.read(|txn| txn.best_hash(height))
    }

    fn best_hashes(&self, start: Height, limit: usize) -> Result<Vec<BlockHash>, OracleError> {
        self.read(|txn| {
            let mut hashes = Vec::new();
            let mut height = start.max(0);
            while limit == 0 || hashes.len() < limit {
                match txn.best_hash(height)? {
                    Some(hash) => hashes.push(hash),
                    None => break,
                }
                height += 1;
            }
            Ok(hashes)
        })
    }

    fn is_in_best_chain(&self, position: &Position) -> Result<bool, OracleError> {
        self.read(|txn| txn.is_best(position))
    }

    fn load_header(&self, hash: &BlockHash) -> Result<Option<HeaderRecord>, OracleError> {
        self.read(|txn| txn.load(hash))
    }

    fn siblings(&self) -> Result<Vec<BlockHash>, OracleError> {
        self.read(|txn| txn.siblings())
    }

    fn get_checkpoint(&self) -> Result<Option<Position>, OracleError> {
        self.read(|txn| txn.checkpoint())
    }

    fn add_checkpoint(&self, checkpoint: Position) -> Result<ChainUpdate, OracleError> {
        let _span = self.telemetry.span().entered();
        let update = self.mutate(|txn| {
            fork_choice::remove_checkpoint(txn)?;
            fork_choice::apply_checkpoint(txn, checkpoint)
        })?;
        if update.is_reorg() {
            warn!(checkpoint = %checkpoint, undone = update.undone.len(), "Checkpoint rewound the best chain");
        } else {
            info!(checkpoint = %checkpoint, "Checkpoint installed");
        }
        Ok(update)
    }

    fn delete_checkpoint(&self) -> Result<ChainUpdate, OracleError> {
        let _span = self.telemetry.span().entered();
        let update = self.mutate(fork_choice::remove_checkpoint)?;
        info!(best = %update.best, "Checkpoint removed");
        Ok(update)
    }

    fn calculate_reorg(&self, tip: &Position) -> Result<Vec<Position>, OracleError> {
        self.read(|txn| {
            let record = Self::connected(txn, &tip.hash)?
                .ok_or_else(|| OracleError::MissingHeader(display_hash(&tip.hash)))?;
            let (ancestor, _) = fork_choice::branch_to_best(txn, &record)?;
            let best = txn.tip()?;
            let mut undone = Vec::new();
            for height in (ancestor.height + 1..=best.height).rev() {
                if let Some(hash) = txn.best_hash(height)? {
                    undone.push(Position::new(height, hash));
                }
            }
            Ok(undone)
        })
    }

    fn common_parent(&self, position: &Position) -> Result<Option<(Position, Position)>, OracleError> {
        self.read(|txn| {
            let Some(record) = Self::connected(txn, &position.hash)? else {
                return Ok(None);
            };
            let (ancestor, _) = fork_choice::branch_to_best(txn, &record)?;
            Ok(Some((ancestor, txn.tip()?)))
        })
    }

    fn ancestors(
        &self,
        start: &Position,
        target: &Position,
        limit: usize,
    ) -> Result<Vec<Position>, OracleError> {
        self.read(|txn| {
            let target = Self::connected(txn, &target.hash)?
                .ok_or_else(|| OracleError::MissingHeader(display_hash(&target.hash)))?;
            let fork = match Self::connected(txn, &start.hash)? {
                Some(start) => fork_choice::fork_point(txn, &start, &target)?,
                None => {
                    let height = start.height.clamp(0, target.height);
                    fork_choice::ancestor_at(txn, &target, height)?
                }
            };

            let mut path = Vec::new();
            let mut cursor = target;
            while cursor.height > fork.height {
                path.push(cursor.position());
                cursor = txn.require(&cursor.previous())?;
            }
            path.push(fork.position());
            path.reverse();
            if limit > 0 {
                path.truncate(limit);
            }
            Ok(path)
        })
    }

    fn recent_hashes(&self, limit: Option<usize>) -> Result<Vec<BlockHash>, OracleError> {
        let limit = limit.unwrap_or(self.config.recent_hash_window);
        self.read(|txn| {
            let tip = txn.tip()?;
            let mut hashes = Vec::with_capacity(limit);
            let mut height = tip.height;
            while height >= 0 && hashes.len() < limit {
                if let Some(hash) = txn.best_hash(height)? {
                    hashes.push(hash);
                }
                height -= 1;
            }
            Ok(hashes)
        })
    }
}
