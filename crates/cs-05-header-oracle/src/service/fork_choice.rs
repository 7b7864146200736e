//! Header DAG transitions.
//!
//! Every function here works on an [`UpdateTransaction`] and never touches
//! storage directly. The best chain is the connected, unbanned chain with the
//! most cumulative work; ties keep the chain already selected.

use cs_04_tx_codec::Header;
use shared_types::{BlockHash, Height, Position};
use tracing::debug;

use super::transaction::UpdateTransaction;
use crate::domain::{HeaderRecord, HeaderStatus};
use crate::error::OracleError;
use crate::ports::inbound::ChainUpdate;

/// Ingest one header. Known headers are ignored.
pub(crate) fn add_header(txn: &mut UpdateTransaction<'_>, header: Header) -> Result<(), OracleError> {
    if header.chain() != txn.chain() {
        return Err(OracleError::WrongChain {
            expected: txn.chain(),
            actual: header.chain(),
        });
    }
    if txn.load(&header.hash())?.is_some() {
        return Ok(());
    }

    match txn.load(&header.previous())? {
        Some(parent) if parent.is_connected() => {
            let record = attach(txn, header, &parent)?;
            connect(txn, record)
        }
        _ => {
            let record = HeaderRecord::disconnected(header);
            debug!(block_hash = %record.header.display_hash(), "Header parent unknown, holding as disconnected");
            txn.add_disconnected(record.previous(), record.hash());
            txn.put(record);
            Ok(())
        }
    }
}

/// Store `header` as a connected child of `parent`.
fn attach(
    txn: &mut UpdateTransaction<'_>,
    header: Header,
    parent: &HeaderRecord,
) -> Result<HeaderRecord, OracleError> {
    let mut record = HeaderRecord::connected(header, parent);
    if let Some(checkpoint) = txn.checkpoint()? {
        if record.height == checkpoint.height && record.hash() != checkpoint.hash {
            record.status = HeaderStatus::CheckpointBanned;
        }
    }
    if record.status == HeaderStatus::CheckpointBanned {
        txn.ban(record.hash());
    }
    txn.put(record.clone());
    Ok(record)
}

/// Evaluate `record`, then pull in any orphans that were waiting for it.
fn connect(txn: &mut UpdateTransaction<'_>, record: HeaderRecord) -> Result<(), OracleError> {
    let mut pending = vec![record];
    while let Some(record) = pending.pop() {
        evaluate_candidate(txn, &record)?;
        for child_hash in txn.take_disconnected_children(&record.hash())? {
            let orphan = txn.require(&child_hash)?;
            debug!(block_hash = %orphan.header.display_hash(), "Reattaching disconnected header");
            pending.push(attach(txn, orphan.header, &record)?);
        }
    }
    Ok(())
}

/// Make `record` the best tip if it beats the current one, otherwise keep it
/// as a sibling. Returns whether the best chain changed.
pub(crate) fn evaluate_candidate(
    txn: &mut UpdateTransaction<'_>,
    record: &HeaderRecord,
) -> Result<bool, OracleError> {
    if record.status != HeaderStatus::Normal || txn.is_best(&record.position())? {
        return Ok(false);
    }

    let tip_position = txn.tip()?;
    let tip = txn.require(&tip_position.hash)?;
    if record.work <= tip.work {
        mark_sibling(txn, record);
        return Ok(false);
    }

    let (ancestor, path) = branch_to_best(txn, record)?;
    if !honours_checkpoint(txn, &ancestor, &path, &tip_position)? {
        debug!(block_hash = %record.header.display_hash(), "Candidate conflicts with checkpoint");
        mark_sibling(txn, record);
        return Ok(false);
    }

    if ancestor.height < tip_position.height {
        txn.add_sibling(tip_position.hash);
        txn.truncate_best(ancestor.height)?;
    }
    for position in path {
        txn.remove_sibling(position.hash);
        txn.push_best(position);
    }
    Ok(true)
}

fn mark_sibling(txn: &mut UpdateTransaction<'_>, record: &HeaderRecord) {
    txn.add_sibling(record.hash());
    txn.remove_sibling(record.previous());
}

/// Highest best-chain ancestor of `record` and the path from it up to
/// `record`, ascending.
pub(crate) fn branch_to_best(
    txn: &UpdateTransaction<'_>,
    record: &HeaderRecord,
) -> Result<(Position, Vec<Position>), OracleError> {
    let mut path = Vec::new();
    let mut cursor = record.clone();
    while !txn.is_best(&cursor.position())? {
        path.push(cursor.position());
        cursor = txn.require(&cursor.previous())?;
    }
    path.reverse();
    Ok((cursor.position(), path))
}

fn honours_checkpoint(
    txn: &UpdateTransaction<'_>,
    ancestor: &Position,
    path: &[Position],
    tip: &Position,
) -> Result<bool, OracleError> {
    let Some(checkpoint) = txn.checkpoint()? else {
        return Ok(true);
    };
    let height = path.last().map_or(ancestor.height, |p| p.height);
    if height < checkpoint.height {
        return Ok(tip.height < checkpoint.height);
    }
    if ancestor.height >= checkpoint.height {
        return Ok(true);
    }
    Ok(path
        .iter()
        .any(|p| p.height == checkpoint.height && p.hash == checkpoint.hash))
}

/// Ancestor of `record` at `height`.
pub(crate) fn ancestor_at(
    txn: &UpdateTransaction<'_>,
    record: &HeaderRecord,
    height: Height,
) -> Result<HeaderRecord, OracleError> {
    if txn.is_best(&record.position())? {
        if let Some(hash) = txn.best_hash(height)? {
            return txn.require(&hash);
        }
    }
    let mut cursor = record.clone();
    while cursor.height > height {
        cursor = txn.require(&cursor.previous())?;
    }
    Ok(cursor)
}

/// Highest header both `a` and `b` descend from.
pub(crate) fn fork_point(
    txn: &UpdateTransaction<'_>,
    a: &HeaderRecord,
    b: &HeaderRecord,
) -> Result<HeaderRecord, OracleError> {
    let height = a.height.min(b.height);
    let mut left = ancestor_at(txn, a, height)?;
    let mut right = ancestor_at(txn, b, height)?;
    while left.hash() != right.hash() {
        left = txn.require(&left.previous())?;
        right = txn.require(&right.previous())?;
    }
    Ok(left)
}

fn ban(txn: &mut UpdateTransaction<'_>, mut record: HeaderRecord) {
    record.status = HeaderStatus::CheckpointBanned;
    txn.ban(record.hash());
    txn.put(record);
}

/// Pin `checkpoint`, rewinding the best chain if it disagrees.
pub(crate) fn apply_checkpoint(
    txn: &mut UpdateTransaction<'_>,
    checkpoint: Position,
) -> Result<(), OracleError> {
    if checkpoint.height < 0
        || (checkpoint.height == 0 && txn.best_hash(0)? != Some(checkpoint.hash))
    {
        return Err(OracleError::InvalidCheckpoint(checkpoint.height));
    }
    txn.set_checkpoint(Some(checkpoint));

    let tip = txn.tip()?;
    if tip.height >= checkpoint.height {
        let conflicting = txn
            .best_hash(checkpoint.height)?
            .filter(|hash| *hash != checkpoint.hash);
        if let Some(hash) = conflicting {
            let record = txn.require(&hash)?;
            ban(txn, record);
            if tip.hash != hash {
                txn.add_sibling(tip.hash);
            }
            txn.truncate_best(checkpoint.height - 1)?;
        }
    }

    for hash in txn.siblings()? {
        let record = txn.require(&hash)?;
        if record.height < checkpoint.height {
            continue;
        }
        let at = ancestor_at(txn, &record, checkpoint.height)?;
        if at.hash() != checkpoint.hash && at.status == HeaderStatus::Normal {
            ban(txn, at);
        }
    }

    let siblings = txn.siblings()?;
    reevaluate(txn, siblings)
}

/// Drop the checkpoint and let every previously banned header compete again.
pub(crate) fn remove_checkpoint(txn: &mut UpdateTransaction<'_>) -> Result<(), OracleError> {
    if txn.checkpoint()?.is_none() {
        return Ok(());
    }
    txn.set_checkpoint(None);

    let banned = txn.banned()?;
    for hash in &banned {
        let mut record = txn.require(hash)?;
        record.status = HeaderStatus::Normal;
        txn.unban(*hash);
        txn.put(record);
    }

    let mut candidates = txn.siblings()?;
    candidates.extend(banned);
    reevaluate(txn, candidates)
}

/// Evaluate `hashes`, most work first.
fn reevaluate(txn: &mut UpdateTransaction<'_>, hashes: Vec<BlockHash>) -> Result<(), OracleError> {
    let mut records = hashes
        .iter()
        .map(|hash| txn.require(hash))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by(|a, b| b.work.cmp(&a.work).then(a.height.cmp(&b.height)));
    for record in records {
        evaluate_candidate(txn, &record)?;
    }
    Ok(())
}

/// Compare the tip now staged against `previous_best`.
pub(crate) fn chain_update(
    txn: &UpdateTransaction<'_>,
    previous_best: Position,
) -> Result<ChainUpdate, OracleError> {
    let best = txn.tip()?;
    if txn.is_best(&previous_best)? {
        return Ok(ChainUpdate {
            previous_best,
            best,
            reorg_parent: None,
            undone: Vec::new(),
        });
    }

    let mut undone = Vec::new();
    let mut cursor = txn.require(&previous_best.hash)?;
    while !txn.is_best(&cursor.position())? {
        undone.push(cursor.position());
        cursor = txn.require(&cursor.previous())?;
    }
    Ok(ChainUpdate {
        previous_best,
        best,
        reorg_parent: Some(cursor.position()),
        undone,
    })
}
