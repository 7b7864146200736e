//! Header records and their stored form.

use cs_04_tx_codec::{Header, Work};
use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, ChainType, Height, Position, UNKNOWN_HEIGHT};

use crate::error::OracleError;

/// Where a header stands relative to the connected DAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderStatus {
    /// Connected to genesis; eligible for the best chain.
    Normal,
    /// Some ancestor is unknown.
    Disconnected,
    /// Conflicts with a checkpoint, or descends from a header that does.
    CheckpointBanned,
}

/// A header plus what the oracle knows about its place in the DAG.
///
/// `work` is cumulative from genesis for connected headers and the
/// header's own work while disconnected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
    pub header: Header,
    pub height: Height,
    pub work: Work,
    pub status: HeaderStatus,
}

impl HeaderRecord {
    pub fn disconnected(header: Header) -> Self {
        let work = header.work();
        Self {
            header,
            height: UNKNOWN_HEIGHT,
            work,
            status: HeaderStatus::Disconnected,
        }
    }

    /// Attach under `parent`, inheriting its height, work and ban.
    pub fn connected(header: Header, parent: &HeaderRecord) -> Self {
        let status = match parent.status {
            HeaderStatus::CheckpointBanned => HeaderStatus::CheckpointBanned,
            _ => HeaderStatus::Normal,
        };
        let work = parent.work + header.work();
        Self {
            header,
            height: parent.height + 1,
            work,
            status,
        }
    }

    pub fn genesis(header: Header) -> Self {
        let work = header.work();
        Self {
            header,
            height: 0,
            work,
            status: HeaderStatus::Normal,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn previous(&self) -> BlockHash {
        self.header.previous()
    }

    pub fn position(&self) -> Position {
        Position::new(self.height, self.hash())
    }

    pub fn is_connected(&self) -> bool {
        self.status != HeaderStatus::Disconnected
    }
}

/// Persisted form of a [`HeaderRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHeader {
    pub chain: u8,
    pub raw: Vec<u8>,
    pub height: Height,
    pub work: Work,
    pub status: HeaderStatus,
}

impl StoredHeader {
    pub fn from_record(record: &HeaderRecord) -> Self {
        Self {
            chain: record.header.chain().tag(),
            raw: record.header.serialize().to_vec(),
            height: record.height,
            work: record.work,
            status: record.status,
        }
    }

    /// Rebuild the record, rejecting records of another chain.
    pub fn into_record(self, expected: ChainType) -> Result<HeaderRecord, OracleError> {
        let actual = ChainType::from_tag(self.chain)
            .map_err(|e| OracleError::Serialization(e.to_string()))?;
        if actual != expected {
            return Err(OracleError::WrongChain { expected, actual });
        }
        Ok(HeaderRecord {
            header: Header::parse(actual, &self.raw)?,
            height: self.height,
            work: self.work,
            status: self.status,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, OracleError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OracleError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
