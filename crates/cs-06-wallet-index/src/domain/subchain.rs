//! Subchains and the deterministic ids derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_crypto::sha256_many;
use shared_types::{display_hash, FilterType, Hash};

/// Account identifier, opaque to the index.
pub type AccountId = Hash;
/// `sha256(account ∥ subchain ∥ filter type ∥ version)`.
pub type SubchainId = Hash;
/// `sha256(subchain id ∥ index)`.
pub type PatternId = Hash;
/// HD derivation index.
pub type Bip32Index = u32;

/// Last non-hardened derivation index.
pub const MAX_INDEX: Bip32Index = 0x7fff_ffff;

/// HD derivation branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subchain {
    /// Change addresses.
    Internal,
    /// Receive addresses.
    External,
    Incoming,
    Outgoing,
    Notification,
}

impl Subchain {
    pub const ALL: [Subchain; 5] = [
        Subchain::Internal,
        Subchain::External,
        Subchain::Incoming,
        Subchain::Outgoing,
        Subchain::Notification,
    ];

    pub fn tag(&self) -> u8 {
        match self {
            Subchain::Internal => 0,
            Subchain::External => 1,
            Subchain::Incoming => 2,
            Subchain::Outgoing => 3,
            Subchain::Notification => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subchain::Internal => "internal",
            Subchain::External => "external",
            Subchain::Incoming => "incoming",
            Subchain::Outgoing => "outgoing",
            Subchain::Notification => "notification",
        }
    }
}

impl fmt::Display for Subchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything that identifies one pattern table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubchainKey {
    pub account: AccountId,
    pub subchain: Subchain,
    pub filter_type: FilterType,
    pub version: u32,
}

impl SubchainKey {
    pub fn new(account: AccountId, subchain: Subchain, filter_type: FilterType, version: u32) -> Self {
        Self {
            account,
            subchain,
            filter_type,
            version,
        }
    }

    pub fn id(&self) -> SubchainId {
        sha256_many(&[
            self.account.as_slice(),
            &[self.subchain.tag()][..],
            &[self.filter_type.tag()][..],
            &self.version.to_le_bytes()[..],
        ])
    }
}

impl fmt::Display for SubchainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/v{}",
            &display_hash(&self.account)[..16],
            self.subchain,
            self.filter_type,
            self.version
        )
    }
}

pub fn pattern_id(subchain: &SubchainId, index: Bip32Index) -> PatternId {
    sha256_many(&[subchain.as_slice(), &index.to_le_bytes()[..]])
}
