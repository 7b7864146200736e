//! Indexed filter records.

use cs_02_gcs_filter::GcsFilter;
use serde::{Deserialize, Serialize};
use shared_types::{FilterType, Hash, Position};

/// A block's filter with its hash and chained header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFilter {
    pub position: Position,
    pub filter_type: FilterType,
    /// Wire encoding: element count followed by the Golomb-Rice stream.
    pub filter: Vec<u8>,
    pub filter_hash: Hash,
    pub header: Hash,
}

impl IndexedFilter {
    pub fn new(position: Position, filter_type: FilterType, filter: &GcsFilter, previous_header: &Hash) -> Self {
        Self {
            position,
            filter_type,
            filter: filter.encode(),
            filter_hash: filter.hash(),
            header: filter.header(previous_header),
        }
    }
}
