//! Block filter construction.

use cs_02_gcs_filter::{GcsError, GcsFilter};
use shared_types::FilterType;
use tracing::debug;

use super::Block;
use crate::script::extract::script_elements;
use crate::script::{Script, ScriptRole};

/// Collect the filter elements of `block`.
///
/// `previous_output_scripts` are the scripts of every output the block
/// spends; the caller resolves them from its UTXO view since a block alone
/// does not carry them. The BCH variant commits to spent outpoints instead
/// and ignores them.
pub fn block_filter_elements(
    block: &Block,
    filter_type: FilterType,
    previous_output_scripts: &[Vec<u8>],
) -> Vec<Vec<u8>> {
    let mut elements: Vec<Vec<u8>> = block
        .transactions()
        .iter()
        .flat_map(|tx| tx.extract_elements(filter_type))
        .collect();

    match filter_type {
        FilterType::BasicBip158 => {
            elements.extend(previous_output_scripts.iter().filter(|s| !s.is_empty()).cloned());
        }
        FilterType::BasicBchVariant => {}
        FilterType::Es => {
            for raw in previous_output_scripts {
                script_elements(&Script::parse_lenient(raw, ScriptRole::Output), &mut elements);
            }
        }
    }
    elements
}

/// Build the filter of `filter_type` for `block`, keyed by its hash.
pub fn compute_block_filter(
    block: &Block,
    filter_type: FilterType,
    previous_output_scripts: &[Vec<u8>],
) -> Result<GcsFilter, GcsError> {
    let elements = block_filter_elements(block, filter_type, previous_output_scripts);
    let filter = GcsFilter::for_block(filter_type, &block.hash(), &elements)?;
    debug!(
        block_hash = %block.header().display_hash(),
        filter_type = %filter_type,
        elements = filter.count(),
        "Computed block filter"
    );
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{merkle_root, Header};
    use crate::transaction::{Input, Output, Transaction};
    use shared_types::{ChainType, Outpoint, NULL_HASH};

    fn sample_block() -> Block {
        let coinbase = Transaction::new(
            1,
            vec![Input::new(Outpoint::null(), &[0x01, 0x01], u32::MAX)],
            vec![
                Output::from_script(50, Script::p2pkh(&[0x11; 20])),
                Output::from_script(0, Script::null_data(&[&b"tag"[..]])),
            ],
            0,
        );
        let spend = Transaction::new(
            1,
            vec![Input::new(Outpoint::new([0x22; 32], 0), &[0x51], u32::MAX)],
            vec![Output::from_script(10, Script::p2sh(&[0x33; 20]))],
            0,
        );
        let txids = [coinbase.txid(), spend.txid()];
        let header = Header::new(ChainType::UnitTest, 1, NULL_HASH, merkle_root(&txids), 0, 0x207fffff, 0);
        Block::new(header, vec![coinbase, spend]).unwrap()
    }

    #[test]
    fn test_basic_filter_matches_outputs_and_spent_scripts() {
        let block = sample_block();
        let spent = Script::p2pkh(&[0x44; 20]).serialize();
        let filter =
            compute_block_filter(&block, FilterType::BasicBip158, &[spent.clone(), Vec::new()]).unwrap();
        assert_eq!(filter.count(), 3);
        assert!(filter.test(&Script::p2pkh(&[0x11; 20]).serialize()));
        assert!(filter.test(&Script::p2sh(&[0x33; 20]).serialize()));
        assert!(filter.test(&spent));
        assert!(!filter.test(&Script::null_data(&[&b"tag"[..]]).serialize()));
    }

    #[test]
    fn test_bch_variant_adds_outpoints() {
        let block = sample_block();
        let filter = compute_block_filter(&block, FilterType::BasicBchVariant, &[]).unwrap();
        assert!(filter.test(&Outpoint::new([0x22; 32], 0).to_bytes()));
    }

    #[test]
    fn test_bch_variant_skips_spent_scripts() {
        let block = sample_block();
        let spent = Script::p2pkh(&[0x44; 20]).serialize();
        let elements = block_filter_elements(&block, FilterType::BasicBchVariant, &[spent.clone()]);
        assert!(!elements.contains(&spent));
        assert!(elements.contains(&Outpoint::new([0x22; 32], 0).to_bytes().to_vec()));

        let with_spent = compute_block_filter(&block, FilterType::BasicBchVariant, &[spent]).unwrap();
        let without = compute_block_filter(&block, FilterType::BasicBchVariant, &[]).unwrap();
        assert_eq!(with_spent.hash(), without.hash());
    }

    #[test]
    fn test_es_filter_matches_hashes() {
        let block = sample_block();
        let filter = compute_block_filter(&block, FilterType::Es, &[]).unwrap();
        assert!(filter.test(&[0x11; 20]));
        assert!(filter.test(&[0x33; 20]));
    }

    #[test]
    fn test_filter_roundtrips_through_wire_form() {
        let block = sample_block();
        let filter = compute_block_filter(&block, FilterType::BasicBip158, &[]).unwrap();
        let decoded =
            GcsFilter::decode_for_block(FilterType::BasicBip158, &block.hash(), &filter.encode()).unwrap();
        assert_eq!(decoded, filter);
        assert!(decoded.test(&Script::p2sh(&[0x33; 20]).serialize()));
    }
}
