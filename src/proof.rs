//! Merkle inclusion proofs for the staking transaction.
//!
//! The consensus chain accepts a staking transaction together with a
//! proof that it is included in a Bitcoin block: the concatenated
//! bottom-up siblings of the transaction's leaf, exactly as the block
//! merkle tree hashes them (double SHA-256, odd levels duplicate their
//! last node).

use bitcoin::hashes::Hash;
use bitcoin::{TxMerkleNode, Txid};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    /// Position of the transaction in the block.
    pub index: u32,
    /// Concatenated 32-byte sibling hashes, leaf level first.
    pub nodes: Vec<u8>,
}

fn tree_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut first = Sha256::new();
    first.update(left);
    first.update(right);

    let mut second = Sha256::new();
    second.update(first.finalize());
    second.finalize().into()
}

pub fn create_proof(txids: &[Txid], target: Txid) -> Result<MerkleProof> {
    let index = txids
        .iter()
        .position(|txid| *txid == target)
        .ok_or(Error::TxNotFound)? as u32;

    let mut hashes: Vec<[u8; 32]> = txids.iter().map(|txid| txid.into_inner()).collect();
    let mut nodes = vec![];
    let mut idx = index as usize;

    while hashes.len() > 1 {
        if hashes.len() % 2 == 1 {
            let last = *hashes.last().expect("level is non-empty");
            hashes.push(last);
        }
        nodes.extend_from_slice(&hashes[idx ^ 1]);

        hashes = hashes
            .chunks(2)
            .map(|pair| tree_hash(&pair[0], &pair[1]))
            .collect();
        idx >>= 1;
    }

    Ok(MerkleProof { index, nodes })
}

/// Folds the proof back up to the root. The index's bits decide on which
/// side each sibling sits.
pub fn verify_proof(root: &TxMerkleNode, target: Txid, proof: &MerkleProof) -> bool {
    if proof.nodes.len() % 32 != 0 {
        return false;
    }

    let mut current = target.into_inner();
    let mut idx = proof.index;
    for sibling in proof.nodes.chunks(32) {
        let sibling: [u8; 32] = match sibling.try_into() {
            Ok(s) => s,
            Err(_) => return false,
        };
        current = if idx & 1 == 0 {
            tree_hash(&current, &sibling)
        } else {
            tree_hash(&sibling, &current)
        };
        idx >>= 1;
    }

    current == root.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_txids(n: u8) -> Vec<Txid> {
        (0..n).map(|i| Txid::from_inner([i + 1; 32])).collect()
    }

    // Independent spelling of the block merkle root for the test.
    fn merkle_root(txids: &[Txid]) -> TxMerkleNode {
        let mut level: Vec<[u8; 32]> = txids.iter().map(|t| t.into_inner()).collect();
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                level.push(*level.last().unwrap());
            }
            level = level
                .chunks(2)
                .map(|pair| tree_hash(&pair[0], &pair[1]))
                .collect();
        }
        TxMerkleNode::from_inner(level[0])
    }

    #[test]
    fn proofs_verify_for_every_position() {
        for n in [1u8, 2, 3, 5, 8] {
            let txids = test_txids(n);
            let root = merkle_root(&txids);
            for target in &txids {
                let proof = create_proof(&txids, *target).unwrap();
                assert!(verify_proof(&root, *target, &proof), "n={} failed", n);
            }
        }
    }

    #[test]
    fn single_tx_block_has_empty_proof() {
        let txids = test_txids(1);
        let proof = create_proof(&txids, txids[0]).unwrap();
        assert!(proof.nodes.is_empty());
        assert!(verify_proof(
            &TxMerkleNode::from_inner(txids[0].into_inner()),
            txids[0],
            &proof
        ));
    }

    #[test]
    fn unknown_txid_is_an_error() {
        let txids = test_txids(4);
        let missing = Txid::from_inner([0xEE; 32]);
        assert!(matches!(
            create_proof(&txids, missing),
            Err(Error::TxNotFound)
        ));
    }

    #[test]
    fn tampered_proof_fails() {
        let txids = test_txids(4);
        let root = merkle_root(&txids);
        let mut proof = create_proof(&txids, txids[2]).unwrap();
        proof.nodes[0] ^= 1;
        assert!(!verify_proof(&root, txids[2], &proof));
    }
}
