//! Recovery of staker signatures from wallet-signed transactions.

use bitcoin::secp256k1::schnorr;
use bitcoin::{Script, Transaction, Witness};

use crate::error::{Error, Result};

const SCHNORR_SIGNATURE_SIZE: usize = 64;

/// Scans the witness stacks of a signed transaction, in input order, and
/// returns the first element with the exact BIP-340 shape. Wallets place
/// the staker's Schnorr signature first in a taproot script-path
/// witness, so the first 64-byte element is the one to register.
pub fn extract_schnorr_signature(tx: &Transaction) -> Result<schnorr::Signature> {
    for txin in tx.input.iter() {
        for item in txin.witness.iter() {
            if item.len() == SCHNORR_SIGNATURE_SIZE {
                return Ok(schnorr::Signature::from_slice(item)?);
            }
        }
    }

    Err(Error::SignatureNotFound)
}

/// Strips scriptSig and witness data from every input, recovering the
/// canonical unsigned form whose serialization is what gets hashed and
/// registered with the consensus chain.
pub fn clear_signatures(tx: &Transaction) -> Transaction {
    let mut tx = tx.clone();
    for txin in tx.input.iter_mut() {
        txin.script_sig = Script::new();
        txin.witness = Witness::default();
    }
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::{OutPoint, PackedLockTime, Sequence, TxIn, Txid};

    fn tx_with_witnesses(witnesses: Vec<Vec<Vec<u8>>>) -> Transaction {
        Transaction {
            version: 2,
            lock_time: PackedLockTime(0),
            input: witnesses
                .into_iter()
                .enumerate()
                .map(|(i, items)| TxIn {
                    previous_output: OutPoint {
                        txid: Txid::from_inner([i as u8 + 1; 32]),
                        vout: 0,
                    },
                    script_sig: Script::new(),
                    sequence: Sequence(u32::MAX),
                    witness: Witness::from_vec(items),
                })
                .collect(),
            output: vec![],
        }
    }

    #[test]
    fn extracts_first_64_byte_element() {
        let sig = [0x55u8; 64];
        let tx = tx_with_witnesses(vec![
            vec![vec![0u8; 71], vec![2u8; 33]],
            vec![sig.to_vec(), vec![1u8; 40], vec![0x77u8; 64]],
        ]);

        let found = extract_schnorr_signature(&tx).unwrap();
        assert_eq!(found.as_ref(), &sig[..]);
    }

    #[test]
    fn missing_signature_is_an_error() {
        let tx = tx_with_witnesses(vec![vec![vec![0u8; 71], vec![2u8; 33]]]);
        assert!(matches!(
            extract_schnorr_signature(&tx),
            Err(Error::SignatureNotFound)
        ));
    }

    #[test]
    fn clear_signatures_preserves_txid() {
        let sig = [0x55u8; 64];
        let signed = tx_with_witnesses(vec![vec![sig.to_vec(), vec![1u8; 40]]]);
        let cleared = clear_signatures(&signed);

        assert_eq!(cleared.txid(), signed.txid());
        assert!(cleared.input.iter().all(|i| i.witness.is_empty()));
        assert!(extract_schnorr_signature(&cleared).is_err());
    }
}
