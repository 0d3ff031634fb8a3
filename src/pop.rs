//! Proof of possession of the staker's Bitcoin key.
//!
//! The consensus chain requires evidence that whoever controls the
//! staker's BTC key also controls the consensus-chain account receiving
//! the delegation: the BTC key signs the account address. The signature
//! scheme is the wallet's choice; BIP-340 and ECDSA proofs can be
//! verified locally before submission, BIP-322 proofs are carried opaque
//! and left to the chain to verify.

use bitcoin::secp256k1::{ecdsa, schnorr, Message, Parity, PublicKey, Secp256k1, XOnlyPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::proto::{BtcSigType, ProofOfPossessionBtc};

/// The 32-byte message the BTC key signs: the hash of the staker's
/// consensus-chain account address.
pub fn pop_message(staker_addr: &str) -> Result<Message> {
    let mut hasher = Sha256::new();
    hasher.update(staker_addr.as_bytes());
    Ok(Message::from_slice(&hasher.finalize())?)
}

pub fn pop_from_signature(sig_type: BtcSigType, btc_sig: Vec<u8>) -> ProofOfPossessionBtc {
    ProofOfPossessionBtc {
        btc_sig_type: sig_type as i32,
        btc_sig,
    }
}

/// Locally verifies a proof of possession before it is submitted.
pub fn verify_pop(
    btc_key: &XOnlyPublicKey,
    staker_addr: &str,
    pop: &ProofOfPossessionBtc,
) -> Result<()> {
    let secp = Secp256k1::verification_only();
    let msg = pop_message(staker_addr)?;

    match BtcSigType::from_i32(pop.btc_sig_type) {
        Some(BtcSigType::Bip340) => {
            let sig = schnorr::Signature::from_slice(&pop.btc_sig)?;
            secp.verify_schnorr(&sig, &msg, btc_key)?;
            Ok(())
        }
        Some(BtcSigType::Ecdsa) => {
            let sig = ecdsa::Signature::from_compact(&pop.btc_sig)?;
            // An x-only key drops the parity byte, so check both points.
            let even = PublicKey::from_x_only_public_key(*btc_key, Parity::Even);
            if secp.verify_ecdsa(&msg, &sig, &even).is_ok() {
                return Ok(());
            }
            let odd = PublicKey::from_x_only_public_key(*btc_key, Parity::Odd);
            secp.verify_ecdsa(&msg, &sig, &odd)?;
            Ok(())
        }
        Some(BtcSigType::Bip322) | None => Err(Error::UnsupportedPopScheme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::KeyPair;

    const ADDR: &str = "bbn1xrhg9tq6mg0jcxu9wyjqcrhmyfqzu3lc2vft9g";

    #[test]
    fn bip340_pop_round_trip() {
        let secp = Secp256k1::new();
        let keypair = KeyPair::from_seckey_slice(&secp, &[11; 32]).unwrap();
        let (btc_key, _) = keypair.x_only_public_key();

        let sig = secp.sign_schnorr(&pop_message(ADDR).unwrap(), &keypair);
        let pop = pop_from_signature(BtcSigType::Bip340, sig.as_ref().to_vec());

        verify_pop(&btc_key, ADDR, &pop).unwrap();
        assert!(verify_pop(&btc_key, "bbn1other", &pop).is_err());
    }

    #[test]
    fn ecdsa_pop_round_trip() {
        let secp = Secp256k1::new();
        let keypair = KeyPair::from_seckey_slice(&secp, &[12; 32]).unwrap();
        let (btc_key, _) = keypair.x_only_public_key();

        let secret = bitcoin::secp256k1::SecretKey::from_keypair(&keypair);
        let sig = secp.sign_ecdsa(&pop_message(ADDR).unwrap(), &secret);
        let pop = pop_from_signature(BtcSigType::Ecdsa, sig.serialize_compact().to_vec());

        verify_pop(&btc_key, ADDR, &pop).unwrap();
    }

    #[test]
    fn bip322_cannot_be_verified_locally() {
        let secp = Secp256k1::new();
        let keypair = KeyPair::from_seckey_slice(&secp, &[13; 32]).unwrap();
        let (btc_key, _) = keypair.x_only_public_key();

        let pop = pop_from_signature(BtcSigType::Bip322, vec![0u8; 80]);
        assert!(matches!(
            verify_pop(&btc_key, ADDR, &pop),
            Err(Error::UnsupportedPopScheme)
        ));
    }
}
