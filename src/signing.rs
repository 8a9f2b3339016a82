// Transaction signing module
// Key handling, EIP-1559 signing, and the per-transfer salt derivation

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::errors::TransferError;

/// Operator key wrapper. One signer per process; attempts are sequential so
/// nonce ordering stays implicit.
#[derive(Debug, Clone)]
pub struct TxSigner {
    signer: PrivateKeySigner,
}

impl TxSigner {
    pub fn from_hex(secret_hex: &str) -> Result<Self, TransferError> {
        let signer: PrivateKeySigner = secret_hex
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| TransferError::Configuration(format!("invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    /// EVM address derived from the private key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign and EIP-2718-encode a fee-market transaction for raw broadcast.
    pub fn sign_eip1559(&self, tx: TxEip1559) -> Result<Vec<u8>, TransferError> {
        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| TransferError::BroadcastFailed(format!("sign: {e}")))?;
        let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));
        Ok(envelope.encoded_2718())
    }
}

/// Per-transfer salt: keccak of the ABI words (sender, unix timestamp).
/// Keeps repeated iterations unique even with identical parameters.
pub fn derive_salt(sender: Address, unix_secs: u64) -> B256 {
    let mut buf = [0u8; 64];
    buf[12..32].copy_from_slice(sender.as_slice());
    buf[32..64].copy_from_slice(&U256::from(unix_secs).to_be_bytes::<32>());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, TxKind};

    // well-known development key, never funded anywhere that matters
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn address_derivation_matches_known_key() {
        let signer = TxSigner::from_hex(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        // 0x prefix is accepted too
        let prefixed = TxSigner::from_hex(&format!("0x{DEV_KEY}")).unwrap();
        assert_eq!(prefixed.address(), signer.address());
    }

    #[test]
    fn bad_key_is_a_configuration_error() {
        assert!(matches!(
            TxSigner::from_hex("not-a-key"),
            Err(TransferError::Configuration(_))
        ));
    }

    #[test]
    fn signed_transaction_is_typed_eip1559() {
        let signer = TxSigner::from_hex(DEV_KEY).unwrap();
        let tx = TxEip1559 {
            chain_id: 11155111,
            nonce: 7,
            gas_limit: 120_000,
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_500_000_000,
            to: TxKind::Call(address!("5FbE74A283f7954f10AA04C2eDf55578811aeb03")),
            value: U256::from(100_000_000_000_000u64),
            access_list: Default::default(),
            input: Default::default(),
        };
        let raw = signer.sign_eip1559(tx).unwrap();
        assert_eq!(raw[0], 0x02); // EIP-2718 type byte
    }

    #[test]
    fn salt_varies_with_timestamp_only() {
        let sender = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let a = derive_salt(sender, 1_700_000_000);
        let b = derive_salt(sender, 1_700_000_000);
        let c = derive_salt(sender, 1_700_000_001);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
