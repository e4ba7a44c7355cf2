//! Swap Engine Service
//!
//! Signs swap transactions built by the OKX aggregator with the configured
//! wallet and submits them to Solana.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use tracing::info;

use crate::okx::SwapSubmitter;

pub struct SolanaSwapService {
    rpc_client: RpcClient,
    keypair: Keypair,
}

impl SolanaSwapService {
    /// `private_key` is the base58 encoded 64-byte keypair.
    pub fn new(private_key: &str, rpc_url: &str) -> Result<Self> {
        let keypair = keypair_from_base58(private_key)?;
        let rpc_client = RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());

        Ok(Self { rpc_client, keypair })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Decode a serialized transaction and add this wallet's signature.
    pub fn sign_transaction(&self, serialized_tx: &str) -> Result<VersionedTransaction> {
        let transaction_bytes = decode_transaction_bytes(serialized_tx)?;

        let mut versioned_tx: VersionedTransaction =
            bincode::deserialize(&transaction_bytes).context("Failed to deserialize versioned transaction")?;

        // Find the signer index in the message's account keys
        let idx = versioned_tx
            .message
            .static_account_keys()
            .iter()
            .position(|key| key == &self.keypair.pubkey())
            .context("Keypair not in message account keys")?;

        let msg_data = versioned_tx.message.serialize();
        let sig = self.keypair.sign_message(&msg_data);
        let slot = versioned_tx
            .signatures
            .get_mut(idx)
            .context("Transaction has no signature slot for the wallet")?;
        *slot = sig;

        Ok(versioned_tx)
    }

    async fn sign_and_send(&self, serialized_tx: &str) -> Result<Signature> {
        let versioned_tx = self.sign_transaction(serialized_tx)?;

        let signature = self
            .rpc_client
            .send_and_confirm_transaction(&versioned_tx)
            .await
            .context("Failed to send swap transaction")?;

        info!("Swap transaction confirmed: {}", signature);
        Ok(signature)
    }
}

#[async_trait]
impl SwapSubmitter for SolanaSwapService {
    async fn submit(&self, serialized_tx: &str) -> Result<String, String> {
        self.sign_and_send(serialized_tx)
            .await
            .map(|signature| signature.to_string())
            .map_err(|e| format!("{:#}", e))
    }
}

pub fn keypair_from_base58(private_key: &str) -> Result<Keypair> {
    let keypair_bytes = bs58::decode(private_key.trim())
        .into_vec()
        .context("Failed to decode private key")?;

    Keypair::try_from(&keypair_bytes[..]).context("Failed to create keypair from bytes")
}

/// OKX returns Solana transactions base58 encoded; base64 is accepted too.
fn decode_transaction_bytes(serialized_tx: &str) -> Result<Vec<u8>> {
    let trimmed = serialized_tx.trim();
    match bs58::decode(trimmed).into_vec() {
        Ok(bytes) => Ok(bytes),
        Err(_) => BASE64.decode(trimmed).context("Failed to decode swap transaction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::message::{Message, VersionedMessage};
    use solana_sdk::system_instruction;

    fn unsigned_transfer(payer: &Pubkey) -> VersionedTransaction {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1_000);
        let mut message = Message::new(&[ix], Some(payer));
        message.recent_blockhash = Hash::new_unique();
        let required = message.header.num_required_signatures as usize;
        VersionedTransaction {
            signatures: vec![Signature::default(); required],
            message: VersionedMessage::Legacy(message),
        }
    }

    fn service() -> SolanaSwapService {
        let keypair = Keypair::new();
        SolanaSwapService::new(&keypair.to_base58_string(), "http://127.0.0.1:8899").unwrap()
    }

    #[test]
    fn test_rejects_bad_private_key() {
        assert!(SolanaSwapService::new("not-base58-0OIl", "http://127.0.0.1:8899").is_err());
        assert!(SolanaSwapService::new("3xy", "http://127.0.0.1:8899").is_err());
    }

    #[test]
    fn test_signs_base58_transaction() {
        let service = service();
        let tx = unsigned_transfer(&service.pubkey());
        let encoded = bs58::encode(bincode::serialize(&tx).unwrap()).into_string();

        let signed = service.sign_transaction(&encoded).unwrap();
        let message_bytes = signed.message.serialize();
        assert!(signed.signatures[0].verify(service.pubkey().as_ref(), &message_bytes));
    }

    #[test]
    fn test_signs_base64_transaction() {
        let service = service();
        let tx = unsigned_transfer(&service.pubkey());
        let encoded = BASE64.encode(bincode::serialize(&tx).unwrap());

        let signed = service.sign_transaction(&encoded).unwrap();
        assert_ne!(signed.signatures[0], Signature::default());
    }

    #[test]
    fn test_foreign_transaction_is_rejected() {
        let service = service();
        let tx = unsigned_transfer(&Pubkey::new_unique());
        let encoded = bs58::encode(bincode::serialize(&tx).unwrap()).into_string();

        let err = service.sign_transaction(&encoded).unwrap_err();
        assert!(err.to_string().contains("Keypair not in message account keys"));
    }
}
