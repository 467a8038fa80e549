//! Solana RPC Client
//!
//! Wrapper around the blocking Solana RPC client with an endpoint failover
//! list. Reads (balance) walk the list; broadcast goes to one endpoint only,
//! because a second send after an ambiguous failure risks a double spend.

use std::str::FromStr;
use std::sync::Arc;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use tracing::warn;

use crate::domain::Chain;
use crate::ports::chain::ChainError;

/// Failover-aware Solana RPC client
#[derive(Clone)]
pub struct SolanaRpc {
    clients: Vec<Arc<RpcClient>>,
    endpoints: Vec<String>,
}

impl SolanaRpc {
    /// Build from an ordered endpoint list; the first entry is primary.
    pub fn new(endpoints: Vec<String>) -> Self {
        let clients = endpoints
            .iter()
            .map(|url| {
                Arc::new(RpcClient::new_with_commitment(
                    url.clone(),
                    CommitmentConfig::confirmed(),
                ))
            })
            .collect();
        Self { clients, endpoints }
    }

    /// Native balance in lamports, walking the failover list
    pub async fn get_balance(&self, address: &str) -> Result<u64, ChainError> {
        let pubkey = Pubkey::from_str(address).map_err(|_| ChainError::InvalidAddress {
            chain: Chain::Solana,
            address: address.to_string(),
        })?;

        let mut last_error = String::from("no RPC endpoints configured");
        for (client, endpoint) in self.clients.iter().zip(&self.endpoints) {
            let client = Arc::clone(client);
            let result = tokio::task::spawn_blocking(move || client.get_balance(&pubkey))
                .await
                .map_err(|e| ChainError::RpcUnavailable(format!("task join error: {e}")))?;

            match result {
                Ok(lamports) => return Ok(lamports),
                Err(e) => {
                    warn!("balance query failed on {}: {}", endpoint, e);
                    last_error = e.to_string();
                }
            }
        }
        Err(ChainError::RpcUnavailable(last_error))
    }

    /// Broadcast a signed transaction. One endpoint, one attempt.
    pub async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<String, ChainError> {
        let client = Arc::clone(self.clients.first().ok_or_else(|| {
            ChainError::RpcUnavailable("no RPC endpoints configured".to_string())
        })?);
        let tx = tx.clone();

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction(&tx)
                .map(|sig| sig.to_string())
                .map_err(classify_send_error)
        })
        .await
        .map_err(|e| ChainError::RpcUnavailable(format!("task join error: {e}")))?
    }
}

/// Map a broadcast failure onto the swap error taxonomy. A node's explicit
/// rejection is retryable with a fresh transaction; a timeout is ambiguous
/// (the transaction may have propagated) and must not be retried.
fn classify_send_error(err: ClientError) -> ChainError {
    match &err.kind {
        ClientErrorKind::RpcError(rpc_err) => ChainError::SubmissionFailed(rpc_err.to_string()),
        ClientErrorKind::TransactionError(tx_err) => {
            ChainError::SubmissionFailed(tx_err.to_string())
        }
        ClientErrorKind::Reqwest(e) if e.is_timeout() => ChainError::NetworkTimeout("submit"),
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
            ChainError::RpcUnavailable(err.to_string())
        }
        _ => ChainError::SubmissionFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let rpc = SolanaRpc::new(vec![
            "https://api.mainnet-beta.solana.com".to_string(),
            "https://solana-rpc.publicnode.com".to_string(),
        ]);
        assert_eq!(rpc.endpoints.len(), 2);
        assert_eq!(rpc.clients.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_endpoint_list_is_unavailable() {
        let rpc = SolanaRpc::new(vec![]);
        let result = rpc
            .get_balance("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM")
            .await;
        assert!(matches!(result, Err(ChainError::RpcUnavailable(_))));
    }

    #[tokio::test]
    async fn test_bad_address_rejected_before_network() {
        let rpc = SolanaRpc::new(vec![]);
        let result = rpc.get_balance("not-a-pubkey").await;
        assert!(matches!(result, Err(ChainError::InvalidAddress { .. })));
    }
}
