use crate::constants::{MAX_ACCOUNTS_PER_FETCH, SPL_TOKEN_PROGRAM_ID};
use crate::error::{TldError, TldResult};
use crate::models::*;
use crate::pubkey::Pubkey;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

pub use crate::models::Cluster;

/// Chain reads the resolvers depend on
#[async_trait]
pub trait RpcApi: Send + Sync {
    async fn get_account_info(&self, key: &Pubkey) -> TldResult<Option<AccountInfo>>;

    /// One entry per key, in order; at most 100 keys
    async fn get_multiple_accounts(&self, keys: &[Pubkey]) -> TldResult<Vec<Option<AccountInfo>>>;

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> TldResult<Vec<(Pubkey, AccountInfo)>>;

    /// SPL token balances held by `owner`
    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> TldResult<Vec<TokenHolding>>;
}

/// Solana JSON-RPC client
pub struct SolanaRpcClient {
    client: Client,
    rpc_url: String,
    cluster: Cluster,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    /// Create a new client for the cluster's public endpoint
    pub fn new(cluster: Cluster) -> Self {
        Self::with_url(cluster, cluster.rpc_url().to_string())
    }

    /// Create with custom RPC URL
    pub fn with_url(cluster: Cluster, rpc_url: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
            cluster,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> TldResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            params,
        };

        tracing::debug!("Querying Solana: {}", method);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TldError::RpcError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let rpc_response: RpcResponse<T> = response.json().await?;
        if let Some(err) = rpc_response.error {
            return Err(TldError::RpcError(format!(
                "{} failed ({}): {}",
                method, err.code, err.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| TldError::RpcError(format!("{} returned no result", method)))
    }
}

fn decode_account(account: UiAccount) -> TldResult<AccountInfo> {
    let (encoded, encoding) = account.data;
    if encoding != "base64" {
        return Err(TldError::DecodeError(format!(
            "unexpected account encoding: {}",
            encoding
        )));
    }

    Ok(AccountInfo {
        lamports: account.lamports,
        owner: account.owner.parse()?,
        data: BASE64.decode(encoded)?,
        executable: account.executable,
    })
}

#[async_trait]
impl RpcApi for SolanaRpcClient {
    async fn get_account_info(&self, key: &Pubkey) -> TldResult<Option<AccountInfo>> {
        let result: RpcContextValue<Option<UiAccount>> = self
            .call(
                "getAccountInfo",
                vec![json!(key.to_string()), json!({ "encoding": "base64" })],
            )
            .await?;

        result.value.map(decode_account).transpose()
    }

    async fn get_multiple_accounts(&self, keys: &[Pubkey]) -> TldResult<Vec<Option<AccountInfo>>> {
        if keys.len() > MAX_ACCOUNTS_PER_FETCH {
            return Err(TldError::InvalidInput(format!(
                "getMultipleAccounts accepts at most {} keys, got {}",
                MAX_ACCOUNTS_PER_FETCH,
                keys.len()
            )));
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = keys.iter().map(Pubkey::to_string).collect();
        let result: RpcContextValue<Vec<Option<UiAccount>>> = self
            .call(
                "getMultipleAccounts",
                vec![json!(keys), json!({ "encoding": "base64" })],
            )
            .await?;

        result
            .value
            .into_iter()
            .map(|account| account.map(decode_account).transpose())
            .collect()
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> TldResult<Vec<(Pubkey, AccountInfo)>> {
        let filters: Vec<serde_json::Value> = filters
            .iter()
            .map(|f| json!({ "memcmp": { "offset": f.offset, "bytes": f.bytes.to_string() } }))
            .collect();

        let accounts: Vec<RpcKeyedAccount> = self
            .call(
                "getProgramAccounts",
                vec![
                    json!(program_id.to_string()),
                    json!({ "encoding": "base64", "filters": filters }),
                ],
            )
            .await?;

        accounts
            .into_iter()
            .map(|keyed| -> TldResult<(Pubkey, AccountInfo)> {
                Ok((keyed.pubkey.parse()?, decode_account(keyed.account)?))
            })
            .collect()
    }

    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> TldResult<Vec<TokenHolding>> {
        let result: RpcContextValue<Vec<RpcParsedTokenAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                vec![
                    json!(owner.to_string()),
                    json!({ "programId": SPL_TOKEN_PROGRAM_ID.to_string() }),
                    json!({ "encoding": "jsonParsed" }),
                ],
            )
            .await?;

        result
            .value
            .into_iter()
            .map(|account| -> TldResult<TokenHolding> {
                let info = account.account.data.parsed.info;
                Ok(TokenHolding {
                    mint: info.mint.parse()?,
                    ui_amount: info.token_amount.ui_amount.unwrap_or_default(),
                    decimals: info.token_amount.decimals,
                })
            })
            .collect()
    }
}
