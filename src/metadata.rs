use crate::client::RpcApi;
use crate::constants::MAX_MINTS_PER_METADATA_REQUEST;
use crate::error::{TldError, TldResult};
use crate::models::TokenMetadata;
use crate::pubkey::Pubkey;
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::json;

pub const HELIUS_API_URL: &str = "https://api.helius.xyz";

/// Token metadata lookups
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// One request; callers page `mints` to at most 100 entries
    async fn get_token_metadata(&self, mints: &[Pubkey], api_key: &str) -> TldResult<Vec<TokenMetadata>>;
}

/// Helius token-metadata client
pub struct HeliusClient {
    client: Client,
    base_url: String,
}

impl HeliusClient {
    pub fn new() -> Self {
        Self::with_url(HELIUS_API_URL.to_string())
    }

    /// Create with custom API base URL
    pub fn with_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HeliusClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataApi for HeliusClient {
    async fn get_token_metadata(&self, mints: &[Pubkey], api_key: &str) -> TldResult<Vec<TokenMetadata>> {
        if mints.len() > MAX_MINTS_PER_METADATA_REQUEST {
            return Err(TldError::InvalidInput(format!(
                "metadata requests accept at most {} mints, got {}",
                MAX_MINTS_PER_METADATA_REQUEST,
                mints.len()
            )));
        }

        let url = format!("{}/v0/tokens/metadata", self.base_url);
        let mint_accounts: Vec<String> = mints.iter().map(Pubkey::to_string).collect();

        tracing::debug!("Fetching metadata for {} mints", mint_accounts.len());

        let response = self
            .client
            .post(&url)
            .query(&[("api-key", api_key)])
            .json(&json!({ "mintAccounts": mint_accounts }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TldError::MetadataError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| TldError::MetadataError(format!("Failed to parse metadata JSON: {}", e)))
    }
}

/// Metadata for any number of mints: pages of 100, requested in parallel
///
/// Pages are concatenated in request order, but entries within a page follow
/// whatever order the API returns.
pub async fn fetch_metadata_paged(
    api: &dyn MetadataApi,
    mints: &[Pubkey],
    api_key: &str,
) -> TldResult<Vec<TokenMetadata>> {
    if mints.is_empty() {
        return Ok(Vec::new());
    }

    let pages = try_join_all(
        mints
            .chunks(MAX_MINTS_PER_METADATA_REQUEST)
            .map(|page| api.get_token_metadata(page, api_key)),
    )
    .await?;

    Ok(pages.into_iter().flatten().collect())
}

/// Metadata of every NFT `owner` holds (zero decimals, at least one unit)
pub async fn get_parsed_nft_accounts_by_owner(
    rpc: &dyn RpcApi,
    api: &dyn MetadataApi,
    owner: &Pubkey,
    api_key: &str,
) -> TldResult<Vec<TokenMetadata>> {
    let mints: Vec<Pubkey> = rpc
        .get_token_accounts_by_owner(owner)
        .await?
        .into_iter()
        .filter(|holding| holding.is_nft())
        .map(|holding| holding.mint)
        .collect();

    tracing::debug!("{} holds {} NFTs", owner, mints.len());

    fetch_metadata_paged(api, &mints, api_key).await
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned metadata per mint and records page sizes
    #[derive(Default)]
    pub(crate) struct MemoryMetadata {
        entries: Mutex<HashMap<Pubkey, TokenMetadata>>,
        pub(crate) page_sizes: Mutex<Vec<usize>>,
    }

    impl MemoryMetadata {
        pub(crate) fn insert(&self, mint: Pubkey, metadata: TokenMetadata) {
            self.entries.lock().unwrap().insert(mint, metadata);
        }
    }

    #[async_trait]
    impl MetadataApi for MemoryMetadata {
        async fn get_token_metadata(&self, mints: &[Pubkey], _api_key: &str) -> TldResult<Vec<TokenMetadata>> {
            self.page_sizes.lock().unwrap().push(mints.len());
            let entries = self.entries.lock().unwrap();
            Ok(mints.iter().filter_map(|m| entries.get(m).cloned()).collect())
        }
    }

    pub(crate) fn domain_nft(mint: &Pubkey, label: &str, collection: &Pubkey, verified: bool) -> TokenMetadata {
        serde_json::from_value(json!({
            "mint": mint.to_string(),
            "onChainData": {
                "data": { "name": format!("{}\u{0}\u{0}\u{0}", label) },
                "collection": { "key": collection.to_string(), "verified": verified }
            },
            "offChainData": { "name": label, "image": "https://example.com/domain.png" }
        }))
        .unwrap()
    }
}
