//! SPL name service (SNS): the single `.sol` namespace.

use crate::client::RpcApi;
use crate::constants::{SNS_PROGRAM_ID, SNS_ROOT_DOMAIN_ACCOUNT};
use crate::error::TldResult;
use crate::models::{ByteReader, FavoriteDomain, MemcmpFilter, NameRegistryState};
use crate::pda;
use crate::pubkey::Pubkey;
use async_trait::async_trait;
use std::sync::Arc;

const PARENT_NAME_OFFSET: usize = 0;
const OWNER_OFFSET: usize = 32;

/// SNS operations
#[async_trait]
pub trait SnsApi: Send + Sync {
    /// Name account of `label.sol`
    async fn get_domain_key(&self, domain: &str) -> TldResult<Pubkey>;

    async fn get_registry(&self, name_account: &Pubkey) -> TldResult<Option<NameRegistryState>>;

    /// Every `.sol` name account owned by `owner`
    async fn get_all_domains(&self, owner: &Pubkey) -> TldResult<Vec<Pubkey>>;

    async fn reverse_lookup(&self, name_account: &Pubkey) -> TldResult<Option<String>>;

    async fn get_favorite_domain(&self, owner: &Pubkey) -> TldResult<Option<FavoriteDomain>>;
}

/// SNS reader over a Solana RPC connection
#[derive(Clone)]
pub struct SnsClient {
    rpc: Arc<dyn RpcApi>,
}

impl SnsClient {
    pub fn new(rpc: Arc<dyn RpcApi>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl SnsApi for SnsClient {
    async fn get_domain_key(&self, domain: &str) -> TldResult<Pubkey> {
        pda::sns_domain_key(domain)
    }

    async fn get_registry(&self, name_account: &Pubkey) -> TldResult<Option<NameRegistryState>> {
        let Some(account) = self.rpc.get_account_info(name_account).await? else {
            return Ok(None);
        };

        match NameRegistryState::from_account_data(&account.data) {
            Ok(registry) => Ok(Some(registry)),
            Err(e) => {
                tracing::debug!("Account {} is not an SNS registry: {}", name_account, e);
                Ok(None)
            }
        }
    }

    async fn get_all_domains(&self, owner: &Pubkey) -> TldResult<Vec<Pubkey>> {
        let filters = [
            MemcmpFilter::new(OWNER_OFFSET, *owner),
            MemcmpFilter::new(PARENT_NAME_OFFSET, SNS_ROOT_DOMAIN_ACCOUNT),
        ];
        let accounts = self.rpc.get_program_accounts(&SNS_PROGRAM_ID, &filters).await?;
        tracing::debug!("Found {} .sol name accounts for {}", accounts.len(), owner);
        Ok(accounts.into_iter().map(|(key, _)| key).collect())
    }

    async fn reverse_lookup(&self, name_account: &Pubkey) -> TldResult<Option<String>> {
        let reverse_key = pda::sns_reverse_key(name_account)?;
        let Some(registry) = self.get_registry(&reverse_key).await? else {
            return Ok(None);
        };

        match registry.reverse_name() {
            Ok(name) => Ok(Some(name)),
            Err(e) => {
                tracing::debug!("Reverse record of {} failed to decode: {}", name_account, e);
                Ok(None)
            }
        }
    }

    async fn get_favorite_domain(&self, owner: &Pubkey) -> TldResult<Option<FavoriteDomain>> {
        let (favourite_key, _) = pda::find_favourite_domain(owner)?;
        let Some(account) = self.rpc.get_account_info(&favourite_key).await? else {
            return Ok(None);
        };

        let mut reader = ByteReader::new(&account.data, "favourite domain");
        let domain = match reader.u8().and_then(|_tag| reader.pubkey()) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::debug!("Favourite domain of {} failed to decode: {}", owner, e);
                return Ok(None);
            }
        };

        // A favourite left behind after a transfer no longer counts
        match self.get_registry(&domain).await? {
            Some(registry) if registry.owner == *owner => {}
            _ => return Ok(None),
        }

        Ok(self
            .reverse_lookup(&domain)
            .await?
            .map(|reverse| FavoriteDomain { domain, reverse }))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::register_sol;
    use super::*;
    use crate::constants::SNS_FAVOURITE_DOMAIN_PROGRAM_ID;
    use crate::pubkey::unique_pubkey;
    use crate::testing::MemoryRpc;

    fn setup() -> (Arc<MemoryRpc>, SnsClient) {
        let rpc = Arc::new(MemoryRpc::new());
        let client = SnsClient::new(rpc.clone());
        (rpc, client)
    }

    fn set_favourite(rpc: &MemoryRpc, owner: &Pubkey, domain: &Pubkey) {
        let (key, _) = pda::find_favourite_domain(owner).unwrap();
        let mut data = vec![1u8];
        data.extend_from_slice(domain.as_ref());
        rpc.insert(key, SNS_FAVOURITE_DOMAIN_PROGRAM_ID, data);
    }

    #[tokio::test]
    async fn test_registry_and_reverse_lookup() {
        let (rpc, client) = setup();
        let owner = unique_pubkey();
        let name_account = register_sol(&rpc, "miester", owner);

        assert_eq!(client.get_domain_key("miester.sol").await.unwrap(), name_account);

        let registry = client.get_registry(&name_account).await.unwrap().unwrap();
        assert_eq!(registry.owner, owner);

        let name = client.reverse_lookup(&name_account).await.unwrap();
        assert_eq!(name.as_deref(), Some("miester"));

        assert!(client.reverse_lookup(&unique_pubkey()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_domains() {
        let (rpc, client) = setup();
        let owner = unique_pubkey();
        for label in ["a", "b", "c"] {
            register_sol(&rpc, label, owner);
        }
        register_sol(&rpc, "other", unique_pubkey());

        let domains = client.get_all_domains(&owner).await.unwrap();
        assert_eq!(domains.len(), 3);
    }

    #[tokio::test]
    async fn test_favourite_domain() {
        let (rpc, client) = setup();
        let owner = unique_pubkey();
        assert!(client.get_favorite_domain(&owner).await.unwrap().is_none());

        let name_account = register_sol(&rpc, "miester", owner);
        set_favourite(&rpc, &owner, &name_account);

        let favourite = client.get_favorite_domain(&owner).await.unwrap().unwrap();
        assert_eq!(favourite.domain, name_account);
        assert_eq!(favourite.reverse, "miester");
    }

    #[tokio::test]
    async fn test_stale_favourite_is_ignored() {
        let (rpc, client) = setup();
        let owner = unique_pubkey();
        let name_account = register_sol(&rpc, "sold", unique_pubkey());
        set_favourite(&rpc, &owner, &name_account);

        assert!(client.get_favorite_domain(&owner).await.unwrap().is_none());
    }
}
