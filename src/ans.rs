//! AllDomains name service (ANS): many TLDs, one name-record program.

use crate::client::RpcApi;
use crate::constants::ANS_PROGRAM_ID;
use crate::error::TldResult;
use crate::models::{MainDomain, MemcmpFilter, NameRecordHeader, TldHouse};
use crate::pda;
use crate::pubkey::Pubkey;
use async_trait::async_trait;
use std::sync::Arc;

const PARENT_NAME_OFFSET: usize = 8;
const OWNER_OFFSET: usize = 40;

/// ANS operations
#[async_trait]
pub trait AnsApi: Send + Sync {
    /// Name account of `label.tld`
    async fn get_domain_key(&self, domain: &str) -> TldResult<Pubkey>;

    async fn get_name_record(&self, name_account: &Pubkey) -> TldResult<Option<NameRecordHeader>>;

    /// Every ANS name account owned by `owner`, across TLDs
    async fn find_owned_name_accounts(&self, owner: &Pubkey) -> TldResult<Vec<Pubkey>>;

    /// Name accounts owned by `owner` under `tld` (no leading dot)
    async fn get_all_user_domains_from_tld(&self, owner: &Pubkey, tld: &str) -> TldResult<Vec<Pubkey>>;

    /// Display label of `name_account`, looked up through its TLD house
    async fn reverse_lookup_name_account(
        &self,
        name_account: &Pubkey,
        parent_account_owner: &Pubkey,
    ) -> TldResult<Option<String>>;

    /// TLD string (".abc") a parent name account belongs to
    async fn get_tld_from_parent_account(&self, parent_account: &Pubkey) -> TldResult<Option<String>>;

    async fn get_main_domain(&self, owner: &Pubkey) -> TldResult<Option<MainDomain>>;
}

/// ANS reader over a Solana RPC connection
#[derive(Clone)]
pub struct AnsClient {
    rpc: Arc<dyn RpcApi>,
}

impl AnsClient {
    pub fn new(rpc: Arc<dyn RpcApi>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl AnsApi for AnsClient {
    async fn get_domain_key(&self, domain: &str) -> TldResult<Pubkey> {
        pda::ans_domain_key(domain)
    }

    async fn get_name_record(&self, name_account: &Pubkey) -> TldResult<Option<NameRecordHeader>> {
        let Some(account) = self.rpc.get_account_info(name_account).await? else {
            return Ok(None);
        };

        match NameRecordHeader::from_account_data(&account.data) {
            Ok(header) => Ok(Some(header)),
            Err(e) => {
                tracing::debug!("Name account {} is not an ANS record: {}", name_account, e);
                Ok(None)
            }
        }
    }

    async fn find_owned_name_accounts(&self, owner: &Pubkey) -> TldResult<Vec<Pubkey>> {
        let filters = [MemcmpFilter::new(OWNER_OFFSET, *owner)];
        let accounts = self.rpc.get_program_accounts(&ANS_PROGRAM_ID, &filters).await?;
        tracing::debug!("Found {} ANS name accounts for {}", accounts.len(), owner);
        Ok(accounts.into_iter().map(|(key, _)| key).collect())
    }

    async fn get_all_user_domains_from_tld(&self, owner: &Pubkey, tld: &str) -> TldResult<Vec<Pubkey>> {
        let parent = pda::ans_tld_name_account(tld)?;
        let filters = [
            MemcmpFilter::new(PARENT_NAME_OFFSET, parent),
            MemcmpFilter::new(OWNER_OFFSET, *owner),
        ];
        let accounts = self.rpc.get_program_accounts(&ANS_PROGRAM_ID, &filters).await?;
        tracing::debug!("Found {} .{} name accounts for {}", accounts.len(), tld, owner);
        Ok(accounts.into_iter().map(|(key, _)| key).collect())
    }

    async fn reverse_lookup_name_account(
        &self,
        name_account: &Pubkey,
        parent_account_owner: &Pubkey,
    ) -> TldResult<Option<String>> {
        let reverse_key = pda::ans_reverse_key(name_account, parent_account_owner)?;
        let record = self.get_name_record(&reverse_key).await?;
        Ok(record.and_then(|r| r.data_string()))
    }

    async fn get_tld_from_parent_account(&self, parent_account: &Pubkey) -> TldResult<Option<String>> {
        let Some(parent) = self.get_name_record(parent_account).await? else {
            return Ok(None);
        };

        // TLD name accounts are owned by their tld house
        let Some(house) = self.rpc.get_account_info(&parent.owner).await? else {
            return Ok(None);
        };

        match TldHouse::from_account_data(&house.data) {
            Ok(house) => Ok(Some(house.tld)),
            Err(e) => {
                tracing::debug!("Tld house {} failed to decode: {}", parent.owner, e);
                Ok(None)
            }
        }
    }

    async fn get_main_domain(&self, owner: &Pubkey) -> TldResult<Option<MainDomain>> {
        let (main_domain_key, _) = pda::find_main_domain(owner)?;
        let Some(account) = self.rpc.get_account_info(&main_domain_key).await? else {
            return Ok(None);
        };

        match MainDomain::from_account_data(&account.data) {
            Ok(main) => Ok(Some(main)),
            Err(e) => {
                tracing::debug!("Main domain of {} failed to decode: {}", owner, e);
                Ok(None)
            }
        }
    }
}
