//! In-memory chain used by unit tests.

use crate::client::RpcApi;
use crate::error::{TldError, TldResult};
use crate::models::{AccountInfo, MemcmpFilter, TokenHolding};
use crate::pubkey::Pubkey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct MemoryRpc {
    accounts: Mutex<HashMap<Pubkey, AccountInfo>>,
    holdings: Mutex<HashMap<Pubkey, Vec<TokenHolding>>>,
    batch_sizes: Mutex<Vec<usize>>,
    pub(crate) account_reads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub(crate) fail_batch_fetch: AtomicBool,
}

impl MemoryRpc {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, key: Pubkey, program_owner: Pubkey, data: Vec<u8>) {
        let account = AccountInfo {
            lamports: 1_000_000,
            owner: program_owner,
            data,
            executable: false,
        };
        self.accounts.lock().unwrap().insert(key, account);
    }

    pub(crate) fn set_holdings(&self, owner: Pubkey, holdings: Vec<TokenHolding>) {
        self.holdings.lock().unwrap().insert(owner, holdings);
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    /// Most single-account reads ever pending at once
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RpcApi for MemoryRpc {
    async fn get_account_info(&self, key: &Pubkey) -> TldResult<Option<AccountInfo>> {
        self.account_reads.fetch_add(1, Ordering::Relaxed);
        let pending = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::Relaxed);

        tokio::task::yield_now().await;
        let account = self.accounts.lock().unwrap().get(key).cloned();

        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        Ok(account)
    }

    async fn get_multiple_accounts(&self, keys: &[Pubkey]) -> TldResult<Vec<Option<AccountInfo>>> {
        if self.fail_batch_fetch.load(Ordering::Relaxed) {
            return Err(TldError::RpcError("HTTP 503: unavailable".to_string()));
        }
        if keys.len() > 100 {
            return Err(TldError::InvalidInput(format!("{} keys", keys.len())));
        }

        self.batch_sizes.lock().unwrap().push(keys.len());
        let accounts = self.accounts.lock().unwrap();
        Ok(keys.iter().map(|k| accounts.get(k).cloned()).collect())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> TldResult<Vec<(Pubkey, AccountInfo)>> {
        let accounts = self.accounts.lock().unwrap();
        let mut matched: Vec<(Pubkey, AccountInfo)> = accounts
            .iter()
            .filter(|(_, a)| a.owner == *program_id)
            .filter(|(_, a)| filters.iter().all(|f| f.matches(&a.data)))
            .map(|(k, a)| (*k, a.clone()))
            .collect();
        matched.sort_by_key(|(k, _)| *k);
        Ok(matched)
    }

    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> TldResult<Vec<TokenHolding>> {
        Ok(self
            .holdings
            .lock()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }
}
