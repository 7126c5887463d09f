use crate::ans::{AnsApi, AnsClient};
use crate::client::{RpcApi, SolanaRpcClient};
use crate::constants::{MAX_ACCOUNTS_PER_FETCH, SNS_TLD};
use crate::error::{TldError, TldResult};
use crate::metadata::{self, HeliusClient, MetadataApi};
use crate::models::{
    AccountInfo, AnsTld, BatchResolveOptions, Cluster, Collectible, DomainRecord, MainDomain,
    NameRecord, NameRecordHeader, NftRecord, Protocol, TokenMetadata,
};
use crate::pda;
use crate::pubkey::{Pubkey, ToPubkey};
use crate::sns::{SnsApi, SnsClient};
use crate::utils::{chunk_slice, natural_cmp};
use futures::future::try_join_all;
use moka::future::Cache;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Parent name account -> TLD, shared by the records of one batch call
type TldCache = Cache<Pubkey, Option<String>>;

/// Resolver for ANS and SNS domains - main entry point
#[derive(Clone)]
pub struct TldResolver {
    rpc: Arc<dyn RpcApi>,
    ans: Arc<dyn AnsApi>,
    sns: Arc<dyn SnsApi>,
    metadata: Arc<dyn MetadataApi>,
}

impl TldResolver {
    /// Create a new resolver for the given cluster
    pub fn new(cluster: Cluster) -> Self {
        Self::from_rpc(Arc::new(SolanaRpcClient::new(cluster)))
    }

    /// Create with custom RPC URL
    pub fn with_url(cluster: Cluster, rpc_url: String) -> Self {
        Self::from_rpc(Arc::new(SolanaRpcClient::with_url(cluster, rpc_url)))
    }

    /// ANS and SNS readers on top of `rpc`, Helius for NFT metadata
    pub fn from_rpc(rpc: Arc<dyn RpcApi>) -> Self {
        Self::from_parts(
            rpc.clone(),
            Arc::new(AnsClient::new(rpc.clone())),
            Arc::new(SnsClient::new(rpc)),
            Arc::new(HeliusClient::new()),
        )
    }

    pub fn from_parts(
        rpc: Arc<dyn RpcApi>,
        ans: Arc<dyn AnsApi>,
        sns: Arc<dyn SnsApi>,
        metadata: Arc<dyn MetadataApi>,
    ) -> Self {
        Self {
            rpc,
            ans,
            sns,
            metadata,
        }
    }

    /// Swap the NFT metadata source
    pub fn with_metadata_api(mut self, metadata: Arc<dyn MetadataApi>) -> Self {
        self.metadata = metadata;
        self
    }

    /// SNS serves `.sol`; every other TLD belongs to ANS
    fn protocol_for_domain(domain: &str) -> Protocol {
        let tld = domain.trim().trim_end_matches('.').rsplit('.').next().unwrap_or_default();
        if tld.eq_ignore_ascii_case(SNS_TLD) {
            Protocol::Sns
        } else {
            Protocol::Ans
        }
    }

    /// Main domain (ANS) or favourite domain (SNS) of `user_account`
    ///
    /// `Protocol::All` behaves like `Protocol::Ans`.
    pub async fn get_main_domain(
        &self,
        user_account: impl ToPubkey,
        protocol: Protocol,
    ) -> TldResult<Option<MainDomain>> {
        let user = user_account.to_pubkey()?;

        match protocol {
            Protocol::Sns => Ok(self
                .sns
                .get_favorite_domain(&user)
                .await?
                .map(|favourite| MainDomain {
                    name_account: favourite.domain,
                    tld: format!(".{}", SNS_TLD),
                    domain: favourite.reverse,
                })),
            Protocol::Ans | Protocol::All => self.ans.get_main_domain(&user).await,
        }
    }

    /// Raw on-chain state of `label.tld`
    pub async fn resolve_domain(&self, domain: &str) -> TldResult<Option<NameRecord>> {
        match Self::protocol_for_domain(domain) {
            Protocol::Sns => {
                let key = self.sns.get_domain_key(domain).await?;
                Ok(self.sns.get_registry(&key).await?.map(NameRecord::Sns))
            }
            _ => {
                let key = self.ans.get_domain_key(domain).await?;
                Ok(self.ans.get_name_record(&key).await?.map(NameRecord::Ans))
            }
        }
    }

    pub async fn get_owner_from_domain(&self, domain: &str) -> TldResult<Option<Pubkey>> {
        Ok(self.resolve_domain(domain).await?.map(|record| record.owner()))
    }

    /// Name account of `label.tld`; `None` for anything with more than one dot
    pub async fn get_name_account_from_domain(&self, domain: &str) -> TldResult<Option<Pubkey>> {
        if domain.matches('.').count() > 1 {
            return Ok(None);
        }

        let key = match Self::protocol_for_domain(domain) {
            Protocol::Sns => self.sns.get_domain_key(domain).await?,
            _ => self.ans.get_domain_key(domain).await?,
        };
        Ok(Some(key))
    }

    /// Name accounts owned by `user_account`; `Protocol::All` lists ANS then SNS
    pub async fn get_all_domains_from_user(
        &self,
        user_account: impl ToPubkey,
        protocol: Protocol,
    ) -> TldResult<Vec<Pubkey>> {
        let user = user_account.to_pubkey()?;

        match protocol {
            Protocol::Ans => self.ans.find_owned_name_accounts(&user).await,
            Protocol::Sns => self.sns.get_all_domains(&user).await,
            Protocol::All => {
                let mut domains = self.ans.find_owned_name_accounts(&user).await?;
                domains.extend(self.sns.get_all_domains(&user).await?);
                Ok(domains)
            }
        }
    }

    /// Name accounts owned by `user_account` under `tld` ("abc", "sol", ...)
    pub async fn get_all_domains_from_user_from_tld(
        &self,
        user_account: impl ToPubkey,
        tld: &str,
    ) -> TldResult<Vec<Pubkey>> {
        let user = user_account.to_pubkey()?;
        let tld = tld.trim().trim_start_matches('.');

        if tld.eq_ignore_ascii_case(SNS_TLD) {
            return self.sns.get_all_domains(&user).await;
        }
        self.ans.get_all_user_domains_from_tld(&user, tld).await
    }

    /// Reverse lookup when the TLD house is already known; no parent means SNS
    pub async fn reverse_lookup_name_account_with_known_parent<P: ToPubkey>(
        &self,
        name_account: impl ToPubkey,
        parent_account_owner: Option<P>,
    ) -> TldResult<Option<String>> {
        let name_account = name_account.to_pubkey()?;

        match parent_account_owner {
            Some(parent) => {
                let parent = parent.to_pubkey()?;
                self.ans.reverse_lookup_name_account(&name_account, &parent).await
            }
            None => self.sns.reverse_lookup(&name_account).await,
        }
    }

    /// Display name of `name_account`
    ///
    /// `Protocol::All` asks SNS first and only walks the ANS parent chain
    /// when SNS has no answer.
    pub async fn reverse_lookup_name_account(
        &self,
        name_account: impl ToPubkey,
        protocol: Protocol,
    ) -> TldResult<Option<String>> {
        let name_account = name_account.to_pubkey()?;
        self.reverse_lookup(&name_account, protocol, None).await
    }

    async fn reverse_lookup(
        &self,
        name_account: &Pubkey,
        protocol: Protocol,
        tld_cache: Option<&TldCache>,
    ) -> TldResult<Option<String>> {
        match protocol {
            Protocol::Ans => self.reverse_lookup_ans(name_account, tld_cache).await,
            Protocol::Sns => self.sns.reverse_lookup(name_account).await,
            Protocol::All => {
                if let Some(name) = self.sns.reverse_lookup(name_account).await? {
                    return Ok(Some(name));
                }
                self.reverse_lookup_ans(name_account, tld_cache).await
            }
        }
    }

    async fn reverse_lookup_ans(
        &self,
        name_account: &Pubkey,
        tld_cache: Option<&TldCache>,
    ) -> TldResult<Option<String>> {
        let Some(record) = self.ans.get_name_record(name_account).await? else {
            return Ok(None);
        };

        let tld = match tld_cache {
            // concurrent misses on one parent share a single lookup
            Some(cache) => cache
                .try_get_with(
                    record.parent_name,
                    self.ans.get_tld_from_parent_account(&record.parent_name),
                )
                .await
                .map_err(|e| (*e).clone())?,
            None => self.ans.get_tld_from_parent_account(&record.parent_name).await?,
        };

        let Some(tld) = tld else {
            tracing::debug!("No tld found for parent {}", record.parent_name);
            return Ok(None);
        };

        let (tld_house, _) = pda::find_tld_house(&tld)?;
        self.ans.reverse_lookup_name_account(name_account, &tld_house).await
    }

    /// Resolve every `options.tld` domain owned by `user_account`
    ///
    /// Returns `None` when the user owns no name under the TLD. With a
    /// metadata API key, names wrapped as verified collection NFTs held by
    /// the user are included and carry their mint and token metadata.
    /// Output is sorted by display name, digit runs compared numerically.
    pub async fn batch_resolve_domains(
        &self,
        user_account: impl ToPubkey,
        options: BatchResolveOptions,
    ) -> TldResult<Option<Vec<DomainRecord>>> {
        let user = user_account.to_pubkey()?;
        if options.concurrency_limit == 0 || options.concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(TldError::InvalidInput(format!(
                "concurrency limit must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                options.concurrency_limit
            )));
        }

        let tld = options.tld;
        tracing::info!("Batch resolving .{} domains for {}", tld, user);

        let (tld_house, _) = pda::find_tld_house(&tld.dotted())?;
        let owned = self.get_all_domains_from_user_from_tld(user, tld.as_str()).await?;
        if owned.is_empty() {
            tracing::debug!("{} owns no .{} domains", user, tld);
            return Ok(None);
        }

        let limiter = Semaphore::new(options.concurrency_limit);
        let tld_cache: TldCache = Cache::builder().max_capacity(1024).build();

        let collectibles = match options.metadata_api_key.as_deref() {
            Some(api_key) => {
                self.correlate_collectibles(&user, tld, &tld_house, api_key, &limiter)
                    .await?
            }
            None => Vec::new(),
        };

        // wrapped names first, then directly owned ones; each name once
        let mut seen = HashSet::new();
        let candidates: Vec<Pubkey> = collectibles
            .iter()
            .map(|(name_account, _)| *name_account)
            .chain(owned)
            .filter(|key| seen.insert(*key))
            .collect();
        let collectibles: HashMap<Pubkey, Collectible> = collectibles.into_iter().collect();

        let mut records = Vec::with_capacity(candidates.len());
        for (index, chunk) in chunk_slice(&candidates, MAX_ACCOUNTS_PER_FETCH)
            .into_iter()
            .enumerate()
        {
            let accounts = self.rpc.get_multiple_accounts(chunk).await?;
            if accounts.len() != chunk.len() {
                return Err(TldError::RpcError(format!(
                    "requested {} accounts, received {}",
                    chunk.len(),
                    accounts.len()
                )));
            }
            tracing::debug!("Chunk {}: fetched {} accounts", index, accounts.len());

            let resolved = try_join_all(chunk.iter().zip(accounts).map(|(name_account, account)| {
                self.resolve_fetched(name_account, account, &collectibles, &limiter, &tld_cache)
            }))
            .await?;
            records.extend(resolved.into_iter().flatten());
        }

        records.sort_by(compare_records);

        tracing::info!("Resolved {} .{} domains for {}", records.len(), tld, user);
        Ok(Some(records))
    }

    /// Name account -> NFT details for verified domain NFTs held by `user`
    async fn correlate_collectibles(
        &self,
        user: &Pubkey,
        tld: AnsTld,
        tld_house: &Pubkey,
        api_key: &str,
        limiter: &Semaphore,
    ) -> TldResult<Vec<(Pubkey, Collectible)>> {
        let (name_house, _) = pda::find_name_house(tld_house)?;
        let (collection, _) = pda::find_collection_mint(tld_house)?;

        let nfts = metadata::get_parsed_nft_accounts_by_owner(
            self.rpc.as_ref(),
            self.metadata.as_ref(),
            user,
            api_key,
        )
        .await?;

        let verified: Vec<TokenMetadata> = nfts
            .into_iter()
            .filter(|nft| nft.is_verified_member_of(&collection))
            .collect();
        tracing::debug!("{} holds {} verified .{} NFTs", user, verified.len(), tld);

        let matched = try_join_all(
            verified
                .into_iter()
                .map(|token| self.nft_record_for(token, tld, &name_house, limiter)),
        )
        .await?;

        let mut seen_records = HashSet::new();
        Ok(matched
            .into_iter()
            .flatten()
            .filter(|(record_key, _, _)| seen_records.insert(*record_key))
            .map(|(_, record, metadata)| {
                (
                    record.name_account,
                    Collectible {
                        mint_account: record.nft_mint_account,
                        metadata,
                    },
                )
            })
            .collect())
    }

    /// Name-house record of a domain NFT, if it still backs this mint
    async fn nft_record_for(
        &self,
        token: TokenMetadata,
        tld: AnsTld,
        name_house: &Pubkey,
        limiter: &Semaphore,
    ) -> TldResult<Option<(Pubkey, NftRecord, TokenMetadata)>> {
        let _permit = limiter
            .acquire()
            .await
            .map_err(|e| TldError::InternalError(format!("Semaphore error: {}", e)))?;

        let Some(label) = token.domain_label() else {
            tracing::warn!("NFT {} has no name, skipping", token.mint);
            return Ok(None);
        };

        let name_account = match self.ans.get_domain_key(&format!("{}.{}", label, tld)).await {
            Ok(key) => key,
            Err(TldError::InvalidDomain(e)) => {
                tracing::warn!("NFT {} names an invalid domain: {}", token.mint, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let (record_key, _) = pda::find_nft_record(&name_account, name_house)?;
        let Some(account) = self.rpc.get_account_info(&record_key).await? else {
            tracing::warn!("No NFT record for {}.{} (mint {})", label, tld, token.mint);
            return Ok(None);
        };

        let record = match NftRecord::from_account_data(&account.data) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("NFT record {} failed to decode: {}", record_key, e);
                return Ok(None);
            }
        };

        if record.nft_mint_account.to_string() != token.mint {
            tracing::warn!(
                "NFT record {} backs mint {}, not {}",
                record_key,
                record.nft_mint_account,
                token.mint
            );
            return Ok(None);
        }

        Ok(Some((record_key, record, token)))
    }

    async fn resolve_fetched(
        &self,
        name_account: &Pubkey,
        account: Option<AccountInfo>,
        collectibles: &HashMap<Pubkey, Collectible>,
        limiter: &Semaphore,
        tld_cache: &TldCache,
    ) -> TldResult<Option<DomainRecord>> {
        let _permit = limiter
            .acquire()
            .await
            .map_err(|e| TldError::InternalError(format!("Semaphore error: {}", e)))?;

        let Some(account) = account.filter(|a| !a.data.is_empty()) else {
            tracing::debug!("Skipping {}: no account data", name_account);
            return Ok(None);
        };

        let header = match NameRecordHeader::from_account_data(&account.data) {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", name_account, e);
                return Ok(None);
            }
        };

        let display_name = self
            .reverse_lookup(name_account, Protocol::All, Some(tld_cache))
            .await?
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Some(DomainRecord {
            parent_name_account: header.parent_name,
            owner: header.owner,
            expires_at: header.expires_at_ms(),
            display_name,
            name_account: *name_account,
            collectible: collectibles.get(name_account).cloned(),
        }))
    }
}

/// By display name (numeric-aware, case-insensitive), unnamed last, then by account
fn compare_records(a: &DomainRecord, b: &DomainRecord) -> Ordering {
    let by_name = match (&a.display_name, &b.display_name) {
        (Some(x), Some(y)) => natural_cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_name.then_with(|| a.name_account.cmp(&b.name_account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ans::fixtures::AnsFixture;
    use crate::constants::{ANS_PROGRAM_ID, NAME_HOUSE_PROGRAM_ID, SNS_FAVOURITE_DOMAIN_PROGRAM_ID};
    use crate::metadata::fixtures::{MemoryMetadata, domain_nft};
    use crate::models::TokenHolding;
    use crate::pubkey::unique_pubkey;
    use crate::sns::fixtures::register_sol;
    use crate::testing::MemoryRpc;
    use std::sync::atomic::Ordering as AtomicOrdering;

    struct World {
        rpc: Arc<MemoryRpc>,
        metadata: Arc<MemoryMetadata>,
        abc: AnsFixture,
        resolver: TldResolver,
    }

    fn world() -> World {
        let rpc = Arc::new(MemoryRpc::new());
        let metadata = Arc::new(MemoryMetadata::default());
        let abc = AnsFixture::install(&rpc, "abc");
        let resolver = TldResolver::from_rpc(rpc.clone()).with_metadata_api(metadata.clone());
        World {
            rpc,
            metadata,
            abc,
            resolver,
        }
    }

    fn register_pages(world: &World, owner: Pubkey, count: usize) -> Vec<Pubkey> {
        (1..=count)
            .map(|i| world.abc.register(&world.rpc, &format!("page{}", i), "abc", owner, 1_900_000_000))
            .collect()
    }

    fn names(records: &[DomainRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.display_name.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_name_account_from_domain() {
        let w = world();

        let sol = w.resolver.get_name_account_from_domain("miester.sol").await.unwrap();
        assert_eq!(sol, Some(pda::sns_domain_key("miester").unwrap()));

        let abc = w.resolver.get_name_account_from_domain("miester.abc").await.unwrap();
        assert_eq!(abc, Some(pda::ans_domain_key("miester.abc").unwrap()));

        let reads = w.rpc.account_reads.load(AtomicOrdering::Relaxed);
        assert!(w.resolver.get_name_account_from_domain("a.b.abc").await.unwrap().is_none());
        assert_eq!(w.rpc.account_reads.load(AtomicOrdering::Relaxed), reads);
    }

    #[tokio::test]
    async fn test_resolve_and_owner_dispatch() {
        let w = world();
        let ans_owner = unique_pubkey();
        let sns_owner = unique_pubkey();
        w.abc.register(&w.rpc, "miester", "abc", ans_owner, 1_900_000_000);
        register_sol(&w.rpc, "miester", sns_owner);

        let record = w.resolver.resolve_domain("miester.abc").await.unwrap().unwrap();
        assert!(matches!(record, NameRecord::Ans(_)));
        assert_eq!(record.parent_name(), w.abc.tld_account);

        let record = w.resolver.resolve_domain("miester.sol").await.unwrap().unwrap();
        assert!(matches!(record, NameRecord::Sns(_)));

        assert_eq!(w.resolver.get_owner_from_domain("miester.abc").await.unwrap(), Some(ans_owner));
        assert_eq!(w.resolver.get_owner_from_domain("miester.sol").await.unwrap(), Some(sns_owner));
        assert!(w.resolver.get_owner_from_domain("nobody.abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_user_account() {
        let w = world();
        let result = w.resolver.get_all_domains_from_user("not-a-key!", Protocol::All).await;
        assert!(matches!(result, Err(TldError::InvalidAccountIdentifier(_))));

        let result = w
            .resolver
            .batch_resolve_domains("0OIl", BatchResolveOptions::default())
            .await;
        assert!(matches!(result, Err(TldError::InvalidAccountIdentifier(_))));
    }

    #[tokio::test]
    async fn test_all_domains_by_protocol() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 4);
        for label in ["one", "two", "three"] {
            register_sol(&w.rpc, label, owner);
        }

        let ans = w.resolver.get_all_domains_from_user(owner, Protocol::Ans).await.unwrap();
        let sns = w.resolver.get_all_domains_from_user(owner, Protocol::Sns).await.unwrap();
        let all = w.resolver.get_all_domains_from_user(owner.to_string(), Protocol::All).await.unwrap();

        assert_eq!(ans.len(), 4);
        assert_eq!(sns.len(), 3);
        assert_eq!(all.len(), ans.len() + sns.len());
        assert_eq!(&all[..4], &ans[..]);

        let sol = w.resolver.get_all_domains_from_user_from_tld(owner, "sol").await.unwrap();
        assert_eq!(sol, sns);
        let abc = w.resolver.get_all_domains_from_user_from_tld(owner, ".abc").await.unwrap();
        assert_eq!(abc, ans);
    }

    #[tokio::test]
    async fn test_main_domain_by_protocol() {
        let w = world();
        let owner = unique_pubkey();
        let name_account = register_sol(&w.rpc, "miester", owner);
        let (favourite_key, _) = pda::find_favourite_domain(&owner).unwrap();
        let mut data = vec![1u8];
        data.extend_from_slice(name_account.as_ref());
        w.rpc.insert(favourite_key, SNS_FAVOURITE_DOMAIN_PROGRAM_ID, data);

        let main = w.resolver.get_main_domain(owner, Protocol::Sns).await.unwrap().unwrap();
        assert_eq!(main.name_account, name_account);
        assert_eq!(main.tld, ".sol");
        assert_eq!(main.domain, "miester");

        assert!(w.resolver.get_main_domain(owner, Protocol::Ans).await.unwrap().is_none());
        assert!(w.resolver.get_main_domain(owner, Protocol::All).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reverse_lookup_by_protocol() {
        let w = world();
        let ans_name = w.abc.register(&w.rpc, "miester", "abc", unique_pubkey(), 0);
        let sns_name = register_sol(&w.rpc, "bonfida", unique_pubkey());

        let name = w.resolver.reverse_lookup_name_account(ans_name, Protocol::Ans).await.unwrap();
        assert_eq!(name.as_deref(), Some("miester"));
        let name = w.resolver.reverse_lookup_name_account(sns_name, Protocol::Sns).await.unwrap();
        assert_eq!(name.as_deref(), Some("bonfida"));
        assert!(w.resolver.reverse_lookup_name_account(ans_name, Protocol::Sns).await.unwrap().is_none());

        // SNS answers first, so no ANS reads follow
        let reads = w.rpc.account_reads.load(AtomicOrdering::Relaxed);
        let name = w.resolver.reverse_lookup_name_account(sns_name, Protocol::All).await.unwrap();
        assert_eq!(name.as_deref(), Some("bonfida"));
        assert_eq!(w.rpc.account_reads.load(AtomicOrdering::Relaxed), reads + 1);

        let name = w.resolver.reverse_lookup_name_account(ans_name, Protocol::All).await.unwrap();
        assert_eq!(name.as_deref(), Some("miester"));
    }

    #[tokio::test]
    async fn test_reverse_lookup_with_known_parent() {
        let w = world();
        let ans_name = w.abc.register(&w.rpc, "miester", "abc", unique_pubkey(), 0);
        let sns_name = register_sol(&w.rpc, "bonfida", unique_pubkey());

        let name = w
            .resolver
            .reverse_lookup_name_account_with_known_parent(ans_name, Some(w.abc.tld_house))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("miester"));

        let name = w
            .resolver
            .reverse_lookup_name_account_with_known_parent(sns_name, None::<Pubkey>)
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("bonfida"));
    }

    #[tokio::test]
    async fn test_forward_then_reverse_round_trip() {
        let w = world();
        w.abc.register(&w.rpc, "miester", "abc", unique_pubkey(), 0);

        let key = w.resolver.get_name_account_from_domain("miester.abc").await.unwrap().unwrap();
        let name = w.resolver.reverse_lookup_name_account(key, Protocol::All).await.unwrap().unwrap();
        assert!("miester.abc".contains(&name));
    }

    #[tokio::test]
    async fn test_batch_resolves_and_sorts_naturally() {
        let w = world();
        let owner = unique_pubkey();
        let accounts = register_pages(&w, owner, 17);
        let bonk = AnsFixture::install(&w.rpc, "bonk");
        bonk.register(&w.rpc, "dog", "bonk", owner, 0);

        let records = tokio_test::assert_ok!(
            w.resolver
                .batch_resolve_domains(owner, BatchResolveOptions::default())
                .await
        )
        .unwrap();

        assert_eq!(records.len(), 17);
        let expected: Vec<String> = (1..=17).map(|i| format!("page{}", i)).collect();
        assert_eq!(names(&records), expected);

        for record in &records {
            assert!(!record.is_collectible());
            assert!(record.collectible_metadata().is_none());
            assert_eq!(record.owner, owner);
            assert_eq!(record.parent_name_account, w.abc.tld_account);
            assert_eq!(record.expires_at, 1_900_000_000_000);
            assert!(accounts.contains(&record.name_account));
        }

        // no api key, no metadata requests
        assert!(w.metadata.page_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_idempotent() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 12);

        let first = w.resolver.batch_resolve_domains(owner, BatchResolveOptions::default()).await.unwrap();
        let second = w.resolver.batch_resolve_domains(owner, BatchResolveOptions::default()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_batch_without_domains_is_none() {
        let w = world();
        let owner = unique_pubkey();
        register_sol(&w.rpc, "elsewhere", owner);

        let result = w.resolver.batch_resolve_domains(owner, BatchResolveOptions::default()).await.unwrap();
        assert!(result.is_none());
        assert!(w.rpc.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_batch_fetches_in_chunks_of_one_hundred() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 201);

        let records = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default().with_concurrency_limit(3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 201);
        assert_eq!(w.rpc.batch_sizes(), vec![100, 100, 1]);
        assert_eq!(records[0].display_name.as_deref(), Some("page1"));
        assert_eq!(records[200].display_name.as_deref(), Some("page201"));
    }

    #[tokio::test]
    async fn test_batch_rejects_zero_concurrency() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 2);

        let result = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default().with_concurrency_limit(0))
            .await;
        assert!(matches!(result, Err(TldError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_batch_rejects_oversized_concurrency() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 2);

        for limit in [usize::MAX, Semaphore::MAX_PERMITS + 1] {
            let result = w
                .resolver
                .batch_resolve_domains(owner, BatchResolveOptions::default().with_concurrency_limit(limit))
                .await;
            assert!(matches!(result, Err(TldError::InvalidInput(_))));
        }

        let records = w
            .resolver
            .batch_resolve_domains(
                owner,
                BatchResolveOptions::default().with_concurrency_limit(Semaphore::MAX_PERMITS),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_fetch_failure_aborts() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 5);
        w.rpc.fail_batch_fetch.store(true, AtomicOrdering::Relaxed);

        let result = w.resolver.batch_resolve_domains(owner, BatchResolveOptions::default()).await;
        assert!(matches!(result, Err(TldError::RpcError(_))));
    }

    #[tokio::test]
    async fn test_batch_skips_undecodable_and_sorts_unnamed_last() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 3);

        // passes the memcmp filters but is too short to be a name record
        let mut short = vec![0u8; 100];
        short[8..40].copy_from_slice(w.abc.tld_account.as_ref());
        short[40..72].copy_from_slice(owner.as_ref());
        w.rpc.insert(unique_pubkey(), ANS_PROGRAM_ID, short);

        // a valid record without a reverse entry
        let unnamed = unique_pubkey();
        let header = NameRecordHeader {
            parent_name: w.abc.tld_account,
            owner,
            nclass: Pubkey::default(),
            expires_at: 0,
            created_at: 0,
            non_transferable: false,
            data: Vec::new(),
        };
        w.rpc.insert(unnamed, ANS_PROGRAM_ID, header.encode());

        let records = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(names(&records), vec!["page1", "page2", "page3"]);
        assert_eq!(records[3].name_account, unnamed);
        assert!(records[3].display_name.is_none());
        assert_eq!(records[3].expires_at, 0);
    }

    #[tokio::test]
    async fn test_batch_attaches_collectibles() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 2);

        let tld_house = w.abc.tld_house;
        let (name_house, _) = pda::find_name_house(&tld_house).unwrap();
        let (collection, _) = pda::find_collection_mint(&tld_house).unwrap();

        // wrapped name: held by the name house, backed by an NFT the user holds
        let wrapped = w.abc.register(&w.rpc, "vault7", "abc", name_house, 0);
        let mint = unique_pubkey();
        let (record_key, _) = pda::find_nft_record(&wrapped, &name_house).unwrap();
        let record = NftRecord {
            tag: 1,
            bump: 255,
            name_account: wrapped,
            owner,
            nft_mint_account: mint,
            tld_house,
        };
        w.rpc.insert(record_key, NAME_HOUSE_PROGRAM_ID, record.encode());

        let no_record = unique_pubkey();
        let unverified = unique_pubkey();
        let fungible = unique_pubkey();
        w.rpc.set_holdings(
            owner,
            vec![
                TokenHolding { mint, ui_amount: 1.0, decimals: 0 },
                TokenHolding { mint: no_record, ui_amount: 1.0, decimals: 0 },
                TokenHolding { mint: unverified, ui_amount: 1.0, decimals: 0 },
                TokenHolding { mint: fungible, ui_amount: 3.5, decimals: 6 },
            ],
        );
        w.metadata.insert(mint, domain_nft(&mint, "vault7", &collection, true));
        w.metadata.insert(no_record, domain_nft(&no_record, "ghost", &collection, true));
        w.metadata.insert(unverified, domain_nft(&unverified, "page1", &collection, false));

        let records = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default().with_metadata_api_key("key"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(names(&records), vec!["page1", "page2", "vault7"]);
        assert_eq!(*w.metadata.page_sizes.lock().unwrap(), vec![3]);

        let vault = &records[2];
        assert!(vault.is_collectible());
        assert_eq!(vault.name_account, wrapped);
        assert_eq!(vault.owner, name_house);
        assert_eq!(vault.collectible_mint_account(), Some(&mint));
        assert_eq!(
            vault.collectible_metadata().and_then(|m| m.domain_label()).as_deref(),
            Some("vault7")
        );

        for record in &records[..2] {
            assert!(!record.is_collectible());
            assert!(record.collectible_mint_account().is_none());
        }
    }

    #[tokio::test]
    async fn test_batch_ignores_record_for_other_mint() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 1);

        let tld_house = w.abc.tld_house;
        let (name_house, _) = pda::find_name_house(&tld_house).unwrap();
        let (collection, _) = pda::find_collection_mint(&tld_house).unwrap();

        let wrapped = w.abc.register(&w.rpc, "moved", "abc", name_house, 0);
        let (record_key, _) = pda::find_nft_record(&wrapped, &name_house).unwrap();
        let record = NftRecord {
            tag: 1,
            bump: 254,
            name_account: wrapped,
            owner: unique_pubkey(),
            nft_mint_account: unique_pubkey(),
            tld_house,
        };
        w.rpc.insert(record_key, NAME_HOUSE_PROGRAM_ID, record.encode());

        let stale = unique_pubkey();
        w.rpc.set_holdings(owner, vec![TokenHolding { mint: stale, ui_amount: 1.0, decimals: 0 }]);
        w.metadata.insert(stale, domain_nft(&stale, "moved", &collection, true));

        let records = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default().with_metadata_api_key("key"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(names(&records), vec!["page1"]);
        assert!(records.iter().all(|r| !r.is_collectible()));
    }

    #[tokio::test]
    async fn test_batch_bounds_in_flight_reads() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 10);

        let tld_house = w.abc.tld_house;
        let (name_house, _) = pda::find_name_house(&tld_house).unwrap();
        let (collection, _) = pda::find_collection_mint(&tld_house).unwrap();

        let mut holdings = Vec::new();
        for i in 0..6 {
            let label = format!("wrapped{}", i);
            let wrapped = w.abc.register(&w.rpc, &label, "abc", name_house, 0);
            let mint = unique_pubkey();
            let (record_key, _) = pda::find_nft_record(&wrapped, &name_house).unwrap();
            let record = NftRecord {
                tag: 1,
                bump: 255,
                name_account: wrapped,
                owner,
                nft_mint_account: mint,
                tld_house,
            };
            w.rpc.insert(record_key, NAME_HOUSE_PROGRAM_ID, record.encode());
            w.metadata.insert(mint, domain_nft(&mint, &label, &collection, true));
            holdings.push(TokenHolding { mint, ui_amount: 1.0, decimals: 0 });
        }
        w.rpc.set_holdings(owner, holdings);

        let records = w
            .resolver
            .batch_resolve_domains(
                owner,
                BatchResolveOptions::default()
                    .with_metadata_api_key("key")
                    .with_concurrency_limit(2),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 16);
        assert_eq!(records.iter().filter(|r| r.is_collectible()).count(), 6);
        assert_eq!(w.rpc.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_batch_looks_up_shared_parent_once() {
        let w = world();
        let owner = unique_pubkey();
        register_pages(&w, owner, 20);

        let reads = w.rpc.account_reads.load(AtomicOrdering::Relaxed);
        let records = w
            .resolver
            .batch_resolve_domains(owner, BatchResolveOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 20);

        // three reads per record, plus parent record and tld house once
        let reads = w.rpc.account_reads.load(AtomicOrdering::Relaxed) - reads;
        assert_eq!(reads, 3 * 20 + 2);
    }

    #[test]
    fn test_protocol_for_domain() {
        assert_eq!(TldResolver::protocol_for_domain("miester.sol"), Protocol::Sns);
        assert_eq!(TldResolver::protocol_for_domain("miester.SOL"), Protocol::Sns);
        assert_eq!(TldResolver::protocol_for_domain("miester.abc"), Protocol::Ans);
        assert_eq!(TldResolver::protocol_for_domain("sol.abc"), Protocol::Ans);
    }
}
