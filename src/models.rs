use crate::constants::{ANS_GRACE_PERIOD_SECS, DEFAULT_CONCURRENCY_LIMIT};
use crate::error::{TldError, TldResult};
use crate::pubkey::{PUBKEY_BYTES, Pubkey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Solana cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Mainnet,
    Devnet,
    Testnet,
}

impl Cluster {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
        }
    }
}

/// Naming protocol selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// AllDomains name service, many TLDs
    Ans,
    /// SPL name service, `.sol` only
    Sns,
    /// Both protocols
    All,
}

/// TLDs supported by batch resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnsTld {
    #[default]
    Abc,
    Bonk,
    Poor,
}

impl AnsTld {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnsTld::Abc => "abc",
            AnsTld::Bonk => "bonk",
            AnsTld::Poor => "poor",
        }
    }

    /// TLD with its leading dot, as used for tld house derivation
    pub fn dotted(&self) -> String {
        format!(".{}", self.as_str())
    }
}

impl fmt::Display for AnsTld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnsTld {
    type Err = TldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "abc" => Ok(AnsTld::Abc),
            "bonk" => Ok(AnsTld::Bonk),
            "poor" => Ok(AnsTld::Poor),
            other => Err(TldError::InvalidInput(format!("unsupported tld: {}", other))),
        }
    }
}

/// Options for [`crate::TldResolver::batch_resolve_domains`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResolveOptions {
    /// Enables NFT correlation through the token-metadata API
    pub metadata_api_key: Option<String>,
    pub tld: AnsTld,
    /// Max in-flight remote operations within one call
    pub concurrency_limit: usize,
}

impl Default for BatchResolveOptions {
    fn default() -> Self {
        Self {
            metadata_api_key: None,
            tld: AnsTld::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

impl BatchResolveOptions {
    pub fn with_metadata_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.metadata_api_key = Some(api_key.into());
        self
    }

    pub fn with_tld(mut self, tld: AnsTld) -> Self {
        self.tld = tld;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }
}

/// NFT details attached to a wrapped domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    pub mint_account: Pubkey,
    pub metadata: TokenMetadata,
}

/// One resolved domain of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub parent_name_account: Pubkey,
    pub owner: Pubkey,
    /// Milliseconds since the epoch, 0 for names that never expire
    pub expires_at: i64,
    pub display_name: Option<String>,
    pub name_account: Pubkey,
    /// Present only for names wrapped as a verified collection NFT
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub collectible: Option<Collectible>,
}

impl DomainRecord {
    pub fn is_collectible(&self) -> bool {
        self.collectible.is_some()
    }

    pub fn collectible_mint_account(&self) -> Option<&Pubkey> {
        self.collectible.as_ref().map(|c| &c.mint_account)
    }

    pub fn collectible_metadata(&self) -> Option<&TokenMetadata> {
        self.collectible.as_ref().map(|c| &c.metadata)
    }
}

/// A user's primary domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainDomain {
    pub name_account: Pubkey,
    /// TLD with leading dot, e.g. ".abc"
    pub tld: String,
    /// Label without the TLD
    pub domain: String,
}

/// SNS favourite domain and its reverse-looked-up label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteDomain {
    pub domain: Pubkey,
    pub reverse: String,
}

/// Raw state of a forward-resolved domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRecord {
    Ans(NameRecordHeader),
    Sns(NameRegistryState),
}

impl NameRecord {
    pub fn owner(&self) -> Pubkey {
        match self {
            NameRecord::Ans(header) => header.owner,
            NameRecord::Sns(registry) => registry.owner,
        }
    }

    pub fn parent_name(&self) -> Pubkey {
        match self {
            NameRecord::Ans(header) => header.parent_name,
            NameRecord::Sns(registry) => registry.parent_name,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            NameRecord::Ans(header) => &header.data,
            NameRecord::Sns(registry) => &registry.data,
        }
    }
}

/// Cursor over borsh-style little-endian account data
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], what: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            what,
        }
    }

    fn take(&mut self, len: usize) -> TldResult<&'a [u8]> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| {
            TldError::DecodeError(format!(
                "{}: need {} bytes at offset {}, have {}",
                self.what,
                len,
                self.offset,
                self.data.len()
            ))
        })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> TldResult<()> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> TldResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> TldResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn u64(&mut self) -> TldResult<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub(crate) fn pubkey(&mut self) -> TldResult<Pubkey> {
        Pubkey::try_from_slice(self.take(PUBKEY_BYTES)?)
    }

    /// u32 length prefix followed by utf-8 bytes
    pub(crate) fn string(&mut self) -> TldResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TldError::DecodeError(format!("{}: {}", self.what, e)))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.offset.min(self.data.len())..];
        self.offset = self.data.len();
        rest
    }
}

/// ANS name account header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecordHeader {
    pub parent_name: Pubkey,
    pub owner: Pubkey,
    pub nclass: Pubkey,
    /// Seconds since the epoch, 0 for names that never expire
    pub expires_at: u64,
    pub created_at: u64,
    pub non_transferable: bool,
    pub data: Vec<u8>,
}

impl NameRecordHeader {
    pub const DISCRIMINATOR_LEN: usize = 8;
    pub const BYTE_SIZE: usize = 200;

    pub fn from_account_data(data: &[u8]) -> TldResult<Self> {
        if data.len() < Self::BYTE_SIZE {
            return Err(TldError::DecodeError(format!(
                "name record header: {} bytes, expected at least {}",
                data.len(),
                Self::BYTE_SIZE
            )));
        }

        let mut reader = ByteReader::new(data, "name record header");
        reader.skip(Self::DISCRIMINATOR_LEN)?;
        let parent_name = reader.pubkey()?;
        let owner = reader.pubkey()?;
        let nclass = reader.pubkey()?;
        let expires_at = reader.u64()?;
        let created_at = reader.u64()?;
        let non_transferable = reader.u8()? != 0;

        Ok(Self {
            parent_name,
            owner,
            nclass,
            expires_at,
            created_at,
            non_transferable,
            data: data[Self::BYTE_SIZE..].to_vec(),
        })
    }

    pub fn expires_at_ms(&self) -> i64 {
        i64::try_from(self.expires_at)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }

    /// False once a name is past its expiry plus the grace period
    pub fn is_valid_at(&self, now_secs: i64) -> bool {
        self.expires_at == 0
            || i64::try_from(self.expires_at)
                .unwrap_or(i64::MAX)
                .saturating_add(ANS_GRACE_PERIOD_SECS)
                > now_secs
    }

    /// Record payload with trailing zero padding removed
    pub fn data_string(&self) -> Option<String> {
        let end = self.data.iter().position(|b| *b == 0).unwrap_or(self.data.len());
        let text = String::from_utf8_lossy(&self.data[..end]).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::DISCRIMINATOR_LEN];
        out.extend_from_slice(self.parent_name.as_ref());
        out.extend_from_slice(self.owner.as_ref());
        out.extend_from_slice(self.nclass.as_ref());
        out.extend_from_slice(&self.expires_at.to_le_bytes());
        out.extend_from_slice(&self.created_at.to_le_bytes());
        out.push(self.non_transferable as u8);
        out.resize(Self::BYTE_SIZE, 0);
        out.extend_from_slice(&self.data);
        out
    }
}

/// SNS name registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRegistryState {
    pub parent_name: Pubkey,
    pub owner: Pubkey,
    pub class: Pubkey,
    pub data: Vec<u8>,
}

impl NameRegistryState {
    pub const HEADER_LEN: usize = 96;

    pub fn from_account_data(data: &[u8]) -> TldResult<Self> {
        let mut reader = ByteReader::new(data, "name registry");
        Ok(Self {
            parent_name: reader.pubkey()?,
            owner: reader.pubkey()?,
            class: reader.pubkey()?,
            data: reader.rest().to_vec(),
        })
    }

    /// Reverse records store the domain as a length-prefixed string
    pub fn reverse_name(&self) -> TldResult<String> {
        ByteReader::new(&self.data, "reverse record").string()
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.data.len());
        out.extend_from_slice(self.parent_name.as_ref());
        out.extend_from_slice(self.owner.as_ref());
        out.extend_from_slice(self.class.as_ref());
        out.extend_from_slice(&self.data);
        out
    }
}

/// Name-house record for a name wrapped as an NFT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftRecord {
    pub tag: u8,
    pub bump: u8,
    pub name_account: Pubkey,
    pub owner: Pubkey,
    pub nft_mint_account: Pubkey,
    pub tld_house: Pubkey,
}

impl NftRecord {
    pub fn from_account_data(data: &[u8]) -> TldResult<Self> {
        let mut reader = ByteReader::new(data, "nft record");
        reader.skip(8)?;
        Ok(Self {
            tag: reader.u8()?,
            bump: reader.u8()?,
            name_account: reader.pubkey()?,
            owner: reader.pubkey()?,
            nft_mint_account: reader.pubkey()?,
            tld_house: reader.pubkey()?,
        })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; 8];
        out.push(self.tag);
        out.push(self.bump);
        out.extend_from_slice(self.name_account.as_ref());
        out.extend_from_slice(self.owner.as_ref());
        out.extend_from_slice(self.nft_mint_account.as_ref());
        out.extend_from_slice(self.tld_house.as_ref());
        out
    }
}

/// TLD house account; only the fields needed to recover the TLD string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TldHouse {
    pub authority: Pubkey,
    pub treasury_manager: Pubkey,
    pub registrar: Pubkey,
    pub tld: String,
}

impl TldHouse {
    pub fn from_account_data(data: &[u8]) -> TldResult<Self> {
        let mut reader = ByteReader::new(data, "tld house");
        reader.skip(8)?;
        Ok(Self {
            authority: reader.pubkey()?,
            treasury_manager: reader.pubkey()?,
            registrar: reader.pubkey()?,
            tld: reader.string()?.trim_end_matches('\0').to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; 8];
        out.extend_from_slice(self.authority.as_ref());
        out.extend_from_slice(self.treasury_manager.as_ref());
        out.extend_from_slice(self.registrar.as_ref());
        out.extend_from_slice(&(self.tld.len() as u32).to_le_bytes());
        out.extend_from_slice(self.tld.as_bytes());
        out
    }
}

impl MainDomain {
    pub fn from_account_data(data: &[u8]) -> TldResult<Self> {
        let mut reader = ByteReader::new(data, "main domain");
        reader.skip(8)?;
        Ok(Self {
            name_account: reader.pubkey()?,
            tld: reader.string()?,
            domain: reader.string()?,
        })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; 8];
        out.extend_from_slice(self.name_account.as_ref());
        for s in [&self.tld, &self.domain] {
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        out
    }
}

/// Raw account as returned by the RPC node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
    pub executable: bool,
}

/// `memcmp` filter for `getProgramAccounts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Pubkey,
}

impl MemcmpFilter {
    pub fn new(offset: usize, bytes: Pubkey) -> Self {
        Self { offset, bytes }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.get(self.offset..self.offset + PUBKEY_BYTES) == Some(self.bytes.as_ref())
    }
}

/// SPL token account balance in parsed form
#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    pub mint: Pubkey,
    pub ui_amount: f64,
    pub decimals: u8,
}

impl TokenHolding {
    /// NFTs have zero decimals and a whole unit held
    pub fn is_nft(&self) -> bool {
        self.decimals == 0 && self.ui_amount >= 1.0
    }
}

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcContextValue<T> {
    pub value: T,
}

/// Account in `base64` encoding
#[derive(Debug, Clone, Deserialize)]
pub struct UiAccount {
    pub lamports: u64,
    pub owner: String,
    pub data: (String, String),
    #[serde(default)]
    pub executable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcKeyedAccount {
    pub pubkey: String,
    pub account: UiAccount,
}

/// Account in `jsonParsed` encoding, as returned for token accounts
#[derive(Debug, Clone, Deserialize)]
pub struct RpcParsedTokenAccount {
    pub pubkey: String,
    pub account: ParsedAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccount {
    pub data: ParsedAccountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTokenData {
    pub info: ParsedTokenInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTokenInfo {
    pub mint: String,
    pub token_amount: ParsedTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTokenAmount {
    pub ui_amount: Option<f64>,
    pub decimals: u8,
}

/// Token metadata as returned by the metadata API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(alias = "account")]
    pub mint: String,

    #[serde(default)]
    pub on_chain_data: Option<OnChainData>,

    #[serde(default)]
    pub off_chain_data: Option<OffChainData>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainData {
    #[serde(default)]
    pub data: Option<OnChainNameData>,

    #[serde(default)]
    pub collection: Option<CollectionRef>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainNameData {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub key: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffChainData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenMetadata {
    /// Verified member of `collection`
    pub fn is_verified_member_of(&self, collection: &Pubkey) -> bool {
        self.on_chain_data
            .as_ref()
            .and_then(|d| d.collection.as_ref())
            .is_some_and(|c| c.verified && c.key == collection.to_string())
    }

    /// Domain label: off-chain name first, then the null-padded on-chain name
    pub fn domain_label(&self) -> Option<String> {
        let off_chain = self
            .off_chain_data
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let on_chain = self
            .on_chain_data
            .as_ref()
            .and_then(|d| d.data.as_ref())
            .map(|d| d.name.trim_end_matches('\0').trim())
            .filter(|n| !n.is_empty());

        off_chain.or(on_chain).map(str::to_string)
    }
}
