//! Program-derived addresses used by ANS, SNS and the name house.
//!
//! Every function here is pure: the same inputs always yield the same
//! account and bump seed. A [`TldError::DerivationError`] means no bump in
//! 255..=1 produced an off-curve address, which does not happen with the
//! fixed prefixes below.

use crate::constants::*;
use crate::error::{TldError, TldResult};
use crate::pubkey::Pubkey;
use sha2::{Digest, Sha256};

/// Registration account of a TLD; `tld` includes the leading dot (".abc")
pub fn find_tld_house(tld: &str) -> TldResult<(Pubkey, u8)> {
    let tld = tld.to_lowercase();
    Pubkey::find_program_address(
        &[TLD_HOUSE_PREFIX.as_bytes(), tld.as_bytes()],
        &TLD_HOUSE_PROGRAM_ID,
    )
}

pub fn find_name_house(tld_house: &Pubkey) -> TldResult<(Pubkey, u8)> {
    Pubkey::find_program_address(
        &[NAME_HOUSE_PREFIX.as_bytes(), tld_house.as_ref()],
        &NAME_HOUSE_PROGRAM_ID,
    )
}

/// NFT record binding a wrapped name account to its mint
pub fn find_nft_record(name_account: &Pubkey, name_house: &Pubkey) -> TldResult<(Pubkey, u8)> {
    Pubkey::find_program_address(
        &[
            NFT_RECORD_PREFIX.as_bytes(),
            name_house.as_ref(),
            name_account.as_ref(),
        ],
        &NAME_HOUSE_PROGRAM_ID,
    )
}

/// Verified collection that every domain NFT of a TLD belongs to
pub fn find_collection_mint(tld_house: &Pubkey) -> TldResult<(Pubkey, u8)> {
    Pubkey::find_program_address(
        &[COLLECTION_PREFIX.as_bytes(), tld_house.as_ref()],
        &NAME_HOUSE_PROGRAM_ID,
    )
}

pub fn find_main_domain(owner: &Pubkey) -> TldResult<(Pubkey, u8)> {
    Pubkey::find_program_address(
        &[MAIN_DOMAIN_PREFIX.as_bytes(), owner.as_ref()],
        &TLD_HOUSE_PROGRAM_ID,
    )
}

pub fn find_favourite_domain(owner: &Pubkey) -> TldResult<(Pubkey, u8)> {
    Pubkey::find_program_address(
        &[FAVOURITE_DOMAIN_PREFIX.as_bytes(), owner.as_ref()],
        &SNS_FAVOURITE_DOMAIN_PROGRAM_ID,
    )
}

fn hash_with_prefix(prefix: &str, name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

fn name_account_key(
    program_id: &Pubkey,
    hashed_name: &[u8; 32],
    name_class: Option<&Pubkey>,
    name_parent: Option<&Pubkey>,
) -> TldResult<(Pubkey, u8)> {
    let zero = Pubkey::default();
    let class = name_class.unwrap_or(&zero);
    let parent = name_parent.unwrap_or(&zero);
    Pubkey::find_program_address(&[&hashed_name[..], class.as_ref(), parent.as_ref()], program_id)
}

pub fn ans_hashed_name(name: &str) -> [u8; 32] {
    hash_with_prefix(ANS_HASH_PREFIX, name)
}

pub fn ans_name_account_key(
    hashed_name: &[u8; 32],
    name_class: Option<&Pubkey>,
    name_parent: Option<&Pubkey>,
) -> TldResult<(Pubkey, u8)> {
    name_account_key(&ANS_PROGRAM_ID, hashed_name, name_class, name_parent)
}

/// Root under which every ANS TLD name account is created
pub fn ans_origin_name_account() -> TldResult<Pubkey> {
    let (key, _) = ans_name_account_key(&ans_hashed_name(ANS_ORIGIN_TLD), None, None)?;
    Ok(key)
}

/// Name account of a TLD such as ".abc"
pub fn ans_tld_name_account(tld: &str) -> TldResult<Pubkey> {
    let tld = if tld.starts_with('.') {
        tld.to_lowercase()
    } else {
        format!(".{}", tld.to_lowercase())
    };
    let origin = ans_origin_name_account()?;
    let (key, _) = ans_name_account_key(&ans_hashed_name(&tld), None, Some(&origin))?;
    Ok(key)
}

/// Name account of `label.tld`
pub fn ans_domain_key(domain: &str) -> TldResult<Pubkey> {
    let domain = domain.trim().trim_end_matches('.');
    let (label, tld) = domain
        .split_once('.')
        .ok_or_else(|| TldError::InvalidDomain(format!("missing tld: {}", domain)))?;

    if label.is_empty() || tld.is_empty() || tld.contains('.') {
        return Err(TldError::InvalidDomain(format!(
            "expected label.tld: {}",
            domain
        )));
    }

    let parent = ans_tld_name_account(tld)?;
    let (key, _) = ans_name_account_key(&ans_hashed_name(label), None, Some(&parent))?;
    Ok(key)
}

pub fn sns_hashed_name(name: &str) -> [u8; 32] {
    hash_with_prefix(SNS_HASH_PREFIX, name)
}

pub fn sns_name_account_key(
    hashed_name: &[u8; 32],
    name_class: Option<&Pubkey>,
    name_parent: Option<&Pubkey>,
) -> TldResult<(Pubkey, u8)> {
    name_account_key(&SNS_PROGRAM_ID, hashed_name, name_class, name_parent)
}

/// Name account of `label.sol` or `sub.label.sol`; the `.sol` suffix is optional
pub fn sns_domain_key(domain: &str) -> TldResult<Pubkey> {
    let domain = domain.trim().trim_end_matches('.');
    let domain = domain.strip_suffix(".sol").unwrap_or(domain);
    let parts: Vec<&str> = domain.split('.').collect();

    let derive = |name: &str, parent: &Pubkey| -> TldResult<Pubkey> {
        let (key, _) = sns_name_account_key(&sns_hashed_name(name), None, Some(parent))?;
        Ok(key)
    };

    match parts.as_slice() {
        [label] if !label.is_empty() => derive(label, &SNS_ROOT_DOMAIN_ACCOUNT),
        [sub, label] if !sub.is_empty() && !label.is_empty() => {
            let parent = derive(label, &SNS_ROOT_DOMAIN_ACCOUNT)?;
            derive(&format!("\0{}", sub), &parent)
        }
        _ => Err(TldError::InvalidDomain(format!("unsupported sol domain: {}", domain))),
    }
}

/// Reverse-lookup record of an SNS name account
pub fn sns_reverse_key(name_account: &Pubkey) -> TldResult<Pubkey> {
    let hashed = sns_hashed_name(&name_account.to_string());
    let (key, _) = sns_name_account_key(&hashed, Some(&SNS_REVERSE_LOOKUP_CLASS), None)?;
    Ok(key)
}

/// Reverse-lookup record of an ANS name account, classed by its TLD house
pub fn ans_reverse_key(name_account: &Pubkey, tld_house: &Pubkey) -> TldResult<Pubkey> {
    let hashed = ans_hashed_name(&name_account.to_string());
    let (key, _) = ans_name_account_key(&hashed, Some(tld_house), None)?;
    Ok(key)
}
