use crate::pubkey::Pubkey;

/// ANS name-record program (ALTNSZ46uaAUU7XUV6awvdorLGqAsPwa9shm7h4uP2FK)
pub const ANS_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    138, 181, 8, 179, 57, 37, 106, 199, 122, 254, 173, 63, 215, 254, 192, 46, 85, 25, 78, 81, 134,
    204, 212, 125, 153, 168, 67, 113, 189, 62, 164, 242,
]);

/// TLD house program (TLDHkysf5pCnKsVA4gXpNvmy7psXLPEu4LAdDJthT9S)
pub const TLD_HOUSE_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    6, 190, 210, 240, 21, 135, 242, 152, 17, 62, 93, 254, 168, 53, 86, 170, 211, 15, 146, 24, 166,
    44, 30, 27, 246, 212, 20, 92, 201, 48, 79, 161,
]);

/// Name house program, which wraps ANS names as NFTs (NH3uX6FtVE2fNREAioP7hm5RaozotZxeL6khU1EHx51)
pub const NAME_HOUSE_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    5, 115, 88, 74, 191, 228, 27, 34, 214, 153, 252, 171, 225, 235, 65, 79, 55, 132, 4, 12, 36,
    250, 219, 125, 100, 17, 181, 69, 200, 160, 125, 180,
]);

/// TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA
pub const SPL_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// SPL name service program (namesLPneVptA9Z5rqUDD9tMTWEJwofgaYwp8cawRkX)
pub const SNS_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    11, 173, 81, 244, 19, 193, 243, 169, 148, 96, 217, 0, 216, 191, 46, 214, 146, 126, 202, 52,
    215, 183, 132, 43, 248, 16, 169, 115, 8, 45, 30, 220,
]);

/// The `.sol` root name account (58PwtjSDuFHuUkYjH9BYnnQKHfwo9reZhC2zMJv9JPkx)
pub const SNS_ROOT_DOMAIN_ACCOUNT: Pubkey = Pubkey::new_from_array([
    61, 83, 194, 75, 56, 54, 14, 211, 129, 58, 35, 223, 178, 223, 216, 32, 171, 88, 33, 203, 121,
    41, 163, 141, 46, 170, 178, 82, 232, 56, 37, 149,
]);

/// Class of SNS reverse-lookup records (33m47vH6Eav6jr5Ry86XjhRft2jRBLDnDgPSHoquXi2Z)
pub const SNS_REVERSE_LOOKUP_CLASS: Pubkey = Pubkey::new_from_array([
    30, 108, 88, 228, 177, 181, 74, 40, 91, 207, 20, 62, 230, 167, 136, 53, 110, 250, 134, 226, 89,
    243, 216, 171, 22, 106, 244, 14, 246, 43, 73, 142,
]);

/// 85iDfUvr3HJyLM2zcq5BXSzQPgYrLVNqUapQ5qyCwGAQ
pub const SNS_FAVOURITE_DOMAIN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    105, 54, 188, 200, 249, 7, 188, 129, 68, 243, 130, 6, 16, 28, 236, 40, 201, 132, 145, 50, 14,
    171, 65, 111, 174, 47, 112, 230, 57, 173, 101, 93,
]);

pub const TLD_HOUSE_PREFIX: &str = "tld_house";
pub const NAME_HOUSE_PREFIX: &str = "name_house";
pub const NFT_RECORD_PREFIX: &str = "nft_record";
pub const COLLECTION_PREFIX: &str = "name_collection";
pub const MAIN_DOMAIN_PREFIX: &str = "main_domain";
pub const FAVOURITE_DOMAIN_PREFIX: &str = "favourite_domain";

pub const ANS_HASH_PREFIX: &str = "ALT Name Service";
pub const ANS_ORIGIN_TLD: &str = "ANS";
pub const SNS_HASH_PREFIX: &str = "SPL Name Service";

/// The only TLD served by SNS
pub const SNS_TLD: &str = "sol";

/// Maximum accounts per `getMultipleAccounts` call
pub const MAX_ACCOUNTS_PER_FETCH: usize = 100;

/// Maximum mints per token-metadata request
pub const MAX_MINTS_PER_METADATA_REQUEST: usize = 100;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Expired ANS names stay owned for this long before they can be re-registered
pub const ANS_GRACE_PERIOD_SECS: i64 = 45 * 24 * 60 * 60;
