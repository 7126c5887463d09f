//! # TLD Solve for Rust
//!
//! A Rust SDK for resolving Solana domain names across the AllDomains name
//! service (ANS: .abc, .bonk, .poor, ...) and the SPL name service (SNS: .sol).
//!
//! ## Quick Start
//!
//! ```no_run
//! use tld_solve_rs::{BatchResolveOptions, Cluster, Protocol, TldResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to Solana mainnet
//!     let resolver = TldResolver::new(Cluster::Mainnet);
//!
//!     // Resolve domain to owner
//!     let owner = resolver.get_owner_from_domain("miester.abc").await?;
//!     println!("Owner: {:?}", owner);
//!
//!     // Every .abc domain a wallet owns, sorted by name
//!     if let Some(user) = owner {
//!         let domains = resolver
//!             .batch_resolve_domains(user, BatchResolveOptions::default())
//!             .await?;
//!         println!("{:?}", domains);
//!
//!         let all = resolver.get_all_domains_from_user(user, Protocol::All).await?;
//!         println!("{} name accounts", all.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod ans;
pub mod client;
pub mod constants;
pub mod error;
pub mod metadata;
pub mod models;
pub mod pda;
pub mod pubkey;
pub mod resolver;
pub mod sns;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports
pub use ans::{AnsApi, AnsClient};
pub use client::{RpcApi, SolanaRpcClient};
pub use error::{TldError, TldResult};
pub use metadata::{HeliusClient, MetadataApi};
pub use models::{
    AnsTld, BatchResolveOptions, Cluster, Collectible, DomainRecord, MainDomain, NameRecord,
    Protocol, TokenMetadata,
};
pub use pubkey::{Pubkey, ToPubkey};
pub use resolver::TldResolver;
pub use sns::{SnsApi, SnsClient};
