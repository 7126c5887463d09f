use tld_solve_rs::{Cluster, NameRecord, Protocol, TldResolver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Use a private RPC endpoint when one is configured
    println!("Creating TLD resolver for Solana Mainnet...");
    let resolver = match std::env::var("SOLANA_RPC_URL") {
        Ok(url) => TldResolver::with_url(Cluster::Mainnet, url),
        Err(_) => TldResolver::new(Cluster::Mainnet),
    };

    // Get domain from command line or use default
    let domain = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "miester.abc".to_string());
    println!("\nResolving domain: {}", domain);

    match resolver.resolve_domain(&domain).await {
        Ok(Some(record)) => {
            println!("\n✓ Domain found!");
            println!("  Owner: {}", record.owner());
            println!("  Parent: {}", record.parent_name());

            if let NameRecord::Ans(header) = &record {
                if header.expires_at > 0 {
                    println!("  Expires at: {}", header.expires_at);
                }
                println!("  Non-transferable: {}", header.non_transferable);
            }

            let main = resolver.get_main_domain(record.owner(), Protocol::Ans).await?;
            if let Some(main) = main {
                println!("\n  Owner's main domain: {}{}", main.domain, main.tld);
            }
        }
        Ok(None) => println!("\nDomain {} is not registered", domain),
        Err(e) => {
            eprintln!("\n✗ Error resolving domain: {}", e);
        }
    }

    if let Some(name_account) = resolver.get_name_account_from_domain(&domain).await? {
        println!("\nName account: {}", name_account);
        let name = resolver
            .reverse_lookup_name_account(name_account, Protocol::All)
            .await?;
        println!("Reverse lookup: {:?}", name);
    }

    Ok(())
}
