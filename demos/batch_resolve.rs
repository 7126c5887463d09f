use tld_solve_rs::{AnsTld, BatchResolveOptions, Cluster, TldResolver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let owner = args
        .next()
        .unwrap_or_else(|| "2EGGxj2qbNAJNgLCPKca8sxZYetyTjnoRspTPjzN2D67".to_string());
    let tld: AnsTld = args.next().as_deref().unwrap_or("abc").parse()?;

    let resolver = match std::env::var("SOLANA_RPC_URL") {
        Ok(url) => TldResolver::with_url(Cluster::Mainnet, url),
        Err(_) => TldResolver::new(Cluster::Mainnet),
    };

    // NFT-wrapped domains are only found with a metadata API key
    let mut options = BatchResolveOptions::default().with_tld(tld);
    if let Ok(api_key) = std::env::var("HELIUS_API_KEY") {
        options = options.with_metadata_api_key(api_key);
    }

    println!("Resolving .{} domains for {}", tld, owner);

    match resolver.batch_resolve_domains(owner.as_str(), options).await {
        Ok(Some(records)) => {
            println!("\n✓ Found {} domain(s):", records.len());
            for record in records {
                let name = record.display_name.as_deref().unwrap_or("<unknown>");
                match record.collectible_mint_account() {
                    Some(mint) => println!("  - {}.{} (NFT {})", name, tld, mint),
                    None => println!("  - {}.{}", name, tld),
                }
            }
        }
        Ok(None) => println!("No .{} domains found for this address", tld),
        Err(e) => {
            eprintln!("\n✗ Error: {}", e);
        }
    }

    Ok(())
}
