use anyhow::Result;
use clap::Parser;
use ens_nft::{Config, NameResolver, ProviderGateway, SearchStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lookup", about = "Resolve ENS names to the NFT they point at")]
struct Args {
    /// Names to resolve
    #[arg(default_value = "devcon5.oisin.eth")]
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let resolver = NameResolver::new(ProviderGateway::from_config(&config));

    for name in args.names {
        println!("\nresolving name: {name}");
        let Some(resolution) = resolver.submit(&name).await else {
            continue;
        };
        let SearchStatus::Resolved(outcome) = &resolution.status else {
            continue;
        };
        println!("{outcome}");

        let descriptor = &resolution.descriptor;
        if let Some(contract) = descriptor.contract_address {
            println!("contract:   {contract}");
        }
        if let Some(token_id) = &descriptor.token_id {
            println!("token id:   {token_id}");
        }
        if let Some(owner) = &resolution.name_owner_display {
            println!("name owner: {owner}");
        }
        if let Some(owner) = &resolution.nft_owner_display {
            println!("nft owner:  {owner}");
        }
    }

    Ok(())
}
