//! Runs a planning session against a local node, e.g.
//!
//! ```sh
//! ENS_NFT_RPC_URL=http://localhost:8545 \
//! ENS_NFT_RESOLVERS='{"31337": "0x..."}' \
//! PRIVATE_KEY=0x... \
//! cargo run --example bind -- name.eth 0xNftContract 42
//! ```

use alloy::{
    primitives::Address, providers::{Provider, ProviderBuilder}, signers::local::PrivateKeySigner,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use ens_nft::{
    validate_target, BindingPlanner, Config, NameBindingTarget, ProviderGateway, StepState,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bind", about = "Point an ENS name at an NFT")]
struct Args {
    /// ENS name to bind, e.g. devcon5.oisin.eth
    name: String,

    /// Contract address of the NFT
    contract: Address,

    /// Token id within the contract
    token_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")
        .context("PRIVATE_KEY is not set")?
        .parse()?;
    let provider = ProviderBuilder::new()
        .wallet(signer)
        .connect_http(config.rpc_url.clone())
        .erased();
    let gateway = ProviderGateway::builder()
        .with_provider(provider)
        .with_registry_address(config.registry_address)
        .build()
        .map_err(anyhow::Error::msg)?;

    let target = NameBindingTarget::new(args.name, args.contract, args.token_id);
    let issues = validate_target(&gateway, &target).await;
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("target is not valid");
    }

    let planner = BindingPlanner::new(gateway).with_resolver_table(config.nft_resolvers);
    let plan = planner.open(target).await?;
    println!("{plan}\n");

    for (step, _) in plan.steps().filter(|(step, _)| plan.is_required(*step)) {
        let state = planner.run(step).await?;
        println!("{step}: {state:?}");
        if state == StepState::Failed {
            bail!("{step} failed, run again to retry");
        }
    }

    if let Some(plan) = planner.plan().await {
        println!("\n{plan}");
    }
    planner.close().await;
    Ok(())
}
