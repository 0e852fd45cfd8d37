//! Spawn a tool server and print its validated registry.
//!
//! Run with: cargo run --example list_tools -- python3 weather.py

use mcp::{Channel, ChannelConfig};
use runtime::registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("usage: list_tools <command> [args...]");
        std::process::exit(1);
    };

    let channel = Channel::spawn(ChannelConfig::new(command).args(args))?;
    channel.initialize().await?;

    let descriptors = registry::discover(&channel).await?;
    println!("Discovered {} tools:", descriptors.len());
    for descriptor in &descriptors {
        println!("  - {}: {}", descriptor.name, descriptor.description);
        println!("    {}", descriptor.schema.to_value());
    }

    channel.shutdown().await?;
    Ok(())
}
