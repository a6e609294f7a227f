//! Load handler lists and subnets, then classify addresses.
//!
//! ```sh
//! cargo run --example classify -- --list hosts.list --subnet office=192.168.170.0/23 192.168.171.28
//! ```

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;
use octet_tree::{loader, AddressIndex, Config, Constant, DuplicatePolicy};
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Handler lists to load, each entry bound with outcome 1.
    #[arg(short, long)]
    list: Vec<PathBuf>,

    /// Subnets to register, as `name=a.b.c.d/len`.
    #[arg(short, long)]
    subnet: Vec<String>,

    /// Skip duplicate registrations instead of failing them.
    #[arg(long)]
    ignore_duplicates: bool,

    /// Print the whole index as JSON.
    #[arg(long)]
    dump: bool,

    /// Addresses to classify.
    addresses: Vec<Ipv4Addr>,
}

fn main() -> Result<(), octet_tree::Error> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let cli = Cli::parse();

    let mut index = AddressIndex::with_config(Config {
        duplicate_handlers: if cli.ignore_duplicates {
            DuplicatePolicy::Ignore
        } else {
            DuplicatePolicy::Reject
        },
        ..Default::default()
    });

    for path in &cli.list {
        let summary = loader::load_file(&mut index, path, Constant(1))?;
        info!(?path, "Loaded list");
        println!("loaded: {}", serde_json::to_string(&summary)?);
    }

    for entry in &cli.subnet {
        let (name, cidr) = entry.split_once('=').unwrap_or(("subnet", entry.as_str()));
        let registration = index.add_subnet(cidr, name, Constant(1))?;
        println!("subnet: {cidr} {}", serde_json::to_string(&registration)?);
    }

    if cli.dump {
        println!("json: {}", index.to_json()?);
    }

    for address in cli.addresses {
        match index.classify(address) {
            Some(verdict) => println!(
                "match: ip: {} 0x{:08X} {}",
                address,
                u32::from(address),
                serde_json::to_string(&verdict)?
            ),
            None => println!(
                "match: ip: {} 0x{:08X} result: 0",
                address,
                u32::from(address)
            ),
        }
    }

    Ok(())
}
