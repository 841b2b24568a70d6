use std::fs::{self, File};
use std::path::Path;

use tracing_subscriber::EnvFilter;
use wadkit::keys::KeySet;
use wadkit::{Result, Wad, WadType};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut keys = KeySet::new();
    if Path::new("keys.txt").exists() {
        keys.load_keys(File::open("keys.txt")?)?;
    }

    let data = fs::read("title.wad")?;
    let mut wad = Wad::parse_with_keys(&data, keys)?;

    println!("title id:  {:016X}", wad.tmd.title_id_u64());
    println!("version:   {}", wad.tmd.title_version);
    println!("region:    {:?}", wad.tmd.region());
    println!("key type:  {:?}", wad.ticket.key_type);
    println!("issuer:    {}", wad.ticket.issuer_str());
    for content in &wad.contents {
        println!(
            "  {:08X} index {:>3} {:?} {} bytes",
            content.record.content_id,
            content.record.index,
            content.record.content_type,
            content.record.size
        );
    }

    let out = wad.to_bytes(WadType::Installable)?;
    println!("re-serialized: {}", if out == data { "identical" } else { "changed" });

    Ok(())
}
