use std::{env, fs::File};

use anyhow::{bail, Context, Result};
use sdbk::{ErrorClass, Extractor, KeySet};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("Usage: {} <data.bin>", args[0]);
    }

    let keys = match env::var_os("SDBK_KEYS") {
        Some(dir) => KeySet::load_from_dir(dir)?,
        None => KeySet::default(),
    };

    let in_file = File::options()
        .read(true)
        .write(false)
        .open(&args[1])
        .with_context(|| format!("open {}", args[1]))?;

    let report = Extractor::new(in_file, keys, ".").run().map_err(|e| {
        let class = match e.class() {
            ErrorClass::Integrity => "integrity error",
            ErrorClass::Io => "I/O error",
            ErrorClass::UnsupportedEntry => "unsupported entry",
        };
        anyhow::Error::new(e).context(class)
    })?;

    println!("ok: {}", u8::from(report.signature_ok));

    Ok(())
}
