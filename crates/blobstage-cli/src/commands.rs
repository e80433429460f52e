use std::fs::File;
use std::io::{self, Read};

use anyhow::{bail, Context};
use blobstage_store::{ContentWriter, FileStore, StoreConfig, WriteMode, WriterOptions};
use blobstage_types::Descriptor;
use colored::Colorize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli.store)?;
    tracing::debug!(?config, "effective configuration");
    match cli.command {
        Command::Add(args) => cmd_add(config, args, &cli.format),
        Command::Put(args) => cmd_put(config, args, &cli.format),
        Command::Verify(args) => cmd_verify(config, args),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Config file first, then command-line overrides.
pub fn build_config(args: &StoreArgs) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if args.disable_overwrite {
        config.disable_overwrite = true;
    }
    if args.allow_path_traversal {
        config.allow_path_traversal_on_write = true;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    Ok(config)
}

fn cmd_add(config: StoreConfig, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = FileStore::with_config(config);
    let mut added = Vec::with_capacity(args.names.len());
    for spec in &args.names {
        let (name, path) = spec.split_once('=').unwrap_or((spec.as_str(), ""));
        let desc = store
            .add(name, &args.media_type, path)
            .with_context(|| format!("adding {name}"))?;
        added.push(desc);
    }
    print_descriptors(&added, format)
}

fn cmd_put(config: StoreConfig, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = FileStore::with_config(config);

    let mut target = Descriptor::named(&args.name).with_size(args.expected_size);
    if !args.media_type.is_empty() {
        target = target.with_media_type(&args.media_type);
    }
    let mode = if args.resume {
        WriteMode::Resume
    } else {
        WriteMode::Truncate
    };
    // The writer truncates the target, so the source must open first.
    let mut source: Box<dyn Read> = match &args.from {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let mut writer = store
        .open_writer(WriterOptions::new(target).with_mode(mode))
        .with_context(|| format!("opening writer for {}", args.name))?;
    let copied = io::copy(&mut source, &mut writer).context("copying content")?;
    tracing::debug!(copied, offset = writer.status().offset, "content streamed");

    writer
        .commit(args.expected_size, args.expected_digest.as_ref())
        .with_context(|| format!("committing {}", args.name))?;

    let desc = store
        .get(&writer.digest())
        .context("committed descriptor missing from registry")?;
    print_descriptors(&[desc], format)
}

fn cmd_verify(config: StoreConfig, args: VerifyArgs) -> anyhow::Result<()> {
    let config = StoreConfig {
        algorithm: args.digest.algorithm(),
        ..config
    };
    let store = FileStore::with_config(config);
    let desc = store
        .add(&args.name, "", "")
        .with_context(|| format!("hashing {}", args.name))?;
    match desc.digest {
        Some(actual) if actual == args.digest => {
            println!("{} {} {}", "✓".green().bold(), args.name, actual.to_string().dimmed());
            Ok(())
        }
        Some(actual) => bail!(
            "digest mismatch for {}: expected {}, got {}",
            args.name,
            args.digest,
            actual
        ),
        None => bail!("no digest computed for {}", args.name),
    }
}

fn print_descriptors(descriptors: &[Descriptor], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(descriptors)?);
        }
        OutputFormat::Text => {
            for desc in descriptors {
                let digest = desc
                    .digest
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!(
                    "{} {}  {}  {} bytes  {}",
                    "✓".green(),
                    desc.name().unwrap_or("-").bold(),
                    digest.yellow(),
                    desc.size,
                    desc.media_type.dimmed()
                );
            }
        }
    }
    Ok(())
}
