use std::path::PathBuf;

use blobstage_types::{Algorithm, Digest};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobstage",
    about = "Local content staging area with verified writes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Store options; flags override values from `--config`.
#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// TOML file with store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Refuse to write over existing files
    #[arg(long, global = true)]
    pub disable_overwrite: bool,

    /// Allow write targets outside the root
    #[arg(long, global = true)]
    pub allow_path_traversal: bool,

    /// Digest algorithm (sha256, sha512, blake3)
    #[arg(long, global = true, value_parser = parse_algorithm)]
    pub algorithm: Option<Algorithm>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register existing files and print their descriptors
    Add(AddArgs),
    /// Copy content into the store through a verified write
    Put(PutArgs),
    /// Check that a stored file matches an expected digest
    Verify(VerifyArgs),
    /// Print the effective store configuration
    Config,
}

#[derive(Args)]
pub struct AddArgs {
    /// Logical names, optionally `name=path` to map a name to a file
    #[arg(required = true)]
    pub names: Vec<String>,
    /// Media type for the registered files
    #[arg(long, default_value = "")]
    pub media_type: String,
}

#[derive(Args)]
pub struct PutArgs {
    /// Logical name of the new blob
    pub name: String,
    /// Source file; stdin when omitted
    #[arg(long)]
    pub from: Option<PathBuf>,
    #[arg(long, default_value = "")]
    pub media_type: String,
    /// Fail the commit unless the content has exactly this many bytes
    #[arg(long, default_value_t = 0)]
    pub expected_size: u64,
    /// Fail the commit unless the content hashes to this digest
    #[arg(long, value_parser = parse_digest)]
    pub expected_digest: Option<Digest>,
    /// Continue an earlier interrupted write instead of starting over
    #[arg(long)]
    pub resume: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub name: String,
    #[arg(long, value_parser = parse_digest)]
    pub digest: Digest,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse().map_err(|e: blobstage_types::TypeError| e.to_string())
}

fn parse_digest(s: &str) -> Result<Digest, String> {
    s.parse().map_err(|e: blobstage_types::TypeError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_put_with_expectations() {
        let cli = Cli::try_parse_from([
            "blobstage",
            "--root",
            "/srv",
            "put",
            "out.bin",
            "--expected-size",
            "5",
            "--expected-digest",
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        ])
        .unwrap();
        assert_eq!(cli.store.root, Some(PathBuf::from("/srv")));
        match cli.command {
            Command::Put(args) => {
                assert_eq!(args.name, "out.bin");
                assert_eq!(args.expected_size, 5);
                assert!(args.expected_digest.is_some());
                assert!(!args.resume);
            }
            _ => panic!("expected put"),
        }
    }

    #[test]
    fn rejects_malformed_digest() {
        let result = Cli::try_parse_from(["blobstage", "verify", "x", "--digest", "sha256:zz"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_algorithm_flag() {
        let cli = Cli::try_parse_from(["blobstage", "config", "--algorithm", "blake3"]).unwrap();
        assert_eq!(cli.store.algorithm, Some(Algorithm::Blake3));
    }
}
