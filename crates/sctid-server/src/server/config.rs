use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use sctid::DEFAULT_MAX_GENERATION_ATTEMPTS;

/// Runtime configuration for the `sctid-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. A `.env`
/// file in the working directory is loaded first, so either source works.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sctid-server",
    version,
    about = "An HTTP service for SNOMED CT identifier allocation"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// How many candidates a single identifier allocation examines before
    /// reporting failure.
    ///
    /// Environment variable: `MAX_GENERATION_ATTEMPTS`
    #[arg(long, env = "MAX_GENERATION_ATTEMPTS", default_value_t = DEFAULT_MAX_GENERATION_ATTEMPTS)]
    pub max_generation_attempts: usize,

    /// Maximum number of identifiers a client may request at once.
    ///
    /// Environment variable: `MAX_BATCH_SIZE`
    #[arg(long, env = "MAX_BATCH_SIZE", default_value_t = 10_000)]
    pub max_batch_size: usize,

    /// JSON file of named reservations, loaded at startup.
    ///
    /// The file holds an object mapping each reservation name to its bounds,
    /// optional namespace and categories.
    ///
    /// Environment variable: `RESERVATIONS_FILE`
    #[arg(long, env = "RESERVATIONS_FILE")]
    pub reservations_file: Option<PathBuf>,

    /// JSON array of identifiers to register at startup, e.g. the identifiers
    /// of a previous release.
    ///
    /// Environment variable: `SEED_FILE`
    #[arg(long, env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human readable text.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_generation_attempts: usize,
    pub max_batch_size: usize,
    pub reservations_file: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
    pub log_json: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_generation_attempts == 0 {
            bail!("MAX_GENERATION_ATTEMPTS must be greater than 0");
        }

        if args.max_batch_size == 0 {
            bail!("MAX_BATCH_SIZE must be greater than 0");
        }

        for (name, path) in [
            ("RESERVATIONS_FILE", &args.reservations_file),
            ("SEED_FILE", &args.seed_file),
        ] {
            match path {
                Some(path) if !path.is_file() => {
                    bail!("{name} ({}) is not a readable file", path.display());
                }
                _ => {}
            }
        }

        Ok(Self {
            server_addr: args.server_addr,
            max_generation_attempts: args.max_generation_attempts,
            max_batch_size: args.max_batch_size,
            reservations_file: args.reservations_file,
            seed_file: args.seed_file,
            log_json: args.log_json,
        })
    }
}
