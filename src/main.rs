// src/main.rs
mod cert;
mod config;
mod error;
mod network;
mod utils;
mod workdir;

use cert::{
    verify_bundle, CertificateSigner, EnvReport, OpenSslSigner, ScenarioId, ScenarioPlanner,
};
use clap::Parser;
use config::SignerConfig;
use error::RunError;
use network::{NetworkRange, CLUSTER_SIZE};
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};
use utils::logging::{FileLogger, Logger, MultiLogger, StderrLogger};

/// Issues etcd peer/serving/client certificates for a three-node test cluster,
/// varying SANs and EKUs per scenario to reproduce mutual-TLS failures.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The CIDR of the network to generate certs for
    #[arg(long)]
    pub network_cidr: Option<String>,

    /// 1: peer certs are client-auth only; 2: peer certs are server-auth only;
    /// 3: peer certs are dual-role, serving certs server-auth only;
    /// 4: peer and serving certs are dual-role. Anything else runs 1.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub scenario: i64,

    /// Optional JSON file overriding validity, key size and work directory
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long)]
    pub debug: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the issuance plan as JSON instead of signing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Re-read the issued certificates and check them against the plan
    #[arg(long)]
    pub verify: bool,
}

fn build_logger(args: &Args) -> io::Result<Box<dyn Logger>> {
    let stderr: Box<dyn Logger> = Box::new(StderrLogger::new(args.debug));
    match &args.log_file {
        Some(path) => Ok(Box::new(
            MultiLogger::new()
                .with(stderr)
                .with(Box::new(FileLogger::new(path, args.debug)?)),
        )),
        None => Ok(stderr),
    }
}

fn run(args: &Args, logger: &mut dyn Logger, out: &mut dyn Write) -> Result<(), RunError> {
    let config = match &args.config {
        Some(path) => SignerConfig::load_from_file(path)?,
        None => SignerConfig::default(),
    };
    config.validate()?;

    let signer = OpenSslSigner::new(config.key_size);
    issue(args, &config, &signer, logger, out)
}

fn issue(
    args: &Args,
    config: &SignerConfig,
    signer: &dyn CertificateSigner,
    logger: &mut dyn Logger,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let cidr = args.network_cidr.as_deref().ok_or(RunError::MissingCidr)?;
    let range: NetworkRange = cidr.parse()?;

    let scenario = ScenarioId::from_selector(args.scenario);
    if i64::from(scenario.get()) != args.scenario {
        logger.log(&format!(
            "Unknown scenario {}, falling back to {}",
            args.scenario, scenario
        ));
    }
    logger.log(&format!("Scenario {}: {}", scenario, scenario.summary()));

    let nodes = network::enumerate(&range, CLUSTER_SIZE)?;
    logger.debug_log(&format!("Node addresses in {}: {:?}", range, nodes));

    let plan = ScenarioPlanner::new(config.validity_days).plan(&nodes, scenario);

    if args.dry_run {
        serde_json::to_writer_pretty(&mut *out, &plan).map_err(|e| RunError::Output(e.into()))?;
        writeln!(out).map_err(RunError::Output)?;
        return Ok(());
    }

    let dir = workdir::provision(&config.work_root_path(), &config.work_prefix)
        .map_err(RunError::Workdir)?;
    logger.debug_log(&format!("Working directory: {}", dir.display()));

    let report = EnvReport::new(&plan, &dir);
    let bundle = signer.complete(plan, &dir, logger)?;

    if args.verify {
        verify_bundle(&bundle, logger)?;
    }

    writeln!(out, "{}", report).map_err(RunError::Output)?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let mut logger = match build_logger(&args) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Error: failed to open log file: {}", e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&args, logger.as_mut(), &mut out) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
