//! Resolve resources from a manifest repository
//!
//! Usage:
//!   resolve --repository <file|dir> --mandatory app [--optional extras@1.2.0] [--config resolver.toml] [--json]
//!
//! Resources are named `name` (highest version) or `name@version`.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use bllvm_resolver::manifest::load_repository;
use bllvm_resolver::utils::init_logging_from_config;
use bllvm_resolver::{Repository, RepositoryEnvironment, Resolver, ResolverConfig, ResolverError, ResourceId, Version, Wiring};

#[derive(Parser, Debug)]
#[command(name = "resolve", about = "Compute a wiring for a set of resources")]
struct Args {
    /// Repository file ([[resource]] tables) or directory of resource.toml manifests
    #[arg(long)]
    repository: PathBuf,

    /// Resources that must resolve
    #[arg(long, num_args = 1..)]
    mandatory: Vec<String>,

    /// Resources to resolve if possible
    #[arg(long, num_args = 1..)]
    optional: Vec<String>,

    /// Resolver configuration (TOML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the wiring as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct WireOutput {
    namespace: String,
    requirement: String,
    provider: String,
}

#[derive(Serialize)]
struct ResourceOutput {
    resource: String,
    wires: Vec<WireOutput>,
}

fn lookup(repository: &Repository, spec: &str) -> anyhow::Result<ResourceId> {
    let (name, version) = match spec.split_once('@') {
        Some((name, version)) => (name, Some(Version::parse(version)?)),
        None => (spec, None),
    };
    repository
        .find(name, version.as_ref())
        .with_context(|| format!("resource {} not found in repository", spec))
}

fn render(repository: &Repository, wiring: &Wiring) -> Vec<ResourceOutput> {
    wiring
        .iter()
        .map(|(resource, wires)| ResourceOutput {
            resource: repository.identity(resource).to_string(),
            wires: wires
                .iter()
                .map(|wire| {
                    let requirement = repository.requirement(wire.requirement);
                    WireOutput {
                        namespace: requirement.namespace().to_string(),
                        requirement: requirement.filter().unwrap_or("(*)").to_string(),
                        provider: repository.identity(wire.provider).to_string(),
                    }
                })
                .collect(),
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ResolverConfig::from_file(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => ResolverConfig::default(),
    }
    .with_env_overrides()?;
    config.validate()?;
    init_logging_from_config(config.logging.as_ref());

    let (repository, _) = load_repository(&args.repository)?;
    let mandatory = args
        .mandatory
        .iter()
        .map(|s| lookup(&repository, s))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let optional = args
        .optional
        .iter()
        .map(|s| lookup(&repository, s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let resolver = Resolver::new(config);
    let wiring = match resolver.resolve(&repository, &mandatory, &optional, &RepositoryEnvironment::new()) {
        Ok(wiring) => wiring,
        Err(ResolverError::Resolution(failure)) => {
            for unresolved in &failure.unresolved {
                eprintln!("unresolved: {}: {}", unresolved.identity, unresolved.reason);
            }
            anyhow::bail!("{} mandatory resource(s) could not be resolved", failure.unresolved.len());
        }
        Err(e) => return Err(e.into()),
    };
    info!("Resolved {} resource(s)", wiring.len());

    let output = render(&repository, &wiring);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for resource in &output {
            println!("{}", resource.resource);
            for wire in &resource.wires {
                println!("  {} {} -> {}", wire.namespace, wire.requirement, wire.provider);
            }
        }
    }
    Ok(())
}
