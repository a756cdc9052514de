//! offline-proxy: 离线缓存代理的命令行工具
//!
//! Usage:
//!   offline-proxy classify <url>                  Show the traffic class of a URL
//!   offline-proxy fetch <url> [--accept <type>]   Install, promote and fetch through the proxy
//!   offline-proxy namespaces                      Install the configured version and list its namespaces
//!   offline-proxy version                         Show version information

use anyhow::{bail, Context};
use offline_proxy::cache::{MemoryStore, NamespaceName};
use offline_proxy::classifier::RequestClassifier;
use offline_proxy::transport::HttpTransport;
use offline_proxy::{ProxyConfig, Registration, RequestDescriptor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "classify" => cmd_classify(&args[2..]),
        "fetch" => cmd_fetch(&args[2..]).await,
        "namespaces" => cmd_namespaces(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version(&args[2..]);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"offline-proxy: 客户端离线缓存代理

USAGE:
    offline-proxy <COMMAND> [OPTIONS]

COMMANDS:
    classify <url>                  Show the traffic class of a URL
    fetch <url> [--accept <type>]   Install, promote and fetch a URL through the proxy
    namespaces                      Install the configured version and list its namespaces
    version                         Show version information
    help                            Show this help message

OPTIONS:
    --config <path>                 YAML configuration file

ENVIRONMENT:
    OFFLINE_PROXY_CACHE_PREFIX      Namespace prefix
    OFFLINE_PROXY_VERSION           Deployed version tag
    OFFLINE_PROXY_ORIGIN            Origin the manifest is resolved against
    OFFLINE_PROXY_HTTP_TIMEOUT_SECS Upstream request timeout
    OFFLINE_PROXY_AUTO_PROMOTE      Promote right after install (true/false)
    RUST_LOG                        Log filter (default: info)"#
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = true;
            continue;
        }
        return Some(arg);
    }
    None
}

fn load_config(args: &[String]) -> anyhow::Result<ProxyConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => {
            let path = PathBuf::from(path);
            ProxyConfig::from_yaml_file(&path)
                .with_context(|| format!("cannot load {}", path.display()))?
        }
        None => ProxyConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn cmd_classify(args: &[String]) -> anyhow::Result<()> {
    let Some(url) = positional(args) else {
        bail!("Usage: offline-proxy classify <url>");
    };
    let config = load_config(args)?;
    let request = RequestDescriptor::get(url)?;
    let classifier = RequestClassifier::new(config.manifest.iter().cloned());
    println!("{}", classifier.classify(&request));
    Ok(())
}

async fn cmd_fetch(args: &[String]) -> anyhow::Result<()> {
    let Some(url) = positional(args) else {
        bail!("Usage: offline-proxy fetch <url> [--accept <type>]");
    };
    let config = load_config(args)?;
    let mut request = RequestDescriptor::get(url)?;
    if let Some(accept) = flag_value(args, "--accept") {
        request = request.with_accept(accept);
    }

    let network = Arc::new(HttpTransport::new(config.http_timeout())?);
    let registration = Registration::new(Arc::new(MemoryStore::new()), network);

    let (_, report) = registration
        .install(config)
        .await
        .context("installation failed")?;
    eprintln!("Installed {} ({} assets)", report.namespace, report.assets);
    registration.promote().await?;

    let served = registration.handle_fetch(&request).await?;
    println!("Class:  {}", served.class);
    println!("Source: {:?}", served.source);
    println!(
        "Status: {} {}",
        served.response.status, served.response.status_text
    );
    for (name, value) in &served.response.headers {
        println!("  {name}: {value}");
    }
    println!();
    println!("{}", served.response.text());
    Ok(())
}

async fn cmd_namespaces(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let network = Arc::new(HttpTransport::new(config.http_timeout())?);
    let registration = Registration::new(Arc::new(MemoryStore::new()), network);

    let (instance, _) = registration
        .install(config)
        .await
        .context("installation failed")?;
    registration.promote().await?;

    let names = registration.store().namespaces().await?;
    println!("{:<32} {:<10} {}", "Namespace", "Kind", "Entries");
    println!("{}", "-".repeat(52));
    for name in &names {
        match NamespaceName::parse(instance.namespaces().prefix(), name) {
            Some(ns) => {
                let entries = registration.store().len(&ns).await?;
                println!("{:<32} {:<10} {}", name, ns.kind().as_str(), entries);
            }
            None => println!("{:<32} {:<10} -", name, "foreign"),
        }
    }
    println!("\nReported version: {}", instance.version_label());
    Ok(())
}

fn cmd_version(args: &[String]) {
    let label = load_config(args)
        .map(|c| format!("{}-{}", c.cache_prefix, c.version))
        .unwrap_or_else(|_| "unconfigured".to_string());
    println!("offline-proxy {} ({})", env!("CARGO_PKG_VERSION"), label);
}
