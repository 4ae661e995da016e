//! Easel coordinator daemon

use clap::{value_parser, Arg, Command};
use easel_access::PermissionResolver;
use easel_server::config::ServerConfig;
use easel_server::directory::{MemoryDirectory, MemoryIdentity, MemoryMembership};
use easel_server::gate::HandshakeGate;
use easel_server::seed::SeedData;
use easel_server::server::CollabServer;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("easel-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Real-time collaborative asset editing coordinator")
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON config file"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_parser(value_parser!(SocketAddr))
                .help("Socket address to listen on"),
        )
        .arg(
            Arg::new("queue-capacity")
                .long("queue-capacity")
                .value_parser(value_parser!(usize))
                .help("Event pipeline queue capacity"),
        )
        .arg(
            Arg::new("roles")
                .long("roles")
                .help("Role table JSON file (defaults to the built-in table)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Demo dataset JSON file for the in-memory directory"),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::new(),
    };
    if let Some(bind) = matches.get_one::<SocketAddr>("bind") {
        config = config.with_bind(*bind);
    }
    if let Some(capacity) = matches.get_one::<usize>("queue-capacity") {
        config = config.with_queue_capacity(*capacity);
    }
    if let Some(roles) = matches.get_one::<String>("roles") {
        config = config.with_roles_file(roles);
    }

    let identity = Arc::new(MemoryIdentity::new());
    let directory = Arc::new(MemoryDirectory::new());
    let membership = Arc::new(MemoryMembership::new());
    if let Some(seed) = matches.get_one::<String>("seed") {
        SeedData::from_file(seed)?.apply(&identity, &directory, &membership);
    }

    let resolver = PermissionResolver::new(config.access_config()?);
    let gate = HandshakeGate::new(identity, directory, membership, resolver);
    let server = CollabServer::new(gate, &config);

    server.run(config.bind).await;
    Ok(())
}
