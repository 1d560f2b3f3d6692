//! mDNS Resolve Example
//!
//! Resolves one or more hostnames over mDNS. Each host is looked up on its
//! own blocking task, so the lookups run concurrently on independent
//! sockets.
//!
//! # Usage
//!
//! ```
//! cargo run --package mdns-resolver --example mdns_resolve -- printer.local nas.local
//! ```
//!
//! With a shorter deadline on a specific interface:
//! ```
//! cargo run --package mdns-resolver --example mdns_resolve -- \
//!     --timeout 3 --receive-timeout 500 --interface 192.168.1.10 printer.local
//! ```

use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Parser;
use mdns_resolver::{MDNS_DEST_ADDR, Resolver, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "mDNS Resolve")]
#[command(version = "0.1.0")]
#[command(author = "Rain Liu <yuliu@webrtc.rs>")]
#[command(about = "Resolve hostnames to IPv4 addresses with mdns-resolver")]
struct Args {
    /// Hostnames to resolve
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Overall timeout per host in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Single receive timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    receive_timeout: u64,

    /// Multicast group and port to query
    #[arg(long, default_value_t = MDNS_DEST_ADDR)]
    group: SocketAddr,

    /// Local IPv4 interface to use for multicast
    #[arg(long)]
    interface: Option<Ipv4Addr>,

    #[arg(short, long)]
    debug: bool,

    #[arg(long, default_value_t = format!("INFO"))]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = log::LevelFilter::from_str(&args.log_level)?;
    if args.debug {
        env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} [{}] {} - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.level(),
                    chrono::Local::now().format("%H:%M:%S.%6f"),
                    record.args()
                )
            })
            .filter(None, log_level)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut config = ResolverConfig::default()
        .with_query_timeout(Duration::from_secs(args.timeout))
        .with_receive_timeout(Duration::from_millis(args.receive_timeout))
        .with_dest_addr(args.group);
    if let Some(interface) = args.interface {
        config = config.with_interface(interface);
    }
    let resolver = Resolver::new(config);

    log::info!(
        "Resolving {} host(s) via {} (timeout {}s)",
        args.hosts.len(),
        args.group,
        args.timeout
    );

    let mut tasks = Vec::with_capacity(args.hosts.len());
    for host in args.hosts {
        let resolver = resolver.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = resolver.resolve(&host);
            (host, result, start.elapsed())
        }));
    }

    let mut failures = 0;
    for task in tasks {
        let (host, result, elapsed) = task.await?;
        let at = chrono::Local::now().format("%H:%M:%S%.3f");
        match result {
            Ok(addr) => println!("[{at}] {host} -> {addr} ({elapsed:?})"),
            Err(err) if err.is_timeout() => {
                failures += 1;
                println!("[{at}] {host}: no answer within {}s", args.timeout);
            }
            Err(err) => {
                failures += 1;
                println!("[{at}] {host}: {err}");
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
