//! VLESS launcher - main entry point

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vless_launch::{synthesize, Engine, LauncherConfig};

#[derive(Parser, Debug)]
#[command(name = "vless-launch", version)]
#[command(about = "Run the proxy engine for a vless:// link behind a local SOCKS5 listener")]
struct Args {
    /// vless:// link; quote it so the shell leaves `?` and `&` alone
    uri: String,

    /// Local SOCKS5 port
    #[arg(short, long)]
    port: Option<u16>,

    /// Engine binary
    #[arg(short, long)]
    engine: Option<PathBuf>,

    /// Launcher settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the engine config to stdout instead of launching
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vless_launch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[!] Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let launcher =
        LauncherConfig::load(args.config.as_deref())?.with_overrides(args.port, args.engine);

    let descriptor = vless_launch::parse(&args.uri)?;
    let config = synthesize(&descriptor, launcher.local_port);

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("[+] SOCKS5 proxy: socks5://127.0.0.1:{}", launcher.local_port);
    println!(
        "[+] Server: {}:{} | Type: {} | Security: {}",
        descriptor.host, descriptor.port, descriptor.transport, descriptor.security
    );
    info!(
        remark = %descriptor.remark,
        engine = %launcher.engine.display(),
        "starting engine"
    );

    let status = Engine::new(launcher.engine).run(&config).await?;
    if status.success() {
        return Ok(ExitCode::SUCCESS);
    }

    warn!(status = %status, "engine exited with failure");
    let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
    Ok(ExitCode::from(code))
}
