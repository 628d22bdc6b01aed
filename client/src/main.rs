use clap::Parser;
use client::network::Client;
use log::info;
use shared::DEFAULT_ROOM;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Room to join
    #[arg(short, long, default_value = DEFAULT_ROOM)]
    room: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: A/D to turn, W to thrust");
    info!("Press 1-4 to change ship, H/G to chat, E to react");
    info!("Press L to leave the room, J to rejoin, R to reconnect");

    let mut client = Client::new(&args.server, &args.room, args.width, args.height).await?;

    client.run().await?;

    Ok(())
}
