//! Blackjack dealer server.
//!
//! Advertises itself with UDP offers and plays each connecting player's
//! requested rounds on its own thread.

mod config;

use anyhow::Error;
use ctrlc::set_handler;
use log::{error, info};
use pico_args::Arguments;

use blackjack::server::Server;
use config::{Overrides, Settings};

const HELP: &str = "\
Run a blackjack dealer server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --bind             IP      Session listener address    [default: env BJ_BIND_IP or 0.0.0.0]
  --port             PORT    Session listener port       [default: env BJ_PORT or 0 (any)]
  --name             NAME    Name advertised in offers   [default: env BJ_SERVICE_NAME or \"Blackjack Table\"]
  --discovery-port   PORT    UDP port offers are sent to [default: env BJ_DISCOVERY_PORT or 13122]
  --broadcast        IP      Address offers are sent to  [default: env BJ_BROADCAST_IP or 255.255.255.255]
  --idle-timeout     SECS    Drop sessions idle this long [default: env BJ_IDLE_TIMEOUT_SECS or 600]

FLAGS:
  --no-discovery             Don't broadcast offers
  -h, --help                 Print help information

ENVIRONMENT:
  RUST_LOG                   Log level (e.g., info, debug)
  (A .env file in the working directory is loaded if present)
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind_ip: pargs.opt_value_from_str("--bind")?,
        port: pargs.opt_value_from_str("--port")?,
        service_name: pargs.opt_value_from_str("--name")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
        broadcast_ip: pargs.opt_value_from_str("--broadcast")?,
        idle_timeout_secs: pargs.opt_value_from_str("--idle-timeout")?,
        no_discovery: pargs.contains("--no-discovery"),
    };
    let settings = Settings::from_env(overrides)?;

    env_logger::builder().format_target(false).init();

    let server = Server::bind(settings.server_config())?;
    info!(
        "Starting blackjack server \"{}\" at {}",
        settings.service_name,
        server.local_addr()?
    );
    if settings.discovery_enabled {
        info!(
            "Broadcasting offers to {}:{}",
            settings.broadcast_ip, settings.discovery_port
        );
    }

    // Catching signals for exit.
    let stop = server.stop_handle();
    set_handler(move || {
        info!("Shutting down server...");
        if let Err(error) = stop.stop() {
            error!("Failed to stop server: {error}");
            std::process::exit(1);
        }
    })?;

    server.run()
}
