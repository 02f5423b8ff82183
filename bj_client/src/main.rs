//! A console blackjack client.
//!
//! Listens for server offers, connects to the first one it hears, plays the
//! requested rounds, then goes back to listening.

use anyhow::{Result, bail};
use log::{info, warn};
use pico_args::Arguments;
use std::{net::SocketAddr, num::NonZeroU8, time::Duration};

use bj_client::console::ConsolePlayer;
use blackjack::{Client, discovery, errors::SessionError, utils::DEFAULT_IDLE_TIMEOUT};

const DEFAULT_NAME: &str = "Player";

const HELP: &str = "\
Play blackjack against a server on the local network

USAGE:
  bj_client [OPTIONS]

OPTIONS:
  --name             NAME      Player name                   [default: env BJ_PLAYER_NAME or Player]
  --rounds           N         Rounds per session (1-255)    [default: ask]
  --discovery-port   PORT      UDP port to hear offers on    [default: env BJ_DISCOVERY_PORT or 13122]
  --connect          IP:PORT   Skip discovery and connect directly
  --auto             STAND_AT  Play automatically, hitting below STAND_AT
  --idle-timeout     SECS      Give up on a silent server    [default: 600]

FLAGS:
  --once                       Play one session and exit
  -h, --help                   Print help information
";

struct Args {
    name: String,
    rounds: Option<NonZeroU8>,
    discovery_port: u16,
    connect: Option<SocketAddr>,
    auto_stand_at: Option<u32>,
    idle_timeout: Duration,
    once: bool,
}

fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        name: pargs.opt_value_from_str("--name")?.unwrap_or_else(|| {
            std::env::var("BJ_PLAYER_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string())
        }),
        rounds: pargs.opt_value_from_str("--rounds")?,
        discovery_port: pargs
            .opt_value_from_str("--discovery-port")?
            .or_else(|| {
                std::env::var("BJ_DISCOVERY_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(discovery::DISCOVERY_PORT),
        connect: pargs.opt_value_from_str("--connect")?,
        auto_stand_at: pargs.opt_value_from_str("--auto")?,
        idle_timeout: pargs
            .opt_value_from_str("--idle-timeout")?
            .map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_secs),
        once: pargs.contains("--once"),
    };

    env_logger::builder().format_target(false).init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let mut player = ConsolePlayer::stdio(args.auto_stand_at);
    println!("Playing as: {}", args.name);

    loop {
        let addr = match args.connect {
            Some(addr) => addr,
            None => {
                println!("Client started, listening for offer requests...");
                let rendezvous = discovery::listen_for_offer(args.discovery_port, None)?;
                println!(
                    "Received offer from {} ({}), attempting to connect...",
                    rendezvous.addr, rendezvous.service_name
                );
                rendezvous.addr
            }
        };

        let rounds = match args.rounds {
            Some(rounds) => rounds,
            None => player.ask_rounds()?,
        };

        match Client::connect(&addr, &args.name, rounds, args.idle_timeout) {
            Ok(mut client) => match client.play(&mut player) {
                Ok(session) => player.show_summary(&session)?,
                Err(SessionError::Timeout) => println!("Server stopped responding (Timeout)."),
                Err(SessionError::Disconnected) => println!("Server closed the connection."),
                Err(error) => println!("Game error: {error}"),
            },
            Err(error) if args.once => bail!(error),
            Err(error) => warn!("{error}"),
        }

        if args.once {
            return Ok(());
        }
        info!("looking for a new server");
        println!("Closing connection and looking for a new server...\n");
    }
}
