//! Menagerie - a family of command-driven Matrix bots.
//!
//! One binary runs one bot, chosen in the configuration file:
//!
//! - **echo**: sends every message, image and location right back
//! - **xkcd**: fetches xkcd comics
//! - **weather**: current weather and forecasts from OpenWeatherMap
//! - **packages**: package search on Bower, npm and crates.io via libraries.io
//! - **imgflip**: top memes and meme captioning
//! - **absence**: upcoming absences from absence.io
//! - **bamboohr**: who is out today on BambooHR
//! - **hassmelden**: takes reports of hate speech
//!
//! # Usage
//!
//! ```bash
//! menagerie --config config.yaml --data ./menagerie-data
//! ```
//!
//! See the [`config`] module for the configuration format.
//!
//! # Architecture
//!
//! - [`matrix`] logs in, syncs and implements the outbound [`sink`]
//! - the sync loop pushes [`events`] to the [`router`] over a channel
//! - the router hands text to the [`commands`] dispatcher, which parses it
//!   and runs the handlers of one of the [`bots`]
//! - bots reach external APIs through [`services`]
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::{
    bots::{
        Bot, BotSettings, absence::AbsenceBot, bamboohr::BambooHrBot, echo::EchoBot,
        hassmelden::HassmeldenBot, imgflip::ImgflipBot, packages::PackagesBot,
        weather::WeatherBot, xkcd::XkcdBot,
    },
    commands::dispatcher::Dispatcher,
    config::{BotKind, Config},
    matrix::{MatrixClient, UserCredentials},
    router::EventRouter,
    services::{
        absence_io::{AbsenceIoRequester, HawkCredentials},
        bamboohr::BambooHrRequester,
        imgflip::ImgflipRequester,
        libraries_io::LibrariesIoRequester,
        weather::OpenWeatherMapRequester,
        xkcd::XkcdRequester,
    },
    utils::get_path,
};

mod bots;
mod commands;
mod config;
mod events;
mod matrix;
mod router;
mod services;
mod sink;
mod utils;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: String,

    /// Directory for persistent data.
    ///
    /// Holds the Matrix session and the encryption keys of the bot device,
    /// restrict its permissions accordingly.
    #[arg(short, long)]
    data: String,
}

/// Service section required by the configured bot.
fn required<T: Clone>(section: &Option<T>, name: &str, bot: BotKind) -> Result<T> {
    section
        .clone()
        .with_context(|| format!("the {bot} bot needs a services.{name} section"))
}

/// Connects the bot to the sync loop and runs until syncing stops.
async fn run<B: Bot>(bot: B, config: &Config, client: MatrixClient) -> Result<()> {
    let (sender, receiver) = mpsc::unbounded_channel();

    let settings = BotSettings::new(config.feedback_conversation.clone());
    let dispatcher = Dispatcher::new(bot, settings, config.pending_ttl());
    let router = EventRouter::new(dispatcher, client.clone());

    tokio::select! {
        result = client.sync(sender) => result.context("matrix sync stopped"),
        _ = router.run(receiver) => Ok(()),
    }
}

async fn start(config: Config, args: Args) -> Result<()> {
    if config.feedback_conversation.is_none() {
        warn!("no feedback_conversation configured, /feedback is disabled");
    }

    let credentials = UserCredentials::from(&config.matrix);
    let client = MatrixClient::connect(&credentials, &get_path(&args.data, "session")).await?;

    let services = &config.services;
    match config.bot {
        BotKind::Echo => run(EchoBot, &config, client).await,
        BotKind::Xkcd => {
            let xkcd = services.xkcd.clone().unwrap_or_default();
            run(XkcdBot::new(XkcdRequester::new(&xkcd.url)), &config, client).await
        }
        BotKind::Weather => {
            let weather = required(&services.weather, "weather", config.bot)?;
            let requester =
                OpenWeatherMapRequester::new(&weather.url, &weather.api_key, &weather.lang);
            run(WeatherBot::new(requester), &config, client).await
        }
        BotKind::Packages => {
            let libraries_io = required(&services.libraries_io, "libraries_io", config.bot)?;
            let searcher = LibrariesIoRequester::new(&libraries_io.url, &libraries_io.api_key);
            run(PackagesBot::new(searcher), &config, client).await
        }
        BotKind::Imgflip => {
            let imgflip = required(&services.imgflip, "imgflip", config.bot)?;
            let requester =
                ImgflipRequester::new(&imgflip.url, &imgflip.username, &imgflip.password);
            run(ImgflipBot::new(requester), &config, client).await
        }
        BotKind::Absence => {
            let absence_io = required(&services.absence_io, "absence_io", config.bot)?;
            let credentials = HawkCredentials {
                id: absence_io.key_id,
                key: absence_io.key,
            };
            let requester = AbsenceIoRequester::new(&absence_io.url, credentials);
            run(AbsenceBot::new(requester), &config, client).await
        }
        BotKind::Bamboohr => {
            let bamboohr = required(&services.bamboohr, "bamboohr", config.bot)?;
            let requester = BambooHrRequester::new(
                &bamboohr.url,
                &bamboohr.api_key,
                &bamboohr.company_domain,
            );
            run(BambooHrBot::new(requester), &config, client).await
        }
        BotKind::Hassmelden => run(HassmeldenBot::new(), &config, client).await,
    }
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting menagerie {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {e:#}");
            return;
        }
    };
    info!("running the {} bot", config.bot);

    if let Err(e) = start(config, args).await {
        error!("{e:#}");
    }
}
