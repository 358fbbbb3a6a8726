// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `pi2mqtt` daemon - connects Raspberry Pi GPIO and 1-Wire sensors to MQTT.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pi2mqtt::bridge::{Bridge, OutputDispatcher, watch_inputs};
use pi2mqtt::gpio::CdevGpio;
use pi2mqtt::payload::encode_connection;
use pi2mqtt::protocol::MqttConnection;
use pi2mqtt::w1::{SysfsBus, W1Poller};
use pi2mqtt::config::LOG_LEVELS;
use pi2mqtt::{Config, ConfigError, Error, PayloadMode, event};

/// Upper bound for flushing the disconnect on shutdown.
const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "pi2mqtt")]
#[command(about = "Connect Raspberry Pi GPIOs and 1-Wire temperature sensors to MQTT")]
#[command(version)]
#[command(after_help = "Examples:\n  \
    pi2mqtt -w -i 17 -i 18 -o 23\n      \
    Disable 1-Wire, use GPIO17/18 as inputs and GPIO23 as output\n  \
    pi2mqtt -t -o 17 -a w1/28-0000002981762:Temperature/Garden -a gpio/17:Light/Garden\n      \
    Use 1-Wire and GPIO17 as output, alias topics and remove the status prefix")]
struct Args {
    /// Use config file [default: ~/.pi2mqtt/config.json]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log to file instead of stderr
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Log verbosity [default: error]
    #[arg(short, long, value_parser = PossibleValuesParser::new(LOG_LEVELS))]
    verbosity: Option<String>,

    /// Log debug output, implies --verbosity debug
    #[arg(short, long)]
    debug: bool,

    /// Alias topics, `canonical:friendly`. Can be used multiple times
    #[arg(short, long)]
    alias: Vec<String>,

    /// Use gpio as input. Can be used multiple times
    #[arg(short, long, visible_alias = "in")]
    input: Vec<u32>,

    /// Use gpio as output. Can be used multiple times
    #[arg(short, long, visible_alias = "out")]
    output: Vec<u32>,

    /// Type of the mqtt payload, "plain" or "json"
    #[arg(short, long)]
    payload: Option<PayloadMode>,

    /// Publish with retain flag
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    retain: Option<bool>,

    /// Topic prefix for status messages, empty if given without value
    #[arg(short = 't', long, num_args = 0..=1, default_missing_value = "")]
    status_topic: Option<String>,

    /// Topic prefix for set messages, empty if given without value
    #[arg(short = 'z', long, num_args = 0..=1, default_missing_value = "")]
    set_topic: Option<String>,

    /// Topic for connect and last will messages, disabled if empty
    #[arg(short = 'x', long, num_args = 0..=1, default_missing_value = "")]
    testament_topic: Option<String>,

    /// Broker url, `mqtt://[user:password@]host[:port]`
    #[arg(short, long)]
    url: Option<String>,

    /// Seconds to wait before reading the 1-Wire device directory
    #[arg(short = 's', long)]
    w1_wait: Option<u64>,

    /// Polling interval for 1-Wire temperature sensors in seconds
    #[arg(short = 'n', long)]
    w1_interval: Option<u64>,

    /// Disable 1-Wire
    #[arg(short, long)]
    w1_disable: bool,
}

impl Args {
    /// Loads the configuration file and applies command line overrides.
    fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = match self.config {
            Some(path) => Config::load(&path, true)?,
            None => match default_config_path() {
                Some(path) => Config::load(&path, false)?,
                None => Config::default(),
            },
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(payload) = self.payload {
            config.payload = payload;
        }
        if let Some(retain) = self.retain {
            config.retain = retain;
        }
        if let Some(topic) = self.status_topic {
            config.status_topic = topic;
        }
        if let Some(topic) = self.set_topic {
            config.set_topic = topic;
        }
        if let Some(topic) = self.testament_topic {
            config.testament_topic = topic;
        }
        if !self.alias.is_empty() {
            config.alias = self.alias;
        }
        if !self.input.is_empty() {
            config.input = self.input;
        }
        if !self.output.is_empty() {
            config.output = self.output;
        }
        if let Some(wait) = self.w1_wait {
            config.w1_wait = wait;
        }
        if let Some(interval) = self.w1_interval {
            config.w1_interval = interval;
        }
        config.w1_disable |= self.w1_disable;
        if let Some(verbosity) = self.verbosity {
            config.verbosity = Some(verbosity);
        }
        config.debug |= self.debug;
        if let Some(log) = self.log {
            config.log = Some(log);
        }

        config.resolved()
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut path| {
        path.push(".pi2mqtt");
        path.push("config.json");
        path
    })
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(config: &Config) -> Result<(), ConfigError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match &config.log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

async fn run(config: Config) -> pi2mqtt::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "pi2mqtt starting"
    );

    let aliases = config.alias_table()?;

    let cancel = CancellationToken::new();
    let (tx, rx) = event::channel();

    let mut gpio = CdevGpio::new(&config.gpio_chip, cancel.clone());
    watch_inputs(&mut gpio, &config.input, &tx)?;
    let outputs = OutputDispatcher::open(&mut gpio, &config.set_topic, &config.output)?;

    let mut builder = MqttConnection::builder().url(&config.url);
    if let Some(topic) = config.testament_topic() {
        builder = builder.testament(
            topic,
            encode_connection(true, config.payload),
            encode_connection(false, config.payload),
        );
    }
    let connection = builder.build(tx.clone())?;

    let bridge = Bridge::new(&config, connection.clone(), aliases, outputs);
    bridge.subscribe_commands().await?;

    let poller = (!config.w1_disable).then(|| {
        W1Poller::new(SysfsBus::new(&config.w1_path), tx.clone(), cancel.clone())
            .wait(config.w1_wait())
            .interval(config.w1_interval())
    });
    let polling = async {
        match poller {
            Some(poller) => poller.run().await,
            None => std::future::pending().await,
        }
    };
    drop(tx);

    let outcome = tokio::select! {
        () = bridge.run(rx, cancel.clone()) => Ok(()),
        result = polling => result.map_err(Error::from),
        () = shutdown_signal() => Ok(()),
    };

    cancel.cancel();
    match tokio::time::timeout(DISCONNECT_TIMEOUT, connection.disconnect()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Failed to disconnect"),
        Err(_) => tracing::warn!("Timed out disconnecting from MQTT broker"),
    }

    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logging options may come from the config file
    let config = match Args::parse().into_config().and_then(|config| {
        init_tracing(&config)?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pi2mqtt: {e}");
            return ExitCode::from(Error::from(e).exit_code());
        }
    };
    let logs_to_file = config.log.is_some();

    match run(config).await {
        Ok(()) => {
            tracing::info!("pi2mqtt stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            if logs_to_file {
                eprintln!("pi2mqtt: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
