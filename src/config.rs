use std::net::{IpAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    figment::Figment,
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::secret;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_quit_header")]
    quit_header: String,
    #[serde(default = "default_secret_length")]
    secret_length: u32,
    #[serde(default = "default_staging_dir")]
    staging_dir: PathBuf,
    #[serde(default = "default_thank_you_delay")]
    thank_you_delay: u64,
    #[serde(default = "default_portrait_size")]
    portrait_width: u32,
    #[serde(default = "default_portrait_size")]
    portrait_height: u32,
}

/// Leading path segments already taken by other routes. A quit header equal to
/// one of these would never reach the conclude route.
const RESERVED_HEADERS: [&str; 2] = ["vote_for", "photos"];

fn default_quit_header() -> String {
    "quit".to_string()
}

fn default_secret_length() -> u32 {
    secret::DEFAULT_LENGTH
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("static/tmp")
}

fn default_thank_you_delay() -> u64 {
    10
}

fn default_portrait_size() -> u32 {
    300
}

impl Config {
    /// First path segment of the route that concludes the election.
    pub fn quit_header(&self) -> &str {
        &self.quit_header
    }

    /// Number of digits in the generated session secret.
    pub fn secret_length(&self) -> u32 {
        self.secret_length
    }

    /// Where candidate photos are staged while the election runs.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// How long the thank-you page is shown before returning to the start.
    pub fn thank_you_delay(&self) -> Duration {
        Duration::from_secs(self.thank_you_delay)
    }

    /// Display size of candidate photos, in pixels.
    pub fn portrait_size(&self) -> (u32, u32) {
        (self.portrait_width, self.portrait_height)
    }

    /// Reject values that would make the election impossible to run or conclude.
    pub fn validate(&self) -> Result<()> {
        if self.secret_length == 0 || self.secret_length > secret::MAX_LENGTH {
            return Err(Error::Configuration(format!(
                "`secret_length` must be between 1 and {}, not {}",
                secret::MAX_LENGTH,
                self.secret_length
            )));
        }
        let header_ok = !self.quit_header.is_empty()
            && self
                .quit_header
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !header_ok {
            return Err(Error::Configuration(format!(
                "`quit_header` must be a single path segment, not \"{}\"",
                self.quit_header
            )));
        }
        if RESERVED_HEADERS.contains(&self.quit_header.as_str()) {
            return Err(Error::Configuration(format!(
                "`quit_header` \"{}\" clashes with another route",
                self.quit_header
            )));
        }
        Ok(())
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the session fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if let Err(e) = config.validate() {
            error!("{e}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// The election to run, read from the `election` key.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionSetup {
    pub name: String,
    #[serde(default)]
    pub candidates: Vec<CandidateSetup>,
}

/// One candidate on the ballot. Order in the config is ballot order.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSetup {
    pub name: String,
    /// Path to an image of the candidate.
    pub photo: PathBuf,
}

/// If the configured port is 0, swap it for one that is currently free on the
/// configured address. The port has to be known before launch so that the
/// termination URL can be announced.
pub fn resolve_port(figment: Figment) -> Result<Figment> {
    let port: u16 = figment
        .extract_inner("port")
        .map_err(|e| Error::Configuration(e.to_string()))?;
    if port != 0 {
        return Ok(figment);
    }
    let address: IpAddr = figment
        .extract_inner("address")
        .map_err(|e| Error::Configuration(e.to_string()))?;
    let free_port = TcpListener::bind((address, 0))?.local_addr()?.port();
    info!("Using free port {free_port} on {address}");
    Ok(figment.merge(("port", free_port)))
}
