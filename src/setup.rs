use std::net::IpAddr;

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    fs::FileServer,
    Build, Ignite, Orbit, Rocket,
};

use crate::config::{Config, ElectionSetup};
use crate::error::{Error, Result};
use crate::model::{
    candidate::CandidateId,
    secret::SessionSecret,
    session::ElectionSession,
};
use crate::staging::{StagingArea, PHOTO_ROOT};

/// Build a session for the configured election, staging each candidate's
/// photo and registering the candidates in the order given.
///
/// The returned session is still `Configuring`.
pub fn configure_session(
    setup: &ElectionSetup,
    config: &Config,
    staging: &StagingArea,
) -> Result<ElectionSession> {
    let secret = SessionSecret::random(config.secret_length())
        .map_err(|e| Error::Configuration(e.to_string()))?;
    let mut session = ElectionSession::new(setup.name.clone(), secret)?;
    for (candidate, next_id) in setup.candidates.iter().zip(1..) {
        let photo = staging.stage(CandidateId(next_id), &candidate.photo)?;
        let id = session.register(candidate.name.clone(), photo)?;
        debug_assert_eq!(id, CandidateId(next_id));
        info!("Candidate {id}: {}", candidate.name);
    }
    Ok(session)
}

/// The text shown to the operator once voting is open. This is the only
/// place the session secret is ever shown.
pub fn operator_announcement(
    session: &ElectionSession,
    address: IpAddr,
    port: u16,
    quit_header: &str,
) -> String {
    let secret = session.secret();
    format!(
        "IMPORTANT\n\
         Your session password is: \"{secret}\"\n\
         In order to conclude the election \"{name}\", you (the election official) must visit:\n\
         http://{address}:{port}/{quit_header}/{secret}\n\
         \n\
         Clients should connect to:\n\
         http://{address}:{port}/",
        name = session.name(),
    )
}

/// Launch an ignited server.
///
/// The shutdown hook that removes the staging area only runs once the server
/// has lifted off, so if launching fails the staging area is removed here.
pub async fn launch(rocket: Rocket<Ignite>) -> std::result::Result<Rocket<Ignite>, rocket::Error> {
    let staging = rocket.state::<StagingArea>().cloned();
    rocket.launch().await.map_err(|e| {
        if let Some(staging) = staging {
            if let Err(cleanup) = staging.remove() {
                warn!("Failed to remove staging directory: {cleanup}");
            }
        }
        e
    })
}

/// A fairing that sets up the election on ignite and cleans up after it on
/// shutdown.
///
/// On ignite it creates the staging area, registers the configured
/// candidates, opens voting, announces the termination URL to the operator,
/// and places the `ElectionSession` and `StagingArea` into managed state.
/// Requires [`crate::config::ConfigFairing`] to be attached first.
pub struct SessionFairing;

impl SessionFairing {
    fn open(rocket: &Rocket<Build>, config: &Config) -> Result<(ElectionSession, StagingArea)> {
        let figment = rocket.figment();
        let setup: ElectionSetup = figment
            .extract_inner("election")
            .map_err(|e| Error::Configuration(format!("invalid `election` config: {e}")))?;
        let address: IpAddr = figment
            .extract_inner("address")
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let port: u16 = figment
            .extract_inner("port")
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let staging = StagingArea::create(config.staging_dir())?;
        let opened = configure_session(&setup, config, &staging).and_then(|session| {
            session.open_voting()?;
            Ok(session)
        });
        let session = match opened {
            Ok(session) => session,
            Err(e) => {
                if let Err(cleanup) = staging.remove() {
                    warn!("Failed to remove staging directory: {cleanup}");
                }
                return Err(e);
            }
        };

        println!(
            "{}",
            operator_announcement(&session, address, port, config.quit_header())
        );
        Ok((session, staging))
    }
}

#[rocket::async_trait]
impl Fairing for SessionFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election session",
            kind: Kind::Ignite | Kind::Shutdown,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config.clone(),
            None => {
                error!("Election session requires the application config");
                return Err(rocket);
            }
        };

        let (session, staging) = match Self::open(&rocket, &config) {
            Ok(opened) => opened,
            Err(e) => {
                error!("Failed to set up election: {e}");
                return Err(rocket);
            }
        };
        info!(
            "Election \"{}\" open with {} candidate(s)",
            session.name(),
            session.candidate_count()
        );

        let photos = FileServer::from(staging.dir());
        Ok(rocket.mount(PHOTO_ROOT, photos).manage(session).manage(staging))
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(staging) = rocket.state::<StagingArea>() {
            match staging.remove() {
                Ok(()) => info!("Removed staged photos"),
                Err(e) => error!("Failed to remove staging directory: {e}"),
            }
        }
    }
}
