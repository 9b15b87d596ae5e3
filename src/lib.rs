#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

use crate::config::ConfigFairing;
use crate::logging::LoggerFairing;
use crate::model::session::ElectionSession;
use crate::setup::SessionFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod setup;
pub mod staging;

/// Build the server for the election described by `figment`.
/// The election itself is set up when the server is ignited.
pub fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(SessionFairing)
        .attach(LoggerFairing)
}

/// Build the server around an existing session, bypassing election setup.
/// Exists for `#[backend_test]`; the server binary uses [`build`].
#[doc(hidden)]
pub fn rocket_for_session(figment: Figment, session: ElectionSession) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(session)
}
