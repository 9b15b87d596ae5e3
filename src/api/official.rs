use rocket::{serde::json::Json, Route, Shutdown, State};

use crate::config::Config;
use crate::error::Result;
use crate::model::{api::ElectionResults, session::ElectionSession};

pub fn routes() -> Vec<Route> {
    routes![conclude]
}

/// Conclude the election: tally, report the results, and stop the server.
///
/// Anything other than the quit header followed by the exact session secret
/// gets the same plain 404 as an unknown route, as does every attempt after
/// the first successful one. The rank keeps this below every other route.
#[get("/<header>/<secret>", rank = 20)]
async fn conclude(
    header: &str,
    secret: &str,
    session: &State<ElectionSession>,
    config: &State<Config>,
    shutdown: Shutdown,
) -> Result<Option<Json<ElectionResults>>> {
    if header != config.quit_header() {
        return Ok(None);
    }
    let conclusion = match session.conclude(secret)? {
        Some(conclusion) => conclusion,
        None => return Ok(None),
    };

    shutdown.notify();
    Ok(Some(Json(conclusion.into())))
}
