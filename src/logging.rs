use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Config;

/// A unique identifier for a particular request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Hide anything after the quit header, so that the session secret never
/// reaches the log even when it is guessed correctly.
pub fn redact_path(path: &str, quit_header: &str) -> String {
    let mut segments = path.trim_start_matches('/').splitn(2, '/');
    match (segments.next(), segments.next()) {
        (Some(first), Some(_)) if first == quit_header => format!("/{quit_header}/<redacted>"),
        _ => path.to_string(),
    }
}

/// A rocket fairing that does global logging, e.g. logging every request and response.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Accepting votes on http://{ip}:{port}");
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = req.local_cache(RequestId::next);
        let method = req.method();
        let path = req.uri().path().to_string();
        let path = match req.rocket().state::<Config>() {
            Some(config) => redact_path(&path, config.quit_header()),
            None => path,
        };
        info!("->req{id} {method} {path}");
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let code = res.status();
        // Unmatched routes include wrong secrets, which are logged like any other miss.
        let route = match req.route() {
            Some(r) => {
                let mut str = r.uri.to_string();
                if let Some(ref name) = r.name {
                    str = format!("{name} ({str})");
                }
                str
            }
            None => "UNKNOWN ROUTE".to_string(),
        };
        let log_msg = format!("<-rsp{id} {code} {route}");
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Election concluded, stopping server...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacted() {
        assert_eq!(redact_path("/quit/4815162", "quit"), "/quit/<redacted>");
        assert_eq!(redact_path("/quit/guess/extra", "quit"), "/quit/<redacted>");
        assert_eq!(redact_path("/end/4815162", "end"), "/end/<redacted>");
    }

    #[test]
    fn other_paths_untouched() {
        assert_eq!(redact_path("/vote_for/2", "quit"), "/vote_for/2");
        assert_eq!(redact_path("/quit", "quit"), "/quit");
        assert_eq!(redact_path("/", "quit"), "/");
        assert_eq!(redact_path("/quitter/1", "quit"), "/quitter/1");
    }
}
