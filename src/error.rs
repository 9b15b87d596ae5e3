use log::error;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::{candidate::CandidateId, session::SessionState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Candidate {0} does not exist")]
    InvalidCandidate(CandidateId),
    #[error("Election is {actual}, but must be {expected}")]
    WrongState {
        expected: SessionState,
        actual: SessionState,
    },
    #[error("Candidate registration is closed")]
    SetupClosed,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match self {
            Self::InvalidCandidate(_) => Status::NotFound,
            Self::WrongState { .. } => Status::Conflict,
            Self::SetupClosed | Self::Configuration(_) | Self::Io(_) => {
                error!("{self}");
                Status::InternalServerError
            }
        };
        Err(status)
    }
}
