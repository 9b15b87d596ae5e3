use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    candidate::{Candidate, CandidateId, CandidateRegistry, PhotoRef},
    secret::SessionSecret,
    tally::{compute_verdict, Verdict},
};

/// States in the session lifecycle. The session only ever moves forwards
/// through these, in this order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Candidates are being registered.
    Configuring,
    /// Ballots are being accepted.
    Voting,
    /// The official has asked to conclude; the tally is in progress.
    ShuttingDown,
    /// Results are final and the server is stopping.
    Concluded,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuring => "configuring",
            Self::Voting => "voting",
            Self::ShuttingDown => "shutting down",
            Self::Concluded => "concluded",
        };
        write!(f, "{name}")
    }
}

/// Mutable lifecycle data, guarded as a unit.
#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    opened_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    fn advance(&mut self, to: SessionState) {
        debug_assert!(to > self.state, "session state must only move forwards");
        info!("Election session: {} -> {}", self.state, to);
        self.state = to;
    }
}

/// The final results of an election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    pub election_name: String,
    pub standings: Vec<Candidate>,
    pub verdict: Verdict,
    pub opened_at: Option<DateTime<Utc>>,
    pub concluded_at: DateTime<Utc>,
}

impl Conclusion {
    /// Human-readable statement of the verdict.
    pub fn announcement(&self) -> String {
        match self.verdict {
            Verdict::Tie => "It's a tie!".to_string(),
            Verdict::Winner(id) => match self.standings.iter().find(|c| c.id == id) {
                Some(winner) => format!("{} has won, with {} votes!", winner.name, winner.votes),
                None => format!("Candidate {id} has won!"),
            },
        }
    }
}

/// A single election, from candidate registration through to the final tally.
///
/// One session exists per server run. It is shared by reference with every
/// request handler, so every operation after setup takes `&self` and may be
/// called concurrently. Votes take a shared lock on the lifecycle and bump an
/// atomic counter; state transitions take the exclusive lock, so exactly one
/// caller can perform each of them.
#[derive(Debug)]
pub struct ElectionSession {
    name: String,
    registry: CandidateRegistry,
    secret: SessionSecret,
    lifecycle: RwLock<Lifecycle>,
}

impl ElectionSession {
    /// Create a new session in the `Configuring` state, with no candidates.
    pub fn new(name: String, secret: SessionSecret) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "election name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            registry: CandidateRegistry::new(),
            secret,
            lifecycle: RwLock::new(Lifecycle {
                state: SessionState::Configuring,
                opened_at: None,
            }),
        })
    }

    /// The election's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The termination capability. Only the operator announcement should show this.
    pub fn secret(&self) -> &SessionSecret {
        &self.secret
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle().state
    }

    /// Register a new candidate. Only possible while `Configuring`.
    pub fn register(&mut self, name: String, photo: PhotoRef) -> Result<CandidateId> {
        let state = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .state;
        if state != SessionState::Configuring {
            return Err(Error::SetupClosed);
        }
        let id = self.registry.register(name, photo)?;
        debug!("Registered candidate {id}");
        Ok(id)
    }

    /// Close registration and start accepting votes.
    pub fn open_voting(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle_mut();
        if lifecycle.state != SessionState::Configuring {
            return Err(Error::WrongState {
                expected: SessionState::Configuring,
                actual: lifecycle.state,
            });
        }
        if self.registry.is_empty() {
            return Err(Error::Configuration(
                "at least one candidate is required to open voting".to_string(),
            ));
        }
        lifecycle.advance(SessionState::Voting);
        lifecycle.opened_at = Some(Utc::now());
        Ok(())
    }

    /// Record one vote for the given candidate.
    ///
    /// Every accepted call counts, including repeats from the same voter.
    pub fn cast_vote(&self, id: CandidateId) -> Result<()> {
        // Hold the shared lock across the increment so that no vote can land
        // after the tally has taken its snapshot.
        let lifecycle = self.lifecycle();
        if lifecycle.state != SessionState::Voting {
            warn!("Rejected vote for candidate {id}: election is {}", lifecycle.state);
            return Err(Error::WrongState {
                expected: SessionState::Voting,
                actual: lifecycle.state,
            });
        }
        self.registry.cast_vote(id).map_err(|err| {
            warn!("Rejected vote: {err}");
            err
        })
    }

    /// Read-only view of all candidates and their current counts.
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.registry.snapshot()
    }

    /// Number of registered candidates.
    pub fn candidate_count(&self) -> usize {
        self.registry.len()
    }

    /// Conclude the election if `presented` is the session secret.
    ///
    /// Returns `Ok(None)` without touching the session when the secret does not
    /// match or the election is not currently `Voting`, so only the first valid
    /// trigger ever tallies. The caller is responsible for stopping the server
    /// once this returns a conclusion.
    pub fn conclude(&self, presented: &str) -> Result<Option<Conclusion>> {
        if !self.secret.matches(presented) {
            return Ok(None);
        }

        let mut lifecycle = self.lifecycle_mut();
        if lifecycle.state != SessionState::Voting {
            warn!(
                "Ignoring request to conclude: election is already {}",
                lifecycle.state
            );
            return Ok(None);
        }
        lifecycle.advance(SessionState::ShuttingDown);

        let standings = self.registry.snapshot();
        let verdict = compute_verdict(&standings)?;
        let conclusion = Conclusion {
            election_name: self.name.clone(),
            standings,
            verdict,
            opened_at: lifecycle.opened_at,
            concluded_at: Utc::now(),
        };
        info!("Verdict for \"{}\": {}", self.name, conclusion.announcement());

        lifecycle.advance(SessionState::Concluded);
        Ok(Some(conclusion))
    }

    fn lifecycle(&self) -> RwLockReadGuard<'_, Lifecycle> {
        self.lifecycle.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle_mut(&self) -> RwLockWriteGuard<'_, Lifecycle> {
        self.lifecycle.write().unwrap_or_else(PoisonError::into_inner)
    }
}
