//! API-friendly representations of session data. These are the bodies of
//! the JSON responses; none of them carry the session secret.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    candidate::{Candidate, CandidateId},
    session::{Conclusion, SessionState},
    tally::Verdict,
};

/// Landing page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub election_name: String,
    pub state: SessionState,
}

/// A candidate as shown on the ballot. Vote counts are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntry {
    pub id: CandidateId,
    pub name: String,
    pub photo_url: String,
    pub vote_link: String,
}

/// Everything needed to draw the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotPaper {
    pub election_name: String,
    pub portrait_width: u32,
    pub portrait_height: u32,
    pub candidates: Vec<BallotEntry>,
}

/// Shown after a vote has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThankYou {
    pub message: String,
    /// Seconds to wait before returning to `redirect_to`.
    pub redirect_after: u64,
    pub redirect_to: String,
}

/// A candidate's final count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
}

impl From<Candidate> for Standing {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            votes: candidate.votes,
        }
    }
}

/// Final results, returned to the official who concludes the election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_name: String,
    pub standings: Vec<Standing>,
    pub verdict: Verdict,
    pub announcement: String,
    pub opened_at: Option<DateTime<Utc>>,
    pub concluded_at: DateTime<Utc>,
}

impl From<Conclusion> for ElectionResults {
    fn from(conclusion: Conclusion) -> Self {
        let announcement = conclusion.announcement();
        Self {
            election_name: conclusion.election_name,
            standings: conclusion.standings.into_iter().map(Into::into).collect(),
            verdict: conclusion.verdict,
            announcement,
            opened_at: conclusion.opened_at,
            concluded_at: conclusion.concluded_at,
        }
    }
}
