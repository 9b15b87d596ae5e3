use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::candidate::{Candidate, CandidateId};

/// The outcome of an election.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Winner(CandidateId),
    Tie,
}

/// Decide the outcome from the final counts with a single left-to-right pass.
///
/// A candidate strictly ahead of everything seen so far becomes the leader;
/// a candidate that only equals the current maximum clears the leader. A later
/// candidate with a strictly greater count therefore still wins outright even
/// if the candidates before it were tied with each other.
pub fn compute_verdict(candidates: &[Candidate]) -> Result<Verdict> {
    if candidates.is_empty() {
        return Err(Error::Configuration(
            "cannot tally an election with no candidates".to_string(),
        ));
    }

    let mut max_votes: Option<u64> = None;
    let mut leader: Option<CandidateId> = None;
    for candidate in candidates {
        match max_votes {
            Some(max) if candidate.votes == max => leader = None,
            Some(max) if candidate.votes < max => {}
            _ => {
                max_votes = Some(candidate.votes);
                leader = Some(candidate.id);
            }
        }
    }

    Ok(leader.map_or(Verdict::Tie, Verdict::Winner))
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;
    use crate::model::candidate::PhotoRef;

    fn with_votes(votes: &[u64]) -> Vec<Candidate> {
        votes
            .iter()
            .zip(1..)
            .map(|(&votes, id)| Candidate {
                id: CandidateId(id),
                name: format!("Candidate {id}"),
                photo: PhotoRef(format!("{id}.jpg")),
                votes,
            })
            .collect()
    }

    fn verdict(votes: &[u64]) -> Verdict {
        compute_verdict(&with_votes(votes)).unwrap()
    }

    #[test]
    fn clear_winner() {
        assert_eq!(verdict(&[5, 3, 1]), Verdict::Winner(CandidateId(1)));
        assert_eq!(verdict(&[1, 3, 5]), Verdict::Winner(CandidateId(3)));
        assert_eq!(verdict(&[1, 7, 5]), Verdict::Winner(CandidateId(2)));
    }

    #[test]
    fn ties() {
        assert_eq!(verdict(&[3, 3, 1]), Verdict::Tie);
        assert_eq!(verdict(&[2, 5, 5]), Verdict::Tie);
        assert_eq!(verdict(&[0, 0]), Verdict::Tie);
        assert_eq!(verdict(&[4, 1, 4]), Verdict::Tie);
    }

    #[test]
    fn later_leader_beats_earlier_tie() {
        assert_eq!(verdict(&[3, 3, 4]), Verdict::Winner(CandidateId(3)));
        assert_eq!(verdict(&[0, 0, 0, 1]), Verdict::Winner(CandidateId(4)));
    }

    #[test]
    fn single_candidate_always_wins() {
        assert_eq!(verdict(&[0]), Verdict::Winner(CandidateId(1)));
        assert_eq!(verdict(&[12]), Verdict::Winner(CandidateId(1)));
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(matches!(compute_verdict(&[]), Err(Error::Configuration(_))));
    }

    #[test]
    fn tally_is_pure() {
        let candidates = with_votes(&[2, 9, 9, 3]);
        let before = candidates.clone();
        let first = compute_verdict(&candidates).unwrap();
        let second = compute_verdict(&candidates).unwrap();
        assert_eq!(first, second);
        assert_eq!(before, candidates);
    }

    #[test]
    fn verdict_serialization() {
        let winner = serde_json::to_string(&Verdict::Winner(CandidateId(2))).unwrap();
        assert_eq!(winner, r#"{"winner":2}"#);
        let tie = serde_json::to_string(&Verdict::Tie).unwrap();
        assert_eq!(tie, r#""tie""#);
    }
}
