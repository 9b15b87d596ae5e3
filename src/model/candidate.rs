use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Candidate IDs are assigned sequentially from 1 in registration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(rocket::UriDisplayPath)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

impl Display for CandidateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-numeric IDs fail to parse, so the route forwards.
impl<'a> FromParam<'a> for CandidateId {
    type Error = std::num::ParseIntError;

    fn from_param(param: &'a str) -> std::result::Result<Self, Self::Error> {
        param.parse().map(Self)
    }
}

/// Opaque handle to a candidate's photo, resolved by whoever serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl Display for PhotoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point-in-time view of a registered candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub photo: PhotoRef,
    pub votes: u64,
}

/// Registry storage for a single candidate. The counter is atomic so that
/// concurrent votes never lose an increment.
#[derive(Debug)]
struct Entry {
    name: String,
    photo: PhotoRef,
    votes: AtomicU64,
}

/// The ordered set of candidates in an election and their vote counters.
///
/// Position `i` always holds the candidate with ID `i + 1`. Entries are only
/// ever appended, so IDs are never reused or reassigned.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    entries: Vec<Entry>,
}

impl CandidateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate with zero votes and return its new ID.
    pub(crate) fn register(&mut self, name: String, photo: PhotoRef) -> Result<CandidateId> {
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "candidate names must not be empty".to_string(),
            ));
        }
        let id = u32::try_from(self.entries.len() + 1)
            .map(CandidateId)
            .map_err(|_| Error::Configuration("too many candidates".to_string()))?;
        self.entries.push(Entry {
            name,
            photo,
            votes: AtomicU64::new(0),
        });
        Ok(id)
    }

    /// Add exactly one vote to the given candidate.
    pub(crate) fn cast_vote(&self, id: CandidateId) -> Result<()> {
        let entry = self.entry(id).ok_or(Error::InvalidCandidate(id))?;
        entry.votes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of registered candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only copy of every candidate, in ID order.
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.entries
            .iter()
            .zip(1..)
            .map(|(entry, id)| Candidate {
                id: CandidateId(id),
                name: entry.name.clone(),
                photo: entry.photo.clone(),
                votes: entry.votes.load(Ordering::Relaxed),
            })
            .collect()
    }

    fn entry(&self, id: CandidateId) -> Option<&Entry> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl CandidateRegistry {
        /// A registry of three candidates with no votes.
        pub fn example() -> Self {
            let mut registry = Self::new();
            for name in ["Chris Riches", "Parry Hotter", "Ada Lovelace"] {
                let photo = PhotoRef(format!("{}.jpg", name.to_lowercase().replace(' ', "_")));
                registry.register(name.to_string(), photo).unwrap();
            }
            registry
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut registry = CandidateRegistry::new();
        for n in 1..=10 {
            let id = registry
                .register(format!("Candidate {n}"), PhotoRef(format!("{n}.png")))
                .unwrap();
            assert_eq!(id, CandidateId(n));
        }

        let ids: Vec<_> = registry.snapshot().into_iter().map(|c| c.id.0).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_name_rejected() {
        let mut registry = CandidateRegistry::new();
        let result = registry.register("   ".to_string(), PhotoRef("a.png".to_string()));
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn votes_counted() {
        let registry = CandidateRegistry::example();
        registry.cast_vote(CandidateId(2)).unwrap();
        registry.cast_vote(CandidateId(2)).unwrap();
        registry.cast_vote(CandidateId(3)).unwrap();

        let votes: Vec<_> = registry.snapshot().into_iter().map(|c| c.votes).collect();
        assert_eq!(votes, vec![0, 2, 1]);
    }

    #[test]
    fn out_of_range_vote_rejected() {
        let registry = CandidateRegistry::example();
        for id in [0, 4, u32::MAX] {
            let result = registry.cast_vote(CandidateId(id));
            assert!(matches!(result, Err(Error::InvalidCandidate(bad)) if bad == CandidateId(id)));
        }
        assert!(registry.snapshot().iter().all(|c| c.votes == 0));
    }

    #[test]
    fn concurrent_votes_not_lost() {
        const THREADS: u32 = 8;
        const VOTES_PER_THREAD: u64 = 1000;

        let registry = CandidateRegistry::example();
        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let registry = &registry;
                scope.spawn(move || {
                    let id = CandidateId(t % 3 + 1);
                    for _ in 0..VOTES_PER_THREAD {
                        registry.cast_vote(id).unwrap();
                    }
                });
            }
        });

        let total: u64 = registry.snapshot().iter().map(|c| c.votes).sum();
        assert_eq!(total, THREADS as u64 * VOTES_PER_THREAD);
    }

    #[test]
    fn id_from_param() {
        assert_eq!(CandidateId::from_param("3").unwrap(), CandidateId(3));
        assert!(CandidateId::from_param("three").is_err());
        assert!(CandidateId::from_param("-1").is_err());
    }
}
