use std::collections::HashSet;

/// Outcome of registering a skip vote against the active item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The voter already voted against this item; no state change
    AlreadyVoted,

    /// The voter is the requester of the active item; skip unconditionally
    RequesterOverride,

    /// Vote counted, quorum not yet reached (current count included)
    VoteAdded(usize),

    /// This vote reached quorum; the item should be skipped
    QuorumReached,
}

/// Tracks who has voted to skip the currently active item.
///
/// The set is only meaningful against one item: the session resets it on
/// every transition away from the active item (skip, natural completion,
/// stop), so votes never carry over.
#[derive(Debug)]
pub struct SkipVotes {
    voters: HashSet<String>,
    quorum: usize,
}

impl SkipVotes {
    pub fn new(quorum: usize) -> Self {
        Self {
            voters: HashSet::new(),
            quorum,
        }
    }

    /// Registers a vote from `voter` against the item requested by
    /// `requester`.
    pub fn register(&mut self, voter: &str, requester: &str) -> VoteOutcome {
        if voter == requester {
            return VoteOutcome::RequesterOverride;
        }

        if !self.voters.insert(voter.to_string()) {
            return VoteOutcome::AlreadyVoted;
        }

        if self.voters.len() >= self.quorum {
            VoteOutcome::QuorumReached
        } else {
            VoteOutcome::VoteAdded(self.voters.len())
        }
    }

    /// Clears all votes. Called whenever the active item changes.
    pub fn reset(&mut self) {
        self.voters.clear();
    }

    pub fn count(&self) -> usize {
        self.voters.len()
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requester_override_beats_quorum() {
        let mut votes = SkipVotes::new(3);

        assert_eq!(votes.register("alice", "bob"), VoteOutcome::VoteAdded(1));
        assert_eq!(votes.register("bob", "bob"), VoteOutcome::RequesterOverride);
        // The override does not consume a vote slot
        assert_eq!(votes.count(), 1);
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let mut votes = SkipVotes::new(3);

        assert_eq!(votes.register("alice", "bob"), VoteOutcome::VoteAdded(1));
        assert_eq!(votes.register("alice", "bob"), VoteOutcome::AlreadyVoted);
        assert_eq!(votes.count(), 1);
    }

    #[test]
    fn test_quorum_requires_three_distinct_voters() {
        let mut votes = SkipVotes::new(3);

        assert_eq!(votes.register("alice", "dave"), VoteOutcome::VoteAdded(1));
        assert_eq!(votes.register("bob", "dave"), VoteOutcome::VoteAdded(2));
        assert_eq!(votes.register("carol", "dave"), VoteOutcome::QuorumReached);
    }

    #[test]
    fn test_two_votes_do_not_reach_quorum() {
        let mut votes = SkipVotes::new(3);

        votes.register("alice", "dave");
        assert_eq!(votes.register("bob", "dave"), VoteOutcome::VoteAdded(2));
        assert_eq!(votes.count(), 2);
    }

    #[test]
    fn test_reset_allows_revoting() {
        let mut votes = SkipVotes::new(3);

        votes.register("alice", "dave");
        votes.reset();

        // After a reset (new active item) the same voter counts again
        assert_eq!(votes.register("alice", "dave"), VoteOutcome::VoteAdded(1));
    }
}
