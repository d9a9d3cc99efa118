//! Per-answer vote tally and the toggle rule.
//!
//! A user holds at most one direction per answer. Requesting the direction
//! already held retracts it; requesting the other direction switches. The
//! counters are always derived in the same step as `voted_by`, so
//! `upvotes`/`downvotes` equal the number of matching entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserId;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Outcome of applying a vote request to a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VoteChange {
    /// No prior vote; the direction was recorded.
    Cast { direction: VoteDirection },
    /// The same direction was requested again and removed.
    Retracted { direction: VoteDirection },
    /// The prior direction was replaced.
    Switched {
        from: VoteDirection,
        to: VoteDirection,
    },
}

impl VoteChange {
    /// Direction held by the user after the change.
    pub fn current(&self) -> Option<VoteDirection> {
        match *self {
            Self::Cast { direction } => Some(direction),
            Self::Retracted { .. } => None,
            Self::Switched { to, .. } => Some(to),
        }
    }
}

/// Aggregate votes on one answer.
///
/// # Examples
/// ```
/// use quorum::domain::{UserId, VoteDirection, VoteTally};
///
/// let user = UserId::new("u1").unwrap();
/// let mut tally = VoteTally::default();
/// tally.apply(&user, VoteDirection::Up);
/// tally.apply(&user, VoteDirection::Down);
/// assert_eq!((tally.upvotes, tally.downvotes), (0, 1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub upvotes: u32,
    pub downvotes: u32,
    #[schema(value_type = std::collections::BTreeMap<String, VoteDirection>)]
    pub voted_by: BTreeMap<UserId, VoteDirection>,
}

impl VoteTally {
    /// `upvotes - downvotes`.
    pub fn score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// Direction currently held by `user`, if any.
    pub fn direction_of(&self, user: &UserId) -> Option<VoteDirection> {
        self.voted_by.get(user).copied()
    }

    /// Apply a vote request from `user`, updating `voted_by` and counters.
    pub fn apply(&mut self, user: &UserId, requested: VoteDirection) -> VoteChange {
        match self.voted_by.get(user).copied() {
            None => {
                self.voted_by.insert(user.clone(), requested);
                self.increment(requested);
                VoteChange::Cast {
                    direction: requested,
                }
            }
            Some(prior) if prior == requested => {
                self.voted_by.remove(user);
                self.decrement(requested);
                VoteChange::Retracted {
                    direction: requested,
                }
            }
            Some(prior) => {
                self.voted_by.insert(user.clone(), requested);
                self.decrement(prior);
                self.increment(requested);
                VoteChange::Switched {
                    from: prior,
                    to: requested,
                }
            }
        }
    }

    /// Whether the counters agree with `voted_by`.
    pub fn is_consistent(&self) -> bool {
        let ups = self
            .voted_by
            .values()
            .filter(|d| **d == VoteDirection::Up)
            .count();
        let downs = self.voted_by.len() - ups;
        usize::try_from(self.upvotes).is_ok_and(|u| u == ups)
            && usize::try_from(self.downvotes).is_ok_and(|d| d == downs)
    }

    fn counter(&mut self, direction: VoteDirection) -> &mut u32 {
        match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        }
    }

    fn increment(&mut self, direction: VoteDirection) {
        let counter = self.counter(direction);
        *counter = counter.saturating_add(1);
    }

    fn decrement(&mut self, direction: VoteDirection) {
        let counter = self.counter(direction);
        *counter = counter.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use VoteDirection::{Down, Up};

    #[fixture]
    fn user() -> UserId {
        UserId::new("voter").expect("valid id")
    }

    #[rstest]
    fn up_then_up_then_down(user: UserId) {
        let mut tally = VoteTally::default();

        assert_eq!(tally.apply(&user, Up), VoteChange::Cast { direction: Up });
        assert_eq!((tally.upvotes, tally.downvotes), (1, 0));

        assert_eq!(tally.apply(&user, Up), VoteChange::Retracted { direction: Up });
        assert_eq!((tally.upvotes, tally.downvotes), (0, 0));
        assert_eq!(tally.direction_of(&user), None);

        assert_eq!(tally.apply(&user, Down), VoteChange::Cast { direction: Down });
        assert_eq!((tally.upvotes, tally.downvotes), (0, 1));
        assert_eq!(tally.direction_of(&user), Some(Down));
    }

    #[rstest]
    fn switching_moves_one_vote(user: UserId) {
        let mut tally = VoteTally::default();
        tally.apply(&user, Down);
        let change = tally.apply(&user, Up);
        assert_eq!(change, VoteChange::Switched { from: Down, to: Up });
        assert_eq!((tally.upvotes, tally.downvotes), (1, 0));
        assert_eq!(tally.score(), 1);
    }

    /// Replays the three-case rule by hand: the recorded direction is the last
    /// one that was not cancelled by an identical request.
    fn expected_direction(sequence: &[VoteDirection]) -> Option<VoteDirection> {
        sequence.iter().fold(None, |held, requested| match held {
            Some(prior) if prior == *requested => None,
            _ => Some(*requested),
        })
    }

    #[rstest]
    #[case(vec![Up])]
    #[case(vec![Up, Up, Up])]
    #[case(vec![Down, Up, Up, Down])]
    #[case(vec![Up, Down, Down, Down, Up, Up])]
    fn sequences_keep_counters_consistent(user: UserId, #[case] sequence: Vec<VoteDirection>) {
        let mut tally = VoteTally::default();
        for direction in &sequence {
            tally.apply(&user, *direction);
            assert!(tally.is_consistent());
        }
        let expected = expected_direction(&sequence);
        assert_eq!(tally.direction_of(&user), expected);
        assert_eq!(tally.upvotes, u32::from(expected == Some(Up)));
        assert_eq!(tally.downvotes, u32::from(expected == Some(Down)));
    }

    #[rstest]
    fn votes_from_different_users_accumulate() {
        let mut tally = VoteTally::default();
        for n in 0..3 {
            let voter = UserId::new(format!("u{n}")).expect("id");
            tally.apply(&voter, Up);
        }
        let dissenter = UserId::new("d").expect("id");
        tally.apply(&dissenter, Down);
        assert_eq!(tally.score(), 2);
        assert!(tally.is_consistent());
    }

    #[rstest]
    fn serialises_voted_by_as_lowercase_map(user: UserId) {
        let mut tally = VoteTally::default();
        tally.apply(&user, Down);
        let value = serde_json::to_value(&tally).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({"upvotes": 0, "downvotes": 1, "votedBy": {"voter": "down"}})
        );
    }
}
