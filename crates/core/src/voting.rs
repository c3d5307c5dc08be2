//! Vote tallying and the closing policy.
//!
//! The policy is a pure function of an edit, its votes, and the current
//! time. It is evaluated after every vote and by the periodic closer.

use chrono::Duration;

use crate::edit::{Edit, EditVote, VoteType};
use crate::types::Timestamp;

/// Default voting period: two days.
pub const DEFAULT_VOTING_PERIOD_SECS: i64 = 2 * 24 * 60 * 60;

/// Default minimum voting period for destructive edits: four days.
pub const DEFAULT_MIN_DESTRUCTIVE_VOTING_PERIOD_SECS: i64 = 4 * 24 * 60 * 60;

/// Default net vote threshold.
pub const DEFAULT_VOTE_APPLICATION_THRESHOLD: i32 = 3;

/// Default number of times an author may revise a pending edit.
pub const DEFAULT_EDIT_UPDATE_LIMIT: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct VotingConfig {
    pub voting_period: Duration,
    pub min_destructive_voting_period: Duration,
    /// Net votes needed to close an edit. Zero disables vote-based closing.
    pub vote_application_threshold: i32,
    pub edit_update_limit: i32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            voting_period: Duration::seconds(DEFAULT_VOTING_PERIOD_SECS),
            min_destructive_voting_period: Duration::seconds(
                DEFAULT_MIN_DESTRUCTIVE_VOTING_PERIOD_SECS,
            ),
            vote_application_threshold: DEFAULT_VOTE_APPLICATION_THRESHOLD,
            edit_update_limit: DEFAULT_EDIT_UPDATE_LIMIT,
        }
    }
}

/// Outcome of evaluating the closing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingDecision {
    Open,
    Accept,
    Reject,
    ImmediateAccept,
    ImmediateReject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub accept: i32,
    pub reject: i32,
    pub abstain: i32,
    pub immediate_accept: bool,
    pub immediate_reject: bool,
}

impl VoteTally {
    pub fn from_votes(votes: &[EditVote]) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            match vote.vote {
                VoteType::Accept => tally.accept += 1,
                VoteType::Reject => tally.reject += 1,
                VoteType::Abstain => tally.abstain += 1,
                VoteType::ImmediateAccept => tally.immediate_accept = true,
                VoteType::ImmediateReject => tally.immediate_reject = true,
            }
        }
        tally
    }

    /// Accepts minus rejects.
    pub fn net(&self) -> i32 {
        self.accept - self.reject
    }
}

impl VotingConfig {
    /// Minimum age before the edit can close on ordinary votes.
    pub fn required_period(&self, destructive: bool) -> Duration {
        if destructive {
            self.min_destructive_voting_period.max(self.voting_period)
        } else {
            self.voting_period
        }
    }

    /// Earliest moment the edit can close on ordinary votes.
    pub fn closes_at(&self, edit: &Edit) -> Timestamp {
        edit.created_at + self.required_period(edit.is_destructive())
    }

    pub fn decide(&self, edit: &Edit, tally: &VoteTally, now: Timestamp) -> ClosingDecision {
        if !edit.is_pending() {
            return ClosingDecision::Open;
        }
        if tally.immediate_reject {
            return ClosingDecision::ImmediateReject;
        }
        if tally.immediate_accept {
            return ClosingDecision::ImmediateAccept;
        }
        if self.vote_application_threshold <= 0 {
            return ClosingDecision::Open;
        }
        if now <= self.closes_at(edit) {
            return ClosingDecision::Open;
        }
        let net = tally.net();
        if net >= self.vote_application_threshold {
            ClosingDecision::Accept
        } else if net <= -self.vote_application_threshold {
            ClosingDecision::Reject
        } else {
            ClosingDecision::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::edit::{EditStatus, Operation, TargetType};

    fn edit(operation: Operation, age: Duration) -> Edit {
        let created = Utc::now() - age;
        Edit {
            id: 1,
            user_id: 1,
            target_type: TargetType::Tag,
            operation,
            status: EditStatus::Pending,
            data: json!({}),
            vote_count: 0,
            applied: false,
            update_count: 0,
            created_at: created,
            updated_at: created,
            closed_at: None,
        }
    }

    fn tally(accept: i32, reject: i32) -> VoteTally {
        VoteTally {
            accept,
            reject,
            ..Default::default()
        }
    }

    #[test]
    fn young_edit_stays_open_regardless_of_votes() {
        let config = VotingConfig::default();
        let edit = edit(Operation::Modify, Duration::hours(1));
        assert_eq!(config.decide(&edit, &tally(10, 0), Utc::now()), ClosingDecision::Open);
    }

    #[test]
    fn aged_edit_closes_on_threshold() {
        let config = VotingConfig::default();
        let edit = edit(Operation::Modify, Duration::days(3));
        assert_eq!(config.decide(&edit, &tally(3, 0), Utc::now()), ClosingDecision::Accept);
        assert_eq!(config.decide(&edit, &tally(0, 3), Utc::now()), ClosingDecision::Reject);
        assert_eq!(config.decide(&edit, &tally(4, 2), Utc::now()), ClosingDecision::Open);
    }

    #[test]
    fn destructive_edit_waits_for_longer_period() {
        let config = VotingConfig::default();
        let young = edit(Operation::Destroy, Duration::days(3));
        assert_eq!(config.decide(&young, &tally(5, 0), Utc::now()), ClosingDecision::Open);

        let old = edit(Operation::Destroy, Duration::days(5));
        assert_eq!(config.decide(&old, &tally(5, 0), Utc::now()), ClosingDecision::Accept);
    }

    #[test]
    fn immediate_votes_close_at_once() {
        let config = VotingConfig::default();
        let edit = edit(Operation::Destroy, Duration::minutes(1));
        let accept = VoteTally {
            immediate_accept: true,
            ..Default::default()
        };
        assert_eq!(config.decide(&edit, &accept, Utc::now()), ClosingDecision::ImmediateAccept);

        let both = VoteTally {
            immediate_accept: true,
            immediate_reject: true,
            ..Default::default()
        };
        assert_eq!(config.decide(&edit, &both, Utc::now()), ClosingDecision::ImmediateReject);
    }

    #[test]
    fn zero_threshold_disables_vote_closing() {
        let config = VotingConfig {
            vote_application_threshold: 0,
            ..Default::default()
        };
        let edit = edit(Operation::Modify, Duration::days(30));
        assert_eq!(config.decide(&edit, &tally(50, 0), Utc::now()), ClosingDecision::Open);
    }

    #[test]
    fn closed_edit_is_never_decided_again() {
        let config = VotingConfig::default();
        let mut edit = edit(Operation::Modify, Duration::days(3));
        edit.status = EditStatus::Rejected;
        assert_eq!(config.decide(&edit, &tally(5, 0), Utc::now()), ClosingDecision::Open);
    }
}
