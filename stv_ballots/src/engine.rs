//! The request and response exchanged with the remote counting service.
//!
//! The counting itself (Meek's method, Droop quota, Copeland ordering of the final
//! ranking) happens on the service. This module only shapes the payload and checks
//! what comes back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::codec::{decode_ballot, encode_ballot, WireBallot, WireConvention};
use crate::config::*;

/// The election as sent to the counting service.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CountRequest {
    pub candidates: Vec<String>,
    pub seats: u32,
    pub ballots: Vec<WireBallot>,
}

impl CountRequest {
    pub fn from_election(election: &Election, convention: WireConvention) -> CountRequest {
        let candidate_count = election.candidate_count();
        CountRequest {
            candidates: election.candidates.clone(),
            seats: election.seats,
            ballots: election
                .ballots
                .iter()
                .map(|b| encode_ballot(b, convention, candidate_count))
                .collect(),
        }
    }

    /// Converts the stored ballots back to voter-facing ranks.
    pub fn to_election(&self, ordered_seats: bool) -> BallotResult<Election> {
        let candidate_count = self.candidates.len();
        let mut ballots: Vec<Ballot> = Vec::with_capacity(self.ballots.len());
        for wb in self.ballots.iter() {
            ballots.push(decode_ballot(wb, candidate_count)?);
        }
        Ok(Election {
            candidates: self.candidates.clone(),
            seats: self.seats,
            ordered_seats,
            ballots,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Elected {
    /// Index of the candidate in the election.
    pub id: CandidateIndex,
    pub candidate: String,
}

/// The outcome returned by the counting service.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CountResult {
    /// Human-readable trace of the count.
    pub log: String,
    /// The elected candidates, in seat order when seats are ordered.
    pub elected: Vec<Elected>,
    /// Final 0-based position of each candidate.
    #[serde(default)]
    pub order: BTreeMap<CandidateIndex, usize>,
    /// `pairwise_matrix[i][j]`: number of voters preferring candidate i over candidate j.
    #[serde(default)]
    pub pairwise_matrix: Vec<Vec<u64>>,
    /// The ballots the count was run on, when the service sends them back.
    #[serde(default)]
    pub election: Option<CountRequest>,
}

impl CountResult {
    pub fn validate(&self, candidate_count: usize) -> BallotResult<()> {
        for e in self.elected.iter() {
            ensure!(
                e.id < candidate_count,
                InvalidResultSnafu {
                    message: format!("elected candidate {} does not exist", e.id)
                }
            );
        }
        for (cid, pos) in self.order.iter() {
            ensure!(
                *cid < candidate_count && *pos < candidate_count,
                InvalidResultSnafu {
                    message: format!("candidate {} cannot be at position {}", cid, pos)
                }
            );
        }
        if !self.pairwise_matrix.is_empty() {
            let square = self.pairwise_matrix.len() == candidate_count
                && self
                    .pairwise_matrix
                    .iter()
                    .all(|row| row.len() == candidate_count);
            ensure!(
                square,
                InvalidResultSnafu {
                    message: format!(
                        "the pairwise matrix is not {}x{}",
                        candidate_count, candidate_count
                    )
                }
            );
        }
        Ok(())
    }

    /// Candidates from first to last final position. Candidates at the same position
    /// keep their election order; candidates without a position are not listed.
    pub fn final_ranking(&self) -> Vec<CandidateIndex> {
        let mut ranking: Vec<(usize, CandidateIndex)> =
            self.order.iter().map(|(cid, pos)| (*pos, *cid)).collect();
        ranking.sort();
        ranking.into_iter().map(|(_, cid)| cid).collect()
    }

    /// The election the count was run on, with voter-facing ranks.
    pub fn replay_election(&self, ordered_seats: bool) -> BallotResult<Option<Election>> {
        self.election
            .as_ref()
            .map(|req| req.to_election(ordered_seats))
            .transpose()
    }
}
