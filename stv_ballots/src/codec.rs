//! Conversions between the voter-facing [RankVector] and the engine-facing
//! representations ([OrderGroups] and the 0-based [SimpleRanks]).

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::config::*;

/// Builds the tie-groups for a ranking.
///
/// The result always has `candidate_count` groups: group `p` holds, in candidate order,
/// the candidates ranked `p + 1`. Unranked candidates, and ranks above
/// `candidate_count`, end up in no group.
///
/// ```
/// use stv_ballots::{codec::rank_to_order, RankVector};
///
/// let ranks = RankVector::from_values(&[Some(3), Some(2), None, Some(1)])?;
/// let order = rank_to_order(&ranks, 4);
/// assert_eq!(order.groups(), &[vec![3], vec![1], vec![0], vec![]]);
/// # Ok::<(), stv_ballots::BallotError>(())
/// ```
pub fn rank_to_order(ranks: &RankVector, candidate_count: usize) -> OrderGroups {
    let mut groups: Vec<Vec<CandidateIndex>> = vec![Vec::new(); candidate_count];
    for (cid, rank) in ranks.iter().enumerate().take(candidate_count) {
        if let Some(r) = rank {
            if let Some(group) = groups.get_mut(r.position()) {
                group.push(cid);
            }
        }
    }
    OrderGroups::new(groups)
}

/// Recovers a ranking from tie-groups.
///
/// The order does not need to have one group per candidate: engines may return a
/// compacted sequence. A candidate listed in several groups keeps the last rank seen.
pub fn order_to_rank(order: &OrderGroups, candidate_count: usize) -> BallotResult<RankVector> {
    let mut ranks = RankVector::unranked(candidate_count);
    for (rank, group) in order.ranked_groups() {
        for &cid in group {
            ensure!(
                cid < candidate_count,
                MalformedOrderSnafu {
                    index: cid,
                    candidate_count
                }
            );
            ranks.0[cid] = Some(rank);
        }
    }
    Ok(ranks)
}

/// Shifts 1-based ranks to the 0-based wire convention.
pub fn to_simple_ranks(ranks: &RankVector) -> SimpleRanks {
    SimpleRanks(ranks.iter().map(|r| r.map(Rank::to_zero_based)).collect())
}

/// Shifts 0-based wire ranks back to 1-based ranks.
pub fn from_simple_ranks(simple: &SimpleRanks) -> RankVector {
    RankVector::from_ranks(
        simple
            .0
            .iter()
            .map(|r| r.map(ZeroBasedRank::to_one_based))
            .collect(),
    )
}

// ********* Wire ballots **********

/// The encoding used for ballots crossing into storage or the counting engine.
///
/// Deployments disagree on this, so callers always name the one they encode into.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum WireConvention {
    /// One 0-based rank (or `null`) per candidate.
    #[serde(rename = "ranks")]
    SimpleRanks,
    /// Tie-groups of 0-based candidate indices.
    #[serde(rename = "order")]
    OrderGroups,
}

impl Display for WireConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireConvention::SimpleRanks => write!(f, "ranks"),
            WireConvention::OrderGroups => write!(f, "order"),
        }
    }
}

impl FromStr for WireConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<WireConvention, String> {
        match s {
            "ranks" | "simple" => Ok(WireConvention::SimpleRanks),
            "order" => Ok(WireConvention::OrderGroups),
            x => Err(format!("unknown wire convention: {:?}", x)),
        }
    }
}

/// A ballot as stored by the ballot service or sent to the counting engine.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBallot {
    Order {
        #[serde(default = "default_votes")]
        votes: Votes,
        order: OrderGroups,
    },
    // A stored ballot that was never filled in may come back with null ranks.
    Ranks {
        #[serde(default = "default_votes")]
        votes: Votes,
        #[serde(default)]
        ranks: Option<SimpleRanks>,
    },
}

impl WireBallot {
    /// Reads one ballot. A ballot carrying both `order` and `ranks` is rejected rather
    /// than silently dropping one of them.
    pub fn from_value(js: JSValue) -> BallotResult<WireBallot> {
        check_single_convention(&js)?;
        serde_json::from_value(js).context(SchemaShapeSnafu {})
    }

    pub fn votes(&self) -> Votes {
        match self {
            WireBallot::Order { votes, .. } => *votes,
            WireBallot::Ranks { votes, .. } => *votes,
        }
    }

    pub fn convention(&self) -> WireConvention {
        match self {
            WireBallot::Order { .. } => WireConvention::OrderGroups,
            WireBallot::Ranks { .. } => WireConvention::SimpleRanks,
        }
    }
}

pub(crate) fn check_single_convention(js: &JSValue) -> BallotResult<()> {
    if let Some(obj) = js.as_object() {
        ensure!(
            !(obj.contains_key("order") && obj.contains_key("ranks")),
            SchemaSnafu {
                message: "a ballot has both `order` and `ranks`"
            }
        );
    }
    Ok(())
}

pub fn encode_ballot(
    ballot: &Ballot,
    convention: WireConvention,
    candidate_count: usize,
) -> WireBallot {
    match convention {
        WireConvention::SimpleRanks => WireBallot::Ranks {
            votes: ballot.votes,
            ranks: Some(to_simple_ranks(&ballot.ranks)),
        },
        WireConvention::OrderGroups => WireBallot::Order {
            votes: ballot.votes,
            order: rank_to_order(&ballot.ranks, candidate_count),
        },
    }
}

pub fn decode_ballot(wire: &WireBallot, candidate_count: usize) -> BallotResult<Ballot> {
    match wire {
        WireBallot::Order { votes, order } => Ok(Ballot::with_ranks(
            order_to_rank(order, candidate_count)?,
            *votes,
        )),
        WireBallot::Ranks {
            votes,
            ranks: Some(simple),
        } => {
            ensure!(
                simple.len() == candidate_count,
                LengthMismatchSnafu {
                    expected: candidate_count,
                    found: simple.len()
                }
            );
            Ok(Ballot::with_ranks(from_simple_ranks(simple), *votes))
        }
        WireBallot::Ranks { votes, ranks: None } => Ok(Ballot::with_ranks(
            RankVector::unranked(candidate_count),
            *votes,
        )),
    }
}
