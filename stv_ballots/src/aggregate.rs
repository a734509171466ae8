//! Collapsing individually cast ballots into weighted preference patterns.

use log::debug;

use snafu::prelude::*;

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::codec::rank_to_order;
use crate::config::*;

/// A class of ballots sharing the exact same ranking.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotGroup<Id> {
    pub ranks: RankVector,
    /// Sum of the votes of every ballot in the group.
    pub votes: Votes,
    /// The ballots that make up this group, in the order they were encountered.
    pub ballot_ids: Vec<Id>,
}

impl<Id> BallotGroup<Id> {
    pub fn order(&self, candidate_count: usize) -> OrderGroups {
        rank_to_order(&self.ranks, candidate_count)
    }

    /// The group as a single weighted ballot.
    pub fn to_ballot(&self) -> Ballot {
        Ballot::with_ranks(self.ranks.clone(), self.votes)
    }

    pub fn is_abstention(&self) -> bool {
        self.ranks.is_abstention()
    }
}

/// Groups ballots with identical rankings.
///
/// Works with any collection of `(id, ballot)` pairs, typically a map from ballot
/// identifier to ballot. Groups come out by decreasing number of votes. Groups with the
/// same number of votes keep the order in which their first ballot was seen, so callers
/// who need an order independent of the input should pass a sorted collection
/// (a `BTreeMap` for instance).
///
/// Ballots where nobody is ranked form their own group like any other pattern. Fails
/// with [BallotError::WeightOverflow] when the votes of a group do not fit in a `u64`.
///
/// ```
/// use std::collections::BTreeMap;
/// use stv_ballots::{aggregate, Ballot, RankVector, Votes};
///
/// let mut ballots: BTreeMap<&str, Ballot> = BTreeMap::new();
/// ballots.insert("a", Ballot::with_ranks(RankVector::from_values(&[Some(1), None])?, Votes::ONE));
/// ballots.insert("b", Ballot::with_ranks(RankVector::from_values(&[None, Some(1)])?, Votes::ONE));
/// ballots.insert("c", Ballot::with_ranks(RankVector::from_values(&[None, Some(1)])?, Votes::ONE));
///
/// let groups = aggregate(&ballots)?;
/// assert_eq!(groups[0].votes.get(), 2);
/// assert_eq!(groups[0].ballot_ids, vec!["b", "c"]);
/// # Ok::<(), stv_ballots::BallotError>(())
/// ```
pub fn aggregate<'a, Id, I>(ballots: I) -> BallotResult<Vec<BallotGroup<Id>>>
where
    I: IntoIterator<Item = (&'a Id, &'a Ballot)>,
    Id: Clone + 'a,
{
    let mut groups: Vec<BallotGroup<Id>> = Vec::new();
    let mut group_by_ranks: HashMap<&'a RankVector, usize> = HashMap::new();
    let mut num_ballots: usize = 0;

    for (id, ballot) in ballots {
        num_ballots += 1;
        if let Some(&idx) = group_by_ranks.get(&ballot.ranks) {
            let group = &mut groups[idx];
            group.votes = group
                .votes
                .checked_add(ballot.votes)
                .context(WeightOverflowSnafu {})?;
            group.ballot_ids.push(id.clone());
        } else {
            group_by_ranks.insert(&ballot.ranks, groups.len());
            groups.push(BallotGroup {
                ranks: ballot.ranks.clone(),
                votes: ballot.votes,
                ballot_ids: vec![id.clone()],
            });
        }
    }

    // Stable: equal weights stay in first-seen order.
    groups.sort_by_key(|g| Reverse(g.votes));
    debug!(
        "aggregate: {:?} ballots collapsed into {:?} groups",
        num_ballots,
        groups.len()
    );
    Ok(groups)
}

/// Total number of votes across all the groups.
pub fn total_votes<Id>(groups: &[BallotGroup<Id>]) -> BallotResult<u64> {
    sum_votes(groups.iter().map(|g| g.votes))
}

impl Election {
    /// The distinct ranking patterns of this election. Ballots are identified by their
    /// position in the election.
    pub fn ballot_groups(&self) -> BallotResult<Vec<BallotGroup<usize>>> {
        let positions: Vec<usize> = (0..self.ballots.len()).collect();
        aggregate(positions.iter().zip(self.ballots.iter()))
    }

    /// The same election, with one weighted ballot per distinct ranking pattern.
    pub fn aggregated(&self) -> BallotResult<Election> {
        Ok(Election {
            candidates: self.candidates.clone(),
            seats: self.seats,
            ordered_seats: self.ordered_seats,
            ballots: self
                .ballot_groups()?
                .iter()
                .map(BallotGroup::to_ballot)
                .collect(),
        })
    }
}
