// ********* Ranks ***********

use std::fmt::Display;
use std::num::{NonZeroU32, NonZeroU64};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Candidates are identified by their 0-based position in the election.
pub type CandidateIndex = usize;

/// A voter-facing rank. `1` is the most preferred choice.
///
/// Ranks are never zero. Crossing into the 0-based wire conventions must go
/// through [Rank::to_zero_based].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(NonZeroU32);

impl Rank {
    pub const FIRST: Rank = Rank(NonZeroU32::MIN);

    /// Returns `None` for 0.
    pub fn new(value: u32) -> Option<Rank> {
        NonZeroU32::new(value).map(Rank)
    }

    /// The rank held by the tie-group at the given 0-based position.
    pub fn from_position(position: usize) -> Rank {
        let p = u32::try_from(position).unwrap_or(u32::MAX);
        Rank(NonZeroU32::MIN.saturating_add(p))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The 0-based position of the tie-group holding this rank.
    pub fn position(self) -> usize {
        (self.0.get() - 1) as usize
    }

    pub fn to_zero_based(self) -> ZeroBasedRank {
        ZeroBasedRank(self.0.get() - 1)
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rank in the 0-based "simple ranks" wire format. `0` is the most preferred choice.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZeroBasedRank(pub u32);

impl ZeroBasedRank {
    pub fn to_one_based(self) -> Rank {
        Rank(NonZeroU32::MIN.saturating_add(self.0))
    }
}

// ********* Preference structures ***********

/// One optional rank per candidate, in candidate order.
///
/// Ties (two candidates with the same rank) and gaps (ranks 1 and 3 without a 2) are
/// both legal. Equality and hashing cover the full slot sequence, which makes the
/// vector usable directly as a grouping key.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankVector(pub(crate) Vec<Option<Rank>>);

impl RankVector {
    /// A vector where no candidate is ranked.
    pub fn unranked(candidate_count: usize) -> RankVector {
        RankVector(vec![None; candidate_count])
    }

    pub fn from_ranks(ranks: Vec<Option<Rank>>) -> RankVector {
        RankVector(ranks)
    }

    /// Builds a vector from raw 1-based values. Fails on a rank of 0.
    pub fn from_values(values: &[Option<u32>]) -> BallotResult<RankVector> {
        let mut ranks: Vec<Option<Rank>> = Vec::with_capacity(values.len());
        for v in values.iter() {
            match v {
                Some(x) => ranks.push(Some(Rank::new(*x).ok_or(BallotError::InvalidRank {})?)),
                None => ranks.push(None),
            }
        }
        Ok(RankVector(ranks))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The rank of a candidate. Unknown candidates are reported as unranked.
    pub fn get(&self, candidate: CandidateIndex) -> Option<Rank> {
        self.0.get(candidate).cloned().flatten()
    }

    pub fn set(&mut self, candidate: CandidateIndex, rank: Option<Rank>) -> BallotResult<()> {
        let candidate_count = self.0.len();
        let slot = self.0.get_mut(candidate).ok_or(BallotError::UnknownCandidate {
            index: candidate,
            candidate_count,
        })?;
        *slot = rank;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Rank>> + '_ {
        self.0.iter().cloned()
    }

    pub fn as_slice(&self) -> &[Option<Rank>] {
        &self.0
    }

    /// True when no candidate holds a rank.
    pub fn is_abstention(&self) -> bool {
        self.0.iter().all(|r| r.is_none())
    }

    pub(crate) fn push_unranked(&mut self) {
        self.0.push(None);
    }

    pub(crate) fn remove(&mut self, candidate: CandidateIndex) {
        if candidate < self.0.len() {
            self.0.remove(candidate);
        }
    }
}

/// Per-candidate ranks in the 0-based wire convention.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimpleRanks(pub Vec<Option<ZeroBasedRank>>);

impl SimpleRanks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tie-groups of candidates, most preferred first.
///
/// The group at position `p` holds the candidates ranked `p + 1`. Groups may be empty,
/// and unranked candidates appear in no group.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderGroups(Vec<Vec<CandidateIndex>>);

impl OrderGroups {
    pub fn new(groups: Vec<Vec<CandidateIndex>>) -> OrderGroups {
        OrderGroups(groups)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> &[Vec<CandidateIndex>] {
        &self.0
    }

    /// The groups together with the rank they stand for.
    pub fn ranked_groups(&self) -> impl Iterator<Item = (Rank, &[CandidateIndex])> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(p, g)| (Rank::from_position(p), g.as_slice()))
    }
}

impl From<Vec<Vec<CandidateIndex>>> for OrderGroups {
    fn from(groups: Vec<Vec<CandidateIndex>>) -> OrderGroups {
        OrderGroups(groups)
    }
}

// ********* Ballots and elections ***********

/// The number of voters a ballot stands for. Never zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Votes(NonZeroU64);

impl Votes {
    pub const ONE: Votes = Votes(NonZeroU64::MIN);

    /// Returns `None` for 0.
    pub fn new(value: u64) -> Option<Votes> {
        NonZeroU64::new(value).map(Votes)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    pub fn checked_add(self, other: Votes) -> Option<Votes> {
        self.0.checked_add(other.get()).map(Votes)
    }
}

impl Display for Votes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Votes {
    type Error = BallotError;

    fn try_from(value: u64) -> BallotResult<Votes> {
        Votes::new(value).ok_or(BallotError::InvalidWeight {})
    }
}

pub(crate) fn default_votes() -> Votes {
    Votes::ONE
}

/// Adds up weights, failing instead of wrapping around.
pub(crate) fn sum_votes<I>(weights: I) -> BallotResult<u64>
where
    I: IntoIterator<Item = Votes>,
{
    let mut total: u64 = 0;
    for w in weights {
        total = total
            .checked_add(w.get())
            .ok_or(BallotError::WeightOverflow {})?;
    }
    Ok(total)
}

/// A weighted ranking. `votes` is the number of voters this ballot stands for.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(default = "default_votes")]
    pub votes: Votes,
    pub ranks: RankVector,
}

impl Ballot {
    /// A fresh ballot: one vote, nobody ranked.
    pub fn new(candidate_count: usize) -> Ballot {
        Ballot {
            votes: Votes::ONE,
            ranks: RankVector::unranked(candidate_count),
        }
    }

    pub fn with_ranks(ranks: RankVector, votes: Votes) -> Ballot {
        Ballot { votes, ranks }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub candidates: Vec<String>,
    pub seats: u32,
    /// Whether the elected seats are ranked 1..k or form an unordered set.
    pub ordered_seats: bool,
    pub ballots: Vec<Ballot>,
}

impl Election {
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Sum of the votes over all the ballots.
    pub fn total_votes(&self) -> BallotResult<u64> {
        sum_votes(self.ballots.iter().map(|b| b.votes))
    }
}

// ********* Errors **********

/// Errors raised by the codec, the serializer and the election editing operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BallotError {
    #[snafu(display(
        "order references candidate {index}, but the election has {candidate_count} candidates"
    ))]
    MalformedOrder {
        index: usize,
        candidate_count: usize,
    },
    #[snafu(display("expected {expected} ranks, found {found}"))]
    LengthMismatch { expected: usize, found: usize },
    #[snafu(display("candidate {index} does not exist ({candidate_count} candidates)"))]
    UnknownCandidate {
        index: usize,
        candidate_count: usize,
    },
    #[snafu(display("ballot {index} does not exist ({ballot_count} ballots)"))]
    UnknownBallot { index: usize, ballot_count: usize },
    #[snafu(display("ranks start at 1"))]
    InvalidRank {},
    #[snafu(display("a ballot counts for at least one vote"))]
    InvalidWeight {},
    #[snafu(display("the number of votes does not fit in 64 bits"))]
    WeightOverflow {},

    #[snafu(display("election text is not well-formed: {source}"))]
    Parse { source: serde_json::Error },
    #[snafu(display("not an election: {message}"))]
    Schema { message: String },
    #[snafu(display("not an election: {source}"))]
    SchemaShape { source: serde_json::Error },
    #[snafu(display("cannot decode shareable handle: {message}"))]
    Decode { message: String },
    #[snafu(display("cannot encode election"))]
    EncodeJson { source: serde_json::Error },
    #[snafu(display("cannot compress election"))]
    Compress { source: std::io::Error },

    #[snafu(display("invalid counting result: {message}"))]
    InvalidResult { message: String },
}

pub type BallotResult<T> = Result<T, BallotError>;
