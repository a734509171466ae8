use snafu::prelude::*;

use crate::codec::order_to_rank;
pub use crate::config::*;

/// A builder for elections.
///
/// ```
/// pub use stv_ballots::builder::Builder;
/// # use stv_ballots::BallotError;
///
/// let mut builder = Builder::new(2)
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_ballot_simple(&[Some(1), None, Some(2)])?;
/// builder.add_ballot(&[Some(2), Some(1), Some(1)], 12)?;
///
/// let election = builder.build();
/// assert_eq!(election.total_votes()?, 13);
/// # Ok::<(), BallotError>(())
/// ```
pub struct Builder {
    pub(crate) _candidates: Vec<String>,
    pub(crate) _seats: u32,
    pub(crate) _ordered_seats: bool,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(seats: u32) -> Builder {
        Builder {
            _candidates: Vec::new(),
            _seats: seats,
            _ordered_seats: false,
            _ballots: Vec::new(),
        }
    }

    /// Sets the candidates. Ballots added before are dropped, since their ranks no longer
    /// line up with the candidates.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, BallotError> {
        Ok(Builder {
            _candidates: cands.to_vec(),
            _seats: self._seats,
            _ordered_seats: self._ordered_seats,
            _ballots: Vec::new(),
        })
    }

    pub fn ordered_seats(self, ordered: bool) -> Builder {
        Builder {
            _ordered_seats: ordered,
            ..self
        }
    }

    /// Adds a ballot that counts for a single voter.
    pub fn add_ballot_simple(&mut self, ranks: &[Option<u32>]) -> Result<(), BallotError> {
        self.add_ballot(ranks, 1)
    }

    /// Adds a ballot with a weight attached to it.
    ///
    /// ranks: one entry per candidate, 1 for the most preferred candidate and `None` for
    /// candidates left unranked. Ranks may be tied or skip values.
    /// votes: at least 1.
    pub fn add_ballot(&mut self, ranks: &[Option<u32>], votes: u64) -> Result<(), BallotError> {
        let votes = Votes::try_from(votes)?;
        ensure!(
            ranks.len() == self._candidates.len(),
            LengthMismatchSnafu {
                expected: self._candidates.len(),
                found: ranks.len()
            }
        );
        let rv = RankVector::from_values(ranks)?;
        self._ballots.push(Ballot::with_ranks(rv, votes));
        Ok(())
    }

    /// Adds a ballot given as tie-groups of candidate indices, best first.
    pub fn add_ballot_order(&mut self, order: &OrderGroups, votes: u64) -> Result<(), BallotError> {
        let votes = Votes::try_from(votes)?;
        let rv = order_to_rank(order, self._candidates.len())?;
        self._ballots.push(Ballot::with_ranks(rv, votes));
        Ok(())
    }

    pub fn build(self) -> Election {
        Election {
            candidates: self._candidates,
            seats: self._seats,
            ordered_seats: self._ordered_seats,
            ballots: self._ballots,
        }
    }
}

// ********* Editing **********

// The election being edited is owned by the caller and changed through these methods;
// every ballot keeps exactly one slot per candidate.
impl Election {
    /// Adds a candidate at the end of the list. Existing ballots leave it unranked.
    pub fn add_candidate(&mut self, name: &str) {
        self.candidates.push(name.to_string());
        for b in self.ballots.iter_mut() {
            b.ranks.push_unranked();
        }
    }

    /// Removes a candidate and its slot in every ballot.
    ///
    /// The seat count is clamped to the new number of candidates.
    pub fn remove_candidate(&mut self, candidate: CandidateIndex) -> BallotResult<String> {
        self.check_candidate(candidate)?;
        let name = self.candidates.remove(candidate);
        for b in self.ballots.iter_mut() {
            b.ranks.remove(candidate);
        }
        self.set_seats(self.seats);
        Ok(name)
    }

    pub fn rename_candidate(&mut self, candidate: CandidateIndex, name: &str) -> BallotResult<()> {
        self.check_candidate(candidate)?;
        self.candidates[candidate] = name.to_string();
        Ok(())
    }

    /// Sets the number of seats, kept between 1 and the number of candidates.
    pub fn set_seats(&mut self, seats: u32) {
        let max_seats = u32::try_from(self.candidates.len())
            .unwrap_or(u32::MAX)
            .max(1);
        self.seats = seats.clamp(1, max_seats);
    }

    /// Appends a fresh ballot (one vote, nobody ranked) and returns its position.
    pub fn add_ballot(&mut self) -> usize {
        self.ballots.push(Ballot::new(self.candidates.len()));
        self.ballots.len() - 1
    }

    pub fn remove_ballot(&mut self, ballot: usize) -> BallotResult<Ballot> {
        self.check_ballot(ballot)?;
        Ok(self.ballots.remove(ballot))
    }

    pub fn set_ballot_votes(&mut self, ballot: usize, votes: u64) -> BallotResult<()> {
        self.check_ballot(ballot)?;
        self.ballots[ballot].votes = Votes::try_from(votes)?;
        Ok(())
    }

    pub fn set_rank(
        &mut self,
        ballot: usize,
        candidate: CandidateIndex,
        rank: Option<Rank>,
    ) -> BallotResult<()> {
        self.check_ballot(ballot)?;
        self.ballots[ballot].ranks.set(candidate, rank)
    }

    /// Checks that every ballot has one slot per candidate.
    pub fn validate(&self) -> BallotResult<()> {
        for b in self.ballots.iter() {
            ensure!(
                b.ranks.len() == self.candidates.len(),
                LengthMismatchSnafu {
                    expected: self.candidates.len(),
                    found: b.ranks.len()
                }
            );
        }
        Ok(())
    }

    fn check_candidate(&self, candidate: CandidateIndex) -> BallotResult<()> {
        ensure!(
            candidate < self.candidates.len(),
            UnknownCandidateSnafu {
                index: candidate,
                candidate_count: self.candidates.len()
            }
        );
        Ok(())
    }

    fn check_ballot(&self, ballot: usize) -> BallotResult<()> {
        ensure!(
            ballot < self.ballots.len(),
            UnknownBallotSnafu {
                index: ballot,
                ballot_count: self.ballots.len()
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Election {
        let mut builder = Builder::new(3)
            .candidates(&names(&["Ana", "Rodrigo", "Sara", "Tiago"]))
            .unwrap()
            .ordered_seats(true);
        builder
            .add_ballot(&[Some(3), Some(2), None, Some(1)], 10)
            .unwrap();
        builder
            .add_ballot(&[Some(4), Some(2), Some(1), Some(3)], 5)
            .unwrap();
        builder.build()
    }

    #[test]
    fn builder_checks_ballots() {
        let mut builder = Builder::new(1).candidates(&names(&["A", "B"])).unwrap();
        assert!(matches!(
            builder.add_ballot_simple(&[Some(1)]),
            Err(BallotError::LengthMismatch { .. })
        ));
        assert!(matches!(
            builder.add_ballot_simple(&[Some(0), None]),
            Err(BallotError::InvalidRank {})
        ));
        assert!(matches!(
            builder.add_ballot_order(&OrderGroups::new(vec![vec![2]]), 1),
            Err(BallotError::MalformedOrder { .. })
        ));
        builder
            .add_ballot_order(&OrderGroups::new(vec![vec![1], vec![0]]), 2)
            .unwrap();
        let e = builder.build();
        assert_eq!(
            e.ballots,
            vec![Ballot::with_ranks(
                RankVector::from_values(&[Some(2), Some(1)]).unwrap(),
                Votes::new(2).unwrap()
            )]
        );
        assert!(!e.ordered_seats);
    }

    #[test]
    fn ballots_need_a_vote() {
        let mut builder = Builder::new(1).candidates(&names(&["A", "B"])).unwrap();
        assert!(matches!(
            builder.add_ballot(&[Some(1), None], 0),
            Err(BallotError::InvalidWeight {})
        ));
        assert!(matches!(
            builder.add_ballot_order(&OrderGroups::new(vec![vec![0]]), 0),
            Err(BallotError::InvalidWeight {})
        ));
        let mut e = builder.build();
        assert!(e.ballots.is_empty());
        let idx = e.add_ballot();
        assert!(matches!(
            e.set_ballot_votes(idx, 0),
            Err(BallotError::InvalidWeight {})
        ));
        assert_eq!(e.ballots[idx].votes, Votes::ONE);
    }

    #[test]
    fn vote_totals_that_overflow() {
        let mut builder = Builder::new(1).candidates(&names(&["A", "B"])).unwrap();
        builder.add_ballot(&[Some(1), None], u64::MAX).unwrap();
        builder.add_ballot(&[None, Some(1)], 1).unwrap();
        let e = builder.build();
        assert!(matches!(
            e.total_votes(),
            Err(BallotError::WeightOverflow {})
        ));
    }

    #[test]
    fn adding_and_removing_candidates() {
        let mut e = sample();
        e.add_candidate("Candidate 5");
        assert_eq!(e.candidate_count(), 5);
        assert!(e.ballots.iter().all(|b| b.ranks.len() == 5));
        assert_eq!(e.ballots[0].ranks.get(4), None);
        e.validate().unwrap();

        let removed = e.remove_candidate(0).unwrap();
        assert_eq!(removed, "Ana");
        assert_eq!(
            e.ballots[0].ranks,
            RankVector::from_values(&[Some(2), None, Some(1), None]).unwrap()
        );
        assert!(matches!(
            e.remove_candidate(7),
            Err(BallotError::UnknownCandidate { .. })
        ));
    }

    #[test]
    fn seats_are_clamped() {
        let mut e = sample();
        e.set_seats(0);
        assert_eq!(e.seats, 1);
        e.set_seats(9);
        assert_eq!(e.seats, 4);
        e.remove_candidate(3).unwrap();
        e.remove_candidate(2).unwrap();
        assert_eq!(e.seats, 2);
    }

    #[test]
    fn editing_ballots() {
        let mut e = sample();
        let idx = e.add_ballot();
        assert_eq!(e.ballots[idx], Ballot::new(4));
        e.set_rank(idx, 2, Rank::new(1)).unwrap();
        e.set_ballot_votes(idx, 7).unwrap();
        assert_eq!(e.ballots[idx].ranks.get(2), Rank::new(1));
        assert_eq!(e.total_votes().unwrap(), 22);

        assert!(matches!(
            e.set_rank(idx, 4, None),
            Err(BallotError::UnknownCandidate { .. })
        ));
        assert!(matches!(
            e.set_ballot_votes(9, 1),
            Err(BallotError::UnknownBallot { .. })
        ));
        let removed = e.remove_ballot(0).unwrap();
        assert_eq!(removed.votes.get(), 10);
        e.rename_candidate(1, "Rod").unwrap();
        assert_eq!(e.candidates[1], "Rod");
    }
}
