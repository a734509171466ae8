/*!
Ballot preferences for ranked-choice (STV) elections.

Voters rank candidates with 1-based [RankVector]s. The counting service wants
[OrderGroups] (tie-groups of 0-based candidate indices) or 0-based [SimpleRanks]. This
crate converts between them ([codec]), collapses many ballots into weighted patterns
([aggregate()]), and wraps whole elections in portable text or URL-safe tokens
([snapshot]).

See the [manual] for the formats.
*/
mod config;

pub mod aggregate;
pub mod builder;
pub mod codec;
pub mod engine;
pub mod manual;
pub mod snapshot;

pub use crate::aggregate::{aggregate, total_votes, BallotGroup};
pub use crate::codec::{
    decode_ballot, encode_ballot, from_simple_ranks, order_to_rank, rank_to_order,
    to_simple_ranks, WireBallot, WireConvention,
};
pub use crate::config::*;
pub use crate::engine::{CountRequest, CountResult, Elected};
pub use crate::snapshot::{
    from_portable_text, from_shareable_handle, to_portable_text, to_portable_text_with,
    to_shareable_handle, SnapshotConvention,
};
