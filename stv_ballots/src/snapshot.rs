//! Portable text and shareable handles for elections.
//!
//! The portable text is pretty-printed JSON with a fixed field order (`candidates`,
//! `seats`, `ordered_seats`, `ballots`), so that serializing the same election always
//! produces the same bytes. The shareable handle is the portable text compressed with
//! zlib and encoded with the URL-safe base64 alphabet, small enough to travel in a URL
//! query parameter.

use log::debug;

use std::io::Write;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::codec::{check_single_convention, order_to_rank, rank_to_order};
use crate::config::*;

/// Upper bound on the size of a decompressed handle.
pub const MAX_SNAPSHOT_BYTES: usize = 16 * 1024 * 1024;

const REQUIRED_FIELDS: [&str; 3] = ["candidates", "seats", "ballots"];

/// How ballots are written in the portable text.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum SnapshotConvention {
    /// `{"votes": 10, "ranks": [3, 2, null, 1]}`, 1-based.
    #[default]
    Ranks,
    /// `{"votes": 10, "order": [[3], [1], [0], []]}`
    Order,
}

#[derive(Serialize, Deserialize)]
struct ElectionDocument {
    candidates: Vec<String>,
    seats: u32,
    #[serde(default)]
    ordered_seats: bool,
    ballots: Vec<DocumentBallot>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DocumentBallot {
    Order {
        #[serde(default = "default_votes")]
        votes: Votes,
        order: OrderGroups,
    },
    Ranks {
        #[serde(default = "default_votes")]
        votes: Votes,
        ranks: RankVector,
    },
}

impl ElectionDocument {
    fn from_election(election: &Election, convention: SnapshotConvention) -> ElectionDocument {
        let candidate_count = election.candidate_count();
        ElectionDocument {
            candidates: election.candidates.clone(),
            seats: election.seats,
            ordered_seats: election.ordered_seats,
            ballots: election
                .ballots
                .iter()
                .map(|b| match convention {
                    SnapshotConvention::Ranks => DocumentBallot::Ranks {
                        votes: b.votes,
                        ranks: b.ranks.clone(),
                    },
                    SnapshotConvention::Order => DocumentBallot::Order {
                        votes: b.votes,
                        order: rank_to_order(&b.ranks, candidate_count),
                    },
                })
                .collect(),
        }
    }

    fn into_election(self) -> BallotResult<Election> {
        let candidate_count = self.candidates.len();
        let mut ballots: Vec<Ballot> = Vec::with_capacity(self.ballots.len());
        for (idx, db) in self.ballots.into_iter().enumerate() {
            let ballot = match db {
                DocumentBallot::Order { votes, order } => {
                    Ballot::with_ranks(order_to_rank(&order, candidate_count)?, votes)
                }
                DocumentBallot::Ranks { votes, ranks } => {
                    ensure!(
                        ranks.len() == candidate_count,
                        SchemaSnafu {
                            message: format!(
                                "ballot {} has {} ranks for {} candidates",
                                idx,
                                ranks.len(),
                                candidate_count
                            )
                        }
                    );
                    Ballot::with_ranks(ranks, votes)
                }
            };
            ballots.push(ballot);
        }
        Ok(Election {
            candidates: self.candidates,
            seats: self.seats,
            ordered_seats: self.ordered_seats,
            ballots,
        })
    }
}

// ********* Portable text **********

/// Writes an election as portable text, ballots as 1-based ranks.
pub fn to_portable_text(election: &Election) -> BallotResult<String> {
    to_portable_text_with(election, SnapshotConvention::Ranks)
}

pub fn to_portable_text_with(
    election: &Election,
    convention: SnapshotConvention,
) -> BallotResult<String> {
    let doc = ElectionDocument::from_election(election, convention);
    serde_json::to_string_pretty(&doc).context(EncodeJsonSnafu {})
}

/// Reads an election back from portable text.
///
/// Ballots may be written with ranks or with an order, independently of each other.
/// `ordered_seats` defaults to false when absent.
pub fn from_portable_text(text: &str) -> BallotResult<Election> {
    let js: JSValue = serde_json::from_str(text).context(ParseSnafu {})?;
    {
        let obj = js.as_object().context(SchemaSnafu {
            message: "the top level is not a mapping",
        })?;
        for field in REQUIRED_FIELDS.iter() {
            ensure!(
                obj.contains_key(*field),
                SchemaSnafu {
                    message: format!("missing field `{}`", field)
                }
            );
        }
        if let Some(ballots) = obj.get("ballots").and_then(|b| b.as_array()) {
            for ballot in ballots.iter() {
                check_single_convention(ballot)?;
            }
        }
    }
    let doc: ElectionDocument = serde_json::from_value(js).context(SchemaShapeSnafu {})?;
    doc.into_election()
}

// ********* Shareable handles **********

/// Compresses an election into a token that can be embedded as-is in a URL.
///
/// ```
/// use stv_ballots::builder::Builder;
/// use stv_ballots::snapshot::{from_shareable_handle, to_shareable_handle};
///
/// let mut builder = Builder::new(1).candidates(&["Ana".to_string(), "Tiago".to_string()])?;
/// builder.add_ballot(&[Some(2), Some(1)], 3)?;
/// let election = builder.build();
///
/// let token = to_shareable_handle(&election)?;
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// assert_eq!(from_shareable_handle(&token)?, election);
/// # Ok::<(), stv_ballots::BallotError>(())
/// ```
pub fn to_shareable_handle(election: &Election) -> BallotResult<String> {
    let text = to_portable_text(election)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes()).context(CompressSnafu {})?;
    let compressed = encoder.finish().context(CompressSnafu {})?;
    debug!(
        "to_shareable_handle: {:?} bytes of text, {:?} bytes compressed",
        text.len(),
        compressed.len()
    );
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Reverses [to_shareable_handle].
///
/// A token that cannot be decompressed (corrupt, truncated) is a [BallotError::Decode].
/// A token that decompresses to something that is not an election fails like
/// [from_portable_text].
pub fn from_shareable_handle(token: &str) -> BallotResult<Election> {
    let text = decode_handle(token)?;
    from_portable_text(&text)
}

fn decode_handle(token: &str) -> BallotResult<String> {
    let compressed = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| BallotError::Decode {
            message: e.to_string(),
        })?;
    let bytes = inflate(&compressed)?;
    String::from_utf8(bytes).map_err(|e| BallotError::Decode {
        message: e.to_string(),
    })
}

// The stream must reach its end: a truncated token is an error, not a shorter text.
fn inflate(compressed: &[u8]) -> BallotResult<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out: Vec<u8> = Vec::with_capacity(compressed.len() * 4 + 64);
    loop {
        if out.len() == out.capacity() {
            ensure!(
                out.len() < MAX_SNAPSHOT_BYTES,
                DecodeSnafu {
                    message: format!("more than {} bytes once decompressed", MAX_SNAPSHOT_BYTES)
                }
            );
            out.reserve(out.len());
        }
        let consumed_before = inflater.total_in();
        let produced_before = inflater.total_out();
        let input = &compressed[consumed_before as usize..];
        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| BallotError::Decode {
                message: e.to_string(),
            })?;
        match status {
            Status::StreamEnd => {
                ensure!(
                    inflater.total_in() as usize == compressed.len(),
                    DecodeSnafu {
                        message: "trailing data after the compressed stream"
                    }
                );
                return Ok(out);
            }
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() == consumed_before
                    && inflater.total_out() == produced_before;
                ensure!(
                    !(stalled && out.len() < out.capacity()),
                    DecodeSnafu {
                        message: "the compressed data is truncated"
                    }
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Election {
        Election {
            candidates: vec![
                "Ana".to_string(),
                "Rodrigo".to_string(),
                "Sara".to_string(),
                "Tiago".to_string(),
            ],
            seats: 3,
            ordered_seats: true,
            ballots: vec![
                Ballot::with_ranks(
                    RankVector::from_values(&[Some(3), Some(2), None, Some(1)]).unwrap(),
                    Votes::new(10).unwrap(),
                ),
                Ballot::with_ranks(
                    RankVector::from_values(&[Some(4), Some(2), Some(1), Some(3)]).unwrap(),
                    Votes::new(5).unwrap(),
                ),
                Ballot::new(4),
            ],
        }
    }

    #[test]
    fn field_order_is_fixed() {
        let text = to_portable_text(&sample()).unwrap();
        let c = text.find("\"candidates\"").unwrap();
        let s = text.find("\"seats\"").unwrap();
        let o = text.find("\"ordered_seats\"").unwrap();
        let b = text.find("\"ballots\"").unwrap();
        assert!(c < s && s < o && o < b);
    }

    #[test]
    fn portable_text_round_trip() {
        let e = sample();
        for convention in [SnapshotConvention::Ranks, SnapshotConvention::Order] {
            let text = to_portable_text_with(&e, convention).unwrap();
            let back = from_portable_text(&text).unwrap();
            assert_eq!(back, e);
            assert_eq!(to_portable_text_with(&back, convention).unwrap(), text);
        }
    }

    #[test]
    fn order_convention_text() {
        let text = to_portable_text_with(&sample(), SnapshotConvention::Order).unwrap();
        let js: JSValue = serde_json::from_str(&text).unwrap();
        assert_eq!(
            js["ballots"][0],
            serde_json::json!({"votes": 10, "order": [[3], [1], [0], []]})
        );
    }

    #[test]
    fn hand_written_text() {
        let text = r#"
        {
            "candidates": ["A", "B", "C"],
            "seats": 1,
            "ballots": [
                {"votes": 2, "ranks": [1, null, 1]},
                {"order": [[1], [], [0]]}
            ]
        }"#;
        let e = from_portable_text(text).unwrap();
        assert!(!e.ordered_seats);
        assert_eq!(e.ballots[0].votes.get(), 2);
        assert_eq!(e.ballots[1].votes, Votes::ONE);
        assert_eq!(
            e.ballots[1].ranks,
            RankVector::from_values(&[Some(3), Some(1), None]).unwrap()
        );
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let res = from_portable_text("{\"candidates\": [");
        assert!(matches!(res, Err(BallotError::Parse { .. })));
    }

    #[test]
    fn missing_fields_are_schema_errors() {
        let res = from_portable_text(r#"{"candidates": ["A"], "ballots": []}"#);
        assert!(matches!(res, Err(BallotError::Schema { .. })));
        let res = from_portable_text("[1, 2]");
        assert!(matches!(res, Err(BallotError::Schema { .. })));
    }

    #[test]
    fn wrong_shapes_are_schema_errors() {
        for text in [
            r#"{"candidates": ["A"], "seats": 1, "ballots": {}}"#,
            r#"{"candidates": "A", "seats": 1, "ballots": []}"#,
            r#"{"candidates": ["A"], "seats": 1, "ballots": [{"votes": 1, "ranks": [0]}]}"#,
        ] {
            let res = from_portable_text(text);
            assert!(
                matches!(res, Err(BallotError::SchemaShape { .. })),
                "{:?}",
                res
            );
        }
        let res =
            from_portable_text(r#"{"candidates": ["A"], "seats": 1, "ballots": [{"ranks": []}]}"#);
        assert!(matches!(res, Err(BallotError::Schema { .. })));
    }

    #[test]
    fn zero_votes_in_text() {
        let res = from_portable_text(
            r#"{"candidates": ["A", "B"], "seats": 1, "ballots": [{"votes": 0, "ranks": [1, 2]}]}"#,
        );
        assert!(matches!(res, Err(BallotError::SchemaShape { .. })), "{:?}", res);
        let res = from_portable_text(
            r#"{"candidates": ["A", "B"], "seats": 1, "ballots": [{"votes": 0, "order": [[0], [1]]}]}"#,
        );
        assert!(matches!(res, Err(BallotError::SchemaShape { .. })), "{:?}", res);
    }

    #[test]
    fn ballot_with_order_and_ranks_in_text() {
        let res = from_portable_text(
            r#"{"candidates": ["A", "B"], "seats": 1,
                "ballots": [{"votes": 2, "order": [[0], [1]], "ranks": [2, 1]}]}"#,
        );
        assert!(matches!(res, Err(BallotError::Schema { .. })), "{:?}", res);
    }

    #[test]
    fn bad_order_index_in_text() {
        let res = from_portable_text(
            r#"{"candidates": ["A"], "seats": 1, "ballots": [{"order": [[1]]}]}"#,
        );
        assert!(matches!(res, Err(BallotError::MalformedOrder { .. })));
    }

    #[test]
    fn handle_round_trip() {
        let e = sample();
        let token = to_shareable_handle(&e).unwrap();
        assert_eq!(from_shareable_handle(&token).unwrap(), e);
    }

    #[test]
    fn truncated_handle_is_a_decode_error() {
        let token = to_shareable_handle(&sample()).unwrap();
        for cut in [1, 4, 7, token.len() / 2] {
            let res = from_shareable_handle(&token[..token.len() - cut]);
            assert!(
                matches!(res, Err(BallotError::Decode { .. })),
                "cut {}: {:?}",
                cut,
                res
            );
        }
    }

    #[test]
    fn trailing_bytes_after_handle_stream() {
        let text = to_portable_text(&sample()).unwrap();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        let mut compressed = encoder.finish().unwrap();
        let clean = URL_SAFE_NO_PAD.encode(&compressed);
        assert_eq!(from_shareable_handle(&clean).unwrap(), sample());

        compressed.extend_from_slice(b"extra");
        let res = from_shareable_handle(&URL_SAFE_NO_PAD.encode(&compressed));
        assert!(matches!(res, Err(BallotError::Decode { .. })), "{:?}", res);
    }

    #[test]
    fn garbage_handle_is_a_decode_error() {
        assert!(matches!(
            from_shareable_handle("not a token!"),
            Err(BallotError::Decode { .. })
        ));
        assert!(matches!(
            from_shareable_handle("AAAAAAAA"),
            Err(BallotError::Decode { .. })
        ));
    }

    #[test]
    fn handle_of_non_election() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"seats\": 2}").unwrap();
        let token = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());
        assert!(matches!(
            from_shareable_handle(&token),
            Err(BallotError::Schema { .. })
        ));
    }
}
