// Ballots exported from the ballot service: a map from ballot id to stored ballot.

use crate::scenario::*;

pub fn read_stored_ballots(
    path: &str,
    candidate_count: usize,
) -> ScenarioResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let stored: BTreeMap<String, JSValue> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let mut res: Vec<ParsedBallot> = Vec::with_capacity(stored.len());
    for (id, js) in stored.into_iter() {
        let wb = WireBallot::from_value(js).context(InvalidBallotSnafu { id: id.clone() })?;
        debug!("read_stored_ballots: {} ({} convention)", id, wb.convention());
        let ballot =
            decode_ballot(&wb, candidate_count).context(InvalidBallotSnafu { id: id.clone() })?;
        res.push(ParsedBallot { id, ballot });
    }
    Ok(res)
}
