use crate::scenario::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "wireConvention")]
    pub wire_convention: Option<WireConvention>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub seats: u32,
    #[serde(rename = "orderedSeats")]
    pub ordered_seats: bool,
    pub candidates: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "zeroBasedRanks")]
    pub zero_based_ranks: Option<bool>,
}

// Columns and rows are numbered from 1 in the configuration, like in a spreadsheet.
// The accessors below return 0-based indices.
impl BallotSource {
    pub fn first_vote_column_index(&self) -> ScenarioResult<usize> {
        let x = read_js_int(&self._first_vote_column_index)?;
        x.checked_sub(1).context(ParsingJsonNumberSnafu {})
    }

    pub fn first_vote_row_index(&self) -> ScenarioResult<usize> {
        if self._first_vote_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._first_vote_row_index)?;
        x.checked_sub(1).context(ParsingJsonNumberSnafu {})
    }

    pub fn id_column_index_int(&self) -> ScenarioResult<Option<usize>> {
        read_optional_column(&self.id_column_index)
    }

    pub fn count_column_index_int(&self) -> ScenarioResult<Option<usize>> {
        read_optional_column(&self.count_column_index)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Vec<BallotSource>,
    pub candidates: Vec<CandidateEntry>,
    pub seats: u32,
    #[serde(rename = "orderedSeats")]
    pub ordered_seats: Option<bool>,
}

impl ScenarioConfig {
    pub fn candidate_names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            contest: self.output_settings.contest_name.clone(),
            seats: self.seats,
            ordered_seats: self.ordered_seats.unwrap_or(false),
            candidates: self.candidate_names(),
        }
    }
}

pub fn read_config(path: &str) -> ScenarioResult<ScenarioConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> ScenarioResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

fn read_optional_column(x: &Option<JSValue>) -> ScenarioResult<Option<usize>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(_) => {
            let col = read_js_int(x)?;
            col.checked_sub(1).context(ParsingJsonNumberSnafu {}).map(Some)
        }
    }
}

fn read_js_int(x: &Option<JSValue>) -> ScenarioResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| usize::try_from(x).ok())
            .context(ParsingJsonNumberSnafu {}),
        // Excel-style columns: A is 1, Z is 26, AA is 27.
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => s
            .to_ascii_uppercase()
            .bytes()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?.checked_add((c - b'A' + 1) as usize)
            })
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
