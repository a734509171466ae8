use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use stv_ballots::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::scenario::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum ScenarioError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing JSON: {source}"))]
    EncodingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number for a column or row index"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of a CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: cannot read rank {content:?}"))]
    CsvRank { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: cannot read vote count {content:?}"))]
    CsvCount { lineno: usize, content: String },

    #[snafu(display("Ballot {id}: {source}"))]
    InvalidBallot { source: BallotError, id: String },
    #[snafu(display("Ballot {id} appears more than once"))]
    DuplicateBallot { id: String },
    #[snafu(display("{source}"))]
    Ballots { source: BallotError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// A ballot, as read from one of the sources.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub ballot: Ballot,
}

#[derive(Debug, Clone, Serialize)]
struct GroupSummary {
    votes: u64,
    ranks: RankVector,
    order: OrderGroups,
    ballots: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct AggregationSummary {
    config: OutputConfig,
    #[serde(rename = "totalVotes")]
    total_votes: u64,
    #[serde(rename = "numBallots")]
    num_ballots: usize,
    groups: Vec<GroupSummary>,
    request: CountRequest,
}

fn read_ballot_source(
    root_path: &Path,
    source: &BallotSource,
    candidate_count: usize,
) -> ScenarioResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(&p2, source, candidate_count),
        "json" => io_json::read_stored_ballots(&p2, candidate_count),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

// The summary, and the aggregated election it describes.
fn build_summary(
    config: &ScenarioConfig,
    ballots: &BTreeMap<String, Ballot>,
) -> ScenarioResult<(AggregationSummary, Election)> {
    let candidate_count = config.candidates.len();
    let groups = aggregate(ballots).context(BallotsSnafu {})?;
    for g in groups.iter() {
        info!(
            "{} votes for {:?} ({} ballots)",
            g.votes,
            g.order(candidate_count).groups(),
            g.ballot_ids.len()
        );
    }

    let election = Election {
        candidates: config.candidate_names(),
        seats: config.seats,
        ordered_seats: config.ordered_seats.unwrap_or(false),
        ballots: groups.iter().map(BallotGroup::to_ballot).collect(),
    };
    let convention = config
        .output_settings
        .wire_convention
        .unwrap_or(WireConvention::OrderGroups);

    let summary = AggregationSummary {
        config: config.output_config(),
        total_votes: total_votes(&groups).context(BallotsSnafu {})?,
        num_ballots: ballots.len(),
        groups: groups
            .iter()
            .map(|g| GroupSummary {
                votes: g.votes.get(),
                ranks: g.ranks.clone(),
                order: g.order(candidate_count),
                ballots: g.ballot_ids.clone(),
            })
            .collect(),
        request: CountRequest::from_election(&election, convention),
    };
    Ok((summary, election))
}

// Writes to the given file, or to the standard output for "stdout" or an empty path.
fn write_output(out: Option<&str>, content: &str) -> ScenarioResult<()> {
    match out {
        None | Some("") | Some("stdout") => {
            println!("{}", content);
            Ok(())
        }
        Some(path) => {
            info!("Writing output to {}", path);
            fs::write(path, content).context(WritingFileSnafu { path })
        }
    }
}

fn read_input(path: &str) -> ScenarioResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu { path })
}

pub fn run_aggregation(
    config_path: &str,
    out: &Option<String>,
    snapshot_out: &Option<String>,
    check_summary_path: &Option<String>,
) -> ScenarioResult<()> {
    let config_p = Path::new(config_path);
    let config = read_config(config_path)?;
    info!("config: {:?}", config);

    if config.ballot_sources.is_empty() {
        whatever!("No ballot sources in {}", config_path);
    }
    if config.candidates.is_empty() {
        whatever!("No candidates in {}", config_path);
    }

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let candidate_count = config.candidates.len();
    let mut ballots: BTreeMap<String, Ballot> = BTreeMap::new();
    for source in config.ballot_sources.iter() {
        let parsed = read_ballot_source(root_p, source, candidate_count)?;
        debug!("read {} ballots from {}", parsed.len(), source.file_path);
        for pb in parsed {
            ensure!(
                !ballots.contains_key(&pb.id),
                DuplicateBallotSnafu { id: pb.id }
            );
            ballots.insert(pb.id, pb.ballot);
        }
    }

    let (summary, election) = build_summary(&config, &ballots)?;
    info!(
        "{} ballots, {} votes, {} distinct rankings",
        summary.num_ballots,
        summary.total_votes,
        summary.groups.len()
    );

    let summary_js: JSValue = serde_json::to_value(&summary).context(EncodingJsonSnafu {})?;
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(EncodingJsonSnafu {})?;

    let out_path: Option<String> = match (out, &config.output_settings.output_directory) {
        (Some(x), _) => Some(x.clone()),
        (None, Some(dir)) => {
            let out_dir = root_p.join(dir);
            fs::create_dir_all(&out_dir).context(WritingFileSnafu {
                path: out_dir.display().to_string(),
            })?;
            Some(out_dir.join("summary.json").display().to_string())
        }
        (None, None) => None,
    };
    write_output(out_path.as_deref(), &pretty_js_summary)?;

    if let Some(snapshot_p) = snapshot_out {
        let text = to_portable_text(&election).context(BallotsSnafu {})?;
        write_output(Some(snapshot_p.as_str()), &text)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        if summary_ref != summary_js {
            let pretty_js_summary_ref =
                serde_json::to_string_pretty(&summary_ref).context(EncodingJsonSnafu {})?;
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

pub fn run_share(input: &str, base_url: &Option<String>) -> ScenarioResult<String> {
    let election = from_portable_text(&read_input(input)?).context(BallotsSnafu {})?;
    info!(
        "sharing election with {} candidates and {} ballots",
        election.candidate_count(),
        election.ballots.len()
    );
    let token = to_shareable_handle(&election).context(BallotsSnafu {})?;
    let res = match base_url {
        Some(url) => format!("{}?data={}", url, token),
        None => token,
    };
    println!("{}", res);
    Ok(res)
}

pub fn run_unshare(token: &str, out: &Option<String>) -> ScenarioResult<()> {
    // Accept a full link as well as the bare token.
    let token = match token.split_once("data=") {
        Some((_, t)) => t.split('&').next().unwrap_or(t),
        None => token,
    };
    let election = from_shareable_handle(token).context(BallotsSnafu {})?;
    let text = to_portable_text(&election).context(BallotsSnafu {})?;
    write_output(out.as_deref(), &text)
}

pub fn run_request(
    input: &str,
    convention: &Option<String>,
    out: &Option<String>,
) -> ScenarioResult<()> {
    let convention = match convention {
        Some(c) => match c.parse::<WireConvention>() {
            Ok(x) => x,
            Err(msg) => whatever!("{}", msg),
        },
        None => WireConvention::OrderGroups,
    };
    let election = from_portable_text(&read_input(input)?).context(BallotsSnafu {})?;
    election.validate().context(BallotsSnafu {})?;
    let request = CountRequest::from_election(&election, convention);
    debug!("request: {:?}", request);
    let js = serde_json::to_string_pretty(&request).context(EncodingJsonSnafu {})?;
    write_output(out.as_deref(), &js)
}

pub fn run_results(
    input: &str,
    election_path: &Option<String>,
    ordered_seats: bool,
) -> ScenarioResult<CountResult> {
    let result: CountResult =
        serde_json::from_str(&read_input(input)?).context(ParsingJsonSnafu {})?;
    let election = match election_path {
        Some(p) => Some(from_portable_text(&read_input(p)?).context(BallotsSnafu {})?),
        None => result.replay_election(ordered_seats).context(BallotsSnafu {})?,
    };
    let candidates: Vec<String> = match &election {
        Some(e) => e.candidates.clone(),
        None => result.elected.iter().map(|e| e.candidate.clone()).collect(),
    };
    if election.is_some() {
        result.validate(candidates.len()).context(BallotsSnafu {})?;
    }
    let ordered_seats = ordered_seats || election.as_ref().map_or(false, |e| e.ordered_seats);

    println!("Elected:");
    for (idx, e) in result.elected.iter().enumerate() {
        if ordered_seats {
            println!("  {}. {}", idx + 1, e.candidate);
        } else {
            println!("  - {}", e.candidate);
        }
    }
    if election.is_some() && !result.order.is_empty() {
        println!("Final ranking:");
        for (pos, cid) in result.final_ranking().iter().enumerate() {
            println!("  {}. {}", pos + 1, candidates[*cid]);
        }
    }
    if let Some(e) = &election {
        info!(
            "counted {} votes over {} ballots",
            e.total_votes().context(BallotsSnafu {})?,
            e.ballots.len()
        );
    }
    debug!("log:\n{}", result.log);
    Ok(result)
}

#[cfg(test)]
fn test_dir() -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "testdata"].iter().collect()
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = test_dir().join(test_name);
    let config = dir.join(format!("{}_config.json", test_name));
    let summary = dir.join(format!("{}_expected_summary.json", test_name));
    let out = std::env::temp_dir()
        .join(format!("stvballot-{}-summary.json", test_name))
        .display()
        .to_string();
    let res = run_aggregation(
        &config.display().to_string(),
        &Some(out),
        &None,
        &Some(summary.display().to_string()),
    );
    if let Err(e) = res {
        panic!("An error occured {}", e);
    }
}
