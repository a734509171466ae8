// Primitives for reading CSV files.

use std::fs::File;

use crate::scenario::{
    io_common::{make_default_id, read_rank},
    *,
};

pub fn read_csv_ranking(
    path: &str,
    source: &BallotSource,
    candidate_count: usize,
) -> ScenarioResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = source.id_column_index_int()?;
    let choices_start_col = source.first_vote_column_index()?;
    let count_idx_o = source.count_column_index_int()?;
    let zero_based = source.zero_based_ranks.unwrap_or(false);
    let choices_end_col = choices_start_col
        .checked_add(candidate_count)
        .context(ParsingJsonNumberSnafu {})?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, source)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_ranking: lineno: {:?} row: {:?}", lineno, line);
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string()
        } else {
            default_id(lineno)
        };

        let votes: Votes = if let Some(count_idx) = count_idx_o {
            let content = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim();
            content
                .parse::<u64>()
                .ok()
                .and_then(Votes::new)
                .context(CsvCountSnafu { lineno, content })?
        } else {
            Votes::ONE
        };

        ensure!(
            line.len() >= choices_end_col,
            CsvLineTooShortSnafu { lineno }
        );
        let mut ranks: Vec<Option<u32>> = Vec::with_capacity(candidate_count);
        for cell in line.iter().skip(choices_start_col).take(candidate_count) {
            ranks.push(read_rank(cell, zero_based, lineno)?);
        }
        let ranks =
            RankVector::from_values(&ranks).context(InvalidBallotSnafu { id: id.clone() })?;

        res.push(ParsedBallot {
            id,
            ballot: Ballot::with_ranks(ranks, votes),
        });
    }
    Ok(res)
}

fn get_records(
    path: &str,
    source: &BallotSource,
) -> ScenarioResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = source.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
