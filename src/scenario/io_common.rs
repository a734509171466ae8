use std::path::Path;

use crate::scenario::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Ballots without an id column are named after their file and line.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Reads the rank written in a cell. An empty cell leaves the candidate unranked.
pub fn read_rank(cell: &str, zero_based: bool, lineno: usize) -> ScenarioResult<Option<u32>> {
    let content = cell.trim();
    if content.is_empty() {
        return Ok(None);
    }
    let r = content
        .parse::<u32>()
        .ok()
        .context(CsvRankSnafu { lineno, content })?;
    if zero_based {
        Ok(Some(r.saturating_add(1)))
    } else if r == 0 {
        CsvRankSnafu { lineno, content }.fail()
    } else {
        Ok(Some(r))
    }
}
