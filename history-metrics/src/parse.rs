//! Parses an untyped [`Report`] into the typed intermediate shape the
//! metrics facade computes over, coercing `int|float` tolerantly at every
//! numeric boundary (spec §4.7, §9 "Reflective report parsing").

use std::collections::HashMap;

use history_core::errors::InvalidReportError;
use history_core::model::LineStats;
use history_core::tc::{coerce_i64, Report, ReportValue};

/// One `devs` commit contribution, as parsed out of `CommitDevData`.
#[derive(Clone, Debug)]
pub struct CommitDevEntry {
    pub tick: i64,
    pub commit_hash: String,
    pub author_id: i32,
    pub lines: LineStats,
    pub languages: HashMap<String, LineStats>,
}

/// One file's aggregated churn inputs, as parsed out of `FileChurnData`.
#[derive(Clone, Debug)]
pub struct FileChurnEntry {
    pub file: String,
    pub commits: u64,
    pub lines: LineStats,
}

/// Everything the facade needs, extracted once from a `devs` [`Report`].
#[derive(Clone, Debug, Default)]
pub struct ParsedDevsReport {
    pub commits: Vec<CommitDevEntry>,
    pub files: Vec<FileChurnEntry>,
    pub people: Vec<String>,
    pub tick_size_secs: i64,
}

fn missing(keys: &[&str]) -> InvalidReportError {
    InvalidReportError {
        missing_keys: keys.iter().map(|s| s.to_string()).collect(),
    }
}

fn as_str(v: &ReportValue) -> Option<String> {
    match v {
        ReportValue::Str(s) => Some(s.clone()),
        ReportValue::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

fn as_map(v: &ReportValue) -> Option<&HashMap<String, ReportValue>> {
    match v {
        ReportValue::Map(m) => Some(m),
        _ => None,
    }
}

fn as_list(v: &ReportValue) -> Option<&[ReportValue]> {
    match v {
        ReportValue::List(l) => Some(l),
        _ => None,
    }
}

fn line_stats_from_map(m: &HashMap<String, ReportValue>) -> LineStats {
    let field = |k: &str| m.get(k).and_then(coerce_i64).unwrap_or(0).max(0) as u64;
    LineStats::new(field("added"), field("removed"), field("changed"))
}

/// Parses the `devs` report produced by [`DevsAnalyzer::ticks_to_report`]
/// (`history_engine::DevsAnalyzer`).
pub fn parse_devs_report(report: &Report) -> Result<ParsedDevsReport, InvalidReportError> {
    let commit_dev_data = report
        .get("CommitDevData")
        .and_then(as_list)
        .ok_or_else(|| missing(&["CommitDevData"]))?;

    let mut commits = Vec::with_capacity(commit_dev_data.len());
    for entry in commit_dev_data {
        let Some(m) = as_map(entry) else { continue };
        let Some(tick) = m.get("tick").and_then(coerce_i64) else {
            continue;
        };
        let Some(commit_hash) = m.get("commit_hash").and_then(as_str) else {
            continue;
        };
        let Some(author_id) = m.get("author_id").and_then(coerce_i64) else {
            continue;
        };
        let lines = line_stats_from_map(m);
        let languages = m
            .get("languages")
            .and_then(as_map)
            .map(|langs| {
                langs
                    .iter()
                    .filter_map(|(lang, v)| as_map(v).map(|lm| (lang.clone(), line_stats_from_map(lm))))
                    .collect()
            })
            .unwrap_or_default();

        commits.push(CommitDevEntry {
            tick,
            commit_hash,
            author_id: author_id as i32,
            lines,
            languages,
        });
    }

    let people = report
        .get("ReversedPeopleDict")
        .and_then(as_list)
        .map(|list| list.iter().filter_map(as_str).collect())
        .unwrap_or_default();

    let tick_size_secs = report.get("TickSize").and_then(coerce_i64).unwrap_or(0);

    let files = report
        .get("FileChurnData")
        .and_then(as_list)
        .map(|list| {
            list.iter()
                .filter_map(|entry| {
                    let m = as_map(entry)?;
                    let file = m.get("file").and_then(as_str)?;
                    let commits = m.get("commits").and_then(coerce_i64).unwrap_or(0).max(0) as u64;
                    let lines = line_stats_from_map(m);
                    Some(FileChurnEntry { file, commits, lines })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedDevsReport {
        commits,
        files,
        people,
        tick_size_secs,
    })
}
