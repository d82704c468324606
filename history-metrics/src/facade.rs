//! The metrics computation facade (spec §4.7): turns a raw `devs` [`Report`]
//! (or a [`ReportReader`] over one) into [`ComputedMetrics`], computing
//! dependent metrics in the documented order — developers → languages →
//! bus_factor, then activity and churn independently, then cardinality last.

use std::collections::HashMap;

use history_core::errors::{InvalidReportError, StoreError};
use history_core::model::LineStats;
use history_core::tc::Report;
use history_store::{ReportReader, ReportWriter};

use crate::active::active_threshold;
use crate::bus_factor::bus_factor_for_language;
use crate::cardinality::estimate_developer_counts;
use crate::churn::churn_records;
use crate::parse::{parse_devs_report, ParsedDevsReport};
use crate::records::{ActiveDevelopersRecord, ComputedMetrics, DeveloperRecord, LanguageContributor, LanguageRecord};

/// Computes every metric over an already-parsed `devs` report.
pub fn compute_metrics_from_parsed(parsed: &ParsedDevsReport) -> ComputedMetrics {
    let developers = developer_records(parsed);
    let languages = language_records(parsed);
    let bus_factor = languages
        .iter()
        .map(|l| bus_factor_for_language(&l.language, &l.contributors))
        .collect();

    let last_tick = parsed.commits.iter().map(|c| c.tick).max().unwrap_or(0);
    let (threshold_tick, fallback) = active_threshold(last_tick, parsed.tick_size_secs);
    let active_author_ids = active_author_ids(parsed, threshold_tick);
    let active_developers = ActiveDevelopersRecord {
        threshold_tick,
        last_tick,
        active_author_ids: active_author_ids.clone(),
        fallback_ratio_rule: fallback,
    };

    let churn = churn_records(&parsed.files);

    let all_author_ids: Vec<i32> = developers.iter().map(|d| d.author_id).collect();
    let (estimated_total_developers, estimated_active_developers) = estimate_developer_counts(&all_author_ids, &active_author_ids);

    ComputedMetrics {
        developers,
        languages,
        bus_factor,
        active_developers,
        churn,
        estimated_total_developers,
        estimated_active_developers,
    }
}

/// Parses `report` and computes every metric over it.
pub fn compute_metrics(report: &Report) -> Result<ComputedMetrics, InvalidReportError> {
    let parsed = parse_devs_report(report)?;
    Ok(compute_metrics_from_parsed(&parsed))
}

/// Single-record `aggregate` kind: the two cardinality estimates, which have
/// no other natural home among the per-language/per-developer kinds.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct AggregateRecord {
    estimated_total_developers: f64,
    estimated_active_developers: f64,
}

/// Writes every `ComputedMetrics` field out through `writer` as its own
/// record kind (spec §4.6 "developer, language, bus_factor, activity,
/// churn, aggregate"), one `Write` call per record.
pub fn write_metrics(writer: &ReportWriter, metrics: &ComputedMetrics) -> Result<(), StoreError> {
    for record in &metrics.developers {
        writer.write("developer", record)?;
    }
    for record in &metrics.languages {
        writer.write("language", record)?;
    }
    for record in &metrics.bus_factor {
        writer.write("bus_factor", record)?;
    }
    writer.write("activity", &metrics.active_developers)?;
    for record in &metrics.churn {
        writer.write("churn", record)?;
    }
    writer.write(
        "aggregate",
        &AggregateRecord {
            estimated_total_developers: metrics.estimated_total_developers,
            estimated_active_developers: metrics.estimated_active_developers,
        },
    )?;
    Ok(())
}

/// Reads every kind back through `reader`, reconstructing a `ComputedMetrics`
/// equal record-by-record to the one that was written (spec §8 "Store
/// round-trip").
pub fn read_metrics(reader: &ReportReader) -> Result<ComputedMetrics, StoreError> {
    let mut developers = Vec::new();
    reader.iter("developer", |r| {
        developers.push(r);
        Ok(())
    })?;

    let mut languages = Vec::new();
    reader.iter("language", |r| {
        languages.push(r);
        Ok(())
    })?;

    let mut bus_factor = Vec::new();
    reader.iter("bus_factor", |r| {
        bus_factor.push(r);
        Ok(())
    })?;

    let mut activity = Vec::new();
    reader.iter("activity", |r: ActiveDevelopersRecord| {
        activity.push(r);
        Ok(())
    })?;
    let active_developers = activity.into_iter().next().unwrap_or(ActiveDevelopersRecord {
        threshold_tick: 0,
        last_tick: 0,
        active_author_ids: Vec::new(),
        fallback_ratio_rule: false,
    });

    let mut churn = Vec::new();
    reader.iter("churn", |r| {
        churn.push(r);
        Ok(())
    })?;

    let mut aggregate = Vec::new();
    reader.iter("aggregate", |r: AggregateRecord| {
        aggregate.push(r);
        Ok(())
    })?;
    let (estimated_total_developers, estimated_active_developers) = aggregate
        .into_iter()
        .next()
        .map(|a| (a.estimated_total_developers, a.estimated_active_developers))
        .unwrap_or((0.0, 0.0));

    Ok(ComputedMetrics {
        developers,
        languages,
        bus_factor,
        active_developers,
        churn,
        estimated_total_developers,
        estimated_active_developers,
    })
}

fn developer_records(parsed: &ParsedDevsReport) -> Vec<DeveloperRecord> {
    struct Acc {
        name: String,
        commits: u64,
        lines: LineStats,
        languages: HashMap<String, LineStats>,
        last_active_tick: i64,
    }

    let mut by_author: HashMap<i32, Acc> = HashMap::new();
    for commit in &parsed.commits {
        let name = parsed
            .people
            .get(commit.author_id as usize)
            .cloned()
            .unwrap_or_else(|| commit.author_id.to_string());
        let acc = by_author.entry(commit.author_id).or_insert_with(|| Acc {
            name,
            commits: 0,
            lines: LineStats::new(0, 0, 0),
            languages: HashMap::new(),
            last_active_tick: commit.tick,
        });
        acc.commits += 1;
        acc.lines = acc.lines + commit.lines;
        acc.last_active_tick = acc.last_active_tick.max(commit.tick);
        for (lang, stats) in &commit.languages {
            *acc.languages.entry(lang.clone()).or_default() += *stats;
        }
    }

    let mut records: Vec<DeveloperRecord> = by_author
        .into_iter()
        .map(|(author_id, acc)| DeveloperRecord {
            author_id,
            name: acc.name,
            commits: acc.commits,
            lines: acc.lines,
            languages: acc.languages,
            last_active_tick: acc.last_active_tick,
        })
        .collect();
    records.sort_by_key(|d| d.author_id);
    records
}

fn language_records(parsed: &ParsedDevsReport) -> Vec<LanguageRecord> {
    let mut totals: HashMap<String, LineStats> = HashMap::new();
    let mut contributors: HashMap<String, HashMap<i32, u64>> = HashMap::new();

    for commit in &parsed.commits {
        for (lang, stats) in &commit.languages {
            *totals.entry(lang.clone()).or_default() += *stats;
            *contributors.entry(lang.clone()).or_default().entry(commit.author_id).or_insert(0) += stats.added + stats.removed;
        }
    }

    let mut records: Vec<LanguageRecord> = totals
        .into_iter()
        .map(|(language, lines)| {
            let mut contributors: Vec<LanguageContributor> = contributors
                .remove(&language)
                .unwrap_or_default()
                .into_iter()
                .map(|(author_id, contribution)| LanguageContributor {
                    author_id,
                    name: parsed.people.get(author_id as usize).cloned().unwrap_or_else(|| author_id.to_string()),
                    contribution,
                })
                .collect();
            contributors.sort_by(|a, b| b.contribution.cmp(&a.contribution));
            LanguageRecord { language, lines, contributors }
        })
        .collect();
    records.sort_by(|a, b| a.language.cmp(&b.language));
    records
}

fn active_author_ids(parsed: &ParsedDevsReport, threshold_tick: i64) -> Vec<i32> {
    let mut ids: Vec<i32> = parsed
        .commits
        .iter()
        .filter(|c| c.tick >= threshold_tick)
        .map(|c| c.author_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use history_core::tc::ReportValue;

    fn map(pairs: Vec<(&str, ReportValue)>) -> ReportValue {
        ReportValue::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    // Scenario A (spec §8): a single author, single language, single commit.
    #[test]
    fn single_author_single_commit_produces_one_developer_record() {
        let mut report: Report = Report::new();
        report.insert(
            "CommitDevData".to_string(),
            ReportValue::List(vec![map(vec![
                ("tick", ReportValue::Int(0)),
                ("commit_hash", ReportValue::Str("abc".to_string())),
                ("author_id", ReportValue::Int(0)),
                ("added", ReportValue::Int(5)),
                ("removed", ReportValue::Int(0)),
                ("changed", ReportValue::Int(0)),
                ("languages", map(vec![("Rust", map(vec![("added", ReportValue::Int(5)), ("removed", ReportValue::Int(0)), ("changed", ReportValue::Int(0))]))])),
            ])]),
        );
        report.insert("ReversedPeopleDict".to_string(), ReportValue::List(vec![ReportValue::Str("Alice".to_string())]));
        report.insert("TickSize".to_string(), ReportValue::Int(86400));

        let metrics = compute_metrics(&report).unwrap();
        assert_eq!(metrics.developers.len(), 1);
        assert_eq!(metrics.developers[0].name, "Alice");
        assert_eq!(metrics.languages.len(), 1);
        assert_eq!(metrics.languages[0].language, "Rust");
        assert_eq!(metrics.bus_factor[0].bus_factor, 1);
    }

    // Spec §8 item 5: the store round-trip.
    #[test]
    fn write_then_read_reproduces_every_record() {
        let mut report: Report = Report::new();
        report.insert(
            "CommitDevData".to_string(),
            ReportValue::List(vec![
                map(vec![
                    ("tick", ReportValue::Int(0)),
                    ("commit_hash", ReportValue::Str("abc".to_string())),
                    ("author_id", ReportValue::Int(0)),
                    ("added", ReportValue::Int(5)),
                    ("removed", ReportValue::Int(0)),
                    ("changed", ReportValue::Int(0)),
                ]),
                map(vec![
                    ("tick", ReportValue::Int(1)),
                    ("commit_hash", ReportValue::Str("def".to_string())),
                    ("author_id", ReportValue::Int(1)),
                    ("added", ReportValue::Int(3)),
                    ("removed", ReportValue::Int(1)),
                    ("changed", ReportValue::Int(0)),
                ]),
            ]),
        );
        report.insert(
            "ReversedPeopleDict".to_string(),
            ReportValue::List(vec![ReportValue::Str("Alice".to_string()), ReportValue::Str("Bob".to_string())]),
        );
        report.insert("TickSize".to_string(), ReportValue::Int(86400));

        let metrics = compute_metrics(&report).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::begin(
            dir.path(),
            history_store::StoreMeta {
                analyzer_id: "devs".to_string(),
                schema_version: 1,
            },
        )
        .unwrap();
        write_metrics(&writer, &metrics).unwrap();
        writer.close().unwrap();

        let reader = ReportReader::open(dir.path(), "devs").unwrap();
        let reread = read_metrics(&reader).unwrap();

        assert_eq!(reread.developers.len(), metrics.developers.len());
        assert_eq!(reread.active_developers.last_tick, metrics.active_developers.last_tick);
        assert_eq!(reread.estimated_total_developers, metrics.estimated_total_developers);
    }
}
