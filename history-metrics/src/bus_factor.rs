//! CHAOSS Contributor Absence Factor (spec §4.7 "Bus factor").

use crate::records::{BusFactorRecord, LanguageContributor, RiskLevel};

/// Sorts `contributors` by `added+removed` contribution descending and
/// returns the smallest prefix whose cumulative contribution reaches at
/// least half the total, plus the risk level derived from the top
/// contributor's share.
pub fn bus_factor_for_language(language: &str, contributors: &[LanguageContributor]) -> BusFactorRecord {
    let total: u64 = contributors.iter().map(|c| c.contribution).sum();

    if total == 0 || contributors.is_empty() {
        return BusFactorRecord {
            language: language.to_string(),
            bus_factor: 0,
            primary_share: 0.0,
            risk: RiskLevel::Low,
        };
    }

    let mut ranked: Vec<&LanguageContributor> = contributors.iter().collect();
    ranked.sort_by(|a, b| b.contribution.cmp(&a.contribution));

    let half = total as f64 / 2.0;
    let mut cumulative = 0u64;
    let mut bus_factor = 0usize;
    for contributor in &ranked {
        cumulative += contributor.contribution;
        bus_factor += 1;
        if cumulative as f64 >= half {
            break;
        }
    }

    let primary_share = ranked[0].contribution as f64 / total as f64;
    let risk = if primary_share >= 0.90 {
        RiskLevel::Critical
    } else if primary_share >= 0.80 {
        RiskLevel::High
    } else if primary_share >= 0.60 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    BusFactorRecord {
        language: language.to_string(),
        bus_factor,
        primary_share,
        risk,
    }
}
