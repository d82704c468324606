//! Active-developer threshold (spec §4.7 "Active developers").

const ACTIVE_WINDOW_DAYS: i64 = 90;

/// Given the last tick index `T` and tick size `Δ` (seconds), returns the
/// tick threshold at or above which a developer counts as active, plus
/// whether the ratio-rule fallback was used because `Δ` is unknown.
pub fn active_threshold(last_tick: i64, tick_size_secs: i64) -> (i64, bool) {
    if tick_size_secs <= 0 {
        return ((0.7 * last_tick as f64).floor() as i64, true);
    }
    let window_secs = ACTIVE_WINDOW_DAYS * 86_400;
    let window_ticks = window_secs.div_ceil(tick_size_secs);
    ((last_tick - window_ticks).max(0), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_with_known_tick_size() {
        // 1-day ticks: the window is exactly 90 ticks.
        let (threshold, fallback) = active_threshold(100, 86_400);
        assert_eq!(threshold, 10);
        assert!(!fallback);
    }

    #[test]
    fn threshold_never_goes_negative() {
        let (threshold, _) = active_threshold(5, 86_400);
        assert_eq!(threshold, 0);
    }

    #[test]
    fn falls_back_to_ratio_rule_when_tick_size_is_unknown() {
        let (threshold, fallback) = active_threshold(100, 0);
        assert_eq!(threshold, 70);
        assert!(fallback);
    }
}
