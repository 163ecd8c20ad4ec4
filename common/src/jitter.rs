// Jittered rescheduling policy
//
// Computes the next eligible run time for a schedule from its nominal
// period and a randomized jitter window, so that reposts never happen at
// predictable, synchronized instants.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Number of whole minutes before the next nominal run.
///
/// At least one minute of cadence, regardless of how small the period is.
pub fn base_minutes(period_hours: f64) -> i64 {
    ((period_hours * 60.0).floor() as i64).max(1)
}

/// Compute the next run time: `now` plus the base cadence plus a uniform
/// draw from `[0, jitter_minutes)` whole minutes (zero when the jitter
/// window is empty).
///
/// The result is strictly greater than `now` since the base is at least
/// one minute. Delays too large for the representable time range saturate
/// at the far future instead of overflowing. The random source is passed
/// in so callers can seed it.
pub fn plan_next_run<R: Rng + ?Sized>(
    period_hours: f64,
    jitter_minutes: i64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> DateTime<Utc> {
    let base = base_minutes(period_hours);
    let jitter = jitter_minutes.max(0);
    let drawn = if jitter > 0 {
        rng.gen_range(0..jitter)
    } else {
        0
    };
    Duration::try_minutes(base.saturating_add(drawn))
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MIN_PERIOD_HOURS;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_base_minutes_floors_and_clamps() {
        assert_eq!(base_minutes(48.0), 2880);
        assert_eq!(base_minutes(1.5), 90);
        assert_eq!(base_minutes(MIN_PERIOD_HOURS), 1);
        assert_eq!(base_minutes(0.001), 1);
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let next = plan_next_run(2.0, 0, now, &mut rng);
        assert_eq!(next, now + Duration::minutes(120));
    }

    #[test]
    fn test_result_strictly_after_now() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(0);
        let next = plan_next_run(MIN_PERIOD_HOURS, 0, now, &mut rng);
        assert!(next > now);
    }

    #[test]
    fn test_huge_inputs_saturate_instead_of_panicking() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(3);

        let next = plan_next_run(1e10, 0, now, &mut rng);
        assert!(next > now);

        let next = plan_next_run(48.0, i64::MAX / 2, now, &mut rng);
        assert!(next > now);
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let now = Utc::now();
        let a = plan_next_run(48.0, 7, now, &mut StdRng::seed_from_u64(42));
        let b = plan_next_run(48.0, 7, now, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_forty_eight_hour_seven_minute_window() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let next = plan_next_run(48.0, 7, now, &mut rng);
            let delta_ms = (next - now).num_milliseconds();
            assert!(delta_ms >= 172_800_000);
            assert!(delta_ms <= 172_800_000 + 420_000);
        }
    }

    proptest! {
        // For any valid period and jitter, the delay lands in
        // [base, base + jitter] minutes.
        #[test]
        fn prop_next_run_within_jitter_window(
            period_hours in MIN_PERIOD_HOURS..8760.0f64,
            jitter_minutes in 0i64..10_000,
            seed in any::<u64>(),
        ) {
            let now = Utc::now();
            let mut rng = StdRng::seed_from_u64(seed);
            let next = plan_next_run(period_hours, jitter_minutes, now, &mut rng);

            let base = base_minutes(period_hours);
            let delta_ms = (next - now).num_milliseconds();
            prop_assert!(delta_ms >= base * 60_000);
            prop_assert!(delta_ms <= (base + jitter_minutes) * 60_000);
            prop_assert!(next > now);
        }
    }
}
