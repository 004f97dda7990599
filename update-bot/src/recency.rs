use crate::types::Timestamped;
use chrono::{DateTime, Duration, Utc};

/// Default trailing window: one day.
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::hours(24);

/// Narrows a diff to items published and updated within a trailing window.
///
/// A feed can surface entries that are new to us by identity but old in
/// reality (an edited title, a feed that reshuffles its history). Those are
/// dropped here.
#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    window: Duration,
}

impl Default for RecencyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_WINDOW)
    }
}

impl RecencyFilter {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Both elapsed times must be strictly below the window. A missing
    /// timestamp counts as one second old.
    pub fn is_recent<T: Timestamped>(&self, item: &T, now: DateTime<Utc>) -> bool {
        let elapsed = |at: Option<DateTime<Utc>>| {
            at.map(|at| now.signed_duration_since(at))
                .unwrap_or_else(|| Duration::seconds(1))
        };

        elapsed(item.published_at()) < self.window && elapsed(item.updated_at()) < self.window
    }

    pub fn retain<T: Timestamped>(&self, items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
        items.into_iter().filter(|item| self.is_recent(item, now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Stamped {
        published: Option<DateTime<Utc>>,
        updated: Option<DateTime<Utc>>,
    }

    impl Timestamped for Stamped {
        fn published_at(&self) -> Option<DateTime<Utc>> {
            self.published
        }

        fn updated_at(&self) -> Option<DateTime<Utc>> {
            self.updated
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn published(ago: Duration) -> Stamped {
        Stamped {
            published: Some(now() - ago),
            updated: None,
        }
    }

    #[test]
    fn exactly_one_day_old_is_excluded() {
        let filter = RecencyFilter::default();
        assert!(!filter.is_recent(&published(Duration::hours(24)), now()));
    }

    #[test]
    fn just_under_one_day_is_included() {
        let filter = RecencyFilter::default();
        assert!(filter.is_recent(&published(Duration::hours(23) + Duration::minutes(59)), now()));
    }

    #[test]
    fn missing_timestamps_are_recent() {
        let filter = RecencyFilter::default();
        let undated = Stamped {
            published: None,
            updated: None,
        };
        assert!(filter.is_recent(&undated, now()));
    }

    #[test]
    fn stale_update_excludes_fresh_publish() {
        let filter = RecencyFilter::default();
        let item = Stamped {
            published: Some(now() - Duration::minutes(5)),
            updated: Some(now() - Duration::days(3)),
        };
        assert!(!filter.is_recent(&item, now()));
    }

    #[test]
    fn retain_keeps_order() {
        let filter = RecencyFilter::new(Duration::hours(1));
        let items = vec![
            published(Duration::minutes(10)),
            published(Duration::hours(2)),
            published(Duration::minutes(50)),
        ];
        let kept = filter.retain(items, now());
        let ages: Vec<_> = kept
            .iter()
            .map(|item| now() - item.published.unwrap())
            .collect();
        assert_eq!(ages, vec![Duration::minutes(10), Duration::minutes(50)]);
    }
}
