//! Derived statistics over already-scoped record sets.
//!
//! Handlers fetch only the rows the caller may see and hand them to these
//! functions. Nothing here touches the store, and an empty input always
//! yields zeros or empty lists rather than an error.

pub mod activity;
pub mod attendance;
pub mod scores;
pub mod trends;
pub mod women;

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

/// `part / whole` as a rounded whole percentage, 0 when `whole` is 0
pub fn rate(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

/// Change against the previous period in percent, 0 when there was nothing before
pub fn growth_percentage(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return 0;
    }
    ((current - previous) as f64 / previous as f64 * 100.0).round() as i64
}

/// Signed label such as `+12%` or `-4%`
pub fn growth_label(percentage: i64) -> String {
    if percentage < 0 {
        format!("{percentage}%")
    } else {
        format!("+{percentage}%")
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// One bucket of a group-by-label count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Count items per key, buckets ordered by the key's natural order
pub(crate) fn count_by<T, K>(items: &[T], key: impl Fn(&T) -> K) -> Vec<GroupCount>
where
    K: Ord + Display,
{
    let mut buckets: BTreeMap<K, usize> = BTreeMap::new();
    for item in items {
        *buckets.entry(key(item)).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(k, count)| GroupCount {
            label: k.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_guards_zero_denominator() {
        assert_eq!(rate(0, 0), 0);
        assert_eq!(rate(5, 0), 0);
        assert_eq!(rate(1, 3), 33);
        assert_eq!(rate(2, 3), 67);
        assert_eq!(rate(4, 4), 100);
    }

    #[test]
    fn test_growth() {
        assert_eq!(growth_percentage(10, 0), 0);
        assert_eq!(growth_percentage(12, 10), 20);
        assert_eq!(growth_percentage(9, 12), -25);
        assert_eq!(growth_label(20), "+20%");
        assert_eq!(growth_label(0), "+0%");
        assert_eq!(growth_label(-25), "-25%");
    }

    #[test]
    fn test_mean_and_rounding() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean([80.0, 90.0, 100.0]), Some(90.0));
        assert_eq!(round_to(88.33333, 2), 88.33);
    }

    #[test]
    fn test_count_by_orders_by_key() {
        let counts = count_by(&["b", "a", "b", "c"], |s| s.to_string());
        let labels: Vec<_> = counts.iter().map(|g| (g.label.as_str(), g.count)).collect();
        assert_eq!(labels, vec![("a", 1), ("b", 2), ("c", 1)]);
    }
}
