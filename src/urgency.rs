//! Urgency ordering
//!
//! Orders resolved predictions nearest-first without touching the caller's list.

use crate::types::ResolvedPrediction;

/// Ascending-by-`minutes_until` view over a borrowed slice.
///
/// Ties keep their input order. The view can be iterated any number of times.
#[derive(Debug, Clone)]
pub struct UrgencyOrder<'a> {
    items: &'a [ResolvedPrediction],
    order: Vec<usize>,
}

/// Sort resolved predictions by ascending time-until, nearest first
pub fn sort_by_urgency(items: &[ResolvedPrediction]) -> UrgencyOrder<'_> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    // sort_by_key is stable
    order.sort_by_key(|&idx| items[idx].minutes_until);
    UrgencyOrder { items, order }
}

impl<'a> UrgencyOrder<'a> {
    /// Iterate from the start of the ordering
    pub fn iter(&self) -> impl Iterator<Item = &'a ResolvedPrediction> + '_ {
        let items = self.items;
        self.order.iter().map(move |&idx| &items[idx])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The most urgent prediction, if any
    pub fn first(&self) -> Option<&'a ResolvedPrediction> {
        self.order.first().map(|&idx| &self.items[idx])
    }

    pub fn to_vec(&self) -> Vec<ResolvedPrediction> {
        self.iter().cloned().collect()
    }
}

impl<'a, 'o> IntoIterator for &'o UrgencyOrder<'a> {
    type Item = &'a ResolvedPrediction;
    type IntoIter = Box<dyn Iterator<Item = &'a ResolvedPrediction> + 'o>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry(label: &str, minutes_until: i64) -> ResolvedPrediction {
        ResolvedPrediction {
            label: label.to_string(),
            resolved_time: Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap().fixed_offset(),
            minutes_until,
            display_text: String::new(),
            probability: None,
            minutes_from_start: None,
        }
    }

    fn labels(order: &UrgencyOrder<'_>) -> Vec<String> {
        order.iter().map(|p| p.label.clone()).collect()
    }

    #[test]
    fn test_sorts_nearest_first() {
        let items = vec![entry("Dinner", 300), entry("Walk", 15), entry("Nap", 90)];
        let order = sort_by_urgency(&items);

        assert_eq!(labels(&order), vec!["Walk", "Nap", "Dinner"]);
        assert_eq!(order.first().map(|p| p.label.as_str()), Some("Walk"));
        // input untouched
        assert_eq!(items[0].label, "Dinner");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items = vec![
            entry("Potty", 30),
            entry("Walk", 10),
            entry("Play", 30),
            entry("Relax", 30),
        ];
        let order = sort_by_urgency(&items);
        assert_eq!(labels(&order), vec!["Walk", "Potty", "Play", "Relax"]);
    }

    #[test]
    fn test_idempotent() {
        let items = vec![entry("B", 5), entry("A", -3), entry("C", 5), entry("D", 0)];
        let once = sort_by_urgency(&items).to_vec();
        let twice = sort_by_urgency(&once).to_vec();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_restartable() {
        let items = vec![entry("B", 2), entry("A", 1)];
        let order = sort_by_urgency(&items);

        let first: Vec<_> = (&order).into_iter().map(|p| p.label.clone()).collect();
        let second: Vec<_> = (&order).into_iter().map(|p| p.label.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_empty() {
        let order = sort_by_urgency(&[]);
        assert!(order.is_empty());
        assert!(order.first().is_none());
    }
}
