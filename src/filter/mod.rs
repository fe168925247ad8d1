//! Month/base filtering over the loaded dataset.
//!
//! Views borrow from the `Dataset`; filtering never copies or mutates records.

use tracing::debug;

use crate::domain::{Dataset, FilterSelection, TripRecord};

/// An ordered subsequence of the dataset.
#[derive(Debug, Clone, Default)]
pub struct TripView<'a> {
    records: Vec<&'a TripRecord>,
}

/// Rows matching both the month and the base selection.
pub type FilteredView<'a> = TripView<'a>;

/// Rows outside the selected months but within the selected bases.
///
/// This is the "previous period" used for growth. It is a same-dataset
/// complement, not a true prior period.
pub type ComplementView<'a> = TripView<'a>;

impl<'a> TripView<'a> {
    pub fn from_records(records: Vec<&'a TripRecord>) -> Self {
        Self { records }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Saturates at `u64::MAX`.
    pub fn total_trips(&self) -> u64 {
        self.iter().fold(0u64, |acc, r| acc.saturating_add(r.trips))
    }
}

/// Rows whose month and base are both selected.
pub fn filter<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    let view = select(dataset, |r| {
        selection.months.contains(&r.month) && selection.bases.contains(&r.dispatching_base_number)
    });
    debug!(
        months = selection.months.len(),
        bases = selection.bases.len(),
        kept = view.len(),
        of = dataset.len(),
        "filtered trip rows"
    );
    view
}

/// Rows whose month is *not* selected but whose base is.
pub fn complement<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> ComplementView<'a> {
    select(dataset, |r| {
        !selection.months.contains(&r.month) && selection.bases.contains(&r.dispatching_base_number)
    })
}

fn select<'a>(dataset: &'a Dataset, keep: impl Fn(&TripRecord) -> bool) -> TripView<'a> {
    TripView {
        records: dataset.records.iter().filter(|r| keep(r)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Month, NaiveDate};
    use proptest::prelude::*;

    use super::*;
    use crate::domain::strategies::{arb_dataset, arb_selection};

    fn dataset() -> Dataset {
        let d = |m, day| NaiveDate::from_ymd_opt(2015, m, day).unwrap();
        Dataset::from_records(vec![
            TripRecord::new(d(1, 1), "B1", 10, 1),
            TripRecord::new(d(1, 2), "B2", 20, 2),
            TripRecord::new(d(2, 1), "B1", 30, 3),
            TripRecord::new(d(2, 2), "B2", 40, 4),
            TripRecord::new(d(2, 3), "B3", 50, 5),
        ])
    }

    #[test]
    fn filter_applies_both_predicates() {
        let ds = dataset();
        let sel = FilterSelection::new([Month::February], ["B1".to_string(), "B2".to_string()]);
        let view = filter(&ds, &sel);

        assert_eq!(view.len(), 2);
        for r in view.iter() {
            assert!(sel.months.contains(&r.month));
            assert!(sel.bases.contains(&r.dispatching_base_number));
            assert!(ds.records.contains(r));
        }
        assert_eq!(view.total_trips(), 70);
    }

    #[test]
    fn default_selection_keeps_everything_in_order() {
        let ds = dataset();
        let view = filter(&ds, &FilterSelection::all(&ds));
        let trips: Vec<u64> = view.iter().map(|r| r.trips).collect();
        assert_eq!(trips, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn empty_sets_yield_empty_views() {
        let ds = dataset();
        let no_months = FilterSelection::new(Vec::<Month>::new(), ["B1".to_string()]);
        assert!(filter(&ds, &no_months).is_empty());

        let no_bases = FilterSelection::new([Month::January], Vec::<String>::new());
        assert!(filter(&ds, &no_bases).is_empty());
    }

    #[test]
    fn complement_inverts_only_the_month_predicate() {
        let ds = dataset();
        let sel = FilterSelection::new([Month::February], ["B1".to_string(), "B2".to_string()]);
        let prev = complement(&ds, &sel);

        let trips: Vec<u64> = prev.iter().map(|r| r.trips).collect();
        assert_eq!(trips, vec![10, 20]);
        assert!(prev.iter().all(|r| r.month == Month::January));
    }

    proptest! {
        #[test]
        fn prop_filter_keeps_exactly_the_selected_rows(ds in arb_dataset(), sel in arb_selection()) {
            let selected = |r: &TripRecord| {
                sel.months.contains(&r.month) && sel.bases.contains(&r.dispatching_base_number)
            };

            let view = filter(&ds, &sel);
            prop_assert!(view.iter().all(|r| selected(r)));
            prop_assert_eq!(view.len(), ds.records.iter().filter(|&r| selected(r)).count());

            // Same records, in dataset order.
            let mut rest = ds.records.iter();
            for r in view.iter() {
                prop_assert!(rest.any(|d| std::ptr::eq(d, r)));
            }

            let prev = complement(&ds, &sel);
            let prev_ok = prev.iter().all(|r| {
                !sel.months.contains(&r.month) && sel.bases.contains(&r.dispatching_base_number)
            });
            prop_assert!(prev_ok);
            prop_assert!(prev.iter().all(|p| !view.iter().any(|v| std::ptr::eq(p, v))));
        }
    }
}
