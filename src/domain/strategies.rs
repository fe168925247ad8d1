//! Proptest strategies for generated trip datasets and filter selections.

use chrono::{Month, NaiveDate};
use proptest::prelude::*;

use super::{Dataset, FilterSelection, TripRecord};

pub const BASES: [&str; 4] = ["B02512", "B02598", "B02617", "B02764"];

prop_compose! {
    pub fn arb_record()(
        month in 1u32..=3,
        day in 1u32..=28,
        base in 0..BASES.len(),
        trips in 0u64..20_000,
        vehicles in 0u64..2_000,
    ) -> TripRecord {
        let date = NaiveDate::from_ymd_opt(2015, month, day).unwrap();
        TripRecord::new(date, BASES[base], trips, vehicles)
    }
}

prop_compose! {
    pub fn arb_dataset()(records in prop::collection::vec(arb_record(), 0..60)) -> Dataset {
        Dataset::from_records(records)
    }
}

prop_compose! {
    /// Any subset of months 1..=4 and of `BASES`; April never occurs in the data.
    pub fn arb_selection()(
        months in prop::sample::subsequence(vec![1u8, 2, 3, 4], 0..=4),
        bases in prop::sample::subsequence(BASES.to_vec(), 0..=BASES.len()),
    ) -> FilterSelection {
        FilterSelection::new(
            months.into_iter().filter_map(|m| Month::try_from(m).ok()),
            bases.into_iter().map(str::to_string),
        )
    }
}
