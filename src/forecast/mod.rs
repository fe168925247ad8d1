//! Seven-day demand forecast.
//!
//! A straight line is fitted to daily trip totals against the zero-based
//! position of each day in the series. Gaps between dates are not modelled:
//! the n-th observed day is simply `x = n`. The line is extrapolated to the
//! next seven positions, which are paired with the seven calendar days after
//! the last observation.

use chrono::Duration;
use serde::Serialize;

use crate::domain::{DailyTotal, ForecastPoint};
use crate::error::InsufficientDataError;
use crate::math::{LinearFit, fit_line};

pub const HORIZON_DAYS: usize = 7;

/// Forecast output: the fitted line and the extrapolated points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub fit: LinearFit,
    pub points: Vec<ForecastPoint>,
}

/// Fit the series and predict the next `HORIZON_DAYS` days.
pub fn forecast(series: &[DailyTotal]) -> Result<Forecast, InsufficientDataError> {
    let n = series.len();
    let insufficient = InsufficientDataError { points: n };
    if n < 2 {
        return Err(insufficient);
    }

    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let ys: Vec<f64> = series.iter().map(|p| p.trips as f64).collect();
    let fit = fit_line(&xs, &ys).ok_or(insufficient)?;

    let last = series[n - 1].date;
    let points = (0..HORIZON_DAYS)
        .map(|k| ForecastPoint {
            date: last + Duration::days(k as i64 + 1),
            trips: fit.predict((n + k) as f64),
        })
        .collect();

    Ok(Forecast { fit, points })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn series(start: NaiveDate, trips: &[u64]) -> Vec<DailyTotal> {
        trips
            .iter()
            .enumerate()
            .map(|(i, &t)| DailyTotal {
                date: start + Duration::days(i as i64),
                trips: t,
            })
            .collect()
    }

    #[test]
    fn constant_series_forecasts_the_constant() {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let out = forecast(&series(start, &[500; 6])).unwrap();
        assert_eq!(out.points.len(), HORIZON_DAYS);
        assert!(out.fit.slope.abs() < 1e-9);
        for p in &out.points {
            assert!((p.trips - 500.0).abs() < 1e-6);
        }
    }

    #[test]
    fn dates_are_contiguous_after_last_observation() {
        let start = NaiveDate::from_ymd_opt(2015, 2, 25).unwrap();
        let out = forecast(&series(start, &[1, 2, 3, 4])).unwrap();
        let last = start + Duration::days(3);
        for (k, p) in out.points.iter().enumerate() {
            assert_eq!(p.date, last + Duration::days(k as i64 + 1));
        }
        assert_eq!(
            out.points.last().unwrap().date,
            NaiveDate::from_ymd_opt(2015, 3, 7).unwrap()
        );
    }

    #[test]
    fn gaps_in_dates_are_ignored_by_the_fit() {
        // Index-based: 10, 20, 30 at positions 0, 1, 2 regardless of the gap.
        let d = |day| NaiveDate::from_ymd_opt(2015, 1, day).unwrap();
        let s = vec![
            DailyTotal { date: d(1), trips: 10 },
            DailyTotal { date: d(2), trips: 20 },
            DailyTotal { date: d(20), trips: 30 },
        ];
        let out = forecast(&s).unwrap();
        assert!((out.points[0].trips - 40.0).abs() < 1e-6);
        assert_eq!(out.points[0].date, d(21));
    }

    #[test]
    fn one_point_is_insufficient() {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let err = forecast(&series(start, &[42])).unwrap_err();
        assert_eq!(err, InsufficientDataError { points: 1 });
        assert!(forecast(&[]).is_err());
    }
}
