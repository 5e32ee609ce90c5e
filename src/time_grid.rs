// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Equidistant time grids and the time series defined on them.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{Error, Unit};

/// Number of time steps in the default grid: one year of hours.
pub const DEFAULT_NUM_TIME_STEPS: usize = 8760;

/// An ordered sequence of equally spaced time stamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeGrid {
    start: NaiveDateTime,
    step: Duration,
    len: usize,
}

impl Default for TimeGrid {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            start,
            step: Duration::hours(1),
            len: DEFAULT_NUM_TIME_STEPS,
        }
    }
}

impl TimeGrid {
    /// Creates a grid of `len` time stamps, starting at `start` and `step`
    /// apart.
    ///
    /// The step must be at least one second long, and is resolved to whole
    /// milliseconds.  All time stamps of the grid must be representable.
    pub fn try_new(start: NaiveDateTime, step: Duration, len: usize) -> Result<Self, Error> {
        if step <= Duration::zero() {
            return Err(Error::invalid_config(format!(
                "Time step must be positive, got {} s.",
                step.num_seconds()
            )));
        }
        if step < Duration::seconds(1) {
            return Err(Error::invalid_config(format!(
                "Time step must be at least 1 s, got {} ms.",
                step.num_milliseconds()
            )));
        }
        if len == 0 {
            return Err(Error::invalid_config("Time grid must not be empty."));
        }

        let grid = Self { start, step, len };
        if grid.timestamp(len - 1).is_none() {
            return Err(Error::invalid_config(format!(
                "Time grid of {len} steps of {} s from {start} ends out of range.",
                step.num_seconds()
            )));
        }
        Ok(grid)
    }

    /// Creates an hourly grid of `len` time stamps, starting at the beginning
    /// of `year`.
    pub fn hourly(year: i32, len: usize) -> Result<Self, Error> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| Error::invalid_config(format!("Invalid year: {year}.")))?;
        Self::try_new(start, Duration::hours(1), len)
    }

    /// Creates a grid from explicit time stamps, which must be strictly
    /// increasing and equidistant.
    pub fn from_timestamps(stamps: &[NaiveDateTime]) -> Result<Self, Error> {
        let [first, second, ..] = stamps else {
            return Err(Error::invalid_config(
                "At least two time stamps are needed to derive the interval length.",
            ));
        };
        let step = *second - *first;
        for pair in stamps.windows(2) {
            if pair[1] - pair[0] != step {
                return Err(Error::invalid_config(format!(
                    "Time stamps are not equidistant: {} -> {} differs from the first interval of {} s.",
                    pair[0],
                    pair[1],
                    step.num_seconds()
                )));
            }
        }
        Self::try_new(*first, step, stamps.len())
    }

    /// Returns the number of time stamps.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the grid has no time stamps.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the first time stamp.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Returns the distance between two consecutive time stamps.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Returns the interval length in hours.
    pub fn interval_length_hours(&self) -> f64 {
        self.step.num_milliseconds() as f64 / 3_600_000.0
    }

    /// Returns an iterator over the time stamps.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.len).map_while(|i| self.timestamp(i))
    }

    /// Returns the `i`-th time stamp, or `None` if it is out of range.
    fn timestamp(&self, i: usize) -> Option<NaiveDateTime> {
        let offset = self
            .step
            .num_milliseconds()
            .checked_mul(i64::try_from(i).ok()?)?;
        self.start.checked_add_signed(Duration::milliseconds(offset))
    }
}

/// Values on a [`TimeGrid`], optionally tagged with a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    grid: TimeGrid,
    values: Vec<f64>,
    unit: Option<Unit>,
}

impl TimeSeries {
    /// Creates a time series from one value per time stamp of `grid`.
    pub fn new(grid: &TimeGrid, values: Vec<f64>) -> Result<Self, Error> {
        if values.len() != grid.len() {
            return Err(Error::invalid_config(format!(
                "Time series has {} values, but its time grid has {} time stamps.",
                values.len(),
                grid.len()
            )));
        }
        Ok(Self {
            grid: grid.clone(),
            values,
            unit: None,
        })
    }

    /// Creates a time series with the same value at every time stamp.
    pub fn constant(value: f64, grid: &TimeGrid) -> Self {
        Self {
            grid: grid.clone(),
            values: vec![value; grid.len()],
            unit: None,
        }
    }

    /// Creates a time series by evaluating `f` for each time step index.
    pub fn from_fn(grid: &TimeGrid, f: impl FnMut(usize) -> f64) -> Self {
        Self {
            grid: grid.clone(),
            values: (0..grid.len()).map(f).collect(),
            unit: None,
        }
    }

    /// Tags the values with a unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Returns the time grid of the series.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Returns the raw values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the unit of the values, if any.
    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the values expressed in `target`.
    pub(crate) fn magnitudes(&self, target: &Unit) -> Result<Vec<f64>, Error> {
        let factor = match &self.unit {
            Some(unit) => unit.factor_to(target)?,
            None => 1.0,
        };
        Ok(self.values.iter().map(|v| v * factor).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_default_grid() {
        let grid = TimeGrid::default();
        assert_eq!(grid.len(), DEFAULT_NUM_TIME_STEPS);
        assert_eq!(grid.start(), stamp(0));
        assert_eq!(grid.interval_length_hours(), 1.0);
        assert_eq!(grid, TimeGrid::hourly(2020, DEFAULT_NUM_TIME_STEPS).unwrap());
        assert_ne!(grid, TimeGrid::hourly(2019, DEFAULT_NUM_TIME_STEPS).unwrap());
    }

    #[test]
    fn test_from_timestamps() {
        let grid = TimeGrid::from_timestamps(&[stamp(0), stamp(2), stamp(4)]).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.interval_length_hours(), 2.0);
        assert!(grid.timestamps().eq([stamp(0), stamp(2), stamp(4)]));

        assert!(
            TimeGrid::from_timestamps(&[stamp(0), stamp(1), stamp(3)]).is_err_and(|e| e
                == Error::invalid_config(
                    "Time stamps are not equidistant: 2020-01-01 01:00:00 -> \
                     2020-01-01 03:00:00 differs from the first interval of 3600 s."
                ))
        );
        assert!(TimeGrid::from_timestamps(&[stamp(0)]).is_err_and(|e| e
            == Error::invalid_config(
                "At least two time stamps are needed to derive the interval length."
            )));
        assert!(TimeGrid::from_timestamps(&[stamp(1), stamp(0)]).is_err_and(|e| e
            == Error::invalid_config("Time step must be positive, got -3600 s.")));
    }

    #[test]
    fn test_step_length() {
        let grid = TimeGrid::try_new(stamp(0), Duration::minutes(15), 4).unwrap();
        assert_eq!(grid.interval_length_hours(), 0.25);
        let last = NaiveDate::from_ymd_opt(2020, 1, 1).and_then(|d| d.and_hms_opt(0, 45, 0));
        assert_eq!(grid.timestamps().last(), last);

        let grid = TimeGrid::try_new(stamp(0), Duration::milliseconds(1500), 2).unwrap();
        assert!((grid.interval_length_hours() - 1.5 / 3600.0).abs() < 1e-15);

        assert!(
            TimeGrid::try_new(stamp(0), Duration::milliseconds(500), 4).is_err_and(|e| e
                == Error::invalid_config("Time step must be at least 1 s, got 500 ms."))
        );
    }

    #[test]
    fn test_grid_out_of_range() {
        assert!(
            TimeGrid::try_new(stamp(0), Duration::days(1_000_000), 1000).is_err_and(|e| e
                == Error::invalid_config(
                    "Time grid of 1000 steps of 86400000000 s from 2020-01-01 00:00:00 \
                     ends out of range."
                ))
        );
        assert!(TimeGrid::try_new(stamp(0), Duration::hours(1), usize::MAX).is_err());

        let grid = TimeGrid::hourly(2020, DEFAULT_NUM_TIME_STEPS).unwrap();
        assert_eq!(grid.timestamps().count(), DEFAULT_NUM_TIME_STEPS);
    }

    #[test]
    fn test_time_series() {
        let grid = TimeGrid::hourly(2020, 4).unwrap();
        let series = TimeSeries::constant(23.0, &grid);
        assert_eq!(series.values(), &[23.0; 4]);
        assert_eq!(series.grid(), &grid);

        let alternating = TimeSeries::from_fn(&grid, |t| (t % 2) as f64);
        assert_eq!(alternating.values(), &[0.0, 1.0, 0.0, 1.0]);

        let in_kw = TimeSeries::constant(500.0, &grid).with_unit(Unit::parse("kW").unwrap());
        let in_mw = in_kw.magnitudes(&Unit::parse("MW").unwrap()).unwrap();
        assert!(in_mw.iter().all(|v| (v - 0.5).abs() < 1e-12));

        assert!(TimeSeries::new(&grid, vec![1.0]).is_err_and(|e| e
            == Error::invalid_config(
                "Time series has 1 values, but its time grid has 4 time stamps."
            )));
    }
}
