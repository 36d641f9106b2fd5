use std::collections::VecDeque;

use serde::Serialize;

use crate::odds::{finite, ratio};

pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_MIN_PERIODS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub size: usize,
    pub min_periods: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW,
            min_periods: DEFAULT_MIN_PERIODS,
        }
    }
}

impl WindowSpec {
    pub fn new(size: usize, min_periods: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            min_periods: min_periods.clamp(1, size),
        }
    }
}

/// Mean, sample standard deviation and coefficient of variation of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RollingStat {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub cv: Option<f64>,
}

/// Trailing window over the last `size` observations of one (team, role) stream.
///
/// Callers read `stat()` before `push()`ing the current match, so the value
/// attributed to a match only ever covers earlier matches. Missing
/// observations occupy a slot but do not count towards `min_periods`.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    spec: WindowSpec,
    values: VecDeque<Option<f64>>,
}

impl RollingWindow {
    pub fn new(spec: WindowSpec) -> Self {
        Self {
            spec,
            values: VecDeque::with_capacity(spec.size),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        if self.values.len() == self.spec.size {
            self.values.pop_front();
        }
        self.values.push_back(value.and_then(finite));
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().flatten().count()
    }

    pub fn mean(&self) -> Option<f64> {
        let n = self.valid_count();
        if n == 0 || n < self.spec.min_periods {
            return None;
        }
        let sum: f64 = self.values.iter().flatten().sum();
        finite(sum / n as f64)
    }

    /// Sample (n - 1) standard deviation.
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.valid_count();
        if n < 2 {
            return None;
        }
        let ss: f64 = self
            .values
            .iter()
            .flatten()
            .map(|v| (v - mean).powi(2))
            .sum();
        finite((ss / (n - 1) as f64).sqrt())
    }

    pub fn stat(&self) -> RollingStat {
        let mean = self.mean();
        let std = self.std();
        let cv = match mean {
            Some(m) if m != 0.0 => ratio(std, Some(m)),
            _ => None,
        };
        RollingStat { mean, std, cv }
    }

    /// Rolling mean of a 0/1 indicator as a percentage.
    pub fn percent(&self) -> Option<f64> {
        self.mean().and_then(|m| finite(m * 100.0))
    }
}
