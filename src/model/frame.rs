use crate::domain::model::{Slot, Year, YearState};

/// Read-only view an equation evaluates against.
///
/// `current` is the solver's single mutable buffer for the year being solved:
/// an equation sees whatever is in it at the moment it runs, including values
/// already updated earlier in the same pass. `history` holds the solved years
/// of the same run, seed year first.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    year: Year,
    current: &'a [f64],
    history: &'a [YearState],
}

impl<'a> Frame<'a> {
    pub fn new(year: Year, current: &'a [f64], history: &'a [YearState]) -> Self {
        debug_assert!(!history.is_empty(), "a run always starts from its seed year");
        Self {
            year,
            current,
            history,
        }
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn get(&self, slot: Slot) -> f64 {
        self.current[slot.index()]
    }

    /// Value `n` years back. Lags reaching before the seed year resolve to the seed.
    pub fn lag(&self, slot: Slot, n: usize) -> f64 {
        if n == 0 {
            return self.get(slot);
        }
        let len = self.history.len();
        let state = if n <= len {
            &self.history[len - n]
        } else {
            &self.history[0]
        };
        state.get(slot)
    }

    /// Seed-year value.
    pub fn base(&self, slot: Slot) -> f64 {
        self.history[0].get(slot)
    }

    /// `ln(x_t) - ln(x_{t-1})`, zero when either side is not positive.
    pub fn dln(&self, slot: Slot) -> f64 {
        log_change(self.get(slot), self.lag(slot, 1))
    }

    /// `x_t - x_{t-1}`
    pub fn d(&self, slot: Slot) -> f64 {
        self.get(slot) - self.lag(slot, 1)
    }

    /// Year-over-year growth in percent, zero when the previous value is zero.
    pub fn grt(&self, slot: Slot) -> f64 {
        growth_rate(self.get(slot), self.lag(slot, 1))
    }
}

pub fn log_change(current: f64, previous: f64) -> f64 {
    if current > 0.0 && previous > 0.0 {
        current.ln() - previous.ln()
    } else {
        0.0
    }
}

pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<YearState> {
        vec![
            YearState::new(2012, vec![100.0, 0.0]),
            YearState::new(2013, vec![110.0, 0.0]),
        ]
    }

    #[test]
    fn test_lag_reads_previous_years() {
        let history = history();
        let current = [121.0, 5.0];
        let frame = Frame::new(2014, &current, &history);

        assert_eq!(frame.get(Slot(0)), 121.0);
        assert_eq!(frame.lag(Slot(0), 1), 110.0);
        assert_eq!(frame.lag(Slot(0), 2), 100.0);
        assert_eq!(frame.base(Slot(0)), 100.0);
    }

    #[test]
    fn test_lag_before_seed_resolves_to_seed() {
        let history = history();
        let current = [121.0, 5.0];
        let frame = Frame::new(2014, &current, &history);

        assert_eq!(frame.lag(Slot(0), 5), 100.0);
    }

    #[test]
    fn test_growth_operators() {
        let history = history();
        let current = [121.0, 5.0];
        let frame = Frame::new(2014, &current, &history);

        assert!((frame.grt(Slot(0)) - 10.0).abs() < 1e-12);
        assert!((frame.dln(Slot(0)) - (1.1f64).ln()).abs() < 1e-12);
        assert_eq!(frame.d(Slot(1)), 5.0);
        // non-positive levels have no log change
        assert_eq!(frame.dln(Slot(1)), 0.0);
        assert_eq!(frame.grt(Slot(1)), 0.0);
    }
}
