// src/series.rs
//! Building blocks shared by every synthetic series: a seedable RNG, the
//! weekday calendar and a random walk held inside a fixed band.
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded generators replay the same series; `None` draws from OS entropy.
pub fn series_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Sum of the symbol's character codes, used as a per-symbol phase.
pub fn symbol_seed(symbol: &str) -> f64 {
    symbol.chars().map(|c| c as u32 as f64).sum()
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in `[today - days, today]`, oldest first, each paired with how
/// many calendar days before `today` it falls.
pub fn trading_days(today: NaiveDate, days: u32) -> Vec<(u32, NaiveDate)> {
    (0..=days)
        .rev()
        .filter_map(|back| {
            let date = today.checked_sub_signed(Duration::days(i64::from(back)))?;
            is_trading_day(date).then_some((back, date))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BoundedWalk {
    value: f64,
    floor: f64,
    ceiling: f64,
}

impl BoundedWalk {
    pub fn new(start: f64, floor: f64, ceiling: f64) -> Self {
        Self {
            value: start.clamp(floor, ceiling),
            floor,
            ceiling,
        }
    }

    pub fn step(&mut self, delta: f64) -> f64 {
        self.value = (self.value + delta).clamp(self.floor, self.ceiling);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
