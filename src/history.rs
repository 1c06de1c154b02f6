// src/history.rs
use crate::models::{HistoricalPoint, StockInfo};
use crate::series::{symbol_seed, trading_days, BoundedWalk};
use chrono::NaiveDate;
use rand::Rng;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

pub const FLOOR_RATIO: f64 = 0.6;
pub const CEILING_RATIO: f64 = 1.4;

const NOISE_SCALE: f64 = 0.015;
const UP_BIAS: f64 = 0.0005;
const DOWN_BIAS: f64 = -0.0003;

/// Daily OHLCV bars for the weekdays of the last `days` calendar days,
/// oldest first. The walk starts half the stated change away from the
/// reference price and the final bar closes exactly on it.
pub fn generate_history<R: Rng>(
    info: &StockInfo,
    days: u32,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<HistoricalPoint> {
    let reference = info.price;
    let start = reference * (1.0 - info.change / 200.0);
    let mut walk = BoundedWalk::new(
        start,
        FLOOR_RATIO * reference,
        CEILING_RATIO * reference,
    );
    let phase = symbol_seed(&info.symbol);
    let bias = (if info.change > 0.0 { UP_BIAS } else { DOWN_BIAS }) * reference;
    let base_volume = info.market_cap * 100.0;

    let sessions = trading_days(today, days);
    let last = sessions.len().saturating_sub(1);
    let mut points = Vec::with_capacity(sessions.len());
    for (i, (back, date)) in sessions.into_iter().enumerate() {
        let wave = (f64::from(back) * 0.1 + phase).sin() * 2.0;
        let noise = (wave + rng.gen::<f64>() - 0.48) * NOISE_SCALE * reference;
        let mut close = walk.step(noise + bias);
        if i == last {
            close = reference;
        }
        points.push(synthesize_bar(date, close, base_volume, rng));
    }
    points
}

// Open, high and low are jittered independently of each other, so only the
// close is guaranteed to sit between low and high.
fn synthesize_bar<R: Rng>(
    date: NaiveDate,
    close: f64,
    base_volume: f64,
    rng: &mut R,
) -> HistoricalPoint {
    let open = close * (1.0 - rng.gen_range(0.0..0.01));
    let high = close * (1.0 + rng.gen_range(0.0..0.02));
    let low = close * (1.0 - rng.gen_range(0.0..0.02));
    let volume = (base_volume * rng.gen_range(0.5..=2.0)).round().max(0.0) as u64;
    HistoricalPoint {
        date,
        open,
        high,
        low,
        close,
        volume,
    }
}
