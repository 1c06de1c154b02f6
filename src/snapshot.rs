// src/snapshot.rs
use crate::models::{SectorAggregate, Snapshot, StockQuote};
use crate::reference::ReferenceData;
use chrono::{DateTime, Timelike, Utc};
use std::collections::BTreeMap;

const PRICE_JITTER: f64 = 0.005;
const CHANGE_JITTER: f64 = 0.3;

pub const SNAPSHOT_SOURCE: &str = "simulated";

/// Minute of the day; stable for a whole minute.
pub fn minute_seed(now: DateTime<Utc>) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Reference quotes nudged by a small sine of the minute seed.
pub fn quote_snapshot(reference: &ReferenceData, now: DateTime<Utc>) -> Vec<StockQuote> {
    let seed = f64::from(minute_seed(now));
    reference
        .stocks()
        .iter()
        .enumerate()
        .map(|(i, info)| {
            let phase = seed * 0.1 + i as f64;
            StockQuote {
                symbol: info.symbol.clone(),
                name: info.name.clone(),
                name_en: info.name_en.clone(),
                sector: info.sector.clone(),
                price: round2(info.price * (1.0 + phase.sin() * PRICE_JITTER)),
                change: round2(info.change + phase.cos() * CHANGE_JITTER),
                market_cap: info.market_cap,
                logo: info.logo.clone(),
                timestamp: now,
            }
        })
        .collect()
}

/// Mean change and constituent count per sector, ordered by sector label.
pub fn sector_aggregates(quotes: &[StockQuote]) -> Vec<SectorAggregate> {
    let mut sectors: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for q in quotes {
        let entry = sectors.entry(q.sector.as_str()).or_insert((0.0, 0));
        entry.0 += q.change;
        entry.1 += 1;
    }
    sectors
        .into_iter()
        .map(|(sector, (total, count))| SectorAggregate {
            sector: sector.to_string(),
            avg_change: round2(total / count as f64),
            count,
        })
        .collect()
}

pub fn build_snapshot(reference: &ReferenceData, now: DateTime<Utc>) -> Snapshot {
    let stocks = quote_snapshot(reference, now);
    let sectors = sector_aggregates(&stocks);
    Snapshot {
        stocks,
        sectors,
        last_update: now,
        source: SNAPSHOT_SOURCE.to_string(),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
