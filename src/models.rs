// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Static reference entry for a listed stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    pub name_en: String,
    pub sector: String,
    pub price: f64,
    pub change: f64,
    pub market_cap: f64,
    #[serde(default)]
    pub logo: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundCategory {
    MoneyMarket,
    Bond,
    Diversified,
    Equity,
}

impl FundCategory {
    /// Typical one-day NAV move, as a fraction of the NAV.
    pub fn daily_volatility(self) -> f64 {
        match self {
            FundCategory::MoneyMarket => 0.0002,
            FundCategory::Bond => 0.001,
            FundCategory::Diversified => 0.004,
            FundCategory::Equity => 0.008,
        }
    }
}

/// Static reference entry for a mutual fund (OPCVM).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundInfo {
    pub code: String,
    pub name: String,
    pub manager: String,
    pub category: FundCategory,
    pub nav: f64,
    pub ytd_return: f64,
    pub aum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub name_en: String,
    pub sector: String,
    pub price: f64,
    pub change: f64,
    pub market_cap: f64,
    pub logo: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorAggregate {
    pub sector: String,
    pub avg_change: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub stocks: Vec<StockQuote>,
    pub sectors: Vec<SectorAggregate>,
    pub last_update: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub symbol: String,
    pub data: Vec<HistoricalPoint>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundList {
    pub funds: Vec<FundInfo>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavHistory {
    pub fund: String,
    pub data: Vec<NavPoint>,
    pub last_update: DateTime<Utc>,
}
