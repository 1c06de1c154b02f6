// src/reference.rs
use crate::error::SetupError;
use crate::models::{FundCategory, FundInfo, StockInfo};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Reference prices and metadata for every listed stock and fund.
///
/// Built once at start-up and shared read-only with the request handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceData {
    stocks: Vec<StockInfo>,
    #[serde(default)]
    funds: Vec<FundInfo>,
}

impl ReferenceData {
    /// Casablanca Stock Exchange constituents with fallback reference prices.
    pub fn builtin() -> Self {
        let stocks = vec![
            stock("ATW", "Attijariwafa Bank", "Attijariwafa Bank", "Banques", 425.80, 1.25, 91.6),
            stock("IAM", "Maroc Telecom", "Maroc Telecom", "Télécommunications", 98.50, -0.45, 86.6),
            stock("BCP", "Banque Centrale Populaire", "Central Popular Bank", "Banques", 268.00, 0.75, 54.3),
            stock("BOA", "Bank of Africa", "Bank of Africa", "Banques", 188.00, -0.30, 39.9),
            stock("CIH", "CIH Bank", "CIH Bank", "Banques", 345.00, 2.10, 9.2),
            stock("LHM", "LafargeHolcim Maroc", "LafargeHolcim Morocco", "Bâtiment et Matériaux", 1780.00, 0.55, 41.7),
            stock("MNG", "Managem", "Managem", "Mines", 2150.00, 3.40, 21.5),
            stock("CSR", "Cosumar", "Cosumar", "Agroalimentaire", 195.00, -1.10, 18.4),
            stock("TQM", "Taqa Morocco", "Taqa Morocco", "Électricité", 1150.00, 0.90, 27.1),
            stock("ADH", "Douja Prom Addoha", "Addoha Real Estate", "Immobilier", 28.50, -2.35, 11.2),
            stock("LBV", "Label'Vie", "Label'Vie", "Distribution", 4300.00, 0.20, 12.2),
            stock("WAA", "Wafa Assurance", "Wafa Insurance", "Assurances", 4100.00, -0.65, 14.4),
        ];
        let funds = vec![
            fund("CDGM", "CDG Capital Monétaire", "CDG Capital Gestion", FundCategory::MoneyMarket, 1185.42, 2.35, 8.9),
            fund("AWOB", "Attijari Obligations", "Wafa Gestion", FundCategory::Bond, 2430.17, 4.10, 6.4),
            fund("UDIV", "Upline Diversifié", "Upline Capital Management", FundCategory::Diversified, 315.88, 7.85, 1.7),
            fund("RMAA", "RMA Actions", "RMA Asset Management", FundCategory::Equity, 1642.05, 12.60, 2.3),
        ];
        Self { stocks, funds }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SetupError> {
        let data: ReferenceData = serde_json::from_str(raw)?;
        data.validate()?;
        Ok(data)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SetupError> {
        let raw = fs::read_to_string(path)?;
        let data = Self::from_json_str(&raw)?;
        info!(
            "Loaded {} stocks and {} funds from {}",
            data.stocks.len(),
            data.funds.len(),
            path.display()
        );
        Ok(data)
    }

    pub fn stocks(&self) -> &[StockInfo] {
        &self.stocks
    }

    pub fn funds(&self) -> &[FundInfo] {
        &self.funds
    }

    pub fn stock(&self, symbol: &str) -> Option<&StockInfo> {
        self.stocks
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn fund(&self, code: &str) -> Option<&FundInfo> {
        self.funds.iter().find(|f| f.code.eq_ignore_ascii_case(code))
    }

    fn validate(&self) -> Result<(), SetupError> {
        if self.stocks.is_empty() {
            return Err(SetupError::InvalidReference("no stocks listed".into()));
        }
        let mut seen = HashSet::new();
        for s in &self.stocks {
            if s.symbol.trim().is_empty() {
                return Err(SetupError::InvalidReference("empty stock symbol".into()));
            }
            if !(s.price.is_finite() && s.price > 0.0) {
                return Err(SetupError::InvalidReference(format!(
                    "{}: price must be positive, got {}",
                    s.symbol, s.price
                )));
            }
            if !s.change.is_finite() || !s.market_cap.is_finite() || s.market_cap < 0.0 {
                return Err(SetupError::InvalidReference(format!(
                    "{}: change and market cap must be finite",
                    s.symbol
                )));
            }
            if !seen.insert(s.symbol.to_ascii_uppercase()) {
                return Err(SetupError::InvalidReference(format!(
                    "duplicate symbol {}",
                    s.symbol
                )));
            }
        }
        seen.clear();
        for f in &self.funds {
            if f.code.trim().is_empty() {
                return Err(SetupError::InvalidReference("empty fund code".into()));
            }
            if !(f.nav.is_finite() && f.nav > 0.0) || !f.ytd_return.is_finite() {
                return Err(SetupError::InvalidReference(format!(
                    "{}: nav must be positive",
                    f.code
                )));
            }
            if !seen.insert(f.code.to_ascii_uppercase()) {
                return Err(SetupError::InvalidReference(format!(
                    "duplicate fund {}",
                    f.code
                )));
            }
        }
        Ok(())
    }
}

fn stock(
    symbol: &str,
    name: &str,
    name_en: &str,
    sector: &str,
    price: f64,
    change: f64,
    market_cap: f64,
) -> StockInfo {
    StockInfo {
        symbol: symbol.to_string(),
        name: name.to_string(),
        name_en: name_en.to_string(),
        sector: sector.to_string(),
        price,
        change,
        market_cap,
        logo: format!("/logos/{}.png", symbol.to_lowercase()),
    }
}

fn fund(
    code: &str,
    name: &str,
    manager: &str,
    category: FundCategory,
    nav: f64,
    ytd_return: f64,
    aum: f64,
) -> FundInfo {
    FundInfo {
        code: code.to_string(),
        name: name.to_string(),
        manager: manager.to_string(),
        category,
        nav,
        ytd_return,
        aum,
    }
}
