// src/nav.rs
use crate::models::{FundInfo, NavPoint};
use crate::series::{trading_days, BoundedWalk};
use chrono::NaiveDate;
use rand::Rng;

pub const NAV_FLOOR_RATIO: f64 = 0.8;
pub const NAV_CEILING_RATIO: f64 = 1.2;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily NAV series ending on the fund's reference NAV. The walk drifts at
/// the fund's year-to-date pace with noise sized by its category.
pub fn generate_nav_history<R: Rng>(
    fund: &FundInfo,
    days: u32,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<NavPoint> {
    let annual = fund.ytd_return / 100.0;
    let start = fund.nav * (1.0 - annual * f64::from(days) / 365.0);
    let mut walk = BoundedWalk::new(
        start,
        NAV_FLOOR_RATIO * fund.nav,
        NAV_CEILING_RATIO * fund.nav,
    );
    let drift = annual / TRADING_DAYS_PER_YEAR * fund.nav;
    let volatility = fund.category.daily_volatility() * fund.nav;

    let sessions = trading_days(today, days);
    let last = sessions.len().saturating_sub(1);
    let mut points = Vec::with_capacity(sessions.len());
    for (i, (_, date)) in sessions.into_iter().enumerate() {
        let noise = rng.gen_range(-1.0..1.0) * volatility;
        let nav = if i == last {
            fund.nav
        } else {
            walk.step(drift + noise)
        };
        points.push(NavPoint { date, nav });
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;
    use crate::series::{is_trading_day, series_rng};

    #[test]
    fn nav_stays_in_band_and_ends_on_reference() {
        let reference = ReferenceData::builtin();
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let mut rng = series_rng(Some(11));
        for fund in reference.funds() {
            for days in [5, 90, 365, 2000] {
                let series = generate_nav_history(fund, days, today, &mut rng);
                assert!(!series.is_empty());
                for p in &series {
                    assert!(is_trading_day(p.date));
                    assert!(p.nav >= NAV_FLOOR_RATIO * fund.nav);
                    assert!(p.nav <= NAV_CEILING_RATIO * fund.nav);
                }
                assert_eq!(series.last().unwrap().nav, fund.nav);
            }
        }
    }

    #[test]
    fn money_market_moves_less_than_equity() {
        let reference = ReferenceData::builtin();
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let spread = |code: &str| {
            let fund = reference.fund(code).unwrap();
            let series = generate_nav_history(fund, 365, today, &mut series_rng(Some(2)));
            let walked = &series[..series.len() - 1];
            let steps: Vec<f64> = walked
                .windows(2)
                .map(|w| ((w[1].nav - w[0].nav) / fund.nav).abs())
                .collect();
            steps.iter().cloned().fold(0.0, f64::max)
        };
        assert!(spread("CDGM") < spread("RMAA"));
    }
}
