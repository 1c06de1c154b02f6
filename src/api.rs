// src/api.rs
use crate::config::{Config, DEFAULT_MAX_HISTORY_DAYS};
use crate::error::ApiError;
use crate::history::{generate_history, DEFAULT_LOOKBACK_DAYS};
use crate::models::{FundList, History, NavHistory};
use crate::nav::generate_nav_history;
use crate::reference::ReferenceData;
use crate::series::series_rng;
use crate::snapshot::build_snapshot;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const SNAPSHOT_MAX_AGE: u32 = 60;
const HISTORY_MAX_AGE: u32 = 300;

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Fixed seed for reproducible series; fresh entropy per request when unset.
    pub rng_seed: Option<u64>,
    pub max_history_days: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            rng_seed: None,
            max_history_days: DEFAULT_MAX_HISTORY_DAYS,
        }
    }
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        Self {
            rng_seed: config.rng_seed,
            max_history_days: config.max_history_days,
        }
    }
}

pub struct AppContext {
    pub reference: ReferenceData,
    pub settings: ApiSettings,
}

impl AppContext {
    pub fn new(reference: ReferenceData, settings: ApiSettings) -> Self {
        Self {
            reference,
            settings,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub action: Option<String>,
    pub symbol: Option<String>,
    pub fund: Option<String>,
    pub days: Option<String>,
}

/// The market-data endpoint, served at `/` and `/market-data`.
pub fn routes(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let mount = warp::path::end().or(warp::path!("market-data")).unify();

    let market = mount
        .clone()
        .and(warp::get())
        .and(warp::query::<MarketQuery>())
        .and(with_context(ctx))
        .and_then(market_handler);

    let preflight = mount.and(warp::options()).map(warp::reply);

    market
        .or(preflight)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(cors_headers()))
        .with(warp::log("bourse_data::api"))
}

fn with_context(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (Arc<AppContext>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers
}

async fn market_handler(query: MarketQuery, ctx: Arc<AppContext>) -> Result<Response, Rejection> {
    let now = Utc::now();
    let result = match query.action.as_deref() {
        Some("history") => history_reply(&query, &ctx, now),
        Some("nav") => nav_reply(&query, &ctx, now),
        Some("funds") => funds_reply(&ctx, now),
        _ => snapshot_reply(&ctx, now),
    };
    result.map_err(warp::reject::custom)
}

fn snapshot_reply(ctx: &AppContext, now: DateTime<Utc>) -> Result<Response, ApiError> {
    let snapshot = build_snapshot(&ctx.reference, now);
    info!(
        "Served snapshot of {} quotes across {} sectors",
        snapshot.stocks.len(),
        snapshot.sectors.len()
    );
    json_response(&snapshot, SNAPSHOT_MAX_AGE)
}

fn history_reply(
    query: &MarketQuery,
    ctx: &AppContext,
    now: DateTime<Utc>,
) -> Result<Response, ApiError> {
    let info = query
        .symbol
        .as_deref()
        .and_then(|s| ctx.reference.stock(s.trim()))
        .ok_or_else(|| ApiError::SymbolNotFound {
            symbol: query.symbol.clone(),
        })?;
    let days = lookback_days(query.days.as_deref(), ctx.settings.max_history_days);
    let mut rng = series_rng(ctx.settings.rng_seed);
    let data = generate_history(info, days, now.date_naive(), &mut rng);
    info!(
        "Generated {} bars for {} over {} days",
        data.len(),
        info.symbol,
        days
    );
    let history = History {
        symbol: info.symbol.clone(),
        data,
        last_update: now,
    };
    json_response(&history, HISTORY_MAX_AGE)
}

fn funds_reply(ctx: &AppContext, now: DateTime<Utc>) -> Result<Response, ApiError> {
    let list = FundList {
        funds: ctx.reference.funds().to_vec(),
        last_update: now,
    };
    json_response(&list, HISTORY_MAX_AGE)
}

fn nav_reply(
    query: &MarketQuery,
    ctx: &AppContext,
    now: DateTime<Utc>,
) -> Result<Response, ApiError> {
    let fund = query
        .fund
        .as_deref()
        .and_then(|code| ctx.reference.fund(code.trim()))
        .ok_or_else(|| ApiError::FundNotFound {
            fund: query.fund.clone(),
        })?;
    let days = lookback_days(query.days.as_deref(), ctx.settings.max_history_days);
    let mut rng = series_rng(ctx.settings.rng_seed);
    let data = generate_nav_history(fund, days, now.date_naive(), &mut rng);
    info!("Generated {} NAV points for {}", data.len(), fund.code);
    let history = NavHistory {
        fund: fund.code.clone(),
        data,
        last_update: now,
    };
    json_response(&history, HISTORY_MAX_AGE)
}

/// Missing, unparsable or zero lookbacks fall back to a year; the rest are
/// capped at `max`.
pub fn lookback_days(raw: Option<&str>, max: u32) -> u32 {
    raw.and_then(|d| d.trim().parse::<u32>().ok())
        .filter(|&d| d > 0)
        .unwrap_or(DEFAULT_LOOKBACK_DAYS)
        .min(max)
}

fn json_response<T: Serialize>(body: &T, max_age: u32) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body)?;
    let response = warp::http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(CACHE_CONTROL, format!("public, max-age={}", max_age))
        .body(Body::from(bytes))?;
    Ok(response)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(api_err) = err.find::<ApiError>() {
        match api_err {
            ApiError::SymbolNotFound { symbol } => {
                warn!("History requested for unknown symbol {:?}", symbol);
                (
                    StatusCode::NOT_FOUND,
                    json!({ "error": api_err.to_string(), "symbol": symbol }),
                )
            }
            ApiError::FundNotFound { fund } => {
                warn!("NAV requested for unknown fund {:?}", fund);
                (
                    StatusCode::NOT_FOUND,
                    json!({ "error": api_err.to_string(), "fund": fund }),
                )
            }
            ApiError::Internal(message) => {
                error!("Failed to serve market data: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "message": message }),
                )
            }
        }
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "error": "Not found" }))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
        )
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid query", "message": e.to_string() }),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error", "message": format!("{:?}", err) }),
        )
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_defaults_and_caps() {
        assert_eq!(lookback_days(None, 3650), 365);
        assert_eq!(lookback_days(Some("abc"), 3650), 365);
        assert_eq!(lookback_days(Some("0"), 3650), 365);
        assert_eq!(lookback_days(Some("-5"), 3650), 365);
        assert_eq!(lookback_days(Some(" 30 "), 3650), 30);
        assert_eq!(lookback_days(Some("100000"), 3650), 3650);
        assert_eq!(lookback_days(None, 90), 90);
    }

    #[tokio::test]
    async fn internal_errors_become_500() {
        let rejection = warp::reject::custom(ApiError::Internal("boom".into()));
        let response = handle_rejection(rejection).await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal server error");
        assert_eq!(value["message"], "boom");
    }
}
