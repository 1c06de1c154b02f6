use bourse_data::api::{routes, ApiSettings, AppContext};
use bourse_data::client::{watch_snapshots, ClientError, MarketDataClient};
use bourse_data::reference::ReferenceData;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

fn spawn_server() -> SocketAddr {
    let ctx = Arc::new(AppContext::new(
        ReferenceData::builtin(),
        ApiSettings {
            rng_seed: Some(5),
            ..ApiSettings::default()
        },
    ));
    let (addr, server) = warp::serve(routes(ctx)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn client(addr: SocketAddr) -> MarketDataClient {
    MarketDataClient::new(format!("http://{}/", addr)).with_retries(1, Duration::from_millis(10))
}

#[tokio::test]
async fn fetches_snapshot_and_history() {
    let client = client(spawn_server());

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.source, "simulated");
    assert!(snapshot.stocks.iter().any(|q| q.symbol == "LHM"));

    let history = client.history("ATW", Some(30)).await.unwrap();
    assert_eq!(history.symbol, "ATW");
    assert!(history.data.len() <= 30);
    assert_eq!(history.data.last().unwrap().close, 425.80);
}

#[tokio::test]
async fn fetches_funds_and_nav() {
    let client = client(spawn_server());
    let funds = client.funds().await.unwrap();
    let code = funds.funds[0].code.clone();
    let nav = client.nav_history(&code, Some(20)).await.unwrap();
    assert_eq!(nav.fund, code);
    assert_eq!(nav.data.last().unwrap().nav, funds.funds[0].nav);
}

#[tokio::test]
async fn unknown_symbol_surfaces_status() {
    let client = client(spawn_server());
    match client.history("ZZZZ", None).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("Symbol not found"));
        }
        other => panic!("expected 404, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let err = client(unreachable_addr()).snapshot().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}

#[tokio::test]
async fn watcher_forwards_snapshots() {
    let client = client(spawn_server());
    let (tx, mut rx) = mpsc::channel(1);
    let watcher = tokio::spawn(watch_snapshots(client, Duration::from_millis(20), tx));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.stocks.len(), second.stocks.len());

    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher stops once the receiver is dropped")
        .unwrap();
}

// A free port, released again so nothing is listening there.
fn unreachable_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn watcher_stops_when_receiver_dropped_and_server_down() {
    let (tx, rx) = mpsc::channel(1);
    let watcher = tokio::spawn(watch_snapshots(
        client(unreachable_addr()),
        Duration::from_millis(10),
        tx,
    ));
    drop(rx);
    tokio::time::timeout(Duration::from_millis(500), watcher)
        .await
        .expect("watcher stops even though every fetch fails")
        .unwrap();
}

#[tokio::test]
async fn watcher_accepts_zero_interval() {
    let (tx, mut rx) = mpsc::channel(1);
    let watcher = tokio::spawn(watch_snapshots(client(spawn_server()), Duration::ZERO, tx));
    assert!(rx.recv().await.is_some());
    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher stops once the receiver is dropped")
        .unwrap();
}
