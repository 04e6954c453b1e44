//! End-to-end against PostgreSQL: API server over `PgRobotStore`.
//!
//! Run with: `cargo test -p toyrobotd --features postgres postgres_e2e`

#![cfg(feature = "postgres")]

use std::sync::Arc;

use toyrobot_client::HttpRobotStore;
use toyrobot_domain::{Direction, RobotState};
use toyrobot_session::RobotSession;
use toyrobot_store::{HistoryQuery, PgRobotStore, RobotRepository};
use toyrobotd::{Config, Daemon};

#[sqlx::test(migrations = "../migrations")]
async fn test_session_history_survives_restart(pool: sqlx::PgPool) {
    let pool = Arc::new(pool);

    // First daemon run
    let daemon = Daemon::new(Config::test(), Arc::new(PgRobotStore::new(pool.clone())));
    let addr = daemon.start_api_server().await.unwrap();

    let session = RobotSession::new(Arc::new(HttpRobotStore::new(format!("http://{}", addr))));
    session.place(0, 0);
    session.flush().await;
    session.move_robot();
    session.flush().await;
    session.turn_right();
    session.flush().await;
    assert_eq!(session.last_error(), "");
    daemon.shutdown().await;

    // Second run over the same database
    let daemon = Daemon::new(Config::test(), Arc::new(PgRobotStore::new(pool.clone())));
    let addr = daemon.start_api_server().await.unwrap();

    let restored = RobotSession::start(Arc::new(HttpRobotStore::new(format!("http://{}", addr))));
    restored.flush().await;
    assert_eq!(restored.robot(), Some(RobotState::new(0, 1, Direction::East).unwrap()));

    let history = daemon.store().fetch_history(HistoryQuery::all()).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].id > w[1].id));

    daemon.shutdown().await;
}
