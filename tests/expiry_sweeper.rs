mod common;

use std::time::Duration;

use linkvault::application::expiry_sweeper::ExpirySweeper;
use linkvault::domain::repositories::LinkStore;

#[tokio::test]
async fn test_sweeper_removes_expired_links_on_start() {
    let env = common::create_test_env();
    let live = env.service.create("live.com", "alice", None).await.unwrap();
    common::insert_link(
        &env.store,
        common::expired_link("old001", "https://old.com/", "bob"),
    )
    .await;

    let handle = ExpirySweeper::new(env.service.clone(), Duration::from_secs(3600))
        .unwrap()
        .spawn();

    let mut swept = false;
    for _ in 0..100 {
        if env.store.load().await.unwrap().find_by_code("old001").is_none() {
            swept = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    handle.stop().await.unwrap();

    assert!(swept, "expired link was not swept");
    let snapshot = env.store.load().await.unwrap();
    assert!(snapshot.find_by_code(live.code()).is_some());
    assert_eq!(snapshot.owner_count(), 1);
}

#[tokio::test]
async fn test_sweeper_stops_cleanly() {
    let env = common::create_test_env();

    let handle = ExpirySweeper::new(env.service.clone(), Duration::from_millis(10))
        .unwrap()
        .spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_sweeper_survives_corrupt_store() {
    let env = common::create_test_env();
    std::fs::write(env.data_file(), "not json").unwrap();

    let handle = ExpirySweeper::new(env.service.clone(), Duration::from_millis(10))
        .unwrap()
        .spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    handle.stop().await.unwrap();
    assert_eq!(std::fs::read_to_string(env.data_file()).unwrap(), "not json");
}
