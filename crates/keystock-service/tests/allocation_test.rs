//! Integration tests for key allocation.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use helpers::{OWNER, RECIPIENT, RESELLER, STRANGER, TestInventory};
use keystock_core::error::ErrorKind;
use keystock_core::types::PrincipalId;
use keystock_service::Allocation;

async fn stock(app: &TestInventory, program: &str, duration: &str, count: usize) -> Vec<String> {
    let values: Vec<String> = (0..count).map(|i| format!("{program}-{duration}-{i:04}")).collect();
    app.import
        .import_text(&app.owner(), program, duration, &values.join("\n"))
        .await
        .unwrap();
    values
}

#[tokio::test]
async fn test_allocate_oldest_key_and_update_mirror() {
    let app = TestInventory::new().await;
    let values = stock(&app, "temp", "week", 3).await;

    let allocation = app
        .allocation
        .allocate(&app.owner(), "temp", "week", RECIPIENT)
        .await
        .unwrap();

    let Allocation::Allocated(key) = allocation else {
        panic!("expected a key");
    };
    assert_eq!(key.value, values[0]);
    assert_eq!(key.claimed_by, OWNER);
    assert_eq!(key.claimed_for, RECIPIENT);
    assert_eq!(app.unclaimed("temp", "week").await, 2);
    assert_eq!(app.mirror_lines("temp", "week"), values[1..].to_vec());
}

#[tokio::test]
async fn test_empty_pool_is_no_stock() {
    let app = TestInventory::new().await;
    stock(&app, "temp", "day", 1).await;

    let allocation = app
        .allocation
        .allocate(&app.owner(), "temp", "month", RECIPIENT)
        .await
        .unwrap();

    assert_eq!(allocation, Allocation::NoStock);
    assert_eq!(app.unclaimed("temp", "day").await, 1);
}

#[tokio::test]
async fn test_mirror_miss_does_not_undo_claim() {
    let app = TestInventory::new().await;
    stock(&app, "perm", "day", 2).await;
    let path = app
        .mirror_dir
        .join(app.pool("perm", "day").mirror_file_name());
    std::fs::write(&path, "").unwrap();

    let allocation = app
        .allocation
        .allocate(&app.owner(), "perm", "day", RECIPIENT)
        .await
        .unwrap();

    assert!(matches!(allocation, Allocation::Allocated(_)));
    assert_eq!(app.unclaimed("perm", "day").await, 1);
}

#[tokio::test]
async fn test_claimed_key_never_returns() {
    let app = TestInventory::new().await;
    let values = stock(&app, "private", "day", 2).await;

    let mut handed_out = Vec::new();
    for _ in 0..3 {
        match app
            .allocation
            .allocate(&app.owner(), "private", "day", RECIPIENT)
            .await
            .unwrap()
        {
            Allocation::Allocated(key) => handed_out.push(key.value),
            Allocation::NoStock => break,
        }
    }
    assert_eq!(handed_out, values);

    // Re-importing a spent key is a duplicate, not a restock.
    let again = app
        .import
        .import_text(&app.owner(), "private", "day", &values[0])
        .await
        .unwrap();
    assert_eq!(again.duplicates, 1);
    assert_eq!(app.unclaimed("private", "day").await, 0);
}

#[tokio::test]
async fn test_access_denied_leaves_stock_alone() {
    let app = TestInventory::with_reseller().await;
    stock(&app, "perm", "lifetime", 2).await;

    let err = app
        .allocation
        .allocate(&app.ctx(STRANGER), "perm", "lifetime", RECIPIENT)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);

    let err = app
        .allocation
        .allocate(&app.ctx(RESELLER), "perm", "lifetime", RECIPIENT)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);

    assert_eq!(app.unclaimed("perm", "lifetime").await, 2);
    assert_eq!(app.mirror_lines("perm", "lifetime").len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allocations_are_distinct() {
    let app = Arc::new(TestInventory::new().await);
    let values = stock(&app, "temp", "day", 20).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let app = app.clone();
        tasks.spawn(async move {
            app.allocation
                .allocate(&app.owner(), "temp", "day", PrincipalId(1000 + i))
                .await
                .unwrap()
        });
    }

    let mut seen = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Allocation::Allocated(key) => assert!(seen.insert(key.value)),
            Allocation::NoStock => panic!("pool ran dry early"),
        }
    }

    assert_eq!(seen, values.into_iter().collect::<HashSet<_>>());
    assert_eq!(app.unclaimed("temp", "day").await, 0);
    assert!(app.mirror_lines("temp", "day").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_oversubscribed_pool() {
    let app = Arc::new(TestInventory::new().await);
    stock(&app, "perm", "month", 5).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..12 {
        let app = app.clone();
        tasks.spawn(async move {
            app.allocation
                .allocate(&app.owner(), "perm", "month", PrincipalId(2000 + i))
                .await
                .unwrap()
        });
    }

    let mut allocated = HashSet::new();
    let mut no_stock = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Allocation::Allocated(key) => assert!(allocated.insert(key.value)),
            Allocation::NoStock => no_stock += 1,
        }
    }

    assert_eq!(allocated.len(), 5);
    assert_eq!(no_stock, 7);
}
