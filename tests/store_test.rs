//! Store-level ordering properties for the sort selector.

use std::time::Duration;
use taskboard::storage::Storage;
use taskboard::task::TaskSort;
use tempfile::TempDir;

async fn open_store() -> (TempDir, Storage) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path()).await.unwrap();
    (dir, storage)
}

/// Create tasks spaced far enough apart that their timestamps differ.
async fn seed(storage: &Storage, specs: &[(&str, bool)]) {
    for (title, done) in specs {
        storage.create_task(title, None, *done).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn ids(tasks: &[taskboard::storage::TaskRow]) -> Vec<i64> {
    tasks.iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn default_and_date_desc_orderings_match() {
    let (_dir, storage) = open_store().await;
    seed(&storage, &[("First", false), ("Second", true), ("Third", false)]).await;

    let default = storage.list_tasks(TaskSort::from_token(None)).await.unwrap();
    let explicit = storage
        .list_tasks(TaskSort::from_token(Some("date_desc")))
        .await
        .unwrap();
    assert_eq!(ids(&default), ids(&explicit));
}

#[tokio::test]
async fn unknown_tokens_behave_like_the_default() {
    let (_dir, storage) = open_store().await;
    seed(&storage, &[("First", false), ("Second", true)]).await;

    let default = storage.list_tasks(TaskSort::DateDesc).await.unwrap();
    let unknown = storage
        .list_tasks(TaskSort::from_token(Some("by_rainbow")))
        .await
        .unwrap();
    assert_eq!(ids(&default), ids(&unknown));
}

#[tokio::test]
async fn date_orderings_are_mirror_images() {
    let (_dir, storage) = open_store().await;
    seed(&storage, &[("First", false), ("Second", false), ("Third", true)]).await;

    let asc = storage.list_tasks(TaskSort::DateAsc).await.unwrap();
    let desc = storage.list_tasks(TaskSort::DateDesc).await.unwrap();

    assert_eq!(ids(&asc), vec![1, 2, 3]);
    let mut reversed = ids(&desc);
    reversed.reverse();
    assert_eq!(ids(&asc), reversed);
}

#[tokio::test]
async fn status_done_puts_every_done_task_first() {
    let (_dir, storage) = open_store().await;
    seed(
        &storage,
        &[
            ("A", false),
            ("B", true),
            ("C", false),
            ("D", true),
            ("E", false),
        ],
    )
    .await;

    let tasks = storage.list_tasks(TaskSort::StatusDone).await.unwrap();
    let first_pending = tasks.iter().position(|t| !t.is_done).unwrap();
    assert!(
        tasks[first_pending..].iter().all(|t| !t.is_done),
        "no done task may follow a pending one"
    );
    // Within each group: newest first. Ids are monotonic with creation time.
    assert_eq!(ids(&tasks), vec![4, 2, 5, 3, 1]);
}

#[tokio::test]
async fn status_pending_mirrors_the_done_grouping() {
    let (_dir, storage) = open_store().await;
    // Task 1 toggled done, task 2 created later and still pending.
    seed(&storage, &[("Buy milk", false)]).await;
    storage.set_done(1, true).await.unwrap();
    seed(&storage, &[("Water plants", false)]).await;

    let tasks = storage.list_tasks(TaskSort::StatusPending).await.unwrap();
    assert_eq!(ids(&tasks), vec![2, 1]);
}
