mod support;

use chrono::{NaiveDate, TimeZone, Utc};
use taskbuddy::error::Error;
use taskbuddy::search::{search, SearchFilter};
use taskbuddy::stats::compute_stats;
use taskbuddy::storage::Storage;
use taskbuddy::task::{NewTask, Priority, Status, Task, TaskPatch, TaskStore};
use taskbuddy::user::{CredentialHasher, IdentityStore};

fn identity(storage: Storage) -> IdentityStore {
    let hasher = CredentialHasher::new(&support::cheap_auth()).expect("hasher");
    IdentityStore::new(storage, hasher)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn create_then_get_is_pending_with_equal_timestamps() {
    let store = TaskStore::new(Storage::in_memory());
    for priority in Priority::ALL {
        let created = store
            .create(
                "user_a",
                NewTask {
                    title: format!("{priority} task"),
                    description: "details".to_string(),
                    priority,
                    due_date: None,
                    tags: vec!["x".to_string(), "y".to_string()],
                },
            )
            .expect("create");
        let fetched = store.get(&created.id).expect("get").expect("present");
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, Status::Pending);
        assert_eq!(fetched.created_at, fetched.updated_at);
        assert_eq!(fetched.tags, vec!["x", "y"]);
    }
}

#[test]
fn status_update_touches_only_status_and_updated_at() {
    let store = TaskStore::new(Storage::in_memory());
    let before = store
        .create(
            "user_a",
            NewTask {
                title: "Report".to_string(),
                description: "quarterly".to_string(),
                priority: Priority::High,
                due_date: Some(date(2030, 1, 1)),
                tags: vec!["work".to_string()],
            },
        )
        .expect("create");

    let after = store
        .update(&before.id, TaskPatch::status(Status::Completed))
        .expect("update")
        .expect("present");

    assert_eq!(after.status, Status::Completed);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(
        Task {
            status: before.status,
            updated_at: before.updated_at,
            ..after
        },
        before
    );
}

#[test]
fn delete_is_final() {
    let store = TaskStore::new(Storage::in_memory());
    let task = store.create("user_a", NewTask::titled("x")).expect("create");
    assert!(store.delete(&task.id).expect("delete"));
    assert!(store.get(&task.id).expect("get").is_none());
    assert!(!store.delete(&task.id).expect("second delete"));
}

#[test]
fn listing_is_scoped_to_owner() {
    let store = TaskStore::new(Storage::in_memory());
    for (user, title) in [("user_a", "a1"), ("user_b", "b1"), ("user_a", "a2")] {
        store.create(user, NewTask::titled(title)).expect("create");
    }
    let mine = store.list_for_user("user_a").expect("list");
    assert!(mine.iter().all(|task| task.user_id == "user_a"));
    assert_eq!(
        mine.iter().map(|task| task.title.as_str()).collect::<Vec<_>>(),
        vec!["a1", "a2"]
    );
    assert!(store.list_for_user("user_c").expect("list").is_empty());
}

#[test]
fn store_accepts_blank_titles() {
    let store = TaskStore::new(Storage::in_memory());
    let task = store.create("user_a", NewTask::titled("")).expect("create");
    assert_eq!(task.title, "");
}

#[test]
fn stats_partition_and_overdue_rule() {
    let store = TaskStore::new(Storage::in_memory());
    let cases = [
        (Status::Pending, Some(date(2024, 6, 9))),
        (Status::Pending, Some(date(2024, 6, 10))),
        (Status::Completed, Some(date(2024, 6, 1))),
        (Status::InProgress, None),
    ];
    for (status, due_date) in cases {
        let task = store
            .create(
                "user_a",
                NewTask {
                    due_date,
                    ..NewTask::titled("t")
                },
            )
            .expect("create");
        store
            .update(&task.id, TaskPatch::status(status))
            .expect("update");
    }

    let tasks = store.list_for_user("user_a").expect("list");
    let as_of = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
    let stats = compute_stats(&tasks, as_of);
    assert_eq!(stats.completed + stats.pending + stats.in_progress, stats.total);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.overdue, 1);
}

#[test]
fn search_matches_title_and_tag() {
    let store = TaskStore::new(Storage::in_memory());
    store
        .create("user_a", NewTask::titled("Work report"))
        .expect("create");
    store
        .create(
            "user_a",
            NewTask {
                tags: vec!["work".to_string()],
                ..NewTask::titled("Groceries")
            },
        )
        .expect("create");

    let tasks = store.list_for_user("user_a").expect("list");
    let found = search(&tasks, &SearchFilter::query("work"));
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title, "Work report");
    assert_eq!(found[1].title, "Groceries");
}

#[test]
fn duplicate_registration_and_wrong_secret() {
    let identity = identity(Storage::in_memory());
    identity.register("a@x.com", "A", "right").expect("register");

    let err = identity.register("a@x.com", "A2", "other").unwrap_err();
    assert!(matches!(err, Error::DuplicateEmail(email) if email == "a@x.com"));

    let err = identity.authenticate("a@x.com", "wrong").unwrap_err();
    assert!(matches!(err, Error::InvalidCredential(_)));

    let user = identity.authenticate("a@x.com", "right").expect("login");
    assert_eq!(user.name, "A");
}

#[test]
fn demo_seeding_is_idempotent_across_stores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::open_dir(dir.path(), 1000).expect("open");

    assert!(identity(storage.clone()).seed_demo().expect("seed"));
    assert!(!identity(storage.clone()).seed_demo().expect("seed again"));

    let reopened = Storage::open_dir(dir.path(), 1000).expect("reopen");
    let users = identity(reopened.clone()).list().expect("users");
    assert_eq!(users.len(), 1);

    let tasks = TaskStore::new(reopened);
    assert_eq!(tasks.seed_demo_tasks(Utc::now()).expect("seed tasks"), 3);
    assert_eq!(tasks.seed_demo_tasks(Utc::now()).expect("seed tasks"), 0);
}
