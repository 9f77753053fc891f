// ResourceController against a scripted record store
//
// Covers fetch classification and loading flags, failure handling, the
// single-flight reload after mutations, selection lifetime, export,
// archive view, timeouts and supersession of in-flight fetches.

mod mock_service;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use mock_service::{ids, users, MockUserService, User, UserInput};
use resource_grid::core::RecordingNotifier;
use resource_grid::resources::controllers::{ControllerEvent, ControllerOptions};
use resource_grid::resources::models::ExportQuery;
use resource_grid::resources::{Entity, QueryPatch, QueryState, ResourceController};

type UserController = ResourceController<User, UserInput>;

fn controller_with(
    service: &Arc<MockUserService>,
    request_timeout: Duration,
) -> (UserController, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let options = ControllerOptions {
        request_timeout,
        page_size: 10,
    };
    let controller = UserController::new(service.clone(), notifier.clone(), options);
    (controller, notifier)
}

fn controller(service: &Arc<MockUserService>) -> (UserController, Arc<RecordingNotifier>) {
    controller_with(service, Duration::from_secs(5))
}

fn selection(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_initialize_loads_first_page_once() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);

    assert!(controller.initialize().await);
    assert!(controller.initialize().await);

    assert_eq!(service.page_call_count(), 1);
    assert_eq!(controller.items().len(), 10);
    assert_eq!(controller.total(), 25);
    assert_eq!(controller.query_params().page, 1);
    assert!(!controller.is_loading());
    assert!(!controller.is_loading_more());
}

#[tokio::test]
async fn test_set_query_params_does_not_fetch() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);

    let next = QueryState::new(10).merged(&QueryPatch::new().search("user 01"));
    controller.set_query_params(next);
    assert_eq!(service.page_call_count(), 0);
    assert_eq!(controller.query_params().search.as_deref(), Some("user 01"));

    assert!(controller.fetch(QueryPatch::new()).await);
    assert_eq!(service.page_calls()[0].search.as_deref(), Some("user 01"));
    assert_eq!(controller.total(), 10);
}

#[tokio::test]
async fn test_page_change_sets_loading_more_only() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    service.hold(2);
    let (loaded, _) = tokio::join!(controller.fetch(QueryPatch::new().page(2)), async {
        settle().await;
        assert!(controller.is_loading_more());
        assert!(!controller.is_loading());
        service.release(2);
    });

    assert!(loaded);
    assert!(!controller.is_loading_more());
    assert_eq!(ids(&controller.items())[0], "11");
}

#[tokio::test]
async fn test_filter_change_sets_loading_only() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    service.hold(1);
    let (loaded, _) = tokio::join!(controller.fetch(QueryPatch::new().search("x")), async {
        settle().await;
        assert!(controller.is_loading());
        assert!(!controller.is_loading_more());
        service.release(1);
    });

    assert!(loaded);
    assert!(!controller.is_loading());
    assert!(controller.items().is_empty());
    assert_eq!(controller.total(), 0);
}

#[tokio::test]
async fn test_failed_fetch_keeps_rows_and_notifies_once() {
    let service = MockUserService::new(users(25));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;
    let before = controller.items();

    service.fail_next_pages(1);
    assert!(!controller.fetch(QueryPatch::new().page(2)).await);

    assert_eq!(controller.items(), before);
    assert_eq!(controller.total(), 25);
    assert_eq!(controller.query_params().page, 1);
    assert!(!controller.is_loading_more());

    let errors = notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("users: failed to load"));
    assert!(errors[0].contains("503"));
}

#[tokio::test]
async fn test_concurrent_mutations_trigger_a_single_reload() {
    let service = MockUserService::new(users(25));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;
    assert_eq!(service.page_call_count(), 1);

    service.hold(1);
    let (first, second, _) = tokio::join!(controller.delete("1"), controller.delete("2"), async {
        settle().await;
        service.release(1);
    });

    assert!(first && second);
    let mut calls = service.mutation_calls();
    calls.sort();
    assert_eq!(calls, vec!["delete 1", "delete 2"]);
    assert_eq!(service.page_call_count(), 2);
    assert_eq!(notifier.successes().len(), 2);

    // the latch is released once the reload finishes
    assert!(controller.delete("3").await);
    assert_eq!(service.page_call_count(), 3);
    assert_eq!(controller.total(), 22);
}

#[tokio::test]
async fn test_selection_survives_refetch_and_clears_after_batch() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    controller.select_one("1", true);
    controller.select_one("3", true);
    assert!(controller.fetch(QueryPatch::new().page(1)).await);
    assert_eq!(controller.selected_ids(), selection(&["1", "3"]));

    assert!(
        controller
            .batch_delete(&["1".to_string(), "3".to_string()])
            .await
    );
    assert!(controller.selected_ids().is_empty());
    let remaining = ids(&controller.items());
    assert!(!remaining.contains(&"1".to_string()));
    assert!(!remaining.contains(&"3".to_string()));
}

#[tokio::test]
async fn test_single_delete_keeps_remaining_selection() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    for id in ["1", "2", "3", "4", "5"] {
        controller.select_one(id, true);
    }
    controller.select_one("5", false);
    assert!(controller.delete("2").await);

    assert_eq!(controller.selected_ids(), selection(&["1", "2", "3", "4"]));
    assert!(controller.is_selected("3"));
}

#[tokio::test]
async fn test_select_all_covers_loaded_rows() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    controller.select_all(true);
    assert_eq!(controller.selected_ids().len(), 10);
    assert_eq!(service.page_call_count(), 1);

    controller.select_all(false);
    assert!(controller.selected_ids().is_empty());
}

#[tokio::test]
async fn test_batch_status_change() {
    let service = MockUserService::new(users(25));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;
    controller.select_all(true);

    let selected: Vec<String> = controller.selected_ids().into_iter().collect();
    assert!(controller.batch_set_active(&selected, false).await);

    assert!(controller.selected_ids().is_empty());
    assert_eq!(notifier.successes(), vec!["users: 10 records deactivated"]);
    let user = controller.get_by_id("1").await.unwrap();
    assert_eq!(user.is_active(), Some(false));
}

#[tokio::test]
async fn test_failed_mutation_reports_and_skips_reload() {
    let service = MockUserService::new(users(25));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;

    service.fail_mutations(true);
    let created = controller
        .create(UserInput {
            name: "grace".to_string(),
        })
        .await;

    assert!(!created);
    assert_eq!(service.page_call_count(), 1);
    assert_eq!(
        notifier.errors(),
        vec!["users: failed to create (Remote error 422: rejected by record store)"]
    );
    assert!(notifier.successes().is_empty());
}

#[tokio::test]
async fn test_empty_batch_never_reaches_the_store() {
    let service = MockUserService::new(users(5));
    let (controller, notifier) = controller(&service);

    assert!(!controller.batch_delete(&[]).await);
    assert!(!controller.batch_restore(&[]).await);
    assert!(!controller.batch_set_active(&[], true).await);

    assert!(service.mutation_calls().is_empty());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn test_update_and_restore_reload_current_window() {
    let service = MockUserService::new(users(3));
    let (controller, _) = controller(&service);
    controller.initialize().await;

    let renamed = controller
        .update(
            "2",
            UserInput {
                name: "renamed".to_string(),
            },
        )
        .await;
    assert!(renamed);
    assert_eq!(controller.items()[1].name, "renamed");

    assert!(controller.delete("2").await);
    assert_eq!(controller.total(), 2);
    assert!(controller.restore("2").await);
    assert_eq!(controller.total(), 3);
}

#[tokio::test]
async fn test_export_ignores_the_window() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller
        .fetch(QueryPatch::new().page(1).search("user 00"))
        .await;

    let rows = controller.export_all(None).await.unwrap();
    assert_eq!(rows.len(), 9);
    assert_eq!(
        service.export_calls()[0],
        ExportQuery {
            search: Some("user 00".to_string()),
            ..ExportQuery::default()
        }
    );
    assert!(!controller.is_exporting());

    let everything = controller
        .export_all(Some(ExportQuery::default()))
        .await
        .unwrap();
    assert_eq!(everything.len(), 25);
}

#[tokio::test]
async fn test_archive_view_toggle() {
    let service = MockUserService::new(users(25));
    let (controller, _) = controller(&service);
    controller.initialize().await;
    controller.delete("4").await;
    controller.delete("5").await;
    controller.select_one("6", true);

    assert!(controller.set_archive_view(true).await);
    assert!(controller.selected_ids().is_empty());
    assert_eq!(controller.query_params().is_deleted, Some(true));
    assert_eq!(ids(&controller.items()), vec!["4", "5"]);

    assert!(controller.set_archive_view(false).await);
    assert_eq!(controller.query_params().is_deleted, None);
    assert_eq!(controller.total(), 23);
}

#[tokio::test]
async fn test_fetch_times_out() {
    let service = MockUserService::new(users(25));
    service.hang();
    let (controller, notifier) = controller_with(&service, Duration::from_millis(20));

    assert!(!controller.initialize().await);

    assert!(!controller.is_loading());
    assert!(controller.items().is_empty());
    let errors = notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("timed out after 20 ms"));
}

#[tokio::test]
async fn test_filter_change_supersedes_page_fetch() {
    let service = MockUserService::new(users(25));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;

    service.hold(2);
    let (page_two, searched) = tokio::join!(controller.fetch(QueryPatch::new().page(2)), async {
        settle().await;
        controller
            .fetch(QueryPatch::new().page(1).search("user 01"))
            .await
    });

    assert!(!page_two);
    assert!(searched);
    assert!(!controller.is_loading_more());
    assert!(notifier.errors().is_empty());

    let query = controller.query_params();
    assert_eq!(query.page, 1);
    assert_eq!(query.search.as_deref(), Some("user 01"));
    assert_eq!(controller.total(), 10);
    assert_eq!(ids(&controller.items())[0], "10");
    service.release(2);
}

#[tokio::test]
async fn test_mutation_reload_joins_pending_filter_change() {
    let service = MockUserService::new(users(30));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;

    service.hold(1);
    let (searched, deleted, _) = tokio::join!(
        controller.fetch(QueryPatch::new().page(1).search("user 01")),
        async {
            settle().await;
            controller.delete("25").await
        },
        async {
            settle().await;
            settle().await;
            settle().await;
            service.release(1);
        }
    );

    assert!(searched);
    assert!(deleted);
    assert!(notifier.errors().is_empty());
    assert!(!controller.is_loading());

    let searches: Vec<Option<String>> = service
        .page_calls()
        .iter()
        .map(|q| q.search.clone())
        .collect();
    let user_01 = Some("user 01".to_string());
    assert_eq!(searches, vec![None, user_01.clone(), user_01]);
    assert_eq!(controller.query_params().search.as_deref(), Some("user 01"));
    assert_eq!(controller.total(), 10);
    assert_eq!(ids(&controller.items())[0], "10");
}

#[tokio::test]
async fn test_reload_after_failed_filter_change_uses_published_query() {
    let service = MockUserService::new(users(30));
    let (controller, notifier) = controller(&service);
    controller.initialize().await;

    service.fail_next_pages(1);
    assert!(!controller.fetch(QueryPatch::new().page(1).search("user 01")).await);
    assert!(controller.delete("3").await);

    let last = service.page_calls().pop().unwrap();
    assert_eq!(last.search, None);
    assert_eq!(controller.total(), 29);
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_get_by_id_failure_notifies() {
    let service = MockUserService::new(users(2));
    let (controller, notifier) = controller(&service);

    assert!(controller.get_by_id("missing").await.is_none());
    assert_eq!(notifier.errors().len(), 1);
    assert!(controller.get_by_id("2").await.is_some());
}

#[tokio::test]
async fn test_events_follow_fetch_order() {
    let service = MockUserService::new(users(12));
    let (controller, _) = controller(&service);
    let mut events = controller.subscribe();

    controller.initialize().await;
    controller.fetch(QueryPatch::new().page(2)).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(match event {
            ControllerEvent::QueryRequested(query) => format!("requested {}", query.page),
            ControllerEvent::PageLoaded { query, items, total } => {
                format!("loaded {} ({} of {})", query.page, items.len(), total)
            }
            ControllerEvent::FetchFailed { retained, .. } => {
                format!("failed, kept {}", retained.page)
            }
        });
    }

    assert_eq!(
        seen,
        vec![
            "requested 1",
            "loaded 1 (10 of 12)",
            "requested 2",
            "loaded 2 (2 of 12)",
        ]
    );
}

#[tokio::test]
async fn test_snapshot_reflects_published_state() {
    let service = MockUserService::new(users(12));
    let (controller, _) = controller(&service);
    controller.initialize().await;
    controller.select_one("7", true);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.items.len(), 10);
    assert_eq!(snapshot.total, 12);
    assert_eq!(snapshot.selected_ids, selection(&["7"]));
    assert!(!snapshot.loading && !snapshot.loading_more && !snapshot.exporting);
    assert_eq!(controller.name(), "users");
}
