//! End-to-end tests for fetch-backed modals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anymodal::{
    FetchError, Fetcher, FetcherSpec, ModalSystem, Outlet, Refresh, RefreshAll, modal_variants,
};
use parking_lot::Mutex;
use tokio::sync::watch;

#[derive(Debug)]
struct ViewPost {
    post_id: u64,
}

#[derive(Debug)]
struct Dashboard {
    widgets: usize,
}

#[derive(Debug)]
enum AppModal {
    ViewPost(ViewPost),
    Dashboard(Dashboard),
}

modal_variants!(AppModal {
    ViewPost(ViewPost) => "view-post",
    Dashboard(Dashboard) => "dashboard",
});

type Handles = Arc<Mutex<Option<(Vec<Refresh<AppModal, String>>, RefreshAll<AppModal, String>)>>>;

fn system() -> ModalSystem<AppModal, String> {
    ModalSystem::builder()
        .loader(|_| "Loading...".to_string())
        .error(|err| format!("Error: {err}"))
        .build()
}

fn fixed(value: &'static str) -> Fetcher<ViewPost, String> {
    Fetcher::new(move |_: &ViewPost| async move { Ok::<_, FetchError>(value.to_string()) })
}

/// Returns "A", then "A2", "A3", ...
fn counting(calls: Arc<AtomicUsize>) -> Fetcher<ViewPost, String> {
    Fetcher::new(move |_: &ViewPost| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            Ok::<_, FetchError>(if n == 0 {
                "A".to_string()
            } else {
                format!("A{}", n + 1)
            })
        }
    })
}

/// Waits until the gate is open before resolving.
fn gated(value: &'static str, gate: watch::Receiver<bool>) -> Fetcher<ViewPost, String> {
    Fetcher::new(move |_: &ViewPost| {
        let mut gate = gate.clone();
        async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok::<_, FetchError>(value.to_string())
        }
    })
}

async fn settle(outlet: &Outlet<AppModal, String>, expected: &str) {
    let reached = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if outlet.render().as_deref() == Some(expected) {
                return;
            }
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "outlet never rendered {expected:?}, last render: {:?}",
        outlet.render()
    );
}

fn register_list(
    modals: &ModalSystem<AppModal, String>,
    fetchers: Vec<Fetcher<ViewPost, String>>,
) -> Handles {
    let handles: Handles = Arc::new(Mutex::new(None));
    let captured = handles.clone();
    modals.create_with_fetches(fetchers, move |props| {
        *captured.lock() = Some((props.update.clone(), props.update_all.clone()));
        format!("Post {}: {}", props.modal.post_id, props.data.join(","))
    });
    handles
}

#[tokio::test]
async fn test_loader_then_list_content() {
    let modals = system();
    register_list(&modals, vec![fixed("A"), fixed("B")]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    assert_eq!(outlet.render().as_deref(), Some("Loading..."));

    settle(&outlet, "Post 1: A,B").await;
}

#[tokio::test]
async fn test_rejection_renders_error() {
    let modals = system();
    let failing = Fetcher::new(|_: &ViewPost| async { Err::<String, _>(FetchError::msg("boom")) });
    register_list(&modals, vec![fixed("A"), failing]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "Error: boom").await;
}

#[tokio::test]
async fn test_update_one_index() {
    let modals = system();
    let calls = Arc::new(AtomicUsize::new(0));
    let handles = register_list(&modals, vec![counting(calls.clone()), fixed("B")]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "Post 1: A,B").await;

    let (update, _) = handles.lock().clone().expect("content rendered");
    update[0].run().await.unwrap();

    assert_eq!(outlet.render().as_deref(), Some("Post 1: A2,B"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_update_all_passes_through_loading() {
    let modals = system();
    let (open, gate) = watch::channel(true);
    let handles = register_list(&modals, vec![fixed("A"), gated("B", gate)]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "Post 1: A,B").await;

    open.send_replace(false);
    let (_, update_all) = handles.lock().clone().expect("content rendered");
    let task = update_all.spawn();
    settle(&outlet, "Loading...").await;

    open.send_replace(true);
    assert!(task.wait().await.is_some_and(|r| r.is_ok()));
    settle(&outlet, "Post 1: A,B").await;
}

#[tokio::test]
async fn test_failed_refresh_keeps_error_visible() {
    let modals = system();
    let fail = Arc::new(AtomicBool::new(false));
    let fail_flag = fail.clone();
    let flaky = Fetcher::new(move |_: &ViewPost| {
        let fail = fail_flag.load(Ordering::SeqCst);
        async move {
            if fail {
                Err(FetchError::msg("flaky"))
            } else {
                Ok("A".to_string())
            }
        }
    });
    let handles = register_list(&modals, vec![flaky, fixed("B")]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "Post 1: A,B").await;

    fail.store(true, Ordering::SeqCst);
    let (update, update_all) = handles.lock().clone().expect("content rendered");
    update[0].run().await.unwrap();
    assert_eq!(outlet.render().as_deref(), Some("Error: flaky"));

    // A successful full refresh clears the error.
    fail.store(false, Ordering::SeqCst);
    update_all.run().await.unwrap();
    assert_eq!(outlet.render().as_deref(), Some("Post 1: A,B"));
}

#[tokio::test]
async fn test_late_results_after_close_are_discarded() {
    let modals = system();
    let (open, gate) = watch::channel(false);
    let finished = Arc::new(AtomicBool::new(false));
    let finished_flag = finished.clone();
    let slow = gated("late", gate);
    let tracked = Fetcher::new(move |post: &ViewPost| {
        let inner = slow.call(post);
        let finished = finished_flag.clone();
        async move {
            let value = inner.await;
            finished.store(true, Ordering::SeqCst);
            value
        }
    });
    register_list(&modals, vec![tracked]);

    let outlet = modals.outlet();
    let redraws = Arc::new(AtomicUsize::new(0));
    let redraw_count = redraws.clone();
    outlet.on_redraw(move || {
        redraw_count.fetch_add(1, Ordering::SeqCst);
    });

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    assert_eq!(outlet.render().as_deref(), Some("Loading..."));
    tokio::task::yield_now().await;

    modals.close_all();
    let before = redraws.load(Ordering::SeqCst);

    open.send_replace(true);
    tokio::time::timeout(Duration::from_secs(2), async {
        while !finished.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("fetcher finished");
    tokio::task::yield_now().await;

    assert_eq!(redraws.load(Ordering::SeqCst), before);
    assert_eq!(outlet.render(), None);
}

#[tokio::test]
async fn test_new_instance_refetches() {
    let modals = system();
    let calls = Arc::new(AtomicUsize::new(0));
    register_list(&modals, vec![counting(calls.clone())]);
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "Post 1: A").await;

    modals.show(AppModal::ViewPost(ViewPost { post_id: 2 }));
    settle(&outlet, "Post 2: A2").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_fetcher_form() {
    let modals = system();
    modals.create_with_fetch(
        Fetcher::new(|post: &ViewPost| {
            let id = post.post_id;
            async move { Ok::<_, FetchError>(format!("Post {id}")) }
        }),
        |props| format!("{} by author", props.data),
    );
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 42 }));
    assert_eq!(outlet.render().as_deref(), Some("Loading..."));
    settle(&outlet, "Post 42 by author").await;
}

#[tokio::test]
async fn test_derived_fetchers() {
    let modals = system();
    let widget = |index: usize| {
        Fetcher::new(move |_: &Dashboard| async move { Ok::<_, FetchError>(format!("w{index}")) })
    };
    modals.create_with_fetches(
        FetcherSpec::derived(move |dashboard: &Dashboard| {
            (0..dashboard.widgets).map(widget).collect()
        }),
        |props| props.data.join("|"),
    );
    let outlet = modals.outlet();

    modals.show(AppModal::Dashboard(Dashboard { widgets: 3 }));
    settle(&outlet, "w0|w1|w2").await;
}

#[tokio::test]
async fn test_default_presenters_render_nothing() {
    let modals = ModalSystem::<AppModal, String>::new();
    modals.create_with_fetch(fixed("A"), |props| props.data.clone());
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    assert_eq!(outlet.render(), None);
    settle(&outlet, "A").await;
}

#[tokio::test]
async fn test_explicit_runtime_handle() {
    let modals = ModalSystem::<AppModal, String>::builder()
        .runtime(tokio::runtime::Handle::current())
        .build();
    modals.create_with_fetch(fixed("A"), |props| props.data.clone());
    let outlet = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&outlet, "A").await;
}

#[tokio::test]
async fn test_dropping_one_outlet_keeps_shared_fetch() {
    let modals = system();
    let calls = Arc::new(AtomicUsize::new(0));
    register_list(&modals, vec![counting(calls.clone()), fixed("B")]);
    let main = modals.outlet();
    let sidebar = modals.outlet();

    modals.show(AppModal::ViewPost(ViewPost { post_id: 1 }));
    settle(&main, "Post 1: A,B").await;
    assert_eq!(sidebar.render().as_deref(), Some("Post 1: A,B"));

    drop(sidebar);
    assert_eq!(main.render().as_deref(), Some("Post 1: A,B"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The last outlet letting go tears the controller down.
    drop(main);
    let fresh = modals.outlet();
    assert_eq!(fresh.render().as_deref(), Some("Loading..."));
    settle(&fresh, "Post 1: A2,B").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
