//! Build service tests: input resolution ahead of the fan-out.

use flotilla_core::application::services::build::{self, BuildInput};
use flotilla_core::domain::error::{BuildInputError, SelectionError};

use crate::mocks::{MemoryRegistry, MockConnector, StaticFetcher, host};

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn url_input() -> BuildInput {
    BuildInput::Url("http://files.internal/df.tar".to_string())
}

#[tokio::test]
async fn fetch_failure_submits_nothing_anywhere() {
    let connector = MockConnector::new();
    let store = MemoryRegistry::new().with_host(host("alpha"));
    let fetcher = StaticFetcher::failing("404 Not Found");

    let err = build::build_on_hosts(
        &connector,
        &store,
        &fetcher,
        &url_input(),
        "app:v1",
        &names(&["alpha"]),
    )
    .await
    .expect_err("unresolvable input aborts the build");

    assert!(matches!(
        err.downcast_ref::<BuildInputError>(),
        Some(BuildInputError::Fetch { .. })
    ));
    assert!(connector.calls().is_empty(), "no host was contacted");
}

#[tokio::test]
async fn unreadable_upload_is_an_upload_error_not_a_fetch_error() {
    let fetcher = StaticFetcher::ok(b"unused");
    let input = BuildInput::Uploaded("/nonexistent/build.tar".into());

    let err = build::resolve_input(&fetcher, &input)
        .await
        .expect_err("missing upload");

    assert!(matches!(err, BuildInputError::Upload { .. }));
}

#[tokio::test]
async fn empty_selection_is_rejected_before_resolving_the_input() {
    let connector = MockConnector::new();
    let store = MemoryRegistry::new();
    // A failing fetcher proves the selection check runs first.
    let fetcher = StaticFetcher::failing("unreachable");

    let err = build::build_on_hosts(&connector, &store, &fetcher, &url_input(), "app:v1", &[])
        .await
        .expect_err("empty selection");

    assert_eq!(
        err.downcast_ref::<SelectionError>(),
        Some(&SelectionError::NoHostsSelected)
    );
}

#[tokio::test]
async fn submissions_fan_out_with_per_host_isolation() {
    let connector = MockConnector::new().fail_op("build", "beta");
    let store = MemoryRegistry::new()
        .with_host(host("alpha"))
        .with_host(host("beta"));
    let fetcher = StaticFetcher::ok(b"FROM busybox\n");

    let report = build::build_on_hosts(
        &connector,
        &store,
        &fetcher,
        &url_input(),
        "app:v1",
        &names(&["alpha", "beta"]),
    )
    .await
    .expect("fan-out itself succeeds");

    assert_eq!(report.len(), 2);
    assert_eq!(report.outcomes[0].host, "alpha");
    assert!(report.outcomes[0].is_success());
    assert!(!report.outcomes[1].is_success());

    let (_, submission) = report.successes().next().expect("alpha submitted");
    assert_eq!(submission.host, "alpha");
    assert_eq!(submission.tag, "app:v1");
    assert!(!submission.build_id.is_empty());
}
