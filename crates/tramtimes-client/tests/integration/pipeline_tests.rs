use chrono::{NaiveDate, Weekday};
use tokio_util::sync::CancellationToken;
use tramtimes_client::{JsonFileStore, ReqwestFetcher, ScraperTableReader};
use tramtimes_core::backoff::Backoff;
use tramtimes_core::error::AppError;
use tramtimes_core::models::{StopId, WeeklySchedule};
use tramtimes_core::runner::{ScheduleRunner, TracingRunReporter};
use tramtimes_core::schedule::ScheduleService;
use tramtimes_core::traits::NullStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{STOP, STOP_PATH, departures_page, fast_config, policy};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn stop(id: &str) -> StopId {
    StopId::parse(id).unwrap()
}

#[tokio::test]
async fn week_is_fetched_extracted_and_written() {
    let mock_server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    for day in date("2024-01-17").iter_days().take(7) {
        let day = day.format("%Y-%m-%d").to_string();
        let page = departures_page(&[
            ("Blue", day.as_str(), "12:04"),
            ("Blue", day.as_str(), "12:04"),
            ("Yellow", "Meadowhall", "11:58"),
            ("Yellow", "Meadowhall", "13:02"),
        ]);
        Mock::given(method("GET"))
            .and(path(STOP_PATH))
            .and(query_param("date", day.as_str()))
            .and(query_param("time", "12:00"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = fast_config(&mock_server.uri());
    let backoff = Backoff::seeded(11);
    let store = JsonFileStore::new(tmp.path().join("output"));
    let service = ScheduleService::with_store(
        ReqwestFetcher::new().unwrap(),
        ScraperTableReader::new(),
        store,
        policy(&config, &backoff),
        backoff,
        config,
    );

    let schedule = service.process(&stop(STOP), date("2024-01-17")).await.unwrap();

    assert_eq!(schedule.total_services(), 7);
    assert_eq!(schedule.day(Weekday::Wed)[0].destination_name(), "2024-01-17");
    assert_eq!(schedule.day(Weekday::Mon)[0].destination_name(), "2024-01-22");
    assert_eq!(schedule.day(Weekday::Tue)[0].departure_time(), "12:04:00");

    let text = std::fs::read_to_string(tmp.path().join("output").join("_9400ZZSYMAL1.json")).unwrap();
    let written: WeeklySchedule = serde_json::from_str(&text).unwrap();
    assert_eq!(written, schedule);
}

#[tokio::test]
async fn transient_errors_are_retried_within_a_day() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STOP_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(STOP_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(departures_page(&[("1", "High Street", "12:15")])),
        )
        .expect(7)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri());
    let backoff = Backoff::seeded(11);
    let service: ScheduleService<_, _, NullStore> = ScheduleService::new(
        ReqwestFetcher::new().unwrap(),
        ScraperTableReader::new(),
        policy(&config, &backoff),
        backoff,
        config,
    );

    let schedule = service.build_week(&stop(STOP), date("2024-01-15")).await.unwrap();

    assert_eq!(schedule.total_services(), 7);
    assert_eq!(service.policy().breaker().stats().failure_count, 0);
}

#[tokio::test]
async fn missing_stop_fails_alone_without_retry() {
    let mock_server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/stops/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(STOP_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(departures_page(&[("1", "High Street", "12:15")])),
        )
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri());
    let backoff = Backoff::seeded(11);
    let runner = ScheduleRunner::new(ScheduleService::with_store(
        ReqwestFetcher::new().unwrap(),
        ScraperTableReader::new(),
        JsonFileStore::new(tmp.path()),
        policy(&config, &backoff),
        backoff,
        config,
    ));

    let summary = runner
        .run(
            &[stop("gone"), stop(STOP)],
            date("2024-01-15"),
            CancellationToken::new(),
            &TracingRunReporter,
        )
        .await;

    assert_eq!(summary.completed, vec![stop(STOP)]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].stop, stop("gone"));
    assert!(summary.failed[0].error.contains("404"));
    assert!(tmp.path().join("_9400ZZSYMAL1.json").exists());
    assert!(!tmp.path().join("_GONE.json").exists());
}

#[tokio::test]
async fn breaker_opens_across_stops_and_stops_calling_upstream() {
    let mock_server = MockServer::start().await;

    // Three stops exhaust three attempts each; the fourth never reaches the server.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(9)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri());
    let backoff = Backoff::seeded(11);
    let service: ScheduleService<_, _, NullStore> = ScheduleService::new(
        ReqwestFetcher::new().unwrap(),
        ScraperTableReader::new(),
        policy(&config, &backoff),
        backoff,
        config,
    );

    for id in ["a", "b", "c"] {
        let err = service.build_week(&stop(id), date("2024-01-15")).await.unwrap_err();
        assert!(
            matches!(err, AppError::HttpStatus { status: 503, .. }),
            "{err:?}"
        );
    }

    let err = service.build_week(&stop("d"), date("2024-01-15")).await.unwrap_err();
    assert!(matches!(err, AppError::CircuitOpen { .. }), "{err:?}");
}
