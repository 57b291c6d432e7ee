use chrono::{TimeDelta, TimeZone, Utc};
use mongodb::bson::{doc, Bson};

use cryptopulse::{
    config::parse_feed_list,
    models::{ts_to_rfc3339, Direction, PriceAlert},
    render::{display_offset, fmt_local_time, fmt_long_date, fmt_usd},
    services::{
        alerts_service::is_valid_email,
        email_service::ResendClient,
        news_service::{NewsFilter, Pagination},
        price_service::HistoryPeriod,
        scheduler::next_daily_run,
    },
    templates::build_handlebars,
};

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::from_query(None, None), Pagination { page: 1, limit: 20 });
    assert_eq!(Pagination::from_query(Some("3"), Some("500")), Pagination { page: 3, limit: 50 });
    assert_eq!(Pagination::from_query(Some("-2"), Some("abc")), Pagination { page: 1, limit: 20 });
    assert_eq!(Pagination::from_query(Some("0"), Some("0")), Pagination { page: 1, limit: 20 });
}

#[test]
fn pagination_skip_and_pages() {
    let p = Pagination::from_query(Some("3"), Some("10"));
    assert_eq!(p.skip(), 20);
    assert_eq!(p.total_pages(0), 0);
    assert_eq!(p.total_pages(10), 1);
    assert_eq!(p.total_pages(21), 3);

    let far = Pagination::from_query(Some("9223372036854775807"), Some("50"));
    assert_eq!(far.page, i64::MAX as u64);
    assert_eq!(far.skip(), i64::MAX as u64);
}

#[test]
fn empty_filter_matches_everything() {
    assert_eq!(NewsFilter::default().to_document(), doc! {});

    let all = NewsFilter {
        source_type: Some("all".to_string()),
        tag: Some("  ".to_string()),
        search: Some(String::new()),
    };
    assert_eq!(all.to_document(), doc! {});
}

#[test]
fn filter_combines_source_tag_and_escaped_search() {
    let filter = NewsFilter {
        source_type: Some("rss".to_string()),
        tag: Some("Bitcoin".to_string()),
        search: Some("ETF (spot)".to_string()),
    }
    .to_document();

    assert_eq!(filter.get_str("source_type").unwrap(), "rss");
    assert_eq!(filter.get_str("tags").unwrap(), "Bitcoin");

    let or = filter.get_array("$or").unwrap();
    assert_eq!(or.len(), 2);
    let Bson::Document(title) = &or[0] else {
        panic!("expected a document");
    };
    let regex = title.get_document("title").unwrap();
    assert_eq!(regex.get_str("$regex").unwrap(), r"ETF \(spot\)");
    assert_eq!(regex.get_str("$options").unwrap(), "i");
}

#[test]
fn history_periods() {
    assert_eq!(HistoryPeriod::parse("1h").map(|p| p.span()), Some(TimeDelta::hours(1)));
    assert_eq!(HistoryPeriod::parse("24h").map(|p| p.span()), Some(TimeDelta::hours(24)));
    assert_eq!(HistoryPeriod::parse("7d").map(|p| p.span()), Some(TimeDelta::days(7)));
    assert_eq!(HistoryPeriod::parse("30d"), None);
}

#[test]
fn daily_run_is_strictly_in_the_future() {
    let morning = Utc.with_ymd_and_hms(2025, 1, 1, 7, 59, 0).unwrap();
    assert_eq!(next_daily_run(morning, 8), Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap());

    let exactly = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    assert_eq!(next_daily_run(exactly, 8), Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap());

    let evening = Utc.with_ymd_and_hms(2025, 12, 31, 22, 0, 0).unwrap();
    assert_eq!(next_daily_run(evening, 8), Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap());
}

#[test]
fn usd_formatting() {
    assert_eq!(fmt_usd(100_000.0), "$100,000.00");
    assert_eq!(fmt_usd(1234.5), "$1,234.50");
    assert_eq!(fmt_usd(999.999), "$1,000.00");
    assert_eq!(fmt_usd(0.0), "$0.00");
    assert_eq!(fmt_usd(-42.1), "-$42.10");
}

#[test]
fn local_time_uses_configured_offset() {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 2, 30, 0).unwrap();
    let offset = display_offset(-3);

    assert_eq!(fmt_local_time(at, offset), "31/12/2024 23:30:00 (UTC-03:00)");
    assert_eq!(fmt_long_date(at, offset), "Tuesday, December 31, 2024");
    assert_eq!(display_offset(99), display_offset(23));
}

#[test]
fn feed_list_parsing() {
    assert_eq!(
        parse_feed_list(" https://a.example/rss , ,https://b.example/feed,"),
        vec!["https://a.example/rss", "https://b.example/feed"]
    );
    assert!(parse_feed_list("").is_empty());
}

#[test]
fn email_validation() {
    assert!(is_valid_email("a@b.co"));
    assert!(is_valid_email("first.last+btc@mail.example.com"));
    assert!(!is_valid_email("not-an-email"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("a b@c.com"));
    assert!(!is_valid_email(""));
}

#[test]
fn timestamps_render_as_rfc3339() {
    assert_eq!(ts_to_rfc3339(1_735_732_800).as_deref(), Some("2025-01-01T12:00:00+00:00"));
}

#[test]
fn alert_email_mentions_price_target_and_direction() {
    let client = ResendClient::new(
        String::new(),
        "alerts@cryptopulse.app".to_string(),
        "https://cryptopulse.example".to_string(),
        build_handlebars(),
        display_offset(-3),
    );
    let alert = PriceAlert::new("a@b.co", 100_000.0, Direction::Above, 1_735_732_800);

    let (subject, html) = client.render_price_alert(&alert, 100_250.5).unwrap();

    assert_eq!(subject, "BTC alert: price reached $100,250.50!");
    assert!(html.contains("$100,250.50"));
    assert!(html.contains("$100,000.00"));
    assert!(html.contains("above"));
    assert!(html.contains("cryptopulse.example"));
    assert!(html.contains("a@b.co"));
}
