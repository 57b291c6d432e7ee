use chrono::{TimeZone, Utc};

use cryptopulse::{
    models::SourceType,
    services::rss_service::{parse_feed, snippet},
};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title> Crypto Daily </title>
    <link>https://crypto.example</link>
    <description>Daily crypto news</description>
    <item>
      <title>Bitcoin breaks record</title>
      <link>https://crypto.example/btc-record</link>
      <description><![CDATA[<p>BTC hit a <b>new</b> high &amp; kept going.</p>]]></description>
      <pubDate>Tue, 31 Dec 2024 18:30:00 +0000</pubDate>
      <enclosure url="https://crypto.example/btc.jpg" length="0" type="image/jpeg"/>
    </item>
    <item>
      <title>Layer2 fees drop</title>
      <link>https://crypto.example/l2</link>
      <media:content url="https://crypto.example/l2.png" medium="image"/>
    </item>
    <item>
      <title>Only a thumbnail</title>
      <link>https://crypto.example/thumb</link>
      <pubDate>not a date</pubDate>
      <media:thumbnail url="https://crypto.example/thumb.png"/>
    </item>
    <item>
      <title>Missing link is skipped</title>
    </item>
    <item>
      <link>https://crypto.example/untitled</link>
    </item>
  </channel>
</rss>"#;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

#[test]
fn feed_items_become_news() {
    let (source, items) = parse_feed(FEED.as_bytes(), "https://crypto.example/rss", now()).unwrap();

    assert_eq!(source, "Crypto Daily");
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.title, "Bitcoin breaks record");
    assert_eq!(first.url.as_deref(), Some("https://crypto.example/btc-record"));
    assert_eq!(first.summary.as_deref(), Some("BTC hit a new high & kept going."));
    assert_eq!(first.source_name, "Crypto Daily");
    assert_eq!(first.source_type, SourceType::Rss);
    assert_eq!(first.image_url.as_deref(), Some("https://crypto.example/btc.jpg"));
    assert_eq!(
        first.published_at,
        Utc.with_ymd_and_hms(2024, 12, 31, 18, 30, 0).unwrap().timestamp()
    );
    assert!(first.tags.is_empty());
}

#[test]
fn media_extensions_provide_images() {
    let (_, items) = parse_feed(FEED.as_bytes(), "https://crypto.example/rss", now()).unwrap();

    assert_eq!(items[1].image_url.as_deref(), Some("https://crypto.example/l2.png"));
    assert_eq!(items[1].summary, None);
    assert_eq!(items[2].image_url.as_deref(), Some("https://crypto.example/thumb.png"));
}

#[test]
fn unparseable_date_falls_back_to_now() {
    let (_, items) = parse_feed(FEED.as_bytes(), "https://crypto.example/rss", now()).unwrap();

    assert_eq!(items[2].published_at, now().timestamp());
    assert_eq!(items[1].published_at, now().timestamp());
}

#[test]
fn untitled_channel_is_named_after_its_url() {
    let feed = r#"<rss version="2.0"><channel><title></title><link>x</link><description>d</description>
        <item><title>T</title><link>https://x.example/a</link></item></channel></rss>"#;

    let (source, items) = parse_feed(feed.as_bytes(), "https://x.example/feed", now()).unwrap();

    assert_eq!(source, "https://x.example/feed");
    assert_eq!(items[0].source_name, "https://x.example/feed");
}

#[test]
fn malformed_feed_is_an_error() {
    assert!(parse_feed(b"<html><body>nope</body></html>", "https://x.example", now()).is_err());
}

#[test]
fn snippet_strips_markup_and_truncates() {
    assert_eq!(snippet("<div>Hello&nbsp;<i>world</i></div>\n\n  again", 100), "Hello world again");
    assert_eq!(snippet("abcdefgh", 3), "abc");
    assert_eq!(snippet("   ", 10), "");
}
