use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use rss::{Channel, Item};

use crate::{
    models::{NewsItem, SourceType},
    AppState,
};

use super::news_service;

const SUMMARY_MAX_CHARS: usize = 500;

/// Fetches every configured feed and stores unseen items.
/// Returns the number of newly inserted items.
pub async fn fetch_all_feeds(state: &AppState) -> Result<usize, String> {
    let feeds = &state.settings.rss_feeds;
    if feeds.is_empty() {
        tracing::info!("[rss] no feeds configured");
        return Ok(0);
    }

    let mut total_inserted = 0;

    for feed_url in feeds {
        tracing::info!("[rss] fetching {}", feed_url);

        let (source_name, items) = match fetch_feed(&state.http, feed_url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("[rss] error fetching feed {}: {}", feed_url, e);
                continue;
            }
        };

        for item in &items {
            match news_service::insert_if_absent(&state.db, item).await {
                Ok(true) => total_inserted += 1,
                Ok(false) => {}
                Err(e) => tracing::error!("[rss] error inserting item: {}", e),
            }
        }

        tracing::info!("[rss] processed feed: {} ({} items)", source_name, items.len());
    }

    state.status.mark_news_fetch(Utc::now());
    if total_inserted > 0 {
        let _ = state.events_tx.send("newsUpdated".to_string());
    }

    tracing::info!("[rss] total new items inserted: {}", total_inserted);
    Ok(total_inserted)
}

async fn fetch_feed(http: &reqwest::Client, feed_url: &str) -> Result<(String, Vec<NewsItem>), String> {
    let res = http.get(feed_url).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
        return Err(format!("feed responded {}", res.status()));
    }

    let bytes = res.bytes().await.map_err(|e| e.to_string())?;
    parse_feed(&bytes, feed_url, Utc::now())
}

/// Parses an RSS 2.0 document into news items. Items without a title or a
/// link are dropped. Returns the channel title (or the url) with the items.
pub fn parse_feed(bytes: &[u8], feed_url: &str, now: DateTime<Utc>) -> Result<(String, Vec<NewsItem>), String> {
    let channel = Channel::read_from(bytes).map_err(|e| e.to_string())?;

    let source_name = if channel.title().trim().is_empty() {
        feed_url.to_string()
    } else {
        channel.title().trim().to_string()
    };

    let items = channel
        .items()
        .iter()
        .filter_map(|item| to_news_item(item, &source_name, now))
        .collect();

    Ok((source_name, items))
}

fn to_news_item(item: &Item, source_name: &str, now: DateTime<Utc>) -> Option<NewsItem> {
    let title = item.title()?.trim();
    let link = item.link()?.trim();
    if title.is_empty() || link.is_empty() {
        return None;
    }

    let summary = item
        .description()
        .map(|d| snippet(d, SUMMARY_MAX_CHARS))
        .filter(|s| !s.is_empty());

    let published_at = item
        .pub_date()
        .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);

    Some(NewsItem {
        id: ObjectId::new(),
        title: title.to_string(),
        summary,
        content: None,
        url: Some(link.to_string()),
        source_name: source_name.to_string(),
        source_type: SourceType::Rss,
        image_url: image_url(item),
        tags: Vec::new(),
        published_at: published_at.timestamp(),
        created_at: now.timestamp(),
    })
}

/// enclosure, then `media:content`, then `media:thumbnail`
pub fn image_url(item: &Item) -> Option<String> {
    if let Some(enc) = item.enclosure() {
        if !enc.url().is_empty() {
            return Some(enc.url().to_string());
        }
    }

    let media = item.extensions().get("media")?;
    ["content", "thumbnail"].iter().find_map(|kind| {
        media
            .get(*kind)?
            .iter()
            .find_map(|ext| ext.attrs().get("url").cloned())
            .filter(|u| !u.is_empty())
    })
}

/// Plain-text snippet: markup stripped, whitespace collapsed, truncated.
pub fn snippet(html: &str, max_chars: usize) -> String {
    let without_tags = Regex::new(r"<[^>]*>")
        .map(|re| re.replace_all(html, " ").into_owned())
        .unwrap_or_else(|_| html.to_string());

    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}
