//! News summarization, tagging, daily summaries and chat, all routed through
//! the AI gateway.

use std::collections::BTreeSet;

use chrono::{TimeDelta, Utc};
use mongodb::bson::doc;
use mongodb::options::{FindOneOptions, UpdateOptions};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::{news::TAG_VOCABULARY, news::filter_tags, DailySummary, NewsItem},
    render, AppState,
};

use super::{ai_gateway::AiGateway, news_service};

pub const SUMMARIES: &str = "daily_summaries";

pub const NO_NEWS_SUMMARY: &str = "No news available for today's summary.";

const CLASSIFY_BATCH: i64 = 20;
const SUMMARY_NEWS_LIMIT: i64 = 50;
const CHAT_CONTEXT: usize = 30;
const CHAT_MIN_MATCHES: usize = 10;

// ---------------- Newsletters ----------------

pub async fn summarize_newsletter(ai: &AiGateway, language: &str, subject: &str, body: &str) -> String {
    let truncated: String = body.chars().take(3000).collect();
    let prompt = format!(
        "Summarize this newsletter in 2-3 clear, informative sentences in {lang}.\n\
         Focus on the key facts, numbers and companies mentioned.\n\
         Do not include greetings, links or formatting. Plain prose only.\n\n\
         Subject: {subject}\nContent:\n{truncated}",
        lang = language,
    );

    match ai.complete(&prompt).await {
        Ok(reply) => reply.text.trim().chars().take(500).collect(),
        Err(e) => {
            tracing::error!("[ai] newsletter summarization failed: {}", e);
            fallback_summary(body)
        }
    }
}

/// Body with links removed and whitespace collapsed, first 300 chars.
pub fn fallback_summary(body: &str) -> String {
    let without_links = Regex::new(r"https?://\S+")
        .map(|re| re.replace_all(body, "").into_owned())
        .unwrap_or_else(|_| body.to_string());

    without_links
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(300)
        .collect()
}

// ---------------- Classification ----------------

#[derive(Debug, Deserialize)]
struct Classification {
    id: usize,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn strip_code_fences(text: &str) -> String {
    Regex::new(r"```(?:json)?\n?")
        .map(|re| re.replace_all(text, "").into_owned())
        .unwrap_or_else(|_| text.to_string())
        .trim()
        .to_string()
}

/// Parses the classifier answer into `(position, tags)` pairs, keeping only
/// positions inside the batch and tags from the vocabulary.
pub fn parse_classifications(text: &str, batch_len: usize) -> Result<Vec<(usize, Vec<String>)>, String> {
    let cleaned = strip_code_fences(text);
    let parsed: Vec<Classification> = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;

    Ok(parsed
        .into_iter()
        .filter(|c| c.id >= 1 && c.id <= batch_len)
        .map(|c| (c.id, filter_tags(&c.tags)))
        .collect())
}

pub fn classification_prompt(batch: &[NewsItem]) -> String {
    let news: Vec<serde_json::Value> = batch
        .iter()
        .enumerate()
        .map(|(i, n)| {
            json!({
                "id": i + 1,
                "title": n.title,
                "summary": n.summary.clone().unwrap_or_default(),
            })
        })
        .collect();

    format!(
        "Classify each news item with 1-3 tags from this list: {tags}.\n\
         Answer ONLY with valid JSON, no markdown, no explanations: [{{\"id\": number, \"tags\": string[]}}]\n\n\
         News:\n{news}",
        tags = TAG_VOCABULARY.join(", "),
        news = serde_json::Value::Array(news),
    )
}

/// Tags up to 20 of the newest untagged items. Returns how many were updated.
pub async fn classify_untagged(state: &AppState) -> Result<usize, String> {
    let batch = news_service::untagged(&state.db, CLASSIFY_BATCH).await?;
    if batch.is_empty() {
        return Ok(0);
    }

    let reply = state
        .ai
        .complete(&classification_prompt(&batch))
        .await
        .map_err(|e| e.to_string())?;

    let classifications = parse_classifications(&reply.text, batch.len())?;

    let mut updated = 0;
    for (position, tags) in classifications {
        let item = &batch[position - 1];
        match news_service::set_tags(&state.db, item.id, &tags).await {
            Ok(()) => updated += 1,
            Err(e) => tracing::error!("[ai] failed to tag {}: {}", item.id.to_hex(), e),
        }
    }

    tracing::info!("[ai] classified {} of {} news items via {}", updated, batch.len(), reply.provider);
    Ok(updated)
}

// ---------------- Daily summary ----------------

pub fn daily_summary_prompt(news: &[NewsItem], today: &str, language: &str) -> String {
    let lines = news
        .iter()
        .enumerate()
        .map(|(i, n)| {
            format!(
                "{}. [{}] {}: {}",
                i + 1,
                n.source_name,
                n.title,
                n.summary.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a crypto and startup analyst. TODAY is {today}. Analyse the following {count} news items \
         from the last 24h and write an executive summary in {language}.\n\n\
         Structure it in sections:\n\
         1) **Highlights** (3-5 key points)\n\
         2) **Market Moves**\n\
         3) **Startups & Funding**\n\
         4) **What to Watch**\n\n\
         Use markdown. Be concise but informative.\n\
         When mentioning dates, use today's correct date: {today}.\n\n\
         News:\n{lines}",
        count = news.len(),
    )
}

/// Summarizes the last 24h of news and upserts it under today's UTC date.
pub async fn generate_daily_summary(state: &AppState) -> Result<String, String> {
    let now = Utc::now();
    let since = (now - TimeDelta::hours(24)).timestamp();

    let news = news_service::published_since(&state.db, since, SUMMARY_NEWS_LIMIT).await?;
    if news.is_empty() {
        return Ok(NO_NEWS_SUMMARY.to_string());
    }

    let offset = render::display_offset(state.settings.display_utc_offset_hours);
    let today = render::fmt_long_date(now, offset);
    let prompt = daily_summary_prompt(&news, &today, &state.settings.ai_response_language);

    let reply = state.ai.complete(&prompt).await.map_err(|e| {
        tracing::error!("[ai] daily summary failed: {}", e);
        e.to_string()
    })?;

    let summary_date = now.format("%Y-%m-%d").to_string();
    let opts = UpdateOptions::builder().upsert(true).build();

    state
        .db
        .collection::<DailySummary>(SUMMARIES)
        .update_one(
            doc! { "summary_date": &summary_date },
            doc! { "$set": {
                "content": &reply.text,
                "model_used": &reply.provider,
                "news_count": news.len() as i64,
                "created_at": now.timestamp(),
            } },
            opts,
        )
        .await
        .map_err(|e| e.to_string())?;

    tracing::info!(
        "[ai] daily summary generated using {} for {} news items",
        reply.provider,
        news.len()
    );
    Ok(reply.text)
}

pub async fn summary_for_date(state: &AppState, date: &str) -> Result<Option<DailySummary>, String> {
    state
        .db
        .collection::<DailySummary>(SUMMARIES)
        .find_one(doc! { "summary_date": date }, None)
        .await
        .map_err(|e| e.to_string())
}

pub async fn latest_summary(state: &AppState) -> Result<Option<DailySummary>, String> {
    let opts = FindOneOptions::builder()
        .sort(doc! { "summary_date": -1 })
        .build();

    state
        .db
        .collection::<DailySummary>(SUMMARIES)
        .find_one(doc! {}, opts)
        .await
        .map_err(|e| e.to_string())
}

// ---------------- Chat ----------------

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSource {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub reply: String,
    pub sources: Vec<ChatSource>,
}

/// Lowercased words longer than 3 chars, first 5.
pub fn extract_keywords(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .take(5)
        .map(|w| w.to_string())
        .collect()
}

/// `[n]` markers in the reply.
pub fn cited_positions(reply: &str) -> BTreeSet<usize> {
    let Ok(re) = Regex::new(r"\[(\d+)\]") else {
        return BTreeSet::new();
    };

    re.captures_iter(reply)
        .filter_map(|c| c.get(1)?.as_str().parse::<usize>().ok())
        .collect()
}

pub fn chat_prompt(context: &[NewsItem], message: &str, today: &str, language: &str) -> String {
    let lines = context
        .iter()
        .enumerate()
        .map(|(i, n)| format!("[{}] {}: {}", i + 1, n.title, n.summary.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Today is {today}. Based on the following recent news, answer the user's question in {language}.\n\
         Be concise and direct. Cite the numbers of the news items you used (format: [n]).\n\n\
         Available news:\n{lines}\n\n\
         Question: {message}"
    )
}

/// Items cited in the reply, in context order.
pub fn cited_sources(context: &[NewsItem], reply: &str) -> Vec<ChatSource> {
    let cited = cited_positions(reply);

    context
        .iter()
        .enumerate()
        .filter(|(i, _)| cited.contains(&(i + 1)))
        .map(|(_, n)| ChatSource {
            id: n.id.to_hex(),
            title: n.title.clone(),
            url: n.url.clone(),
        })
        .collect()
}

async fn chat_context(state: &AppState, message: &str) -> Result<Vec<NewsItem>, String> {
    let keywords = extract_keywords(message);

    let Some(first) = keywords.first() else {
        return news_service::latest(&state.db, CHAT_CONTEXT as i64).await;
    };

    let mut rows = news_service::search_keyword(&state.db, first, CHAT_CONTEXT as i64).await?;

    if rows.len() < CHAT_MIN_MATCHES {
        let latest = news_service::latest(&state.db, CHAT_CONTEXT as i64).await?;
        for item in latest {
            if rows.len() >= CHAT_CONTEXT {
                break;
            }
            if !rows.iter().any(|r| r.id == item.id) {
                rows.push(item);
            }
        }
    }

    Ok(rows)
}

pub async fn chat(state: &AppState, message: &str) -> Result<ChatAnswer, String> {
    let context = chat_context(state, message).await?;

    let offset = render::display_offset(state.settings.display_utc_offset_hours);
    let today = render::fmt_long_date(Utc::now(), offset);
    let prompt = chat_prompt(&context, message, &today, &state.settings.ai_response_language);

    let reply = state.ai.complete(&prompt).await.map_err(|e| e.to_string())?;
    let sources = cited_sources(&context, &reply.text);

    Ok(ChatAnswer {
        reply: reply.text,
        sources,
    })
}
