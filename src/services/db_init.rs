use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

use super::{alerts_service::ALERTS, ai_service::SUMMARIES, news_service::NEWS, price_service::HISTORY};

pub async fn ensure_indexes(db: &Database) -> Result<(), String> {
    // news: one item per source url; newsletters without url are skipped by `sparse`
    {
        let col = db.collection::<mongodb::bson::Document>(NEWS);
        let model = IndexModel::builder()
            .keys(doc! { "url": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;

        let model = IndexModel::builder()
            .keys(doc! { "published_at": -1 })
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // daily_summaries: one row per date (upsert target)
    {
        let col = db.collection::<mongodb::bson::Document>(SUMMARIES);
        let model = IndexModel::builder()
            .keys(doc! { "summary_date": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // btc_price_history: range scans by time
    {
        let col = db.collection::<mongodb::bson::Document>(HISTORY);
        let model = IndexModel::builder()
            .keys(doc! { "recorded_at": 1 })
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // price_alerts: monitor scan + lookup by email
    {
        let col = db.collection::<mongodb::bson::Document>(ALERTS);
        let model = IndexModel::builder()
            .keys(doc! { "is_active": 1 })
            .build();

        if let Err(e) = col.create_index(model, None).await {
            tracing::warn!("[boot] price_alerts is_active index not created: {}", e);
        }

        let model = IndexModel::builder()
            .keys(doc! { "email": 1, "created_at": -1 })
            .build();

        if let Err(e) = col.create_index(model, None).await {
            tracing::warn!("[boot] price_alerts email index not created: {}", e);
        }
    }

    Ok(())
}
