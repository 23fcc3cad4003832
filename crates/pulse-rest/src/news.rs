//! Coin news from the CryptoCompare `news` endpoint.
//!
//! Articles arrive under `Data`; only the fields the news cards render are
//! kept. An empty result is a valid (quiet) day, not an error.

use pulse_core::PulseError;
use pulse_core::retry::RetryPolicy;
use pulse_core::types::NewsArticle;

use crate::fetch;

/// Fetch the latest news for a ticker symbol.
pub async fn fetch_news(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
    policy: &RetryPolicy,
) -> Result<Vec<NewsArticle>, PulseError> {
    let symbol = symbol.to_ascii_uppercase();
    let url = format!("{base_url}/news/?lang=EN&categories={symbol}");
    let body = fetch::get_json(client, &url, policy).await?;
    parse_news(&body, &symbol)
}

fn parse_news(body: &serde_json::Value, symbol: &str) -> Result<Vec<NewsArticle>, PulseError> {
    let rows = body
        .get("Data")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| PulseError::Parse("news response missing Data".into()))?;

    let articles = rows
        .iter()
        .filter_map(|row| {
            let id = match row.get("id") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => return None,
            };
            Some(NewsArticle {
                id,
                title: row.get("title")?.as_str()?.to_string(),
                url: row.get("url")?.as_str()?.to_string(),
                published_at: row.get("published_on").and_then(serde_json::Value::as_u64)?,
                source_name: row
                    .pointer("/source_info/name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                currencies: vec![symbol.to_string()],
            })
        })
        .collect();

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_articles() {
        let body: serde_json::Value = serde_json::from_str(
            r#"{"Data": [
                {
                    "id": "123",
                    "title": "Bitcoin climbs",
                    "url": "https://example.com/a",
                    "published_on": 1672515782,
                    "source_info": {"name": "Example Wire"}
                },
                {
                    "id": 456,
                    "title": "Markets wobble",
                    "url": "https://example.com/b",
                    "published_on": 1672512000
                }
            ]}"#,
        )
        .unwrap();
        let articles = parse_news(&body, "BTC").unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "123");
        assert_eq!(articles[0].source_name, "Example Wire");
        assert_eq!(articles[1].id, "456");
        assert_eq!(articles[1].source_name, "unknown");
        assert_eq!(articles[0].currencies, vec!["BTC".to_string()]);
    }

    #[test]
    fn rows_missing_required_fields_are_skipped() {
        let body: serde_json::Value = serde_json::from_str(
            r#"{"Data": [
                {"id": "1", "title": "no url", "published_on": 1},
                {"id": "2", "title": "ok", "url": "https://example.com", "published_on": 2}
            ]}"#,
        )
        .unwrap();
        let articles = parse_news(&body, "BTC").unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "2");
    }

    #[test]
    fn a_quiet_day_is_not_an_error() {
        let body: serde_json::Value = serde_json::from_str(r#"{"Data": []}"#).unwrap();
        assert!(parse_news(&body, "BTC").unwrap().is_empty());
    }

    #[test]
    fn missing_data_key_is_a_parse_error() {
        let body: serde_json::Value = serde_json::from_str(r#"{"Message": "oops"}"#).unwrap();
        assert!(matches!(parse_news(&body, "BTC"), Err(PulseError::Parse(_))));
    }
}
