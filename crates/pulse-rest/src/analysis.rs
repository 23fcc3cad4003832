//! AI market commentary over the aggregated dashboard data.
//!
//! One POST to an OpenAI-compatible chat-completions endpoint. A single
//! attempt, by design: the commentary is decoration, and a failure is shown
//! to the user instead of hammering a metered API.

use pulse_core::PulseError;
use pulse_core::types::{NewsArticle, PricePoint, Snapshot};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Everything the prompt is assembled from.
pub struct AnalysisRequest<'a> {
    pub coin_name: &'a str,
    pub coin_symbol: &'a str,
    pub snapshot: &'a Snapshot,
    pub history: &'a [PricePoint],
    pub headlines: &'a [NewsArticle],
}

/// Request one round of market commentary.
pub async fn fetch_analysis(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    request: &AnalysisRequest<'_>,
) -> Result<String, PulseError> {
    let body = serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": build_prompt(request)}],
        "temperature": 0.7,
        "max_tokens": 1024,
    });

    let resp = client
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| PulseError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(PulseError::Http(status.as_u16()));
    }

    let v: serde_json::Value =
        resp.json().await.map_err(|e| PulseError::Parse(e.to_string()))?;
    v.pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PulseError::Parse("completion missing content".into()))
}

/// Summary statistics of one history window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HistoryStats {
    avg: f64,
    min: f64,
    max: f64,
    /// First-to-last change over the window, in percent.
    change_pct: f64,
}

fn summarize(points: &[PricePoint]) -> Option<HistoryStats> {
    let first = points.first()?.value;
    let last = points.last()?.value;

    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        sum += p.value;
        min = min.min(p.value);
        max = max.max(p.value);
    }

    let change_pct = if first != 0.0 { (last - first) / first * 100.0 } else { 0.0 };
    Some(HistoryStats { avg: sum / points.len() as f64, min, max, change_pct })
}

fn build_prompt(request: &AnalysisRequest<'_>) -> String {
    let AnalysisRequest { coin_name, coin_symbol, snapshot, history, headlines } = request;

    let mut prompt = format!(
        "You are a cryptocurrency market analyst. Analyze the following data for \
         {coin_name} ({coin_symbol}) and provide actionable insights.\n\n\
         **Current Market Data:**\n\
         - Price: ${:.2}\n\
         - 24h Change: {:.2}%\n\
         - 24h High: ${:.2}\n\
         - 24h Low: ${:.2}\n\
         - 24h Volume: ${:.0}\n",
        snapshot.usd,
        snapshot.usd_24h_change,
        snapshot.usd_24h_high,
        snapshot.usd_24h_low,
        snapshot.usd_24h_vol,
    );

    if let Some(stats) = summarize(history) {
        let direction = if stats.change_pct > 0.0 { "Up" } else { "Down" };
        prompt.push_str(&format!(
            "\n**24-Hour Chart Analysis:**\n\
             - Average Price: ${:.2}\n\
             - Price Range: ${:.2} - ${:.2}\n\
             - Overall Trend: {direction} {:.2}%\n",
            stats.avg,
            stats.min,
            stats.max,
            stats.change_pct.abs(),
        ));
    }

    prompt.push_str("\n**Recent News Headlines:**\n");
    if headlines.is_empty() {
        prompt.push_str("No recent news available\n");
    } else {
        for article in headlines.iter().take(5) {
            prompt.push_str(&format!("- {}\n", article.title));
        }
    }

    prompt.push_str(
        "\nPlease provide a concise analysis covering:\n\
         1. **Price Trend**: Current momentum and direction\n\
         2. **News Sentiment**: Overall market sentiment from news (Bullish/Bearish/Neutral)\n\
         3. **Technical Analysis**: Support/resistance levels and patterns\n\
         4. **Short-term Outlook**: What to watch for in the next 24-48 hours\n\n\
         Keep it concise, professional, and actionable. Use bullet points for clarity.",
    );
    prompt
}
