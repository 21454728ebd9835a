//! `analyze` command: aggregate both providers and print the report.

use std::fmt::Write as _;

use pulse_core::AppConfig;
use pulse_sentiment::{AggregateReport, AggregateRequest, Aggregator, Provider};

/// Run one aggregation and print the report to stdout.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or JSON output fails.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    request: &AggregateRequest,
    json: bool,
) -> anyhow::Result<()> {
    if request.instagram.is_none() && request.search.is_none() {
        println!(
            "no credentials provided; set INSTAGRAM_USER_ID/INSTAGRAM_ACCESS_TOKEN or SEARCH_BEARER_TOKEN"
        );
        return Ok(());
    }

    let aggregator = Aggregator::from_config(config)?;
    let report = aggregator.aggregate(request).await;

    tracing::info!(
        instagram_items = report.instagram_items.len(),
        search_items = report.search_items.len(),
        warnings = report.warnings.len(),
        "aggregation complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report, &request.query));
    }

    Ok(())
}

/// Render the report as plain text, one section per provider.
pub(crate) fn render_report(report: &AggregateReport, query: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== Instagram ==");
    for warning in report.warnings_for(Provider::Instagram) {
        let _ = writeln!(out, "! {}", warning.message);
    }
    if report.instagram_items.is_empty() {
        let _ = writeln!(out, "no Instagram posts");
    }
    for item in &report.instagram_items {
        let label = item.caption_sentiment.label();
        let _ = writeln!(
            out,
            "{:<10}{:>8.4}  {}",
            label.to_string(),
            item.caption_sentiment.compound,
            item.caption
        );
        if let Some(url) = &item.media_url {
            let _ = writeln!(out, "          {url}");
        }
        for comment in &item.comments {
            let _ = writeln!(
                out,
                "    {:<10}{:>8.4}  {}",
                comment.sentiment.label().to_string(),
                comment.sentiment.compound,
                comment.text
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "== Search: {query} ==");
    for warning in report.warnings_for(Provider::Search) {
        let _ = writeln!(out, "! {}", warning.message);
    }
    if !report.search_items.is_empty() {
        let _ = writeln!(out, "{:<14}{:<20}{:<10}TEXT", "SENTIMENT", "AUTHOR", "SCORE");
    }
    for item in &report.search_items {
        let author = if item.username.is_empty() {
            item.author.clone()
        } else {
            format!("@{}", item.username)
        };
        let _ = writeln!(
            out,
            "{:<14}{:<20}{:<10.4}{}",
            item.sentiment_label.decorated(),
            author,
            item.sentiment.compound,
            item.text.replace('\n', " ")
        );
    }

    out
}
