use super::ui;
use crate::core::QuoteService;
use crate::core::rates::{SourceRates, max_rates, rates_table};
use anyhow::Result;
use comfy_table::Table;
use tracing::info;

/// The source-plus-max grid, styled for the terminal.
pub fn display_rates(results: &[SourceRates]) -> Table {
    let mut table = rates_table(results, &max_rates(results));
    ui::style_table(&mut table);
    table
}

/// Prints what every source reports for `base`. With `refresh` the best
/// rates are also written to the rate cache.
pub async fn run(quotes: &QuoteService, base: &str, refresh: bool) -> Result<()> {
    info!(base, refresh, "Fetching rates from all sources");
    let results = if refresh {
        quotes.refresh_rates(base).await?
    } else {
        quotes.source_rates(base).await?
    };

    println!(
        "\n{}",
        ui::style_text(&format!("Exchange rates for {base}"), ui::StyleType::Title)
    );
    println!("{}", display_rates(&results));

    let fetched_at = results
        .iter()
        .map(|r| r.fetched_at)
        .max()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    println!(
        "{}",
        ui::style_text(
            &format!(
                "{} of {} sources answered, fetched at {}",
                results.len(),
                quotes.source_count(),
                fetched_at
            ),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_display_rates() {
        let results = vec![
            SourceRates {
                source: "openrates",
                rates: [("EUR".to_string(), 0.8389261745)].into_iter().collect(),
                fetched_at: Utc::now(),
            },
            SourceRates {
                source: "exchange_rate",
                rates: [("EUR".to_string(), 0.837996), ("ILS".to_string(), 3.323482)]
                    .into_iter()
                    .collect(),
                fetched_at: Utc::now(),
            },
        ];

        let rendered = display_rates(&results).to_string();
        assert!(rendered.contains("openrates"));
        assert!(rendered.contains("0.8389261745"));
        assert!(rendered.contains("3.323482"));
        assert!(rendered.contains("NaN"));
        assert!(rendered.contains("max"));
        // Terminal styling, not the plain ASCII grid of the debug log
        assert!(rendered.contains('╭'));
    }
}
