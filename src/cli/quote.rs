use super::ui;
use crate::core::QuoteService;
use anyhow::Result;

/// Prints the quote as JSON, the same body the web endpoint returns.
pub async fn run(quotes: &QuoteService, from: &str, amount: &str, to: &str) -> Result<()> {
    match quotes.get_quote(from, amount, to).await {
        Ok(quote) => {
            println!("{}", serde_json::to_string_pretty(&quote)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            Err(e.into())
        }
    }
}
