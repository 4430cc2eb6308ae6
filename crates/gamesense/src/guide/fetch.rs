use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use serde::Serialize;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{
    FetchLimits, GuideFetcher, GuideStatus, HttpPageSource, DEFAULT_MAX_GUIDE_CHARS,
    DEFAULT_MAX_PAGE_BYTES,
};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct FetchOptions {
    /// Guide URL to fetch
    #[clap(env = "GUIDE_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, env = "GUIDE_TIMEOUT", default_value = "10")]
    pub timeout: u64,

    /// Maximum characters kept from the page
    #[arg(long, env = "GUIDE_MAX_CHARS", default_value_t = DEFAULT_MAX_GUIDE_CHARS)]
    pub max_chars: usize,

    /// Largest page body read, in bytes
    #[arg(long, env = "GUIDE_MAX_BYTES", default_value_t = DEFAULT_MAX_PAGE_BYTES)]
    pub max_bytes: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct FetchOutput {
    pub url: String,
    pub status: GuideStatus,
    pub text: String,
    pub characters: usize,
    pub fetch_time_ms: u64,
}

/// Fetch the page strictly: unlike request handling, errors are reported.
pub async fn fetch(options: FetchOptions) -> Result<()> {
    let source = HttpPageSource::new(Duration::from_secs(options.timeout), options.max_bytes)?;
    let fetcher = GuideFetcher::new(
        Arc::new(source),
        FetchLimits {
            max_chars: options.max_chars,
            ..FetchLimits::default()
        },
    );

    let start = Instant::now();
    let text = fetcher
        .try_fetch_guide_text(&options.url)
        .await
        .map_err(|e| eyre!("{}", e))?;

    let output = FetchOutput {
        url: options.url.clone(),
        status: GuideStatus::Loaded,
        characters: text.chars().count(),
        text,
        fetch_time_ms: millis(start.elapsed()),
    };

    if options.json {
        output_json(&output)
    } else {
        output_formatted(&output);
        Ok(())
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn output_json(output: &FetchOutput) -> Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    println!("{}", json);
    Ok(())
}

fn output_formatted(output: &FetchOutput) {
    // Decorations only when a human is watching
    if !std::io::stdout().is_terminal() {
        println!("{}", output.text);
        return;
    }

    eprintln!("\n{}", "=".repeat(80).bright_cyan());
    eprintln!("{}", "GUIDE TEXT".bright_cyan().bold());
    eprintln!("{}", "=".repeat(80).bright_cyan());
    eprintln!("\n{}: {}", "URL".green(), output.url.cyan().underline());
    eprintln!(
        "{}: {}",
        "Characters".green(),
        output.characters.to_string().bright_yellow()
    );
    eprintln!(
        "{}: {}",
        "Fetch Time".green(),
        f!("{} ms", output.fetch_time_ms).bright_yellow()
    );
    eprintln!("{}", "=".repeat(80).bright_magenta());

    for line in output.text.lines() {
        println!("{}", line.white());
    }

    eprintln!("\n{}:", "To get JSON output".bright_white().bold());
    eprintln!(
        "  {}",
        f!("gamesense guide fetch {} --json", output.url).cyan()
    );
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_converts_durations() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::ZERO), 0);
    }

    #[test]
    fn test_millis_saturates_instead_of_wrapping() {
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
