//! kam-runner: headless batch runner for the dealer analytics pipeline.
//!
//! Usage:
//!   kam-runner --data-dir ./data
//!   kam-runner --data-dir ./data --dealer D007 --horizon 6
//!   kam-runner --data-dir ./data --out-dir ./out --json
//!   kam-runner --generate --seed 42 --dealers 50 --data-dir ./data

use anyhow::{Context, Result};
use kam_core::{
    config::PipelineConfig,
    forecast::ForecastRequest,
    loader::{CsvDirectory, SourceTables, TableSource},
    mock_data::{self, MockDataConfig},
    overview::{AccountProfile, PortfolioOverview, TOP_RISK_ACCOUNTS},
    pipeline::{PipelineOutput, ScoringPipeline},
    sentiment::SentimentLabel,
};
use serde::Serialize;
use std::env;
use std::path::Path;

#[derive(Serialize)]
struct RunReport<'a> {
    overview: &'a PortfolioOverview,
    profile:  Option<&'a AccountProfile>,
    output:   &'a PipelineOutput,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");

    if args.iter().any(|a| a == "--generate") {
        let seed = parse_arg(&args, "--seed", 42u64);
        let dealers = parse_arg(&args, "--dealers", MockDataConfig::demo().dealers);
        return generate(Path::new(data_dir), seed, dealers);
    }

    let config_dir = flag_value(&args, "--config").unwrap_or(data_dir);
    let dealer = flag_value(&args, "--dealer");
    let horizon = flag_value(&args, "--horizon")
        .map(|h| h.parse::<u32>().with_context(|| format!("invalid --horizon '{h}'")))
        .transpose()?;
    let out_dir = flag_value(&args, "--out-dir");
    let json = args.iter().any(|a| a == "--json");

    let config = load_config(Path::new(config_dir))?;
    let pipeline = ScoringPipeline::new(config)?;

    let tables = CsvDirectory::new(data_dir)
        .load_tables()
        .with_context(|| format!("loading source tables from {data_dir}"))?;

    let request = ForecastRequest {
        dealer_id:      dealer.map(str::to_string),
        horizon_months: horizon,
    };
    let output = pipeline.run(&tables, &request);

    let overview = PortfolioOverview::build(&tables.dealers, &output, TOP_RISK_ACCOUNTS);
    let profile = match dealer {
        Some(id) => Some(
            AccountProfile::build(id, &tables, &output)
                .with_context(|| format!("unknown dealer '{id}'"))?,
        ),
        None => None,
    };

    if let Some(dir) = out_dir {
        write_outputs(Path::new(dir), &output)?;
    }

    if json {
        let report = RunReport { overview: &overview, profile: profile.as_ref(), output: &output };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Key Account Management: kam-runner");
        println!("  data_dir:  {data_dir}");
        println!("  config:    {config_dir}");
        println!();
        print_summary(&overview, &output);
        if let Some(profile) = &profile {
            print_profile(profile);
        }
    }

    Ok(())
}

/// Falls back to the built-in constants when no config file exists.
fn load_config(dir: &Path) -> Result<PipelineConfig> {
    if dir.join(PipelineConfig::RELATIVE_PATH).exists() {
        Ok(PipelineConfig::load(dir)?)
    } else {
        log::warn!(
            "no {} under {}, using standard scoring constants",
            PipelineConfig::RELATIVE_PATH,
            dir.display(),
        );
        Ok(PipelineConfig::standard())
    }
}

fn generate(data_dir: &Path, seed: u64, dealers: usize) -> Result<()> {
    let config = MockDataConfig::demo().with_dealers(dealers);
    let tables: SourceTables = mock_data::generate(seed, &config)?;
    tables.write(data_dir)?;

    let config_path = data_dir.join(PipelineConfig::RELATIVE_PATH);
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&PipelineConfig::standard())?;
        std::fs::write(&config_path, body)?;
    }

    println!("=== MOCK DATA ===");
    println!("  seed:        {seed}");
    println!("  dealers:     {}", tables.dealers.len());
    println!("  sales rows:  {}", tables.sales.len());
    println!("  claims:      {}", tables.claims.len());
    println!("  crm events:  {}", tables.engagement.len());
    println!("  feedback:    {}", tables.feedback.len());
    println!("  written to:  {}", data_dir.display());
    Ok(())
}

fn write_outputs(dir: &Path, output: &PipelineOutput) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_csv(&dir.join("dealer_health.csv"), &output.health)?;
    write_csv(&dir.join("dealer_churn.csv"), &output.churn)?;
    write_csv(&dir.join("dealer_sentiment.csv"), &output.sentiment)?;
    write_csv(&dir.join("feedback_scored.csv"), &output.feedback)?;
    write_csv(&dir.join("demand_forecast.csv"), &output.forecast)?;
    log::info!("wrote result tables to {}", dir.display());
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(overview: &PortfolioOverview, output: &PipelineOutput) {
    let fmt_opt = |v: Option<f64>, decimals: usize| match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".to_string(),
    };

    println!("=== PORTFOLIO OVERVIEW ===");
    println!("  accounts:          {}", overview.accounts);
    println!("  scored accounts:   {}", overview.scored_accounts);
    println!("  avg health score:  {}", fmt_opt(overview.avg_health_score, 1));
    println!("  high churn risk:   {}", overview.high_churn_accounts);
    println!("  avg churn prob:    {}", fmt_opt(overview.avg_churn_probability, 2));

    let labels = [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative];
    let counts: Vec<String> = labels
        .iter()
        .map(|l| {
            let n = output.feedback.iter().filter(|f| f.sentiment_label == *l).count();
            format!("{l} {n}")
        })
        .collect();
    println!("  feedback:          {}", counts.join(" | "));
    println!("  forecast rows:     {}", output.forecast.len());

    println!();
    println!("=== TOP RISK ACCOUNTS ===");
    if overview.top_risk.is_empty() {
        println!("  (No scored accounts)");
    }
    for a in &overview.top_risk {
        println!(
            "  {} | {} | {} | Health: {:.1} ({}) | Churn: {:.2} ({})",
            a.dealer_id,
            a.region,
            a.tier,
            a.health_score,
            a.health_bucket,
            a.churn_probability,
            a.risk_bucket,
        );
    }
}

fn print_profile(profile: &AccountProfile) {
    println!();
    println!("=== ACCOUNT {} ===", profile.dealer_id);
    if let Some(d) = &profile.dealer {
        println!(
            "  {} | {}, {} | {} | {} | {} years",
            d.dealer_name.as_deref().unwrap_or("-"),
            d.city,
            d.state,
            d.tier,
            d.ownership_type,
            d.years_partnered,
        );
    }
    if let Some(h) = &profile.health {
        println!("  health:     {:.1} ({})", h.health_score, h.health_bucket);
    }
    if let Some(c) = &profile.churn {
        println!("  churn:      {:.2} ({})", c.churn_probability, c.risk_bucket);
    }
    match profile.avg_sentiment {
        Some(s) => println!("  sentiment:  {s:.2}"),
        None => println!("  sentiment:  no feedback"),
    }

    let total_units: u64 = profile.sales_series.iter().map(|p| p.units_sold).sum();
    println!("  units sold: {total_units} over {} sales dates", profile.sales_series.len());
    println!("  claims:     {}", profile.warranty_claims.len());

    println!("  recent touchpoints:");
    for e in &profile.recent_touchpoints {
        println!("    {} | {} | {} min | {}", e.date, e.interaction_type, e.duration_mins, e.notes);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
