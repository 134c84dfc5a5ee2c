// Recommend crops for one field from the command line
//
// Usage: recommend N P K temperature humidity ph rainfall [--json]
// Dataset and scoring come from ADVISOR_CONFIG / DATASET_PATH / RISK_SCORING.

use anyhow::{bail, Result};
use crop_advisor_rust::{
    assess_stability, AdvisorConfig, JsonFormatter, MarkdownFormatter, Recommender,
    StabilityConfig, UserInput,
};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FIELDS: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_advisor_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let stability = args.iter().any(|a| a == "--stability");
    let values: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if values.len() != FIELDS.len() {
        bail!(
            "expected {} measurements ({}), got {}",
            FIELDS.len(),
            FIELDS.join(" "),
            values.len()
        );
    }

    // Same validation path as a submitted form
    let raw: HashMap<String, String> = FIELDS
        .iter()
        .zip(values)
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect();
    let input = UserInput::from_raw(&raw)?;

    let config = AdvisorConfig::from_env()?;
    let recommender = Recommender::from_config(&config)?;
    let ranked = recommender.recommend(&input)?;

    if json {
        println!("{}", JsonFormatter::format(&ranked)?);
    } else {
        print!("{}", MarkdownFormatter::format(&ranked));
    }

    if stability {
        let report = assess_stability(&recommender, &input, &StabilityConfig::default())?;
        println!("\n====== EXPLANATION STABILITY ======");
        println!("Base top crop:        {}", report.base_top_crop);
        println!("Top crop agreement:   {:.3}", report.top_crop_agreement);
        println!("Mean Jaccard (why-not): {:.3}", report.mean_jaccard);
    }

    Ok(())
}
