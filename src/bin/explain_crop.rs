// Explain one crop against climate measurements
//
// Usage: explain_crop CROP temperature rainfall humidity ph

use anyhow::{bail, Context, Result};
use crop_advisor_rust::{AdvisorConfig, CropDataset, Recommender, UserInput};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_advisor_rust=info,warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        bail!("usage: explain_crop CROP temperature rainfall humidity ph");
    }

    let mut climate = [0.0; 4];
    for (slot, (name, text)) in climate
        .iter_mut()
        .zip(["temperature", "rainfall", "humidity", "ph"].iter().zip(&args[1..]))
    {
        *slot = text
            .trim()
            .parse()
            .with_context(|| format!("{} '{}' is not a number", name, text))?;
    }
    let input = UserInput::climate(climate[0], climate[1], climate[2], climate[3])?;

    let config = AdvisorConfig::from_env()?;
    let dataset = CropDataset::from_csv(&config.dataset_path)?;
    let recommender = Recommender::from_dataset(&dataset, &config)?;
    let assessment = recommender.explain(&args[0], &input)?;

    println!("{} ({})", assessment.crop, assessment.risk);
    println!("{}", "=".repeat(60));
    for reason in &assessment.why {
        println!("  ✅ {}", reason);
    }
    for reason in &assessment.why_not {
        println!("  ⚠️  {}", reason);
    }

    Ok(())
}
