use crate::ranker::RecommendationEntry;
use crate::risk::RiskTier;

/// Markdown formatter for ranked recommendations
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format recommendations as markdown, in ranked order
    pub fn format(entries: &[RecommendationEntry]) -> String {
        let mut md = String::with_capacity(1024);

        md.push_str("# Crop Recommendations\n\n");

        if entries.is_empty() {
            md.push_str("No recommendations available.\n");
            return md;
        }

        // Summary table
        md.push_str("| Rank | Crop | Suitability | Risk |\n");
        md.push_str("|------|------|-------------|------|\n");
        for (i, entry) in entries.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} {} |\n",
                i + 1,
                entry.crop,
                entry.suitability_display(),
                risk_icon(entry.risk),
                entry.risk
            ));
        }
        md.push('\n');

        for (i, entry) in entries.iter().enumerate() {
            Self::format_entry(&mut md, i + 1, entry);
        }

        md
    }

    fn format_entry(md: &mut String, rank: usize, entry: &RecommendationEntry) {
        md.push_str(&format!("## {}. {}\n\n", rank, entry.crop));
        md.push_str(&format!(
            "**Suitability:** {}  \n**Risk:** {} {}\n\n",
            entry.suitability_display(),
            risk_icon(entry.risk),
            entry.risk
        ));

        if !entry.why.is_empty() {
            md.push_str("### Why\n\n");
            for reason in &entry.why {
                md.push_str(&format!("- ✅ {}\n", reason));
            }
            md.push('\n');
        }

        if !entry.why_not.is_empty() {
            md.push_str("### Why Not\n\n");
            for reason in &entry.why_not {
                md.push_str(&format!("- ⚠️ {}\n", reason));
            }
            md.push('\n');
        }
    }
}

fn risk_icon(risk: RiskTier) -> &'static str {
    match risk {
        RiskTier::Low => "🟢",
        RiskTier::Medium => "🟡",
        RiskTier::High => "🔴",
    }
}
