//! Human-readable rendering of a [`Report`].
//!
//! The structured record is the primary output; this produces the markdown
//! executive summary handed to presentation layers.

use docintel_shared::Report;

/// Render a report as a markdown executive summary.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("# Executive Summary\n\n");
    out.push_str(&report.summary);
    out.push_str("\n\n## Key Findings\n");
    for finding in &report.key_findings {
        out.push_str(&format!("- {finding}\n"));
    }

    out.push_str("\n## Scores\n");
    out.push_str(&format!(
        "- Sentiment: {}/100 ({}, {:.0}% confidence)\n",
        report.sentiment.score,
        report.sentiment.label,
        report.sentiment.confidence * 100.0
    ));
    out.push_str(&format!(
        "- Risk: {}/20 ({})\n",
        report.risk.score, report.risk.level
    ));
    if !report.risk.categories.is_empty() {
        out.push_str(&format!(
            "- Risk categories: {}\n",
            report.risk.categories.join(", ")
        ));
    }

    out.push_str("\n## Recommendations\n");
    for (i, rec) in report.recommendations.iter().enumerate() {
        out.push_str(&format!("{}. {rec}\n", i + 1));
    }

    out.push_str(&format!(
        "\n---\nGenerated at {}\n",
        report.generated_at.to_rfc3339()
    ));

    out
}
