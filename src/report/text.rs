use crate::pipeline::stage8_report::RunResult;

pub fn render_report(result: &RunResult) -> String {
    let mut out = String::new();
    out.push_str("Ampliqc Run Report\n");
    out.push_str("==================\n\n");
    out.push_str("This report summarizes curve-derived classifications. ");
    out.push_str("Classifications carry provenance, not clinical action; interpret conservatively.\n\n");

    out.push_str("Run overview:\n");
    out.push_str(&format!("- Run: {}\n", result.run_id));
    out.push_str(&format!("- Wells: {}\n", result.wells.len()));
    out.push_str(&format!(
        "- Strategy: {} ({} scale)\n\n",
        result.strategy, result.scale
    ));

    out.push_str("Thresholds:\n");
    for t in &result.thresholds {
        out.push_str(&format!(
            "- {} [{}]: {:.4} ({})\n",
            t.channel,
            t.scale.as_str(),
            t.value,
            t.source.as_str()
        ));
    }
    for (channel, code) in &result.channel_errors {
        out.push_str(&format!("- {channel}: unresolved ({code})\n"));
    }
    out.push('\n');

    out.push_str("Classes:\n");
    let n = result.wells.len().max(1) as f64;
    for (class, count) in result.class_counts() {
        out.push_str(&format!(
            "- {}: {} ({:.2}%)\n",
            class,
            count,
            count as f64 / n * 100.0
        ));
    }
    out.push('\n');

    out.push_str("QC:\n");
    let good = result.wells.iter().filter(|w| w.fit.is_good_scurve).count();
    let flagged = result.wells.iter().filter(|w| !w.anomalies.is_empty()).count();
    let expert = result
        .wells
        .iter()
        .filter(|w| w.classification.method == "expert")
        .count();
    out.push_str(&format!(
        "- Good S-curves: {:.2}%\n",
        good as f64 / n * 100.0
    ));
    out.push_str(&format!(
        "- Anomaly-flagged: {:.2}%\n",
        flagged as f64 / n * 100.0
    ));
    out.push_str(&format!("- Expert-reviewed wells: {expert}\n"));
    out.push('\n');

    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
