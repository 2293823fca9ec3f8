use std::fmt::Write;

use super::AnalyticsSummary;

/// Plain-text briefing handed to the external assistant ahead of each chat
/// turn. Only aggregate figures are included, never individual records.
pub fn assistant_context(summary: &AnalyticsSummary) -> String {
    let kpis = &summary.kpis;
    let mut context = String::from(
        "You are an assistant embedded in EduInsight, a learning analytics dashboard for school educators.\n\n",
    );

    context.push_str("CURRENT DATASET SUMMARY:\n");
    let _ = writeln!(context, "- Total students: {}", thousands(kpis.total));
    let _ = writeln!(context, "- Average exam score: {}", kpis.avg_score);
    let _ = writeln!(context, "- Average attendance: {}%", kpis.avg_attend);
    let _ = writeln!(
        context,
        "- High-risk students: {} ({:.1}%)",
        thousands(kpis.high_risk),
        kpis.high_risk_pct()
    );
    let _ = writeln!(context, "- Medium-risk: {}", thousands(kpis.medium_risk));
    let _ = writeln!(context, "- Low-risk: {}", thousands(kpis.low_risk));
    let _ = writeln!(context, "- Average study hours: {}h/week", kpis.avg_hours);
    let _ = writeln!(
        context,
        "- Largest persona group: {} ({}%)",
        kpis.top_cluster, kpis.top_cluster_pct
    );

    context.push_str("\nLEARNER PERSONAS:\n");
    for cluster in &summary.clusters {
        let _ = writeln!(
            context,
            "  * {}: {} students (avg score {}, avg attend {}%, high-risk: {})",
            cluster.name,
            thousands(cluster.count),
            cluster.avg_score,
            cluster.avg_attend,
            cluster.risk_high
        );
    }

    context.push_str(
        "\nAnswer questions using this data where relevant. Be concise, practical and supportive. \
         If the data above does not cover a question, say so plainly.",
    );
    context
}

fn thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::catalog::PersonaCatalog;
    use crate::analytics::engine::PersonaEngine;
    use crate::analytics::test_support::student;

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(6607), "6,607");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn context_reports_kpis_and_every_persona() {
        let engine = PersonaEngine::standard();
        let mut risky = student();
        risky.attendance = 60.0;
        risky.exam_score = 50.0;
        risky.hours_studied = 4.0;
        let records = vec![
            engine.score(1, student()),
            engine.score(2, student()),
            engine.score(3, risky),
        ];
        let summary = AnalyticsSummary::from_records(&records, &PersonaCatalog::standard());

        let context = assistant_context(&summary);
        assert!(context.contains("- Total students: 3\n"));
        assert!(context.contains("- High-risk students: 1 (33.3%)\n"));
        assert!(context.contains("- Largest persona group: Passive Coaster (66.7%)\n"));
        for cluster in &summary.clusters {
            assert!(context.contains(&format!("  * {}:", cluster.name)));
        }
    }
}
