use std::fmt::Write;

use crate::aggregate::{self, ReportFilter};
use crate::models::EvaluationType;
use crate::roster::Workspace;

const CRITERIA_LIMIT: usize = 10;

/// Renders the performance dashboard for one school as markdown. `filter` narrows every
/// section except the tier breakdown, which always covers the whole school.
pub fn build_report(school: &str, workspace: &Workspace, filter: &ReportFilter) -> String {
    let teachers = workspace.teacher_index();
    let reports = filter.apply(&workspace.reports, &teachers);

    let mut output = String::new();
    let _ = writeln!(output, "# Teacher Performance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} reports, overall average {:.2}%)",
        school,
        reports.len(),
        aggregate::overall_average(reports.iter().copied())
    );
    if let Some(evaluation_type) = filter.evaluation_type {
        let _ = writeln!(output, "Evaluation type: {evaluation_type}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Teacher Averages");
    let averages = aggregate::average_by_teacher(reports.iter().copied(), &teachers);
    if averages.is_empty() {
        let _ = writeln!(output, "No reports recorded for this school.");
    } else {
        for average in &averages {
            let _ = writeln!(
                output,
                "- {}: {:.2}% across {} reports",
                average.teacher_name, average.average, average.report_count
            );
        }
    }

    let extremes = aggregate::criteria_extremes(reports.iter().copied(), CRITERIA_LIMIT);
    for (title, summaries) in [
        ("## Strongest Criteria", &extremes.top),
        ("## Weakest Criteria", &extremes.bottom),
    ] {
        let _ = writeln!(output);
        let _ = writeln!(output, "{title}");
        if summaries.is_empty() {
            let _ = writeln!(output, "No scored criteria.");
        }
        for summary in summaries {
            let _ = writeln!(
                output,
                "- {}: {:.2}% ({} ratings)",
                summary.label, summary.average, summary.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Tiers");
    // School-wide indicator: the view filter does not narrow it.
    let tiers = aggregate::group_by_performance_tier(&workspace.reports);
    if tiers.is_empty() {
        let _ = writeln!(output, "No reports to classify.");
    }
    for (tier, entries) in &tiers {
        let _ = writeln!(output, "### {} ({} reports)", tier.key(), entries.len());
        for entry in entries {
            let _ = writeln!(
                output,
                "- {} on {}: {:.2}%",
                teachers.display_name(entry.report.teacher_id()),
                entry.report.date(),
                entry.percentage
            );
        }
    }

    if filter.evaluation_type.map_or(true, |t| t == EvaluationType::General) {
        let works = aggregate::other_works(reports.iter().copied());
        let _ = writeln!(output);
        let _ = writeln!(output, "## Other Works");
        for (title, counts) in [
            ("Strategies", &works.strategies),
            ("Tools", &works.tools),
            ("Programs", &works.programs),
            ("Sources", &works.sources),
        ] {
            let terms: Vec<String> = counts
                .iter()
                .map(|count| format!("{} ({})", count.term, count.count))
                .collect();
            let listed = if terms.is_empty() {
                "none".to_string()
            } else {
                terms.join(", ")
            };
            let _ = writeln!(output, "- {title}: {listed}");
        }
    }

    output
}
