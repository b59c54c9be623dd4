//! End-to-end checks over the public API: building reports, scoring them,
//! aggregating a school and generating feedback.

use assert_matches::assert_matches;
use chrono::NaiveDate;

use school_evaluation::aggregate::{self, ReportFilter, SortDirection};
use school_evaluation::models::{ClassSessionSubType, EvaluationType, Report};
use school_evaluation::propagation::{self, CriterionScope, ReportKind};
use school_evaluation::roster::Workspace;
use school_evaluation::scoring;
use school_evaluation::tier::{self, PerformanceTier};
use school_evaluation::EvaluationError;

const SCHOOL: &str = "مدارس الرائد النموذجية";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

fn general_with(workspace: &Workspace, teacher_id: &str, date: NaiveDate, scores: [u8; 8]) -> Report {
    let teacher = workspace.teacher(teacher_id).unwrap();
    let mut report = propagation::new_report(
        ReportKind::General,
        teacher,
        &workspace.reports,
        &workspace.custom_criteria,
        date,
    );
    for (index, score) in scores.into_iter().enumerate() {
        report.set_score(&format!("gc{}", index + 1), score).unwrap();
    }
    report
}

// ---------------------------------------------------------------------------
// Scoring and tiers
// ---------------------------------------------------------------------------

#[test]
fn percentages_and_tiers_agree() {
    assert_eq!(scoring::percentage_of(&[4, 3, 2, 1], 4), 62.5);
    assert_eq!(scoring::percentage_of(&[], 4), 0.0);

    assert_eq!(tier::classify(62.5), PerformanceTier::Tier61To74);
    assert_eq!(tier::classify(30.0), PerformanceTier::Tier0To30);
    assert_eq!(tier::classify(30.5), PerformanceTier::Tier31To40);
    assert_eq!(tier::classify(100.0), PerformanceTier::Tier90To100);
}

#[test]
fn stored_json_round_trip_keeps_the_percentage() {
    let mut workspace = Workspace::default();
    let teacher_id = workspace.add_teacher("عفاف الجبري", SCHOOL).unwrap().id.clone();
    let report = general_with(&workspace, &teacher_id, day(2), [4, 4, 3, 3, 2, 2, 1, 1]);

    let stored = serde_json::to_string(&report).unwrap();
    let restored: Report = serde_json::from_str(&stored).unwrap();

    assert_eq!(restored, report);
    assert_eq!(scoring::report_percentage(&restored), scoring::report_percentage(&report));
    assert_eq!(scoring::report_percentage(&report), 62.5);
}

#[test]
fn general_reports_reject_a_zero_score() {
    let mut workspace = Workspace::default();
    let teacher_id = workspace.add_teacher("بشرى الحكيمي", SCHOOL).unwrap().id.clone();
    let mut report = general_with(&workspace, &teacher_id, day(1), [1; 8]);

    assert_matches!(
        report.set_score("gc1", 0),
        Err(EvaluationError::InvalidScore {
            evaluation_type: EvaluationType::General,
            score: 0
        })
    );
}

// ---------------------------------------------------------------------------
// Aggregation over a school
// ---------------------------------------------------------------------------

#[test]
fn school_dashboard_aggregates() {
    let mut workspace = Workspace::default();
    let first = workspace.add_teacher("سمية الشرعبي", SCHOOL).unwrap().id.clone();
    let second = workspace.add_teacher("أسماء المقطري", SCHOOL).unwrap().id.clone();

    let strong = general_with(&workspace, &first, day(3), [4; 8]);
    workspace.save_report(strong).unwrap();
    let weak = general_with(&workspace, &second, day(5), [2; 8]);
    workspace.save_report(weak).unwrap();

    let teachers = workspace.teacher_index();
    let reports = ReportFilter::default().apply(&workspace.reports, &teachers);
    assert_eq!(reports[0].teacher_id(), second);

    let averages = aggregate::average_by_teacher(reports.iter().copied(), &teachers);
    assert_eq!(averages[0].teacher_name, "سمية الشرعبي");
    assert_eq!(averages[0].average, 100.0);
    assert_eq!(averages[1].average, 50.0);
    assert_eq!(aggregate::overall_average(reports.iter().copied()), 75.0);

    let summaries = aggregate::average_by_criterion_label(reports.iter().copied(), SortDirection::Descending);
    let attendance = summaries
        .iter()
        .find(|summary| summary.label == "حضور اللقاء التطويري")
        .unwrap();
    assert_eq!(attendance.average, 75.0);
    assert_eq!(attendance.count, 2);
    assert_eq!(attendance.distribution.get(&4), Some(&1));
    assert_eq!(attendance.distribution.get(&2), Some(&1));

    let tiers = aggregate::group_by_performance_tier(reports.iter().copied());
    assert_eq!(tiers[&PerformanceTier::Tier90To100].len(), 1);
    assert_eq!(tiers[&PerformanceTier::Tier41To60].len(), 1);
}

#[test]
fn term_frequency_orders_by_count() {
    let counts = aggregate::term_frequency(["سبورة, عرض", "عرض،خرائط\n عرض "]);

    let terms: Vec<(&str, usize)> = counts.iter().map(|c| (c.term.as_str(), c.count)).collect();
    assert_eq!(terms, vec![("عرض", 3), ("سبورة", 1), ("خرائط", 1)]);
}

// ---------------------------------------------------------------------------
// Roster and criteria lifecycle
// ---------------------------------------------------------------------------

#[test]
fn deleting_a_teacher_leaves_no_reports_behind() {
    let mut workspace = Workspace::default();
    let teacher_id = workspace.add_teacher("منى الأديمي", SCHOOL).unwrap().id.clone();
    for d in 1..=3 {
        let report = general_with(&workspace, &teacher_id, day(d), [3; 8]);
        workspace.save_report(report).unwrap();
    }

    assert_eq!(workspace.delete_teacher(&teacher_id).unwrap(), 3);
    assert!(workspace.reports.iter().all(|r| r.teacher_id() != teacher_id));
}

#[test]
fn school_wide_criterion_reaches_the_next_report() {
    let mut workspace = Workspace::default();
    let teacher_id = workspace.add_teacher("رغد الأهدل", SCHOOL).unwrap().id.clone();
    let mut report = general_with(&workspace, &teacher_id, day(1), [3; 8]);

    let custom = propagation::add_criterion(&mut report, None, " إعداد ملف الإنجاز ", CriterionScope::School)
        .unwrap()
        .expect("school scope returns a record");
    workspace.add_custom_criterion(custom);
    workspace.save_report(report).unwrap();

    let next = general_with(&workspace, &teacher_id, day(8), [3; 8]);
    let labels: Vec<&str> = next.flattened_criteria().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels.len(), 9);
    assert_eq!(labels[8], "إعداد ملف الإنجاز");
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[test]
fn feedback_is_regenerated_from_scores() {
    let mut workspace = Workspace::default();
    let teacher_id = workspace.add_teacher("هبة العريقي", SCHOOL).unwrap().id.clone();
    let teacher = workspace.teacher(&teacher_id).unwrap();
    let mut report = propagation::new_report(
        ReportKind::ClassSession(ClassSessionSubType::Brief),
        teacher,
        &[],
        &[],
        day(9),
    );
    report.set_score("csb1c1", 4).unwrap();
    report.set_score("csb3c2", 2).unwrap();

    let Report::ClassSession(session) = &mut report else {
        panic!("expected a class-session report");
    };
    session.regenerate_feedback();
    let first = (
        session.positives.clone(),
        session.notes_for_improvement.clone(),
        session.recommendations.clone(),
    );
    session.regenerate_feedback();

    assert_eq!(
        session.positives,
        "لقد تميزت في الاهتمام بمظهره الشخصي، ولقد وصلت إلى أعلى المستويات في هذا المعيار."
    );
    assert_eq!(
        session.notes_for_improvement,
        "نطمح إلى الارتقاء أكثر في إدارة التفاعل الصفي بنجاح بحيث يرتقي إلى أعلى المستويات."
    );
    assert!(session.recommendations.starts_with("نرجو التحسن بشكل أفضل في إظهار ثقة بنفسه"));
    assert_eq!(
        (session.positives.clone(), session.notes_for_improvement.clone(), session.recommendations.clone()),
        first
    );
}
