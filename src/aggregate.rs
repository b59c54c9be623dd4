use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{EvaluationType, Report, Teacher};
use crate::scoring::{self, MAX_SCORE};
use crate::tier::{self, PerformanceTier};

/// Display name used when a report's teacher cannot be resolved.
pub const UNKNOWN_TEACHER: &str = "Unknown";

/// Comma, Arabic comma and newline.
pub const DEFAULT_TERM_DELIMITERS: [char; 3] = [',', '،', '\n'];

/// Lookup from teacher id to teacher name.
pub struct TeacherIndex<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> TeacherIndex<'a> {
    pub fn new(teachers: &'a [Teacher]) -> Self {
        let names = teachers
            .iter()
            .map(|teacher| (teacher.id.as_str(), teacher.name.as_str()))
            .collect();
        Self { names }
    }

    pub fn name(&self, teacher_id: &str) -> Option<&'a str> {
        self.names.get(teacher_id).copied()
    }

    pub fn display_name(&self, teacher_id: &str) -> &'a str {
        self.name(teacher_id).unwrap_or(UNKNOWN_TEACHER)
    }
}

/// Caller-supplied view filter. Every populated field must match.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub evaluation_type: Option<EvaluationType>,
    pub teacher_id: Option<String>,
    pub name_query: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report, teachers: &TeacherIndex<'_>) -> bool {
        let type_match = self
            .evaluation_type
            .map_or(true, |evaluation_type| report.evaluation_type() == evaluation_type);
        let teacher_match = self
            .teacher_id
            .as_deref()
            .map_or(true, |teacher_id| report.teacher_id() == teacher_id);
        let search_match = match self.name_query.as_deref() {
            None | Some("") => true,
            Some(query) => teachers
                .name(report.teacher_id())
                .unwrap_or_default()
                .to_lowercase()
                .contains(&query.to_lowercase()),
        };

        type_match && teacher_match && search_match
    }

    /// Matching reports, newest first.
    pub fn apply<'r>(&self, reports: &'r [Report], teachers: &TeacherIndex<'_>) -> Vec<&'r Report> {
        let mut matching: Vec<&Report> = reports
            .iter()
            .filter(|report| self.matches(report, teachers))
            .collect();
        matching.sort_by(|a, b| b.date().cmp(&a.date()));
        matching
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportWithPercentage<'a> {
    pub report: &'a Report,
    pub percentage: f64,
}

pub fn with_percentages<'a, I>(reports: I) -> Vec<ReportWithPercentage<'a>>
where
    I: IntoIterator<Item = &'a Report>,
{
    reports
        .into_iter()
        .map(|report| ReportWithPercentage {
            report,
            percentage: scoring::report_percentage(report),
        })
        .collect()
}

/// Mean report percentage, 0 for an empty set.
pub fn overall_average<'a, I>(reports: I) -> f64
where
    I: IntoIterator<Item = &'a Report>,
{
    let (total, count) = reports
        .into_iter()
        .fold((0.0, 0usize), |(total, count), report| {
            (total + scoring::report_percentage(report), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAverage {
    pub teacher_id: String,
    pub teacher_name: String,
    pub average: f64,
    pub report_count: usize,
}

/// Mean percentage per teacher, highest first. Reports whose teacher is not in the
/// index are left out.
pub fn average_by_teacher<'a, I>(reports: I, teachers: &TeacherIndex<'_>) -> Vec<TeacherAverage>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

    for report in reports {
        let teacher_id = report.teacher_id();
        if teachers.name(teacher_id).is_none() {
            tracing::debug!(report_id = report.id(), teacher_id, "skipping report with unknown teacher");
            continue;
        }

        let entry = totals.entry(teacher_id).or_insert_with(|| {
            order.push(teacher_id);
            (0.0, 0)
        });
        entry.0 += scoring::report_percentage(report);
        entry.1 += 1;
    }

    let mut averages: Vec<TeacherAverage> = order
        .into_iter()
        .map(|teacher_id| {
            let (total, count) = totals[teacher_id];
            TeacherAverage {
                teacher_id: teacher_id.to_string(),
                teacher_name: teachers.display_name(teacher_id).to_string(),
                average: total / count as f64,
                report_count: count,
            }
        })
        .collect();

    averages.sort_by(|a, b| b.average.partial_cmp(&a.average).unwrap_or(Ordering::Equal));
    averages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionSummary {
    pub label: String,
    pub average: f64,
    pub count: usize,
    pub distribution: BTreeMap<u8, usize>,
}

/// Groups every criterion occurrence of every report by its label, across report kinds.
/// Ties keep first-seen order in both directions.
pub fn average_by_criterion_label<'a, I>(reports: I, direction: SortDirection) -> Vec<CriterionSummary>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, Vec<u8>)> = Vec::new();

    for report in reports {
        for criterion in report.flattened_criteria() {
            let position = *positions.entry(criterion.label.as_str()).or_insert_with(|| {
                grouped.push((criterion.label.as_str(), Vec::new()));
                grouped.len() - 1
            });
            grouped[position].1.push(criterion.score);
        }
    }

    let mut summaries: Vec<CriterionSummary> = grouped
        .into_iter()
        .map(|(label, scores)| {
            let mut distribution = BTreeMap::new();
            for score in &scores {
                *distribution.entry(*score).or_insert(0) += 1;
            }
            CriterionSummary {
                label: label.to_string(),
                average: scoring::percentage_of(&scores, MAX_SCORE),
                count: scores.len(),
                distribution,
            }
        })
        .collect();

    sort_summaries(&mut summaries, direction);
    summaries
}

pub fn sort_summaries(summaries: &mut [CriterionSummary], direction: SortDirection) {
    summaries.sort_by(|a, b| {
        let ordering = a.average.partial_cmp(&b.average).unwrap_or(Ordering::Equal);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Strongest and weakest criteria, `limit` of each.
#[derive(Debug, Clone, Serialize)]
pub struct CriteriaExtremes {
    pub top: Vec<CriterionSummary>,
    pub bottom: Vec<CriterionSummary>,
}

pub fn criteria_extremes<'a, I>(reports: I, limit: usize) -> CriteriaExtremes
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut top = average_by_criterion_label(reports, SortDirection::Descending);
    let mut bottom = top.clone();
    sort_summaries(&mut bottom, SortDirection::Ascending);
    top.truncate(limit);
    bottom.truncate(limit);
    CriteriaExtremes { top, bottom }
}

/// Teacher names that received each score on one criterion label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecipients {
    pub label: String,
    pub by_score: BTreeMap<u8, Vec<String>>,
}

/// Per label (sorted by label), the distinct teacher names at each score. Reports whose
/// teacher is unknown are skipped.
pub fn teachers_by_criterion_score<'a, I>(reports: I, teachers: &TeacherIndex<'_>) -> Vec<ScoreRecipients>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut grouped: BTreeMap<String, BTreeMap<u8, Vec<String>>> = BTreeMap::new();

    for report in reports {
        let Some(teacher_name) = teachers.name(report.teacher_id()) else {
            continue;
        };
        for criterion in report.flattened_criteria() {
            let names = grouped
                .entry(criterion.label.clone())
                .or_default()
                .entry(criterion.score)
                .or_default();
            if !names.iter().any(|name| name == teacher_name) {
                names.push(teacher_name.to_string());
            }
        }
    }

    grouped
        .into_iter()
        .map(|(label, by_score)| ScoreRecipients { label, by_score })
        .collect()
}

/// Buckets every given report by tier. Only non-empty tiers appear, in ascending order.
pub fn group_by_performance_tier<'a, I>(reports: I) -> BTreeMap<PerformanceTier, Vec<ReportWithPercentage<'a>>>
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut grouped: BTreeMap<PerformanceTier, Vec<ReportWithPercentage<'a>>> = BTreeMap::new();
    for entry in with_percentages(reports) {
        grouped.entry(tier::classify(entry.percentage)).or_default().push(entry);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

pub fn term_frequency<'s, I>(values: I) -> Vec<TermCount>
where
    I: IntoIterator<Item = &'s str>,
{
    term_frequency_with(values, &DEFAULT_TERM_DELIMITERS)
}

/// Splits each value on `delimiters`, trims, drops empties, and tallies terms
/// case-sensitively. Most frequent first; ties keep first-seen order.
pub fn term_frequency_with<'s, I>(values: I, delimiters: &[char]) -> Vec<TermCount>
where
    I: IntoIterator<Item = &'s str>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TermCount> = Vec::new();

    for value in values {
        for term in value.split(delimiters).map(str::trim).filter(|term| !term.is_empty()) {
            match positions.get(term) {
                Some(&position) => counts[position].count += 1,
                None => {
                    positions.insert(term, counts.len());
                    counts.push(TermCount {
                        term: term.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Term tallies for the free-text fields of general reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherWorks {
    pub strategies: Vec<TermCount>,
    pub tools: Vec<TermCount>,
    pub programs: Vec<TermCount>,
    pub sources: Vec<TermCount>,
}

/// Only general reports contribute, even though class-session reports carry the same
/// field names.
pub fn other_works<'a, I>(reports: I) -> OtherWorks
where
    I: IntoIterator<Item = &'a Report>,
{
    let general: Vec<_> = reports
        .into_iter()
        .filter_map(|report| match report {
            Report::General(general) => Some(general),
            Report::ClassSession(_) | Report::Special(_) => None,
        })
        .collect();

    OtherWorks {
        strategies: term_frequency(general.iter().map(|report| report.strategies.as_str())),
        tools: term_frequency(general.iter().map(|report| report.tools.as_str())),
        programs: term_frequency(general.iter().map(|report| report.programs.as_str())),
        sources: term_frequency(general.iter().map(|report| report.sources.as_str())),
    }
}
