use std::cmp::Reverse;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EvaluationError, Result};
use crate::models::{
    ClassSessionReport, ClassSessionSubType, Criterion, CriterionGroup, CriterionTemplate, CustomCriterion,
    EvaluationType, GeneralReport, Report, ReportBase, SpecialReport, SpecialReportTemplate, Teacher,
};
use crate::templates;

/// Where a criterion added during editing should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionScope {
    /// Only the report being edited.
    Local,
    /// The report being edited and every future report of the same shape in its school.
    School,
}

#[derive(Debug, Clone, Copy)]
pub enum ReportKind<'a> {
    General,
    ClassSession(ClassSessionSubType),
    Special(&'a SpecialReportTemplate),
}

impl CustomCriterion {
    /// Whether this criterion belongs on a new report of the given shape. A criterion
    /// saved without a sub type applies to every class-session sub type.
    pub fn applies_to(
        &self,
        school: &str,
        evaluation_type: EvaluationType,
        sub_type: Option<ClassSessionSubType>,
    ) -> bool {
        if self.school != school || self.evaluation_type != evaluation_type {
            return false;
        }
        match (self.sub_type, sub_type) {
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

fn first_non_empty<'s>(candidates: impl IntoIterator<Item = Option<&'s str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn latest<'r>(reports: impl Iterator<Item = &'r Report>) -> Option<&'r Report> {
    reports.min_by_key(|report| Reverse(report.date()))
}

/// Builds an unsaved report for `teacher`, prefilled from the teacher's most recent
/// reports and extended with the school's custom criteria.
pub fn new_report(
    kind: ReportKind<'_>,
    teacher: &Teacher,
    history: &[Report],
    custom_criteria: &[CustomCriterion],
    today: NaiveDate,
) -> Report {
    let evaluation_type = match kind {
        ReportKind::General => EvaluationType::General,
        ReportKind::ClassSession(_) => EvaluationType::ClassSession,
        ReportKind::Special(_) => EvaluationType::Special,
    };
    let own_reports = || history.iter().filter(|report| report.teacher_id() == teacher.id);
    let latest_same_type = latest(own_reports().filter(|report| report.evaluation_type() == evaluation_type));
    let latest_report = latest_same_type.or_else(|| latest(own_reports()));
    let latest_base = latest_report.map(Report::base);

    let base = ReportBase {
        id: format!("report-{}", Uuid::new_v4()),
        teacher_id: teacher.id.clone(),
        date: today,
        school: teacher.school_name.clone(),
        subject: first_non_empty([latest_base.map(|b| b.subject.as_str()), teacher.subject.as_deref()])
            .unwrap_or_default(),
        grades: first_non_empty([latest_base.map(|b| b.grades.as_str()), teacher.grades.as_deref()])
            .unwrap_or_default(),
        branch: first_non_empty([latest_base.map(|b| b.branch.as_str()), teacher.branch.as_deref()])
            .unwrap_or_else(|| "main".to_string()),
    };

    let report = match kind {
        ReportKind::General => {
            let mut criteria: Vec<Criterion> = templates::general_criteria()
                .iter()
                .map(CriterionTemplate::instantiate)
                .collect();
            criteria.extend(
                custom_criteria
                    .iter()
                    .filter(|custom| custom.applies_to(&base.school, EvaluationType::General, None))
                    .map(|custom| custom.criterion.instantiate()),
            );
            Report::General(GeneralReport {
                base,
                criteria,
                strategies: String::new(),
                tools: String::new(),
                programs: String::new(),
                sources: String::new(),
            })
        }
        ReportKind::ClassSession(sub_type) => {
            let previous = match latest_same_type {
                Some(Report::ClassSession(previous)) => Some(previous),
                _ => None,
            };
            let carried = |field: fn(&ClassSessionReport) -> &str, fallback: &str| {
                first_non_empty([previous.map(field)]).unwrap_or_else(|| fallback.to_string())
            };
            let criterion_groups = class_session_groups(sub_type, &base.school, custom_criteria);
            Report::ClassSession(ClassSessionReport {
                sub_type,
                supervisor_name: carried(|r| r.supervisor_name.as_str(), ""),
                semester: carried(|r| r.semester.as_str(), "الأول"),
                visit_type: carried(|r| r.visit_type.as_str(), "استطلاعية"),
                class_number: carried(|r| r.class_number.as_str(), "الأول"),
                section: carried(|r| r.section.as_str(), "أ"),
                lesson_number: carried(|r| r.lesson_number.as_str(), ""),
                lesson_name: carried(|r| r.lesson_name.as_str(), ""),
                base,
                criterion_groups,
                positives: String::new(),
                notes_for_improvement: String::new(),
                recommendations: String::new(),
                employee_comment: String::new(),
                strategies: String::new(),
                tools: String::new(),
                sources: String::new(),
                programs: String::new(),
            })
        }
        ReportKind::Special(template) => Report::Special(SpecialReport {
            base,
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            criteria: template.criteria.iter().map(CriterionTemplate::instantiate).collect(),
        }),
    };

    tracing::debug!(
        report_id = report.id(),
        teacher_id = %teacher.id,
        evaluation_type = %evaluation_type,
        criteria = report.flattened_criteria().len(),
        "initialized new report"
    );
    report
}

/// Template groups for `sub_type` followed by the school's matching custom criteria.
/// A custom criterion goes into the group whose title it names; an unknown title opens
/// a new trailing group, and a missing title means the last group.
pub fn class_session_groups(
    sub_type: ClassSessionSubType,
    school: &str,
    custom_criteria: &[CustomCriterion],
) -> Vec<CriterionGroup> {
    let mut groups = templates::class_session_groups(sub_type);

    for custom in custom_criteria
        .iter()
        .filter(|custom| custom.applies_to(school, EvaluationType::ClassSession, Some(sub_type)))
    {
        let position = match custom.group_title.as_deref() {
            Some(title) => groups.iter().position(|group| group.title == title),
            None => groups.len().checked_sub(1),
        };
        let position = position.unwrap_or_else(|| {
            groups.push(CriterionGroup {
                id: format!("custom-group-{}", groups.len() + 1),
                title: custom.group_title.clone().unwrap_or_default(),
                criteria: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].criteria.push(custom.criterion.instantiate());
    }

    groups
}

impl ClassSessionReport {
    /// Replaces the groups with a fresh layout for `sub_type`. Scores are reset.
    pub fn switch_sub_type(&mut self, sub_type: ClassSessionSubType, custom_criteria: &[CustomCriterion]) {
        if self.sub_type == sub_type {
            return;
        }
        self.sub_type = sub_type;
        self.criterion_groups = class_session_groups(sub_type, &self.base.school, custom_criteria);
    }
}

/// Appends a new unscored criterion to `report`. With [`CriterionScope::School`] the
/// returned record should be stored with the school's custom criteria.
///
/// `group_index` picks the class-session group and is ignored for flat reports.
pub fn add_criterion(
    report: &mut Report,
    group_index: Option<usize>,
    label: &str,
    scope: CriterionScope,
) -> Result<Option<CustomCriterion>> {
    let label = label.trim();
    if label.is_empty() {
        return Err(EvaluationError::Validation("criterion label is empty".to_string()));
    }
    if scope == CriterionScope::School {
        if matches!(report, Report::Special(_)) {
            return Err(EvaluationError::Validation(
                "special report criteria cannot be promoted to the school".to_string(),
            ));
        }
        if report.base().school.is_empty() {
            return Err(EvaluationError::Validation(format!(
                "report {} has no school to promote into",
                report.id()
            )));
        }
    }

    let criterion = Criterion::unscored(format!("custom-{}", Uuid::new_v4()), label);
    let template = CriterionTemplate::new(criterion.id.clone(), label);
    let report_id = report.id().to_string();

    let (sub_type, group_title) = match report {
        Report::General(general) => {
            general.criteria.push(criterion);
            (None, None)
        }
        Report::Special(special) => {
            special.criteria.push(criterion);
            (None, None)
        }
        Report::ClassSession(session) => {
            let group = group_index
                .and_then(|index| session.criterion_groups.get_mut(index))
                .ok_or_else(|| EvaluationError::NotFound {
                    entity: "criterion group",
                    id: format!("{} in report {report_id}", group_index.map_or("none".to_string(), |i| i.to_string())),
                })?;
            group.criteria.push(criterion);
            (Some(session.sub_type), Some(group.title.clone()))
        }
    };

    if scope == CriterionScope::Local {
        return Ok(None);
    }

    let custom = CustomCriterion {
        id: format!("custom-g-{}", Uuid::new_v4()),
        school: report.base().school.clone(),
        evaluation_type: report.evaluation_type(),
        sub_type,
        group_title,
        criterion: template,
    };
    tracing::info!(
        custom_id = %custom.id,
        school = %custom.school,
        label,
        "promoted criterion to school scope"
    );
    Ok(Some(custom))
}

/// Removes one criterion from `report` and returns it. School-wide custom criteria are
/// left in place, so later reports still receive them.
///
/// `group_index` picks the class-session group and is ignored for flat reports.
pub fn remove_criterion(report: &mut Report, group_index: Option<usize>, criterion_id: &str) -> Result<Criterion> {
    let report_id = report.id().to_string();
    let criteria = match report {
        Report::General(general) => &mut general.criteria,
        Report::Special(special) => &mut special.criteria,
        Report::ClassSession(session) => {
            let group = group_index
                .and_then(|index| session.criterion_groups.get_mut(index))
                .ok_or_else(|| EvaluationError::NotFound {
                    entity: "criterion group",
                    id: format!("{} in report {report_id}", group_index.map_or("none".to_string(), |i| i.to_string())),
                })?;
            &mut group.criteria
        }
    };

    let position = criteria
        .iter()
        .position(|criterion| criterion.id == criterion_id)
        .ok_or_else(|| EvaluationError::NotFound {
            entity: "criterion",
            id: format!("{criterion_id} in report {report_id}"),
        })?;
    let removed = criteria.remove(position);
    tracing::debug!(report_id = %report_id, criterion_id, "removed criterion");
    Ok(removed)
}
