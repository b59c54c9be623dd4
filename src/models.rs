use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, Result};
use crate::scoring;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub school_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grades: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    General,
    ClassSession,
    Special,
}

impl EvaluationType {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationType::General => "general",
            EvaluationType::ClassSession => "class_session",
            EvaluationType::Special => "special",
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassSessionSubType {
    Brief,
    Extended,
    SubjectSpecific,
}

impl ClassSessionSubType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassSessionSubType::Brief => "brief",
            ClassSessionSubType::Extended => "extended",
            ClassSessionSubType::SubjectSpecific => "subject_specific",
        }
    }
}

/// Curriculum pacing recorded against the "السير في المنهج" criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    #[serde(rename = "متقدم")]
    Ahead,
    #[serde(rename = "مطابق")]
    OnTrack,
    #[serde(rename = "متأخر")]
    Behind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub label: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lesson_title: Option<String>,
}

impl Criterion {
    pub fn unscored(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            score: 0,
            progress: None,
            last_lesson_title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionGroup {
    pub id: String,
    pub title: String,
    pub criteria: Vec<Criterion>,
}

/// Fields every report kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBase {
    pub id: String,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub school: String,
    pub subject: String,
    pub grades: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralReport {
    #[serde(flatten)]
    pub base: ReportBase,
    pub criteria: Vec<Criterion>,
    pub strategies: String,
    pub tools: String,
    pub programs: String,
    pub sources: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSessionReport {
    #[serde(flatten)]
    pub base: ReportBase,
    pub sub_type: ClassSessionSubType,
    pub supervisor_name: String,
    pub semester: String,
    pub visit_type: String,
    #[serde(rename = "class")]
    pub class_number: String,
    pub section: String,
    pub lesson_number: String,
    pub lesson_name: String,
    pub criterion_groups: Vec<CriterionGroup>,
    pub positives: String,
    pub notes_for_improvement: String,
    pub recommendations: String,
    pub employee_comment: String,
    pub strategies: String,
    pub tools: String,
    pub sources: String,
    pub programs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialReport {
    #[serde(flatten)]
    pub base: ReportBase,
    pub template_id: String,
    pub template_name: String,
    pub criteria: Vec<Criterion>,
}

/// One completed evaluation, discriminated by `evaluationType` in stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "evaluationType", rename_all = "snake_case")]
pub enum Report {
    General(GeneralReport),
    ClassSession(ClassSessionReport),
    Special(SpecialReport),
}

impl Report {
    pub fn base(&self) -> &ReportBase {
        match self {
            Report::General(report) => &report.base,
            Report::ClassSession(report) => &report.base,
            Report::Special(report) => &report.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ReportBase {
        match self {
            Report::General(report) => &mut report.base,
            Report::ClassSession(report) => &mut report.base,
            Report::Special(report) => &mut report.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn teacher_id(&self) -> &str {
        &self.base().teacher_id
    }

    pub fn date(&self) -> NaiveDate {
        self.base().date
    }

    pub fn evaluation_type(&self) -> EvaluationType {
        match self {
            Report::General(_) => EvaluationType::General,
            Report::ClassSession(_) => EvaluationType::ClassSession,
            Report::Special(_) => EvaluationType::Special,
        }
    }

    /// Every criterion of the report; class-session groups are concatenated in order.
    pub fn flattened_criteria(&self) -> Vec<&Criterion> {
        match self {
            Report::General(report) => report.criteria.iter().collect(),
            Report::Special(report) => report.criteria.iter().collect(),
            Report::ClassSession(report) => report
                .criterion_groups
                .iter()
                .flat_map(|group| group.criteria.iter())
                .collect(),
        }
    }

    pub fn scores(&self) -> Vec<u8> {
        self.flattened_criteria()
            .into_iter()
            .map(|criterion| criterion.score)
            .collect()
    }

    pub fn criterion_mut(&mut self, criterion_id: &str) -> Option<&mut Criterion> {
        match self {
            Report::General(report) => report
                .criteria
                .iter_mut()
                .find(|criterion| criterion.id == criterion_id),
            Report::Special(report) => report
                .criteria
                .iter_mut()
                .find(|criterion| criterion.id == criterion_id),
            Report::ClassSession(report) => report
                .criterion_groups
                .iter_mut()
                .flat_map(|group| group.criteria.iter_mut())
                .find(|criterion| criterion.id == criterion_id),
        }
    }

    /// Edits one criterion's score, rejecting values outside the kind's selectable set.
    pub fn set_score(&mut self, criterion_id: &str, score: u8) -> Result<()> {
        let evaluation_type = self.evaluation_type();
        if !scoring::selectable_scores(evaluation_type).contains(&score) {
            return Err(EvaluationError::InvalidScore {
                evaluation_type,
                score,
            });
        }

        let report_id = self.id().to_string();
        let criterion = self
            .criterion_mut(criterion_id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "criterion",
                id: format!("{criterion_id} in report {report_id}"),
            })?;
        criterion.score = score;
        Ok(())
    }

    /// Free-text display name of the report kind; special reports use their template name.
    pub fn kind_label(&self) -> &str {
        match self {
            Report::General(_) => "عام",
            Report::ClassSession(_) => "حصة دراسية",
            Report::Special(report) => &report.template_name,
        }
    }
}

/// A school-wide criterion appended to every new report of the matching shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCriterion {
    pub id: String,
    pub school: String,
    pub evaluation_type: EvaluationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<ClassSessionSubType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    pub criterion: CriterionTemplate,
}

/// A criterion without a score, as stored in templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionTemplate {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lesson_title: Option<String>,
}

impl CriterionTemplate {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            progress: None,
            last_lesson_title: None,
        }
    }

    pub fn instantiate(&self) -> Criterion {
        Criterion {
            id: self.id.clone(),
            label: self.label.clone(),
            score: 0,
            progress: self.progress,
            last_lesson_title: self.last_lesson_title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePlacement {
    Main,
    TeacherReports,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialReportTemplate {
    pub id: String,
    pub school_name: String,
    pub name: String,
    pub criteria: Vec<CriterionTemplate>,
    pub placement: TemplatePlacement,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn class_session_json() -> serde_json::Value {
        json!({
            "id": "r1",
            "teacherId": "t1",
            "date": "2025-03-02",
            "school": "مدارس الرائد النموذجية",
            "subject": "رياضيات",
            "grades": "الخامس",
            "branch": "main",
            "evaluationType": "class_session",
            "subType": "brief",
            "supervisorName": "",
            "semester": "الأول",
            "visitType": "استطلاعية",
            "class": "الأول",
            "section": "أ",
            "lessonNumber": "3",
            "lessonName": "الكسور",
            "criterionGroups": [
                { "id": "g1", "title": "إدارة الصف", "criteria": [
                    { "id": "c1", "label": "يدير التفاعل الصفي بنجاح", "score": 3 },
                    { "id": "c2", "label": "يغلق الدرس بصورة مناسبة", "score": 1 }
                ]},
                { "id": "g2", "title": "مهارات المادة", "criteria": [
                    { "id": "c3", "label": "ينفذ المهارات الأساسية للمادة", "score": 4 }
                ]}
            ],
            "positives": "",
            "notesForImprovement": "",
            "recommendations": "",
            "employeeComment": "",
            "strategies": "",
            "tools": "",
            "sources": "",
            "programs": ""
        })
    }

    #[test]
    fn class_session_report_reads_stored_shape() {
        let report: Report = serde_json::from_value(class_session_json()).unwrap();
        assert_eq!(report.evaluation_type(), EvaluationType::ClassSession);
        assert_eq!(report.teacher_id(), "t1");
        assert_eq!(report.scores(), vec![3, 1, 4]);
    }

    #[test]
    fn stored_field_names_survive_a_write() {
        let report: Report = serde_json::from_value(class_session_json()).unwrap();
        let written = serde_json::to_value(&report).unwrap();
        assert_eq!(written, class_session_json());
    }

    #[test]
    fn general_criterion_keeps_optional_fields() {
        let value = json!({
            "id": "r2",
            "teacherId": "t2",
            "date": "2025-01-10",
            "school": "S",
            "subject": "",
            "grades": "",
            "branch": "main",
            "evaluationType": "general",
            "criteria": [
                { "id": "gc2", "label": "السير في المنهج", "score": 2, "progress": "مطابق" },
                { "id": "gc3", "label": "عنوان آخر درس", "score": 0, "lastLessonTitle": "" }
            ],
            "strategies": "التعلم باللعب",
            "tools": "",
            "programs": "",
            "sources": ""
        });

        let report: Report = serde_json::from_value(value.clone()).unwrap();
        assert_matches!(&report, Report::General(general) if general.criteria[0].progress == Some(Progress::OnTrack));
        assert_eq!(serde_json::to_value(&report).unwrap(), value);
    }

    #[test]
    fn missing_criteria_is_a_load_error() {
        let value = json!({
            "id": "r3",
            "teacherId": "t1",
            "date": "2025-01-10",
            "school": "S",
            "subject": "",
            "grades": "",
            "branch": "main",
            "evaluationType": "special",
            "templateId": "tpl",
            "templateName": "زيارة"
        });
        assert!(serde_json::from_value::<Report>(value).is_err());
    }

    #[test]
    fn missing_text_fields_are_a_load_error() {
        let mut value = class_session_json();
        value.as_object_mut().unwrap().remove("supervisorName");
        assert!(serde_json::from_value::<Report>(value).is_err());
    }

    #[test]
    fn set_score_respects_kind_scale() {
        let mut report: Report = serde_json::from_value(class_session_json()).unwrap();
        report.set_score("c2", 0).unwrap();
        assert_eq!(report.scores(), vec![3, 0, 4]);

        assert_matches!(
            report.set_score("c2", 5),
            Err(EvaluationError::InvalidScore { score: 5, .. })
        );
        assert_matches!(
            report.set_score("missing", 2),
            Err(EvaluationError::NotFound { entity: "criterion", .. })
        );
    }
}
