use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::TeacherIndex;
use crate::error::{EvaluationError, Result};
use crate::models::{CustomCriterion, Report, School, SpecialReportTemplate, Teacher};

/// Every collection the application keeps, loaded in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub schools: Vec<School>,
    pub teachers: Vec<Teacher>,
    pub reports: Vec<Report>,
    pub custom_criteria: Vec<CustomCriterion>,
    pub special_report_templates: Vec<SpecialReportTemplate>,
}

impl Workspace {
    /// The part of the workspace that belongs to one school. Reports follow their
    /// teacher's current school, not the school recorded on the report.
    pub fn for_school(&self, school: &str) -> Workspace {
        let teachers: Vec<Teacher> = self
            .teachers
            .iter()
            .filter(|teacher| teacher.school_name == school)
            .cloned()
            .collect();
        let reports = self
            .reports
            .iter()
            .filter(|report| teachers.iter().any(|teacher| teacher.id == report.teacher_id()))
            .cloned()
            .collect();

        Workspace {
            schools: self.schools.iter().filter(|s| s.name == school).cloned().collect(),
            teachers,
            reports,
            custom_criteria: self
                .custom_criteria
                .iter()
                .filter(|custom| custom.school == school)
                .cloned()
                .collect(),
            special_report_templates: self
                .special_report_templates
                .iter()
                .filter(|template| template.school_name == school)
                .cloned()
                .collect(),
        }
    }

    pub fn teacher_index(&self) -> TeacherIndex<'_> {
        TeacherIndex::new(&self.teachers)
    }

    pub fn teacher(&self, teacher_id: &str) -> Result<&Teacher> {
        self.teachers
            .iter()
            .find(|teacher| teacher.id == teacher_id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "teacher",
                id: teacher_id.to_string(),
            })
    }

    pub fn report(&self, report_id: &str) -> Result<&Report> {
        self.reports
            .iter()
            .find(|report| report.id() == report_id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            })
    }

    pub fn report_mut(&mut self, report_id: &str) -> Result<&mut Report> {
        self.reports
            .iter_mut()
            .find(|report| report.id() == report_id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            })
    }

    pub fn reports_for_teacher(&self, teacher_id: &str) -> Vec<Report> {
        self.reports
            .iter()
            .filter(|report| report.teacher_id() == teacher_id)
            .cloned()
            .collect()
    }

    pub fn add_school(&mut self, name: &str) -> Result<&School> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EvaluationError::Validation("school name is empty".to_string()));
        }
        self.schools.push(School {
            id: format!("school-{}", Uuid::new_v4()),
            name: name.to_string(),
        });
        Ok(&self.schools[self.schools.len() - 1])
    }

    pub fn add_teacher(&mut self, name: &str, school: &str) -> Result<&Teacher> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EvaluationError::Validation("teacher name is empty".to_string()));
        }
        self.teachers.push(Teacher {
            id: format!("teacher-{}", Uuid::new_v4()),
            name: name.to_string(),
            school_name: school.to_string(),
            subject: None,
            grades: None,
            branch: None,
        });
        Ok(&self.teachers[self.teachers.len() - 1])
    }

    pub fn update_teacher(&mut self, updated: Teacher) -> Result<()> {
        let slot = self
            .teachers
            .iter_mut()
            .find(|teacher| teacher.id == updated.id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "teacher",
                id: updated.id.clone(),
            })?;
        *slot = updated;
        Ok(())
    }

    /// Removes the teacher and every report that references them. Returns the number of
    /// reports removed.
    pub fn delete_teacher(&mut self, teacher_id: &str) -> Result<usize> {
        let before = self.teachers.len();
        self.teachers.retain(|teacher| teacher.id != teacher_id);
        if self.teachers.len() == before {
            return Err(EvaluationError::NotFound {
                entity: "teacher",
                id: teacher_id.to_string(),
            });
        }

        let reports_before = self.reports.len();
        self.reports.retain(|report| report.teacher_id() != teacher_id);
        let removed = reports_before - self.reports.len();
        tracing::info!(teacher_id, removed_reports = removed, "deleted teacher");
        Ok(removed)
    }

    /// Inserts or replaces a report by id. The report's teacher must exist and belong to
    /// the report's school. The report's subject, grades and branch are copied onto the
    /// teacher; returns the updated teacher when any of them changed.
    pub fn save_report(&mut self, report: Report) -> Result<Option<Teacher>> {
        let owner = self
            .teachers
            .iter_mut()
            .find(|teacher| teacher.id == report.teacher_id() && teacher.school_name == report.base().school)
            .ok_or_else(|| EvaluationError::UnknownTeacher {
                report_id: report.id().to_string(),
                teacher_id: report.teacher_id().to_string(),
            })?;

        let base = report.base();
        let carried = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());
        let details = (carried(&base.subject), carried(&base.grades), carried(&base.branch));
        let updated = if (owner.subject.clone(), owner.grades.clone(), owner.branch.clone()) != details {
            (owner.subject, owner.grades, owner.branch) = details;
            tracing::debug!(teacher_id = %owner.id, "teacher details updated from report");
            Some(owner.clone())
        } else {
            None
        };

        match self.reports.iter_mut().find(|existing| existing.id() == report.id()) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
        Ok(updated)
    }

    pub fn delete_report(&mut self, report_id: &str) -> Result<Report> {
        let position = self
            .reports
            .iter()
            .position(|report| report.id() == report_id)
            .ok_or_else(|| EvaluationError::NotFound {
                entity: "report",
                id: report_id.to_string(),
            })?;
        Ok(self.reports.remove(position))
    }

    pub fn add_custom_criterion(&mut self, custom: CustomCriterion) {
        self.custom_criteria.push(custom);
    }

    pub fn save_special_template(&mut self, template: SpecialReportTemplate) {
        match self
            .special_report_templates
            .iter_mut()
            .find(|existing| existing.id == template.id)
        {
            Some(existing) => *existing = template,
            None => self.special_report_templates.push(template),
        }
    }

    pub fn delete_special_template(&mut self, template_id: &str) -> Result<()> {
        let before = self.special_report_templates.len();
        self.special_report_templates.retain(|template| template.id != template_id);
        if self.special_report_templates.len() == before {
            return Err(EvaluationError::NotFound {
                entity: "special report template",
                id: template_id.to_string(),
            });
        }
        Ok(())
    }

    /// Drops reports whose teacher no longer exists and returns their ids.
    pub fn prune_orphaned_reports(&mut self) -> Vec<String> {
        let mut orphaned = Vec::new();
        let teachers = &self.teachers;
        self.reports.retain(|report| {
            let known = teachers.iter().any(|teacher| teacher.id == report.teacher_id());
            if !known {
                orphaned.push(report.id().to_string());
            }
            known
        });
        if !orphaned.is_empty() {
            tracing::warn!(count = orphaned.len(), "pruned reports with no teacher");
        }
        orphaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{new_report, ReportKind};
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn deleting_a_teacher_cascades_to_reports() {
        let mut workspace = Workspace::default();
        let teacher = workspace.add_teacher("هدى الصغير", "S").unwrap().clone();
        let other = workspace.add_teacher("علي عامر", "S").unwrap().clone();

        for _ in 0..2 {
            let report = new_report(ReportKind::General, &teacher, &[], &[], today());
            workspace.save_report(report).unwrap();
        }
        let kept = new_report(ReportKind::General, &other, &[], &[], today());
        workspace.save_report(kept).unwrap();

        assert_eq!(workspace.delete_teacher(&teacher.id).unwrap(), 2);
        assert!(workspace.reports.iter().all(|report| report.teacher_id() != teacher.id));
        assert_eq!(workspace.reports.len(), 1);
        assert_matches!(workspace.delete_teacher(&teacher.id), Err(EvaluationError::NotFound { .. }));
    }

    #[test]
    fn saving_requires_a_teacher_in_the_same_school() {
        let mut workspace = Workspace::default();
        let teacher = workspace.add_teacher("خلود صلاح", "S").unwrap().clone();
        let mut report = new_report(ReportKind::General, &teacher, &[], &[], today());

        report.base_mut().school = "Elsewhere".to_string();
        assert_matches!(
            workspace.save_report(report.clone()),
            Err(EvaluationError::UnknownTeacher { .. })
        );

        report.base_mut().school = "S".to_string();
        workspace.save_report(report.clone()).unwrap();
        report.set_score("gc1", 3).unwrap();
        workspace.save_report(report.clone()).unwrap();

        assert_eq!(workspace.reports.len(), 1);
        assert_eq!(workspace.report(report.id()).unwrap().scores()[0], 3);
    }

    #[test]
    fn school_scope_filters_every_collection() {
        let mut workspace = Workspace::default();
        workspace.add_school("S").unwrap();
        workspace.add_school("T").unwrap();
        let teacher = workspace.add_teacher("ناديا الورد", "S").unwrap().clone();
        workspace.add_teacher("رانيا العزي", "T").unwrap();
        workspace
            .save_report(new_report(ReportKind::General, &teacher, &[], &[], today()))
            .unwrap();

        let scoped = workspace.for_school("S");
        assert_eq!(scoped.schools.len(), 1);
        assert_eq!(scoped.teachers.len(), 1);
        assert_eq!(scoped.reports.len(), 1);
        assert!(workspace.for_school("T").reports.is_empty());
    }

    #[test]
    fn reports_follow_a_teacher_who_changes_school() {
        let mut workspace = Workspace::default();
        let mut teacher = workspace.add_teacher("أشواق المخلافي", "S").unwrap().clone();
        workspace
            .save_report(new_report(ReportKind::General, &teacher, &[], &[], today()))
            .unwrap();

        teacher.school_name = "T".to_string();
        workspace.update_teacher(teacher).unwrap();

        assert!(workspace.for_school("S").reports.is_empty());
        assert_eq!(workspace.for_school("T").reports.len(), 1);
    }

    #[test]
    fn saving_a_report_copies_its_details_onto_the_teacher() {
        let mut workspace = Workspace::default();
        let teacher = workspace.add_teacher("عائشة العريقي", "S").unwrap().clone();
        let mut report = new_report(ReportKind::General, &teacher, &[], &[], today());
        report.base_mut().subject = "علوم".to_string();
        report.base_mut().grades = "السادس".to_string();

        let updated = workspace.save_report(report.clone()).unwrap().unwrap();
        assert_eq!(updated.subject.as_deref(), Some("علوم"));
        assert_eq!(updated.grades.as_deref(), Some("السادس"));
        assert_eq!(updated.branch.as_deref(), Some("main"));
        assert_eq!(workspace.teacher(&teacher.id).unwrap(), &updated);

        assert_eq!(workspace.save_report(report).unwrap(), None);

        let next = new_report(ReportKind::ClassSession(crate::models::ClassSessionSubType::Brief), &updated, &[], &[], today());
        assert_eq!(next.base().subject, "علوم");
    }

    #[test]
    fn orphaned_reports_are_pruned() {
        let mut workspace = Workspace::default();
        let teacher = workspace.add_teacher("ضحى القباطي", "S").unwrap().clone();
        workspace
            .save_report(new_report(ReportKind::General, &teacher, &[], &[], today()))
            .unwrap();
        workspace.teachers.clear();

        assert_eq!(workspace.prune_orphaned_reports().len(), 1);
        assert!(workspace.reports.is_empty());
    }

    #[test]
    fn teachers_and_templates_update_in_place() {
        let mut workspace = Workspace::default();
        let mut teacher = workspace.add_teacher("صفاء الصبري", "S").unwrap().clone();
        teacher.subject = Some("لغة عربية".to_string());
        workspace.update_teacher(teacher.clone()).unwrap();
        assert_eq!(workspace.teacher(&teacher.id).unwrap().subject.as_deref(), Some("لغة عربية"));

        let mut template = SpecialReportTemplate {
            id: "tpl-1".to_string(),
            school_name: "S".to_string(),
            name: "زيارة إشرافية".to_string(),
            criteria: Vec::new(),
            placement: crate::models::TemplatePlacement::Main,
        };
        workspace.save_special_template(template.clone());
        template.name = "زيارة تبادلية".to_string();
        workspace.save_special_template(template);
        assert_eq!(workspace.special_report_templates.len(), 1);
        assert_eq!(workspace.special_report_templates[0].name, "زيارة تبادلية");

        workspace.delete_special_template("tpl-1").unwrap();
        assert_matches!(
            workspace.delete_special_template("tpl-1"),
            Err(EvaluationError::NotFound { .. })
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut workspace = Workspace::default();
        assert_matches!(workspace.add_teacher("  ", "S"), Err(EvaluationError::Validation(_)));
        assert_matches!(workspace.add_school(""), Err(EvaluationError::Validation(_)));
    }
}
