use std::io;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::TeacherIndex;
use crate::models::{Report, Teacher};
use crate::scoring;

const UNKNOWN_TEACHER_AR: &str = "غير معروف";

#[derive(Serialize)]
struct AggregatedRow<'a> {
    #[serde(rename = "المعلم")]
    teacher: &'a str,
    #[serde(rename = "التاريخ")]
    date: NaiveDate,
    #[serde(rename = "المدرسة")]
    school: &'a str,
    #[serde(rename = "نوع التقييم")]
    evaluation_type: &'a str,
    #[serde(rename = "النسبة المئوية")]
    percentage: String,
}

/// Writes one spreadsheet row per report. Returns the number of rows written.
pub fn write_aggregated_csv<W: io::Write>(
    writer: W,
    reports: &[&Report],
    teachers: &TeacherIndex<'_>,
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for report in reports {
        csv_writer.serialize(AggregatedRow {
            teacher: teachers.name(report.teacher_id()).unwrap_or(UNKNOWN_TEACHER_AR),
            date: report.date(),
            school: &report.base().school,
            evaluation_type: report.kind_label(),
            percentage: format!("{:.2}%", scoring::report_percentage(report)),
        })?;
    }

    csv_writer.flush().context("failed to flush CSV export")?;
    Ok(reports.len())
}

#[derive(Debug, Deserialize)]
struct TeacherRow {
    name: String,
    subject: Option<String>,
    grades: Option<String>,
    branch: Option<String>,
}

/// Reads a roster with `name,subject,grades,branch` headers into new teachers of `school`.
pub fn teachers_from_csv<R: io::Read>(reader: R, school: &str) -> anyhow::Result<Vec<Teacher>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut teachers = Vec::new();

    for (index, result) in csv_reader.deserialize::<TeacherRow>().enumerate() {
        let row = result.with_context(|| format!("invalid roster row {}", index + 1))?;
        let name = row.name.trim();
        anyhow::ensure!(!name.is_empty(), "roster row {} has no teacher name", index + 1);

        let non_empty = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        teachers.push(Teacher {
            id: format!("teacher-{}", Uuid::new_v4()),
            name: name.to_string(),
            school_name: school.to_string(),
            subject: non_empty(row.subject),
            grades: non_empty(row.grades),
            branch: non_empty(row.branch),
        });
    }

    Ok(teachers)
}
