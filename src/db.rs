use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::config::Config;
use crate::error::EvaluationError;
use crate::models::{CustomCriterion, Report, School, SpecialReportTemplate, Teacher};
use crate::roster::Workspace;

/// A value stored as one JSON row, keyed by collection and id.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn record_id(&self) -> &str;
}

impl Record for School {
    const COLLECTION: &'static str = "schools";

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Teacher {
    const COLLECTION: &'static str = "teachers";

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Report {
    const COLLECTION: &'static str = "reports";

    fn record_id(&self) -> &str {
        self.id()
    }
}

impl Record for CustomCriterion {
    const COLLECTION: &'static str = "customCriteria";

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for SpecialReportTemplate {
    const COLLECTION: &'static str = "specialReportTemplates";

    fn record_id(&self) -> &str {
        &self.id
    }
}

pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn upsert<R: Record>(pool: &PgPool, record: &R) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO evaluation_records.records (collection, id, body)
        VALUES ($1, $2, $3)
        ON CONFLICT (collection, id) DO UPDATE
        SET body = EXCLUDED.body, updated_at = now()
        "#,
    )
    .bind(R::COLLECTION)
    .bind(record.record_id())
    .bind(sqlx::types::Json(record))
    .execute(pool)
    .await
    .with_context(|| format!("failed to save {} record {}", R::COLLECTION, record.record_id()))?;

    tracing::debug!(collection = R::COLLECTION, id = record.record_id(), "record saved");
    Ok(())
}

/// Loads a whole collection in insertion order. One malformed row fails the load.
pub async fn fetch_all<R: Record>(pool: &PgPool) -> anyhow::Result<Vec<R>> {
    let rows = sqlx::query(
        "SELECT id, body FROM evaluation_records.records WHERE collection = $1 ORDER BY seq",
    )
    .bind(R::COLLECTION)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get("id");
        let body: serde_json::Value = row.get("body");
        let record = serde_json::from_value(body).map_err(|source| EvaluationError::Storage {
            id: format!("{}/{id}", R::COLLECTION),
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

pub async fn load_workspace(pool: &PgPool) -> anyhow::Result<Workspace> {
    let workspace = Workspace {
        schools: fetch_all(pool).await?,
        teachers: fetch_all(pool).await?,
        reports: fetch_all(pool).await?,
        custom_criteria: fetch_all(pool).await?,
        special_report_templates: fetch_all(pool).await?,
    };

    tracing::info!(
        schools = workspace.schools.len(),
        teachers = workspace.teachers.len(),
        reports = workspace.reports.len(),
        custom_criteria = workspace.custom_criteria.len(),
        "workspace loaded"
    );
    Ok(workspace)
}

/// Deletes the teacher and every report that references them in one transaction.
/// Returns the number of reports removed.
pub async fn delete_teacher(pool: &PgPool, teacher_id: &str) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query(
        "DELETE FROM evaluation_records.records WHERE collection = $1 AND id = $2",
    )
    .bind(Teacher::COLLECTION)
    .bind(teacher_id)
    .execute(&mut *tx)
    .await?;
    if deleted.rows_affected() == 0 {
        anyhow::bail!("teacher {teacher_id} not found");
    }

    let reports = sqlx::query(
        "DELETE FROM evaluation_records.records WHERE collection = $1 AND body->>'teacherId' = $2",
    )
    .bind(Report::COLLECTION)
    .bind(teacher_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(teacher_id, removed_reports = reports.rows_affected(), "deleted teacher");
    Ok(reports.rows_affected())
}

pub async fn delete_record<R: Record>(pool: &PgPool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM evaluation_records.records WHERE collection = $1 AND id = $2")
        .bind(R::COLLECTION)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

const SEED_SCHOOLS: [(&str, &str); 2] = [
    ("school-1", "مدارس الرائد النموذجية"),
    ("school-2", "مدارس عمان الأهلية"),
];

const SEED_TEACHERS: [(&str, &str); 26] = [
    ("t1", "وجدان العزي"),
    ("t2", "محمد الدريهم"),
    ("t3", "عبد الرؤوف الوصابي"),
    ("t4", "فهمي الجرافي"),
    ("t5", "آية فاتق"),
    ("t6", "عاصم المنعي"),
    ("t7", "عبد الرزاق صبيح"),
    ("t8", "جمال الرديني"),
    ("t9", "إيمان قطيش"),
    ("t10", "وفاء الصلوي"),
    ("t11", "إيمان النصيف"),
    ("t12", "عبد السلام المعدني"),
    ("t13", "علي عامر"),
    ("t14", "محمد المشرع"),
    ("t15", "إيمان العبسي"),
    ("t16", "رانيا العزي"),
    ("t17", "هدى الصغير"),
    ("t18", "أشواق المخلافي"),
    ("t19", "عائشة العريقي"),
    ("t20", "ألطاف جار الله"),
    ("t21", "هناء الحيجنة"),
    ("t22", "رحاب العيفري"),
    ("t23", "ضحى القباطي"),
    ("t24", "خلود صلاح"),
    ("t25", "هند  الحبابي"),
    ("t26", "ناديا الورد"),
];

/// Starter schools and the first school's roster.
pub fn seed_records() -> (Vec<School>, Vec<Teacher>) {
    let schools = SEED_SCHOOLS
        .iter()
        .map(|(id, name)| School {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();
    let teachers = SEED_TEACHERS
        .iter()
        .map(|(id, name)| Teacher {
            id: id.to_string(),
            name: name.to_string(),
            school_name: SEED_SCHOOLS[0].1.to_string(),
            subject: None,
            grades: None,
            branch: None,
        })
        .collect();
    (schools, teachers)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let (schools, teachers) = seed_records();
    for school in &schools {
        upsert(pool, school).await?;
    }
    for teacher in &teachers {
        upsert(pool, teacher).await?;
    }

    tracing::info!(schools = schools.len(), teachers = teachers.len(), "seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_roster_is_complete_and_unique() {
        let (schools, teachers) = seed_records();

        assert_eq!(schools.len(), 2);
        assert_eq!(teachers.len(), 26);
        assert_eq!(teachers.iter().map(|t| t.id.as_str()).collect::<HashSet<_>>().len(), 26);
        assert!(teachers.iter().all(|t| t.school_name == "مدارس الرائد النموذجية"));
        assert_eq!(teachers[25].name, "ناديا الورد");
    }
}
