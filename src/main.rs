use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_evaluation::aggregate::{self, ReportFilter, SortDirection};
use school_evaluation::config::Config;
use school_evaluation::models::{ClassSessionSubType, EvaluationType, Report};
use school_evaluation::propagation::{self, CriterionScope, ReportKind};
use school_evaluation::{db, export, report, EvaluationError};

#[derive(Parser)]
#[command(name = "evaluation-records")]
#[command(about = "Teacher evaluation records, scoring and dashboards for a school", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct View {
    #[arg(long)]
    school: String,
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    /// Restrict to one teacher id
    #[arg(long)]
    teacher: Option<String>,
    /// Case-insensitive teacher name search
    #[arg(long)]
    search: Option<String>,
}

impl View {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            evaluation_type: self.kind.map(EvaluationType::from),
            teacher_id: self.teacher.clone(),
            name_query: self.search.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    General,
    ClassSession,
    Special,
}

impl From<KindArg> for EvaluationType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::General => EvaluationType::General,
            KindArg::ClassSession => EvaluationType::ClassSession,
            KindArg::Special => EvaluationType::Special,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SubTypeArg {
    Brief,
    Extended,
    SubjectSpecific,
}

impl From<SubTypeArg> for ClassSessionSubType {
    fn from(sub_type: SubTypeArg) -> Self {
        match sub_type {
            SubTypeArg::Brief => ClassSessionSubType::Brief,
            SubTypeArg::Extended => ClassSessionSubType::Extended,
            SubTypeArg::SubjectSpecific => ClassSessionSubType::SubjectSpecific,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import a teacher roster from a CSV file with name,subject,grades,branch columns
    ImportTeachers {
        #[arg(long)]
        school: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Start a new report for a teacher, prefilled from their history
    NewReport {
        #[arg(long)]
        school: String,
        #[arg(long)]
        teacher: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long, value_enum, default_value = "brief")]
        sub_type: SubTypeArg,
        /// Special report template id
        #[arg(long, required_if_eq("kind", "special"))]
        template: Option<String>,
    },
    /// Record a score on one criterion of a report
    SetScore {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
        #[arg(long)]
        criterion: String,
        #[arg(long)]
        score: u8,
    },
    /// Rebuild a class-session report's criterion groups for another sub type
    SwitchSubType {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
        #[arg(long, value_enum)]
        sub_type: SubTypeArg,
    },
    /// Add a criterion to a report, optionally for every future report in the school
    AddCriterion {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
        #[arg(long)]
        label: String,
        /// Criterion group index on class-session reports
        #[arg(long)]
        group: Option<usize>,
        #[arg(long)]
        school_wide: bool,
    },
    /// Remove a criterion from one report
    RemoveCriterion {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
        #[arg(long)]
        criterion: String,
        /// Criterion group index on class-session reports
        #[arg(long)]
        group: Option<usize>,
    },
    /// Regenerate feedback text for a class-session report
    Feedback {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
    },
    /// Delete a teacher together with all of their reports
    DeleteTeacher {
        #[arg(long)]
        school: String,
        #[arg(long)]
        teacher: String,
    },
    DeleteReport {
        #[arg(long)]
        school: String,
        #[arg(long)]
        report: String,
    },
    /// Average percentage per teacher
    Teachers {
        #[command(flatten)]
        view: View,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Average percentage per criterion label
    Criteria {
        #[command(flatten)]
        view: View,
        #[arg(long)]
        ascending: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// List the teachers behind each score instead of averages
        #[arg(long)]
        by_score: bool,
        #[arg(long)]
        json: bool,
    },
    /// Every report of the school grouped by performance tier
    Tiers {
        #[arg(long)]
        school: String,
        #[arg(long)]
        json: bool,
    },
    /// Term frequencies of strategies, tools, programs and sources on general reports
    Terms {
        #[command(flatten)]
        view: View,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown dashboard
    Report {
        #[command(flatten)]
        view: View,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export one row per report to CSV
    Export {
        #[command(flatten)]
        view: View,
        #[arg(long, default_value = "evaluations.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_evaluation=info,evaluation_records=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::connect(&config).await?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportTeachers { school, csv } => {
            let file = File::open(&csv).with_context(|| format!("failed to open {}", csv.display()))?;
            let teachers = export::teachers_from_csv(file, &school)?;
            for teacher in &teachers {
                db::upsert(&pool, teacher).await?;
            }
            println!("Imported {} teachers from {}.", teachers.len(), csv.display());
        }
        Commands::NewReport {
            school,
            teacher,
            kind,
            sub_type,
            template,
        } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let teacher = workspace.teacher(&teacher)?.clone();
            let template = match template.as_deref() {
                Some(template_id) => Some(
                    workspace
                        .special_report_templates
                        .iter()
                        .find(|template| template.id == template_id)
                        .ok_or_else(|| EvaluationError::NotFound {
                            entity: "special report template",
                            id: template_id.to_string(),
                        })?
                        .clone(),
                ),
                None => None,
            };
            let report_kind = match (kind, template.as_ref()) {
                (KindArg::General, _) => ReportKind::General,
                (KindArg::ClassSession, _) => ReportKind::ClassSession(sub_type.into()),
                (KindArg::Special, Some(template)) => ReportKind::Special(template),
                (KindArg::Special, None) => anyhow::bail!("special reports need --template"),
            };

            let new_report = propagation::new_report(
                report_kind,
                &teacher,
                &workspace.reports_for_teacher(&teacher.id),
                &workspace.custom_criteria,
                today,
            );
            if let Some(updated_teacher) = workspace.save_report(new_report.clone())? {
                db::upsert(&pool, &updated_teacher).await?;
            }
            db::upsert(&pool, &new_report).await?;
            println!(
                "Created {} report {} for {} on {}.",
                new_report.kind_label(),
                new_report.id(),
                teacher.name,
                today
            );
        }
        Commands::SetScore {
            school,
            report,
            criterion,
            score,
        } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let stored = workspace.report_mut(&report)?;
            stored.set_score(&criterion, score)?;
            db::upsert(&pool, &*stored).await?;
            println!(
                "Scored {criterion} as {score}; report now at {:.2}%.",
                school_evaluation::scoring::report_percentage(stored)
            );
        }
        Commands::SwitchSubType {
            school,
            report,
            sub_type,
        } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let custom_criteria = workspace.custom_criteria.clone();
            let stored = workspace.report_mut(&report)?;
            let Report::ClassSession(session) = &mut *stored else {
                anyhow::bail!("report {report} is not a class-session report");
            };
            session.switch_sub_type(sub_type.into(), &custom_criteria);
            db::upsert(&pool, &*stored).await?;
            println!("Report {report} now uses the {} criteria.", ClassSessionSubType::from(sub_type).as_str());
        }
        Commands::AddCriterion {
            school,
            report,
            label,
            group,
            school_wide,
        } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let scope = if school_wide {
                CriterionScope::School
            } else {
                CriterionScope::Local
            };
            let stored = workspace.report_mut(&report)?;
            let custom = propagation::add_criterion(stored, group, &label, scope)?;
            db::upsert(&pool, &*stored).await?;
            match custom {
                Some(custom) => {
                    db::upsert(&pool, &custom).await?;
                    println!("Added \"{}\" to {report} and to future reports in {school}.", custom.criterion.label);
                }
                None => println!("Added \"{}\" to {report}.", label.trim()),
            }
        }
        Commands::RemoveCriterion {
            school,
            report,
            criterion,
            group,
        } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let stored = workspace.report_mut(&report)?;
            let removed = propagation::remove_criterion(stored, group, &criterion)?;
            db::upsert(&pool, &*stored).await?;
            println!("Removed \"{}\" from {report}.", removed.label);
        }
        Commands::Feedback { school, report } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let stored = workspace.report_mut(&report)?;
            let Report::ClassSession(session) = &mut *stored else {
                anyhow::bail!("feedback is only generated for class-session reports");
            };
            session.regenerate_feedback();
            println!("## Positives\n{}\n", session.positives);
            println!("## Notes for improvement\n{}\n", session.notes_for_improvement);
            println!("## Recommendations\n{}", session.recommendations);
            db::upsert(&pool, &*stored).await?;
        }
        Commands::DeleteTeacher { school, teacher } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&school);
            let name = workspace.teacher(&teacher)?.name.clone();
            let removed = db::delete_teacher(&pool, &teacher).await?;
            println!("Deleted {name} and {removed} reports.");
        }
        Commands::DeleteReport { school, report } => {
            let mut workspace = db::load_workspace(&pool).await?.for_school(&school);
            let removed = workspace.delete_report(&report)?;
            db::delete_record::<Report>(&pool, removed.id()).await?;
            println!("Deleted report {report}.");
        }
        Commands::Teachers { view, limit, json } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&view.school);
            let teachers = workspace.teacher_index();
            let reports = view.filter().apply(&workspace.reports, &teachers);
            let mut averages = aggregate::average_by_teacher(reports, &teachers);
            averages.truncate(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&averages)?);
            } else if averages.is_empty() {
                println!("No reports found for this school.");
            } else {
                println!("Teachers by average percentage:");
                for average in &averages {
                    println!(
                        "- {} {:.2}% across {} reports",
                        average.teacher_name, average.average, average.report_count
                    );
                }
            }
        }
        Commands::Criteria {
            view,
            ascending,
            limit,
            by_score,
            json,
        } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&view.school);
            let teachers = workspace.teacher_index();
            let reports = view.filter().apply(&workspace.reports, &teachers);

            if by_score {
                let recipients = aggregate::teachers_by_criterion_score(reports, &teachers);
                if json {
                    println!("{}", serde_json::to_string_pretty(&recipients)?);
                } else {
                    for entry in &recipients {
                        println!("{}", entry.label);
                        for (score, names) in entry.by_score.iter().rev() {
                            println!("  {score}: {}", names.join("، "));
                        }
                    }
                }
                return Ok(());
            }

            let direction = if ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            let mut summaries = aggregate::average_by_criterion_label(reports, direction);
            summaries.truncate(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No scored criteria found.");
            } else {
                for summary in &summaries {
                    let distribution: Vec<String> = summary
                        .distribution
                        .iter()
                        .map(|(score, count)| format!("{score}x{count}"))
                        .collect();
                    println!(
                        "- {} {:.2}% over {} ratings [{}]",
                        summary.label,
                        summary.average,
                        summary.count,
                        distribution.join(" ")
                    );
                }
            }
        }
        Commands::Tiers { school, json } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&school);
            let teachers = workspace.teacher_index();
            let tiers = aggregate::group_by_performance_tier(&workspace.reports);

            if json {
                println!("{}", serde_json::to_string_pretty(&tiers)?);
            } else {
                for (tier, entries) in &tiers {
                    println!("{} ({} reports)", tier.key(), entries.len());
                    for entry in entries {
                        println!(
                            "  - {} {} {:.2}%",
                            teachers.display_name(entry.report.teacher_id()),
                            entry.report.date(),
                            entry.percentage
                        );
                    }
                }
            }
        }
        Commands::Terms { view, json } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&view.school);
            let teachers = workspace.teacher_index();
            let reports = view.filter().apply(&workspace.reports, &teachers);
            let works = aggregate::other_works(reports);

            if json {
                println!("{}", serde_json::to_string_pretty(&works)?);
            } else {
                for (title, counts) in [
                    ("Strategies", &works.strategies),
                    ("Tools", &works.tools),
                    ("Programs", &works.programs),
                    ("Sources", &works.sources),
                ] {
                    println!("{title}:");
                    for count in counts {
                        println!("  - {} ({})", count.term, count.count);
                    }
                }
            }
        }
        Commands::Report { view, out } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&view.school);
            let dashboard = report::build_report(&view.school, &workspace, &view.filter());
            std::fs::write(&out, dashboard)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { view, out } => {
            let workspace = db::load_workspace(&pool).await?.for_school(&view.school);
            let teachers = workspace.teacher_index();
            let reports = view.filter().apply(&workspace.reports, &teachers);
            let file = File::create(&out).with_context(|| format!("failed to create {}", out.display()))?;
            let written = export::write_aggregated_csv(file, &reports, &teachers)?;
            println!("Exported {written} reports to {}.", out.display());
        }
    }

    Ok(())
}
