//! Narrative feedback for class-session reports.
//!
//! Each criterion label is expected to open with a present-tense verb ("يستخدم ...").
//! The verb is swapped for its verbal noun so the label can sit inside a sentence
//! ("استخدام ..."). Labels opening with any other word are used verbatim.

use serde::Serialize;

use crate::models::ClassSessionReport;

/// Verbal noun for a known leading verb.
fn masdar_for(verb: &str) -> Option<&'static str> {
    let masdar = match verb {
        "يستخدم" => "استخدام",
        "يظهر" => "إظهار",
        "يتحدث" => "التحدث",
        "يسير" => "السير",
        "يقدم" => "تقديم",
        "يربط" => "ربط",
        "يحافظ" => "المحافظة",
        "يدير" => "إدارة",
        "يساهم" => "المساهمة",
        "يوزع" => "توزيع",
        "يهيئ" => "تهيئة",
        "يمهد" => "التمهيد",
        "يراعي" => "مراعاة",
        "ينمي" => "تنمية",
        "يفعل" => "تفعيل",
        "يطرح" => "طرح",
        "يتابع" => "متابعة",
        "يغلق" => "إغلاق",
        "يمارس" => "ممارسة",
        "يوظف" => "توظيف",
        "يقيس" => "قياس",
        "ينفذ" => "تنفيذ",
        "يهتم" => "الاهتمام",
        "يحترم" => "احترام",
        "يثق" => "الثقة",
        "يحدد" => "تحديد",
        "يكتب" => "كتابة",
        "يوضح" => "توضيح",
        "يتدرج" => "التدرج",
        "يكثر" => "الإكثار",
        "يصحح" => "تصحيح",
        "يعتمد" => "الاعتماد",
        "يضع" => "وضع",
        "ينوع" => "تنويع",
        "يشرك" => "إشراك",
        "يحسن" => "إحسان",
        // "يتم توظيف ..." reads as the passive of توظيف
        "يتم" => "توظيف",
        "يشارك" => "مشاركة",
        "يتفاعل" => "التفاعل",
        "يعزز" => "تعزيز",
        "ينهي" => "إنهاء",
        _ => return None,
    };
    Some(masdar)
}

/// Rewrites a verb phrase as a noun phrase, or returns it unchanged when the leading
/// word is not a known verb.
pub fn verb_to_masdar(phrase: &str) -> String {
    let (first_word, rest) = phrase.split_once(' ').unwrap_or((phrase, ""));
    match masdar_for(first_word) {
        Some(masdar) => format!("{masdar} {rest}"),
        None => phrase.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub positives: String,
    pub notes_for_improvement: String,
    pub recommendations: String,
}

/// Builds the three feedback texts from the report's current scores, one sentence per
/// criterion in group order.
pub fn generate_feedback(report: &ClassSessionReport) -> Feedback {
    let mut positives = Vec::new();
    let mut notes = Vec::new();
    let mut recommendations = Vec::new();

    for criterion in report
        .criterion_groups
        .iter()
        .flat_map(|group| group.criteria.iter())
    {
        let masdar = verb_to_masdar(&criterion.label);
        match criterion.score {
            4 => positives.push(format!(
                "لقد تميزت في {masdar}، ولقد وصلت إلى أعلى المستويات في هذا المعيار."
            )),
            3 => positives.push(format!(
                "الأداء كان قوياً في {masdar} ونطمح أن يرتقي إلى أعلى المستويات."
            )),
            2 => notes.push(format!(
                "نطمح إلى الارتقاء أكثر في {masdar} بحيث يرتقي إلى أعلى المستويات."
            )),
            0 | 1 => recommendations.push(format!(
                "نرجو التحسن بشكل أفضل في {masdar} بحيث يرتقي إلى أعلى المستويات."
            )),
            _ => {}
        }
    }

    Feedback {
        positives: positives.join("\n"),
        notes_for_improvement: notes.join("\n"),
        recommendations: recommendations.join("\n"),
    }
}

impl ClassSessionReport {
    /// Replaces the three feedback fields with freshly generated text.
    pub fn regenerate_feedback(&mut self) {
        let Feedback {
            positives,
            notes_for_improvement,
            recommendations,
        } = generate_feedback(self);
        self.positives = positives;
        self.notes_for_improvement = notes_for_improvement;
        self.recommendations = recommendations;
        tracing::debug!(report_id = %self.base.id, "feedback regenerated");
    }
}
