use crate::models::{ClassSessionSubType, CriterionGroup, CriterionTemplate, Progress};

type GroupSpec = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const GENERAL_CRITERIA: [(&str, &str); 8] = [
    ("gc1", "حضور اللقاء التطويري"),
    ("gc2", "السير في المنهج"),
    ("gc3", "عنوان آخر درس"),
    ("gc4", "تسليم الأسئلة الأسبوعية"),
    ("gc5", "اختبار الطلاب"),
    ("gc6", "تنفيذ البرامج الخاصة بالمادة"),
    ("gc7", "تنفيذ الاستراتيجيات"),
    ("gc8", "استخدام وسائل تعليمية"),
];

const BRIEF_GROUPS: &[GroupSpec] = &[
    ("csb1", "الكفايات الشخصية وسمات المعلم", &[
        ("csb1c1", "يهتم بمظهره الشخصي"),
        ("csb1c2", "يظهر ثقة بنفسه"),
        ("csb1c3", "يتحدث بصوت ولغة سليمة"),
    ]),
    ("csb2", "الخطة الدرسية", &[
        ("csb2c1", "يسير في المنهج وفق الخطة"),
        ("csb2c2", "يقدم خطة درسية مكتملة العناصر (كمي)"),
        ("csb2c3", "يربط الخطة الدراسية بموضوع الدرس (نوعي)"),
    ]),
    ("csb3", "إدارة الصف", &[
        ("csb3c1", "يحافظ على قواعد الانضباط الصفي"),
        ("csb3c2", "يدير التفاعل الصفي بنجاح"),
        ("csb3c3", "يساهم في إيجاد مناخ صفي ملائم"),
        ("csb3c4", "يوزع زمن الحصة على خطوات الدرس (تنفيذ)"),
    ]),
    ("csb4", "الأداء والعرض المباشر للدرس", &[
        ("csb4c1", "يهيئ ويمهد للدرس بصورة ملائمة"),
        ("csb4c2", "يظهر إلماما بالمادة العلمية"),
        ("csb4c3", "يراعي الفروق الفردية بين المتعلمين"),
        ("csb4c4", "يربط الدرس بالتطبيقات والبيئة المحيطة"),
        ("csb4c5", "ينمي القيم والأخلاق الحميدة"),
        ("csb4c6", "يفعل دور المتعلمين ويحفزهم"),
        ("csb4c7", "يطرح أسئلة صفية متنوعة"),
        ("csb4c8", "يتابع أعمال المتعلمين أثناء الدرس"),
        ("csb4c9", "يغلق الدرس بصورة مناسبة"),
    ]),
    ("csb5", "السبورة والوسائل والأنشطة التعليمية", &[
        ("csb5c1", "يمارس التقييم المعزز للتعلم"),
        ("csb5c2", "يستخدم السبورة بفاعلية"),
        ("csb5c3", "يوظف الوسائط التعليمية بصورة مناسبة"),
        ("csb5c4", "يدير النشاط الصفي بفاعلية"),
    ]),
    ("csb6", "تحصيل المتعلمين", &[
        ("csb6c1", "يفعل سجل الدرجات في الحصة"),
        ("csb6c2", "يقيس استيعاب المتعلمين"),
        ("csb6c3", "يتابع دفاتر المتعلمين بفاعلية"),
        ("csb6c4", "يفعل الواجب المنزلي والتعيينات"),
        ("csb6c5", "يربط تحصيل المتعلمين بمصادر التعلم"),
    ]),
    ("csb7", "مهارات المادة", &[
        ("csb7c1", "ينفذ المهارات الأساسية للمادة"),
    ]),
    ("csb8", "البيئة الصفية", &[
        ("csb8c1", "مشاركة الطلاب وتفاعلهم"),
        ("csb8c2", "التفاعل الإيجابي بين المعلم والطلاب"),
    ]),
];

const EXTENDED_GROUPS: &[GroupSpec] = &[
    ("cse1", "متميز في الصفات الشخصية", &[
        ("cse1c1", "يظهر بمظهر حسن"),
        ("cse1c2", "يحترم مشاعر الآخرين"),
        ("cse1c3", "يثق بنفسه"),
    ]),
    ("cse2", "اكتمال الخطة والتحضير (كمي)", &[
        ("cse2c1", "توفر البيانات العامة (صف، حصة، عنوان، تاريخ)"),
        ("cse2c2", "توفر الأهداف والمحتوى والأساليب الوسائل والتقويم"),
        ("cse2c3", "توفر التمهيد والغلق والواجب بشكل مناسب"),
        ("cse2c4", "يحدد أدواراً نشطة للمعلم والمتعلم تتفق مع المحتوى"),
    ]),
    ("cse3", "اتفاق عناصر التحضير مع الدرس (نوعي)", &[
        ("cse3c1", "تتفق عناصر التحضير مع المحتوى ومهاراته"),
        ("cse3c2", "الأهداف مصاغة من المستويات العليا والدنيا"),
        ("cse3c3", "الأهداف سليمة الصياغة وخالية من الأخطاء الإملائية"),
        ("cse3c4", "التقويم مصاغ بطريقة تقيس تحقق الأهداف"),
    ]),
    ("cse4", "التهيئة والتمهيد مناسبان للدرس", &[
        ("cse4c1", "تهيئة بيئية و نفسية(نظافة، نظام، قيام، مجموعات)"),
        ("cse4c2", "تهيئة توجيهية وانتقالية من نشاط إلى آخر"),
        ("cse4c3", "تمهيد مشوق ومناسب للدرس ويثير دافعية المتعلم"),
        ("cse4c4", "تمهيد انتقالي من مهارة علمية إلى أخرى"),
    ]),
    ("cse5", "استخدام السبورة بفاعلية", &[
        ("cse5c1", "يكتب البيانات والدرس وينظم السبورة مع التلوين"),
        ("cse5c2", "يكتب عناصر ومهارات الدرس مع الأمثلة والتلوين"),
        ("cse5c3", "يكتب القواعد والأساسيات التي يشرحها"),
        ("cse5c4", "خلو الكتابة من الأخطاء العلمية واللغوية والإملائية"),
    ]),
    ("cse6", "وضوح الشرح بتمكن علمي وتسلسل منطقي للدرس", &[
        ("cse6c1", "الشرح خالٍ من الأخطاء العلمية الملقاة في الدرس"),
        ("cse6c2", "الشرح خالٍ من الأخطاء اللغوية الملقاة في الدرس"),
        ("cse6c3", "يوضح المفاهيم والمصطلحات الواردة في الدرس"),
        ("cse6c4", "يتدرج من السهل والمعلوم إلى الصعب والمجهول"),
        ("cse6c5", "التسلسل كامل و مناسب لمحتوى الدرس والمتعلم"),
        ("cse6c6", "يكثر من الأمثلة التطبيقية لكل مهارة ونشاط"),
        ("cse6c7", "يصحح أخطاء الطلاب ويوجههم للصواب"),
        ("cse6c8", "يعتمد على المقارنات لتوضيح الفروق العلمية"),
        ("cse6c9", "يضع أسئلة متنوعة لإثارة نشاط الطلاب"),
    ]),
    ("cse7", "الاستراتيجات ودور المتعلم", &[
        ("cse7c1", "تنويع الأساليب بحيث لكل هدف أسلوب نشط"),
        ("cse7c2", "يستخدم طرقاً نشطة مثيرة لانتباه الطلاب"),
        ("cse7c3", "يشرك المتعلم في نشاط الدرس ( فردي، جماعي)"),
        ("cse7c4", "يحدد أدواراً للمعلم والمتعلم نشطة تتفق مع المحتوى"),
    ]),
    ("cse8", "مهارات التواصل", &[
        ("cse8c1", "يحسن إيصال المعلومة بلغة جسد وتحرك متميز"),
        ("cse8c2", "وضوح الصوت وتنوع نبراته وفق محتوى الدرس"),
        ("cse8c3", "يحسن الاستماع والحوار مع جميع المتعلمين"),
    ]),
    ("cse9", "ربط الدرس بالقيم وخبرات الطلاب", &[
        ("cse9c1", "ربط الدرس بقيمة حياتية من واقع الطلبة"),
        ("cse9c2", "ينوع في الأنشطة وفق قدرات الطلبة العقلية"),
        ("cse9c3", "يقدم التغذية الراجعة أثناء تنفيذ الطلاب للمهارات"),
    ]),
    ("cse10", "الوسائل والمصادر", &[
        ("cse10c1", "توفر وسائل مناسبة ومتنوعة وملتزمة بالوقت"),
        ("cse10c2", "يتم توظيف الكتاب ومصادر أخرى حسب النشاط"),
    ]),
    ("cse11", "تفاعل المتعلمين مع الدرس", &[
        ("cse11c1", "شارك جميع الطلبة في الدرس"),
        ("cse11c2", "تفاعل جميع المتعلمين مع بعضهم"),
        ("cse11c3", "تفاعل المتعلمين مع المعلم والوسيلة والنشاط"),
    ]),
    ("cse12", "الإدارة الصفية وقواعد السلوك", &[
        ("cse12c1", "إدارة فاعلة منضبطة نشطة وغير خاملة دائماً"),
        ("cse12c2", "يفعل الطالب الخامل من خلال السؤال والمشاركة"),
        ("cse12c3", "تعزيز السلوكيات المرغوبة وتقويم غير المرغوبة"),
        ("cse12c4", "أنهى الحصة وغطى الوقت حسب المخطط له"),
        ("cse12c5", "يستخدم سجل نقاط ودرجات المشاركات الطلابية"),
        ("cse12c6", "يستخدم الفاظاً وأحكاماً تربوية مناسبة لمعالجة سلوك"),
    ]),
    ("cse13", "التقويم والغلق مناسبان ومثيران", &[
        ("cse13c1", "تقويم تشخيصي وبنائي وختامي مكتمل"),
        ("cse13c2", "يطرح أسئلة تثير التفكير( عصف، تصنيف، سابرة)"),
        ("cse13c3", "يتابع استجابات المتعلمين"),
        ("cse13c4", "إغلاق الدرس بملخص أو مراجعة أو أسلوب مختلف"),
    ]),
    ("cse14", "يهتم بالواجبات والتصحيح", &[
        ("cse14c1", "تقديم واجبات وتعيينات مناسبة ومتنوعه"),
        ("cse14c2", "يتابع تنفيذ الواجبات من قبل الطلاب"),
        ("cse14c3", "يصحح الدفاتر أولا بأول"),
        ("cse14c4", "يضع إشارات وتغذية راجعة ويصوب الخطأ"),
    ]),
];

/// Fixed criteria every new general report starts with, before school-wide additions.
pub fn general_criteria() -> Vec<CriterionTemplate> {
    GENERAL_CRITERIA
        .iter()
        .map(|(id, label)| {
            let mut template = CriterionTemplate::new(*id, *label);
            match *id {
                "gc2" => template.progress = Some(Progress::OnTrack),
                "gc3" => template.last_lesson_title = Some(String::new()),
                _ => {}
            }
            template
        })
        .collect()
}

/// Unscored groups for a class-session sub type. Subject-specific reports reuse the
/// extended layout.
pub fn class_session_groups(sub_type: ClassSessionSubType) -> Vec<CriterionGroup> {
    let spec = match sub_type {
        ClassSessionSubType::Brief => BRIEF_GROUPS,
        ClassSessionSubType::Extended | ClassSessionSubType::SubjectSpecific => EXTENDED_GROUPS,
    };

    spec.iter()
        .map(|(id, title, criteria)| CriterionGroup {
            id: id.to_string(),
            title: title.to_string(),
            criteria: criteria
                .iter()
                .map(|(criterion_id, label)| CriterionTemplate::new(*criterion_id, *label).instantiate())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn general_template_carries_optional_fields() {
        let criteria = general_criteria();
        assert_eq!(criteria.len(), 8);
        assert_eq!(criteria[1].progress, Some(Progress::OnTrack));
        assert_eq!(criteria[2].last_lesson_title.as_deref(), Some(""));
        assert_eq!(criteria[0].progress, None);
    }

    #[test]
    fn class_session_templates_start_unscored_with_unique_ids() {
        for sub_type in [
            ClassSessionSubType::Brief,
            ClassSessionSubType::Extended,
            ClassSessionSubType::SubjectSpecific,
        ] {
            let groups = class_session_groups(sub_type);
            let criteria: Vec<_> = groups.iter().flat_map(|group| group.criteria.iter()).collect();
            let ids: HashSet<_> = criteria.iter().map(|criterion| criterion.id.as_str()).collect();

            assert!(criteria.iter().all(|criterion| criterion.score == 0));
            assert_eq!(ids.len(), criteria.len());
        }
    }

    #[test]
    fn subject_specific_mirrors_extended() {
        assert_eq!(
            class_session_groups(ClassSessionSubType::SubjectSpecific),
            class_session_groups(ClassSessionSubType::Extended)
        );
        assert_eq!(class_session_groups(ClassSessionSubType::Brief).len(), 8);
        assert_eq!(class_session_groups(ClassSessionSubType::Extended).len(), 14);
    }
}
