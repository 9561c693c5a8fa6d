use twins_core::classification::domain::label::ClassificationLabel;

/// Display language for labels. Presentation only; stored artifacts always
/// carry the canonical snake_case labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Ja,
}

impl Lang {
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Lang::En),
            "ja" => Some(Lang::Ja),
            _ => None,
        }
    }
}

pub fn display_label(label: ClassificationLabel, lang: Lang) -> &'static str {
    match lang {
        Lang::En => match label {
            ClassificationLabel::Twins => "twins",
            ClassificationLabel::Siblings => "siblings",
            ClassificationLabel::Similar => "similar",
            ClassificationLabel::Different => "different",
            ClassificationLabel::SinglePerson => "single person",
            ClassificationLabel::NoFace => "no face",
        },
        Lang::Ja => match label {
            ClassificationLabel::Twins => "双子",
            ClassificationLabel::Siblings => "兄弟/姉妹/兄妹/姉弟",
            ClassificationLabel::Similar => "類似",
            ClassificationLabel::Different => "異なる",
            ClassificationLabel::SinglePerson => "単一人物",
            ClassificationLabel::NoFace => "顔未検出",
        },
    }
}
