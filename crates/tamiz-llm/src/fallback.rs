//! Deterministic, diagnosis-keyed recommendation templates.

use tamiz_common::config::RecommendationConfig;
use tamiz_common::{Diagnosis, Recommendation};

pub const BENIGN_TEMPLATE: &str = "\
El resultado es benigno. Se recomienda continuar con controles médicos regulares y mantener hábitos saludables.

Mantenga una alimentación equilibrada, actividad física regular y evite el tabaco y el exceso de alcohol.

Si nota un bulto nuevo, secreción o cambios en la piel de la mama, consulte a su médico sin esperar al siguiente control.";

pub const MALIGNANT_TEMPLATE: &str = "\
El resultado es maligno. Se recomienda acudir a un especialista lo antes posible para una evaluación y tratamiento oportuno.

Lleve este resultado y sus estudios previos a la consulta. Pida que le expliquen los siguientes pasos y no dude en solicitar una segunda opinión.

Apóyese en su familia o en grupos de apoyo, descanse y mantenga una alimentación equilibrada mientras completa la evaluación.";

pub const GENERIC_TEMPLATE: &str = "\
No fue posible generar una recomendación personalizada. Comparta este resultado con su médico, quien le indicará los controles y estudios que correspondan a su caso.

Mantenga hábitos saludables y consulte ante cualquier cambio en la mama.";

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackTemplates {
    benign: String,
    malignant: String,
    generic: String,
}

impl Default for FallbackTemplates {
    fn default() -> Self {
        Self {
            benign: BENIGN_TEMPLATE.to_string(),
            malignant: MALIGNANT_TEMPLATE.to_string(),
            generic: GENERIC_TEMPLATE.to_string(),
        }
    }
}

impl FallbackTemplates {
    /// Built-in templates, replaced by any non-blank override in `config`.
    pub fn from_config(config: &RecommendationConfig) -> Self {
        let pick = |custom: &Option<String>, builtin: &str| {
            custom
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(builtin)
                .to_string()
        };
        Self {
            benign: pick(&config.benign_template, BENIGN_TEMPLATE),
            malignant: pick(&config.malignant_template, MALIGNANT_TEMPLATE),
            generic: pick(&config.generic_template, GENERIC_TEMPLATE),
        }
    }

    /// Template for `diagnosis`; the generic message when none is known.
    pub fn text_for(&self, diagnosis: Option<Diagnosis>) -> &str {
        match diagnosis {
            Some(Diagnosis::Benigno) => &self.benign,
            Some(Diagnosis::Maligno) => &self.malignant,
            None => &self.generic,
        }
    }

    pub fn recommend(&self, diagnosis: Option<Diagnosis>) -> Recommendation {
        Recommendation::fallback(self.text_for(diagnosis))
    }
}
