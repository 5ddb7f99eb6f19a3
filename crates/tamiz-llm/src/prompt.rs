//! Constrained prompt for patient-facing recommendations.

use tamiz_common::PredictionResult;

use crate::backend::{LlmRequest, Message};

pub const SYSTEM_PROMPT: &str = "\
Eres un asistente que redacta recomendaciones breves para pacientes tras un cribado de cáncer de mama asistido por un modelo estadístico. \
Escribe en español, con tono claro y empático. \
Limita la recomendación a hábitos de vida saludables y al seguimiento médico (controles, consultas con especialistas, estudios complementarios). \
No menciones nombres de medicamentos, dosis ni remedios caseros. \
No presentes el resultado como un diagnóstico definitivo. \
Responde con un máximo de 3 párrafos y sin listas ni encabezados.";

/// User turn embedding the diagnosis, probability map and confidence.
pub fn user_prompt(result: &PredictionResult) -> String {
    format!(
        "Resultado del análisis: {diagnosis}.\n\
         Probabilidades: Benigno {benigno:.2}%, Maligno {maligno:.2}%.\n\
         Confianza del modelo: {confidence:.2}%.\n\n\
         Redacta una recomendación para la paciente en un máximo de 3 párrafos, \
         solo con orientación sobre estilo de vida y seguimiento médico. \
         No incluyas medicamentos, dosis ni remedios caseros.",
        diagnosis = result.diagnosis,
        benigno = result.probabilities.benigno * 100.0,
        maligno = result.probabilities.maligno * 100.0,
        confidence = result.confidence,
    )
}

pub fn build_request(result: &PredictionResult, max_tokens: u32, temperature: f32) -> LlmRequest {
    LlmRequest {
        messages: vec![Message::system(SYSTEM_PROMPT), Message::user(user_prompt(result))],
        model: None,
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
    }
}
