//! Requêtes et réponses du service de recommandation d'actions.
//!
//! Le kernel extrait une partie du snapshot dans `RecommendActionsInput`,
//! construit le prompt, puis relit le texte généré en `RecommendActionsOutput`.

use serde::{Deserialize, Serialize};

use crate::model::RoomSnapshot;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("empty response from recommendation service")]
    Empty,
    #[error("malformed recommendation: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendActionsInput {
    pub cfu_per_cubic_meter: u32,
    pub co2: u32,
    pub pm25: u32,
    pub pm4: u32,
    pub pm10: u32,
    pub o3: u32,
    pub tvoc: u32,
    pub ach: u32,
    pub contamination_history: String,
    pub system_status: String,
}

impl RecommendActionsInput {
    pub fn from_snapshot(snapshot: &RoomSnapshot) -> Self {
        let env = &snapshot.environmental_parameters;
        Self {
            cfu_per_cubic_meter: snapshot.bacterial_load.current,
            co2: env.co2.current,
            pm25: env.pm25.current,
            pm4: env.pm4.current,
            pm10: env.pm10.current,
            o3: env.o3.current,
            tvoc: env.tvoc.current,
            ach: snapshot.system_status.ach,
            contamination_history: snapshot.system_status.last_contamination_event.clone(),
            system_status: snapshot.system_status.summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendActionsOutput {
    pub actions: String,
    pub reasoning: String,
}

pub fn render_prompt(input: &RecommendActionsInput) -> String {
    format!(
        "You are an AI assistant specializing in recommending actions to improve air quality in hospital rooms.

Analyze the provided air quality data, contamination history, and system status to determine the best course of action. \
Consider adjusting ACH (Air Changes per Hour), activating UV sterilization, or suggesting further investigation by facilities personnel.

Air Quality Data:
- CFU/m3: {cfu}
- CO2: {co2} ppm
- PM2.5: {pm25} ug/m3
- PM4: {pm4} ug/m3
- PM10: {pm10} ug/m3
- O3: {o3} ppm
- TVOC: {tvoc} ug/m3
- ACH: {ach}

Contamination History: {history}
System Status: {status}

Respond with a JSON object with two string fields: \"actions\" (specific actions) and \"reasoning\" (a clear explanation of your reasoning).
",
        cfu = input.cfu_per_cubic_meter,
        co2 = input.co2,
        pm25 = input.pm25,
        pm4 = input.pm4,
        pm10 = input.pm10,
        o3 = input.o3,
        tvoc = input.tvoc,
        ach = input.ach,
        history = input.contamination_history,
        status = input.system_status,
    )
}

/// Accepte un objet JSON (nu ou dans un bloc de code) ou du texte avec des
/// sections `Actions:` / `Reasoning:`.
pub fn parse_output(text: &str) -> Result<RecommendActionsOutput, AdvisoryError> {
    let body = strip_fence(text.trim());
    if body.is_empty() {
        return Err(AdvisoryError::Empty);
    }

    if body.starts_with('{') {
        return serde_json::from_str::<RecommendActionsOutput>(body)
            .map_err(|e| AdvisoryError::Malformed(e.to_string()));
    }

    let actions_at = body
        .find("Actions:")
        .ok_or_else(|| AdvisoryError::Malformed("missing Actions section".into()))?;
    let reasoning_at = body
        .find("Reasoning:")
        .ok_or_else(|| AdvisoryError::Malformed("missing Reasoning section".into()))?;
    if reasoning_at < actions_at {
        return Err(AdvisoryError::Malformed("Reasoning before Actions".into()));
    }

    let actions = body[actions_at + "Actions:".len()..reasoning_at].trim();
    let reasoning = body[reasoning_at + "Reasoning:".len()..].trim();
    if actions.is_empty() || reasoning.is_empty() {
        return Err(AdvisoryError::Malformed("empty section".into()));
    }

    Ok(RecommendActionsOutput {
        actions: actions.to_string(),
        reasoning: reasoning.to_string(),
    })
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else { return text };
    // saute la ligne d'en-tête du bloc (```json)
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
