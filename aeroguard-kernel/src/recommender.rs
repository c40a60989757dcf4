/**
 * RECOMMANDATIONS - Client du service externe de génération de texte
 *
 * RÔLE :
 * Transforme un RecommendActionsInput (sous-ensemble du snapshot d'une salle)
 * en prompt, l'envoie au service generateContent et relit { actions, reasoning }.
 *
 * FONCTIONNEMENT :
 * - Un seul appel HTTP par demande, aucun retry automatique
 * - Clé API lue à chaque appel depuis la variable d'environnement configurée
 * - Toute erreur (réseau, statut HTTP, réponse mal formée) remonte en RecommendError
 *   et c'est l'appelant qui la transforme en message pour le dashboard
 */

use aeroguard_sim::advisory::{parse_output, render_prompt};
use aeroguard_sim::{AdvisoryError, RecommendActionsInput, RecommendActionsOutput};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::RecommenderConf;

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("recommendation service is not configured")]
    NotConfigured,
    #[error("API key variable {0} is not set")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Advisory(#[from] AdvisoryError),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct RecommendClient {
    http: reqwest::Client,
    conf: Option<RecommenderConf>,
}

impl RecommendClient {
    pub fn new(conf: Option<RecommenderConf>) -> Result<Self, RecommendError> {
        let timeout = conf.as_ref().map(|c| c.timeout_secs).unwrap_or(30);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self { http, conf })
    }

    pub fn is_configured(&self) -> bool {
        self.conf.is_some()
    }

    pub async fn recommend(&self, input: &RecommendActionsInput) -> Result<RecommendActionsOutput, RecommendError> {
        let conf = self.conf.as_ref().ok_or(RecommendError::NotConfigured)?;
        let url = format!(
            "{}/models/{}:generateContent",
            conf.endpoint.trim_end_matches('/'),
            conf.model
        );

        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": render_prompt(input) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let mut req = self.http.post(&url).json(&body);
        if !conf.api_key_env.is_empty() {
            let key = std::env::var(&conf.api_key_env)
                .map_err(|_| RecommendError::MissingApiKey(conf.api_key_env.clone()))?;
            req = req.header("x-goog-api-key", key);
        }

        debug!(%url, cfu = input.cfu_per_cubic_meter, "requesting recommendations");
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RecommendError::Status { status: status.as_u16(), body });
        }

        let generated: GenerateResponse = resp.json().await?;
        let text = extract_text(generated)?;
        Ok(parse_output(&text)?)
    }
}

fn extract_text(resp: GenerateResponse) -> Result<String, RecommendError> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| RecommendError::Malformed("no candidates".into()))?;
    let text: String = candidate.content.parts.into_iter().filter_map(|p| p.text).collect();
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::*;
    use aeroguard_sim::generate_snapshot;
    use axum::http::StatusCode;

    fn sample_input() -> RecommendActionsInput {
        RecommendActionsInput::from_snapshot(&generate_snapshot("mercy_general", "icu_2", 1_760_000_000_000))
    }

    #[tokio::test]
    async fn test_recommend_success() {
        let reply = mock::candidate(r#"{"actions":"Increase ACH to 12","reasoning":"CFU is high"}"#);
        let conf = mock::spawn(StatusCode::OK, reply).await;
        let client = RecommendClient::new(Some(conf)).unwrap();

        let out = client.recommend(&sample_input()).await.unwrap();
        assert_eq!(out.actions, "Increase ACH to 12");
        assert_eq!(out.reasoning, "CFU is high");
    }

    #[tokio::test]
    async fn test_recommend_http_status_error() {
        let conf = mock::spawn(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({"error": "quota"})).await;
        let client = RecommendClient::new(Some(conf)).unwrap();

        let err = client.recommend(&sample_input()).await.unwrap_err();
        assert!(matches!(err, RecommendError::Status { status: 500, .. }), "{err}");
    }

    #[tokio::test]
    async fn test_recommend_malformed_text() {
        let conf = mock::spawn(StatusCode::OK, mock::candidate("no structure here")).await;
        let client = RecommendClient::new(Some(conf)).unwrap();

        let err = client.recommend(&sample_input()).await.unwrap_err();
        assert!(matches!(err, RecommendError::Advisory(AdvisoryError::Malformed(_))), "{err}");
    }

    #[tokio::test]
    async fn test_recommend_without_candidates() {
        let conf = mock::spawn(StatusCode::OK, serde_json::json!({})).await;
        let client = RecommendClient::new(Some(conf)).unwrap();

        let err = client.recommend(&sample_input()).await.unwrap_err();
        assert!(matches!(err, RecommendError::Malformed(_)), "{err}");
    }

    #[tokio::test]
    async fn test_not_configured() {
        let client = RecommendClient::new(None).unwrap();
        assert!(!client.is_configured());
        let err = client.recommend(&sample_input()).await.unwrap_err();
        assert!(matches!(err, RecommendError::NotConfigured));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let conf = RecommenderConf {
            api_key_env: "AEROGUARD_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..RecommenderConf::default()
        };
        let client = RecommendClient::new(Some(conf)).unwrap();
        let err = client.recommend(&sample_input()).await.unwrap_err();
        assert!(matches!(err, RecommendError::MissingApiKey(_)));
    }
}
