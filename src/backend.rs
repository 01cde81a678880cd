//! # Backend API Client
//!
//! HTTP client for the backend service that owns game logic, the ledger and
//! number calling. Every operation here is a thin request/response wrapper;
//! the backend's verdict is always authoritative. Idempotent reads get one
//! jittered retry, mutating calls (buy-card, claim-bingo) never retry so a
//! transient failure cannot double-charge or double-claim.

use crate::backend_errors::BackendError;
use crate::card::Card;
use crate::config::RetryConfig;
use crate::events::Game;
use rand::Rng;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    telegram_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    referral_code: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub balance: f64,
    pub referral_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListing {
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardsPage {
    pub cards: Vec<CardListing>,
    pub total_pages: u32,
}

/// Which card to buy: a specific pool number or a backend-picked random one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardChoice {
    Number(u32),
    Random,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuyCardRequest<'a> {
    game_id: &'a str,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_number: Option<u32>,
    random: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyCardResponse {
    pub card: Card,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub available: f64,
    pub in_play: f64,
    pub total_won: f64,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest<'a> {
    game_id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub success: bool,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub games_played: u32,
    pub games_won: u32,
    pub win_rate: f64,
    pub total_won: f64,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralInfo {
    pub code: String,
    pub total_referrals: u32,
    pub total_earned: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the backend API.
pub struct BackendApi {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl BackendApi {
    pub fn new(base_url: &str, retry: RetryConfig) -> Result<BackendApi, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(retry.request_timeout_secs))
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(BackendApi {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub async fn register_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        referral_code: Option<&str>,
    ) -> Result<AuthResponse, BackendError> {
        self.post_json(
            "/users/auth",
            &AuthRequest {
                telegram_id,
                username,
                referral_code,
            },
        )
        .await
    }

    /// Current game, `None` when no game is open.
    pub async fn current_game(&self) -> Result<Option<Game>, BackendError> {
        let response = self.send_get("/games/current").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await
    }

    pub async fn create_game(&self) -> Result<Game, BackendError> {
        self.post_json("/games", &serde_json::json!({})).await
    }

    pub async fn cards_page(
        &self,
        game_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<CardsPage, BackendError> {
        self.get_json(&format!(
            "/games/{game_id}/cards?page={page}&pageSize={page_size}"
        ))
        .await
    }

    /// Mutating call, never retried.
    pub async fn buy_card(
        &self,
        game_id: &str,
        user_id: &str,
        choice: CardChoice,
    ) -> Result<BuyCardResponse, BackendError> {
        let (card_number, random) = match choice {
            CardChoice::Number(number) => (Some(number), false),
            CardChoice::Random => (None, true),
        };
        self.post_json(
            &format!("/games/{game_id}/cards/buy"),
            &BuyCardRequest {
                game_id,
                user_id,
                card_number,
                random,
            },
        )
        .await
    }

    pub async fn balance(&self, user_id: &str) -> Result<Balance, BackendError> {
        self.get_json(&format!("/users/{user_id}/balance")).await
    }

    /// Mutating call, never retried; a duplicate claim must not originate here.
    pub async fn claim_bingo(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<ClaimOutcome, BackendError> {
        self.post_json(
            &format!("/games/{game_id}/claim"),
            &ClaimRequest { game_id, user_id },
        )
        .await
    }

    pub async fn user_cards(&self, user_id: &str) -> Result<Vec<Card>, BackendError> {
        self.get_json(&format!("/users/{user_id}/cards")).await
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, BackendError> {
        self.get_json(&format!("/users/{user_id}/stats")).await
    }

    pub async fn referral_info(&self, user_id: &str) -> Result<ReferralInfo, BackendError> {
        self.get_json(&format!("/users/{user_id}/referral")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        decode(self.send_get(path).await?).await
    }

    /// GET with a single jittered retry on transport failure.
    async fn send_get(&self, path: &str) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;
        loop {
            match self.http.get(&url).send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let err = BackendError::from(err);
                    if attempt >= self.retry.read_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    attempt += 1;
                    let jitter = rand::thread_rng().gen_range(0..=self.retry.retry_jitter_ms);
                    let delay =
                        Duration::from_millis(self.retry.base_retry_delay_ms + jitter);
                    warn!(url = %url, error = %err, attempt, "Backend read failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Backend POST");
        let response = self.http.post(&url).json(body).send().await?;
        decode(response).await
    }
}

/// Map a response onto the error taxonomy: 2xx decodes, anything else is a
/// domain rejection carrying the backend's message.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| BackendError::Protocol(format!("undecodable response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(rejection_from_body(status, &body))
    }
}

/// Non-2xx responses are domain rejections even when the body is not the
/// expected `{"error": ...}` shape.
pub fn rejection_from_body(status: StatusCode, body: &str) -> BackendError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => BackendError::Domain(parsed.error),
        Err(_) => BackendError::Domain(format!("backend rejected the request ({status})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_carries_backend_message_verbatim() {
        let err = rejection_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"error":"no cards available in this game"}"#,
        );
        match err {
            BackendError::Domain(msg) => assert_eq!(msg, "no cards available in this game"),
            other => panic!("expected a domain rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_rejection_is_still_domain() {
        let err = rejection_from_body(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        match err {
            BackendError::Domain(msg) => assert!(msg.contains("500")),
            other => panic!("expected a domain rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_buy_card_request_shape() {
        let body = BuyCardRequest {
            game_id: "g-1",
            user_id: "u-1",
            card_number: None,
            random: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["gameId"], "g-1");
        assert_eq!(json["random"], true);
        assert!(json.get("cardNumber").is_none());
    }
}
