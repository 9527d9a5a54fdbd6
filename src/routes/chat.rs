//! Refinement route
//!
//! `POST /chat` - JSON body `{ prompt, instruction?, model?, max_tokens?,
//! temperature? }`; answers `{ model, answer }`.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::refine::RefinementRequest;
use crate::state::AppState;

/// Create the chat router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(refine))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    pub instruction: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub model: String,
    pub answer: String,
}

async fn refine(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let result = state
        .refiner()
        .refine(RefinementRequest {
            source_text: body.prompt,
            instruction: body.instruction,
            model: body.model,
            max_tokens: body.max_tokens,
            temperature: body.temperature,
        })
        .await?;

    Ok(Json(ChatResponse {
        model: result.model,
        answer: result.answer,
    }))
}
