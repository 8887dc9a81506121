use axum::Json;
use axum::extract::Query;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "Stranger";

pub const ENDINGS: [&str; 8] = [
    "you will write bug-free code today.",
    "your next deployment will be silky smooth.",
    "a merge conflict approaches, but you’ll win.",
    "something unexpected will happen today!",
    "you will find an excellent intern! ;)",
    "you will have a great day!",
    "a new opportunity is on the horizon.",
    "today is a perfect day to learn something new.",
];

#[derive(Debug, Default, Deserialize)]
pub struct FortuneQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FortuneResponse {
    pub message: String,
}

/// `"<name>, <ending>"` with the ending picked uniformly.
pub fn fortune_for<R: Rng>(name: Option<&str>, rng: &mut R) -> String {
    let name = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_NAME);
    let ending = ENDINGS[rng.random_range(0..ENDINGS.len())];
    format!("{}, {}", name, ending)
}

pub async fn fortune(Query(query): Query<FortuneQuery>) -> Json<FortuneResponse> {
    let message = fortune_for(query.name.as_deref(), &mut rand::rng());
    Json(FortuneResponse { message })
}
