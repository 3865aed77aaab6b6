use crate::models::ReactionState;

/// Every endpoint wraps its payload as `{ data, message }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a non-2xx response; all fields are optional on the server side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ApiFailure {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPayload {
    pub token: String,
}

/// Authoritative reaction counts the server returns after a react call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub like: u32,
    pub dislike: u32,
    pub user_reaction: ReactionState,
}
