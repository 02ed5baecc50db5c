use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Claims {
    pub id: String, // opaque user id issued by the auth provider
    pub email: String,
    pub exp: usize, // expiration (as UNIX timestamp)
    // Subscription plan at the time the token was issued
    pub plan: Option<String>,
    pub iss: String,
    pub aud: String,
}
