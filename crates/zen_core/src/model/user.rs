use serde::{Deserialize, Serialize};

/// Local profile. The token is a client-generated placeholder and is
/// never verified anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub token: String,
}
