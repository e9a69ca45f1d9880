//! Postal address with identity-document verification

use serde::Serialize;

/// Address a user registered with.
///
/// A moderator flips `verified` after checking the uploaded ID document;
/// only users with a verified address may report issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    pub id_url: Option<String>,
    pub verified: bool,
}

impl Address {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_url: None,
            verified: false,
        }
    }
}
