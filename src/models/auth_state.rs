use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The identity resolved for a signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Identity {
    pub id: String,
    pub email: String,
    /// Which external identity provider issued the credential (e.g. "google", "email").
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Possession of a valid credential. May exist while the identity is still resolving.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Affiliate approval status as stored on the profile.
///
/// Unknown values coming from the backend are kept as `Other` rather than
/// rejected, so a guard can still surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffiliateStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
    Other(String),
}

impl AffiliateStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AffiliateStatus::Pending => "pending",
            AffiliateStatus::Approved => "approved",
            AffiliateStatus::Rejected => "rejected",
            AffiliateStatus::Suspended => "suspended",
            AffiliateStatus::Other(s) => s,
        }
    }

    /// User-facing label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            AffiliateStatus::Pending => "Pendente",
            AffiliateStatus::Approved => "Aprovado",
            AffiliateStatus::Rejected => "Rejeitado",
            AffiliateStatus::Suspended => "Suspenso",
            AffiliateStatus::Other(_) => "Inativo",
        }
    }
}

impl From<&str> for AffiliateStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => AffiliateStatus::Pending,
            "approved" => AffiliateStatus::Approved,
            "rejected" => AffiliateStatus::Rejected,
            "suspended" => AffiliateStatus::Suspended,
            other => AffiliateStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for AffiliateStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AffiliateStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AffiliateStatus::from(raw.as_str()))
    }
}

impl JsonSchema for AffiliateStatus {
    fn schema_name() -> String {
        "AffiliateStatus".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Application-level user record.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct Profile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub onboarding_completed_at: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub affiliate_status: Option<AffiliateStatus>,
}

fn is_filled(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

impl Profile {
    /// All completion fields are present and non-blank.
    pub fn is_complete(&self) -> bool {
        is_filled(&self.first_name)
            && is_filled(&self.last_name)
            && is_filled(&self.phone)
            && is_filled(&self.onboarding_completed_at)
    }

    pub fn has_first_name(&self) -> bool {
        is_filled(&self.first_name)
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self.role.as_deref(), Some("admin") | Some("super_admin"))
    }
}

/// The authentication state published by the session context.
///
/// `loading == false` is the only point at which a missing user or session
/// is authoritative.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct AuthState {
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub loading: bool,
}

impl AuthState {
    /// The state a freshly mounted application starts in.
    pub fn loading() -> Self {
        AuthState {
            loading: true,
            ..Default::default()
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_none() && self.session.is_none()
    }

    /// A credential is held but the identity has not been resolved yet.
    pub fn session_without_user(&self) -> bool {
        self.session.is_some() && self.user.is_none()
    }

    /// The profile, only when an identity is present.
    pub fn profile(&self) -> Option<&Profile> {
        self.user.as_ref().and(self.profile.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> Profile {
        Profile {
            first_name: Some("Ana".to_string()),
            last_name: Some("Souza".to_string()),
            phone: Some("+55 11 99999-0000".to_string()),
            onboarding_completed_at: Some("2024-03-01T10:00:00Z".to_string()),
            role: None,
            affiliate_status: Some(AffiliateStatus::Approved),
        }
    }

    #[test]
    fn test_profile_completeness() {
        assert!(full_profile().is_complete());

        let mut blank_phone = full_profile();
        blank_phone.phone = Some("   ".to_string());
        assert!(!blank_phone.is_complete());

        let mut no_onboarding = full_profile();
        no_onboarding.onboarding_completed_at = None;
        assert!(!no_onboarding.is_complete());
    }

    #[test]
    fn test_affiliate_status_roundtrip_keeps_unknown_values() {
        let profile: Profile =
            serde_json::from_str(r#"{"affiliate_status": "archived"}"#).unwrap();
        assert_eq!(
            profile.affiliate_status,
            Some(AffiliateStatus::Other("archived".to_string()))
        );
        assert_eq!(
            serde_json::to_value(&profile.affiliate_status).unwrap(),
            serde_json::json!("archived")
        );
    }

    #[test]
    fn test_profile_hidden_without_user() {
        let state = AuthState {
            profile: Some(full_profile()),
            ..Default::default()
        };
        assert!(state.profile().is_none());
    }
}
