//! User domain types.
//!
//! Users mirror identity-provider accounts. They are created and refreshed
//! from verified [`Claims`]; only the display fields (nickname, profile image)
//! can be changed by the user directly.

use chrono::{DateTime, Utc};

use forkful_core::UserId;

use super::claims::Claims;

/// A local user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identity-provider subject. Never client-supplied.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub image_profile_url: String,
    /// Set once the user picks a nickname themselves.
    pub nick_name_customized: bool,
    /// Set once the user picks a profile image themselves.
    pub image_customized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A record for a subject that has never been seen before.
    #[must_use]
    pub fn fresh(id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            nick_name: String::new(),
            image_profile_url: String::new(),
            nick_name_customized: false,
            image_customized: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold verified claims into this record.
    ///
    /// Names always follow the identity provider. Nickname and profile image
    /// only take the claim value when the user has not chosen one and the
    /// claim is non-empty.
    #[must_use]
    pub fn merge_claims(self, claims: &Claims) -> Self {
        let nick_name = merge_display_field(
            self.nick_name,
            self.nick_name_customized,
            &claims.nick_name,
        );
        let image_profile_url = merge_display_field(
            self.image_profile_url,
            self.image_customized,
            &claims.image_profile_url,
        );

        Self {
            id: claims.id.clone(),
            first_name: claims.first_name.trim().to_owned(),
            last_name: claims.last_name.trim().to_owned(),
            nick_name,
            image_profile_url,
            ..self
        }
    }
}

fn merge_display_field(stored: String, customized: bool, claimed: &str) -> String {
    let claimed = claimed.trim();
    if customized || claimed.is_empty() {
        stored
    } else {
        claimed.to_owned()
    }
}

/// A validated partial profile update: at least one field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub nick_name: Option<String>,
    pub image_profile_url: Option<String>,
}
