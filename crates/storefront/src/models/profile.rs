//! Profile domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gubre_core::{UserId, UserRole};

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of the free-form feedback field.
pub const MAX_FEEDBACK_LENGTH: usize = 2000;

/// User metadata row keyed by the authentication user id.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub feedback: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user may edit on their own profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ProfileUpdate {
    /// Trim all fields and check their lengths.
    ///
    /// An empty feedback string clears the field.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message when a field is too long.
    pub fn normalized(self) -> Result<Self, &'static str> {
        let first_name = normalize_name(&self.first_name)?;
        let last_name = normalize_name(&self.last_name)?;
        let feedback = self
            .feedback
            .map(|f| f.trim().to_owned())
            .filter(|f| !f.is_empty());
        if feedback
            .as_ref()
            .is_some_and(|f| f.chars().count() > MAX_FEEDBACK_LENGTH)
        {
            return Err("Rəy çox uzundur");
        }
        Ok(Self {
            first_name,
            last_name,
            feedback,
        })
    }
}

/// Trim a name and enforce [`MAX_NAME_LENGTH`].
///
/// # Errors
///
/// Returns a user-facing message when the name is too long.
pub fn normalize_name(name: &str) -> Result<String, &'static str> {
    let name = name.trim();
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err("Ad çox uzundur");
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_and_clears_blank_feedback() {
        let update = ProfileUpdate {
            first_name: "  Əli ".to_string(),
            last_name: "Həsənov".to_string(),
            feedback: Some("   ".to_string()),
        }
        .normalized()
        .unwrap();
        assert_eq!(update.first_name, "Əli");
        assert_eq!(update.feedback, None);
    }

    #[test]
    fn test_normalized_rejects_long_names() {
        let update = ProfileUpdate {
            first_name: "a".repeat(MAX_NAME_LENGTH + 1),
            last_name: String::new(),
            feedback: None,
        };
        assert!(update.normalized().is_err());
    }

    #[test]
    fn test_name_length_counts_characters_not_bytes() {
        // "ə" is two bytes in UTF-8.
        assert!(normalize_name(&"ə".repeat(MAX_NAME_LENGTH)).is_ok());
    }
}
