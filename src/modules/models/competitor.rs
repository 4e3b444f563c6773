use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # competitor
/// a registered user. the display name is the key everything is ranked on
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone)]
pub struct Competitor {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// # identity
/// the authenticated competitor as supplied by the identity provider.
/// it is passed explicitly into every operation that needs to know
/// who is asking, nothing reads it from global state.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(name: &str, email: Option<&str>) -> Identity {
        Identity {
            name: name.to_string(),
            email: email.map(|e| e.to_string()),
            is_admin: false,
        }
    }

    /// # resolve the administrator flag
    /// a competitor is an administrator when their contact address matches
    /// the configured admin address, compared case-insensitively
    pub fn with_admin_email(mut self, admin_email: Option<&str>) -> Identity {
        self.is_admin = match (self.email.as_deref(), admin_email) {
            (Some(email), Some(admin)) => email.eq_ignore_ascii_case(admin),
            _ => false,
        };
        self
    }

    pub fn owns(&self, owner: &str) -> bool {
        self.name == owner
    }

    /// # may delete
    /// owners may delete their own records, administrators any record
    pub fn may_delete(&self, owner: &str) -> bool {
        self.is_admin || self.owns(owner)
    }
}

impl From<&Competitor> for Identity {
    fn from(competitor: &Competitor) -> Self {
        Identity {
            name: competitor.name.clone(),
            email: Some(competitor.email.clone()),
            is_admin: competitor.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_flag_matches_email_case_insensitively() {
        let id = Identity::new("Admin", Some("Boss@Example.com")).with_admin_email(Some("boss@example.com"));
        assert!(id.is_admin);
        assert!(id.may_delete("someone else"));

        let id = Identity::new("J.Baldwin", Some("james@sim.com")).with_admin_email(Some("boss@example.com"));
        assert!(!id.is_admin);
        assert!(id.may_delete("J.Baldwin"));
        assert!(!id.may_delete("Admin"));
    }

    #[test]
    fn no_admin_without_email() {
        let id = Identity::new("anon", None).with_admin_email(Some("boss@example.com"));
        assert!(!id.is_admin);
    }
}
