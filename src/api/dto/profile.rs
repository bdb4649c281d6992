use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.display_name.is_none() && self.email.is_none() && self.locale.is_none() {
            return Err("nothing to update");
        }
        if let Some(name) = &self.display_name
            && (name.trim().is_empty() || name.chars().count() > 100)
        {
            return Err("display_name must be 1..=100 chars");
        }
        if let Some(email) = &self.email
            && !email.split_once('@').is_some_and(|(l, d)| !l.is_empty() && d.contains('.'))
        {
            return Err("email is invalid");
        }
        if let Some(locale) = &self.locale
            && (locale.is_empty() || locale.len() > 35)
        {
            return Err("locale is invalid");
        }
        Ok(())
    }
}
