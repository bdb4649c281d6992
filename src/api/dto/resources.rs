/*
 * Responsibility
 * - Resources request/response DTOs
 * - validate(): shape checks only, no storage behind these
 */
use serde::{Deserialize, Serialize};

const MAX_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 1000;
const MAX_TAGS: usize = 10;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateResourceRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateResourceRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if self.name.chars().count() > MAX_NAME {
            return Err("name must be <= 100 chars");
        }
        if let Some(description) = &self.description
            && description.chars().count() > MAX_DESCRIPTION
        {
            return Err("description must be <= 1000 chars");
        }
        if self.tags.len() > MAX_TAGS {
            return Err("at most 10 tags are allowed");
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err("tags cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateResourceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateResourceRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_none() && self.description.is_none() {
            return Err("at least one of name, description is required");
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name cannot be empty");
            }
            if name.chars().count() > MAX_NAME {
                return Err("name must be <= 100 chars");
            }
        }
        if let Some(description) = &self.description
            && description.chars().count() > MAX_DESCRIPTION
        {
            return Err("description must be <= 1000 chars");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub owner: String,
}
