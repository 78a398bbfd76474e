//! User directory.
//!
//! Registered users carry the sex used for body-fat classification, so a
//! consultation can be run for a user without restating it.

use crate::{Error, Result, Sex, UserProfile};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserDirectory {
    #[serde(default)]
    users: Vec<UserProfile>,
}

impl UserDirectory {
    pub fn list(&self) -> &[UserProfile] {
        &self.users
    }

    pub fn get(&self, id: u32) -> Result<&UserProfile> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))
    }

    /// Register a user and return the new id
    pub fn add(&mut self, name: &str, sex: Sex) -> Result<u32> {
        let name = validate_name(name)?;
        let id = self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        self.users.push(UserProfile {
            id,
            name,
            sex,
            created_at: Utc::now(),
        });
        tracing::debug!("Added user {}", id);
        Ok(id)
    }

    pub fn rename(&mut self, id: u32, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        user.name = name;
        Ok(())
    }

    pub fn set_sex(&mut self, id: u32, sex: Sex) -> Result<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        user.sex = sex;
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Result<UserProfile> {
        let index = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        Ok(self.users.remove(index))
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("user name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}
