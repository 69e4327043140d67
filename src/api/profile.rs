use tracing::warn;

use super::models::{ProfileUpdate, UserProfile};
use super::paths;
use crate::client::BankClient;
use crate::error::Error;
use crate::transport::{ApiRequest, FormField};

impl BankClient {
    /// Fresh copy of the caller's profile
    pub async fn me(&self) -> Result<UserProfile, Error> {
        self.call(ApiRequest::get(paths::ME)).await
    }

    /// Update username, phone number and/or picture.
    ///
    /// The cached profile picks up the new username and phone number; its picture
    /// URL only changes when the server returns one.
    pub async fn update_me(&self, update: ProfileUpdate) -> Result<UserProfile, Error> {
        if update.is_empty() {
            return Err(Error::Validation("Nothing to update".to_string()));
        }

        let mut fields = Vec::new();
        if let Some(username) = update.username {
            fields.push(FormField::Text {
                name: "username".to_string(),
                value: username,
            });
        }
        if let Some(phone_number) = update.phone_number {
            fields.push(FormField::Text {
                name: "phone_number".to_string(),
                value: phone_number,
            });
        }
        if let Some(image) = update.profile_image {
            fields.push(FormField::File {
                name: "profile_image".to_string(),
                file_name: image.file_name,
                bytes: image.bytes,
            });
        }

        let updated: UserProfile = self.call(ApiRequest::put(paths::ME).form(fields)).await?;

        let merged = self.token_store().update_user(|cached| {
            cached.username = updated.username.clone();
            cached.phone_number = updated.phone_number.clone();
            if updated.profile_image_url.is_some() {
                cached.profile_image_url = updated.profile_image_url.clone();
            }
        });
        if let Err(e) = merged {
            warn!("Failed to cache updated profile: {}", e);
        }

        Ok(updated)
    }
}
