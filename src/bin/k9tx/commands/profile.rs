use std::path::PathBuf;

use clap::Subcommand;
use k9tx_bank_sdk::models::{Attachment, ProfileUpdate};
use k9tx_bank_sdk::SessionContext;

use crate::commands::auth::whoami;
use crate::error::CliError;
use crate::utils::{print_success, require_user};

#[derive(Subcommand, Clone)]
pub enum ProfileCommands {
    /// Fetch the profile from the server and show it
    Show,

    /// Change username, phone number or profile picture
    Update {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        /// Path to a new profile picture
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
}

impl ProfileCommands {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;

        match self {
            ProfileCommands::Show => {
                session.refresh_profile().await?;
                whoami(session)
            }
            ProfileCommands::Update {
                username,
                phone,
                image,
            } => {
                let profile_image = match image {
                    Some(path) => Some(Attachment::from_path(&path).await?),
                    None => None,
                };
                let update = ProfileUpdate {
                    username,
                    phone_number: phone,
                    profile_image,
                };

                let user = session.client().update_me(update).await?;
                print_success(&format!("Profile updated for {}", user.username));
                Ok(())
            }
        }
    }
}
