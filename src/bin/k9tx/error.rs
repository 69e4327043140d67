use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("SDK Error: {0}")]
    Sdk(#[from] k9tx_bank_sdk::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command Error: {0}")]
    Command(String),

    #[error("Parse Error: {0}")]
    Parse(String),
}

impl CliError {
    /// Text shown to the user before exiting
    pub fn user_message(&self) -> String {
        match self {
            CliError::Sdk(e) => e.user_message(),
            CliError::Io(e) => e.to_string(),
            CliError::Command(message) | CliError::Parse(message) => message.clone(),
        }
    }
}
