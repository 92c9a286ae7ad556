//! Database credential resolution
//!
//! Connection fields are layered: configuration defaults, then environment
//! variables (a `.env` file is loaded at startup), then command-line
//! overrides. Whatever is still missing can be prompted for on the terminal.

use std::env;
use std::io::{self, Write};
use std::path::Path;

use crate::app::ConnectionInfo;
use crate::constants::env as env_constants;
use crate::errors::{CredentialError, CredentialResult};

/// Which credential variables are present in the environment
#[derive(Debug, Clone)]
pub struct CredentialStatus {
    pub user_set: bool,
    pub password_set: bool,
    pub host_set: bool,
    pub database_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
}

impl CredentialStatus {
    pub fn has_credentials(&self) -> bool {
        self.user_set && self.password_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.user_set, self.password_set) {
            (true, true) => "Database credentials configured".to_string(),
            (true, false) => format!(
                "{} not set - the password will be prompted for",
                env_constants::DB_PASSWORD
            ),
            (false, _) => format!(
                "{} not set - the user will be prompted for",
                env_constants::DB_USER
            ),
        }
    }

    /// Status as TOML comment lines, one per variable
    pub fn report(&self) -> String {
        let state = |set: bool| if set { "set" } else { "not set" };
        let mut lines = vec![
            format!("# {}", self.status_message()),
            format!("#   {}: {}", env_constants::DB_HOST, state(self.host_set)),
            format!("#   {}: {}", env_constants::DB_USER, state(self.user_set)),
            format!("#   {}: {}", env_constants::DB_PASSWORD, state(self.password_set)),
            format!("#   {}: {}", env_constants::DB_NAME, state(self.database_set)),
        ];
        if self.dotenv_file_exists {
            lines.push("#   .env file found in the current directory".to_string());
        }
        lines.join("\n")
    }
}

/// Check which credential variables are set
pub fn get_credential_status() -> CredentialStatus {
    CredentialStatus {
        user_set: env_value(env_constants::DB_USER).is_some(),
        password_set: env_value(env_constants::DB_PASSWORD).is_some(),
        host_set: env_value(env_constants::DB_HOST).is_some(),
        database_set: env_value(env_constants::DB_NAME).is_some(),
        dotenv_file_exists: Path::new(".env").exists(),
    }
}

/// Connection fields given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Layer environment variables over `base`
pub fn apply_environment(base: ConnectionInfo) -> ConnectionInfo {
    apply_lookup(base, env_value)
}

fn apply_lookup<F>(mut info: ConnectionInfo, lookup: F) -> ConnectionInfo
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(env_constants::DB_HOST) {
        info.host = host;
    }
    if let Some(user) = lookup(env_constants::DB_USER) {
        info.user = user;
    }
    if let Some(password) = lookup(env_constants::DB_PASSWORD) {
        info.password = password;
    }
    if let Some(database) = lookup(env_constants::DB_NAME) {
        info.database = database;
    }
    info
}

/// Layer command-line overrides over `info`
pub fn apply_overrides(mut info: ConnectionInfo, overrides: &ConnectionOverrides) -> ConnectionInfo {
    if let Some(host) = &overrides.host {
        info.host = host.clone();
    }
    if let Some(port) = overrides.port {
        info.port = port;
    }
    if let Some(user) = &overrides.user {
        info.user = user.clone();
    }
    if let Some(database) = &overrides.database {
        info.database = database.clone();
    }
    info
}

/// Check that the host and user are present
///
/// An empty password is passed through; the server decides whether the
/// login accepts it.
///
/// # Errors
///
/// Returns `CredentialError::MissingField` naming the first empty field
pub fn require_complete(info: &ConnectionInfo) -> CredentialResult<()> {
    if info.host.trim().is_empty() {
        return Err(CredentialError::MissingField {
            field: "host".to_string(),
        });
    }
    if info.user.trim().is_empty() {
        return Err(CredentialError::MissingField {
            field: "user".to_string(),
        });
    }
    Ok(())
}

/// Prompt on the terminal for the user name and password if missing
///
/// # Errors
///
/// Returns `CredentialError::Prompt` if the terminal cannot be read and
/// `CredentialError::MissingField` if an answer is empty
pub fn prompt_missing(mut info: ConnectionInfo) -> CredentialResult<ConnectionInfo> {
    if info.user.trim().is_empty() {
        print!("Database user ({}:{}): ", info.host, info.port);
        io::stdout().flush()?;

        let mut user = String::new();
        io::stdin().read_line(&mut user)?;
        info.user = user.trim().to_string();
    }

    if info.password.is_empty() {
        info.password = rpassword::prompt_password(format!("Password for {}: ", info.user))?;
    }

    require_complete(&info)?;
    Ok(info)
}

/// Resolve connection settings from all sources
///
/// Prompts only when `interactive` is set; otherwise missing fields are an
/// error.
pub fn resolve_connection(
    base: ConnectionInfo,
    overrides: &ConnectionOverrides,
    interactive: bool,
) -> CredentialResult<ConnectionInfo> {
    let info = apply_overrides(apply_environment(base), overrides);
    if interactive {
        prompt_missing(info)
    } else {
        require_complete(&info)?;
        Ok(info)
    }
}
