use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tessera_application::OAuthClientConfig;
use tessera_core::AppError;
use tessera_domain::Provider;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
mod tests;

const MIN_GATEWAY_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub store_backend: StoreBackend,
    pub frontend_url: String,
    pub gateway_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub email_provider: EmailProviderConfig,
    pub email_from_name: String,
    pub oauth_clients: HashMap<Provider, OAuthClientConfig>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_owned())
            .as_str()
        {
            "postgres" => StoreBackend::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            "memory" if !migrate_only => StoreBackend::Memory,
            "memory" => {
                return Err(AppError::Configuration(
                    "migrate requires STORE_BACKEND=postgres".to_owned(),
                ));
            }
            other => {
                return Err(AppError::Configuration(format!(
                    "STORE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let gateway_secret = required_env("GATEWAY_SHARED_SECRET")?;
        if gateway_secret.len() < MIN_GATEWAY_SECRET_LEN {
            return Err(AppError::Configuration(format!(
                "GATEWAY_SHARED_SECRET must be at least {MIN_GATEWAY_SECRET_LEN} characters"
            )));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let email_provider = match env::var("EMAIL_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| {
                        AppError::Configuration(format!("invalid SMTP_PORT: {error}"))
                    })?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                    from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Configuration(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        let email_from_name = env::var("EMAIL_FROM_NAME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "Tessera".to_owned());

        let oauth_clients = load_oauth_clients(|name| env::var(name).ok());

        Ok(Self {
            migrate_only,
            store_backend,
            frontend_url,
            gateway_secret,
            api_host,
            api_port,
            email_provider,
            email_from_name,
            oauth_clients,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Configuration(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Reads `TESSERA_OAUTH_<PROVIDER>_*` for every provider.
///
/// A provider is registered only when both its client id and redirect URI are
/// set; incomplete providers are skipped so their flows fail at use time.
pub(crate) fn load_oauth_clients(
    lookup: impl Fn(&str) -> Option<String>,
) -> HashMap<Provider, OAuthClientConfig> {
    let non_empty = |name: String| lookup(&name).filter(|value| !value.trim().is_empty());

    Provider::all()
        .iter()
        .filter_map(|provider| {
            let prefix = format!(
                "TESSERA_OAUTH_{}",
                provider.as_str().to_ascii_uppercase()
            );
            let client_id = non_empty(format!("{prefix}_CLIENT_ID"));
            let redirect_uri = non_empty(format!("{prefix}_REDIRECT_URI"));

            match (client_id, redirect_uri) {
                (Some(client_id), Some(redirect_uri)) => Some((
                    *provider,
                    OAuthClientConfig {
                        client_id,
                        client_secret: non_empty(format!("{prefix}_CLIENT_SECRET")),
                        redirect_uri,
                    },
                )),
                (None, None) => None,
                _ => {
                    tracing::warn!(provider = %provider, "incomplete OAuth client configuration ignored");
                    None
                }
            }
        })
        .collect()
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!("{name} must not be empty")));
    }

    Ok(value)
}
