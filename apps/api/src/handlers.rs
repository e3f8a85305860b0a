pub mod admin;
pub mod connections;
pub mod health;
pub mod oauth;
pub mod tokens;

use std::str::FromStr;

use tessera_core::AppError;
use tessera_domain::Provider;

fn parse_provider(value: &str) -> Result<Provider, AppError> {
    Provider::from_str(value.trim())
}
