mod database;
mod email;
mod state_builder;

pub use database::connect_and_migrate;
pub use state_builder::{StorePorts, build_app_state};

#[cfg(test)]
pub(crate) use state_builder::{ServiceAdapters, assemble_app_state};
