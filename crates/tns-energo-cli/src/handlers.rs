//! Command handlers for CLI subcommands
//!
//! Network commands receive an open [`Session`](tns_energo_core::Session);
//! each logs in first so the vendor issues its session cookie.

mod account;
mod completions;
mod config;
mod readings;
mod utils;

#[cfg(test)]
mod testing;

pub use account::{handle_accounts, handle_info, handle_login, handle_meters, handle_payments};
pub use completions::handle_completions;
pub use config::handle_config;
pub use readings::{handle_indications, handle_send};
pub use utils::open_session;
