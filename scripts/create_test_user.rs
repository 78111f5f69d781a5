//! Inserts the sample `testuser` account straight into the document store.
//!
//! Reads `MONGODB_URL` / `CRM_DATA_DIR` (a `.env` file is honoured). Exits
//! with status 1 when the store cannot be opened or the account exists.
//!
//! Run: cargo run --bin create_test_user

use estate_crm::admin;
use estate_crm::config::{DbConfig, LogConfig};
use estate_crm::logging;
use estate_crm::storage::Store;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _guard = logging::init(&LogConfig::from_env());

    let db = DbConfig::from_env();
    let created = Store::open(&db.path).and_then(|store| admin::create_test_user(&store));

    match created {
        Ok(creds) => {
            println!("Test user created successfully!");
            println!("Username: {}", creds.username);
            println!("Password: {}", creds.password);
            println!("Email: {}", creds.email);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(url = %db.url, error = %err, "failed to create test user");
            ExitCode::FAILURE
        }
    }
}
