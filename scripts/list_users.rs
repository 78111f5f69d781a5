//! Prints every stored user as username / email / password hash.
//!
//! Failures are logged and the process still exits cleanly.
//!
//! Run: cargo run --bin list_users

use estate_crm::admin;
use estate_crm::config::{DbConfig, LogConfig};
use estate_crm::logging;
use estate_crm::storage::Store;
use tracing::error;

fn main() {
    dotenvy::dotenv().ok();
    let _guard = logging::init(&LogConfig::from_env());

    let db = DbConfig::from_env();
    match Store::open(&db.path).and_then(|store| admin::list_users(&store)) {
        Ok(users) => {
            println!("Users in database:");
            for user in users {
                println!(
                    "Username: {}, Email: {}, Password: {}",
                    user.username, user.email, user.password
                );
            }
        }
        Err(err) => error!(url = %db.url, error = %err, "failed to list users"),
    }
}
