//! Mint an access token for local testing.
//!
//! Usage: `issue-token <account-id> <role>`. Reads `JWT_SECRET` (and `.env`).

use server::auth::JwtKeys;
use shared_types::{Actor, Role};

fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let id = args.next().and_then(|v| v.parse::<i64>().ok()).unwrap_or(1);
    let role = args.next().unwrap_or_else(|| "citizen".to_string());

    let Some(role) = Role::parse(&role) else {
        eprintln!("Unknown role '{role}'; expected citizen, police, court or admin");
        std::process::exit(2);
    };

    let keys = match JwtKeys::from_env() {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("{}", e.message);
            std::process::exit(1);
        }
    };

    match keys.create_access_token(Actor::new(id, role)) {
        Ok(token) => println!("{token}"),
        Err(e) => {
            eprintln!("Failed to sign token: {e}");
            std::process::exit(1);
        }
    }
}
