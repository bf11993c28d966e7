//! Mints a bearer token for an identity.
//!
//! Usage: `issue_token <id> <name> <department> <role>`

use std::env;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use iaoms::{auth::jwt::JwtService, config::AppConfig, submission::Submitter};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let [id, name, department, role] = args.as_slice() else {
        bail!("usage: issue_token <id> <name> <department> <role>");
    };

    let config = AppConfig::from_env()?;
    let jwt = JwtService::from_config(&config)?;
    let identity = Submitter {
        id: id.clone(),
        name: name.clone(),
        department: department.clone(),
        role: role.clone(),
    };
    let token = jwt.generate_token(&identity)?;
    tracing::info!(
        subject = %identity.id,
        expires_in_minutes = config.jwt_expiry_minutes,
        "issued token"
    );
    println!("{token}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
