//! authn demo
//!
//! Verifies an identity token against an issuer, or reads an account over
//! the admin back-channel.
//!
//! ```text
//! authn-demo verify --issuer https://authn.example.com --audience app.example.com <TOKEN>
//! authn-demo account --issuer https://authn.example.com --audience app.example.com \
//!     --username admin --password secret --id 42
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=authn_client=debug` to follow key
//! fetches and cache hits.

use anyhow::Context;
use authn_client::{AuthnClient, AuthnConfig, DEFAULT_KEYCHAIN_TTL};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Identity-token verification and account lookup against an authn issuer
#[derive(Parser, Debug)]
#[command(name = "authn-demo", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a token and print its subject
    Verify {
        #[command(flatten)]
        issuer: IssuerArgs,

        /// Print every claim as JSON instead of only the subject
        #[arg(long)]
        claims: bool,

        /// Identity token
        token: String,
    },

    /// Print an account
    Account {
        #[command(flatten)]
        issuer: IssuerArgs,

        /// Account ID
        #[arg(long)]
        id: String,
    },
}

#[derive(Args, Debug)]
struct IssuerArgs {
    /// Issuer base URL; also the expected `iss`
    #[arg(long, env = "AUTHN_ISSUER")]
    issuer: String,

    /// Expected audience
    #[arg(long, env = "AUTHN_AUDIENCE")]
    audience: String,

    /// Base URL for private endpoints, if different from the issuer
    #[arg(long, env = "AUTHN_PRIVATE_BASE_URL")]
    private_base_url: Option<String>,

    /// Minutes to keep fetched keys
    #[arg(long, default_value_t = DEFAULT_KEYCHAIN_TTL)]
    keychain_ttl: u64,

    /// HTTP Basic username for admin calls
    #[arg(long, env = "AUTHN_USERNAME", default_value = "")]
    username: String,

    /// HTTP Basic password for admin calls
    #[arg(long, env = "AUTHN_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
}

impl IssuerArgs {
    fn into_config(self) -> AuthnConfig {
        let mut config = AuthnConfig::new(self.issuer, self.audience)
            .with_credentials(self.username, self.password)
            .with_keychain_ttl(self.keychain_ttl);
        if let Some(url) = self.private_base_url {
            config = config.with_private_base_url(url);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Commands::Verify {
            issuer,
            claims,
            token,
        } => {
            let client = AuthnClient::new(issuer.into_config()).context("invalid configuration")?;
            let verified = client
                .verified_claims(&token)
                .await
                .context("token rejected")?;
            info!(subject = %verified.sub, "Token verified");
            if claims {
                println!("{}", serde_json::to_string_pretty(&verified)?);
            } else {
                println!("{}", verified.sub);
            }
        }
        Commands::Account { issuer, id } => {
            let client = AuthnClient::new(issuer.into_config()).context("invalid configuration")?;
            let account = client
                .admin()
                .get_account(&id)
                .await
                .with_context(|| format!("failed to read account {id}"))?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
    }

    Ok(())
}
