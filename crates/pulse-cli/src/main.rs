mod analyze;
mod verify;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pulse-cli")]
#[command(about = "Aggregate and score social media sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch both providers, score every text and print the merged report
    Analyze {
        #[command(flatten)]
        instagram: InstagramArgs,

        /// Bearer token for the social search API
        #[arg(long, env = "SEARCH_BEARER_TOKEN", hide_env_values = true)]
        search_bearer_token: Option<String>,

        /// Search query (defaults to `PULSE_DEFAULT_QUERY`)
        #[arg(long)]
        query: Option<String>,

        /// Number of search results to request (defaults to `PULSE_DEFAULT_RESULT_COUNT`)
        #[arg(long)]
        count: Option<u32>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check Instagram credentials and comment-read permission
    Verify {
        #[command(flatten)]
        instagram: InstagramArgs,
    },
}

#[derive(Debug, Args)]
struct InstagramArgs {
    /// Instagram user id whose media is analyzed
    #[arg(long, env = "INSTAGRAM_USER_ID")]
    instagram_user_id: Option<String>,

    /// Instagram Graph API access token
    #[arg(long, env = "INSTAGRAM_ACCESS_TOKEN", hide_env_values = true)]
    instagram_access_token: Option<String>,
}

impl InstagramArgs {
    fn credentials(&self) -> Option<pulse_core::InstagramCredentials> {
        match (&self.instagram_user_id, &self.instagram_access_token) {
            (Some(id), Some(token)) => Some(pulse_core::InstagramCredentials::new(id, token)),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze {
            instagram,
            search_bearer_token,
            query,
            count,
            json,
        }) => {
            let request = pulse_sentiment::AggregateRequest {
                instagram: instagram.credentials(),
                search: search_bearer_token.map(pulse_core::SearchCredentials::new),
                query: query.unwrap_or_else(|| config.default_query.clone()),
                count: count.unwrap_or(config.default_result_count),
            };
            analyze::run_analyze(&config, &request, json).await?;
        }
        Some(Commands::Verify { instagram }) => {
            let creds = instagram.credentials().ok_or_else(|| {
                anyhow::anyhow!(
                    "Instagram credentials not provided; set INSTAGRAM_USER_ID and INSTAGRAM_ACCESS_TOKEN"
                )
            })?;
            verify::run_verify(&config, &creds).await?;
        }
        None => println!("pulse-cli ready; run `pulse-cli analyze --help`"),
    }

    Ok(())
}
