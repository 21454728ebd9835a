//! `verify` command: check Instagram credentials before a full run.

use pulse_core::{AppConfig, InstagramCredentials};
use pulse_sentiment::{Aggregator, CredentialCheck};

/// Verify the Instagram token and report whether comments are readable.
///
/// # Errors
///
/// Returns an error if the client cannot be built or Instagram rejects the
/// credentials.
pub(crate) async fn run_verify(
    config: &AppConfig,
    creds: &InstagramCredentials,
) -> anyhow::Result<()> {
    let aggregator = Aggregator::from_config(config)?;
    let check = aggregator.instagram().verify(creds).await?;
    println!("{}", describe_check(&check));
    Ok(())
}

fn describe_check(check: &CredentialCheck) -> String {
    let account = match &check.username {
        Some(name) => format!("@{name} ({})", check.account_id),
        None => check.account_id.clone(),
    };
    let permission = match check.comment_permission {
        Some(true) => "granted",
        Some(false) => "missing",
        None => "unknown",
    };
    let mut lines = vec![
        format!("credentials valid for {account}"),
        format!("comment permission: {permission}"),
    ];
    lines.extend(check.warnings.iter().map(|w| format!("! {}", w.message)));
    lines.join("\n")
}
