//! Auth command handlers.

use crate::args::LoginArgs;
use crate::auth::Auth;
use crate::commands::Out;
use crate::{Config, Result};

/// Stores a bearer token for the Sheets API.
pub async fn auth_login(config: &Config, args: LoginArgs) -> Result<Out<()>> {
    let auth = Auth::new(config.token_path());
    auth.save_token(&args.token, args.expires_in).await?;
    Ok(Out::new_message(format!(
        "Token stored; expires in {} seconds",
        args.expires_in
    )))
}

/// Reports whether a usable token is stored.
pub async fn auth_status(config: &Config) -> Result<Out<String>> {
    let auth = Auth::new(config.token_path());
    let message = match auth.expiry().await {
        Some(expiry) if auth.is_authorized().await => {
            format!("Authorized; token expires at {expiry}")
        }
        Some(expiry) => format!(
            "Stored token is expired or expiring (expiry {expiry}); run 'splitsheet auth login'"
        ),
        None => "Not authorized; run 'splitsheet auth login'".to_string(),
    };
    Ok(Out::new(message.clone(), message))
}

/// Discards the stored token.
pub async fn auth_signout(config: &Config) -> Result<Out<()>> {
    let auth = Auth::new(config.token_path());
    auth.sign_out().await?;
    Ok(Out::new_message("Signed out"))
}
