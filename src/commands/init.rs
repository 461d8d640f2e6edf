//! The init command handler.

use crate::args::InitArgs;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::bail;
use std::path::Path;

/// Creates the data directory and the initial configuration file.
pub async fn init(home: &Path, args: InitArgs) -> Result<Out<String>> {
    let [first, second] = args.participants.as_slice() else {
        bail!("Exactly two participant names are required, e.g. --participants Gigi Luke");
    };

    let config = Config::create(
        home,
        &args.sheet_url,
        &args.tab,
        (first.clone(), second.clone()),
    )
    .await?;

    let message = format!(
        "Initialized splitsheet home at {} for {} and {}. Next: 'splitsheet auth login'.",
        config.root().display(),
        first,
        second,
    );
    let root = config.root().display().to_string();
    Ok(Out::new(message, root))
}
