//! Configuration file handling.
//!
//! Configuration is stored at `$SPLITSHEET_HOME/config.json`: the Google
//! Sheet URL, the name of the ledger tab, and the two participant names.
//! The `Config` object also provides the paths to everything else that
//! lives in the data directory.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "splitsheet";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CONFIG_JSON: &str = "config.json";
const TOKEN_JSON: &str = "token.json";

/// Represents the app's data directory. Instantiate it with the path to
/// `$SPLITSHEET_HOME`; from there it loads `config.json` and hands out the
/// paths to the other files expected in the directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that becomes the data directory root, e.g.
    ///   `$HOME/splitsheet`
    /// - `sheet_url` - The URL of the Google Sheet holding the ledger, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    /// - `tab_name` - The ledger tab within the sheet
    /// - `participants` - The two people sharing expenses
    pub async fn create(
        dir: impl Into<PathBuf>,
        sheet_url: &str,
        tab_name: &str,
        participants: (String, String),
    ) -> Result<Self> {
        if participants.0.trim().is_empty() || participants.1.trim().is_empty() {
            bail!("Both participant names are required");
        }
        if participants.0 == participants.1 {
            bail!("The two participant names must differ");
        }

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the splitsheet home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: sheet_url.to_string(),
            tab_name: tab_name.to_string(),
            participants,
        };
        config_file.save(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// Validates that the home directory and config file exist, loads the
    /// config file, and returns the loaded configuration object.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Splitsheet home is missing; run 'splitsheet init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn tab_name(&self) -> &str {
        &self.config_file.tab_name
    }

    /// The two participant names.
    pub fn participants(&self) -> (&str, &str) {
        (
            &self.config_file.participants.0,
            &self.config_file.participants.1,
        )
    }

    /// True when `name` is one of the configured participants.
    pub fn is_participant(&self, name: &str) -> bool {
        let (a, b) = self.participants();
        name == a || name == b
    }

    /// Where the bearer token lives.
    pub fn token_path(&self) -> PathBuf {
        self.secrets.join(TOKEN_JSON)
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "splitsheet",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "tab_name": "Expenses",
///   "participants": ["Gigi", "Luke"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "splitsheet"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the Google Sheet holding the ledger
    sheet_url: String,

    /// Name of the ledger tab within the sheet
    #[serde(default = "default_tab_name")]
    tab_name: String,

    /// The two people sharing expenses
    participants: (String, String),
}

fn default_tab_name() -> String {
    "Expenses".to_string()
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL.
///
/// URL format: `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`,
/// possibly with query parameters or fragments after the ID. Returns an
/// empty string for an empty URL.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    if url.is_empty() {
        return Ok(url);
    }

    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn participants() -> (String, String) {
        ("Gigi".to_string(), "Luke".to_string())
    }

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("splitsheet_home");
        let sheet_url =
            "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

        let config = Config::create(&home, sheet_url, "Expenses", participants())
            .await
            .unwrap();
        assert_eq!(sheet_url, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!(config.tab_name(), "Expenses");
        assert_eq!(config.participants(), ("Gigi", "Luke"));
        assert!(config.token_path().starts_with(config.root()));

        let reloaded = Config::load(&home).await.unwrap();
        assert_eq!(reloaded.spreadsheet_id(), config.spreadsheet_id());
        assert_eq!(reloaded.participants(), ("Gigi", "Luke"));
    }

    #[tokio::test]
    async fn test_config_load_missing_home_fails() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_rejects_bad_participants() {
        let dir = TempDir::new().unwrap();
        let url = "https://docs.google.com/spreadsheets/d/ABC123";
        let result = Config::create(
            dir.path().join("a"),
            url,
            "Expenses",
            ("Gigi".to_string(), "Gigi".to_string()),
        )
        .await;
        assert!(result.is_err());

        let result = Config::create(
            dir.path().join("b"),
            url,
            "Expenses",
            ("".to_string(), "Luke".to_string()),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_file_rejects_wrong_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test",
            "participants": ["Gigi", "Luke"]
        }"#;
        tokio::fs::write(&path, json).await.unwrap();

        let result = ConfigFile::load(&path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_tab_name_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "splitsheet",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test",
            "participants": ["Gigi", "Luke"]
        }"#;
        tokio::fs::write(&path, json).await.unwrap();

        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config.tab_name, "Expenses");
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
        assert_eq!(
            extract_spreadsheet_id(url).unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );

        let with_query = "https://docs.google.com/spreadsheets/d/ABC123?foo=bar";
        assert_eq!(extract_spreadsheet_id(with_query).unwrap(), "ABC123");

        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert_eq!(extract_spreadsheet_id("").unwrap(), "");
    }
}
