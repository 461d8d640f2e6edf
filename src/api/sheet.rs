//! Implements the `Ledger` trait against the Google Sheets v4 REST API.

use crate::api::Ledger;
use crate::auth::Auth;
use crate::error::LedgerError;
use crate::model::{Expense, FIRST_DATA_ROW};
use crate::Config;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the Google Sheets REST endpoints with a bearer token from the
/// stored credential. A missing or expired credential short-circuits every
/// call to `Unauthorized` without touching the network.
pub(super) struct GoogleLedger {
    config: Config,
    auth: Auth,
    client: reqwest::Client,
}

/// Response body of `values.get`.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// The slice of a `spreadsheets.get` response we need for sheetId lookup.
#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl GoogleLedger {
    pub(super) fn new(config: Config, auth: Auth) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            config,
            auth,
            client,
        }
    }

    async fn token(&self) -> Result<String, LedgerError> {
        self.auth
            .bearer_token()
            .await
            .ok_or(LedgerError::Unauthorized)
    }

    /// Resolves the numeric sheetId of the ledger tab, needed by the
    /// row-deletion request.
    async fn sheet_id(&self, token: &str) -> Result<i64, LedgerError> {
        let url = format!(
            "{SHEETS_BASE}/{}?fields=sheets.properties",
            self.config.spreadsheet_id()
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        let body: SpreadsheetResponse = response.json().await.map_err(map_body)?;

        body.sheets
            .into_iter()
            .find(|s| s.properties.title == self.config.tab_name())
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| {
                LedgerError::Remote(format!("tab '{}' not found", self.config.tab_name()))
            })
    }
}

#[async_trait::async_trait]
impl Ledger for GoogleLedger {
    async fn read_all(&mut self) -> Result<Vec<Expense>, LedgerError> {
        trace!("read_all from tab {}", self.config.tab_name());
        let token = self.token().await?;
        let url = format!(
            "{SHEETS_BASE}/{}/values/{}!A2:E",
            self.config.spreadsheet_id(),
            self.config.tab_name(),
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        let body: ValuesResponse = response.json().await.map_err(map_body)?;

        Ok(body
            .values
            .iter()
            .enumerate()
            .map(|(ix, row)| Expense::from_row(ix as u32 + FIRST_DATA_ROW, row))
            .collect())
    }

    async fn append(&mut self, expense: &Expense) -> Result<(), LedgerError> {
        trace!("append to tab {}", self.config.tab_name());
        let token = self.token().await?;
        let url = format!(
            "{SHEETS_BASE}/{}/values/{}!A:E:append",
            self.config.spreadsheet_id(),
            self.config.tab_name(),
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&serde_json::json!({ "values": [expense.to_row()] }))
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_at(&mut self, position: u32) -> Result<(), LedgerError> {
        trace!("delete_at position {position}");
        let token = self.token().await?;
        let sheet_id = self.sheet_id(&token).await?;
        let url = format!(
            "{SHEETS_BASE}/{}:batchUpdate",
            self.config.spreadsheet_id()
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": position - 1,
                            "endIndex": position,
                        }
                    }
                }]
            }))
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response).await?;
        Ok(())
    }
}

/// A transport-level failure: the remote was never reached.
fn map_transport(e: reqwest::Error) -> LedgerError {
    LedgerError::Unreachable(e.to_string())
}

/// A failure reading or parsing a response body we already received.
fn map_body(e: reqwest::Error) -> LedgerError {
    LedgerError::Remote(e.to_string())
}

/// Maps HTTP statuses onto the error taxonomy. 401 and 403 both mean the
/// credential is no longer good for this sheet.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(LedgerError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LedgerError::Remote(format!("{status}: {body}")));
    }
    Ok(response)
}
