//! Ledger assets: the native token or an issued credit asset.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::ledger::strkey;

/// An asset as carried in operations and trustlines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    /// The network's native token.
    Native,
    /// An issued asset, identified by code and issuing account.
    Credit { code: String, issuer: String },
}

impl Asset {
    /// Build a credit asset, validating code and issuer shape.
    pub fn credit(code: &str, issuer: &str) -> Result<Self> {
        validate_asset_code(code)?;
        strkey::decode_account_id(issuer)?;
        Ok(Asset::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        })
    }

    /// Parse `"XLM"`/`"native"` or `"CODE:ISSUER"` notation.
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("native") || s == "XLM" {
            return Ok(Asset::Native);
        }
        match s.split_once(':') {
            Some((code, issuer)) => Asset::credit(code, issuer),
            None => Err(EngineError::Validation(format!(
                "invalid asset '{}': expected 'native', 'XLM' or 'CODE:ISSUER'",
                s
            ))),
        }
    }

    /// True for the native token.
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// True if a ledger operation record with these fields is this asset.
    ///
    /// `asset_type` is the Horizon discriminator (`native`,
    /// `credit_alphanum4`, `credit_alphanum12`).
    pub fn matches_record(
        &self,
        asset_type: &str,
        asset_code: Option<&str>,
        asset_issuer: Option<&str>,
    ) -> bool {
        match self {
            Asset::Native => asset_type == "native",
            Asset::Credit { code, issuer } => {
                asset_type.starts_with("credit_alphanum")
                    && asset_code == Some(code.as_str())
                    && asset_issuer == Some(issuer.as_str())
            }
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Credit { code, issuer } => write!(f, "{}:{}", code, issuer),
        }
    }
}

/// Validate an issued-asset code: 1–12 alphanumeric ASCII characters.
pub fn validate_asset_code(code: &str) -> Result<()> {
    if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(EngineError::Validation(format!(
            "invalid asset code '{}': expected 1-12 alphanumeric characters",
            code
        )));
    }
    Ok(())
}
