//! Mod listing fetch and version gate
//!
//! The listing is a JSON document of the form `{"version": 1, "mods": [...]}`. Listings
//! newer than [`SUPPORTED_LISTING_VERSION`] are rejected so that an old installer does
//! not misinterpret a format it does not know. A listing without a version is accepted
//! with a warning.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Highest listing version this installer understands
pub const SUPPORTED_LISTING_VERSION: u64 = 1;

/// One entry of the mod listing
///
/// Only the fields the installer itself reads are typed; everything else is kept
/// verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModEntry {
    /// Display name of the mod
    #[serde(default)]
    pub name: Option<String>,
    /// Game this mod applies to
    pub target: String,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parse a listing body and apply the version gate
///
/// # Errors
///
/// - [`Error::ManifestOutdated`] if the listing is newer than this installer
/// - [`Error::Manifest`] if the version is not a number or no mod list is present
/// - [`Error::Serialization`] if the body is not JSON or entries are malformed
pub fn parse_mod_listing(body: &str) -> Result<Vec<ModEntry>> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    match value.get("version") {
        Some(version) => {
            let found = version
                .as_u64()
                .ok_or_else(|| Error::Manifest(format!("version is not a number: {}", version)))?;
            if found > SUPPORTED_LISTING_VERSION {
                return Err(Error::ManifestOutdated {
                    supported: SUPPORTED_LISTING_VERSION,
                    found,
                });
            }
        }
        None => warn!("the mod info listing is missing a version number, things might not work"),
    }

    let mods = match value {
        serde_json::Value::Object(mut map) => map
            .remove("mods")
            .ok_or_else(|| Error::Manifest("listing has no \"mods\" array".to_string()))?,
        // Unversioned listings may be the bare array
        array @ serde_json::Value::Array(_) => array,
        other => {
            return Err(Error::Manifest(format!(
                "expected an object or array, got {}",
                other
            )));
        }
    };

    let mods: Vec<ModEntry> = serde_json::from_value(mods)?;
    debug!(count = mods.len(), "parsed mod listing");
    Ok(mods)
}

/// Download and parse the mod listing at `url`
///
/// The request is sent with an empty `User-Agent`, which the listing server expects.
pub async fn fetch_mod_list(client: &reqwest::Client, url: &str) -> Result<Vec<ModEntry>> {
    let body = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_mod_listing(&body)
}

/// Distinct games that have at least one mod, sorted
#[must_use]
pub fn supported_games(mods: &[ModEntry]) -> Vec<String> {
    mods.iter()
        .map(|m| m.target.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"{
        "version": 1,
        "mods": [
            {"name": "Voice Patch", "target": "Onikakushi", "submods": [{"name": "full"}]},
            {"name": "Voice Patch", "target": "Watanagashi"},
            {"name": "Graphics Patch", "target": "Onikakushi"}
        ]
    }"#;

    #[test]
    fn parses_versioned_listing() {
        let mods = parse_mod_listing(LISTING).unwrap();
        assert_eq!(mods.len(), 3);
        assert_eq!(mods[0].name.as_deref(), Some("Voice Patch"));
        assert!(mods[0].extra.contains_key("submods"));
    }

    #[test]
    fn newer_listing_is_rejected() {
        let err = parse_mod_listing(r#"{"version": 2, "mods": []}"#).unwrap_err();
        match err {
            Error::ManifestOutdated { supported, found } => {
                assert_eq!(supported, 1);
                assert_eq!(found, 2);
            }
            other => panic!("Expected ManifestOutdated, got: {:?}", other),
        }
    }

    #[test]
    fn missing_version_is_accepted() {
        let mods = parse_mod_listing(r#"{"mods": [{"target": "Tatarigoroshi"}]}"#).unwrap();
        assert_eq!(mods[0].target, "Tatarigoroshi");

        let bare = parse_mod_listing(r#"[{"target": "Himatsubushi"}]"#).unwrap();
        assert_eq!(bare[0].target, "Himatsubushi");
    }

    #[test]
    fn non_numeric_version_is_rejected() {
        let err = parse_mod_listing(r#"{"version": "one", "mods": []}"#).unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn object_without_mods_is_rejected() {
        let err = parse_mod_listing(r#"{"version": 1}"#).unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn games_are_deduplicated_and_sorted() {
        let mods = parse_mod_listing(LISTING).unwrap();
        assert_eq!(supported_games(&mods), vec!["Onikakushi", "Watanagashi"]);
    }

    #[tokio::test]
    async fn fetches_listing_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mods.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let mods = fetch_mod_list(&client, &format!("{}/mods.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(mods.len(), 3);
    }

    #[tokio::test]
    async fn http_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_mod_list(&client, &format!("{}/mods.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
