//! Instruqt GraphQL client
//!
//! Lists the team's tracks and creates track invites. One HTTP request per
//! GraphQL operation, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CatalogError, InviteIssuer, LabDirectory, Result};
use crate::types::Lab;

const LIST_TRACKS_QUERY: &str = r#"
query ListTracks($teamSlug: String!) {
  tracks(teamSlug: $teamSlug) {
    id
    slug
    title
    description
  }
}"#;

const TRACK_BY_SLUG_QUERY: &str = r#"
query TrackBySlug($teamSlug: String!, $trackSlug: String!) {
  track(teamSlug: $teamSlug, trackSlug: $trackSlug) {
    id
    slug
    title
  }
}"#;

const CREATE_INVITE_MUTATION: &str = r#"
mutation CreateTrackInvite($invite: TrackInviteInput!) {
  createTrackInvite(trackInvite: $invite) {
    id
  }
}"#;

/// Connection settings for the Instruqt API.
#[derive(Debug, Clone)]
pub struct InstruqtConfig {
    pub api_url: String,
    pub api_token: String,
    pub team_slug: String,
    /// Base of the player UI, e.g. `https://play.instruqt.com`.
    pub play_url: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct InstruqtClient {
    client: Client,
    config: InstruqtConfig,
}

impl InstruqtClient {
    pub fn new(config: InstruqtConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn team_slug(&self) -> &str {
        &self.config.team_slug
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: truncate(&text, 500),
            });
        }

        decode_envelope(&text)
    }

    fn invite_url(&self, invite_id: &str) -> String {
        format!(
            "{}/{}/invite/{}",
            self.config.play_url.trim_end_matches('/'),
            self.config.team_slug,
            invite_id
        )
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Unwrap a GraphQL response body. Any entry in `errors` fails the call,
/// even when partial `data` came back.
fn decode_envelope<T: DeserializeOwned>(text: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(text)
        .map_err(|e| CatalogError::Malformed(format!("{}: {}", e, truncate(text, 200))))?;

    if !envelope.errors.is_empty() {
        return Err(CatalogError::GraphQl(
            envelope.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    envelope
        .data
        .ok_or_else(|| CatalogError::Malformed("response has neither data nor errors".into()))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TracksData {
    tracks: Vec<Lab>,
}

#[derive(Debug, Deserialize)]
struct TrackRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TrackData {
    track: Option<TrackRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInviteData {
    create_track_invite: InviteRef,
}

#[derive(Debug, Deserialize)]
struct InviteRef {
    id: String,
}

#[async_trait]
impl LabDirectory for InstruqtClient {
    async fn list_labs(&self) -> Result<Vec<Lab>> {
        let data: TracksData = self
            .execute(
                LIST_TRACKS_QUERY,
                json!({ "teamSlug": &self.config.team_slug }),
            )
            .await?;
        tracing::debug!(count = data.tracks.len(), "fetched tracks");
        Ok(data.tracks)
    }
}

#[async_trait]
impl InviteIssuer for InstruqtClient {
    async fn create_invite(&self, slug: &str) -> Result<String> {
        let data: TrackData = self
            .execute(
                TRACK_BY_SLUG_QUERY,
                json!({ "teamSlug": &self.config.team_slug, "trackSlug": slug }),
            )
            .await?;
        let track = data
            .track
            .ok_or_else(|| CatalogError::UnknownTrack(slug.to_string()))?;

        let data: CreateInviteData = self
            .execute(
                CREATE_INVITE_MUTATION,
                json!({
                    "invite": {
                        "title": format!("lab-router: {}", slug),
                        "publicTitle": slug,
                        "trackIDs": [track.id],
                        "inviteLimit": 1
                    }
                }),
            )
            .await?;

        let url = self.invite_url(&data.create_track_invite.id);
        tracing::info!(slug, invite_url = %url, "created invite");
        Ok(url)
    }
}
