use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://dinoai.chatgo.pro";
pub const SUCCESS_CODE: &str = "000000";

const NOTES_ENDPOINT: &str = "/openapi/v4/notes";

#[derive(Debug, Error)]
pub enum DinoxError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("api answered with code {code}: {}", msg.as_deref().unwrap_or("no message"))]
    Application { code: String, msg: Option<String> },
}

#[derive(Clone)]
pub struct DinoxClient {
    http: Client,
    base_url: Url,
}

impl DinoxClient {
    pub fn new() -> Result<Self, DinoxError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, DinoxError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Fetches every note changed since `last_sync_time`, grouped by day.
    ///
    /// The template travels with the request so the service can render
    /// each note's `content` before answering. `token` is sent verbatim.
    pub async fn fetch_notes(
        &self,
        token: &str,
        template: &str,
        last_sync_time: &str,
    ) -> Result<Vec<DayNote>, DinoxError> {
        let url = self.base_url.join(NOTES_ENDPOINT)?;
        let request = FetchRequest {
            template,
            note_id: 0,
            last_sync_time,
        };
        let response = self
            .http
            .post(url)
            .header("Authorization", token)
            .json(&request)
            .send()
            .await?;
        let payload: NotesResponse = Self::handle_response(response).await?;
        if payload.code != SUCCESS_CODE {
            return Err(DinoxError::Application {
                code: payload.code,
                msg: payload.msg,
            });
        }
        Ok(payload.data.unwrap_or_default())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DinoxError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DinoxError::Api { status, body })
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest<'a> {
    pub template: &'a str,
    pub note_id: u32,
    pub last_sync_time: &'a str,
}

#[derive(Debug, Deserialize)]
struct NotesResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Vec<DayNote>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DayNote {
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub create_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_del: bool,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub note_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_url: String,
}

impl Note {
    /// Name of the note's document inside its day folder.
    pub fn identity(&self) -> &str {
        if self.title.is_empty() {
            &self.note_id
        } else {
            &self.title
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
