use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6806";

#[derive(Debug, Error)]
pub enum SiyuanError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("kernel answered {endpoint} with code {code}: {msg}")]
    Kernel {
        endpoint: &'static str,
        code: i64,
        msg: String,
    },
    #[error("kernel response for {0} carried no data")]
    MissingData(&'static str),
}

/// Client for the document tree endpoints of a running SiYuan kernel.
#[derive(Clone)]
pub struct SiyuanClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl SiyuanClient {
    pub fn new(token: Option<String>) -> Result<Self, SiyuanError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self, SiyuanError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.filter(|value| !value.is_empty()),
        })
    }

    /// Ids of every document at human-readable path `hpath` in `notebook`.
    pub async fn ids_by_hpath(
        &self,
        notebook: &str,
        hpath: &str,
    ) -> Result<Vec<String>, SiyuanError> {
        let ids: Option<Vec<String>> = self
            .call(
                "/api/filetree/getIDsByHPath",
                &NotebookPath {
                    notebook,
                    path: hpath,
                },
            )
            .await?;
        Ok(ids.unwrap_or_default())
    }

    /// Storage path (`/<id>/<id>.sy` style) of the document with `id`.
    pub async fn path_by_id(&self, id: &str) -> Result<String, SiyuanError> {
        const ENDPOINT: &str = "/api/filetree/getPathByID";
        let data: Option<PathByIdData> = self.call(ENDPOINT, &DocumentId { id }).await?;
        match data.ok_or(SiyuanError::MissingData(ENDPOINT))? {
            PathByIdData::Plain(path) => Ok(path),
            PathByIdData::Located { path } => Ok(path),
        }
    }

    /// Creates a document from markdown and returns its id.
    pub async fn create_doc_with_md(
        &self,
        notebook: &str,
        hpath: &str,
        markdown: &str,
    ) -> Result<String, SiyuanError> {
        const ENDPOINT: &str = "/api/filetree/createDocWithMd";
        let id: Option<String> = self
            .call(
                ENDPOINT,
                &CreateDoc {
                    notebook,
                    path: hpath,
                    markdown,
                },
            )
            .await?;
        id.ok_or(SiyuanError::MissingData(ENDPOINT))
    }

    pub async fn remove_doc(&self, notebook: &str, path: &str) -> Result<(), SiyuanError> {
        let _: Option<serde::de::IgnoredAny> = self
            .call("/api/filetree/removeDoc", &NotebookPath { notebook, path })
            .await?;
        Ok(())
    }

    async fn call<B, T>(&self, endpoint: &'static str, body: &B) -> Result<Option<T>, SiyuanError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(endpoint)?;
        let mut request = self.http.post(url).json(body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {token}"));
        }
        let response = request.send().await?;
        let envelope: KernelResponse<T> = Self::handle_response(response).await?;
        if envelope.code != 0 {
            return Err(SiyuanError::Kernel {
                endpoint,
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        Ok(envelope.data)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SiyuanError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SiyuanError::Api { status, body })
        }
    }
}

#[derive(Debug, Deserialize)]
struct KernelResponse<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathByIdData {
    Plain(String),
    Located { path: String },
}

#[derive(Debug, Serialize)]
struct NotebookPath<'a> {
    notebook: &'a str,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct DocumentId<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateDoc<'a> {
    notebook: &'a str,
    path: &'a str,
    markdown: &'a str,
}
