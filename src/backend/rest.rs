//! REST implementation of the [`Backend`] trait.
//!
//! Talks to the companion HTTP API: `GET/POST api/modes/`,
//! `PUT/DELETE api/modes/{id}/`, and the same shape under `api/tasks/`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use super::{Backend, BackendError, ModeDto, TaskDto};
use crate::config::BackendConfig;

/// HTTP client for the remote task/mode service.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(BackendError::Auth(format!("{} from {}", status, response.url())))
            }
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(response.url().to_string())),
            _ => Err(BackendError::Other(format!("{} from {}", status, response.url()))),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::InvalidData(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            BackendError::Network(err.to_string())
        } else {
            BackendError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn list_modes(&self) -> Result<Vec<ModeDto>, BackendError> {
        let response = self.client.get(self.url("api/modes/")).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn create_mode(&self, mode: ModeDto) -> Result<ModeDto, BackendError> {
        let response = self.client.post(self.url("api/modes/")).json(&mode).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn update_mode(&self, remote_id: i32, mode: ModeDto) -> Result<ModeDto, BackendError> {
        let response = self
            .client
            .put(self.url(&format!("api/modes/{remote_id}/")))
            .json(&mode)
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn delete_mode(&self, remote_id: i32) -> Result<(), BackendError> {
        let response = self.client.delete(self.url(&format!("api/modes/{remote_id}/"))).send().await?;
        Self::check(response)?;
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<TaskDto>, BackendError> {
        let response = self.client.get(self.url("api/tasks/")).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn create_task(&self, task: TaskDto) -> Result<TaskDto, BackendError> {
        let response = self.client.post(self.url("api/tasks/")).json(&task).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn update_task(&self, remote_id: i32, task: TaskDto) -> Result<TaskDto, BackendError> {
        let response = self
            .client
            .put(self.url(&format!("api/tasks/{remote_id}/")))
            .json(&task)
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn delete_task(&self, remote_id: i32) -> Result<(), BackendError> {
        let response = self.client.delete(self.url(&format!("api/tasks/{remote_id}/"))).send().await?;
        Self::check(response)?;
        Ok(())
    }
}
