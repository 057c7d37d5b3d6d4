use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form as ReqwestForm, Part as ReqwestPart};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::ACCEPT;
use reqwest::Url;

use crate::form::{FieldValue, MultipartForm};

#[derive(Debug, Clone)]
pub struct MultipartPost {
    pub url: Url,
    pub bearer_token: String,
    pub form: MultipartForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one multipart POST. An `Err` means nothing usable came back
/// (connect, timeout, body read); any HTTP status is an `Ok`.
pub trait HttpTransport: Send + Sync {
    fn post_multipart(&self, request: &MultipartPost) -> Result<HttpReply>;
}

pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_multipart(&self, request: &MultipartPost) -> Result<HttpReply> {
        let form = to_reqwest_form(&request.form)?;
        let response = self
            .http
            .post(request.url.clone())
            .bearer_auth(&request.bearer_token)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .with_context(|| format!("image API request failed ({})", request.url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .context("image API response body read failed")?
            .to_vec();
        Ok(HttpReply { status, body })
    }
}

fn to_reqwest_form(form: &MultipartForm) -> Result<ReqwestForm> {
    let mut out = ReqwestForm::new();
    for field in form.fields() {
        out = match &field.value {
            FieldValue::Text(text) => out.text(field.name.clone(), text.clone()),
            FieldValue::File {
                bytes,
                file_name,
                mime_type,
            } => {
                let part = ReqwestPart::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .with_context(|| format!("invalid mime type for {}: {mime_type}", field.name))?;
                out.part(field.name.clone(), part)
            }
        };
    }
    Ok(out)
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
