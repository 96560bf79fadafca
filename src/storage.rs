//! Remote file-tree storage: the client contract, the browser `fetch` client, and an in-process
//! backend with the same semantics for tests.

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::ListingEntry;

/// Object-safe boxed future used by [`StorageClient`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("HTTP error! status: {status}{}", message_suffix(.message))]
    Status { status: u16, message: Option<String> },
    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Format(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(" ({message})"))
        .unwrap_or_default()
}

impl StorageError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: Some(message.into()),
        }
    }

    /// Backend-supplied message for status errors.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// CRUD over slash-delimited paths against the note backend.
pub trait StorageClient {
    /// Fetches the full recursive listing.
    fn list<'a>(&'a self) -> StorageFuture<'a, Result<Vec<ListingEntry>, StorageError>>;

    fn read_file<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<String, StorageError>>;

    /// Creates or overwrites a file.
    fn write_file<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>>;

    fn create_folder<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>>;

    /// Deletes a file or a folder; the backend tells them apart.
    fn delete<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>>;
}

#[derive(Serialize)]
struct WriteFileBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateFolderBody<'a> {
    path: &'a str,
}

#[derive(Deserialize)]
struct FileContentBody {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Browser client talking JSON to the note backend over `fetch`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpStorage {
    api_base: String,
}

impl HttpStorage {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    pub fn file_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.api_base, urlencoding::encode(path))
    }

    pub fn folders_url(&self) -> String {
        format!("{}/folders", self.api_base)
    }
}

#[cfg(target_arch = "wasm32")]
mod fetch {
    use serde::de::DeserializeOwned;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, Response};

    use super::{parse_error_message, StorageError};

    fn js_message(value: &JsValue) -> String {
        value
            .dyn_ref::<js_sys::Error>()
            .map(|err| String::from(err.message()))
            .or_else(|| value.as_string())
            .unwrap_or_else(|| format!("{value:?}"))
    }

    pub(super) async fn send(
        method: &str,
        url: &str,
        json_body: Option<String>,
    ) -> Result<Response, StorageError> {
        let transport = |err: JsValue| StorageError::Transport(js_message(&err));

        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = &json_body {
            init.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(url, &init).map_err(transport)?;
        if json_body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(transport)?;
        }

        let window = web_sys::window()
            .ok_or_else(|| StorageError::Transport("window unavailable".to_string()))?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(transport)?;
        value
            .dyn_into::<Response>()
            .map_err(|err| StorageError::Format(js_message(&err)))
    }

    pub(super) async fn json<T: DeserializeOwned>(response: &Response) -> Result<T, StorageError> {
        let format = |err: JsValue| StorageError::Format(js_message(&err));
        let promise = response.json().map_err(format)?;
        let value = JsFuture::from(promise).await.map_err(format)?;
        serde_wasm_bindgen::from_value(value).map_err(|err| StorageError::Format(err.to_string()))
    }

    pub(super) async fn text(response: &Response) -> Result<String, StorageError> {
        let format = |err: JsValue| StorageError::Format(js_message(&err));
        let promise = response.text().map_err(format)?;
        let value = JsFuture::from(promise).await.map_err(format)?;
        value
            .as_string()
            .ok_or_else(|| StorageError::Format("response body is not text".to_string()))
    }

    /// Turns a non-success response into a status error, reading `{error}` when the body has one.
    pub(super) async fn status_error(response: &Response) -> StorageError {
        let message = text(response)
            .await
            .ok()
            .and_then(|raw| parse_error_message(&raw));
        StorageError::Status {
            status: response.status(),
            message,
        }
    }

    pub(super) async fn expect_ok(response: Response) -> Result<(), StorageError> {
        if response.ok() {
            Ok(())
        } else {
            Err(status_error(&response).await)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn unavailable<T>() -> Result<T, StorageError> {
    Err(StorageError::Transport(
        "fetch is only available in the browser".to_string(),
    ))
}

impl StorageClient for HttpStorage {
    fn list<'a>(&'a self) -> StorageFuture<'a, Result<Vec<ListingEntry>, StorageError>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let response = fetch::send("GET", &self.files_url(), None).await?;
                if !response.ok() {
                    return Err(fetch::status_error(&response).await);
                }
                fetch::json(&response).await
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                unavailable()
            }
        })
    }

    fn read_file<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let response = fetch::send("GET", &self.file_url(path), None).await?;
                if !response.ok() {
                    return Err(fetch::status_error(&response).await);
                }
                parse_file_content(&fetch::text(&response).await?)
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = path;
                unavailable()
            }
        })
    }

    fn write_file<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let body = serde_json::to_string(&WriteFileBody { content })
                .map_err(|err| StorageError::Format(err.to_string()))?;

            #[cfg(target_arch = "wasm32")]
            {
                let response = fetch::send("POST", &self.file_url(path), Some(body)).await?;
                fetch::expect_ok(response).await
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = (path, body);
                unavailable()
            }
        })
    }

    fn create_folder<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let body = serde_json::to_string(&CreateFolderBody { path })
                .map_err(|err| StorageError::Format(err.to_string()))?;

            #[cfg(target_arch = "wasm32")]
            {
                let response = fetch::send("POST", &self.folders_url(), Some(body)).await?;
                fetch::expect_ok(response).await
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = body;
                unavailable()
            }
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                let response = fetch::send("DELETE", &self.file_url(path), None).await?;
                fetch::expect_ok(response).await
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = path;
                unavailable()
            }
        })
    }
}

/// Parses the `{content}` body of a file read; any other shape is a format error.
pub fn parse_file_content(raw: &str) -> Result<String, StorageError> {
    let body: FileContentBody =
        serde_json::from_str(raw).map_err(|err| StorageError::Format(err.to_string()))?;
    body.content
        .ok_or_else(|| StorageError::Format("No content in response".to_string()))
}

/// Extracts the backend's `{error}` message, if the body carries one.
pub fn parse_error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(raw)
        .ok()
        .and_then(|body| body.error)
}

/// Strips leading slashes and converts backslashes, as the note backend does before touching disk.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum MemoryEntry {
    File(String),
    Folder,
}

/// In-process backend with the note server's semantics, shared between clones.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, MemoryEntry>>>,
    failures: Rc<RefCell<VecDeque<StorageError>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next request fail with `err` instead of touching the tree.
    pub fn fail_next(&self, err: StorageError) {
        self.failures.borrow_mut().push_back(err);
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        match self.entries.borrow().get(&normalize_path(path)) {
            Some(MemoryEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(&normalize_path(path))
    }

    fn take_failure(&self) -> Result<(), StorageError> {
        match self.failures.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_parents(
        entries: &mut BTreeMap<String, MemoryEntry>,
        path: &str,
    ) -> Result<(), StorageError> {
        let mut prefix = String::new();
        let mut segments: Vec<&str> = path.split('/').collect();
        segments.pop();
        for segment in segments {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            match entries.get(&prefix) {
                Some(MemoryEntry::File(_)) => {
                    return Err(StorageError::status(500, format!("Not a directory: {prefix}")));
                }
                Some(MemoryEntry::Folder) => {}
                None => {
                    entries.insert(prefix.clone(), MemoryEntry::Folder);
                }
            }
        }
        Ok(())
    }

    fn listing_under(entries: &BTreeMap<String, MemoryEntry>, parent: &str) -> Vec<ListingEntry> {
        entries
            .iter()
            .filter(|(path, _)| parent_of(path) == parent)
            .map(|(path, entry)| {
                let name = path.rsplit('/').next().unwrap_or(path).to_string();
                match entry {
                    MemoryEntry::File(_) => ListingEntry::File {
                        name,
                        path: path.clone(),
                    },
                    MemoryEntry::Folder => ListingEntry::Directory {
                        name,
                        path: path.clone(),
                        children: Self::listing_under(entries, path),
                    },
                }
            })
            .collect()
    }
}

fn parent_of(path: &str) -> &str {
    path.rfind('/').map(|idx| &path[..idx]).unwrap_or("")
}

impl StorageClient for MemoryStorage {
    fn list<'a>(&'a self) -> StorageFuture<'a, Result<Vec<ListingEntry>, StorageError>> {
        Box::pin(async move {
            self.take_failure()?;
            Ok(Self::listing_under(&self.entries.borrow(), ""))
        })
    }

    fn read_file<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            self.take_failure()?;
            let path = normalize_path(path);
            if path.is_empty() {
                return Err(StorageError::status(400, "Path is not a file"));
            }
            match self.entries.borrow().get(&path) {
                Some(MemoryEntry::File(content)) => Ok(content.clone()),
                Some(MemoryEntry::Folder) => Err(StorageError::status(400, "Path is not a file")),
                None => Err(StorageError::status(404, "File not found")),
            }
        })
    }

    fn write_file<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
    ) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.take_failure()?;
            let path = normalize_path(path);
            let mut entries = self.entries.borrow_mut();
            if path.is_empty() || entries.get(&path) == Some(&MemoryEntry::Folder) {
                return Err(StorageError::status(500, format!("Is a directory: {path}")));
            }
            Self::ensure_parents(&mut entries, &path)?;
            entries.insert(path, MemoryEntry::File(content.to_string()));
            Ok(())
        })
    }

    fn create_folder<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.take_failure()?;
            let path = normalize_path(path);
            let mut entries = self.entries.borrow_mut();
            if path.is_empty() || entries.contains_key(&path) {
                return Err(StorageError::status(400, "Folder already exists"));
            }
            Self::ensure_parents(&mut entries, &path)?;
            entries.insert(path, MemoryEntry::Folder);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.take_failure()?;
            let path = normalize_path(path);
            let mut entries = self.entries.borrow_mut();
            if path.is_empty() || !entries.contains_key(&path) {
                return Err(StorageError::status(404, "Path not found"));
            }
            let nested = format!("{path}/");
            entries.retain(|key, _| key != &path && !key.starts_with(&nested));
            Ok(())
        })
    }
}
