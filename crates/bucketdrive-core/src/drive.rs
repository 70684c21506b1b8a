//! The drive: filesystem semantics over the object-storage backend.
//!
//! Every operation issues at most one backend round trip, normalizes the
//! response into the filesystem model, and returns it. No retries, no
//! caching; the only mutable state is the checkpoint table and the change
//! channel. Concurrent operations against the same path are not serialized
//! here — last-writer-wins is whatever the backend enforces.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::checkpoints::CheckpointTable;
use crate::config::DriveConfig;
use crate::error::{DriveError, DriveResult};
use crate::model::{ChangeEvent, ChangeKind, Checkpoint, Entry, EntryContent, EntryFormat, EntryType};
use crate::path::DrivePath;
use crate::protocol::{
    self, BackendResponse, DirectoryResponse, FileResponse, RawChild, ROUTE_COPY, ROUTE_DELETE,
    ROUTE_FILES, ROUTE_MOVE, ROUTE_NEW, ROUTE_UPLOAD,
};
use crate::transport::{HttpTransport, Method, Transport};

/// Buffered change events per subscriber before lagging kicks in.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Parameters for [`Drive::new_untitled`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Parent directory the new entry is created in.
    pub path: DrivePath,
    pub entry_type: EntryType,
    /// File extension hint, e.g. `"txt"`. Ignored for directories.
    pub ext: Option<String>,
    /// Desired name; the backend assigns one when absent.
    pub name: Option<String>,
}

/// Caller-supplied fields for [`Drive::save`].
///
/// These are echoed back into the resulting [`Entry`]; the backend's
/// response body is only inspected for errors, never parsed for content.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub format: EntryFormat,
    pub content: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
}

/// Storage drive adapting the backend's REST surface to filesystem
/// operations.
///
/// Constructed once per session. After [`Drive::dispose`] every operation
/// fails fast with [`DriveError::Disposed`] and no further change events
/// reach subscribers, including from operations already in flight.
pub struct Drive {
    config: DriveConfig,
    transport: Box<dyn Transport>,
    checkpoints: CheckpointTable,
    changes: Mutex<Option<broadcast::Sender<ChangeEvent>>>,
    disposed: AtomicBool,
}

impl Drive {
    /// Build a drive with an HTTP transport per the config's timeout.
    pub fn new(config: DriveConfig) -> DriveResult<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Build a drive over an arbitrary transport.
    pub fn with_transport(config: DriveConfig, transport: Box<dyn Transport>) -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            config,
            transport,
            checkpoints: CheckpointTable::new(),
            changes: Mutex::new(Some(sender)),
            disposed: AtomicBool::new(false),
        }
    }

    /// Identifier the host uses to register this drive.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Whether [`Drive::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Dispose the drive: reject further operations, drop all change
    /// subscriptions, and forget all checkpoints. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.changes_lock().take();
        self.checkpoints.clear();
    }

    /// Subscribe to change events for the drive's lifetime.
    pub fn subscribe(&self) -> DriveResult<broadcast::Receiver<ChangeEvent>> {
        self.ensure_live()?;
        self.changes_lock()
            .as_ref()
            .map(|sender| sender.subscribe())
            .ok_or(DriveError::Disposed)
    }

    // -- filesystem operations --

    /// Fetch a file or directory at `path`.
    ///
    /// Directories come back with their children in backend order; files
    /// come back with newline-stripped base64 decoded to UTF-8 text.
    pub async fn fetch(&self, path: &DrivePath) -> DriveResult<Entry> {
        self.ensure_live()?;
        let url = self.route_url(ROUTE_FILES, Some(path));
        match self.round_trip(Method::Get, &url, None).await? {
            BackendResponse::Directory(dir) => directory_entry(dir, path.clone(), false),
            BackendResponse::File(file) => file_entry(file, path.clone(), false),
        }
    }

    /// Construct an externally-resolvable download link for `path`.
    ///
    /// Pure concatenation of the configured public prefix and the logical
    /// path; issues no request and does not check that the object exists.
    pub fn download_url(&self, path: &DrivePath) -> DriveResult<String> {
        self.ensure_live()?;
        Ok(format!("{}{}", self.config.download_url_prefix, path))
    }

    /// Create a new untitled file or directory under `options.path`.
    ///
    /// The resulting entry's name is the backend-assigned one.
    pub async fn new_untitled(&self, options: &CreateOptions) -> DriveResult<Entry> {
        self.ensure_live()?;
        let mut body = json!({
            "path": options.path,
            "type": options.entry_type.as_str(),
        });
        if let Some(ref ext) = options.ext {
            body["ext"] = json!(ext);
        }
        if let Some(ref name) = options.name {
            body["name"] = json!(name);
        }
        let url = self.route_url(ROUTE_NEW, None);
        match self.round_trip(Method::Post, &url, Some(&body)).await? {
            BackendResponse::Directory(dir) => directory_entry(dir, options.path.clone(), true),
            BackendResponse::File(file) => file_entry(file, options.path.clone(), true),
        }
    }

    /// Delete the object at `path`.
    ///
    /// Resolves only after the backend has confirmed the deletion; a
    /// backend-reported error rejects.
    pub async fn delete(&self, path: &DrivePath) -> DriveResult<()> {
        self.ensure_live()?;
        let url = self.route_url(ROUTE_DELETE, Some(path));
        self.acknowledge(Method::Delete, &url, None).await?;
        Ok(())
    }

    /// Move `old` to `new`.
    ///
    /// Returns a minimal entry carrying only the new path and name; callers
    /// wanting content or authoritative metadata re-fetch.
    pub async fn rename(&self, old: &DrivePath, new: &DrivePath) -> DriveResult<Entry> {
        self.ensure_live()?;
        let body = json!({ "oldLocalPath": old, "newLocalPath": new });
        let url = self.route_url(ROUTE_MOVE, None);
        self.acknowledge(Method::Post, &url, Some(&body)).await?;
        Ok(minimal_entry(new.clone()))
    }

    /// Persist caller-supplied content at `path`.
    ///
    /// On success the returned entry echoes the supplied fields with
    /// `writable = true`, and exactly one [`ChangeKind::Save`] event is
    /// emitted — after the request settles, never before. A failed save
    /// emits nothing.
    pub async fn save(&self, path: &DrivePath, options: &SaveOptions) -> DriveResult<Entry> {
        self.ensure_live()?;
        let body = json!({
            "type": EntryType::File.as_str(),
            "format": options.format,
            "content": options.content,
            "mimetype": options.mime_type,
            "created": options.created_at,
            "last_modified": options.last_modified,
        });
        let url = self.route_url(ROUTE_UPLOAD, Some(path));
        self.acknowledge(Method::Post, &url, Some(&body)).await?;

        let entry = Entry {
            path: path.clone(),
            name: path.name().to_string(),
            entry_type: EntryType::File,
            format: Some(options.format),
            content: options.content.clone().map(EntryContent::Text),
            mime_type: options.mime_type.clone(),
            created_at: options.created_at.clone().unwrap_or_default(),
            last_modified: options.last_modified.clone().unwrap_or_default(),
            writable: true,
        };
        self.emit(ChangeEvent {
            kind: ChangeKind::Save,
            previous: None,
            new: Some(entry.clone()),
        });
        Ok(entry)
    }

    /// Copy `path` into the directory `to_dir`.
    ///
    /// Returns a minimal entry for the destination, analogous to `rename`.
    pub async fn copy(&self, path: &DrivePath, to_dir: &DrivePath) -> DriveResult<Entry> {
        self.ensure_live()?;
        let body = json!({ "localPath": path, "toLocalDir": to_dir });
        let url = self.route_url(ROUTE_COPY, None);
        self.acknowledge(Method::Post, &url, Some(&body)).await?;
        Ok(minimal_entry(to_dir.join(path.name())?))
    }

    // -- checkpoint operations (local only, no backend calls) --

    /// Create a checkpoint for `path`. Ids are sequential strings `"0"`,
    /// `"1"`, ... per path and are never reissued.
    pub fn create_checkpoint(&self, path: &DrivePath) -> DriveResult<Checkpoint> {
        self.ensure_live()?;
        Ok(self.checkpoints.create(path))
    }

    /// List checkpoints for `path` in creation order. Unseen paths yield an
    /// empty list, not an error.
    pub fn list_checkpoints(&self, path: &DrivePath) -> DriveResult<Vec<Checkpoint>> {
        self.ensure_live()?;
        Ok(self.checkpoints.list(path))
    }

    /// Remove a checkpoint. Removing an unknown id still resolves; the id
    /// stays retired either way.
    pub fn delete_checkpoint(&self, path: &DrivePath, id: &str) -> DriveResult<()> {
        self.ensure_live()?;
        self.checkpoints.remove(path, id);
        Ok(())
    }

    /// Accept a restore request. The backend offers no route for restoring,
    /// so this changes no state; it exists to satisfy the contract.
    pub fn restore_checkpoint(&self, path: &DrivePath, id: &str) -> DriveResult<()> {
        self.ensure_live()?;
        if !self.checkpoints.contains(path, id) {
            log::debug!("restore of unknown checkpoint {id} for {path} (no-op)");
        }
        Ok(())
    }

    // -- internals --

    fn ensure_live(&self) -> DriveResult<()> {
        if self.is_disposed() {
            Err(DriveError::Disposed)
        } else {
            Ok(())
        }
    }

    fn changes_lock(&self) -> std::sync::MutexGuard<'_, Option<broadcast::Sender<ChangeEvent>>> {
        self.changes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: ChangeEvent) {
        if let Some(sender) = self.changes_lock().as_ref() {
            // Send only fails when no subscriber is listening.
            let _ = sender.send(event);
        }
    }

    fn route_url(&self, route: &str, path: Option<&DrivePath>) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match path {
            Some(p) if !p.is_root() => format!("{base}/{route}/{p}"),
            _ => format!("{base}/{route}"),
        }
    }

    /// One round trip with full envelope parsing (fetch, new).
    async fn round_trip(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> DriveResult<BackendResponse> {
        let raw = self.dispatch(method, url, body).await?;
        protocol::parse_envelope(raw).inspect_err(|e| {
            log::warn!("{} {url}: {e}", method.as_str());
        })
    }

    /// One round trip checking only for a backend-reported error (delete,
    /// move, upload, copy — their success bodies are not interpreted).
    async fn acknowledge(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> DriveResult<()> {
        let mut raw = self.dispatch(method, url, body).await?;
        if let Some(error) = raw.get_mut("error") {
            let error = error.take();
            log::warn!("{} {url}: backend error: {error}", method.as_str());
            return Err(DriveError::Backend(error));
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> DriveResult<Value> {
        log::debug!("{} {url}", method.as_str());
        self.transport
            .request(method, url, body)
            .await
            .inspect_err(|e| log::warn!("{} {url}: {e}", method.as_str()))
    }
}

/// Minimal entry returned by rename/copy: path and name only. The type is
/// reported as `file`; callers needing authoritative metadata re-fetch.
fn minimal_entry(path: DrivePath) -> Entry {
    Entry {
        name: path.name().to_string(),
        path,
        entry_type: EntryType::File,
        format: None,
        content: None,
        mime_type: None,
        created_at: String::new(),
        last_modified: String::new(),
        writable: true,
    }
}

/// Map a directory response. With `backend_names` the path and name come
/// from the response (untitled creation); otherwise the trimmed request
/// path wins (fetch).
fn directory_entry(
    dir: DirectoryResponse,
    request_path: DrivePath,
    backend_names: bool,
) -> DriveResult<Entry> {
    let path = resolve_path(dir.path.as_deref(), request_path, backend_names)?;
    let name = resolve_name(dir.name, &path, backend_names);
    let children = dir
        .content
        .into_iter()
        .map(child_entry)
        .collect::<DriveResult<Vec<Entry>>>()?;
    Ok(Entry {
        path,
        name,
        entry_type: EntryType::Directory,
        format: Some(EntryFormat::Json),
        content: Some(EntryContent::Listing(children)),
        mime_type: None,
        created_at: dir.created.unwrap_or_default(),
        last_modified: dir.last_modified.unwrap_or_default(),
        writable: true,
    })
}

/// Map a file response, decoding its base64 payload to text.
fn file_entry(file: FileResponse, request_path: DrivePath, backend_names: bool) -> DriveResult<Entry> {
    let path = resolve_path(file.path.as_deref(), request_path, backend_names)?;
    let name = resolve_name(file.name, &path, backend_names);
    let content = match file.content.as_deref() {
        Some(encoded) => Some(EntryContent::Text(protocol::decode_file_content(encoded)?)),
        None => None,
    };
    Ok(Entry {
        path,
        name,
        entry_type: EntryType::File,
        format: content.as_ref().map(|_| EntryFormat::Text),
        content,
        mime_type: file.mimetype,
        created_at: file.created.unwrap_or_default(),
        last_modified: file.last_modified.unwrap_or_default(),
        writable: true,
    })
}

/// One child row of a listing. `writable` defaults to true when the backend
/// does not supply a lower-trust value.
fn child_entry(raw: RawChild) -> DriveResult<Entry> {
    Ok(Entry {
        path: DrivePath::new(&raw.path)?,
        name: raw.name,
        entry_type: protocol::entry_type_from_tag(&raw.entry_type)?,
        format: None,
        content: None,
        mime_type: raw.mimetype,
        created_at: raw.created.unwrap_or_default(),
        last_modified: raw.last_modified.unwrap_or_default(),
        writable: raw.writable.unwrap_or(true),
    })
}

fn resolve_path(
    backend_path: Option<&str>,
    request_path: DrivePath,
    backend_names: bool,
) -> DriveResult<DrivePath> {
    if backend_names && let Some(p) = backend_path {
        DrivePath::new(p)
    } else {
        Ok(request_path)
    }
}

fn resolve_name(backend_name: Option<String>, path: &DrivePath, backend_names: bool) -> String {
    if backend_names {
        backend_name.unwrap_or_else(|| path.name().to_string())
    } else {
        path.name().to_string()
    }
}
