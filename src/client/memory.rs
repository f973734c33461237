//! In-process backend.
//!
//! [`MemoryDisk`] keeps a whole remote drive in memory and answers with the same
//! resource documents a cloud-drive REST API would: native directories whose
//! parents must exist, publish state with public URLs, and digests computed by
//! the "provider". Failures of individual remote operations can be injected with
//! [`Faults`], and every call is recorded in a journal.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use md5::{Digest, Md5};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use std::{collections::BTreeMap, io::Cursor};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::Mutex,
};

use super::{error::Error, ClientResult, RemoteClient, Request, ResourceInfo, Response};

const DOWNLOAD_SCHEME: &str = "memory://download";
const PUBLIC_HOST: &str = "https://disk.memory/public";

/// Remote operations that can be made to fail
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Faults(u32);

bitflags! {
    impl Faults: u32 {
        const STAT = 0x00000001;
        const CREATE_DIR = 0x00000002;
        const UPLOAD = 0x00000004;
        const DOWNLOAD_LINK = 0x00000008;
        /// Download requests answer with HTTP 503
        const DOWNLOAD = 0x00000010;
        const REMOVE = 0x00000020;
        const MOVE = 0x00000040;
        const COPY = 0x00000080;
        const PUBLISH = 0x00000100;
        /// Uploads are accepted but nothing is stored
        const DISCARD_UPLOAD = 0x00000200;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Directory,
    File,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    content: Bytes,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    public_url: Option<String>,
    resource_id: u64,
}

struct State {
    nodes: BTreeMap<String, Node>,
    faults: Faults,
    calls: Vec<String>,
    next_id: u64,
}

impl State {
    fn node(&mut self, kind: NodeKind, content: Bytes) -> Node {
        self.next_id += 1;
        let now = Utc::now();
        Node {
            kind,
            content,
            created: now,
            modified: now,
            public_url: None,
            resource_id: self.next_id,
        }
    }

    fn check(&mut self, fault: Faults, call: String) -> ClientResult<()> {
        debug!("memory disk: {}", call);
        self.calls.push(call);

        if self.faults.contains(fault) {
            return Err(Error::UnexpectedStatus(503));
        }
        Ok(())
    }

    fn is_dir(&self, path: &str) -> bool {
        self.nodes
            .get(path)
            .is_some_and(|n| n.kind == NodeKind::Directory)
    }

    /// Keys of the node and everything below it
    fn subtree(&self, path: &str) -> Vec<String> {
        let prefix = child_prefix(path);
        self.nodes
            .keys()
            .filter(|k| k.as_str() == path || k.starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn children(&self, path: &str) -> Vec<(&String, &Node)> {
        let prefix = child_prefix(path);
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| k.len() > prefix.len() && !k[prefix.len()..].contains('/'))
            .collect()
    }

    fn remove_subtree(&mut self, path: &str) {
        for key in self.subtree(path) {
            if key != "/" {
                let _ = self.nodes.remove(&key);
            }
        }
    }

    fn require_parent(&self, path: &str) -> ClientResult<()> {
        if self.is_dir(parent(path)) {
            Ok(())
        } else {
            Err(Error::Conflict(format!(
                "parent directory of {path} does not exist"
            )))
        }
    }

    /// Validates a move or copy and clears an overwritten destination
    fn prepare_transfer(&mut self, from: &str, to: &str, overwrite: bool) -> ClientResult<()> {
        if !self.nodes.contains_key(from) {
            return Err(Error::NotFound(from.to_owned()));
        }
        if to == from || to.starts_with(&child_prefix(from)) {
            return Err(Error::Conflict(format!("cannot place {from} into {to}")));
        }
        self.require_parent(to)?;

        if self.nodes.contains_key(to) {
            if !overwrite {
                return Err(Error::AlreadyExists(to.to_owned()));
            }
            self.remove_subtree(to);
        }
        Ok(())
    }

    fn document(&self, path: &str, node: &Node, digests: bool) -> Value {
        let mut doc = Map::new();
        let name = path.rsplit('/').next().unwrap_or_default();

        let _ = doc.insert("name".into(), json!(name));
        let _ = doc.insert("path".into(), json!(format!("disk:{path}")));
        let _ = doc.insert("created".into(), json!(timestamp(node.created)));
        let _ = doc.insert("modified".into(), json!(timestamp(node.modified)));
        let _ = doc.insert("resource_id".into(), json!(node.resource_id.to_string()));

        match node.kind {
            NodeKind::Directory => {
                let _ = doc.insert("type".into(), json!("dir"));
            }
            NodeKind::File => {
                let _ = doc.insert("type".into(), json!("file"));
                let _ = doc.insert("size".into(), json!(node.content.len()));
                if let Some(mime_type) = mime_type(name) {
                    let _ = doc.insert("mime_type".into(), json!(mime_type));
                }
                if digests {
                    let md5 = format!("{:x}", Md5::digest(&node.content));
                    let sha256 = format!("{:x}", Sha256::digest(&node.content));
                    let _ = doc.insert("md5".into(), json!(md5));
                    let _ = doc.insert("sha256".into(), json!(sha256));
                }
            }
        }

        if let Some(url) = &node.public_url {
            let _ = doc.insert("public_key".into(), json!(node.resource_id.to_string()));
            let _ = doc.insert("public_url".into(), json!(url));
        }

        Value::Object(doc)
    }
}

/// Cloud drive kept entirely in memory.
pub struct MemoryDisk {
    state: Mutex<State>,
    digests: bool,
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDisk {
    /// Creates an empty drive containing only the root directory
    pub fn new() -> Self {
        let mut state = State {
            nodes: BTreeMap::new(),
            faults: Faults::empty(),
            calls: Vec::new(),
            next_id: 0,
        };
        let root = state.node(NodeKind::Directory, Bytes::new());
        let _ = state.nodes.insert("/".to_owned(), root);

        Self {
            state: Mutex::new(state),
            digests: true,
        }
    }

    /// Drive whose resource documents carry no `md5`/`sha256` fields
    #[must_use]
    pub fn without_digests(mut self) -> Self {
        self.digests = false;
        self
    }

    /// Replaces the set of failing operations.
    pub async fn set_faults(&self, faults: Faults) {
        self.state.lock().await.faults = faults;
    }

    /// Journal of the remote calls made so far, e.g. `"mkdir /a"`
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Checks the drive directly, bypassing the journal and faults.
    pub async fn exists(&self, path: &str) -> bool {
        self.state.lock().await.nodes.contains_key(&normalize(path))
    }
}

#[async_trait]
impl RemoteClient for MemoryDisk {
    async fn stat(&self, path: &str, limit: Option<usize>) -> ClientResult<Option<ResourceInfo>> {
        let path = normalize(path);
        let mut state = self.state.lock().await;
        state.check(Faults::STAT, format!("stat {path}"))?;

        let Some(node) = state.nodes.get(&path) else {
            return Ok(None);
        };

        let mut doc = state.document(&path, node, self.digests);
        if let (Some(limit), NodeKind::Directory) = (limit, node.kind) {
            let children = state.children(&path);
            let items: Vec<Value> = children
                .iter()
                .take(limit)
                .map(|(key, child)| state.document(key, child, self.digests))
                .collect();

            if let Value::Object(doc) = &mut doc {
                let _ = doc.insert(
                    "_embedded".into(),
                    json!({
                        "path": format!("disk:{path}"),
                        "items": items,
                        "limit": limit,
                        "offset": 0,
                        "total": children.len(),
                    }),
                );
            }
        }

        ResourceInfo::from_value(doc).map(Some)
    }

    async fn create_dir(&self, path: &str) -> ClientResult<()> {
        let path = normalize(path);
        let mut state = self.state.lock().await;
        state.check(Faults::CREATE_DIR, format!("mkdir {path}"))?;

        if state.nodes.contains_key(&path) {
            return Err(Error::AlreadyExists(path));
        }
        state.require_parent(&path)?;

        let node = state.node(NodeKind::Directory, Bytes::new());
        let _ = state.nodes.insert(path, node);
        Ok(())
    }

    async fn remove(&self, path: &str, permanently: bool) -> ClientResult<()> {
        let path = normalize(path);
        let mut state = self.state.lock().await;
        state.check(Faults::REMOVE, format!("remove {path}"))?;

        if !state.nodes.contains_key(&path) {
            return Err(Error::NotFound(path));
        }
        if !permanently {
            trace!("memory disk has no trash, removing {} permanently", path);
        }

        state.remove_subtree(&path);
        Ok(())
    }

    async fn upload(
        &self,
        path: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> ClientResult<bool> {
        let path = normalize(path);
        {
            let mut state = self.state.lock().await;
            state.check(Faults::UPLOAD, format!("upload {path}"))?;
            state.require_parent(&path)?;

            match state.nodes.get(&path).map(|n| n.kind) {
                Some(NodeKind::Directory) => {
                    return Err(Error::Conflict(format!("{path} is a directory")))
                }
                Some(NodeKind::File) if !overwrite => return Err(Error::AlreadyExists(path)),
                _ => (),
            }
        }

        let mut buffer = Vec::new();
        let _ = source.read_to_end(&mut buffer).await?;

        let mut state = self.state.lock().await;
        if state.faults.contains(Faults::DISCARD_UPLOAD) {
            return Ok(false);
        }
        state.require_parent(&path)?;

        let node = state.node(NodeKind::File, Bytes::from(buffer));
        let _ = state.nodes.insert(path, node);
        Ok(true)
    }

    async fn download_link(&self, path: &str) -> ClientResult<String> {
        let path = normalize(path);
        let mut state = self.state.lock().await;
        state.check(Faults::DOWNLOAD_LINK, format!("link {path}"))?;

        match state.nodes.get(&path) {
            Some(node) if node.kind == NodeKind::File => Ok(format!("{DOWNLOAD_SCHEME}{path}")),
            _ => Err(Error::NotFound(path)),
        }
    }

    async fn move_resource(&self, from: &str, to: &str, overwrite: bool) -> ClientResult<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut state = self.state.lock().await;
        state.check(Faults::MOVE, format!("move {from} {to}"))?;
        state.prepare_transfer(&from, &to, overwrite)?;

        for key in state.subtree(&from) {
            if let Some(node) = state.nodes.remove(&key) {
                let _ = state.nodes.insert(format!("{to}{}", &key[from.len()..]), node);
            }
        }
        Ok(())
    }

    async fn copy_resource(&self, from: &str, to: &str, overwrite: bool) -> ClientResult<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut state = self.state.lock().await;
        state.check(Faults::COPY, format!("copy {from} {to}"))?;
        state.prepare_transfer(&from, &to, overwrite)?;

        for key in state.subtree(&from) {
            let Some(original) = state.nodes.get(&key) else {
                continue;
            };
            let (kind, content) = (original.kind, original.content.clone());
            let copy = state.node(kind, content);
            let _ = state.nodes.insert(format!("{to}{}", &key[from.len()..]), copy);
        }
        Ok(())
    }

    async fn set_publish(&self, path: &str, publish: bool) -> ClientResult<()> {
        let path = normalize(path);
        let mut state = self.state.lock().await;
        let call = if publish { "publish" } else { "unpublish" };
        state.check(Faults::PUBLISH, format!("{call} {path}"))?;

        let Some(node) = state.nodes.get_mut(&path) else {
            return Err(Error::NotFound(path));
        };
        node.public_url = if publish {
            Some(format!("{PUBLIC_HOST}/{}", node.resource_id))
        } else {
            None
        };
        Ok(())
    }

    async fn send(&self, request: Request) -> ClientResult<Response> {
        let mut state = self.state.lock().await;
        let call = format!("{} {}", request.method, request.url);
        debug!("memory disk: {}", call);
        state.calls.push(call);

        if state.faults.contains(Faults::DOWNLOAD) {
            return Ok(Response {
                status: 503,
                body: Box::new(Cursor::new(Bytes::new())),
            });
        }

        let node = request
            .url
            .strip_prefix(DOWNLOAD_SCHEME)
            .and_then(|path| state.nodes.get(path))
            .filter(|node| node.kind == NodeKind::File);

        let (status, content) = match node {
            Some(node) => (200, node.content.clone()),
            None => (404, Bytes::new()),
        };

        Ok(Response {
            status,
            body: Box::new(Cursor::new(content)),
        })
    }
}

fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn mime_type(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    Some(match extension.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    })
}
