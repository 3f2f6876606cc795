use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// URL prefix under which stored avatars are served back.
pub const AVATARS_URL_PREFIX: &str = "/uploads/avatars";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Path the client can fetch the object from.
    fn public_url(&self, key: &str) -> String;
}

/// Stores objects as flat files under a directory that the router serves
/// statically.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>, url_prefix: &str) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create storage dir {}", root.display()))?;
        Ok(Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(is_safe_key(key), "unsafe storage key {key:?}");
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

/// Keys are single file names: no separators, no parent references.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Maps an image content type to the extension used for the stored file.
pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Extracts the storage key from a URL this storage handed out.
pub fn key_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(AVATARS_URL_PREFIX)?
        .strip_prefix('/')
        .filter(|k| is_safe_key(k))
}

/// Like [`key_from_url`], restricted to files uploaded by `owner`. Uploaded
/// keys are prefixed with the uploader's id.
pub fn owned_key_from_url(url: &str, owner: Uuid) -> Option<&str> {
    let prefix = format!("{owner}-");
    key_from_url(url).filter(|k| k.starts_with(&prefix))
}

#[cfg(test)]
pub use memory::MemoryStorage;
