use std::ffi::OsString;
use std::path::PathBuf;

use tokio::fs::File;

use crate::resource::alias::AliasTable;

/// An opened regular file ready to be streamed.
///
/// `size` is read from the open handle, so it describes the file that will
/// actually be streamed. Dropping the resource releases the handle.
#[derive(Debug)]
pub struct Resource {
    pub size: u64,
    pub file: File,
}

/// Outcome of a lookup.
///
/// Missing files, directories and files that fail to open are all reported
/// as `NotFound`; the reason only reaches the debug log.
#[derive(Debug)]
pub enum Resolution {
    Found(Resource),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Resolution::Found(resource) => Some(resource),
            Resolution::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    aliases: AliasTable,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, aliases: AliasTable) -> Self {
        Self {
            root: root.into(),
            aliases,
        }
    }

    /// Path a URI maps to after alias substitution.
    ///
    /// The URI bytes are appended to the root as-is: no decoding and no
    /// normalization, so `..` segments are not rejected.
    pub fn candidate_path(&self, uri: impl AsRef<[u8]>) -> PathBuf {
        let uri = self.aliases.apply(uri.as_ref());
        let mut path = OsString::from(self.root.as_os_str());
        path.push(&*uri_os_str(uri));
        PathBuf::from(path)
    }

    pub async fn resolve(&self, uri: impl AsRef<[u8]>) -> Resolution {
        let path = self.candidate_path(uri);

        // Stat first so special files (FIFOs, devices) are never opened
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Resource lookup failed");
                return Resolution::NotFound;
            }
        };
        if !meta.is_file() {
            tracing::debug!(path = %path.display(), "Resource is not a regular file");
            return Resolution::NotFound;
        }

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Resource open failed");
                return Resolution::NotFound;
            }
        };

        // The path may have been swapped since the stat; trust the handle
        match file.metadata().await {
            Ok(meta) if meta.is_file() => {
                tracing::debug!(path = %path.display(), size = meta.len(), "Resource found");
                Resolution::Found(Resource {
                    size: meta.len(),
                    file,
                })
            }
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Resource is not a regular file");
                Resolution::NotFound
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Resource stat failed");
                Resolution::NotFound
            }
        }
    }
}

#[cfg(unix)]
fn uri_os_str(uri: &[u8]) -> std::borrow::Cow<'_, std::ffi::OsStr> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(std::ffi::OsStr::from_bytes(uri))
}

// Non-unix paths are not byte strings; non-UTF-8 targets cannot match there.
#[cfg(not(unix))]
fn uri_os_str(uri: &[u8]) -> std::borrow::Cow<'_, std::ffi::OsStr> {
    let uri = String::from_utf8_lossy(uri).into_owned();
    std::borrow::Cow::Owned(std::ffi::OsString::from(uri))
}
