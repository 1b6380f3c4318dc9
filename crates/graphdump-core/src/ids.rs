//! Newtype wrappers for resource URIs to ensure type safety.
//!
//! Every record this service writes or reads is identified by a URI. Records
//! minted here get a fresh UUID appended to a fixed namespace; the same UUID
//! is also stored on the record as `mu:uuid`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::error::CoreError;
use crate::vocab::SHARE_SCHEME;

/// A freshly minted URI together with the UUID it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minted<T> {
    pub uri: T,
    pub uuid: String,
}

macro_rules! uri_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing URI string.
            pub fn new(uri: impl Into<String>) -> Self {
                Self(uri.into())
            }

            /// Get the inner string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, base = $base:expr) => {
        uri_newtype!($(#[$meta])* $name);

        impl $name {
            /// Namespace new identities are minted in.
            pub const BASE: &'static str = $base;

            /// Mint a new random identity.
            pub fn generate() -> Minted<Self> {
                let uuid = Uuid::new_v4().to_string();
                Minted {
                    uri: Self(format!("{}{}", Self::BASE, uuid)),
                    uuid,
                }
            }
        }
    };
}

uri_newtype!(
    /// URI of a task, created by an external scheduler.
    TaskUri
);

uri_newtype!(
    /// URI of the job a task belongs to.
    JobUri
);

uri_newtype!(
    /// URI of a `dcat:Dataset` snapshot record.
    DatasetUri,
    base = "http://data.lblod.info/id/dataset/"
);

uri_newtype!(
    /// URI of a `dcat:Distribution` record.
    DistributionUri,
    base = "http://data.lblod.info/id/distribution/"
);

uri_newtype!(
    /// URI of the abstract (logical) file record.
    LogicalFileUri,
    base = "http://data.lblod.info/id/file/"
);

uri_newtype!(
    /// URI of a task result container.
    ContainerUri,
    base = "http://redpencil.data.gift/id/dataContainers/"
);

uri_newtype!(
    /// `share://` URI of a file on disk.
    PhysicalFileUri
);

impl PhysicalFileUri {
    /// Translate an on-disk path below `share_root` into its `share://` form.
    pub fn from_path(path: &Path, share_root: &Path) -> Result<Self, CoreError> {
        let relative = path
            .strip_prefix(share_root)
            .map_err(|_| CoreError::OutsideShare {
                path: path.display().to_string(),
                root: share_root.display().to_string(),
            })?;
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(Self(format!("{}{}", SHARE_SCHEME, relative.join("/"))))
    }

    /// Translate back into an on-disk path below `share_root`.
    ///
    /// Fails for URIs without the `share://` scheme and for relative parts
    /// that are absolute or step out of the root.
    pub fn to_path(&self, share_root: &Path) -> Result<PathBuf, CoreError> {
        let outside = || CoreError::OutsideShare {
            path: self.0.clone(),
            root: share_root.display().to_string(),
        };
        let relative = Path::new(self.0.strip_prefix(SHARE_SCHEME).ok_or_else(outside)?);
        let mut components = relative.components().peekable();
        if components.peek().is_none()
            || !components.all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(outside());
        }
        Ok(share_root.join(relative))
    }
}
