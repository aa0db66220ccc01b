use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::IdentityError;

/// The stable guid a display announces itself with. Generated once per
/// installation and persisted, so a restarted display is recognised by the
/// server and keeps its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    guid: Uuid,
}

impl ClientIdentity {
    pub const FILE_NAME: &'static str = "identity.json";

    /// A fresh random identity that is not stored anywhere
    pub fn generate() -> Self {
        Self {
            guid: Uuid::new_v4(),
        }
    }

    pub fn from_guid(guid: Uuid) -> Self {
        Self { guid }
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// The guid as it travels in `ClientStarted`
    pub fn guid_string(&self) -> String {
        self.guid.hyphenated().to_string()
    }

    /// Where identities live when no directory is given: the platform state
    /// directory, or the local data directory where there is none
    pub fn default_dir() -> Result<PathBuf, IdentityError> {
        let project_dirs = directories::ProjectDirs::from("", "lumen", "lumen-client")
            .ok_or(IdentityError::NoStateDirectory)?;
        let dir = project_dirs
            .state_dir()
            .unwrap_or_else(|| project_dirs.data_local_dir());
        Ok(dir.to_path_buf())
    }

    /// Loads the identity stored in the default directory, creating it on
    /// first start
    pub fn load_default() -> Result<Self, IdentityError> {
        let dir = Self::default_dir()?;
        Self::load_or_create(&dir)
    }

    /// Loads `identity.json` from `dir`. A missing or unreadable file is
    /// replaced by a newly generated identity.
    pub fn load_or_create(dir: &Path) -> Result<Self, IdentityError> {
        let path = dir.join(Self::FILE_NAME);

        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<ClientIdentity>(&text) {
                Ok(identity) => return Ok(identity),
                Err(error) => {
                    warn!(
                        "identity file {:?} is corrupt ({}), generating a new one",
                        path, error
                    );
                }
            },
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                return Err(IdentityError::Io {
                    path,
                    reason: error.to_string(),
                });
            }
        }

        let identity = Self::generate();
        identity.store(dir)?;
        info!("created display identity {}", identity.guid);
        Ok(identity)
    }

    /// Writes this identity to `identity.json` in `dir`, creating the
    /// directory if needed
    pub fn store(&self, dir: &Path) -> Result<(), IdentityError> {
        fs::create_dir_all(dir).map_err(|error| IdentityError::Io {
            path: dir.to_path_buf(),
            reason: error.to_string(),
        })?;
        let text = serde_json::to_string_pretty(self).map_err(|error| IdentityError::Encode {
            reason: error.to_string(),
        })?;
        let path = dir.join(Self::FILE_NAME);
        fs::write(&path, text).map_err(|error| IdentityError::Io {
            path,
            reason: error.to_string(),
        })
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::generate()
    }
}
