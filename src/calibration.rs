use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

/// On-disk store for the browser UI's workspace calibration.
///
/// The file lives next to the static assets so a deployment carries its
/// calibration with it. Loading never fails: a missing or mangled file
/// reads as an empty object and the next save rewrites it.
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(static_dir: &Path) -> Self {
        Self {
            path: static_dir.join("calibration.json"),
        }
    }

    /// Current calibration, or an empty object when none is readable.
    pub async fn load(&self) -> Value {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|error| {
                warn!(path = %self.path.display(), %error, "calibration file is not valid JSON");
                json!({})
            }),
            Err(_) => json!({}),
        }
    }

    /// Persist `data` pretty-printed. Returns whether the write stuck.
    pub async fn save(&self, data: &Value) -> bool {
        if let Some(parent) = self.path.parent() {
            if let Err(error) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %self.path.display(), %error, "could not create calibration directory");
                return false;
            }
        }

        let payload = match serde_json::to_vec_pretty(data) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "calibration data failed to serialize");
                return false;
            }
        };

        match tokio::fs::write(&self.path, payload).await {
            Ok(()) => true,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "calibration write failed");
                false
            }
        }
    }
}
