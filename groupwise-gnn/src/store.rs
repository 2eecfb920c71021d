// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared, read-only parameter handle
//!
//! One [`ParameterStore`] is created at startup and shared by reference with
//! every refinement call. Readers take an `Arc` snapshot and release the lock
//! immediately, so inference never runs under the lock. A reload validates
//! the new artifact first and only then swaps the pointer: calls already in
//! flight finish on the parameters they started with.

use crate::params::AttentionParameters;
use groupwise_core::{GroupingError, GroupingResult};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Holder of the currently deployed attention parameters.
#[derive(Debug, Default)]
pub struct ParameterStore {
    current: RwLock<Option<Arc<AttentionParameters>>>,
}

impl ParameterStore {
    /// Store with nothing deployed; every snapshot fails until an install.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding already constructed parameters.
    pub fn with_parameters(params: AttentionParameters) -> GroupingResult<Self> {
        let store = Self::empty();
        store.install(params)?;
        Ok(store)
    }

    /// Load the artifact at `path` into a new store.
    pub fn open(path: impl AsRef<Path>) -> GroupingResult<Self> {
        let store = Self::empty();
        store.reload_from_path(path)?;
        Ok(store)
    }

    /// Validate and deploy `params`, replacing whatever was deployed.
    pub fn install(&self, params: AttentionParameters) -> GroupingResult<Arc<AttentionParameters>> {
        params.validate()?;
        let fingerprint = params.fingerprint()?;
        let params = Arc::new(params);
        info!(
            version = %params.version,
            %fingerprint,
            layers = params.layers.len(),
            input_dim = params.input_dim,
            output_dim = params.output_dim(),
            "Installed attention parameters"
        );
        *self.current.write() = Some(Arc::clone(&params));
        Ok(params)
    }

    /// Redeploy from disk. On failure the previous parameters stay deployed.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> GroupingResult<Arc<AttentionParameters>> {
        let path = path.as_ref();
        match AttentionParameters::load(path) {
            Ok(params) => self.install(params),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Attention parameter reload failed");
                Err(e)
            }
        }
    }

    /// Current parameters, or `ServiceUnavailable` if nothing is deployed.
    pub fn snapshot(&self) -> GroupingResult<Arc<AttentionParameters>> {
        self.current.read().as_ref().map(Arc::clone).ok_or_else(|| {
            GroupingError::ServiceUnavailable("attention parameters are not loaded".into())
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Undeploy; subsequent snapshots fail.
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Architecture;

    fn arch() -> Architecture {
        Architecture {
            input_dim: 4,
            hidden_channels: 3,
            heads: 2,
            layers: 2,
            output_dim: 4,
        }
    }

    #[test]
    fn test_empty_store_is_unavailable() {
        let store = ParameterStore::empty();
        assert!(!store.is_loaded());
        let err = store.snapshot().unwrap_err();
        assert!(matches!(err, GroupingError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_install_rejects_malformed() {
        let store = ParameterStore::empty();
        let mut params = AttentionParameters::glorot(&arch(), 1);
        params.layers.clear();
        assert!(store.install(params).is_err());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let store = ParameterStore::with_parameters(AttentionParameters::glorot(&arch(), 1)).unwrap();
        let in_flight = store.snapshot().unwrap();

        store.install(AttentionParameters::glorot(&arch(), 2)).unwrap();
        let fresh = store.snapshot().unwrap();

        assert_eq!(in_flight.version, "synthetic-1");
        assert_eq!(fresh.version, "synthetic-2");
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.bin");
        AttentionParameters::glorot(&arch(), 5).save(&good).unwrap();

        let store = ParameterStore::open(&good).unwrap();
        assert!(store.reload_from_path(dir.path().join("missing.bin")).is_err());
        assert_eq!(store.snapshot().unwrap().version, "synthetic-5");

        store.clear();
        assert!(store.snapshot().is_err());
    }
}
