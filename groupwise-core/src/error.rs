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

//! Grouping error types

use thiserror::Error;

/// Result type for grouping operations
pub type GroupingResult<T> = Result<T, GroupingError>;

/// Errors that can occur anywhere in the grouping pipeline
#[derive(Debug, Error)]
pub enum GroupingError {
    /// Request rejected before graph construction
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An embedding does not have the dimension of the rest of the request
    #[error("Dimension mismatch for user {user}: expected {expected}, found {found}")]
    DimensionMismatch {
        user: String,
        expected: usize,
        found: usize,
    },

    /// No attention parameters are deployed
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The parameter artifact exists but cannot be used
    #[error("Malformed attention parameters: {0}")]
    MalformedParameters(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the run
    #[error("Grouping run cancelled after {generations} generations")]
    Cancelled { generations: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GroupingError {
    /// True for errors caused by the request itself (bad ids, shapes, values).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GroupingError::InvalidInput(_) | GroupingError::DimensionMismatch { .. }
        )
    }

    /// True when the service cannot refine until its parameters are fixed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            GroupingError::ServiceUnavailable(_) | GroupingError::MalformedParameters(_)
        )
    }
}

impl From<serde_json::Error> for GroupingError {
    fn from(e: serde_json::Error) -> Self {
        GroupingError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for GroupingError {
    fn from(e: bincode::Error) -> Self {
        GroupingError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for GroupingError {
    fn from(e: toml::de::Error) -> Self {
        GroupingError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GroupingError::InvalidInput("empty".into()).is_client_error());
        assert!(GroupingError::DimensionMismatch {
            user: "7".into(),
            expected: 3,
            found: 2
        }
        .is_client_error());
        assert!(GroupingError::ServiceUnavailable("none".into()).is_unavailable());
        assert!(GroupingError::MalformedParameters("shape".into()).is_unavailable());
        assert!(!GroupingError::Cancelled { generations: 3 }.is_client_error());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = GroupingError::DimensionMismatch {
            user: "alice".into(),
            expected: 768,
            found: 384,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for user alice: expected 768, found 384"
        );
    }
}
