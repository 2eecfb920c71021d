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

//! User embeddings and request validation.

use crate::error::{GroupingError, GroupingResult};
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque user identifier.
///
/// Deserializes from either a JSON string or a JSON integer, so callers that
/// key users by database row id do not have to stringify them first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => UserId(s),
            RawId::Unsigned(n) => UserId(n.to_string()),
            RawId::Signed(n) => UserId(n.to_string()),
        })
    }
}

/// One user's semantic vector, produced by an external encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEmbedding {
    pub id: UserId,
    pub embedding: Vec<f32>,
}

impl UserEmbedding {
    pub fn new(id: impl Into<UserId>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// A validated request: N >= 1 users with distinct ids and finite vectors of
/// one shared dimension D, stored row-major as an N x D matrix.
#[derive(Debug, Clone)]
pub struct EmbeddingSet {
    ids: Vec<UserId>,
    matrix: Array2<f32>,
}

impl EmbeddingSet {
    /// Validate users and pack their vectors into a matrix.
    pub fn new(users: &[UserEmbedding]) -> GroupingResult<Self> {
        let first = users
            .first()
            .ok_or_else(|| GroupingError::InvalidInput("user list is empty".into()))?;
        let dim = first.dimension();
        if dim == 0 {
            return Err(GroupingError::InvalidInput(format!(
                "user {} has an empty embedding",
                first.id
            )));
        }

        let mut seen = HashSet::with_capacity(users.len());
        let mut data = Vec::with_capacity(users.len() * dim);
        for user in users {
            if !seen.insert(&user.id) {
                return Err(GroupingError::InvalidInput(format!(
                    "duplicate user id {}",
                    user.id
                )));
            }
            if user.dimension() != dim {
                return Err(GroupingError::DimensionMismatch {
                    user: user.id.to_string(),
                    expected: dim,
                    found: user.dimension(),
                });
            }
            if user.embedding.iter().any(|v| !v.is_finite()) {
                return Err(GroupingError::InvalidInput(format!(
                    "user {} has a non-finite embedding value",
                    user.id
                )));
            }
            data.extend_from_slice(&user.embedding);
        }

        let matrix = Array2::from_shape_vec((users.len(), dim), data)
            .map_err(|e| GroupingError::InvalidInput(e.to_string()))?;
        Ok(Self {
            ids: users.iter().map(|u| u.id.clone()).collect(),
            matrix,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for a constructed set; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn ids(&self) -> &[UserId] {
        &self.ids
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }
}
