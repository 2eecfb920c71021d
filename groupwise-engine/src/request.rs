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

//! Wire types for callers that speak JSON.

use crate::pipeline::GroupingOutcome;
use groupwise_core::{GroupAssignment, UserEmbedding};
use groupwise_optimizer::StopReason;
use serde::{Deserialize, Serialize};

/// `{ "users": [ { "id": ..., "embedding": [...] }, ... ] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingRequest {
    pub users: Vec<UserEmbedding>,
}

/// Groups keyed by group id, plus run diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingResponse {
    pub groups: GroupAssignment,
    pub fitness: f64,
    pub stop_reason: StopReason,
    pub generations: usize,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined: Option<Vec<Vec<f32>>>,
}

impl From<GroupingOutcome> for GroupingResponse {
    fn from(outcome: GroupingOutcome) -> Self {
        Self {
            groups: outcome.assignment,
            fitness: outcome.fitness,
            stop_reason: outcome.stop_reason,
            generations: outcome.generations,
            seed: outcome.seed,
            refined: outcome
                .refined
                .map(|m| m.rows().into_iter().map(|row| row.to_vec()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwise_core::UserId;
    use ndarray::array;

    #[test]
    fn test_request_accepts_mixed_ids() {
        let json = r#"{"users":[{"id":"alice","embedding":[1.0,0.0]},{"id":42,"embedding":[0.0,1.0]}]}"#;
        let request: GroupingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.users[0].id, UserId::from("alice"));
        assert_eq!(request.users[1].id, UserId::from("42"));
    }

    #[test]
    fn test_response_shape() {
        let ids = [UserId::from("a"), UserId::from("b"), UserId::from("c")];
        let outcome = GroupingOutcome {
            assignment: GroupAssignment::from_genes(&ids, &[1, 0, 1]).unwrap(),
            fitness: 0.5,
            stop_reason: StopReason::Completed,
            generations: 40,
            seed: 9,
            history: Vec::new(),
            refined: None,
        };
        let value = serde_json::to_value(GroupingResponse::from(outcome)).unwrap();
        assert_eq!(value["groups"]["0"], serde_json::json!(["b"]));
        assert_eq!(value["groups"]["1"], serde_json::json!(["a", "c"]));
        assert_eq!(value["stop_reason"], "completed");
        assert!(value.get("refined").is_none());
    }

    #[test]
    fn test_refined_rows_serialized() {
        let outcome = GroupingOutcome {
            assignment: GroupAssignment::default(),
            fitness: 0.0,
            stop_reason: StopReason::BudgetExhausted,
            generations: 0,
            seed: 1,
            history: Vec::new(),
            refined: Some(array![[1.0f32, 2.0], [3.0, 4.0]]),
        };
        let response = GroupingResponse::from(outcome);
        assert_eq!(response.refined, Some(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
    }
}
