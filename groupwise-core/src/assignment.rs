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

//! Final group assignment: group id -> member user ids.

use crate::embedding::UserId;
use crate::error::{GroupingError, GroupingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Users keyed by the group id they were assigned.
///
/// Group ids are the gene values of the winning individual, so they may be
/// sparse (a group id nobody was assigned to does not appear). Members keep
/// the order in which they appeared in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupAssignment {
    groups: BTreeMap<usize, Vec<UserId>>,
}

impl GroupAssignment {
    /// Zip user ids with their group genes.
    pub fn from_genes(ids: &[UserId], genes: &[usize]) -> GroupingResult<Self> {
        if ids.len() != genes.len() {
            return Err(GroupingError::InvalidInput(format!(
                "{} user ids but {} group genes",
                ids.len(),
                genes.len()
            )));
        }

        let mut groups: BTreeMap<usize, Vec<UserId>> = BTreeMap::new();
        for (id, &group) in ids.iter().zip(genes) {
            groups.entry(group).or_default().push(id.clone());
        }
        Ok(Self { groups })
    }

    /// Number of non-empty groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn members(&self, group: usize) -> Option<&[UserId]> {
        self.groups.get(&group).map(Vec::as_slice)
    }

    /// Group id a user landed in, if the user is part of this assignment.
    pub fn group_of(&self, user: &UserId) -> Option<usize> {
        self.groups
            .iter()
            .find(|(_, members)| members.contains(user))
            .map(|(&group, _)| group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[UserId])> {
        self.groups.iter().map(|(&g, m)| (g, m.as_slice()))
    }

    /// Group sizes in ascending group-id order.
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.values().map(Vec::len).collect()
    }

    pub fn into_inner(self) -> BTreeMap<usize, Vec<UserId>> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<UserId> {
        names.iter().map(|&n| UserId::from(n)).collect()
    }

    #[test]
    fn test_from_genes_keeps_first_seen_order() {
        let users = ids(&["a", "b", "c", "d", "e"]);
        let assignment = GroupAssignment::from_genes(&users, &[2, 0, 2, 0, 2]).unwrap();

        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.members(0).unwrap(), &ids(&["b", "d"])[..]);
        assert_eq!(assignment.members(2).unwrap(), &ids(&["a", "c", "e"])[..]);
        assert!(assignment.members(1).is_none());
        assert_eq!(assignment.sizes(), vec![2, 3]);
        assert_eq!(assignment.group_of(&UserId::from("c")), Some(2));
        assert_eq!(assignment.group_of(&UserId::from("z")), None);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(GroupAssignment::from_genes(&ids(&["a"]), &[0, 1]).is_err());
    }

    #[test]
    fn test_json_shape() {
        let assignment =
            GroupAssignment::from_genes(&[UserId::from(5u64), UserId::from(9u64)], &[1, 0])
                .unwrap();
        let json = serde_json::to_string(&assignment).unwrap();
        assert_eq!(json, r#"{"0":["9"],"1":["5"]}"#);
    }
}
