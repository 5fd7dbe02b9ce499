use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{PropertyType, SearchHistory, SearchHistoryId, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{Repositories, SearchHistoryRepository};

pub const DEFAULT_RECENT_LIMIT: u32 = 10;
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// How often a search term was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTally {
    pub value: String,
    pub count: u64,
}

pub struct SearchHistoryService {
    history: Arc<dyn SearchHistoryRepository>,
}

impl SearchHistoryService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            history: repositories.search_history.clone(),
        }
    }

    /// Newest first.
    pub fn for_user(&self, user_id: UserId) -> ServiceResult<Vec<SearchHistory>> {
        Ok(self.history.for_user(user_id, None)?)
    }

    pub fn recent(&self, user_id: UserId, limit: u32) -> ServiceResult<Vec<SearchHistory>> {
        if limit == 0 {
            return Err(ServiceError::InvalidArgument(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(self.history.for_user(user_id, Some(limit))?)
    }

    pub fn delete(&self, id: SearchHistoryId) -> ServiceResult<()> {
        if !self.history.delete(id)? {
            return Err(ServiceError::not_found("search history", id));
        }
        Ok(())
    }

    pub fn clear(&self, user_id: UserId) -> ServiceResult<u64> {
        let removed = self.history.clear_for_user(user_id)?;
        tracing::info!(user_id, removed, "search history cleared");
        Ok(removed)
    }

    pub fn count(&self, user_id: UserId) -> ServiceResult<u64> {
        Ok(self.history.count_for_user(user_id)?)
    }

    pub fn top_cities(&self, limit: u32) -> ServiceResult<Vec<SearchTally>> {
        Ok(self
            .history
            .top_cities(limit)?
            .into_iter()
            .map(|(value, count)| SearchTally { value, count })
            .collect())
    }

    /// Every searched property type, most popular first.
    pub fn top_property_types(&self) -> ServiceResult<Vec<SearchTally>> {
        let every_type = PropertyType::ordered().len() as u32;
        Ok(self
            .history
            .top_property_types(every_type)?
            .into_iter()
            .map(|(kind, count)| SearchTally {
                value: kind.to_string(),
                count,
            })
            .collect())
    }
}
