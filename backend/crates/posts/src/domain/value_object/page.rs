//! Pagination

use serde::Serialize;

use crate::error::{PostError, PostResult};

/// A requested page: 1-indexed `page` of `limit` posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Both parameters or neither. `limit` must be positive and the
    /// first index non-negative.
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> PostResult<Option<Self>> {
        match (page, limit) {
            (None, None) => Ok(None),
            (Some(page), Some(limit)) => Self::new(page, limit).map(Some),
            _ => Err(PostError::InvalidArgument(
                "page and limit must be given together".to_string(),
            )),
        }
    }

    pub fn new(page: i64, limit: i64) -> PostResult<Self> {
        if limit <= 0 {
            return Err(PostError::InvalidArgument("limit must be positive".to_string()));
        }
        let request = Self { page, limit };
        if request.start_index()? < 0 {
            return Err(PostError::InvalidArgument("page must be at least 1".to_string()));
        }
        Ok(request)
    }

    /// `(page - 1) * limit`
    pub fn start_index(&self) -> PostResult<i64> {
        self.page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(self.limit))
            .ok_or_else(|| PostError::InvalidArgument("page is out of range".to_string()))
    }

    /// `page * limit`
    pub fn end_index(&self) -> PostResult<i64> {
        self.page
            .checked_mul(self.limit)
            .ok_or_else(|| PostError::InvalidArgument("page is out of range".to_string()))
    }

    /// Descriptors for the neighbouring pages given the total count.
    pub fn links(&self, total: i64) -> PostResult<PageLinks> {
        let next = (self.end_index()? < total).then(|| PageRequest {
            page: self.page + 1,
            limit: self.limit,
        });
        let previous = (self.start_index()? > 0).then(|| PageRequest {
            page: self.page - 1,
            limit: self.limit,
        });
        Ok(PageLinks { next, previous })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageLinks {
    pub next: Option<PageRequest>,
    pub previous: Option<PageRequest>,
}
