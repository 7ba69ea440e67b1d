//! Stored next-page state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compiler::{CompiledStatement, SqlValue};
use crate::plan::QueryPlan;

/// One pre-compiled page, keyed by its token.
///
/// `current_offset` and `current_page` describe the page this context's
/// statement returns, not the page that caused it to be issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationContext {
    pub token: String,
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub page_size: u64,
    pub current_page: u64,
    pub current_offset: u64,
    pub total_rows: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub original_plan: QueryPlan,
}

impl PaginationContext {
    pub fn statement(&self) -> CompiledStatement {
        CompiledStatement::new(self.sql.clone(), self.params.clone())
    }

    /// Expired from `expires_at` onward
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_rows, self.page_size)
    }
}

/// `ceil(total_rows / page_size)`; zero when either is zero
pub fn total_pages(total_rows: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size)
}

/// Page number (1-based) served by a statement starting at `offset`
pub fn page_number(offset: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    offset / page_size + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(125, 10), 13);
        assert_eq!(total_pages(120, 10), 12);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(0, 10), 1);
        assert_eq!(page_number(10, 10), 2);
        assert_eq!(page_number(25, 10), 3);
    }
}
