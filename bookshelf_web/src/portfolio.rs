use itertools::Itertools;
use serde::{Deserialize, Serialize};

use bookshelf_backend::api::{ComplexBook, ReadStatus};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Number of library entries per read status
pub struct PortfolioSummary {
    pub unread: usize,
    pub reading: usize,
    pub read: usize,
    pub total: usize,
}

impl PortfolioSummary {
    pub fn from_books<'a>(books: impl IntoIterator<Item = &'a ComplexBook>) -> Self {
        let counts = books.into_iter().counts_by(|book| book.read_status);
        let count = |status: ReadStatus| counts.get(&status).copied().unwrap_or_default();

        PortfolioSummary {
            unread: count(ReadStatus::Unread),
            reading: count(ReadStatus::Reading),
            read: count(ReadStatus::Read),
            total: counts.values().sum(),
        }
    }

    pub fn count(&self, status: ReadStatus) -> usize {
        match status {
            ReadStatus::Unread => self.unread,
            ReadStatus::Reading => self.reading,
            ReadStatus::Read => self.read,
        }
    }
}
