use serde::{Deserialize, Serialize};

use super::isbn::Isbn;
use crate::domain::error::DomainError;

/// 所蔵レコードの生成リクエスト
pub struct NewHolding {
    pub isbn: Isbn,
    pub library: String,
    pub branch: String,
    pub collection: Option<String>,
    pub call_number: Option<String>,
    pub digital_url: Option<String>,
    pub catalog_url: Option<String>,
    pub available: bool,
    pub copies: u32,
    pub holds: u32,
}

/// 図書館の1分館で観測された1冊分の所蔵。
/// 請求記号か電子版URLのどちらかを必ず持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    isbn: Isbn,
    library: String,
    branch: String,
    collection: Option<String>,
    call_number: Option<String>,
    digital_url: Option<String>,
    catalog_url: Option<String>,
    available: bool,
    copies: u32,
    holds: u32,
}

impl AvailabilityRecord {
    pub fn new(req: NewHolding) -> Result<Self, DomainError> {
        let branch = req.branch.trim().to_string();
        if branch.is_empty() {
            return Err(DomainError::EmptyBranchName);
        }

        let call_number = req.call_number.filter(|s| !s.trim().is_empty());
        let digital_url = req.digital_url.filter(|s| !s.trim().is_empty());
        if call_number.is_none() && digital_url.is_none() {
            return Err(DomainError::MissingShelfLocation {
                isbn: req.isbn,
                library: req.library,
                branch,
            });
        }

        Ok(Self {
            isbn: req.isbn,
            library: req.library.trim().to_string(),
            branch,
            collection: req.collection.filter(|s| !s.trim().is_empty()),
            call_number,
            digital_url,
            catalog_url: req.catalog_url,
            available: req.available,
            copies: req.copies,
            holds: req.holds,
        })
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn call_number(&self) -> Option<&str> {
        self.call_number.as_deref()
    }

    pub fn digital_url(&self) -> Option<&str> {
        self.digital_url.as_deref()
    }

    pub fn catalog_url(&self) -> Option<&str> {
        self.catalog_url.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn holds(&self) -> u32 {
        self.holds
    }
}
