// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Immutable table of supported document types.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ClipscanError, Result};
use crate::types::DocumentType;

/// Read-only set of document types, cheap to clone and share.
///
/// The first entry is the default selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRegistry {
    types: Arc<[DocumentType]>,
}

impl DocumentRegistry {
    /// Build a registry from an ordered list. Ids must be unique.
    pub fn new(types: Vec<DocumentType>) -> Result<Self> {
        if types.is_empty() {
            return Err(ClipscanError::InvalidRegistry(
                "at least one document type is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for dt in &types {
            if !seen.insert(dt.id.as_str()) {
                return Err(ClipscanError::InvalidRegistry(format!(
                    "duplicate document type id {}",
                    dt.id
                )));
            }
        }
        Ok(Self {
            types: types.into(),
        })
    }

    /// Look up a document type by its `ocrType` code.
    pub fn get(&self, id: &str) -> Option<&DocumentType> {
        self.types.iter().find(|dt| dt.id == id)
    }

    /// Like [`get`](Self::get) but reports unknown ids as an error.
    pub fn require(&self, id: &str) -> Result<&DocumentType> {
        self.get(id)
            .ok_or_else(|| ClipscanError::UnknownDocumentType(id.to_string()))
    }

    pub fn default_type(&self) -> &DocumentType {
        &self.types[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self {
            types: vec![
                DocumentType::new("01", "Domestic passport", true),
                DocumentType::new("10", "Overseas passport", true),
                DocumentType::new("02", "National ID card", false),
                DocumentType::new("03", "Driver's license", false),
                DocumentType::new("04", "Credit card", false),
            ]
            .into(),
        }
    }
}
