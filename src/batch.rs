//! In-memory queue of labels waiting for a combined export.

use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

use crate::label::LabelRequest;

/// Length of the display id attached to each batch item.
///
/// 62^8 possible ids; collisions are possible and harmless because items are
/// addressed by position only.
pub const ID_LEN: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Fill in both username and password.")]
    MissingFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub id: String,
    pub username: String,
    pub password: String,
}

impl BatchItem {
    /// Text shown for this item in the batch list.
    pub fn row(&self) -> String {
        format!("{} ({})", self.username, self.id)
    }

    pub fn request(&self) -> LabelRequest {
        LabelRequest::new(self.username.clone(), self.password.clone())
    }
}

pub fn short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// Ordered list of pending labels. Append and remove by position only.
#[derive(Debug, Default)]
pub struct BatchStore {
    items: Vec<BatchItem>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, username: &str, password: &str) -> Result<&BatchItem, ValidationError> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        self.items.push(BatchItem {
            id: short_id(),
            username: username.to_string(),
            password: password.to_string(),
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// Remove the item at the selected position, if any.
    pub fn remove(&mut self, selection: Option<usize>) -> Option<BatchItem> {
        let index = selection.filter(|&i| i < self.items.len())?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn requests(&self) -> Vec<LabelRequest> {
        self.items.iter().map(BatchItem::request).collect()
    }

    pub fn rows(&self) -> Vec<String> {
        self.items.iter().map(BatchItem::row).collect()
    }
}
