//! Form state and the event handlers that drive rendering, batching and export.

use anyhow::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::batch::{BatchStore, ValidationError};
use crate::config::load_batch_csv;
use crate::label::{LabelRenderer, LabelRequest, preview};
use crate::pdf::export_pdf;

/// The widgets the controller talks to: preview, batch list, dialogs.
pub trait Frontend {
    fn show_preview(&mut self, preview: &RgbImage) -> Result<()>;

    /// Replace the visible batch list with `rows`.
    fn show_rows(&mut self, rows: &[String]);

    /// Modal save-file prompt; `None` when the user cancels.
    fn ask_save_path(&mut self) -> Option<PathBuf>;

    fn warn(&mut self, message: &str);

    fn info(&mut self, message: &str);
}

/// Everything the form displays, owned by the controller.
#[derive(Debug, Default)]
pub struct UiState {
    pub username: String,
    pub password: String,
    /// Selected position in the batch list.
    pub selection: Option<usize>,
    /// Batch list rows, always in the same order as the batch store.
    pub rows: Vec<String>,
    pub preview: Option<RgbImage>,
}

pub struct FormController<F: Frontend> {
    frontend: F,
    renderer: LabelRenderer,
    batch: BatchStore,
    state: UiState,
}

impl<F: Frontend> FormController<F> {
    /// Build the controller and show the empty-form preview.
    pub fn new(renderer: LabelRenderer, frontend: F) -> Result<Self> {
        let mut controller = Self {
            frontend,
            renderer,
            batch: BatchStore::new(),
            state: UiState::default(),
        };
        controller.refresh_preview()?;
        Ok(controller)
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn batch(&self) -> &BatchStore {
        &self.batch
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    pub fn set_username(&mut self, text: &str) -> Result<()> {
        self.state.username = text.to_string();
        self.refresh_preview()
    }

    pub fn set_password(&mut self, text: &str) -> Result<()> {
        self.state.password = text.to_string();
        self.refresh_preview()
    }

    /// Select a list position; out-of-range positions clear the selection.
    pub fn select(&mut self, index: Option<usize>) {
        self.state.selection = index.filter(|&i| i < self.batch.len());
    }

    fn current_request(&self) -> LabelRequest {
        LabelRequest::new(self.state.username.clone(), self.state.password.clone())
    }

    fn refresh_preview(&mut self) -> Result<()> {
        let label = self.renderer.render(&self.state.username, &self.state.password);
        let image = preview(&label, self.renderer.layout().preview_size);
        self.frontend.show_preview(&image)?;
        self.state.preview = Some(image);
        Ok(())
    }

    fn sync_rows(&mut self) {
        self.state.rows = self.batch.rows();
        self.frontend.show_rows(&self.state.rows);
    }

    /// Export the current form as a one-page PDF.
    pub fn generate_individual(&mut self) -> Result<()> {
        let request = self.current_request();
        if !request.is_complete() {
            self.frontend.warn(&ValidationError::MissingFields.to_string());
            return Ok(());
        }
        let Some(path) = self.frontend.ask_save_path() else {
            return Ok(());
        };
        export_pdf(&path, &[request], &self.renderer)?;
        info!(path = %path.display(), "saved individual label");
        self.frontend.info("Label saved.");
        Ok(())
    }

    pub fn add_to_batch(&mut self) -> Result<()> {
        match self.batch.add(&self.state.username, &self.state.password) {
            Ok(item) => debug!(id = %item.id, "added batch item"),
            Err(e) => {
                self.frontend.warn(&e.to_string());
                return Ok(());
            }
        }
        self.sync_rows();
        self.state.username.clear();
        self.state.password.clear();
        self.refresh_preview()
    }

    pub fn remove_selected(&mut self) {
        if let Some(item) = self.batch.remove(self.state.selection) {
            debug!(id = %item.id, "removed batch item");
            self.state.selection = None;
            self.sync_rows();
        }
    }

    /// Export every batch item into one PDF. Does nothing for an empty batch.
    pub fn save_batch(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let Some(path) = self.frontend.ask_save_path() else {
            return Ok(());
        };
        export_pdf(&path, &self.batch.requests(), &self.renderer)?;
        info!(path = %path.display(), labels = self.batch.len(), "saved batch");
        self.frontend.info(&format!("Batch of {} labels saved.", self.batch.len()));
        Ok(())
    }

    /// Append every row of a `username,password` CSV to the batch.
    ///
    /// Rows with an empty field are skipped with a warning. Returns the number added.
    pub fn import_csv(&mut self, path: &Path) -> Result<usize> {
        let requests = load_batch_csv(path)?;
        let mut added = 0;
        for (line, request) in requests.iter().enumerate() {
            match self.batch.add(&request.username, &request.password) {
                Ok(_) => added += 1,
                Err(e) => self.frontend.warn(&format!("Row {}: {}", line + 1, e)),
            }
        }
        if added > 0 {
            self.sync_rows();
        }
        Ok(added)
    }
}
