//! Durable record of the dashboard grid.
//!
//! The layout is a flat JSON array of placed widget instances, persisted to
//! one human-readable file and replaced wholesale on every save. A missing
//! file means an empty dashboard; a corrupt file is logged and treated the
//! same so the host always starts.

mod error;
mod item;

pub use error::LayoutError;
pub use item::LayoutItem;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Layout store shared by the API surface and the lifecycle manager.
pub struct LayoutStore {
    path: PathBuf,
    items: RwLock<Vec<LayoutItem>>,
}

impl LayoutStore {
    /// Open the store backed by `path`, loading whatever is already there.
    pub fn open(path: &Path) -> Result<Self, LayoutError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LayoutError::Storage {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let items = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<LayoutItem>>(&raw) {
                Ok(mut items) => {
                    for item in &mut items {
                        normalize_item(item);
                    }
                    items
                }
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "Layout file is corrupt, starting with an empty dashboard"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read layout file, starting with an empty dashboard"
                );
                Vec::new()
            }
        };

        tracing::info!(
            path = %path.display(),
            widgets = items.len(),
            "Layout store ready"
        );

        Ok(Self {
            path: path.to_path_buf(),
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current layout, in stored order.
    pub fn items(&self) -> Vec<LayoutItem> {
        self.items.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Validate, normalize, persist, and install a full replacement layout.
    ///
    /// Returns the normalized items (ids assigned, configs objectified) so
    /// callers can hand the exact persisted state to reconciliation. Memory
    /// is only updated once the file write succeeded.
    pub fn replace(&self, items: Vec<LayoutItem>) -> Result<Vec<LayoutItem>, LayoutError> {
        let items = validate_items(items)?;

        let serialized = serde_json::to_string_pretty(&items)?;
        let tmp = self.path.with_extension("tmp");
        let persist_err = |source| LayoutError::Persist {
            path: self.path.display().to_string(),
            source,
        };
        fs::write(&tmp, serialized).map_err(persist_err)?;
        fs::rename(&tmp, &self.path).map_err(persist_err)?;

        let mut current = self.items.write().unwrap();
        *current = items.clone();

        metrics::gauge!("tessera_layout_items").set(items.len() as f64);
        tracing::info!(widgets = items.len(), "Layout saved");
        Ok(items)
    }
}

/// Normalize and validate a submitted layout.
///
/// Empty instance ids get a generated UUID; null configs become `{}`; a
/// non-object config, a missing widget type, or a duplicate instance id
/// rejects the whole submission with no partial mutation.
fn validate_items(mut items: Vec<LayoutItem>) -> Result<Vec<LayoutItem>, LayoutError> {
    for (index, item) in items.iter_mut().enumerate() {
        if item.widget_type_id.trim().is_empty() {
            return Err(LayoutError::MissingWidgetType { index });
        }
        normalize_item(item);
        if !item.config.is_object() {
            return Err(LayoutError::InvalidConfig {
                instance: item.instance_id.clone(),
            });
        }
    }

    let mut seen = std::collections::HashSet::new();
    for item in &items {
        if !seen.insert(item.instance_id.as_str()) {
            return Err(LayoutError::DuplicateInstance(item.instance_id.clone()));
        }
    }

    Ok(items)
}

fn normalize_item(item: &mut LayoutItem) {
    if item.instance_id.trim().is_empty() {
        item.instance_id = Uuid::new_v4().to_string();
    }
    if item.config.is_null() {
        item.config = Value::Object(Map::new());
    }
}
