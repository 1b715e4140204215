use ledatronic_schema::Snapshot;
use tracing::trace;

use crate::host::ItemSink;

/// A host item fed from one decoded data point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBinding {
    pub item_path: String,
    pub data_point: String,
}

/// Host items registered for updates.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    bindings: Vec<ItemBinding>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item for a data point; the data point is matched lower-cased.
    ///
    /// Re-binding an item path replaces its previous data point.
    pub fn bind_data_point(&mut self, item_path: &str, data_point: &str) {
        let data_point = data_point.trim().to_lowercase();
        match self.bindings.iter_mut().find(|b| b.item_path == item_path) {
            Some(binding) => binding.data_point = data_point,
            None => self.bindings.push(ItemBinding {
                item_path: item_path.to_string(),
                data_point,
            }),
        }
    }

    pub fn bindings(&self) -> &[ItemBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Copy bound values from `snapshot` into `sink`.
    ///
    /// Absent and falsy values (including integer 0) are skipped, so an item
    /// keeps its previous value when the data point drops to zero.
    pub fn update_item_values(&self, snapshot: &Snapshot, sink: &dyn ItemSink, caller: &str) -> usize {
        let mut updated = 0;
        for binding in &self.bindings {
            match snapshot.get(&binding.data_point) {
                Some(value) if value.is_truthy() => {
                    sink.set_item(&binding.item_path, value, caller);
                    updated += 1;
                }
                _ => trace!(item = %binding.item_path, data_point = %binding.data_point, "skipping empty value"),
            }
        }
        updated
    }
}
