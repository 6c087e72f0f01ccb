//! Composite updater

use std::sync::Arc;

use liftoff_core::Result;

use crate::traits::Updater;

/// Runs several updaters on the same file, in order
#[derive(Debug, Clone, Default)]
pub struct CompositeUpdater {
    updaters: Vec<Arc<dyn Updater>>,
}

impl CompositeUpdater {
    /// Create a composite from ordered stages
    pub fn new(updaters: Vec<Arc<dyn Updater>>) -> Self {
        Self { updaters }
    }

    /// Append a stage
    pub fn push(&mut self, updater: Arc<dyn Updater>) {
        self.updaters.push(updater);
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    /// Whether there are no stages
    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }
}

impl Updater for CompositeUpdater {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let mut current: Option<String> = content.map(str::to_string);
        for updater in &self.updaters {
            current = Some(updater.update_content(current.as_deref())?);
        }
        Ok(current.unwrap_or_default())
    }
}
