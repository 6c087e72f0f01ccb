//! Cargo manifests: `Cargo.toml` and `Cargo.lock`

mod lock;
mod manifest;

pub use lock::CargoLock;
pub use manifest::{CargoManifest, CargoToml, Package, Workspace};

use toml_edit::{Item, Value};

/// Replace a string item, keeping its surrounding whitespace and comments
pub(crate) fn set_string(item: &mut Item, new: &str) {
    match item.as_value_mut() {
        Some(value) => {
            let decor = value.decor().clone();
            *value = Value::from(new);
            *value.decor_mut() = decor;
        }
        None => *item = toml_edit::value(new),
    }
}
