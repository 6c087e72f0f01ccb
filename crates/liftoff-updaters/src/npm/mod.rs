//! npm manifests: `package.json`, `package-lock.json` and
//! `npm-shrinkwrap.json`

mod lock;
mod manifest;

pub use lock::PackageLockJson;
pub use manifest::{PackageJson, PackageJsonManifest, DEPENDENCY_FIELDS};
