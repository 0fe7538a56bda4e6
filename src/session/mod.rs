//! Session persistence: the JSON file format and load/save helpers.

mod store;
mod types;

pub use store::{conventional_path, load, save, StoreError, FILE_SUFFIX};
pub use types::SessionFile;
