//! Record store: a single JSON file mapping dedup keys to the last subject sent.

mod error;
pub use error::StoreError;

mod file;
pub use file::{RecordStore, Records};
