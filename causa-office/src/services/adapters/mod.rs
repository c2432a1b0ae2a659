pub mod office_adapter;

pub use office_adapter::{OfficeAdapter, StoreKind};
