//! Storage Adapters

mod file_asset_store;

pub use file_asset_store::FileAssetStore;
