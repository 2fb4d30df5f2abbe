pub mod json_store;
pub mod response_cache;
