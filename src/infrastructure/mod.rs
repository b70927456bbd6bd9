//! Adapters for the domain ports: state stores, the REST gateway, key files
//! and secp256k1 signing.

pub mod in_memory;
pub mod keys;
pub mod rest;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod signing;
