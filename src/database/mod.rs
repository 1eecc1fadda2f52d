/*!
 * SQLite persistence for the translation memory.
 *
 * - `connection`: connection handling and async access
 * - `schema`: table definitions and schema versioning
 * - `memory_store`: `CacheStore` implementation
 */

pub mod schema;
pub mod connection;
pub mod memory_store;

pub use connection::DatabaseConnection;
pub use memory_store::SqliteCacheStore;
