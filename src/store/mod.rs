//! Data store clients
//!
//! Both stores sit behind traits so the retrieval coordinator (and its
//! tests) never touch a concrete backend. Production wiring uses Postgres
//! and an HTTP vector store; tests substitute canned implementations.

mod relational;
mod vector;

pub use relational::{FloatDateRange, PgRelationalStore, RelationalStore};
pub use vector::{HttpVectorStore, VectorStore};
