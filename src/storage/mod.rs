//!  The chunk log is organized through [chunk_storage::ChunkStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the records, split into `<year>/<month>/` folders.
//!   - Every calendar day has its own JSONL file, one [entities::Chunk] per line.
//!   - Files are append only. Nothing is rewritten in place.
//!   - Reading today's file at startup is strict, reading history for reports is lenient.

pub mod chunk_storage;
pub mod entities;
pub mod error;
