//! Resilience core: GF(2⁸) Reed-Solomon erasure coding and Shamir secret
//! sharing over the same field.
//!
//! [`rs`] splits a byte payload into shards that tolerate losing any `m` of
//! them; [`sss`] splits a secret into shares that reveal nothing below a
//! configured threshold and reconstruct exactly at it. Both sit on the same
//! [`gf256`] field and [`poly`] arithmetic layer; [`rs`]'s erasure-correction
//! step additionally uses [`linalg`] to invert the matrix built from a
//! chunk's surviving shards.
pub mod config;
pub mod error;
pub mod gf256;
pub mod linalg;
pub mod poly;
pub mod rs;
pub mod share;
pub mod shard;
pub mod sss;
