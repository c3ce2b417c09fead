//! File I/O for record tables.
//!
//! The engine itself owns no file format; this module is the glue that turns
//! JSON Lines files into bound inputs and result tables back into files.

pub mod compression;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;
