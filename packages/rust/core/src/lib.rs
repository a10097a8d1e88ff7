//! Stage orchestration for docvendor.
//!
//! Each stage reads its inputs from disk, transforms them, and writes its
//! outputs back; stages hand off only through the file system:
//! [`vendor`] → [`sanitize`] → [`rehydrate`]. [`pipeline`] runs all three
//! in order.

pub mod pipeline;
pub mod rehydrate;
pub mod sanitize;
pub mod vendor;
