//! Conversion logic: charset meta rewriting and the two converters.

pub mod fixed_list;
pub mod meta_charset;
pub mod tree;
