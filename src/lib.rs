pub mod builder;
pub mod codec;
pub mod config;
pub mod consts;
pub mod dump;
pub mod dynamic;
pub mod error;
pub mod header;
pub mod ident;
pub mod note;
pub mod object;
pub mod program_header;
pub mod relocation;
pub mod section_header;
pub mod strtab;
pub mod symbol;

#[cfg(test)]
mod headers_tests;
#[cfg(test)]
mod test_utils;
