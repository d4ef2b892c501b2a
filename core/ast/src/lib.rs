#![warn(clippy::pedantic)]
//! Source syntax tree for the rtseq host-language subset.
//!
//! [`builder::Builder`] turns tree-sitter-python parse trees into the `Rc`-linked
//! nodes of [`nodes`]; [`arena::Arena`] indexes the resulting source files and
//! top-level function definitions.
pub mod arena;
pub mod builder;
pub mod errors;
pub mod nodes;
pub(crate) mod nodes_impl;
