//! mkgen core library.
//!
//! Translates a serialized build graph into a GNU Makefile. The [`make`]
//! module models Makefile syntax and escaping, [`toolchain`] knows how
//! compilers and linkers are invoked, and [`generate`] walks a
//! [`graph::BuildGraph`] to produce the final text.

pub mod cli;
pub mod config;
pub mod environment;
pub mod generate;
pub mod graph;
pub mod make;
pub mod runner;
pub mod toolchain;
