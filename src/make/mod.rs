//! Make-dialect backend primitives.
//!
//! The submodules build up from escaping rules ([`syntax`], [`shell`])
//! through the fragment and symbol model ([`fragment`], [`symbols`]) to the
//! [`makefile::Makefile`] aggregate and its [`writer::MakeWriter`].

pub mod error;
pub mod fragment;
pub mod makefile;
pub mod shell;
pub mod symbols;
pub mod syntax;
pub mod writer;

pub use error::MakeError;
pub use fragment::{Fragment, PathRef, Root, ToFragment, concat};
pub use makefile::{Flavor, Include, Makefile, Recipe, Rule, Shell};
pub use symbols::{Call, Function, Pattern, Variable};
pub use syntax::{SyntaxContext, escape};
pub use writer::MakeWriter;
