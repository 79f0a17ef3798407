//! ulc_spec: Compiler for ULC lexical specs.
//!
//! A spec file starts with a UTF-8 BOM and a `#@ulc-c<version>[:parent]`
//! magic line, followed by `NAME: value` directives, an optional `%%`
//! separator and token lines. [`UlcSpecCompiler`] turns a spec and its
//! ancestors into a [`CompiledSpec`]: char classes, comment and quote
//! types, number formats and the token registry a scanner runs on.
//!
//! ```no_run
//! use ulc_spec::{CompileOptions, UlcSpecCompiler};
//!
//! let mut compiler = UlcSpecCompiler::new(CompileOptions::default())?;
//! let spec = compiler.compile_file("lang.ulc".as_ref())?;
//! println!("{}", spec.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod char_class;
pub mod compiler;
pub mod error;
pub mod header;
pub mod keyword;
pub mod marker;
pub mod options;
pub mod output;
pub mod resolver;
pub mod tokdef;

pub(crate) mod body;
pub(crate) mod builder;
pub(crate) mod directives;

pub use builder::{IdMaxLength, LexFlags, NumberPrefix, PrependInput};
pub use char_class::{CharClass, CharClassTable, CharRange};
pub use compiler::UlcSpecCompiler;
pub use error::{ErrorClass, SpecError, SpecErrorKind, SpecResult};
pub use header::{SpecVersion, SUPPORTED_VERSION};
pub use marker::{CommentFlags, CommentType, MarkerSet, QuoteFlags, QuoteType};
pub use options::{parse_options, parse_options_file, CompileOptions, OptionsError};
pub use output::{CompiledSpec, NumberLiteral};
pub use resolver::{DirResolver, MemoryResolver, NoResolver, SpecResolver};
pub use tokdef::{KeywordDef, KeywordKind, ReservedToken, TokenRegistry, TokenView};
