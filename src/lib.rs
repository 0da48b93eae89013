//! xcmd — an embeddable command-script interpreter.
//!
//! No AST, no parse-tree allocation: the interpreter re-scans the source
//! text on every pass, driven entirely by a cursor position held in
//! [`Context`]. Host code registers interfaces (name plus callback), the
//! context is fed a script, and [`Context::run`] repeatedly resolves the
//! next name against the sorted symbol table and invokes it.
//!
//! # Modules
//!
//! - [`lexer`] — byte-oriented cursor: blank/comment skipping, peeking
//! - [`symbols`] — sorted `(name, callback)` table and lookup
//! - [`context`] — [`Context`], [`Status`], the `run`/`step` driver
//! - [`control`] — built-in control words (`if`/`then`/`elseif`/`else`/
//!   `endif`, `or`/`and`, `yield`)
//! - [`params`] — parameter extraction: quoted/unquoted strings, numeric
//!   coercion
//! - [`error`] — [`HostError`], raised by host-facing setup calls
//!
//! # Example
//!
//! ```
//! use xcmd::{Context, FuncInfo, Status};
//!
//! fn greet(ctx: &mut Context<'_, ()>) -> Status {
//!     let mut name = [0u8; 32];
//!     match ctx.pop_string(&mut name) {
//!         Status::Ok => Status::Ok,
//!         st => st,
//!     }
//! }
//!
//! let funcs = vec![FuncInfo::new("greet", greet)];
//! let mut ctx: Context<'_, ()> = Context::open(funcs, None).unwrap();
//! ctx.load("greet \"world\"");
//! assert_eq!(ctx.run(), Status::Ok);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
// Targeted pedantic allows — each justified:
#![allow(clippy::module_name_repetitions)] // `FuncInfo`, `HostError` read fine at call sites
#![allow(clippy::missing_errors_doc)] // Status/HostError variants are documented at the enum

pub mod context;
pub mod control;
pub mod error;
pub mod lexer;
pub mod params;
pub mod symbols;

pub use context::{Context, EscapeDetectFn, EscapeParseFn, SeparatorFn, Status};
pub use error::HostError;
pub use params::MAX_TOKEN_LEN;
pub use symbols::FuncInfo;
