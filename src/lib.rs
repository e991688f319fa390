//! configure-feedback drives the feedback exchange of a wiki's configure
//! screen: a form snapshot goes out as `multipart/form-data`, and a
//! control-byte record stream comes back and is applied to the page.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] owns the wire formats: request fields, the multipart encoder, and
//!   the record-protocol parser.
//! - [`page`] models the configure screen as typed data (forms, controls,
//!   status elements) and knows how to snapshot a form and apply records.
//! - [`core`] runs exchanges against the network, classifies surfaced errors,
//!   and holds the screen's navigation state and default-value links.
//! - [`utils`] carries URL joining, error-page cleanup, and logging.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod page;
pub mod utils;
