//! Flat category rows to a collapsible tree.
//!
//! [`domain`] holds the pure hierarchy builder and the interactive renderer
//! state machine; [`application`] loads rows, collects diagnostics and
//! produces the JSON and HTML artifacts; [`infrastructure`] provides the
//! filesystem and CSV implementations; [`cli`] is the command-line front end.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
