//! Palaver wire grammar.
//!
//! The protocol is plain text: a client sends a chunk of bytes, the server
//! splits it into `/`-delimited command segments and decodes each segment
//! into a typed [`Command`]. Decoding never fails - anything the grammar
//! does not recognize becomes [`Command::Unknown`] or [`Command::Syntax`],
//! which the server reports back as an error line.
//!
//! This crate is pure logic with no I/O and no runtime dependencies, so the
//! grammar can be tested exhaustively without a socket in sight.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;

pub use command::{Command, parse_line, split_segments};
