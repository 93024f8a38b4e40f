//! Command parsing, pending state and dispatch.
//!
//! This module holds the machinery every bot shares:
//!
//! ```text
//! text message
//!      │
//!      ▼
//! ┌───────────────┐   ParseResult   ┌──────────────┐  command + argument  ┌───────────┐
//! │ CommandParser │ ──────────────▶ │  Dispatcher  │ ───────────────────▶ │ Bot       │
//! └───────────────┘                 └──────────────┘                      │ handlers  │
//!         ▲                               │  ▲                            └───────────┘
//!         │                               ▼  │                                  │
//!  ┌──────────────┐                ┌──────────────┐                             ▼
//!  │ CommandTable │                │ PendingCache │                        MessageSink
//!  └──────────────┘                └──────────────┘
//! ```
//!
//! - [`table`] - static command definitions and help formatting
//! - [`parser`] - `/token argument` tokenizer
//! - [`pending`] - per-conversation follow-up questions with expiry
//! - [`dispatcher`] - effective command resolution and handler invocation
//! - [`markdown_response`] - messages shared by all bots

pub mod dispatcher;
pub mod markdown_response;
pub mod parser;
pub mod pending;
pub mod table;
