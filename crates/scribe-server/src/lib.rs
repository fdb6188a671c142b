//! # scribe-server
//!
//! The outer shell around the workflow core:
//!
//! - [`routes`] — axum webhook ingress (`/webhook/card`, `/webhook/event`)
//!   plus `/healthz` and `/metrics`
//! - [`commands`] — chat text-command parsing
//! - [`lark`] — Lark/Feishu client implementing the core's `Transport` and
//!   `DocumentSink` traits
//! - [`metrics`] — Prometheus recorder install and render
//!
//! The shell owns transport-envelope parsing; the core only ever sees typed
//! `(conversation, action)` events and answers with views.

#![deny(unsafe_code)]

pub mod commands;
pub mod lark;
pub mod metrics;
pub mod routes;
