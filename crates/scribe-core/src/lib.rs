//! # scribe-core
//!
//! Foundation types for the Scribe content-production workflow bot.
//!
//! This crate provides the shared vocabulary the other scribe crates depend on:
//!
//! - **Branded IDs**: [`ids::ConversationId`], [`ids::MessageRef`] as newtypes
//! - **Session model**: [`session::Session`] and [`session::WorkflowState`]
//! - **Actions**: [`action::Action`] — the typed payloads carried by card buttons
//! - **Views**: [`views::View`] — transport-agnostic card/message payloads
//! - **Errors**: [`errors::WorkflowError`] taxonomy via `thiserror`
//! - **Collaborator traits**: [`transport::Transport`], [`transport::DocumentSink`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other scribe crates.

#![deny(unsafe_code)]

pub mod action;
pub mod errors;
pub mod ids;
pub mod session;
pub mod transport;
pub mod views;
