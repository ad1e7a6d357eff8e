//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep web-layer collaborators decoupled from storage details.

pub mod guestbook_service;
