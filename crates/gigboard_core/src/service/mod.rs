//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into hierarchy, recurrence and review APIs.
//! - Keep callers decoupled from storage details.

pub mod project_service;
pub mod recurrence_service;
pub mod review_service;
