/// Renovo: backend for planning and tracking home renovation projects
///
/// This library provides project, milestone and task management, budget
/// aggregation with variance alerts, document and photo storage, resource
/// procurement tracking and a REST API secured by an external identity provider.

// Core configuration and setup
pub mod config;

// Service error type mapped onto HTTP statuses
pub mod error;

// SQLite bootstrap and schema
pub mod db;

// Entities, status lifecycles and pure computations (budget, progress, overdue)
pub mod domain;

// Blob storage for uploads and EXIF extraction
pub mod storage;

// Identity provider client and session middleware
pub mod auth;

// Persistence and business operations, one service per aggregate
pub mod services;

// PDF project reports
pub mod export;

// Background overdue sweep
pub mod runtime;

// HTTP API layer - REST endpoints for every aggregate
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use domain::{BudgetAlert, BudgetTotals, Milestone, MilestoneStatus, Project, Resource, ResourceStatus};
pub use error::{ServiceError, ServiceResult};
pub use server::start_server;
