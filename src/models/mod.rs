//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema PostgreSQL.

pub mod auth;
pub mod user;
pub mod vehicle;
