//! EEP Wizard - Guided engineering protocol generation
//!
//! Turns a free-text project description into a structured, phased
//! engineering protocol by conversing with a text-generation engine. The
//! engine is told to answer in a fixed JSON schema; replies are extracted,
//! repaired when slightly malformed, parsed, and used to drive a small
//! session state machine. Replies that cannot be recovered are kept in an
//! exportable error log.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
