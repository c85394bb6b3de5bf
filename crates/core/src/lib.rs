//! Core invoicing logic for Invoicer.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and number formatting live here.
//!
//! # Modules
//!
//! - `invoice` - Issuance input validation, status rules, updates, and search terms
//! - `numbering` - Invoice number formatting and parsing
//! - `tax` - Tax registrations and GST supply classification

pub mod invoice;
pub mod numbering;
pub mod tax;
