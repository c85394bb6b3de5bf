//! `SeaORM` entity definitions.

pub mod prelude;

pub mod customers;
pub mod invoice_line_items;
pub mod invoices;
pub mod organizations;
pub mod products;
pub mod sea_orm_active_enums;
pub mod tax_registrations;
