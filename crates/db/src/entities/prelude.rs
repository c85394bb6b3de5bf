//! Entity re-exports.

pub use super::customers::Entity as Customers;
pub use super::invoice_line_items::Entity as InvoiceLineItems;
pub use super::invoices::Entity as Invoices;
pub use super::organizations::Entity as Organizations;
pub use super::products::Entity as Products;
pub use super::tax_registrations::Entity as TaxRegistrations;
