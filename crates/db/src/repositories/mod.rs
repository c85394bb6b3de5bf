//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod customer;
pub mod error;
pub mod invoice;
pub mod organization;
pub mod stock;
pub mod tax_registration;

pub use customer::{CreateCustomerInput, CustomerRepository};
pub use error::InvoiceRepoError;
pub use invoice::{InvoiceDetails, InvoiceFilter, InvoiceRepository, LineItemDetails};
pub use organization::{CreateOrganizationInput, OrganizationRepository};
pub use stock::StockLedger;
pub use tax_registration::{RegisterInput, TaxRegistrationRepository};
