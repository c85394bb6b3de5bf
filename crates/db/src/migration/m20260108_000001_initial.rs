//! Initial database migration.
//!
//! Creates the invoicing schema: enums, tables, constraints, indexes, and the
//! `updated_at` trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: DIRECTORY TABLES
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(TAX_REGISTRATIONS_SQL).await?;
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;

        // ============================================================
        // PART 3: INVOICES
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(INVOICE_LINE_ITEMS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE invoice_status AS ENUM (
    'pending',
    'partially_paid',
    'paid',
    'overdue',
    'cancelled'
);

CREATE TYPE tax_type AS ENUM ('intra_state', 'inter_state');
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    legal_name VARCHAR(255),
    invoice_prefix VARCHAR(20),
    email VARCHAR(255),
    phone VARCHAR(32),
    address TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoice_prefix_no_separator CHECK (invoice_prefix IS NULL OR strpos(invoice_prefix, '/') = 0)
);

-- Organizations with their own prefix never share it. Blank and missing
-- prefixes fall back to the configured default and are not indexed.
CREATE UNIQUE INDEX uq_organizations_invoice_prefix
    ON organizations (upper(btrim(invoice_prefix)))
    WHERE btrim(invoice_prefix) <> '';
";

const TAX_REGISTRATIONS_SQL: &str = r"
CREATE TABLE tax_registrations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    registration_number VARCHAR(32) NOT NULL,
    jurisdiction_code VARCHAR(2) NOT NULL,
    details JSONB,
    next_sequence BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_tax_registrations_org_number UNIQUE (organization_id, registration_number),
    -- The jurisdiction segment identifies the registration within its organization.
    CONSTRAINT uq_tax_registrations_org_jurisdiction UNIQUE (organization_id, jurisdiction_code),
    CONSTRAINT chk_next_sequence_positive CHECK (next_sequence >= 1),
    CONSTRAINT chk_registration_no_separator CHECK (strpos(registration_number, '/') = 0)
);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255),
    phone VARCHAR(32),
    tax_details JSONB,
    shipping_address JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_customers_name ON customers(lower(first_name), lower(last_name));
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    sku VARCHAR(64),
    unit_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    cost_price NUMERIC(19, 4),
    current_stock INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_current_stock_non_negative CHECK (current_stock >= 0),
    CONSTRAINT chk_unit_price_non_negative CHECK (unit_price >= 0)
);

CREATE INDEX idx_products_org ON products(organization_id);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    invoice_number VARCHAR(64) NOT NULL,
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
    tax_registration_number VARCHAR(32) NOT NULL,
    tax_type tax_type NOT NULL,
    sequence_number BIGINT NOT NULL,
    invoice_date DATE NOT NULL,
    due_date DATE,
    total_amount NUMERIC(19, 4) NOT NULL,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    advance_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    due_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status invoice_status NOT NULL DEFAULT 'pending',
    shipping_address JSONB NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    cancelled_at TIMESTAMPTZ,

    CONSTRAINT uq_invoices_org_invoice_number UNIQUE (organization_id, invoice_number),
    CONSTRAINT uq_invoices_registration_sequence UNIQUE (organization_id, tax_registration_number, sequence_number),
    CONSTRAINT chk_amounts_non_negative CHECK (
        total_amount >= 0 AND discount_amount >= 0 AND tax_amount >= 0
        AND advance_amount >= 0 AND due_amount >= 0
    ),
    CONSTRAINT chk_advance_within_total CHECK (advance_amount <= total_amount),
    CONSTRAINT chk_due_after_invoice CHECK (due_date IS NULL OR due_date >= invoice_date),
    CONSTRAINT chk_cancelled_at CHECK ((status = 'cancelled') = (cancelled_at IS NOT NULL))
);

CREATE INDEX idx_invoices_org ON invoices(organization_id, id);
CREATE INDEX idx_invoices_customer ON invoices(customer_id);
CREATE INDEX idx_invoices_status ON invoices(status);
";

const INVOICE_LINE_ITEMS_SQL: &str = r#"
CREATE TABLE invoice_line_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
    "position" INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    line_total NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_line_items_position UNIQUE (invoice_id, "position"),
    CONSTRAINT chk_quantity_positive CHECK (quantity > 0),
    CONSTRAINT chk_line_unit_price_non_negative CHECK (unit_price >= 0)
);

CREATE INDEX idx_line_items_product ON invoice_line_items(product_id);
"#;

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_organizations_updated_at BEFORE UPDATE ON organizations
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_tax_registrations_updated_at BEFORE UPDATE ON tax_registrations
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_customers_updated_at BEFORE UPDATE ON customers
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_products_updated_at BEFORE UPDATE ON products
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_invoices_updated_at BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

-- Issued numbers are permanent.
CREATE OR REPLACE FUNCTION prevent_invoice_number_change()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.invoice_number <> OLD.invoice_number
        OR NEW.sequence_number <> OLD.sequence_number
        OR NEW.tax_registration_number <> OLD.tax_registration_number THEN
        RAISE EXCEPTION 'invoice number of % cannot change', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_invoices_number_immutable BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION prevent_invoice_number_change();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS invoice_line_items CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS tax_registrations CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;

DROP FUNCTION IF EXISTS prevent_invoice_number_change();
DROP FUNCTION IF EXISTS set_updated_at();

DROP TYPE IF EXISTS tax_type;
DROP TYPE IF EXISTS invoice_status;
";
