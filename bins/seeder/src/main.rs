//! Database seeder for Invoicer development and testing.
//!
//! Seeds a demo organization with a GST registration, a customer, and a few
//! stocked products. Every row has a fixed id, so running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use invoicer_db::entities::{customers, organizations, products, tax_registrations};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

/// Demo organization ID (consistent for all seeds)
const DEMO_ORG_ID: Uuid = Uuid::from_u128(1);
/// Demo registration ID
const DEMO_REGISTRATION_ID: Uuid = Uuid::from_u128(2);
/// Demo customer ID
const DEMO_CUSTOMER_ID: Uuid = Uuid::from_u128(3);

/// GSTIN of the demo organization (Karnataka).
const DEMO_GSTIN: &str = "29ABCDE1234F1Z5";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = invoicer_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo organization...");
    seed_organization(&db).await;

    println!("Seeding tax registration...");
    seed_tax_registration(&db).await;

    println!("Seeding customer...");
    seed_customer(&db).await;

    println!("Seeding products...");
    seed_products(&db).await;

    println!("Seeding complete!");
}

async fn seed_organization(db: &DatabaseConnection) {
    if organizations::Entity::find_by_id(DEMO_ORG_ID)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo organization already exists, skipping...");
        return;
    }

    let org = organizations::ActiveModel {
        id: Set(DEMO_ORG_ID),
        name: Set("Acme Traders".to_string()),
        legal_name: Set(Some("Acme Traders Private Limited".to_string())),
        invoice_prefix: Set(Some("ACME".to_string())),
        email: Set(Some("billing@acme.example".to_string())),
        phone: Set(Some("+918041234567".to_string())),
        address: Set(Some("4th Floor, 80 Feet Road, Indiranagar, Bengaluru".to_string())),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = org.insert(db).await {
        eprintln!("Failed to insert demo organization: {e}");
    } else {
        println!("  Created demo organization: Acme Traders (prefix ACME)");
    }
}

async fn seed_tax_registration(db: &DatabaseConnection) {
    if tax_registrations::Entity::find_by_id(DEMO_REGISTRATION_ID)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Tax registration already exists, skipping...");
        return;
    }

    let registration = tax_registrations::ActiveModel {
        id: Set(DEMO_REGISTRATION_ID),
        organization_id: Set(DEMO_ORG_ID),
        registration_number: Set(DEMO_GSTIN.to_string()),
        jurisdiction_code: Set(DEMO_GSTIN[..2].to_string()),
        details: Set(Some(serde_json::json!({
            "legal_name": "Acme Traders Private Limited",
            "trade_name": "Acme Traders",
            "state": "Karnataka"
        }))),
        next_sequence: Set(1),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = registration.insert(db).await {
        eprintln!("Failed to insert tax registration: {e}");
    } else {
        println!("  Created tax registration: {DEMO_GSTIN}");
    }
}

async fn seed_customer(db: &DatabaseConnection) {
    if customers::Entity::find_by_id(DEMO_CUSTOMER_ID)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo customer already exists, skipping...");
        return;
    }

    let customer = customers::ActiveModel {
        id: Set(DEMO_CUSTOMER_ID),
        first_name: Set("Priya".to_string()),
        last_name: Set("Sharma".to_string()),
        email: Set(Some("priya.sharma@example.com".to_string())),
        phone: Set(Some("+919876543210".to_string())),
        tax_details: Set(Some(serde_json::json!({ "gstin": "07PQRSX6789K1Z2" }))),
        shipping_address: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = customer.insert(db).await {
        eprintln!("Failed to insert demo customer: {e}");
    } else {
        println!("  Created demo customer: Priya Sharma");
    }
}

async fn seed_products(db: &DatabaseConnection) {
    // (id suffix, name, sku, unit price in paise, stock)
    let catalogue: [(u128, &str, &str, i64, i32); 3] = [
        (0x10, "Steel Water Bottle 1L", "BTL-STL-1L", 49_900, 120),
        (0x11, "Cotton Tote Bag", "BAG-CTN-01", 19_900, 250),
        (0x12, "Bamboo Toothbrush (4 pack)", "BRS-BMB-04", 29_900, 80),
    ];

    let mut inserted = 0;
    for (suffix, name, sku, price_paise, stock) in catalogue {
        let id = Uuid::from_u128(suffix);
        if products::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            continue;
        }

        let product = products::ActiveModel {
            id: Set(id),
            organization_id: Set(DEMO_ORG_ID),
            name: Set(name.to_string()),
            sku: Set(Some(sku.to_string())),
            unit_price: Set(Decimal::new(price_paise, 2)),
            cost_price: Set(None),
            current_stock: Set(stock),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = product.insert(db).await {
            eprintln!("Failed to insert product {sku}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Created {inserted} products");
}
