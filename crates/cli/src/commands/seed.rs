//! Seed the database with demo data.
//!
//! Inserts two demo accounts (admin@admin.com / user@user.com, password
//! "password"), a small catalogue with sized options, and nothing else.
//! Idempotent: rerunning leaves existing rows alone.

use rust_decimal::Decimal;

use madrona_core::{ProductId, ProductOptionId, UserId};

use super::connect;

/// sha256("password") - demo accounts only.
const DEMO_PASSWORD_HASH: &str =
    "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

struct SeedUser {
    email: &'static str,
    role: &'static str,
}

struct SeedProduct {
    title: &'static str,
    description: &'static str,
    base_price: &'static str,
    options: &'static [SeedOption],
}

struct SeedOption {
    attribute: &'static str,
    value: &'static str,
    sku: &'static str,
    stock: i32,
    extra: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "admin@admin.com",
        role: "admin",
    },
    SeedUser {
        email: "user@user.com",
        role: "customer",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        title: "Linen Shirt",
        description: "A breathable linen shirt for warm weather.",
        base_price: "100.00",
        options: &[
            SeedOption {
                attribute: "SIZE",
                value: "M",
                sku: "SHIRT-M",
                stock: 12,
                extra: "0.00",
            },
            SeedOption {
                attribute: "SIZE",
                value: "XL",
                sku: "SHIRT-XL",
                stock: 5,
                extra: "25.00",
            },
        ],
    },
    SeedProduct {
        title: "Canvas Tote",
        description: "Heavy canvas tote with internal pocket.",
        base_price: "35.50",
        options: &[SeedOption {
            attribute: "COLOUR",
            value: "Natural",
            sku: "TOTE-NAT",
            stock: 40,
            extra: "0.00",
        }],
    },
    SeedProduct {
        title: "Enamel Mug",
        description: "Campfire-proof enamel mug.",
        base_price: "18.00",
        options: &[],
    },
];

/// Seed demo users, products, and options.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    tracing::info!("Connected to database");

    for user in USERS {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, is_verified)
             VALUES ($1, $2, $3, $4::user_role, TRUE)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(UserId::generate())
        .bind(user.email)
        .bind(DEMO_PASSWORD_HASH)
        .bind(user.role)
        .execute(&pool)
        .await?;
        tracing::info!(email = user.email, role = user.role, "seeded user");
    }

    for product in PRODUCTS {
        let product_id: Option<ProductId> = sqlx::query_scalar(
            "INSERT INTO products (id, title, description, base_price, status)
             SELECT $1, $2, $3, $4, 'available'
             WHERE NOT EXISTS (SELECT 1 FROM products WHERE title = $2)
             RETURNING id",
        )
        .bind(ProductId::generate())
        .bind(product.title)
        .bind(product.description)
        .bind(product.base_price.parse::<Decimal>()?)
        .fetch_optional(&pool)
        .await?;

        let Some(product_id) = product_id else {
            tracing::info!(title = product.title, "product already seeded, skipping");
            continue;
        };

        for option in product.options {
            sqlx::query(
                "INSERT INTO product_options (id, product_id, attribute, value, sku, stock, extra)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(ProductOptionId::generate())
            .bind(product_id)
            .bind(option.attribute)
            .bind(option.value)
            .bind(option.sku)
            .bind(option.stock)
            .bind(option.extra.parse::<Decimal>()?)
            .execute(&pool)
            .await?;
        }
        tracing::info!(
            title = product.title,
            options = product.options.len(),
            "seeded product"
        );
    }

    tracing::info!("Seeding complete!");
    Ok(())
}
