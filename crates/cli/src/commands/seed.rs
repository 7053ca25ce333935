//! Catalog seeding command.

use rust_decimal::Decimal;

use super::CommandError;

/// Demo products: (name, description, price, category, featured).
const DEMO_PRODUCTS: &[(&str, &str, &str, &str, bool)] = &[
    (
        "Canvas Tote",
        "Heavy-duty cotton tote with reinforced straps.",
        "24.00",
        "bags",
        true,
    ),
    (
        "Ceramic Mug",
        "Stoneware mug, 350ml, dishwasher safe.",
        "14.50",
        "kitchen",
        true,
    ),
    (
        "Linen Throw",
        "Washed linen throw blanket, 130x170cm.",
        "89.00",
        "home",
        false,
    ),
    (
        "Walnut Serving Board",
        "End-grain walnut board, food-safe oil finish.",
        "65.00",
        "kitchen",
        false,
    ),
    (
        "Wool Beanie",
        "Merino wool rib-knit beanie.",
        "32.00",
        "apparel",
        true,
    ),
];

/// Insert demo products into an empty catalog.
///
/// Refuses to run when the catalog already has products, so it cannot
/// pollute a live store.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;

    if existing > 0 {
        return Err(CommandError::Invalid(format!(
            "catalog already has {existing} products; refusing to seed"
        )));
    }

    for (name, description, price, category, featured) in DEMO_PRODUCTS {
        let price: Decimal = price
            .parse()
            .map_err(|_| CommandError::Invalid(format!("bad seed price for {name}")))?;

        sqlx::query(
            r"
            INSERT INTO products (name, description, price, category, is_featured)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(featured)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeded {} products", DEMO_PRODUCTS.len());
    Ok(())
}
