use axum_catalog_api::{config::AppConfig, db::create_pool};
use sqlx::PgPool;
use uuid::Uuid;

// Fixed ids so repeated seeding is a no-op.
const DESK: &str = "9e107d9d-3720-4b4e-8f2a-1a9c582aeb11";
const CHAIR: &str = "3c6e0b8a-9c15-4c4f-a6d8-5b2e6a91bc22";
const LAMP: &str = "7f8d2a44-6b1e-4d3a-9c5f-e0a1b2c3dd33";
const SHELF: &str = "1b4e28ba-2fa1-4d3b-b16f-7cf48a9d4444";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_products(&pool).await?;
    seed_images(&pool).await?;
    seed_comments(&pool).await?;
    seed_similar(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &PgPool) -> anyhow::Result<()> {
    let products = vec![
        (DESK, "Walnut Desk", "Solid walnut, 140 by 70 cm", 45_000_i64),
        (CHAIR, "Oak Chair", "Stackable, oiled finish", 12_500),
        (LAMP, "Brass Desk Lamp", "Adjustable arm, warm light", 8_900),
        (SHELF, "Pine Bookshelf", "Five shelves, wall-mountable", 19_900),
    ];

    for (id, title, description, price) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(title)
        .bind(description)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_images(pool: &PgPool) -> anyhow::Result<()> {
    let images = vec![
        (
            "2a9b6c3d-1e0f-4a7b-8c2d-aa0000000001",
            DESK,
            "https://cdn.example.com/desk-front.jpg",
            true,
        ),
        (
            "5c4d3e2f-6a7b-4c1d-9e8f-aa0000000002",
            DESK,
            "https://cdn.example.com/desk-side.jpg",
            false,
        ),
        (
            "8e7f6a5b-4c3d-4e2f-a1b0-aa0000000003",
            CHAIR,
            "https://cdn.example.com/chair.jpg",
            false,
        ),
        (
            "b0a1c2d3-e4f5-4a6b-8c7d-aa0000000004",
            LAMP,
            "https://cdn.example.com/lamp.jpg",
            true,
        ),
    ];

    for (id, product_id, url, is_main) in images {
        sqlx::query(
            r#"
            INSERT INTO images (id, product_id, url, is_main)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(Uuid::parse_str(product_id)?)
        .bind(url)
        .bind(is_main)
        .execute(pool)
        .await?;
    }

    println!("Seeded images");
    Ok(())
}

async fn seed_comments(pool: &PgPool) -> anyhow::Result<()> {
    let comments = vec![
        (
            "6f5e4d3c-2b1a-4f0e-9d8c-bb0000000001",
            DESK,
            "mara",
            "Sturdy and easy to assemble.",
        ),
        (
            "0a1b2c3d-4e5f-4a6b-bc7d-bb0000000002",
            DESK,
            "jonas",
            "Surface scratches easily.",
        ),
        (
            "9d8c7b6a-5f4e-4d3c-a2b1-bb0000000003",
            CHAIR,
            "li",
            "Comfortable for long sessions.",
        ),
    ];

    for (id, product_id, author, body) in comments {
        sqlx::query(
            r#"
            INSERT INTO comments (id, product_id, author, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(Uuid::parse_str(product_id)?)
        .bind(author)
        .bind(body)
        .execute(pool)
        .await?;
    }

    println!("Seeded comments");
    Ok(())
}

async fn seed_similar(pool: &PgPool) -> anyhow::Result<()> {
    let edges = vec![(DESK, CHAIR), (DESK, SHELF), (CHAIR, DESK)];

    for (product_id, similar_product_id) in edges {
        sqlx::query(
            r#"
            INSERT INTO product_similar (product_id, similar_product_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(product_id)?)
        .bind(Uuid::parse_str(similar_product_id)?)
        .execute(pool)
        .await?;
    }

    println!("Seeded similar edges");
    Ok(())
}
