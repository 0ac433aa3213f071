use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::IntoResponse,
};
use axum_catalog_api::{
    db::{DbPool, create_pool},
    dto::products::{
        AddImagesRequest, CreateProductRequest, NewImage, RemoveImagesRequest,
        SimilarProductsRequest,
    },
    routes::create_api_router,
    routes::params::ProductSearchQuery,
    routes::products::{
        add_product_images, add_similar_products, create_product, delete_product, get_product,
        list_not_similar_products, list_products, list_similar_products, remove_product_images,
        remove_similar_products, search_products,
    },
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

// Integration flow: create products with images -> fetch enhanced -> search ->
// manage images -> manage similar edges -> delete with manual child cleanup.
#[tokio::test]
async fn catalog_crud_and_similar_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let pool = setup_pool(&database_url).await?;

    // Create a product with two images, one flagged main.
    let (status, message) = create_product(
        State(pool.clone()),
        Json(CreateProductRequest {
            title: "Flow Desk".into(),
            description: "A desk for the flow test".into(),
            price: 45_000,
            images: Some(vec![
                NewImage {
                    url: "https://cdn.example.com/flow-desk-side.jpg".into(),
                    main: false,
                },
                NewImage {
                    url: "https://cdn.example.com/flow-desk-front.jpg".into(),
                    main: true,
                },
            ]),
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let desk_id = created_id(&message);

    // A second product without any images.
    let (_, message) = create_product(
        State(pool.clone()),
        Json(CreateProductRequest {
            title: "Flow Chair".into(),
            description: "A chair for the flow test".into(),
            price: 12_500,
            images: None,
        }),
    )
    .await?;
    let chair_id = created_id(&message);

    // Comments are read-only through the API; seed two rows directly.
    for body in ["sturdy", "easy to assemble"] {
        sqlx::query("INSERT INTO comments (id, product_id, author, body) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(desk_id)
            .bind("tester")
            .bind(body)
            .execute(&pool)
            .await?;
    }

    // Fetch by id: relations and thumbnail attached.
    let desk = get_product(State(pool.clone()), Path(desk_id)).await?.0;
    assert_eq!(desk.images.as_ref().unwrap().len(), 2);
    assert_eq!(desk.comments.as_ref().unwrap().len(), 2);
    assert_eq!(
        desk.thumbnail.as_ref().unwrap().url,
        "https://cdn.example.com/flow-desk-front.jpg"
    );

    // The chair has no relations; the fields stay out of the JSON entirely.
    let chair = get_product(State(pool.clone()), Path(chair_id)).await?.0;
    assert!(chair.images.is_none());
    let value = serde_json::to_value(&chair)?;
    assert!(value.get("images").is_none());
    assert!(value.get("comments").is_none());
    assert!(value.get("thumbnail").is_none());

    // Fetching an unknown id reports the exact message with a 404.
    let ghost = Uuid::new_v4();
    let err = get_product(State(pool.clone()), Path(ghost))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Product with id {ghost} is not found"));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    // Search: substring and price-range filters, and the empty-result case.
    let hits = search_products(
        State(pool.clone()),
        Query(ProductSearchQuery {
            title: Some("flow".into()),
            ..Default::default()
        }),
    )
    .await?
    .0;
    assert_eq!(hits.len(), 2);

    let hits = search_products(
        State(pool.clone()),
        Query(ProductSearchQuery {
            title: Some("Flow Desk".into()),
            min_price: Some(20_000),
            ..Default::default()
        }),
    )
    .await?
    .0;
    assert_eq!(hits.len(), 1);
    assert!(hits[0].thumbnail.is_some(), "search results are enhanced");

    let misses = search_products(
        State(pool.clone()),
        Query(ProductSearchQuery {
            title: Some("no such product".into()),
            ..Default::default()
        }),
    )
    .await?
    .0;
    assert!(misses.is_empty());

    // Add a single image to the chair; the fallback thumbnail is that image.
    let (status, _) = add_product_images(
        State(pool.clone()),
        Path(chair_id),
        Json(AddImagesRequest {
            images: vec![NewImage {
                url: "https://cdn.example.com/flow-chair.jpg".into(),
                main: false,
            }],
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let chair = get_product(State(pool.clone()), Path(chair_id)).await?.0;
    assert_eq!(
        chair.thumbnail.as_ref().unwrap().url,
        "https://cdn.example.com/flow-chair.jpg"
    );
    let chair_image_id = chair.images.as_ref().unwrap()[0].id;

    // Image removal: empty list, unknown ids, then the real one.
    let err = remove_product_images(
        State(pool.clone()),
        Json(RemoveImagesRequest { image_ids: vec![] }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Images array is empty");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let err = remove_product_images(
        State(pool.clone()),
        Json(RemoveImagesRequest {
            image_ids: vec![Uuid::new_v4()],
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "No one image has been removed");
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let (status, message) = remove_product_images(
        State(pool.clone()),
        Json(RemoveImagesRequest {
            image_ids: vec![chair_image_id],
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message, "Images have been removed");

    let chair = get_product(State(pool.clone()), Path(chair_id)).await?.0;
    assert!(chair.images.is_none());
    assert!(chair.thumbnail.is_none());

    // Adding images for an absent product id must hit the store FK and fail.
    let err = add_product_images(
        State(pool.clone()),
        Path(ghost),
        Json(AddImagesRequest {
            images: vec![NewImage {
                url: "https://cdn.example.com/nowhere.jpg".into(),
                main: false,
            }],
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    // Similar edges: record desk -> chair, twice (the duplicate is ignored).
    for _ in 0..2 {
        let status = add_similar_products(
            State(pool.clone()),
            Path(desk_id),
            Ok(Json(SimilarProductsRequest {
                similar: vec![chair_id],
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let similar = list_similar_products(State(pool.clone()), Path(desk_id))
        .await?
        .0;
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].id, chair_id);

    // The edge is directed; nothing is similar to the chair.
    let similar = list_similar_products(State(pool.clone()), Path(chair_id))
        .await?
        .0;
    assert!(similar.is_empty());

    // Not-similar candidates exclude the product itself and related products.
    let candidates = list_not_similar_products(State(pool.clone()), Path(desk_id))
        .await?
        .0;
    assert!(candidates.is_empty());

    let candidates = list_not_similar_products(State(pool.clone()), Path(chair_id))
        .await?
        .0;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, desk_id);

    let status = remove_similar_products(
        State(pool.clone()),
        Path(desk_id),
        Ok(Json(SimilarProductsRequest {
            similar: vec![chair_id],
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let similar = list_similar_products(State(pool.clone()), Path(desk_id))
        .await?
        .0;
    assert!(similar.is_empty());

    let candidates = list_not_similar_products(State(pool.clone()), Path(desk_id))
        .await?
        .0;
    assert_eq!(candidates.len(), 1);

    // Re-add edges in both directions; product deletion cascades them away.
    add_similar_products(
        State(pool.clone()),
        Path(desk_id),
        Ok(Json(SimilarProductsRequest {
            similar: vec![chair_id],
        })),
    )
    .await?;
    add_similar_products(
        State(pool.clone()),
        Path(chair_id),
        Ok(Json(SimilarProductsRequest {
            similar: vec![desk_id],
        })),
    )
    .await?;

    // Delete the desk: images and comments go first, then the row.
    let status = delete_product(State(pool.clone()), Path(desk_id)).await?;
    assert_eq!(status, StatusCode::OK);

    let images_left: (i64,) = sqlx::query_as("SELECT count(*) FROM images WHERE product_id = $1")
        .bind(desk_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(images_left.0, 0);
    let comments_left: (i64,) =
        sqlx::query_as("SELECT count(*) FROM comments WHERE product_id = $1")
            .bind(desk_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(comments_left.0, 0);

    // Similarity edges cascade with the product, in both directions.
    let edges_left: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM product_similar WHERE product_id = $1 OR similar_product_id = $1",
    )
    .bind(desk_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(edges_left.0, 0);
    let similar = list_similar_products(State(pool.clone()), Path(chair_id))
        .await?
        .0;
    assert!(similar.is_empty());

    let err = get_product(State(pool.clone()), Path(desk_id))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Product with id {desk_id} is not found")
    );

    // Deleting again reports 404 as well.
    let err = delete_product(State(pool.clone()), Path(desk_id))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    // Only the chair is left.
    let all = list_products(State(pool.clone())).await?.0;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, chair_id);

    // An explicit empty images array behaves like omitting it.
    let (status, message) = create_product(
        State(pool.clone()),
        Json(CreateProductRequest {
            title: "Flow Lamp".into(),
            description: "A lamp for the flow test".into(),
            price: 3_900,
            images: Some(vec![]),
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let lamp = get_product(State(pool.clone()), Path(created_id(&message)))
        .await?
        .0;
    assert!(lamp.images.is_none());
    assert!(lamp.thumbnail.is_none());

    // Each successful mutation above left exactly one audit row; the rejected
    // and failed calls left none.
    let audited: Vec<(String, i64)> =
        sqlx::query_as("SELECT action, count(*) FROM audit_logs GROUP BY action ORDER BY action")
            .fetch_all(&pool)
            .await?;
    assert_eq!(
        audited,
        vec![
            ("images_add".to_string(), 1),
            ("images_remove".to_string(), 1),
            ("product_create".to_string(), 3),
            ("product_delete".to_string(), 1),
            ("similar_add".to_string(), 4),
            ("similar_remove".to_string(), 1),
        ]
    );

    Ok(())
}

// The array-shape check on the similar mutations runs before any statement,
// so a never-connecting pool is enough to drive the router.
#[tokio::test]
async fn malformed_similar_body_yields_a_structured_400() -> anyhow::Result<()> {
    let pool = PgPoolOptions::new().connect_lazy("postgres://localhost:1/unreachable")?;
    let app = create_api_router().with_state(pool);

    for method in ["PUT", "DELETE"] {
        let request = Request::builder()
            .method(method)
            .uri(format!("/products/{}/similar", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"similar": "not-an-array"}"#))?;
        let response = app.clone().oneshot(request).await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["errors"][0]["field"], "similar");
        assert_eq!(
            body["errors"][0]["message"],
            "must be an array of product ids"
        );
    }

    Ok(())
}

// The empty-array guard on image addition fires before any insert.
#[tokio::test]
async fn empty_add_images_payload_is_rejected_outright() -> anyhow::Result<()> {
    let pool = PgPoolOptions::new().connect_lazy("postgres://localhost:1/unreachable")?;

    let err = add_product_images(
        State(pool),
        Path(Uuid::new_v4()),
        Json(AddImagesRequest { images: vec![] }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Images array is empty");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    Ok(())
}

async fn setup_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    sqlx::query("TRUNCATE TABLE product_similar, images, comments, audit_logs, products CASCADE")
        .execute(&pool)
        .await?;

    Ok(pool)
}

fn created_id(message: &str) -> Uuid {
    message
        .strip_prefix("Product with id ")
        .and_then(|rest| rest.strip_suffix(" has been created"))
        .expect("created message shape")
        .parse()
        .expect("uuid in created message")
}
