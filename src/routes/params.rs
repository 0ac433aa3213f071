use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::ToSchema;

/// Sparse search filter; absent fields contribute no predicate.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductSearchQuery {
    pub title: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl ProductSearchQuery {
    /// Build the search statement: one ANDed predicate per present field, in
    /// the fixed order title, min_price, max_price. An empty filter
    /// degenerates to an unconditional select-all.
    pub fn build_query(&self) -> QueryBuilder<'_, Postgres> {
        let mut qb = QueryBuilder::new("SELECT * FROM products");
        let mut first = true;

        if let Some(title) = self.title.as_deref().filter(|s| !s.is_empty()) {
            and_where(&mut qb, &mut first, "title ILIKE ");
            qb.push_bind(format!("%{title}%"));
        }
        if let Some(min_price) = self.min_price {
            and_where(&mut qb, &mut first, "price >= ");
            qb.push_bind(min_price);
        }
        if let Some(max_price) = self.max_price {
            and_where(&mut qb, &mut first, "price <= ");
            qb.push_bind(max_price);
        }

        qb.push(" ORDER BY created_at");
        qb
    }
}

fn and_where(qb: &mut QueryBuilder<'_, Postgres>, first: &mut bool, predicate: &str) {
    qb.push(if *first { " WHERE " } else { " AND " });
    qb.push(predicate);
    *first = false;
}
