// storefront/src/db/seed.rs

use rust_decimal::Decimal;

use super::Repositories;
use crate::errors::Result;
use crate::models::ProductInput;

const DEMO_CATALOG: &[(&str, &[(&str, i64, &str)])] = &[
  (
    "Shirts",
    &[
      ("Classic Tee", 1999, "Heavyweight cotton crew neck."),
      ("Oxford Button-Down", 4950, "Washed oxford cloth, regular fit."),
    ],
  ),
  (
    "Hats",
    &[("Wool Toque", 2400, "Ribbed merino knit."), ("Ball Cap", 2200, "Unstructured six-panel cap.")],
  ),
];

/// Inserts a small demo catalog when the store has no categories yet.
pub async fn seed_catalog(repos: &Repositories) -> Result<bool> {
  if !repos.categories.list().await?.is_empty() {
    tracing::info!("Catalog already populated, skipping seed.");
    return Ok(false);
  }
  for (category_name, products) in DEMO_CATALOG {
    let category = repos.categories.create(category_name).await?;
    for (name, cents, description) in products.iter() {
      repos
        .products
        .create(&ProductInput {
          name: name.to_string(),
          price: Decimal::new(*cents, 2),
          description: Some(description.to_string()),
          category_id: category.id,
          image: None,
        })
        .await?;
    }
  }
  tracing::info!(categories = DEMO_CATALOG.len(), "Seeded demo catalog.");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn seeding_is_skipped_once_populated() {
    let repos = Repositories::in_memory();
    assert!(seed_catalog(&repos).await.unwrap());
    assert!(!seed_catalog(&repos).await.unwrap());
    assert_eq!(repos.products.list_with_category().await.unwrap().len(), 4);
  }
}
