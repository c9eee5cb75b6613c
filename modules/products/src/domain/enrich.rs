//! Category cross-reference: merge category names into records that only
//! carry a category id.
//!
//! All ids of a batch are resolved with a single repository call. Nothing is
//! cached between calls.

use uuid::Uuid;

use crate::contract::model::{CategoryStats, Product};
use crate::domain::repo::CategoriesRepository;

/// A record that references a category by id.
pub trait CategoryRef {
    fn category_id(&self) -> Uuid;
}

impl CategoryRef for Product {
    fn category_id(&self) -> Uuid {
        self.category_id
    }
}

impl CategoryRef for CategoryStats {
    fn category_id(&self) -> Uuid {
        self.category_id
    }
}

/// `item` plus the name of the category it references.
/// `category_name` is `None` when the reference is dangling.
#[derive(Debug, Clone, PartialEq)]
pub struct WithCategory<T> {
    pub item: T,
    pub category_name: Option<String>,
}

impl<T: CategoryRef> WithCategory<T> {
    pub fn category_id(&self) -> Uuid {
        self.item.category_id()
    }
}

pub async fn with_category_names<T: CategoryRef>(
    categories: &dyn CategoriesRepository,
    items: Vec<T>,
) -> anyhow::Result<Vec<WithCategory<T>>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<Uuid> = items.iter().map(CategoryRef::category_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let names = categories.names_by_ids(&ids).await?;
    Ok(items
        .into_iter()
        .map(|item| {
            let category_name = names.get(&item.category_id()).cloned();
            WithCategory {
                item,
                category_name,
            }
        })
        .collect())
}

pub async fn with_category_name<T: CategoryRef>(
    categories: &dyn CategoriesRepository,
    item: T,
) -> anyhow::Result<WithCategory<T>> {
    let mut enriched = with_category_names(categories, vec![item]).await?;
    enriched
        .pop()
        .ok_or_else(|| anyhow::anyhow!("enrichment dropped the record"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::Category;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCategories {
        names: HashMap<Uuid, String>,
        calls: Mutex<Vec<Vec<Uuid>>>,
    }

    #[async_trait]
    impl CategoriesRepository for FakeCategories {
        async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<Category>> {
            unimplemented!()
        }

        async fn find_by_name_ci(&self, _name: &str) -> anyhow::Result<Option<Category>> {
            unimplemented!()
        }

        async fn names_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
            self.calls.lock().unwrap().push(ids.to_vec());
            Ok(ids
                .iter()
                .filter_map(|id| self.names.get(id).map(|n| (*id, n.clone())))
                .collect())
        }

        async fn insert(&self, _c: Category) -> anyhow::Result<()> {
            unimplemented!()
        }
    }

    fn stats(category_id: Uuid) -> CategoryStats {
        CategoryStats {
            category_id,
            avg_price: 1.0,
            min_price: 1.0,
            max_price: 1.0,
            total_price: 1.0,
            total_products: 1,
        }
    }

    #[tokio::test]
    async fn resolves_a_batch_in_one_call() {
        let tools = Uuid::now_v7();
        let toys = Uuid::now_v7();
        let repo = FakeCategories {
            names: HashMap::from([(tools, "Tools".to_string()), (toys, "Toys".to_string())]),
            ..Default::default()
        };

        let out = with_category_names(&repo, vec![stats(tools), stats(toys), stats(tools)])
            .await
            .unwrap();

        let names: Vec<_> = out.iter().map(|r| r.category_name.as_deref()).collect();
        assert_eq!(names, vec![Some("Tools"), Some("Toys"), Some("Tools")]);

        let calls = repo.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2, "ids are deduplicated");
    }

    #[tokio::test]
    async fn dangling_reference_has_no_name() {
        let repo = FakeCategories::default();
        let missing = Uuid::now_v7();
        let out = with_category_name(&repo, stats(missing)).await.unwrap();
        assert_eq!(out.category_name, None);
        assert_eq!(out.category_id(), missing);
    }

    #[tokio::test]
    async fn empty_input_skips_the_store() {
        let repo = FakeCategories::default();
        let out = with_category_names::<CategoryStats>(&repo, Vec::new())
            .await
            .unwrap();
        assert!(out.is_empty());
        assert!(repo.calls.lock().unwrap().is_empty());
    }
}
