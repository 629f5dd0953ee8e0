//! Replication of catalog writes to every configured store.

use thiserror::Error;

use crate::repository::{CatalogStore, RepositoryError, RepositoryResult};

/// One store that rejected a broadcast write.
#[derive(Debug, Error)]
#[error("{store}: {error}")]
pub struct StoreFailure {
    pub store: String,
    pub error: RepositoryError,
}

/// Stores that failed during a broadcast. The remaining stores still received
/// the write.
#[derive(Debug, Error)]
#[error("{}", join_failures(.failures))]
pub struct BroadcastError {
    pub failures: Vec<StoreFailure>,
}

fn join_failures(failures: &[StoreFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Apply `op` to every store in order, continuing past failures.
pub fn broadcast<F>(stores: &[Box<dyn CatalogStore>], mut op: F) -> Result<(), BroadcastError>
where
    F: FnMut(&dyn CatalogStore) -> RepositoryResult<()>,
{
    let failures: Vec<StoreFailure> = stores
        .iter()
        .filter_map(|store| {
            op(store.as_ref()).err().map(|error| StoreFailure {
                store: store.name().to_string(),
                error,
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(BroadcastError { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Product;
    use crate::domain::types::{ProductTitle, ProductUrl};
    use crate::repository::test::TestRepository;

    const URL: &str = "https://shop.example/produtos/radio";

    fn product() -> Product {
        Product::new(
            ProductUrl::new(URL).unwrap(),
            ProductTitle::new("Radio").unwrap(),
        )
    }

    #[test]
    fn writes_reach_every_store() {
        let main = TestRepository::new("main", vec![]);
        let mirror = TestRepository::new("mirror", vec![]);
        let stores: Vec<Box<dyn CatalogStore>> =
            vec![Box::new(main.clone()), Box::new(mirror.clone())];

        broadcast(&stores, |s| s.upsert_product(&product())).unwrap();

        assert!(main.product(URL).is_some());
        assert!(mirror.product(URL).is_some());
    }

    #[test]
    fn failing_store_does_not_block_the_others() {
        let main = TestRepository::new("main", vec![]);
        let mirror = TestRepository::new("mirror", vec![]);
        main.fail_writes_for(URL);
        let stores: Vec<Box<dyn CatalogStore>> =
            vec![Box::new(main.clone()), Box::new(mirror.clone())];

        let err = broadcast(&stores, |s| s.upsert_product(&product())).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].store, "main");
        assert!(err.to_string().starts_with("main: "));
        assert!(main.product(URL).is_none());
        assert!(mirror.product(URL).is_some());
    }

    #[test]
    fn every_failing_store_is_listed() {
        let main = TestRepository::new("main", vec![]);
        let mirror = TestRepository::new("mirror", vec![]);
        main.fail_writes_for(URL);
        mirror.fail_writes_for(URL);
        let stores: Vec<Box<dyn CatalogStore>> =
            vec![Box::new(main.clone()), Box::new(mirror.clone())];

        let err = broadcast(&stores, |s| s.mark_removed(&product().url)).unwrap_err();

        let message = err.to_string();
        assert_eq!(err.failures.len(), 2);
        assert!(message.starts_with("main: "));
        assert!(message.contains("; mirror: "));
    }
}
