use application::{
    ApplicationError, Repository, SearchPolicy, SearchableRepository, run_search,
};
use async_trait::async_trait;
use domain::{Entity, EntityId, SearchParams, SearchResult};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Reference backing: an insertion-ordered `Vec` behind an async `RwLock`.
///
/// Every CRUD call and every search runs as one critical section on the lock,
/// so a search never observes half of a concurrent insert or delete. Records
/// are cloned on the way out; callers never alias stored state.
#[derive(Debug)]
pub struct InMemoryRepository<E, P> {
    items: Arc<RwLock<Vec<E>>>,
    policy: P,
    _entity: PhantomData<fn() -> E>,
}

impl<E, P> InMemoryRepository<E, P>
where
    E: Entity,
    P: SearchPolicy<E>,
{
    pub fn new(policy: P) -> Self {
        Self::with_items(policy, Vec::new())
    }

    /// Starts from an existing set of records, kept in the given order.
    pub fn with_items(policy: P, items: Vec<E>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
            policy,
            _entity: PhantomData,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Replaces the whole store contents in one step.
    pub async fn replace_all(&self, items: Vec<E>) {
        debug!(count = items.len(), "Replacing in-memory store contents");
        *self.items.write().await = items;
    }

    /// Runs `f` over the stored records under the read lock.
    pub(crate) async fn read_with<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        let items = self.items.read().await;
        f(&items)
    }
}

impl<E, P> Default for InMemoryRepository<E, P>
where
    E: Entity,
    P: SearchPolicy<E> + Default,
{
    fn default() -> Self {
        Self::new(P::default())
    }
}

#[async_trait]
impl<E, P> Repository<E> for InMemoryRepository<E, P>
where
    E: Entity,
    P: SearchPolicy<E>,
{
    #[instrument(skip(self, entity), fields(id = %entity.id()))]
    async fn insert(&self, entity: E) -> Result<(), ApplicationError> {
        debug!("Inserting record into in-memory store");
        self.items.write().await.push(entity);
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &EntityId) -> Result<E, ApplicationError> {
        debug!("Getting record from in-memory store");
        let items = self.items.read().await;
        items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| {
                debug!("Record not found");
                ApplicationError::entity_not_found()
            })
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<E>, ApplicationError> {
        let items = self.items.read().await;
        debug!(count = items.len(), "Listing all records from in-memory store");
        Ok(items.clone())
    }

    #[instrument(skip(self, entity), fields(id = %entity.id()))]
    async fn update(&self, entity: E) -> Result<(), ApplicationError> {
        debug!("Updating record in in-memory store");
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|item| item.id() == entity.id())
            .ok_or_else(|| {
                debug!("Update failed: record not found");
                ApplicationError::entity_not_found()
            })?;
        *slot = entity;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &EntityId) -> Result<(), ApplicationError> {
        debug!("Deleting record from in-memory store");
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| {
                debug!("Delete failed: record not found");
                ApplicationError::entity_not_found()
            })?;
        // `remove`, not `swap_remove`: storage order is observable.
        items.remove(index);
        Ok(())
    }
}

#[async_trait]
impl<E, P> SearchableRepository<E> for InMemoryRepository<E, P>
where
    E: Entity,
    P: SearchPolicy<E>,
{
    #[instrument(skip(self, params))]
    async fn search(&self, params: &SearchParams) -> Result<SearchResult<E>, ApplicationError> {
        // Snapshot under the read lock; the pipeline then runs on our copy.
        let snapshot = self.items.read().await.clone();
        debug!(count = snapshot.len(), "Searching in-memory store");
        run_search(&self.policy, snapshot, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Record, SearchParamsInput};
    use serde::Serialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize, Debug, Clone, PartialEq)]
    struct StubProps {
        name: String,
        price: u32,
    }

    type StubEntity = Record<StubProps>;

    #[derive(Default)]
    struct StubPolicy {
        filter_calls: AtomicUsize,
    }

    impl SearchPolicy<StubEntity> for StubPolicy {
        fn sortable_fields(&self) -> &[&str] {
            &["name"]
        }

        fn matches_filter(&self, item: &StubEntity, filter: &str) -> Result<bool, ApplicationError> {
            self.filter_calls.fetch_add(1, Ordering::SeqCst);
            Ok(item
                .props()
                .name
                .to_lowercase()
                .contains(&filter.to_lowercase()))
        }
    }

    fn stub(name: &str, price: u32) -> StubEntity {
        Record::new(StubProps {
            name: name.to_string(),
            price,
        })
    }

    fn repo() -> InMemoryRepository<StubEntity, StubPolicy> {
        InMemoryRepository::default()
    }

    #[tokio::test]
    async fn insert_appends_in_order() {
        let repo = repo();
        let first = stub("any_name", 10);
        let second = stub("other_name", 20);
        repo.insert(first.clone()).await.unwrap();
        repo.insert(second.clone()).await.unwrap();

        assert_eq!(repo.find_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn find_by_id_returns_record() {
        let repo = repo();
        let entity = stub("any_name", 10);
        repo.insert(entity.clone()).await.unwrap();

        let found = repo.find_by_id(entity.id()).await.unwrap();
        assert_eq!(found.to_json().unwrap(), entity.to_json().unwrap());
    }

    #[tokio::test]
    async fn find_by_id_fails_when_missing() {
        let repo = repo();
        repo.insert(stub("any_name", 10)).await.unwrap();

        let err = repo.find_by_id(&EntityId::new("fake-id")).await.unwrap_err();
        assert_eq!(err, ApplicationError::NotFound("Entity not found".to_string()));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_replaces_props_and_keeps_identity() {
        let repo = repo();
        let entity = stub("any_name", 10);
        repo.insert(entity.clone()).await.unwrap();

        let updated = Record::with_id(
            entity.id().clone(),
            StubProps {
                name: "updated".to_string(),
                price: 1,
            },
        );
        repo.update(updated.clone()).await.unwrap();

        assert_eq!(repo.find_all().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn failed_update_leaves_store_unchanged() {
        let repo = repo();
        let entity = stub("any_name", 10);
        repo.insert(entity.clone()).await.unwrap();
        let before = repo.find_all().await.unwrap();

        let err = repo.update(stub("stranger", 5)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
        assert_eq!(repo.find_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_only_that_record() {
        let repo = repo();
        let items = vec![stub("a", 1), stub("b", 2), stub("c", 3)];
        repo.replace_all(items.clone()).await;

        repo.delete(items[1].id()).await.unwrap();
        assert_eq!(
            repo.find_all().await.unwrap(),
            vec![items[0].clone(), items[2].clone()]
        );
    }

    #[tokio::test]
    async fn failed_delete_leaves_store_unchanged() {
        let repo = repo();
        let items = vec![stub("a", 1), stub("b", 2)];
        repo.replace_all(items.clone()).await;

        let err = repo.delete(&EntityId::new("fake-id")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
        assert_eq!(repo.find_all().await.unwrap(), items);

        // An empty store reports the same error kind.
        let empty = self::repo();
        let err = empty.delete(&EntityId::new("fake-id")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn returned_records_are_copies() {
        let repo = repo();
        repo.insert(stub("a", 1)).await.unwrap();

        let mut all = repo.find_all().await.unwrap();
        all.clear();
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn search_without_filter_never_calls_predicate() {
        let repo = repo();
        let items: Vec<StubEntity> = (0..16).map(|i| stub(&format!("n{i}"), i)).collect();
        repo.replace_all(items.clone()).await;

        let result = repo.search(&SearchParams::default()).await.unwrap();

        assert_eq!(result.items(), &items[..15]);
        assert_eq!(result.total(), 16);
        assert_eq!(result.current_page(), 1);
        assert_eq!(result.per_page(), 15);
        assert_eq!(result.last_page(), 2);
        assert_eq!(repo.policy().filter_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_applies_filter_sort_and_page() {
        let repo = repo();
        repo.replace_all(vec![
            stub("test", 0),
            stub("a", 0),
            stub("TEST", 0),
            stub("b", 0),
            stub("TeSt", 0),
        ])
        .await;

        let params = SearchParams::new(SearchParamsInput {
            page: Some(json!(2)),
            per_page: Some(json!(2)),
            sort: Some(json!("name")),
            sort_dir: Some(json!("asc")),
            filter: Some(json!("TEST")),
        });
        let result = repo.search(&params).await.unwrap();

        let names: Vec<&str> = result.items().iter().map(|i| i.props().name.as_str()).collect();
        assert_eq!(names, vec!["TEST"]);
        assert_eq!(result.total(), 3);
        assert_eq!(result.last_page(), 2);
        assert_eq!(repo.policy().filter_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_never_tear_a_search() {
        let repo = Arc::new(repo());
        let params = SearchParams::new(SearchParamsInput {
            per_page: Some(json!(1000)),
            ..Default::default()
        });

        let writer = {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                for i in 0..200 {
                    repo.insert(stub(&format!("w{i}"), i)).await.unwrap();
                }
            })
        };
        let reader = {
            let repo = Arc::clone(&repo);
            let params = params.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let result = repo.search(&params).await.unwrap();
                    assert_eq!(result.total(), result.items().len());
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(repo.search(&params).await.unwrap().total(), 200);
    }
}
