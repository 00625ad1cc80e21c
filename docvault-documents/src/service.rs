//! Read-through document operations.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use docvault_core::error::{Result, VaultError};
use docvault_core::traits::{DocumentStore, UserStore};
use docvault_core::types::{
    Caller, Document, DocumentId, DocumentSummary, Listing, ListingFilter, ListingQuery,
    NewDocument,
};

use crate::access::{can_view, serve, ServedDocument};
use crate::cache::DocumentCache;

/// Parameters of a listing request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingRequest {
    /// Whose documents to list; the caller's own when absent
    pub login: Option<String>,
    /// Optional attribute filter
    pub filter: Option<ListingFilter>,
    /// Requested size; zero or absent means the default
    pub limit: Option<usize>,
}

impl ListingRequest {
    /// Builds a request from raw query parameters.
    ///
    /// The filter only applies when both `key` and `value` are non-empty.
    pub fn from_params(
        login: Option<String>,
        key: Option<&str>,
        value: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Self> {
        let filter = match (key, value) {
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                Some(ListingFilter::parse(key, value)?)
            }
            _ => None,
        };
        Ok(Self {
            login: login.filter(|l| !l.is_empty()),
            filter,
            limit,
        })
    }
}

/// Document operations on behalf of authenticated callers.
///
/// Reads go cache first, then store, writing back on a miss. Mutations go to
/// the store first and then invalidate every cached listing of the owner.
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
    users: Arc<dyn UserStore>,
    cache: Arc<DocumentCache>,
}

impl DocumentService {
    /// Creates the service.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        users: Arc<dyn UserStore>,
        cache: Arc<DocumentCache>,
    ) -> Self {
        Self {
            documents,
            users,
            cache,
        }
    }

    /// The document cache.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Stores a new document owned by `caller`.
    #[instrument(skip(self, new), fields(caller = %caller.id))]
    pub async fn create(&self, caller: &Caller, new: NewDocument) -> Result<Document> {
        let document = new.validate()?.into_document(caller.id);
        self.documents.insert_document(document.clone()).await?;
        self.cache.on_document_created(caller.id);

        info!(id = %document.id, file = document.is_file(), "Document created");
        Ok(document)
    }

    /// Fetches a document the caller may view.
    #[instrument(skip(self), fields(caller = %caller.id))]
    pub async fn get(&self, caller: &Caller, id: &DocumentId) -> Result<ServedDocument> {
        let document = match self.cache.get_document(id) {
            Some(document) => document,
            None => {
                let generation = self.cache.document_generation();
                let document = self
                    .documents
                    .find_document_by_id(id)
                    .await?
                    .ok_or_else(|| VaultError::not_found(format!("document {id}")))?;
                let document = Arc::new(document);
                if !self.cache.put_document(document.clone(), generation) {
                    debug!(%id, "Document changed while loading; not cached");
                }
                document
            }
        };

        serve(&document, caller).inspect_err(|_| warn!(%id, "Access denied"))
    }

    /// Lists documents of the caller or of another user.
    ///
    /// Another user's listing only contains what the caller may view.
    #[instrument(skip(self, request), fields(caller = %caller.id))]
    pub async fn list(
        &self,
        caller: &Caller,
        request: ListingRequest,
    ) -> Result<Vec<DocumentSummary>> {
        let owner = match request.login.as_deref() {
            None => caller.id,
            Some(login) if login == caller.login => caller.id,
            Some(login) => self
                .users
                .find_user_by_login(login)
                .await?
                .map(|user| user.id)
                .ok_or_else(|| VaultError::not_found(format!("user '{login}'")))?,
        };

        let query = ListingQuery::new(owner, request.filter, request.limit);
        if owner == caller.id {
            return Ok(self.load_listing(&query).await?.documents.clone());
        }

        // Visibility applies before the limit, so start from the full listing.
        let full = ListingQuery::unbounded(owner, query.filter.clone());
        let listing = self.load_listing(&full).await?;
        Ok(listing
            .documents
            .iter()
            .filter(|summary| can_view(caller, *summary))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn load_listing(&self, query: &ListingQuery) -> Result<Arc<Listing>> {
        if let Some(listing) = self.cache.get_listing(query) {
            return Ok(listing);
        }

        let generation = self.cache.listing_generation(query.owner);
        let documents = self
            .documents
            .list_documents(query.owner, query.filter.as_ref(), query.limit)
            .await?;
        let listing = Arc::new(Listing::new(documents));
        if !self.cache.put_listing(query, generation, listing.clone()) {
            debug!(owner = %query.owner, "Listing changed while loading; not cached");
        }
        Ok(listing)
    }

    /// Deletes a document owned by the caller.
    #[instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: &DocumentId) -> Result<()> {
        let owner = self
            .documents
            .find_document_owner_id(id)
            .await?
            .ok_or_else(|| VaultError::not_found(format!("document {id}")))?;
        if owner != caller.id {
            warn!(%id, "Delete denied");
            return Err(VaultError::forbidden(format!("document {id} belongs to another user")));
        }

        if !self.documents.delete_document(id).await? {
            return Err(VaultError::not_found(format!("document {id}")));
        }
        self.cache.on_document_deleted(owner, id);

        info!(%id, "Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use docvault_cache::ExpiringCache;
    use docvault_core::types::{DocumentPayload, FilterField, UserId};
    use docvault_store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: DocumentService,
        alice: Caller,
        bob: Caller,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = store.insert_user("alice2024", "hash").await.unwrap();
        let bob = store.insert_user("bob12345", "hash").await.unwrap();
        let cache = Arc::new(DocumentCache::new(Arc::new(ExpiringCache::new())));
        let service = DocumentService::new(store.clone(), store.clone(), cache);
        Fixture {
            store,
            service,
            alice: Caller::new(alice, "alice2024"),
            bob: Caller::new(bob, "bob12345"),
        }
    }

    fn json_doc(name: &str, public: bool, grant: &[&str]) -> NewDocument {
        NewDocument {
            name: name.into(),
            mime: String::new(),
            public,
            grant: grant.iter().map(|g| g.to_string()).collect(),
            payload: DocumentPayload::Json(serde_json::json!({ "name": name })),
        }
    }

    #[test]
    fn test_listing_request_from_params() {
        let request =
            ListingRequest::from_params(Some(String::new()), Some("public"), Some("1"), Some(5))
                .unwrap();
        assert_eq!(request.login, None);
        assert_eq!(request.filter.as_ref().map(|f| f.field()), Some(FilterField::Public));
        assert_eq!(request.filter.as_ref().map(|f| f.value()), Some("true"));

        let unfiltered = ListingRequest::from_params(None, Some("name"), Some(""), None).unwrap();
        assert!(unfiltered.filter.is_none());

        let err = ListingRequest::from_params(None, Some("owner_id"), Some("1"), None).unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let f = fixture().await;
        let doc = f.service.create(&f.alice, json_doc("notes", false, &[])).await.unwrap();
        assert_eq!(doc.owner_id, f.alice.id);
        assert_eq!(doc.mime, "application/json");

        let served = f.service.get(&f.alice, &doc.id).await.unwrap();
        assert_eq!(served, ServedDocument::Json(serde_json::json!({ "name": "notes" })));

        // Second read is served from the cache.
        assert!(f.service.cache().get_document(&doc.id).is_some());
        assert!(f.service.get(&f.alice, &doc.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_missing_and_forbidden() {
        let f = fixture().await;
        let missing = f.service.get(&f.alice, &DocumentId::generate()).await.unwrap_err();
        assert!(matches!(missing, VaultError::NotFound(_)));

        let doc = f.service.create(&f.alice, json_doc("secret", false, &[])).await.unwrap();
        let denied = f.service.get(&f.bob, &doc.id).await.unwrap_err();
        assert!(matches!(denied, VaultError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_grant_scenario() {
        let f = fixture().await;

        let d1 = f.service.create(&f.alice, json_doc("d1", false, &[])).await.unwrap();
        assert!(f.service.get(&f.bob, &d1.id).await.is_err());

        let d2 = f
            .service
            .create(&f.alice, json_doc("d2", false, &["bob12345"]))
            .await
            .unwrap();
        assert!(f.service.get(&f.bob, &d2.id).await.is_ok());

        let query = ListingQuery::new(f.alice.id, None, None);
        f.service.list(&f.alice, ListingRequest::default()).await.unwrap();
        assert!(f.service.cache().get_listing(&query).is_some());

        f.service.delete(&f.alice, &d2.id).await.unwrap();
        let gone = f.service.get(&f.alice, &d2.id).await.unwrap_err();
        assert!(matches!(gone, VaultError::NotFound(_)));
        assert!(f.service.cache().get_listing(&query).is_none());
    }

    #[tokio::test]
    async fn test_list_is_fresh_after_mutations() {
        let f = fixture().await;
        f.service.create(&f.alice, json_doc("a", false, &[])).await.unwrap();
        assert_eq!(f.service.list(&f.alice, ListingRequest::default()).await.unwrap().len(), 1);

        let b = f.service.create(&f.alice, json_doc("b", false, &[])).await.unwrap();
        let listed = f.service.list(&f.alice, ListingRequest::default()).await.unwrap();
        assert_eq!(listed.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["a", "b"]);

        f.service.delete(&f.alice, &b.id).await.unwrap();
        assert_eq!(f.service.list(&f.alice, ListingRequest::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_other_user_filters_by_visibility() {
        let f = fixture().await;
        f.service.create(&f.alice, json_doc("private", false, &[])).await.unwrap();
        f.service.create(&f.alice, json_doc("public", true, &[])).await.unwrap();
        f.service
            .create(&f.alice, json_doc("shared", false, &["bob12345"]))
            .await
            .unwrap();

        let request = ListingRequest {
            login: Some("alice2024".into()),
            ..ListingRequest::default()
        };
        let seen = f.service.list(&f.bob, request.clone()).await.unwrap();
        let names: Vec<_> = seen.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["public", "shared"]);

        // The cached listing is unfiltered; the owner still sees everything.
        assert_eq!(f.service.list(&f.alice, request).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_other_user_limits_after_visibility() {
        let f = fixture().await;
        for i in 0..10 {
            f.service
                .create(&f.alice, json_doc(&format!("a{i:02}"), false, &[]))
                .await
                .unwrap();
        }
        for name in ["zz-public", "zz-shared"] {
            let grant: &[&str] = if name == "zz-shared" { &["bob12345"] } else { &[] };
            f.service
                .create(&f.alice, json_doc(name, name == "zz-public", grant))
                .await
                .unwrap();
        }

        let request = ListingRequest {
            login: Some("alice2024".into()),
            ..ListingRequest::default()
        };
        let seen = f.service.list(&f.bob, request.clone()).await.unwrap();
        let names: Vec<_> = seen.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["zz-public", "zz-shared"]);

        let one = ListingRequest {
            limit: Some(1),
            ..request
        };
        let seen = f.service.list(&f.bob, one).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "zz-public");

        // The owner still gets the default page.
        let own = f.service.list(&f.alice, ListingRequest::default()).await.unwrap();
        assert_eq!(own.len(), 10);
    }

    #[tokio::test]
    async fn test_list_unknown_login() {
        let f = fixture().await;
        let request = ListingRequest {
            login: Some("nobody123".into()),
            ..ListingRequest::default()
        };
        let err = f.service.list(&f.alice, request).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filter_and_limit() {
        let f = fixture().await;
        for i in 0..15 {
            f.service
                .create(&f.alice, json_doc(&format!("doc-{i:02}"), i < 5, &[]))
                .await
                .unwrap();
        }
        let file = NewDocument {
            name: "scan".into(),
            mime: "image/png".into(),
            public: false,
            grant: vec![],
            payload: DocumentPayload::File(Bytes::from_static(b"\x89PNG")),
        };
        f.service.create(&f.alice, file).await.unwrap();

        let default = f.service.list(&f.alice, ListingRequest::default()).await.unwrap();
        assert_eq!(default.len(), 10);

        let public = ListingRequest::from_params(None, Some("public"), Some("true"), Some(100))
            .unwrap();
        assert_eq!(f.service.list(&f.alice, public).await.unwrap().len(), 5);

        let files = ListingRequest::from_params(None, Some("file"), Some("true"), None).unwrap();
        let listed = f.service.list(&f.alice, files).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].file);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = fixture().await;
        let doc = f.service.create(&f.alice, json_doc("mine", true, &[])).await.unwrap();

        let err = f.service.delete(&f.bob, &doc.id).await.unwrap_err();
        assert!(matches!(err, VaultError::Forbidden(_)));
        assert_eq!(f.store.document_count(), 1);

        f.service.delete(&f.alice, &doc.id).await.unwrap();
        let err = f.service.delete(&f.alice, &doc.id).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mutation_leaves_other_owner_cached() {
        let f = fixture().await;
        let bobs = f.service.create(&f.bob, json_doc("bobs", false, &[])).await.unwrap();
        f.service.get(&f.bob, &bobs.id).await.unwrap();
        f.service.list(&f.bob, ListingRequest::default()).await.unwrap();

        let alices = f.service.create(&f.alice, json_doc("alices", false, &[])).await.unwrap();
        f.service.delete(&f.alice, &alices.id).await.unwrap();

        let bob_query = ListingQuery::new(f.bob.id, None, None);
        assert!(f.service.cache().get_listing(&bob_query).is_some());
        assert!(f.service.cache().get_document(&bobs.id).is_some());
    }

    /// Store whose listing read lets a concurrent create slip in mid-fetch.
    struct RacingStore {
        inner: Arc<MemoryStore>,
        cache: Arc<DocumentCache>,
        races: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn insert_document(&self, document: Document) -> Result<()> {
            self.inner.insert_document(document).await
        }

        async fn find_document_by_id(&self, id: &DocumentId) -> Result<Option<Document>> {
            self.inner.find_document_by_id(id).await
        }

        async fn find_document_owner_id(&self, id: &DocumentId) -> Result<Option<UserId>> {
            self.inner.find_document_owner_id(id).await
        }

        async fn delete_document(&self, id: &DocumentId) -> Result<bool> {
            self.inner.delete_document(id).await
        }

        async fn list_documents(
            &self,
            owner: UserId,
            filter: Option<&ListingFilter>,
            limit: usize,
        ) -> Result<Vec<DocumentSummary>> {
            let stale = self.inner.list_documents(owner, filter, limit).await?;
            if self.races.fetch_add(1, Ordering::SeqCst) == 0 {
                self.cache.on_document_created(owner);
            }
            Ok(stale)
        }
    }

    #[tokio::test]
    async fn test_listing_loaded_before_invalidation_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.insert_user("alice2024", "hash").await.unwrap();
        let caller = Caller::new(owner, "alice2024");

        let cache = Arc::new(DocumentCache::new(Arc::new(ExpiringCache::new())));
        let racing = Arc::new(RacingStore {
            inner: store.clone(),
            cache: cache.clone(),
            races: AtomicUsize::new(0),
        });
        let service = DocumentService::new(racing, store.clone(), cache.clone());
        store
            .insert_document(json_doc("early", false, &[]).validate().unwrap().into_document(owner))
            .await
            .unwrap();

        // First read races with an invalidation and must not be published.
        let query = ListingQuery::new(owner, None, None);
        let listed = service.list(&caller, ListingRequest::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(cache.get_listing(&query).is_none());

        // An undisturbed read is cached as usual.
        service.list(&caller, ListingRequest::default()).await.unwrap();
        assert!(cache.get_listing(&query).is_some());
    }

    /// Store whose document read completes just before a concurrent delete.
    struct VanishingStore {
        inner: Arc<MemoryStore>,
        cache: Arc<DocumentCache>,
    }

    #[async_trait]
    impl DocumentStore for VanishingStore {
        async fn insert_document(&self, document: Document) -> Result<()> {
            self.inner.insert_document(document).await
        }

        async fn find_document_by_id(&self, id: &DocumentId) -> Result<Option<Document>> {
            let found = self.inner.find_document_by_id(id).await?;
            if let Some(document) = &found {
                self.inner.delete_document(id).await?;
                self.cache.on_document_deleted(document.owner_id, id);
            }
            Ok(found)
        }

        async fn find_document_owner_id(&self, id: &DocumentId) -> Result<Option<UserId>> {
            self.inner.find_document_owner_id(id).await
        }

        async fn delete_document(&self, id: &DocumentId) -> Result<bool> {
            self.inner.delete_document(id).await
        }

        async fn list_documents(
            &self,
            owner: UserId,
            filter: Option<&ListingFilter>,
            limit: usize,
        ) -> Result<Vec<DocumentSummary>> {
            self.inner.list_documents(owner, filter, limit).await
        }
    }

    #[tokio::test]
    async fn test_document_loaded_before_delete_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.insert_user("alice2024", "hash").await.unwrap();
        let caller = Caller::new(owner, "alice2024");

        let cache = Arc::new(DocumentCache::new(Arc::new(ExpiringCache::new())));
        let vanishing = Arc::new(VanishingStore {
            inner: store.clone(),
            cache: cache.clone(),
        });
        let service = DocumentService::new(vanishing, store.clone(), cache.clone());
        let document = json_doc("doomed", false, &[]).validate().unwrap().into_document(owner);
        let id = document.id.clone();
        store.insert_document(document).await.unwrap();

        // The read was served before the delete landed, but must not outlive it.
        assert!(service.get(&caller, &id).await.is_ok());
        assert_eq!(store.document_count(), 0);
        assert!(cache.get_document(&id).is_none());

        let gone = service.get(&caller, &id).await.unwrap_err();
        assert!(matches!(gone, VaultError::NotFound(_)));
    }
}
