use dinox_core::{SiyuanClient, SiyuanError};

/// Hierarchical document store the reconciler writes into.
///
/// `hpath` arguments are human-readable paths such as `/2024-01-01/X`;
/// `path` arguments are the store's own concrete paths returned by
/// [`DocumentStore::path_of`].
pub trait DocumentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn ids_by_path(
        &self,
        notebook: &str,
        hpath: &str,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    fn path_of(&self, id: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn create_from_markdown(
        &self,
        notebook: &str,
        hpath: &str,
        markdown: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn remove(
        &self,
        notebook: &str,
        path: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl DocumentStore for SiyuanClient {
    type Error = SiyuanError;

    async fn ids_by_path(&self, notebook: &str, hpath: &str) -> Result<Vec<String>, SiyuanError> {
        self.ids_by_hpath(notebook, hpath).await
    }

    async fn path_of(&self, id: &str) -> Result<String, SiyuanError> {
        self.path_by_id(id).await
    }

    async fn create_from_markdown(
        &self,
        notebook: &str,
        hpath: &str,
        markdown: &str,
    ) -> Result<(), SiyuanError> {
        self.create_doc_with_md(notebook, hpath, markdown)
            .await
            .map(|_| ())
    }

    async fn remove(&self, notebook: &str, path: &str) -> Result<(), SiyuanError> {
        self.remove_doc(notebook, path).await
    }
}
