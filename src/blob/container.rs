//! Container create/delete

use crate::blob::models::ContainerCreation;
use crate::blob::store::BlobStore;
use crate::error::Result;
use std::sync::Arc;
use tracing::{error, info};

pub struct ContainerManager {
    store: Arc<dyn BlobStore>,
}

impl ContainerManager {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Create `container` unless it already exists. An existing container is
    /// reported, not treated as an error.
    pub async fn create(&self, container: &str) -> Result<ContainerCreation> {
        match self.store.create_container(container).await {
            Ok(ContainerCreation::Created) => {
                info!(container = container, "Container created successfully");
                Ok(ContainerCreation::Created)
            }
            Ok(ContainerCreation::AlreadyExists) => {
                info!(container = container, "Container already exists");
                Ok(ContainerCreation::AlreadyExists)
            }
            Err(e) => {
                error!(container = container, error = %e, "Error in creating container");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, container: &str) -> Result<()> {
        self.store.delete_container(container).await.map_err(|e| {
            error!(container = container, error = %e, "Error while deleting container");
            e
        })?;
        info!(container = container, "Successfully deleted container");
        Ok(())
    }
}
