use crate::domain::harbour::Harbour;
use crate::domain::model::{AlertReport, DetectionInput};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where harbour records come from.
pub trait HarbourStore: Send + Sync {
    fn load_harbours(&self) -> impl std::future::Future<Output = Result<Vec<Harbour>>> + Send;
}

impl HarbourStore for Vec<Harbour> {
    async fn load_harbours(&self) -> Result<Vec<Harbour>> {
        Ok(self.clone())
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<DetectionInput>;
    async fn transform(&self, input: DetectionInput) -> Result<AlertReport>;
    async fn load(&self, report: AlertReport) -> Result<Vec<String>>;
}
