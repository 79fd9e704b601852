use std::{path::PathBuf, sync::Arc};

use gridseek_service::SearchService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SearchService>,
}
impl AppState {
	pub fn new(config: gridseek_config::Config) -> color_eyre::Result<Self> {
		let service = SearchService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: SearchService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub fn upload_dir(&self) -> PathBuf {
		self.service.cfg.service.upload_dir.clone()
	}

	pub fn max_upload_bytes(&self) -> usize {
		usize::try_from(self.service.cfg.service.max_upload_bytes).unwrap_or(usize::MAX)
	}
}
