// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, media::MediaStore, store::RecordStore};

pub type SharedStore = Arc<dyn RecordStore>;
pub type SharedMedia = Arc<dyn MediaStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub media: SharedMedia,
    pub config: Config,
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
