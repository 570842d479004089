use crate::{
    config::Config,
    services::{extractor::Extractor, store::QuizStore},
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: QuizStore,
    pub extractor: Extractor,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for QuizStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Extractor {
    fn from_ref(state: &AppState) -> Self {
        state.extractor.clone()
    }
}
