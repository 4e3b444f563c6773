use crate::modules::cache::LeaderboardCache;
use crate::modules::catalog::Catalog;
use crate::modules::extraction::HttpExtractor;
use crate::modules::helpers::settings::Settings;
use crate::modules::reconciler::Reconciler;
use crate::modules::store::LapStore;

/// # app state
/// shared by every request through rocket's managed state
pub struct AppState {
    pub store: Box<dyn LapStore>,
    pub cache: Box<dyn LeaderboardCache>,
    pub catalog: Catalog,
    pub settings: Settings,
    pub extractor: Option<HttpExtractor>,
}

impl AppState {
    pub fn new(store: Box<dyn LapStore>, cache: Box<dyn LeaderboardCache>, settings: Settings) -> AppState {
        let extractor = settings
            .extraction_url
            .as_deref()
            .map(|url| HttpExtractor::new(url, settings.extraction_api_key.as_deref()));

        AppState {
            store,
            cache,
            catalog: Catalog::default(),
            settings,
            extractor,
        }
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(self.store.as_ref(), self.cache.as_ref())
    }
}
