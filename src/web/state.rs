use crate::services::presenter::Presenter;
use crate::services::thumbnails::ThumbnailStore;
use crate::web::security::LoginThrottle;
use crate::{Config, Database};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub thumbnails: ThumbnailStore,
    pub presenter: Presenter,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let thumbnails = ThumbnailStore::new(&config.media.upload_dir);
        let presenter = Presenter::new(config.site.url.clone());

        Self {
            config,
            db,
            thumbnails,
            presenter,
            login_throttle: LoginThrottle::default(),
        }
    }
}
