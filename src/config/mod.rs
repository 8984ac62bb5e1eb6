use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub content: ContentConfig,
    pub media: MediaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Absolute base URL; thumbnail URLs are derived from it.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Page size of the public listing and homepage feed.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
    /// Default page size of the admin listings when `per_page` is absent.
    #[serde(default = "default_admin_per_page")]
    pub admin_per_page: usize,
    /// Largest `per_page` an admin listing will serve.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
    #[serde(default = "default_related_posts")]
    pub related_posts: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
            admin_per_page: default_admin_per_page(),
            max_per_page: default_max_per_page(),
            related_posts: default_related_posts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    pub upload_dir: String,
    #[serde(default = "default_max_thumbnail_kb")]
    pub max_thumbnail_kb: usize,
}

impl MediaConfig {
    pub fn max_thumbnail_bytes(&self) -> usize {
        self.max_thumbnail_kb * 1024
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime_days")]
    pub session_lifetime_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_days: default_session_lifetime_days(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_pool_size() -> u32 {
    10
}

fn default_posts_per_page() -> usize {
    9
}

fn default_admin_per_page() -> usize {
    10
}

fn default_max_per_page() -> usize {
    100
}

fn default_related_posts() -> usize {
    3
}

fn default_max_thumbnail_kb() -> usize {
    5120
}

fn default_session_lifetime_days() -> i64 {
    7
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Did you run `quillpost init`?",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.site.url.trim().is_empty() {
            anyhow::bail!("site.url must not be empty");
        }
        if self.content.posts_per_page == 0 {
            anyhow::bail!("content.posts_per_page must be greater than 0");
        }
        if self.content.admin_per_page == 0 {
            anyhow::bail!("content.admin_per_page must be greater than 0");
        }
        if self.content.max_per_page < self.content.admin_per_page {
            anyhow::bail!("content.max_per_page must be at least content.admin_per_page");
        }
        if self.content.max_per_page > 1000 {
            anyhow::bail!("content.max_per_page must be 1000 or less");
        }
        if self.media.max_thumbnail_kb == 0 {
            anyhow::bail!("media.max_thumbnail_kb must be greater than 0");
        }
        if self.auth.session_lifetime_days <= 0 {
            anyhow::bail!("auth.session_lifetime_days must be greater than 0");
        }
        Ok(())
    }

    /// Configuration suitable for tests and `init`, rooted at `dir`.
    pub fn for_directory(dir: &Path) -> Self {
        Self {
            site: SiteConfig {
                title: "Quillpost".to_string(),
                description: "A personal blog".to_string(),
                url: "http://localhost:3000".to_string(),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: dir.join("data/quillpost.db").to_string_lossy().into_owned(),
                pool_size: default_pool_size(),
            },
            content: ContentConfig::default(),
            media: MediaConfig {
                upload_dir: dir.join("data/storage").to_string_lossy().into_owned(),
                max_thumbnail_kb: default_max_thumbnail_kb(),
            },
            auth: AuthConfig::default(),
        }
    }
}
