use crate::services::thumbnails::THUMBNAIL_DIR;
use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "My Blog".to_string());

    let config_path = path.join("quillpost.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    std::fs::create_dir_all(path.join("data"))?;
    std::fs::create_dir_all(path.join("data/storage").join(THUMBNAIL_DIR))?;

    let config = format!(
        r#"[site]
title = "{}"
description = "A personal blog"
url = "http://localhost:3000"

[server]
host = "127.0.0.1"
port = 3000

[database]
path = "./data/quillpost.db"
pool_size = 10

[content]
posts_per_page = 9
admin_per_page = 10
max_per_page = 100
related_posts = 3

[media]
upload_dir = "./data/storage"
max_thumbnail_kb = 5120

[auth]
session_lifetime_days = 7
"#,
        site_name.replace('\\', "\\\\").replace('"', "\\\"")
    );

    std::fs::write(&config_path, config)?;

    tracing::info!("Created new site at {:?}", path);
    tracing::info!("Run 'quillpost migrate' to set up the database");
    tracing::info!("Run 'quillpost user add --name <NAME> --email <EMAIL> --admin' to create an administrator");
    tracing::info!("Run 'quillpost serve' to start the server");

    Ok(())
}
