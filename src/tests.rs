#[cfg(test)]
mod tests {

    mod slug_tests {
        use crate::services::slug::{
            generate_post_slug, generate_slug, random_suffix, SLUG_SUFFIX_LENGTH,
        };

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Hello World"), "hello-world");
        }

        #[test]
        fn test_generate_slug_special_characters() {
            assert_eq!(generate_slug("Hello, World!"), "hello-world");
        }

        #[test]
        fn test_generate_slug_unicode() {
            assert_eq!(generate_slug("Café au lait"), "cafe-au-lait");
        }

        #[test]
        fn test_generate_slug_leading_trailing_spaces() {
            assert_eq!(generate_slug("  Hello World  "), "hello-world");
        }

        #[test]
        fn test_generate_slug_is_lowercase_and_hyphenated() {
            assert_eq!(generate_slug("My Post 2024"), "my-post-2024");
            assert_eq!(generate_slug("hello_world"), "hello-world");
            assert_eq!(generate_slug("!!!"), "");
        }

        #[test]
        fn test_random_suffix_shape() {
            let suffix = random_suffix();
            assert_eq!(suffix.len(), SLUG_SUFFIX_LENGTH);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }

        #[test]
        fn test_post_slug_has_title_and_suffix() {
            let slug = generate_post_slug("My First Post");
            assert!(slug.starts_with("my-first-post-"));
            assert_eq!(slug.len(), "my-first-post-".len() + SLUG_SUFFIX_LENGTH);
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_post_slug_falls_back_when_title_has_no_letters() {
            let slug = generate_post_slug("!!!");
            assert!(slug.starts_with("post-"));
        }

        #[test]
        fn test_post_slugs_differ_for_same_title() {
            let a = generate_post_slug("Same");
            let b = generate_post_slug("Same");
            let c = generate_post_slug("Same");
            assert!(a != b || b != c);
        }
    }

    mod auth_tests {
        use crate::services::auth::{
            generate_session_token, hash_password, validate_email, validate_password,
            verify_password,
        };

        #[test]
        fn test_hash_password_produces_hash() {
            let hash = hash_password("Password123").unwrap();
            assert!(hash.starts_with("$argon2"));
        }

        #[test]
        fn test_hash_password_unique() {
            let hash1 = hash_password("Password123").unwrap();
            let hash2 = hash_password("Password123").unwrap();
            assert_ne!(hash1, hash2);
        }

        #[test]
        fn test_verify_password() {
            let hash = hash_password("Password123").unwrap();
            assert!(verify_password("Password123", &hash));
            assert!(!verify_password("Password124", &hash));
            assert!(!verify_password("", &hash));
        }

        #[test]
        fn test_verify_password_invalid_hash() {
            assert!(!verify_password("Password123", "invalid-hash"));
        }

        #[test]
        fn test_password_policy() {
            assert!(validate_password("Password123").is_ok());
            assert!(validate_password("Pass1").is_err());
            assert!(validate_password("password123").is_err());
            assert!(validate_password("PASSWORD123").is_err());
            assert!(validate_password("Passwordxyz").is_err());
        }

        #[test]
        fn test_email_validation() {
            assert!(validate_email("admin@example.com").is_ok());
            assert!(validate_email("").is_err());
            assert!(validate_email("admin.example.com").is_err());
            assert!(validate_email("@example.com").is_err());
            assert!(validate_email("admin@localhost").is_err());
        }

        #[test]
        fn test_generate_session_token() {
            let token = generate_session_token();
            assert_eq!(token.len(), 43);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_ne!(token, generate_session_token());
        }
    }

    mod post_status_tests {
        use crate::models::PostStatus;

        #[test]
        fn test_post_status_from_str() {
            assert_eq!("published".parse::<PostStatus>(), Ok(PostStatus::Published));
            assert_eq!("draft".parse::<PostStatus>(), Ok(PostStatus::Draft));
            assert!("Draft".parse::<PostStatus>().is_err());
            assert!("scheduled".parse::<PostStatus>().is_err());
        }

        #[test]
        fn test_post_status_toggle_is_involution() {
            for status in [PostStatus::Published, PostStatus::Draft] {
                assert_ne!(status.toggled(), status);
                assert_eq!(status.toggled().toggled(), status);
            }
        }

        #[test]
        fn test_post_status_serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&PostStatus::Draft).unwrap(),
                "\"draft\""
            );
            assert_eq!(PostStatus::Published.to_string(), "published");
        }
    }

    mod pagination_tests {
        use crate::services::pagination::{Page, PageRequest};

        #[test]
        fn test_defaults_when_absent() {
            let req = PageRequest::parse(None, None, 10, 100);
            assert_eq!(req.page, 1);
            assert_eq!(req.per_page, 10);
            assert!(req.in_bounds);
            assert_eq!(req.offset(), 0);
        }

        #[test]
        fn test_explicit_values() {
            let req = PageRequest::parse(Some("3"), Some("25"), 10, 100);
            assert_eq!(req.offset(), 50);
            assert_eq!(req.limit(), 25);
            assert!(req.in_bounds);
        }

        #[test]
        fn test_out_of_range_marks_request() {
            assert!(!PageRequest::parse(Some("0"), None, 10, 100).in_bounds);
            assert!(!PageRequest::parse(Some("abc"), None, 10, 100).in_bounds);
            assert!(!PageRequest::parse(None, Some("0"), 10, 100).in_bounds);
            assert!(!PageRequest::parse(None, Some("101"), 10, 100).in_bounds);
            assert!(!PageRequest::parse(None, Some("ten"), 10, 100).in_bounds);
            assert!(PageRequest::parse(None, Some("100"), 10, 100).in_bounds);
        }

        #[test]
        fn test_huge_per_page_falls_back_to_default_size() {
            let req = PageRequest::parse(None, Some("9223372036854775807"), 10, 100);
            assert!(!req.in_bounds);
            assert_eq!(req.per_page, 10);

            let page = Page::<i32>::new(vec![], i64::MAX, req);
            assert_eq!(page.last_page, (i64::MAX - 1) / 10 + 1);
        }

        #[test]
        fn test_blank_values_use_defaults() {
            let req = PageRequest::parse(Some(" "), Some(""), 10, 100);
            assert_eq!(req, PageRequest::first(10));
        }

        #[test]
        fn test_last_page() {
            let req = PageRequest::parse(Some("1"), Some("10"), 10, 100);
            assert_eq!(Page::<i32>::new(vec![], 0, req).last_page, 1);
            assert_eq!(Page::<i32>::new(vec![], 10, req).last_page, 1);
            assert_eq!(Page::<i32>::new(vec![], 11, req).last_page, 2);
        }
    }

    mod bulk_tests {
        use crate::services::bulk::{delete_each, parse_ids, selection, Outcome};
        use crate::services::ServiceError;
        use serde_json::json;

        #[test]
        fn test_parse_ids_accepts_numbers_and_numeric_strings() {
            assert_eq!(parse_ids(&json!({"ids": [3, "4", 5]})), Some(vec![3, 4, 5]));
        }

        #[test]
        fn test_parse_ids_collapses_duplicates() {
            assert_eq!(parse_ids(&json!({"ids": [2, 1, 2, "1"]})), Some(vec![2, 1]));
        }

        #[test]
        fn test_parse_ids_rejects_bad_selections() {
            assert_eq!(parse_ids(&json!({})), None);
            assert_eq!(parse_ids(&json!({"ids": []})), None);
            assert_eq!(parse_ids(&json!({"ids": "1,2"})), None);
            assert_eq!(parse_ids(&json!({"ids": [1, "x"]})), None);
            assert_eq!(parse_ids(&json!({"ids": [0]})), None);
            assert_eq!(parse_ids(&json!({"ids": [1.5]})), None);
            assert_eq!(parse_ids(&json!({"ids": [null]})), None);
        }

        #[test]
        fn test_selection_error_names_the_resource() {
            let err = selection(None, "posts").unwrap_err();
            let err = err.downcast::<ServiceError>().unwrap();
            assert_eq!(err.to_string(), "No posts selected.");
        }

        #[test]
        fn test_delete_each_reports_every_item() {
            let report = delete_each(&[1, 2, 3], |id| match id {
                1 => Ok(true),
                2 => Ok(false),
                _ => anyhow::bail!("disk on fire"),
            });
            assert_eq!(report.deleted, 1);
            assert_eq!(report.failed(), 1);
            let outcomes: Vec<Outcome> = report.items.iter().map(|i| i.outcome).collect();
            assert_eq!(outcomes, vec![Outcome::Deleted, Outcome::Missing, Outcome::Failed]);
            assert_eq!(report.items[2].error.as_deref(), Some("disk on fire"));
        }

        #[test]
        fn test_delete_each_continues_after_failure() {
            let mut seen = Vec::new();
            let report = delete_each(&[7, 8], |id| {
                seen.push(id);
                if id == 7 {
                    anyhow::bail!("locked");
                }
                Ok(true)
            });
            assert_eq!(seen, vec![7, 8]);
            assert_eq!(report.deleted, 1);
        }
    }

    mod query_tests {
        use crate::models::PostStatus;
        use crate::services::query::{PostFilter, PostFilterParams, SortDirection, SortField};

        fn params() -> PostFilterParams {
            PostFilterParams::default()
        }

        #[test]
        fn test_defaults() {
            let filter = PostFilter::from_params(&params(), 10, 100);
            assert_eq!(filter.sort, SortField::CreatedAt);
            assert_eq!(filter.dir, SortDirection::Desc);
            assert_eq!(filter.per_page, 10);
            assert_eq!(filter.page, 1);
            assert_eq!(filter.search, None);
            assert_eq!(filter.status, None);
        }

        #[test]
        fn test_unknown_sort_discards_direction() {
            let p = PostFilterParams {
                sort: Some("password".into()),
                dir: Some("asc".into()),
                ..params()
            };
            let filter = PostFilter::from_params(&p, 10, 100);
            assert_eq!(filter.sort, SortField::CreatedAt);
            assert_eq!(filter.dir, SortDirection::Desc);
        }

        #[test]
        fn test_direction_parsing() {
            let p = PostFilterParams {
                sort: Some("title".into()),
                dir: Some("ASC".into()),
                ..params()
            };
            assert_eq!(PostFilter::from_params(&p, 10, 100).dir, SortDirection::Asc);

            let p = PostFilterParams {
                sort: Some("title".into()),
                dir: Some("sideways".into()),
                ..params()
            };
            assert_eq!(PostFilter::from_params(&p, 10, 100).dir, SortDirection::Desc);
        }

        #[test]
        fn test_malformed_filters_are_ignored() {
            let p = PostFilterParams {
                category: Some("abc".into()),
                tag: Some("1; DROP TABLE posts".into()),
                status: Some("archived".into()),
                search: Some("   ".into()),
                ..params()
            };
            let filter = PostFilter::from_params(&p, 10, 100);
            assert_eq!(filter.category, None);
            assert_eq!(filter.tag, None);
            assert_eq!(filter.status, None);
            assert_eq!(filter.search, None);
        }

        #[test]
        fn test_filter_echo_serialization() {
            let p = PostFilterParams {
                search: Some(" rust ".into()),
                status: Some("draft".into()),
                sort: Some("status".into()),
                dir: Some("asc".into()),
                per_page: Some("5".into()),
                ..params()
            };
            let filter = PostFilter::from_params(&p, 10, 100);
            let echoed = serde_json::to_value(&filter).unwrap();
            assert_eq!(echoed["search"], "rust");
            assert_eq!(echoed["status"], "draft");
            assert_eq!(echoed["sort"], "status");
            assert_eq!(echoed["dir"], "asc");
            assert_eq!(echoed["per_page"], 5);
            assert!(echoed.get("paging").is_none());
        }

        #[test]
        fn test_published_filter() {
            let filter = PostFilter::published(Some("hello"), Some("2"), 9);
            assert_eq!(filter.status, Some(PostStatus::Published));
            assert_eq!(filter.per_page, 9);
            assert_eq!(filter.page, 2);
            assert_eq!(filter.search.as_deref(), Some("hello"));
        }
    }

    mod presenter_tests {
        use crate::models::{Category, Post, PostStatus, PostWithRelations, Tag};
        use crate::services::presenter::{iso_timestamp, Presenter};
        use crate::services::thumbnails::thumbnail_url;

        fn post() -> Post {
            Post {
                id: 7,
                title: "Hello".into(),
                slug: "hello-abc123".into(),
                content: Some("<p>Hi</p>".into()),
                thumbnail: Some("thumbnails/x.png".into()),
                status: PostStatus::Draft,
                category_id: Some(2),
                created_at: "2024-03-01 10:20:30".into(),
                updated_at: "2024-03-02 08:00:00".into(),
            }
        }

        #[test]
        fn test_iso_timestamp() {
            assert_eq!(iso_timestamp("2024-03-01 10:20:30"), "2024-03-01T10:20:30Z");
            assert_eq!(iso_timestamp("2024-03-01T10:20:30Z"), "2024-03-01T10:20:30Z");
            assert_eq!(iso_timestamp("yesterday"), "yesterday");
        }

        #[test]
        fn test_thumbnail_url_joins_cleanly() {
            assert_eq!(
                thumbnail_url("https://blog.test/", "/thumbnails/a.png"),
                "https://blog.test/storage/thumbnails/a.png"
            );
        }

        #[test]
        fn test_resource_shape() {
            let item = PostWithRelations {
                post: post(),
                category: Some(Category {
                    id: 2,
                    name: "News".into(),
                    slug: "news".into(),
                    created_at: String::new(),
                    updated_at: String::new(),
                }),
                tags: vec![Tag {
                    id: 4,
                    name: "rust".into(),
                    slug: "rust".into(),
                    created_at: String::new(),
                    updated_at: String::new(),
                }],
            };
            let presenter = Presenter::new("http://localhost:3000");
            let json = serde_json::to_value(presenter.resource(&item)).unwrap();

            assert_eq!(json["id"], 7);
            assert_eq!(json["status"], "draft");
            assert_eq!(json["created_at"], "2024-03-01T10:20:30Z");
            assert_eq!(
                json["thumbnail_url"],
                "http://localhost:3000/storage/thumbnails/x.png"
            );
            assert_eq!(json["category"], serde_json::json!({"id": 2, "name": "News"}));
            assert_eq!(json["tags"], serde_json::json!([{"id": 4, "name": "rust"}]));
            assert!(json.get("content").is_none());
        }

        #[test]
        fn test_resource_without_relations() {
            let mut p = post();
            p.thumbnail = None;
            let item = PostWithRelations {
                post: p,
                category: None,
                tags: vec![],
            };
            let json = serde_json::to_value(Presenter::new("http://x").resource(&item)).unwrap();
            assert!(json["thumbnail_url"].is_null());
            assert!(json["category"].is_null());
            assert_eq!(json["tags"], serde_json::json!([]));
        }
    }

    mod validation_tests {
        use crate::services::terms::escape_like;
        use crate::services::validation::{parse_id, required_name, ValidationErrors};

        #[test]
        fn test_required_name() {
            let mut errors = ValidationErrors::new();
            assert_eq!(required_name(&mut errors, "name", Some("  News ")), Some("News".into()));
            assert!(errors.is_empty());

            assert_eq!(required_name(&mut errors, "name", Some("   ")), None);
            assert_eq!(
                errors.get("name"),
                Some(&["The name field is required.".to_string()][..])
            );
        }

        #[test]
        fn test_required_name_length_limit() {
            let mut errors = ValidationErrors::new();
            assert!(required_name(&mut errors, "title", Some(&"a".repeat(255))).is_some());
            assert!(required_name(&mut errors, "title", Some(&"a".repeat(256))).is_none());
            assert!(errors.has("title"));
        }

        #[test]
        fn test_parse_id() {
            assert_eq!(parse_id(""), Ok(None));
            assert_eq!(parse_id(" 12 "), Ok(Some(12)));
            assert_eq!(parse_id("0"), Err(()));
            assert_eq!(parse_id("-3"), Err(()));
            assert_eq!(parse_id("x"), Err(()));
        }

        #[test]
        fn test_errors_serialize_as_field_map() {
            let mut errors = ValidationErrors::new();
            errors.add("title", "a");
            errors.add("title", "b");
            errors.add("tags.0", "c");
            assert_eq!(
                serde_json::to_value(&errors).unwrap(),
                serde_json::json!({"tags.0": ["c"], "title": ["a", "b"]})
            );
            assert_eq!(errors.to_string(), "c a b");
        }

        #[test]
        fn test_escape_like() {
            assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
            assert_eq!(escape_like("plain"), "plain");
        }
    }

    mod config_tests {
        use crate::Config;
        use std::path::Path;

        #[test]
        fn test_for_directory_is_valid() {
            let config = Config::for_directory(Path::new("/tmp/site"));
            assert!(config.validate().is_ok());
            assert_eq!(config.content.admin_per_page, 10);
            assert_eq!(config.media.max_thumbnail_bytes(), 5120 * 1024);
        }

        #[test]
        fn test_parse_minimal_toml() {
            let config: Config = toml::from_str(
                r#"
                [site]
                title = "Blog"
                url = "https://blog.test"

                [database]
                path = "blog.db"

                [media]
                upload_dir = "storage"
                "#,
            )
            .unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.content.posts_per_page, 9);
            assert_eq!(config.content.max_per_page, 100);
            assert_eq!(config.auth.session_lifetime_days, 7);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_validate_rejects_bad_values() {
            let mut config = Config::for_directory(Path::new("/tmp/site"));
            config.content.admin_per_page = 0;
            assert!(config.validate().is_err());

            let mut config = Config::for_directory(Path::new("/tmp/site"));
            config.content.max_per_page = 5;
            assert!(config.validate().is_err());
        }
    }

    mod throttle_tests {
        use crate::web::security::LoginThrottle;
        use std::time::Duration;

        #[test]
        fn test_locks_after_max_failures() {
            let throttle = LoginThrottle::new(2, Duration::from_secs(60));
            assert!(throttle.check("a@b.co"));
            throttle.record_failure("a@b.co");
            assert!(throttle.check("a@b.co"));
            throttle.record_failure("a@b.co");
            assert!(!throttle.check("a@b.co"));
            assert!(throttle.check("other@b.co"));

            throttle.clear("a@b.co");
            assert!(throttle.check("a@b.co"));
        }

        #[test]
        fn test_expired_keys_are_forgotten() {
            let throttle = LoginThrottle::new(5, Duration::from_millis(20));
            for i in 0..100 {
                throttle.record_failure(&format!("user{}@b.co", i));
            }
            assert_eq!(throttle.tracked_keys(), 100);

            std::thread::sleep(Duration::from_millis(40));
            throttle.record_failure("last@b.co");
            assert_eq!(throttle.tracked_keys(), 1);

            assert!(throttle.check("user0@b.co"));
            assert_eq!(throttle.tracked_keys(), 1);
        }
    }

    mod migration_tests {
        use crate::db::MIGRATIONS;
        use crate::Database;

        #[test]
        fn test_migrate_is_idempotent() {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("blog.db");
            let db = Database::open(path.to_str().unwrap()).unwrap();

            let before = db.migration_status().unwrap();
            assert_eq!(before.len(), MIGRATIONS.len());
            assert!(before.iter().all(|s| s.applied_at.is_none()));

            db.migrate().unwrap();
            db.migrate().unwrap();

            let after = db.migration_status().unwrap();
            assert!(after.iter().all(|s| s.applied_at.is_some()));
            assert_eq!(after[0].version, 1);
        }
    }
}
