use serde_json::json;
use uuid::Uuid;

use crate::common::{MAX_IMAGE_SIZE, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_png_returns_record_with_id_derived_url() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_image(Some("cat.png"), "image/png", vec![0u8; 1024])
            .await;

        assert_eq!(res.status, 200, "unexpected response: {}", res.text);
        assert_eq!(res.body["success"], json!(true));
        assert_eq!(res.body["message"].as_str().unwrap(), "Image uploaded successfully");

        let image = &res.body["image"];
        assert_eq!(image["name"].as_str().unwrap(), "cat.png");
        assert_eq!(image["size"].as_i64().unwrap(), 1024);
        assert_eq!(image["type"].as_str().unwrap(), "image/png");

        let id = image["id"].as_str().unwrap();
        Uuid::parse_str(id).expect("id should be a UUID");
        assert_eq!(image["url"].as_str().unwrap(), format!("/uploads/{id}.png"));

        // The stored file exists under the generated name.
        assert_eq!(app.stored_files(), [format!("{id}.png")]);
    }

    #[tokio::test]
    async fn upload_without_filename_defaults_to_jpg() {
        let app = TestApp::spawn().await;

        let res = app.upload_image(None, "image/jpeg", b"jpeg".to_vec()).await;

        assert_eq!(res.status, 200);
        assert!(res.body["image"]["url"].as_str().unwrap().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn upload_rejects_non_image_content_type() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_image(Some("note.txt"), "text/plain", b"not an image".to_vec())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["success"], json!(false));
        assert_eq!(res.body["code"].as_str().unwrap(), "INVALID_CONTENT_TYPE");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_payload_over_limit() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_image(
                Some("huge.png"),
                "image/png",
                vec![0u8; (MAX_IMAGE_SIZE + 1) as usize],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "PAYLOAD_TOO_LARGE");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn upload_without_image_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_field("attachment", Some("cat.png"), "image/png", b"png".to_vec())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        assert_eq!(res.body["message"].as_str().unwrap(), "No image file provided");
    }

    #[tokio::test]
    async fn upload_rejects_path_traversal_filename() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_image(Some("../escape.png"), "image/png", b"png".to_vec())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        assert!(app.stored_files().is_empty());
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn listing_is_empty_initially() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::IMAGES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], json!(true));
        assert_eq!(res.body["images"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn uploaded_image_appears_exactly_once() {
        let app = TestApp::spawn().await;
        let uploaded = app
            .upload_image(Some("cat.png"), "image/png", b"png".to_vec())
            .await;
        let id = uploaded.body["image"]["id"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let res = app.get(routes::IMAGES).await;
            let images = res.body["images"].as_array().unwrap();
            assert_eq!(images.len(), 1);
            assert_eq!(images[0]["id"].as_str().unwrap(), id);
            assert_eq!(images[0]["name"].as_str().unwrap(), "cat.png");
        }
    }

    #[tokio::test]
    async fn out_of_band_files_are_discovered_and_kept_stable() {
        let app = TestApp::spawn().await;
        std::fs::write(app.upload_dir.join("manual.png"), b"dropped in").unwrap();

        let res = app.get(routes::IMAGES).await;
        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["name"].as_str().unwrap(), "manual.png");
        assert_eq!(images[0]["url"].as_str().unwrap(), "/uploads/manual.png");
        let discovered_id = images[0]["id"].as_str().unwrap().to_string();

        // Repeated listings neither duplicate nor reassign the record.
        let again = app.get(routes::IMAGES).await;
        let images = again.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["id"].as_str().unwrap(), discovered_id);
    }

    #[tokio::test]
    async fn non_image_files_are_never_listed() {
        let app = TestApp::spawn().await;
        std::fs::write(app.upload_dir.join("notes.txt"), b"text").unwrap();
        std::fs::write(app.upload_dir.join("shot.webp"), b"webp").unwrap();

        let res = app.get(routes::IMAGES).await;
        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["name"].as_str().unwrap(), "shot.webp");
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let app = TestApp::spawn().await;
        for name in ["first.png", "second.png", "third.png"] {
            let res = app
                .upload_image(Some(name), "image/png", name.as_bytes().to_vec())
                .await;
            assert_eq!(res.status, 200);
        }

        let res = app.get(routes::IMAGES).await;
        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 3);

        let timestamps: Vec<&str> = images
            .iter()
            .map(|i| i["uploadedAt"].as_str().unwrap())
            .collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(timestamps, sorted, "listing should be newest first");
    }

    #[tokio::test]
    async fn deleted_out_of_band_files_disappear_from_listing() {
        let app = TestApp::spawn().await;
        let uploaded = app
            .upload_image(Some("cat.png"), "image/png", b"png".to_vec())
            .await;
        let filename = uploaded.body["image"]["filename"].as_str().unwrap().to_string();

        std::fs::remove_file(app.upload_dir.join(&filename)).unwrap();

        let res = app.get(routes::IMAGES).await;
        assert_eq!(res.body["images"].as_array().unwrap().len(), 0);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_file() {
        let app = TestApp::spawn().await;
        let uploaded = app
            .upload_image(Some("cat.png"), "image/png", b"png".to_vec())
            .await;
        let id = uploaded.body["image"]["id"].as_str().unwrap().to_string();

        let res = app.delete_json(routes::IMAGES, &json!({ "id": id })).await;

        assert_eq!(res.status, 200, "unexpected response: {}", res.text);
        assert_eq!(res.body["success"], json!(true));
        assert_eq!(res.body["message"].as_str().unwrap(), "Image deleted successfully");
        assert_eq!(res.body["deletedImage"]["id"].as_str().unwrap(), id);

        assert!(app.stored_files().is_empty());
        let listing = app.get(routes::IMAGES).await;
        assert_eq!(listing.body["images"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_404_every_time() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4().to_string();

        for _ in 0..2 {
            let res = app.delete_json(routes::IMAGES, &json!({ "id": id })).await;
            assert_eq!(res.status, 404);
            assert_eq!(res.body["success"], json!(false));
            assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn delete_without_id_is_400() {
        let app = TestApp::spawn().await;

        let res = app.delete_json(routes::IMAGES, &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        assert_eq!(res.body["message"].as_str().unwrap(), "Image ID is required");
    }

    #[tokio::test]
    async fn delete_with_malformed_id_is_400() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_json(routes::IMAGES, &json!({ "id": "not-a-uuid" }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn delete_succeeds_when_file_was_removed_out_of_band() {
        let app = TestApp::spawn().await;
        let uploaded = app
            .upload_image(Some("cat.png"), "image/png", b"png".to_vec())
            .await;
        let id = uploaded.body["image"]["id"].as_str().unwrap().to_string();
        let filename = uploaded.body["image"]["filename"].as_str().unwrap().to_string();

        std::fs::remove_file(app.upload_dir.join(&filename)).unwrap();

        let res = app.delete_json(routes::IMAGES, &json!({ "id": id })).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], json!(true));
    }
}

mod serve {
    use super::*;

    #[tokio::test]
    async fn uploaded_bytes_round_trip_through_url() {
        let app = TestApp::spawn().await;
        let uploaded = app
            .upload_image(Some("cat.png"), "image/png", b"raw png bytes".to_vec())
            .await;
        let url = uploaded.body["image"]["url"].as_str().unwrap().to_string();

        let (status, content_type, bytes) = app.get_bytes(&url).await;

        assert_eq!(status, 200);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(bytes, b"raw png bytes");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::upload("nope.png")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn traversal_filenames_are_rejected() {
        let app = TestApp::spawn().await;
        std::fs::write(app.upload_dir.join("secret.png"), b"secret").unwrap();

        let res = app.get("/uploads/..%2Fsecret.png").await;

        assert_eq!(res.status, 404);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn parallel_uploads_all_land_with_distinct_ids() {
        let app = TestApp::spawn().await;
        let n = 8;

        let uploads = (0..n).map(|i| {
            let app = &app;
            async move {
                app.upload_image(
                    Some(&format!("img{i}.png")),
                    "image/png",
                    format!("image number {i}").into_bytes(),
                )
                .await
            }
        });
        let responses = futures::future::join_all(uploads).await;

        let mut ids = std::collections::HashSet::new();
        let mut files = std::collections::HashSet::new();
        for res in &responses {
            assert_eq!(res.status, 200, "upload failed: {}", res.text);
            ids.insert(res.body["image"]["id"].as_str().unwrap().to_string());
            files.insert(res.body["image"]["filename"].as_str().unwrap().to_string());
        }
        assert_eq!(ids.len(), n);
        assert_eq!(files.len(), n);

        let listing = app.get(routes::IMAGES).await;
        assert_eq!(listing.body["images"].as_array().unwrap().len(), n);
    }
}
