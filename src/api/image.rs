use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt;
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_FIELD: &str = "image";
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Lower-cased extension of an uploaded file name, if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Stored names are `<uuid>.<ext>`; anything with a separator or a parent
/// reference never reaches the file system.
pub fn is_safe_media_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

fn content_type_for(name: &str) -> &'static str {
    match image_extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn upload_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "errno": 1, "message": message.into() }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload").route(web::post().to(upload_image)));
}

/// Rich-text editor image upload
#[utoipa::path(
    post,
    path = "/api/image/upload",
    request_body(content = String, description = "multipart/form-data with an `image` file", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored", body = Object, example = json!({
            "errno": 0,
            "data": {"url": "http://localhost:8000/api/media/2f1c.png", "alt": "", "href": "http://localhost:8000/api/media/2f1c.png"}
        })),
        (status = 400, description = "Rejected", body = Object, example = json!({
            "errno": 1, "message": "only png, jpg, jpeg and gif images are accepted"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Image"
)]
pub async fn upload_image(
    auth: AuthUser,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> HttpResponse {
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return upload_error(format!("failed to read multipart data: {e}")),
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let Some(ext) = image_extension(&filename) else {
            return upload_error("only png, jpg, jpeg and gif images are accepted");
        };

        let mut data = Vec::new();
        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => {
                    if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                        return upload_error("image must not exceed 5MB");
                    }
                    data.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return upload_error(format!("failed to read image data: {e}")),
            }
        }

        let name = format!("{}.{}", Uuid::new_v4().to_simple(), ext);
        let path = Path::new(&config.media_root).join(&name);

        if let Err(e) = tokio::fs::create_dir_all(&config.media_root).await {
            error!(error = %e, root = %config.media_root, "Failed to create media directory");
            return HttpResponse::InternalServerError()
                .json(json!({ "errno": 1, "message": "failed to store image" }));
        }
        if let Err(e) = tokio::fs::write(&path, &data).await {
            error!(error = %e, path = %path.display(), "Failed to store image");
            return HttpResponse::InternalServerError()
                .json(json!({ "errno": 1, "message": "failed to store image" }));
        }

        let url = format!(
            "{}{}/{}",
            config.public_base_url.trim_end_matches('/'),
            config.media_url(),
            name
        );
        info!(user_id = auth.user_id, file = %name, bytes = data.len(), "Image uploaded");

        return HttpResponse::Ok().json(json!({
            "errno": 0,
            "data": { "url": url, "alt": "", "href": url }
        }));
    }

    upload_error("no image provided")
}

/// Serves a previously uploaded file. Mounted at `<prefix>/media/{file}` without auth.
pub async fn serve_media(config: web::Data<Config>, path: web::Path<String>) -> HttpResponse {
    let name = path.into_inner();
    if !is_safe_media_name(&name) {
        warn!(file = %name, "Rejected media path");
        return HttpResponse::NotFound().finish();
    }

    match tokio::fs::read(Path::new(&config.media_root).join(&name)).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(content_type_for(&name))
            .body(bytes),
        Err(_) => HttpResponse::NotFound().finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::generate_access_token, middleware::auth_middleware};
    use crate::config::test_config;
    use actix_web::test::{
        TestRequest, call_and_read_body_json, call_service, init_service, read_body,
        read_body_json,
    };
    use actix_web::{App, http::StatusCode, middleware::from_fn};
    use serde_json::Value;

    #[test]
    fn accepts_only_images() {
        assert_eq!(image_extension("cat.PNG").as_deref(), Some("png"));
        assert_eq!(image_extension("a.b.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(image_extension("doc.pdf"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[test]
    fn media_names_cannot_escape_root() {
        assert!(is_safe_media_name("0f3a.png"));
        assert!(!is_safe_media_name("../etc/passwd"));
        assert!(!is_safe_media_name("a/b.png"));
        assert!(!is_safe_media_name(".env"));
        assert!(!is_safe_media_name(""));
    }

    #[actix_web::test]
    async fn upload_then_fetch() {
        let config = test_config();
        let token = generate_access_token(1, "a@example.com", &config.jwt_secret, 60).unwrap();
        let app = init_service(
            App::new().app_data(web::Data::new(config.clone())).service(
                web::scope("/api")
                    .wrap(from_fn(auth_middleware))
                    .service(web::scope("/image").configure(configure))
                    .route("/media/{file}", web::get().to(serve_media)),
            ),
        )
        .await;

        let boundary = "----oa-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"dot.gif\"\r\n\
             Content-Type: image/gif\r\n\r\n\
             GIF89a\r\n\
             --{boundary}--\r\n"
        );
        let req = TestRequest::post()
            .uri("/api/image/upload")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            ))
            .set_payload(body)
            .to_request();
        let uploaded: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(uploaded["errno"], 0);
        let url = uploaded["data"]["url"].as_str().unwrap().to_string();
        let name = url.rsplit('/').next().unwrap().to_string();
        assert!(name.ends_with(".gif"));

        let req = TestRequest::get()
            .uri(&format!("/api/media/{name}"))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = read_body(resp).await;
        assert_eq!(&bytes[..], b"GIF89a");

        let _ = std::fs::remove_file(Path::new(&config.media_root).join(&name));
    }

    #[actix_web::test]
    async fn rejects_non_images() {
        let config = test_config();
        let token = generate_access_token(1, "a@example.com", &config.jwt_secret, 60).unwrap();
        let app = init_service(
            App::new().app_data(web::Data::new(config.clone())).service(
                web::scope("/api")
                    .wrap(from_fn(auth_middleware))
                    .service(web::scope("/image").configure(configure)),
            ),
        )
        .await;

        let boundary = "b0undary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             hello\r\n\
             --{boundary}--\r\n"
        );
        let req = TestRequest::post()
            .uri("/api/image/upload")
            .insert_header(("Authorization", format!("JWT {token}")))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            ))
            .set_payload(body)
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["errno"], 1);
    }
}
