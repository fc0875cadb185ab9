// demos/upload_proxy/src/web/handlers/upload_handlers.rs

use actix_multipart::form::bytes::Bytes as FilePart;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};
use openmarket::ImageFile;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, NO_FILE_MESSAGE};
use crate::state::AppState;

/// `multipart/form-data` body of `POST /api/upload`. Other fields are ignored.
#[derive(Debug, MultipartForm)]
pub struct UploadForm {
  pub file: Option<FilePart>,
}

fn image_file(part: FilePart) -> ImageFile {
  let file = ImageFile::new(part.file_name.unwrap_or_default(), part.data.to_vec());
  match part.content_type {
    Some(mime) => file.with_content_type(mime.to_string()),
    None => file,
  }
}

/// `POST /api/upload`: pins the `file` part and responds with the CID
/// assigned by the pinning service.
#[instrument(name = "handler::upload_image", skip_all)]
pub async fn upload_image_handler(
  app_state: web::Data<AppState>,
  form: Result<MultipartForm<UploadForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
  let part = match form {
    Ok(form) => form.into_inner().file,
    Err(e) => {
      warn!("Upload request is not a readable multipart form: {}", e);
      None
    }
  };
  let Some(part) = part else {
    return Err(AppError::Validation(NO_FILE_MESSAGE.to_string()));
  };

  let uploaded = app_state.bridge.upload(image_file(part)).await?;
  info!("Upload of '{}' pinned as {}.", uploaded.name, uploaded.cid);

  Ok(HttpResponse::Ok().json(uploaded))
}
