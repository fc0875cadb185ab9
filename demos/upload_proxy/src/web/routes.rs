// demos/upload_proxy/src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/health", web::get().to(health_check_handler)).service(
    web::scope("/api").route(
      "/upload",
      web::post().to(crate::web::handlers::upload_handlers::upload_image_handler),
    ),
  );
}
