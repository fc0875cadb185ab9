// demos/upload_proxy/src/web/handlers/mod.rs

pub mod upload_handlers;
