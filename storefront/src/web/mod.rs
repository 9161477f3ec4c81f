// storefront/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error};

pub use routes::configure_app_routes;

use crate::services::image_store::PUBLIC_PREFIX;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "storefront_session";

/// Builds the application with shared state, session cookie, upload limits,
/// static image serving and every route. Used by the server and the tests.
pub fn build_app(
  app_state: AppState,
  session_key: Key,
  cookie_secure: bool,
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<impl MessageBody>,
    Error = Error,
    InitError = (),
  >,
> {
  let multipart_config = MultipartFormConfig::default()
    .total_limit(app_state.config.max_upload_bytes)
    .memory_limit(256 * 1024);
  let upload_dir = app_state.images.dir().to_path_buf();

  let session = SessionMiddleware::builder(CookieSessionStore::default(), session_key)
    .cookie_name(SESSION_COOKIE.to_string())
    .cookie_secure(cookie_secure)
    .cookie_http_only(true)
    .cookie_same_site(SameSite::Lax)
    .build();

  App::new()
    .app_data(web::Data::new(app_state))
    .app_data(multipart_config)
    .wrap(session)
    .wrap(tracing_actix_web::TracingLogger::default())
    .configure(configure_app_routes)
    .service(Files::new(PUBLIC_PREFIX, upload_dir))
}
