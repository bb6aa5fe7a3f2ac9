//! HTTP inbound adapter exposing REST endpoints.

pub mod addresses;
pub mod contacts;
pub mod error;
pub mod health;
pub mod query;
pub mod state;
pub mod users;

use actix_web::web;

pub use error::{ApiResult, ErrorBody};
pub use health::HealthState;
pub use state::HttpState;

/// Mount the resource scopes and route malformed input to `400` responses.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use user_service::inbound::http::configure;
///
/// let app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| error::extractor_error(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| error::extractor_error(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| error::extractor_error(err, req)))
        .configure(users::configure)
        .configure(addresses::configure)
        .configure(contacts::configure);
}
