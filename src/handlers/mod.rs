pub mod auth_handlers;
pub mod feed_handlers;
