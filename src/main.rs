use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use log::{error, info};

use feedline::handlers::auth_handlers::{login, signup};
use feedline::handlers::feed_handlers::{
    create_post, delete_post, get_post, get_posts, serve_image, update_post,
};
use feedline::services::auth_service::AuthService;
use feedline::{config, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let pool = match config::get_pg_pool() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create PG pool: {}", e);
            std::process::exit(1);
        }
    };

    let auth_data = web::Data::new(AuthService::new_from_env());
    let state = web::Data::new(AppState { pool });

    let bind_address = config::bind_address();
    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        // process-wide policy: every response carries these headers
        let cors = Cors::default()
            .allow_any_origin()
            .send_wildcard()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION]);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(auth_data.clone())
            .service(
                web::scope("/auth")
                    .service(signup) // POST /auth/signup
                    .service(login), // POST /auth/login
            )
            .service(
                web::scope("/feed")
                    .service(get_posts) // GET /feed/posts
                    .service(get_post) // GET /feed/posts/{postId}
                    .service(create_post) // POST /feed/posts
                    .service(update_post) // PUT /feed/posts/{postId}
                    .service(delete_post), // DELETE /feed/posts/{postId}
            )
            .service(serve_image) // GET /images/{filename}
    })
    .bind(&bind_address)?
    .run()
    .await
}
