/// Route table for the forum API
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::handlers;
use actix_web::web;

/// Register extractor configs and every `/api` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(handlers::get_feed))
                        .route("/{post_id}", web::get().to(handlers::get_post))
                        .route("/{post_id}/comments", web::get().to(handlers::list_comments)),
                )
                .service(
                    web::scope("/subreddit")
                        .route("", web::post().to(handlers::create_community))
                        .route("/subscribe", web::post().to(handlers::subscribe))
                        .route("/unsubscribe", web::post().to(handlers::unsubscribe))
                        .route("/post/create", web::post().to(handlers::create_post))
                        .route("/post/vote", web::patch().to(handlers::vote_post))
                        .route("/post/comment", web::patch().to(handlers::create_comment))
                        .route(
                            "/post/comment/vote",
                            web::patch().to(handlers::vote_comment),
                        )
                        .route("/{name}", web::get().to(handlers::community_detail)),
                )
                .route("/search", web::get().to(handlers::search_communities))
                .route("/trending", web::get().to(handlers::trending_communities))
                .service(
                    web::scope("/settings")
                        .service(
                            web::resource("/subreddit")
                                .route(web::patch().to(handlers::rename_community))
                                .route(web::delete().to(handlers::delete_community)),
                        )
                        .route(
                            "/subredditName",
                            web::patch().to(handlers::rename_community),
                        )
                        .route(
                            "/subredditMember/remove",
                            web::delete().to(handlers::remove_member),
                        )
                        .route("/username", web::patch().to(handlers::rename_user))
                        .route("/user", web::delete().to(handlers::delete_account)),
                ),
        );
}
