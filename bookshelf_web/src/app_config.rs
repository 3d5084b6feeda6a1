use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(web::resource("/").route(web::get().to(handlers::home)))
        .service(web::resource("/verify-email").route(web::get().to(handlers::verify_email)))
        .service(
            web::scope("/api")
                .service(web::resource("/user").route(web::get().to(handlers::get_user)))
                .service(web::resource("/my-books").route(web::get().to(handlers::get_my_books)))
                .service(web::resource("/portfolio").route(web::get().to(handlers::get_portfolio)))
                .service(web::resource("/search").route(web::get().to(handlers::search)))
                .service(
                    web::scope("/books")
                        .service(web::resource("").route(web::post().to(handlers::add_book)))
                        .service(
                            web::resource("/{book_id}")
                                .route(web::patch().to(handlers::update_book))
                                .route(web::delete().to(handlers::remove_book)),
                        )
                        .service(
                            web::resource("/{book_id}/state")
                                .route(web::get().to(handlers::book_state)),
                        ),
                )
                .service(
                    web::scope("/auth")
                        .service(web::resource("/login").route(web::post().to(handlers::login)))
                        .service(web::resource("/logout").route(web::post().to(handlers::logout)))
                        .service(
                            web::resource("/register").route(web::post().to(handlers::register)),
                        )
                        .service(
                            web::resource("/request-reset")
                                .route(web::post().to(handlers::request_password_reset)),
                        )
                        .service(
                            web::resource("/reset-password")
                                .route(web::post().to(handlers::reset_password)),
                        )
                        .service(
                            web::resource("/resend-verification")
                                .route(web::post().to(handlers::resend_verification)),
                        ),
                ),
        );
}
