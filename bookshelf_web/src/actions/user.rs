use bookshelf_backend::api::User;

use crate::actions::ServerActions;
use crate::api::ActionResponse;
use crate::error_normalizer::{handle_api_error, ErrorHandlerOptions};
use crate::parallel_action::ParallelAction;

const GET_USER: ErrorHandlerOptions = ErrorHandlerOptions::new("Error getting user");

impl ServerActions {
    /// User owning the session
    pub fn get_user(&self) -> ParallelAction<'_, ActionResponse<User>> {
        ParallelAction::new(async move {
            let session = match self.require_session() {
                Ok(session) => session,
                Err(response) => return response,
            };

            match self.backend.current_user(session.as_str()).await {
                Ok(user) => ActionResponse::success("User gotten!", user),
                Err(err) => handle_api_error(err, &GET_USER),
            }
        })
    }
}

#[cfg(test)]
mod user_tests {
    use crate::actions::test_support::TestBackend;
    use crate::actions::AUTHENTICATION_REQUIRED_MESSAGE;
    use crate::api::{ActionResponse, SessionToken};

    #[actix_web::test]
    async fn get_user_of_session() {
        let backend = TestBackend::start();
        let actions = backend.signed_in("reader@example.com").await;

        let response = actions.get_user().await;
        assert_eq!(response.details(), "User gotten!");
        let user = response.into_data().unwrap();
        assert_eq!(user.email, "reader@example.com");
        assert!(user.email_verified);
    }

    #[actix_web::test]
    async fn get_user_requires_session() {
        let backend = TestBackend::start();

        let anonymous = backend.actions.get_user().await;
        assert_eq!(
            anonymous,
            ActionResponse::error(AUTHENTICATION_REQUIRED_MESSAGE, "UNAUTHORIZED")
        );

        let unknown = backend
            .actions
            .with_session(Some(SessionToken::new("forged")))
            .get_user()
            .await;
        assert_eq!(unknown.error_code(), Some("UNAUTHORIZED"));
    }
}
