//! Auth service implementation.
//!
//! Registration derives an argon2id hash (PHC string, embedded salt) and
//! stores it next to the username; the plaintext password is never persisted
//! or logged. Login re-derives with the stored salt and verifies in constant
//! time.
//!
//! Note that a successful login does not bind subsequent calls to a session:
//! the wire contract carries no token, so catalog and booking calls are
//! accepted from any connection. See DESIGN.md for the record of that gap.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use boxoffice_proto::proto::{
    LoginUserRequest, LoginUserResponse, RegisterUserRequest, RegisterUserResponse,
    auth_service_server::AuthService,
};
use boxoffice_store::CredentialStore;
use boxoffice_types::{StoreError, UserRecord};
use tonic::{Request, Response, Status};

use crate::services::store_fault;

/// Credential registration and verification service.
#[derive(bon::Builder)]
pub struct AuthServiceImpl {
    /// User record store.
    credentials: Arc<dyn CredentialStore>,
}

/// Derives an argon2id PHC string for the given password with a fresh
/// random salt.
fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verifies a candidate password against a stored PHC string.
///
/// An unparseable stored hash verifies as false rather than erroring: the
/// caller must see the same generic failure as a wrong password.
fn verify_password(stored: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    async fn register_user(
        &self,
        request: Request<RegisterUserRequest>,
    ) -> Result<Response<RegisterUserResponse>, Status> {
        let req = request.into_inner();

        if req.username.is_empty() || req.password.is_empty() {
            return Err(Status::invalid_argument(
                "username and password must be non-empty",
            ));
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            tracing::error!(
                service = "auth",
                method = "register_user",
                error = %e,
                "Password hashing failed"
            );
            Status::internal("password hashing failed")
        })?;

        let record = UserRecord {
            username: req.username.clone(),
            password_hash,
        };

        match self.credentials.insert(record) {
            Ok(()) => {
                tracing::info!(
                    service = "auth",
                    method = "register_user",
                    username = %req.username,
                    outcome = "registered",
                );
                Ok(Response::new(RegisterUserResponse {
                    success: true,
                    message: format!("User '{}' registered.", req.username),
                }))
            }
            Err(StoreError::DuplicateKey { .. }) => {
                tracing::info!(
                    service = "auth",
                    method = "register_user",
                    username = %req.username,
                    outcome = "duplicate",
                );
                Ok(Response::new(RegisterUserResponse {
                    success: false,
                    message: format!("Username '{}' is already taken.", req.username),
                }))
            }
            Err(err) => Err(store_fault(&err)),
        }
    }

    async fn login_user(
        &self,
        request: Request<LoginUserRequest>,
    ) -> Result<Response<LoginUserResponse>, Status> {
        let req = request.into_inner();

        let verified = match self.credentials.find(&req.username) {
            Ok(Some(user)) => verify_password(&user.password_hash, &req.password),
            Ok(None) => false,
            Err(err) => return Err(store_fault(&err)),
        };

        tracing::info!(
            service = "auth",
            method = "login_user",
            username = %req.username,
            outcome = if verified { "accepted" } else { "rejected" },
        );

        // One generic failure message whether the user is absent or the
        // password is wrong; enumeration via error text is not possible.
        let response = if verified {
            LoginUserResponse {
                success: true,
                message: "Login successful.".to_string(),
            }
        } else {
            LoginUserResponse {
                success: false,
                message: "Invalid username or password.".to_string(),
            }
        };
        Ok(Response::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_store::MemoryCredentials;

    fn service() -> AuthServiceImpl {
        AuthServiceImpl::builder()
            .credentials(Arc::new(MemoryCredentials::new()))
            .build()
    }

    fn register(username: &str, password: &str) -> Request<RegisterUserRequest> {
        Request::new(RegisterUserRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn login(username: &str, password: &str) -> Request<LoginUserRequest> {
        Request::new(LoginUserRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let svc = service();

        let reg = svc.register_user(register("ayu", "s3cret")).await.unwrap();
        assert!(reg.get_ref().success);

        let ok = svc.login_user(login("ayu", "s3cret")).await.unwrap();
        assert!(ok.get_ref().success);

        let bad = svc.login_user(login("ayu", "wrong")).await.unwrap();
        assert!(!bad.get_ref().success);
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_generic_rejection() {
        let svc = service();
        svc.register_user(register("ayu", "s3cret")).await.unwrap();

        let wrong_pass = svc.login_user(login("ayu", "nope")).await.unwrap();
        let no_user = svc.login_user(login("ghost", "nope")).await.unwrap();

        assert!(!wrong_pass.get_ref().success);
        assert!(!no_user.get_ref().success);
        assert_eq!(wrong_pass.get_ref().message, no_user.get_ref().message);
    }

    #[tokio::test]
    async fn duplicate_registration_preserves_the_original_credentials() {
        let svc = service();
        svc.register_user(register("ayu", "first")).await.unwrap();

        let dup = svc.register_user(register("ayu", "second")).await.unwrap();
        assert!(!dup.get_ref().success);

        // Original password still works; the failed re-register changed nothing.
        let original = svc.login_user(login("ayu", "first")).await.unwrap();
        assert!(original.get_ref().success);
        let usurper = svc.login_user(login("ayu", "second")).await.unwrap();
        assert!(!usurper.get_ref().success);
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_plaintext() {
        let store = Arc::new(MemoryCredentials::new());
        let svc = AuthServiceImpl::builder().credentials(store.clone()).build();
        svc.register_user(register("ayu", "s3cret")).await.unwrap();

        let record = store.find("ayu").unwrap().unwrap();
        assert_ne!(record.password_hash, "s3cret");
        assert!(record.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn empty_credentials_are_malformed_requests() {
        let svc = service();
        let err = svc.register_user(register("", "pw")).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn same_password_hashes_to_different_strings() {
        // Fresh salt per registration.
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "pw"));
        assert!(verify_password(&b, "pw"));
    }
}
