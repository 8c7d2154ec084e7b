//! crates/notes_core/src/auth.rs
//!
//! The account state machine: signup with email-OTP verification, login,
//! and the password-reset token lifecycle. Session token issuance is the web
//! layer's job; this flow only manages credential records and email sends.

use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Mail, NewUser, User};
use crate::password::{hash_password, verify_password};
use crate::ports::{Mailer, PortError, PortResult, UserStore};
use crate::templates;

const VERIFICATION_CODE_TTL_MINUTES: i64 = 5;
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Signup, verification, login, and password reset against the user store.
#[derive(Clone)]
pub struct AuthFlow {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    /// Base URL of the web client, used to build reset-password links.
    client_url: String,
}

impl AuthFlow {
    pub fn new(users: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>, client_url: String) -> Self {
        Self {
            users,
            mailer,
            client_url,
        }
    }

    /// Registers a new, unverified account. The verification mail is sent
    /// before the record is created: an unsent code must not produce an
    /// account with no way to verify it.
    pub async fn signup(&self, email: &str, password: &str) -> PortResult<User> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(PortError::BadRequest("User already exists".to_string()));
        }

        let otp = generate_verification_code();
        let sent = self
            .mailer
            .send(Mail {
                to: email.clone(),
                subject: "Verification Mail".to_string(),
                html_body: templates::verification_mail(&otp),
            })
            .await;
        if !sent {
            return Err(PortError::BadRequest(
                "Can't send verification mail".to_string(),
            ));
        }

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash: hash_password(password)?,
                verification_code: otp,
                verification_code_expires_at: Utc::now()
                    + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES),
            })
            .await?;

        Ok(user.into())
    }

    /// Consumes a one-time verification code. On success the code and its
    /// expiry are cleared, so a second attempt with the same code fails.
    pub async fn verify_email(&self, email: &str, otp: &str) -> PortResult<User> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;

        if user.is_verified {
            return Err(PortError::BadRequest(
                "User is already verified".to_string(),
            ));
        }
        if user.verification_code.as_deref() != Some(otp) {
            return Err(PortError::BadRequest("Invalid otp".to_string()));
        }
        match user.verification_code_expires_at {
            Some(expires_at) if Utc::now() <= expires_at => {}
            _ => return Err(PortError::BadRequest("Otp expired".to_string())),
        }

        let verified = self.users.mark_verified(user.id, Utc::now()).await?;

        let sent = self
            .mailer
            .send(Mail {
                to: verified.email.clone(),
                subject: "Welcome Aboard! Your Account Has Been Successfully Created".to_string(),
                html_body: templates::welcome_mail(),
            })
            .await;
        if !sent {
            return Err(PortError::BadRequest("Can't send welcome mail".to_string()));
        }

        Ok(verified.into())
    }

    /// Authenticates an email/password pair. Unknown email and wrong password
    /// produce the same error so callers cannot probe which addresses are
    /// registered.
    pub async fn login(&self, email: &str, password: &str) -> PortResult<User> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| PortError::BadRequest("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(PortError::BadRequest(
                "Invalid email or password".to_string(),
            ));
        }

        self.users.touch_last_login(user.id, Utc::now()).await?;
        Ok(user.into())
    }

    /// Issues a password-reset token and mails the reset link. The token is
    /// persisted before the send, so a mail failure leaves a valid-but-unused
    /// token behind; it simply ages out after its 10-minute expiry.
    pub async fn forgot_password(&self, email: &str) -> PortResult<()> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        let reset_link = format!("{}/reset-password/{}", self.client_url, token);
        let sent = self
            .mailer
            .send(Mail {
                to: user.email,
                subject: "Reset Your Password".to_string(),
                html_body: templates::reset_request_mail(&reset_link),
            })
            .await;
        if !sent {
            return Err(PortError::BadRequest(
                "Can't send reset password mail".to_string(),
            ));
        }

        Ok(())
    }

    /// Redeems a reset token. The token is cleared together with the password
    /// swap, so it cannot be replayed.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
        confirm_new_password: &str,
    ) -> PortResult<()> {
        if new_password != confirm_new_password {
            return Err(PortError::BadRequest("Passwords do not match".to_string()));
        }

        let user = self
            .users
            .find_by_reset_token(reset_token, Utc::now())
            .await?
            .ok_or_else(|| {
                PortError::BadRequest("Invalid or expired reset token".to_string())
            })?;

        self.users
            .replace_password(user.id, &hash_password(new_password)?)
            .await?;

        let sent = self
            .mailer
            .send(Mail {
                to: user.email,
                subject: "Your Password Has Been Reset".to_string(),
                html_body: templates::reset_success_mail(),
            })
            .await;
        if !sent {
            return Err(PortError::BadRequest(
                "Can't send reset confirmation mail".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A 6-digit numeric one-time code, zero-padded.
fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// An opaque reset token. A v4 UUID carries 122 random bits, which is plenty
/// for a token that lives for ten minutes.
fn generate_reset_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryUserStore, RecordingMailer};

    fn flow() -> (AuthFlow, Arc<InMemoryUserStore>, Arc<RecordingMailer>) {
        let users = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let flow = AuthFlow::new(
            users.clone(),
            mailer.clone(),
            "http://localhost:3000".to_string(),
        );
        (flow, users, mailer)
    }

    async fn signed_up(flow: &AuthFlow, users: &InMemoryUserStore) -> (String, String) {
        flow.signup("a@b.com", "Aa1!aaaa").await.unwrap();
        let otp = users.verification_code("a@b.com").unwrap();
        ("a@b.com".to_string(), otp)
    }

    #[tokio::test]
    async fn signup_creates_unverified_user_with_code() {
        let (flow, users, mailer) = flow();
        let user = flow.signup("A@B.com ", "Aa1!aaaa").await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert!(!user.is_verified);
        assert!(users.verification_code("a@b.com").is_some());
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].subject, "Verification Mail");
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let (flow, _, _) = flow();
        flow.signup("a@b.com", "Aa1!aaaa").await.unwrap();
        let err = flow.signup("a@b.com", "Bb2!bbbb").await.unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn failed_verification_mail_creates_no_account() {
        let (flow, users, mailer) = flow();
        mailer.fail_sends();
        let err = flow.signup("a@b.com", "Aa1!aaaa").await.unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
        assert!(users.find_by_email("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn verify_sets_verified_and_clears_the_code() {
        let (flow, users, _) = flow();
        let (email, otp) = signed_up(&flow, &users).await;

        let user = flow.verify_email(&email, &otp).await.unwrap();
        assert!(user.is_verified);
        assert!(user.last_login.is_some());
        assert!(users.verification_code(&email).is_none());
    }

    #[tokio::test]
    async fn a_code_cannot_be_used_twice() {
        let (flow, users, _) = flow();
        let (email, otp) = signed_up(&flow, &users).await;

        flow.verify_email(&email, &otp).await.unwrap();
        let err = flow.verify_email(&email, &otp).await.unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let (flow, users, _) = flow();
        let (email, otp) = signed_up(&flow, &users).await;
        let wrong = if otp == "000000" { "000001" } else { "000000" };

        let err = flow.verify_email(&email, wrong).await.unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn expired_code_is_rejected_even_when_it_matches() {
        let (flow, users, _) = flow();
        let (email, otp) = signed_up(&flow, &users).await;
        users.expire_verification_code(&email);

        let err = flow.verify_email(&email, &otp).await.unwrap_err();
        match err {
            PortError::BadRequest(msg) => assert_eq!(msg, "Otp expired"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn verify_for_unknown_email_is_not_found() {
        let (flow, _, _) = flow();
        let err = flow.verify_email("nobody@b.com", "123456").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn login_succeeds_with_the_right_password_and_stamps_login_time() {
        let (flow, users, _) = flow();
        let (email, _) = signed_up(&flow, &users).await;

        let user = flow.login(&email, "Aa1!aaaa").await.unwrap();
        assert_eq!(user.email, email);
        let record = users.find_by_email(&email).await.unwrap().unwrap();
        assert!(record.last_login.is_some());
    }

    #[tokio::test]
    async fn login_does_not_reveal_which_half_was_wrong() {
        let (flow, users, _) = flow();
        let (email, _) = signed_up(&flow, &users).await;

        let unknown = flow.login("nobody@b.com", "Aa1!aaaa").await.unwrap_err();
        let wrong_pw = flow.login(&email, "Zz9!zzzz").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong_pw.to_string());
    }

    #[tokio::test]
    async fn forgot_then_reset_swaps_the_password_and_burns_the_token() {
        let (flow, users, _) = flow();
        let (email, _) = signed_up(&flow, &users).await;

        flow.forgot_password(&email).await.unwrap();
        let token = users.reset_token(&email).unwrap();

        flow.reset_password(&token, "Bb2!bbbb", "Bb2!bbbb")
            .await
            .unwrap();

        // New password works, old one does not.
        flow.login(&email, "Bb2!bbbb").await.unwrap();
        let err = flow.login(&email, "Aa1!aaaa").await.unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));

        // The token was cleared with the swap.
        let err = flow
            .reset_password(&token, "Cc3!cccc", "Cc3!cccc")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn mismatched_password_pair_is_rejected_before_token_lookup() {
        let (flow, _, _) = flow();
        let err = flow
            .reset_password("whatever", "Aa1!aaaa", "Bb2!bbbb")
            .await
            .unwrap_err();
        match err {
            PortError::BadRequest(msg) => assert_eq!(msg, "Passwords do not match"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let (flow, users, _) = flow();
        let (email, _) = signed_up(&flow, &users).await;

        flow.forgot_password(&email).await.unwrap();
        let token = users.reset_token(&email).unwrap();
        users.expire_reset_token(&email);

        let err = flow
            .reset_password(&token, "Bb2!bbbb", "Bb2!bbbb")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[test]
    fn verification_codes_are_six_digits() {
        for _ in 0..64 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
