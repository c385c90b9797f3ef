//! AuthSession - state machine cho flow login hai bước của Ininal.
//!
//! Backend quyết định có challenge OTP hay không dựa trên risk signals của
//! device/session, nên login được model thành một choice tường minh:
//! `OtpRequired` (cần code out-of-band rồi resume) hoặc `Authenticated`
//! (happy path, không cần input gì thêm). State machine này không bao giờ
//! tự block chờ input - driver bên ngoài chịu trách nhiệm lấy OTP code và
//! gọi `submit_otp` để resume.

use tracing::debug;

use super::types::LoginResult;
use crate::error::{SyncError, SyncResult};

/// Giá trị `authStatus` báo hiệu cần OTP; mọi giá trị khác đi thẳng tới
/// authenticated.
const STATUS_OTP_REQUIRED: &str = "OTP_REQUIRED";

/// Seam cho login/verify exchange để test được state machine không cần
/// network. `IninalClient` là implementation thật.
pub trait AuthExchange {
    fn login(&self, login_token: &str, bearer_token: &str) -> SyncResult<LoginResult>;
    fn verify(&self, otp: &str, challenge_token: &str, bearer_token: &str)
        -> SyncResult<LoginResult>;
}

/// Trạng thái hiện tại của session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Chưa submit gì
    Unauthenticated,
    /// Login đã submit, backend yêu cầu OTP; giữ challenge token để resume
    OtpRequired { challenge_token: String },
    /// Đã có session token + user token, dùng được cho mọi endpoint còn lại
    Authenticated {
        user_token: String,
        session_token: String,
    },
    /// Transport/protocol error - terminal, phải tạo session mới để retry
    Failed,
}

/// Kết quả của một bước login/verify.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Cần OTP code (gửi out-of-band tới số điện thoại đăng ký)
    OtpRequired { challenge_token: String },
    /// Login xong, session sẵn sàng
    Authenticated {
        user_token: String,
        session_token: String,
    },
}

/// Session state machine:
/// `Unauthenticated → {OtpRequired → Authenticated} | Authenticated`,
/// mọi lỗi → `Failed` (terminal). Không retry - lỗi trả thẳng cho caller,
/// caller quyết định có chạy lại cả flow hay không.
pub struct AuthSession<'a, E: AuthExchange> {
    exchange: &'a E,
    login_token: String,
    bearer_token: String,
    state: AuthState,
}

impl<'a, E: AuthExchange> AuthSession<'a, E> {
    /// Tạo session mới ở trạng thái `Unauthenticated`.
    ///
    /// `login_token` và `bearer_token` là pre-session identifiers cấp sẵn
    /// cho device (việc lấy chúng nằm ngoài scope của state machine).
    pub fn new(exchange: &'a E, login_token: &str, bearer_token: &str) -> Self {
        Self {
            exchange,
            login_token: login_token.to_string(),
            bearer_token: bearer_token.to_string(),
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Bước 1: submit login exchange.
    ///
    /// Transition chỉ dựa trên `authStatus` trong payload; HTTP status chỉ
    /// xuất hiện trong error message khi exchange thất bại hẳn.
    pub fn submit_login(&mut self) -> SyncResult<LoginOutcome> {
        if self.state != AuthState::Unauthenticated {
            return Err(SyncError::Auth(format!(
                "login submitted from invalid state: {:?}",
                self.state
            )));
        }

        let result = self
            .exchange
            .login(&self.login_token, &self.bearer_token)
            .map_err(|err| self.fail(err))?;

        let outcome = Self::classify(result).map_err(|err| self.fail(err))?;
        self.apply(&outcome);
        Ok(outcome)
    }

    /// Bước 2: resume bằng OTP code; chỉ hợp lệ từ trạng thái `OtpRequired`.
    ///
    /// Protocol không định nghĩa challenge round nào nữa sau verify, nên mọi
    /// outcome khác `Authenticated` đều là lỗi.
    pub fn submit_otp(&mut self, code: &str) -> SyncResult<LoginOutcome> {
        let challenge_token = match &self.state {
            AuthState::OtpRequired { challenge_token } => challenge_token.clone(),
            state => {
                return Err(SyncError::Auth(format!(
                    "OTP submitted without a pending challenge (state: {:?})",
                    state
                )));
            }
        };

        let result = self
            .exchange
            .verify(code, &challenge_token, &self.bearer_token)
            .map_err(|err| self.fail(err))?;

        match Self::classify(result).map_err(|err| self.fail(err))? {
            outcome @ LoginOutcome::Authenticated { .. } => {
                self.apply(&outcome);
                Ok(outcome)
            }
            LoginOutcome::OtpRequired { .. } => Err(self.fail(SyncError::Auth(
                "provider requested another OTP challenge after verify".to_string(),
            ))),
        }
    }

    /// Map một `LoginResult` về outcome tương ứng.
    fn classify(result: LoginResult) -> SyncResult<LoginOutcome> {
        if result.auth_status == STATUS_OTP_REQUIRED {
            debug!("login challenged, OTP required");
            return Ok(LoginOutcome::OtpRequired {
                challenge_token: result.token,
            });
        }

        if result.token.is_empty() {
            return Err(SyncError::Auth(
                "login response carried neither a session token nor an OTP challenge".to_string(),
            ));
        }

        debug!("login authenticated without OTP");
        Ok(LoginOutcome::Authenticated {
            user_token: result.user_token,
            session_token: result.token,
        })
    }

    fn apply(&mut self, outcome: &LoginOutcome) {
        self.state = match outcome {
            LoginOutcome::OtpRequired { challenge_token } => AuthState::OtpRequired {
                challenge_token: challenge_token.clone(),
            },
            LoginOutcome::Authenticated {
                user_token,
                session_token,
            } => AuthState::Authenticated {
                user_token: user_token.clone(),
                session_token: session_token.clone(),
            },
        };
    }

    /// Chuyển sang `Failed` và wrap error thành `Auth` (fatal cho cả run).
    fn fail(&mut self, err: SyncError) -> SyncError {
        self.state = AuthState::Failed;
        match err {
            err @ SyncError::Auth(_) => err,
            other => SyncError::Auth(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Exchange giả: trả sẵn kết quả theo kịch bản, ghi lại arguments.
    struct FakeExchange {
        login_result: SyncResult<LoginResult>,
        verify_result: SyncResult<LoginResult>,
        verify_calls: RefCell<Vec<(String, String)>>,
    }

    impl FakeExchange {
        fn new(login_result: SyncResult<LoginResult>) -> Self {
            Self {
                login_result,
                verify_result: Err(SyncError::Auth("verify not expected".into())),
                verify_calls: RefCell::new(Vec::new()),
            }
        }

        fn with_verify(mut self, verify_result: SyncResult<LoginResult>) -> Self {
            self.verify_result = verify_result;
            self
        }
    }

    impl AuthExchange for FakeExchange {
        fn login(&self, _login_token: &str, _bearer_token: &str) -> SyncResult<LoginResult> {
            clone_result(&self.login_result)
        }

        fn verify(
            &self,
            otp: &str,
            challenge_token: &str,
            _bearer_token: &str,
        ) -> SyncResult<LoginResult> {
            self.verify_calls
                .borrow_mut()
                .push((otp.to_string(), challenge_token.to_string()));
            clone_result(&self.verify_result)
        }
    }

    fn clone_result(result: &SyncResult<LoginResult>) -> SyncResult<LoginResult> {
        match result {
            Ok(value) => Ok(value.clone()),
            Err(err) => Err(SyncError::Auth(err.to_string())),
        }
    }

    fn otp_challenge(token: &str) -> LoginResult {
        LoginResult {
            auth_status: "OTP_REQUIRED".into(),
            token: token.into(),
            user_token: String::new(),
        }
    }

    fn authenticated(session: &str, user: &str) -> LoginResult {
        LoginResult {
            auth_status: "SUCCESS".into(),
            token: session.into(),
            user_token: user.into(),
        }
    }

    #[test]
    fn test_login_without_otp_goes_straight_to_authenticated() {
        let exchange = FakeExchange::new(Ok(authenticated("session-1", "user-1")));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        let outcome = session.submit_login().unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                user_token: "user-1".into(),
                session_token: "session-1".into(),
            }
        );
        assert!(matches!(session.state(), AuthState::Authenticated { .. }));
    }

    #[test]
    fn test_login_with_otp_challenge_then_resume() {
        let exchange = FakeExchange::new(Ok(otp_challenge("challenge-1")))
            .with_verify(Ok(authenticated("session-2", "user-2")));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        let outcome = session.submit_login().unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::OtpRequired {
                challenge_token: "challenge-1".into(),
            }
        );

        let outcome = session.submit_otp("123456").unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                user_token: "user-2".into(),
                session_token: "session-2".into(),
            }
        );

        // verify phải nhận đúng challenge token từ bước login
        let calls = exchange.verify_calls.borrow();
        assert_eq!(calls.as_slice(), &[("123456".into(), "challenge-1".into())]);
    }

    #[test]
    fn test_unknown_auth_status_counts_as_authenticated() {
        // Chỉ "OTP_REQUIRED" mới trigger challenge; giá trị lạ với token
        // đầy đủ vẫn authenticated luôn, không prompt gì
        let mut result = authenticated("session-3", "user-3");
        result.auth_status = "SOMETHING_NEW".into();

        let exchange = FakeExchange::new(Ok(result));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        assert!(matches!(
            session.submit_login().unwrap(),
            LoginOutcome::Authenticated { .. }
        ));
    }

    #[test]
    fn test_login_transport_error_is_terminal_auth_error() {
        let exchange = FakeExchange::new(Err(SyncError::Transport("connection refused".into())));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        let err = session.submit_login().unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
        assert_eq!(session.state(), &AuthState::Failed);

        // Failed là terminal: submit lại không được phép
        assert!(session.submit_login().is_err());
    }

    #[test]
    fn test_empty_token_without_challenge_is_error() {
        let exchange = FakeExchange::new(Ok(LoginResult::default()));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        assert!(session.submit_login().is_err());
        assert_eq!(session.state(), &AuthState::Failed);
    }

    #[test]
    fn test_second_otp_challenge_after_verify_is_error() {
        let exchange = FakeExchange::new(Ok(otp_challenge("challenge-1")))
            .with_verify(Ok(otp_challenge("challenge-2")));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        session.submit_login().unwrap();
        let err = session.submit_otp("123456").unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
        assert_eq!(session.state(), &AuthState::Failed);
    }

    #[test]
    fn test_otp_without_pending_challenge_is_rejected() {
        let exchange = FakeExchange::new(Ok(authenticated("session-1", "user-1")));
        let mut session = AuthSession::new(&exchange, "login-token", "bearer-token");

        assert!(session.submit_otp("123456").is_err());
    }
}
