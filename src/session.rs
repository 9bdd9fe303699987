//! Session store
//!
//! Holds the signed-in user and their bearer token. The session is an
//! explicit object owned by the service: `init` restores and verifies the
//! persisted token, `logout` tears it down. Credential checks are out of
//! scope; users are identified by e-mail.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{Database, DbError};
use crate::models::{SessionToken, StoredSession, User};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Use register or login first.")]
    NotLoggedIn,

    #[error("No user registered with e-mail: {0}")]
    UnknownUser(String),

    #[error("A user with e-mail {0} is already registered")]
    DuplicateEmail(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] DbError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A signed-in user and the token issued to them
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub token: String,
    pub user: User,
}

/// Current authentication state
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Authenticated>,
}

impl Session {
    /// Restore the persisted session, keeping it only if its token still
    /// resolves to a user. An invalid token clears the persisted state.
    pub fn init(db: &Database) -> SessionResult<Self> {
        let conn = db.get_conn()?;

        let Some(stored) = StoredSession::load(&conn)? else {
            debug!("no stored session");
            return Ok(Self::default());
        };

        match SessionToken::verify(&conn, &stored.token)? {
            Some(user) => {
                info!(user_id = user.id, "restored session");
                // Refresh the snapshot in case the user row changed
                StoredSession::save(&conn, &stored.token, &user)?;
                Ok(Self {
                    current: Some(Authenticated {
                        token: stored.token,
                        user,
                    }),
                })
            }
            None => {
                warn!("stored session token is no longer valid, clearing");
                StoredSession::clear(&conn)?;
                Ok(Self::default())
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Authenticated> {
        self.current.as_ref()
    }

    /// The signed-in user, or `NotLoggedIn`
    pub fn require_user(&self) -> SessionResult<&User> {
        self.current
            .as_ref()
            .map(|a| &a.user)
            .ok_or(SessionError::NotLoggedIn)
    }

    /// Create a user and sign them in
    pub fn register(&mut self, db: &Database, name: &str, email: &str) -> SessionResult<&Authenticated> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(SessionError::Invalid("Name cannot be empty".to_string()));
        }
        validate_email(email)?;

        let conn = db.get_conn()?;
        if User::get_by_email(&conn, email)?.is_some() {
            return Err(SessionError::DuplicateEmail(email.to_string()));
        }

        let user = User::create(&conn, name, email)?;
        info!(user_id = user.id, "registered user");
        drop(conn);

        self.start(db, user)
    }

    /// Sign in an existing user
    pub fn login(&mut self, db: &Database, email: &str) -> SessionResult<&Authenticated> {
        let email = email.trim();
        let conn = db.get_conn()?;
        let user = User::get_by_email(&conn, email)?
            .ok_or_else(|| SessionError::UnknownUser(email.to_string()))?;
        drop(conn);

        self.start(db, user)
    }

    /// Revoke the token and clear the persisted session
    pub fn logout(&mut self, db: &Database) -> SessionResult<bool> {
        let conn = db.get_conn()?;
        StoredSession::clear(&conn)?;

        match self.current.take() {
            Some(auth) => {
                SessionToken::revoke(&conn, &auth.token)?;
                info!(user_id = auth.user.id, "logged out");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn start(&mut self, db: &Database, user: User) -> SessionResult<&Authenticated> {
        let conn = db.get_conn()?;

        // Signing in replaces any previous session
        if let Some(previous) = self.current.take() {
            SessionToken::revoke(&conn, &previous.token)?;
        }

        let token = SessionToken::issue(&conn, user.id)?;
        StoredSession::save(&conn, &token, &user)?;
        info!(user_id = user.id, "session started");

        let auth = self.current.insert(Authenticated { token, user });
        Ok(&*auth)
    }
}

fn validate_email(email: &str) -> SessionResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SessionError::Invalid(format!("Invalid e-mail address: {}", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_migrated(dir.path().join("petmed.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_register_persists_and_init_restores() {
        let (_dir, db) = database();
        let mut session = Session::default();
        let token = session
            .register(&db, "Owner", "owner@example.com")
            .unwrap()
            .token
            .clone();

        let restored = Session::init(&db).unwrap();
        let current = restored.current().unwrap();
        assert_eq!(current.token, token);
        assert_eq!(current.user.email, "owner@example.com");
    }

    #[test]
    fn test_require_user_when_logged_out() {
        let session = Session::default();
        assert!(matches!(session.require_user(), Err(SessionError::NotLoggedIn)));
    }

    #[test]
    fn test_logout_tears_down() {
        let (_dir, db) = database();
        let mut session = Session::default();
        session.register(&db, "Owner", "owner@example.com").unwrap();

        assert!(session.logout(&db).unwrap());
        assert!(!session.is_authenticated());
        assert!(!Session::init(&db).unwrap().is_authenticated());
        assert!(!session.logout(&db).unwrap());
    }

    #[test]
    fn test_init_clears_revoked_token() {
        let (_dir, db) = database();
        let mut session = Session::default();
        let token = session
            .register(&db, "Owner", "owner@example.com")
            .unwrap()
            .token
            .clone();

        db.with_conn(|conn| SessionToken::revoke(conn, &token).map(|_| ()))
            .unwrap();

        assert!(!Session::init(&db).unwrap().is_authenticated());
        let stored = db.with_conn(StoredSession::load).unwrap();
        assert!(stored.is_none());
    }

    #[test]
    fn test_login_switches_user_and_revokes_old_token() {
        let (_dir, db) = database();
        let mut session = Session::default();
        let first = session
            .register(&db, "First", "first@example.com")
            .unwrap()
            .token
            .clone();
        session.register(&db, "Second", "second@example.com").unwrap();

        let auth = session.login(&db, "FIRST@example.com").unwrap();
        assert_eq!(auth.user.name, "First");
        assert_ne!(auth.token, first);

        let old = db.with_conn(|conn| SessionToken::verify(conn, &first)).unwrap();
        assert!(old.is_none());
    }

    #[test]
    fn test_register_validation() {
        let (_dir, db) = database();
        let mut session = Session::default();
        assert!(matches!(
            session.register(&db, " ", "a@example.com"),
            Err(SessionError::Invalid(_))
        ));
        assert!(matches!(
            session.register(&db, "A", "not-an-email"),
            Err(SessionError::Invalid(_))
        ));
        session.register(&db, "A", "a@example.com").unwrap();
        assert!(matches!(
            session.register(&db, "B", "a@example.com"),
            Err(SessionError::DuplicateEmail(_))
        ));
        assert!(matches!(
            session.login(&db, "nobody@example.com"),
            Err(SessionError::UnknownUser(_))
        ));
    }
}
