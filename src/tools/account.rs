//! Account MCP Tools
//!
//! Register, log in and out, and report who is signed in.

use serde::Serialize;

use crate::db::Database;
use crate::models::User;
use crate::session::{Authenticated, Session};

/// Response for register, login and whoami
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub token: Option<String>,
    pub user: Option<User>,
}

impl From<Option<&Authenticated>> for SessionResponse {
    fn from(auth: Option<&Authenticated>) -> Self {
        match auth {
            Some(auth) => Self {
                authenticated: true,
                token: Some(auth.token.clone()),
                user: Some(auth.user.clone()),
            },
            None => Self {
                authenticated: false,
                token: None,
                user: None,
            },
        }
    }
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub was_logged_in: bool,
}

/// Register a new user and sign them in
pub fn register(
    db: &Database,
    session: &mut Session,
    name: &str,
    email: &str,
) -> Result<SessionResponse, String> {
    let auth = session.register(db, name, email).map_err(|e| e.to_string())?;
    Ok(SessionResponse::from(Some(auth)))
}

/// Sign in an existing user by e-mail
pub fn login(db: &Database, session: &mut Session, email: &str) -> Result<SessionResponse, String> {
    let auth = session.login(db, email).map_err(|e| e.to_string())?;
    Ok(SessionResponse::from(Some(auth)))
}

/// Sign out and clear the persisted session
pub fn logout(db: &Database, session: &mut Session) -> Result<LogoutResponse, String> {
    let was_logged_in = session.logout(db).map_err(|e| e.to_string())?;
    Ok(LogoutResponse {
        success: true,
        was_logged_in,
    })
}

pub fn whoami(session: &Session) -> SessionResponse {
    SessionResponse::from(session.current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_whoami() {
        let (_dir, db, _) = crate::tools::test_database();
        let mut session = Session::default();

        let registered = register(&db, &mut session, "Second", "second@example.com").unwrap();
        assert!(registered.authenticated);
        assert!(registered.token.is_some());

        let me = whoami(&session);
        assert_eq!(me.user.map(|u| u.email), Some("second@example.com".to_string()));
    }

    #[test]
    fn test_login_unknown_email_is_error() {
        let (_dir, db, _) = crate::tools::test_database();
        let mut session = Session::default();
        let err = login(&db, &mut session, "nobody@example.com").unwrap_err();
        assert!(err.contains("nobody@example.com"));
        assert!(!whoami(&session).authenticated);
    }

    #[test]
    fn test_logout_reports_previous_state() {
        let (_dir, db, _) = crate::tools::test_database();
        let mut session = Session::default();
        login(&db, &mut session, "owner@example.com").unwrap();

        assert!(logout(&db, &mut session).unwrap().was_logged_in);
        assert!(!logout(&db, &mut session).unwrap().was_logged_in);
    }
}
