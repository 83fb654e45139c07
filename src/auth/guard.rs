use super::{Role, Session};

/// Why a guard check refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Unauthenticated,
    WrongRole { expected: Role, actual: Role },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Reject(RejectReason),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// The single role check shared by page and API guards.
///
/// Rejects when there is no session or when the session role differs from
/// `expected`. No role satisfies another; ADMIN does not stand in for PARENT.
pub fn require_role(session: Option<&Session>, expected: Role) -> Access {
    match session {
        None => Access::Reject(RejectReason::Unauthenticated),
        Some(session) if session.role == expected => Access::Allow,
        Some(session) => Access::Reject(RejectReason::WrongRole {
            expected,
            actual: session.role,
        }),
    }
}

/// Allow any authenticated session regardless of role
pub fn require_session(session: Option<&Session>) -> Access {
    match session {
        Some(_) => Access::Allow,
        None => Access::Reject(RejectReason::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            name: "User One".to_string(),
            role,
        }
    }

    #[test]
    fn missing_session_is_unauthenticated() {
        for expected in Role::ALL {
            assert_eq!(
                require_role(None, expected),
                Access::Reject(RejectReason::Unauthenticated)
            );
        }
    }

    #[test]
    fn only_exact_role_is_allowed() {
        for expected in Role::ALL {
            for actual in Role::ALL {
                let access = require_role(Some(&session(actual)), expected);
                if actual == expected {
                    assert_eq!(access, Access::Allow);
                } else {
                    assert_eq!(
                        access,
                        Access::Reject(RejectReason::WrongRole { expected, actual })
                    );
                }
            }
        }
    }

    #[test]
    fn decision_is_repeatable() {
        let s = session(Role::Teacher);
        let first = require_role(Some(&s), Role::Parent);
        let second = require_role(Some(&s), Role::Parent);
        assert_eq!(first, second);
    }

    #[test]
    fn any_session_passes_session_check() {
        assert!(require_session(Some(&session(Role::Admin))).is_allowed());
        assert!(!require_session(None).is_allowed());
    }
}
