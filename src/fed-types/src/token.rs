//! Short-lived bearer credential obtained from the identity provider.

use std::time::{Duration, SystemTime};

/// A validated or freshly issued bearer token.
#[derive(Clone, Debug)]
pub struct BearerToken {
    pub raw: String,
    pub expires_at: SystemTime,
    pub audience: String,
    /// `azp` / `client_id` claim.
    pub subject: String,
}

impl BearerToken {
    /// True when remaining validity is at or below `refresh_buffer`
    /// (`spec.md §4.2`).
    pub fn should_refresh(&self, now: SystemTime, refresh_buffer: Duration) -> bool {
        match self.expires_at.duration_since(now) {
            Ok(remaining) => remaining <= refresh_buffer,
            Err(_) => true, // already expired
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(ttl: Duration) -> BearerToken {
        BearerToken {
            raw: "x".into(),
            expires_at: SystemTime::now() + ttl,
            audience: "federator".into(),
            subject: "idp-1".into(),
        }
    }

    #[test]
    fn refreshes_inside_buffer() {
        let t = token(Duration::from_secs(10));
        assert!(t.should_refresh(SystemTime::now(), Duration::from_secs(30)));
        assert!(!t.should_refresh(SystemTime::now(), Duration::from_secs(1)));
    }

    #[test]
    fn already_expired_always_needs_refresh() {
        let t = token(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.should_refresh(SystemTime::now(), Duration::from_secs(0)));
    }
}
