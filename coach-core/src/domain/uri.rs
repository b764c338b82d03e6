//! Identifying keys embedded in resource URIs
//!
//! List responses only describe children by URI, e.g.
//! `/CyberCoachServer/resources/partnerships/alice;bob/running/12/`.

use regex::Regex;

use super::result::{Error, Result};

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| Error::Decode(format!("invalid URI pattern: {}", e)))
}

/// Usernames of a partnership URI, in URI order
pub fn partnership_users(uri: &str) -> Result<(String, String)> {
    let re = pattern(r"partnerships/(\w+);(\w+)")?;
    let caps = re
        .captures(uri)
        .ok_or_else(|| Error::Decode(format!("no partnership in URI '{}'", uri)))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// Username of a user URI
pub fn username(uri: &str) -> Result<String> {
    let re = pattern(r"users/(\w+)")?;
    let caps = re
        .captures(uri)
        .ok_or_else(|| Error::Decode(format!("no user in URI '{}'", uri)))?;
    Ok(caps[1].to_string())
}

/// Last path segment of a subscription URI (the sport name)
pub fn last_segment(uri: &str) -> Result<String> {
    let re = pattern(r"/(\w+)/?\z")?;
    let caps = re
        .captures(uri)
        .ok_or_else(|| Error::Decode(format!("no trailing segment in URI '{}'", uri)))?;
    Ok(caps[1].to_string())
}

/// Numeric id at the end of an entry URI
pub fn entry_id(uri: &str) -> Result<u64> {
    let re = pattern(r"/(\d+)/?\z")?;
    let caps = re
        .captures(uri)
        .ok_or_else(|| Error::Decode(format!("no entry id in URI '{}'", uri)))?;
    caps[1]
        .parse()
        .map_err(|e| Error::Decode(format!("entry id out of range in '{}': {}", uri, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partnership_users() {
        let (user1, user2) =
            partnership_users("http://example.com/partnerships/user1;user2/").unwrap();
        assert_eq!(user1, "user1");
        assert_eq!(user2, "user2");
    }

    #[test]
    fn test_partnership_users_without_trailing_slash() {
        let (user1, user2) = partnership_users("partnerships/alice;bob").unwrap();
        assert_eq!((user1.as_str(), user2.as_str()), ("alice", "bob"));
    }

    #[test]
    fn test_partnership_users_rejects_other_uris() {
        assert!(matches!(
            partnership_users("/resources/users/alice/"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_username() {
        assert_eq!(username("/CyberCoachServer/resources/users/newuser4/").unwrap(), "newuser4");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("/resources/users/alice/running/").unwrap(), "running");
        assert_eq!(last_segment("/resources/partnerships/a;b/boxing").unwrap(), "boxing");
    }

    #[test]
    fn test_entry_id() {
        assert_eq!(entry_id("http://example.com/subscription/123/").unwrap(), 123);
        assert_eq!(entry_id("/users/alice/running/7").unwrap(), 7);
        assert!(entry_id("/users/alice/running/").is_err());
    }
}
