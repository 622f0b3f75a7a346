//! Push URL handling.

use url::Url;

use tutorbook_core::PipelineConfig;

pub use tutorbook_core::git::redact;

/// Inject `token` as user-info into an http(s) remote URL.
///
/// Other remotes (`git@host:path`, local paths, remote names) are returned
/// verbatim.
pub fn authenticated_url(remote: &str, token: Option<&str>) -> String {
    let Some(token) = token else {
        return remote.to_string();
    };
    match Url::parse(remote) {
        Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
            if url.set_username(token).is_err() {
                return remote.to_string();
            }
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => remote.to_string(),
    }
}

/// Where the publication branch is pushed.
pub fn push_target(config: &PipelineConfig) -> String {
    let remote = config.remote_url.as_deref().unwrap_or(&config.remote);
    authenticated_url(remote, config.token.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_injected_into_https() {
        assert_eq!(
            authenticated_url("https://github.com/org/tutorials.git", Some("s3cr3t")),
            "https://s3cr3t@github.com/org/tutorials.git"
        );
    }

    #[test]
    fn test_other_remotes_verbatim() {
        assert_eq!(authenticated_url("origin", Some("s3cr3t")), "origin");
        assert_eq!(
            authenticated_url("git@github.com:org/tutorials.git", Some("s3cr3t")),
            "git@github.com:org/tutorials.git"
        );
        assert_eq!(
            authenticated_url("https://github.com/org/tutorials.git", None),
            "https://github.com/org/tutorials.git"
        );
    }

    #[test]
    fn test_push_target() {
        let mut config = PipelineConfig::new("/repo");
        assert_eq!(push_target(&config), "origin");

        config.remote_url = Some("https://github.com/org/tutorials.git".to_string());
        config.token = Some("tok".to_string());
        assert_eq!(push_target(&config), "https://tok@github.com/org/tutorials.git");
    }
}
