mod cookie_store;
mod dispatch;
mod exchange;
mod extractor;
mod locks;
mod login;
mod oauth;
mod session_store;
mod token_store;
mod transport;

pub use cookie_store::{CookieJarStore, PersistentJar};
pub use dispatch::{dispatch, CommandOutcome};
pub use exchange::exchange_api_token;
pub use extractor::{
    classify_mfa, extract_auth_code, extract_auth_state, extract_masked_phone, AuthState,
};
pub use locks::LoginLocks;
pub use login::LoginFlow;
pub use oauth::OAuthClient;
pub use session_store::SessionStore;
pub use token_store::TokenStore;
pub use transport::Transport;

/// Content-addressed file name for per-identity state. Hashing keeps
/// arbitrary identity strings out of the filesystem namespace.
pub(crate) fn identity_file_name(identity: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(identity.as_bytes());
    format!("{}.json", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::identity_file_name;

    #[test]
    fn identity_file_names_are_stable_and_distinct() {
        let a = identity_file_name("driver@example.com");
        let b = identity_file_name("driver@example.com");
        let c = identity_file_name("other@example.com");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(".json"));
        // hex sha256 plus extension
        assert_eq!(a.len(), 64 + 5);
    }
}
