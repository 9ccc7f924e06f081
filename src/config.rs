use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    #[serde(default)]
    pub provider: ProviderConfiguration,
    #[serde(default)]
    pub vehicle_api: VehicleApiConfiguration,
    #[serde(default)]
    pub storage: StorageConfiguration,
    #[serde(default)]
    pub dispatch: DispatchConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfiguration {
    pub host: String,
    pub port: u16,

    /// When set, every route except /health requires this bearer token.
    pub api_token: Option<String>,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_token: None,
        }
    }
}

/// B2C identity-provider endpoints. The defaults target the production
/// tenant; tests point `base_url` at a local mock.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfiguration {
    pub base_url: String,
    pub policy: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub user_agent: String,
}

impl Default for ProviderConfiguration {
    fn default() -> Self {
        Self {
            base_url: "https://custlogin.gm.com/gmb2cprod.onmicrosoft.com".to_string(),
            policy: "B2C_1A_SEAMLESS_MOBILE_SignUpOrSignIn".to_string(),
            client_id: "3ff30506-d242-4bed-835b-422bf992622e".to_string(),
            redirect_uri: "msauth.com.gm.myChevrolet://auth".to_string(),
            scope: "https://gmb2cprod.onmicrosoft.com/3ff30506-d242-4bed-835b-422bf992622e/Test.Read openid profile offline_access".to_string(),
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_7_10 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148".to_string(),
        }
    }
}

impl ProviderConfiguration {
    fn policy_base(&self) -> String {
        format!("{}/{}", self.base_url, self.policy)
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.policy_base())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.policy_base())
    }

    /// Credential submission and MFA confirmation both post here.
    pub fn credentials_url(&self, trans_id: &str) -> String {
        format!(
            "{}/SelfAsserted?tx={}&p={}",
            self.policy_base(),
            trans_id,
            self.policy
        )
    }

    /// Page that presents the MFA challenge after credentials are accepted.
    pub fn mfa_page_url(&self, csrf_token: &str, trans_id: &str) -> String {
        format!(
            "{}/api/CombinedSigninAndSignup/confirmed?rememberMe=true&csrf_token={}&tx={}&p={}",
            self.policy_base(),
            csrf_token,
            trans_id,
            self.policy
        )
    }

    pub fn send_code_url(&self, control: &str, trans_id: &str) -> String {
        format!(
            "{}/SelfAsserted/DisplayControlAction/vbeta/{}/SendCode?tx={}&p={}",
            self.policy_base(),
            control,
            trans_id,
            self.policy
        )
    }

    pub fn verify_code_url(&self, control: &str, trans_id: &str) -> String {
        format!(
            "{}/SelfAsserted/DisplayControlAction/vbeta/{}/VerifyCode?tx={}&p={}",
            self.policy_base(),
            control,
            trans_id,
            self.policy
        )
    }

    /// Confirmation endpoint; answers with a 302 carrying the authorization code.
    pub fn confirm_url(&self, csrf_token: &str, trans_id: &str) -> String {
        format!(
            "{}/api/SelfAsserted/confirmed?csrf_token={}&tx={}&p={}",
            self.policy_base(),
            csrf_token,
            trans_id,
            self.policy
        )
    }

    /// Scheme + host of the provider, sent as the Origin header on form posts.
    pub fn origin(&self) -> String {
        match Url::parse(&self.base_url) {
            Ok(url) => match url.host_str() {
                Some(host) => format!("{}://{}", url.scheme(), host),
                None => self.base_url.clone(),
            },
            Err(_) => self.base_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VehicleApiConfiguration {
    pub base_url: String,

    /// Scope string sent with the second-stage token exchange.
    pub token_scope: String,
}

impl Default for VehicleApiConfiguration {
    fn default() -> Self {
        Self {
            base_url: "https://na-mobile-api.gm.com".to_string(),
            token_scope: "msso role_owner priv onstar gmoc user user_trailer".to_string(),
        }
    }
}

impl VehicleApiConfiguration {
    pub fn token_url(&self) -> String {
        format!("{}/sec/authz/v3/oauth/token", self.base_url)
    }

    pub fn vehicles_url(&self) -> String {
        format!("{}/api/v1/account/vehicles", self.base_url)
    }

    pub fn command_url(&self, vin: &str, path: &str) -> String {
        format!("{}/api/v1/account/vehicles/{}/{}", self.base_url, vin, path)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfiguration {
    pub data_dir: PathBuf,
}

impl Default for StorageConfiguration {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StorageConfiguration {
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn tokens_dir(&self) -> PathBuf {
        self.data_dir.join("tokens")
    }

    pub fn cookies_dir(&self) -> PathBuf {
        self.data_dir.join("cookies")
    }
}

/// Poll policy for asynchronous vehicle commands. Fixed backoff, no jitter;
/// the remote is a single slow backend.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DispatchConfiguration {
    pub max_attempts: u32,
    pub poll_interval_seconds: u64,
}

impl Default for DispatchConfiguration {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            poll_interval_seconds: 10,
        }
    }
}

impl Configuration {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder = builder.add_source(config::Environment::with_prefix("TELEGATE").separator("__"));

        builder.build()?.try_deserialize()
    }
}
