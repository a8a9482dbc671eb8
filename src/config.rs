use std::env;

const DEFAULT_SALES_EMAIL: &str = "sales@reportgen.io";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub google_client_id: String,
    pub razorpay_key_id: String,
    pub sales_email: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Load .env file

        let api_base_url = env::var("API_BASE_URL").expect("API_BASE_URL must be set");

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set");

        let razorpay_key_id =
            env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID must be set");

        let sales_email =
            env::var("SALES_EMAIL").unwrap_or_else(|_| DEFAULT_SALES_EMAIL.to_string());

        Config {
            api_base_url,
            google_client_id,
            razorpay_key_id,
            sales_email,
        }
    }

    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Config {
            api_base_url: api_base_url.into(),
            google_client_id: String::new(),
            razorpay_key_id: "rzp_test_key".to_string(),
            sales_email: DEFAULT_SALES_EMAIL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn restore_env(vars: Vec<(&'static str, Option<String>)>) {
        for (key, value) in vars {
            if let Some(val) = value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn from_env_reads_all_settings() {
        let keys = ["API_BASE_URL", "GOOGLE_CLIENT_ID", "RAZORPAY_KEY_ID", "SALES_EMAIL"];
        let _guard = ENV_MUTEX.lock().unwrap();
        let snapshot: Vec<_> = keys.iter().map(|key| (*key, env::var(key).ok())).collect();

        env::set_var("API_BASE_URL", "https://api.example.test");
        env::set_var("GOOGLE_CLIENT_ID", "gid-123");
        env::set_var("RAZORPAY_KEY_ID", "rzp_live_abc");
        env::remove_var("SALES_EMAIL");

        let config = Config::from_env();

        restore_env(snapshot);

        assert_eq!(config.api_base_url, "https://api.example.test");
        assert_eq!(config.google_client_id, "gid-123");
        assert_eq!(config.razorpay_key_id, "rzp_live_abc");
        // missing SALES_EMAIL falls back to the default
        assert_eq!(config.sales_email, DEFAULT_SALES_EMAIL);
    }
}
