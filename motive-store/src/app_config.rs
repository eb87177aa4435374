use motive_redemption::{ExpiryPolicy, RedemptionPolicy};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    #[serde(default = "default_code_attempts")]
    pub code_max_attempts: u32,
    /// Claim lifetime in days when `expire_with_offer` is off.
    #[serde(default = "default_ttl_days")]
    pub redemption_ttl_days: i64,
    /// Tie claim expiry to the offer's valid_until instead of a TTL.
    #[serde(default)]
    pub expire_with_offer: bool,
    #[serde(default)]
    pub allow_repeat_claims: bool,
}

fn default_code_prefix() -> String {
    "SUB".to_string()
}
fn default_code_attempts() -> u32 {
    5
}
fn default_ttl_days() -> i64 {
    30
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            code_prefix: default_code_prefix(),
            code_max_attempts: default_code_attempts(),
            redemption_ttl_days: default_ttl_days(),
            expire_with_offer: false,
            allow_repeat_claims: false,
        }
    }
}

impl BusinessRules {
    /// The redemption policy these rules describe.
    pub fn redemption_policy(&self) -> RedemptionPolicy {
        RedemptionPolicy {
            expiry: if self.expire_with_offer {
                ExpiryPolicy::OfferValidUntil
            } else {
                ExpiryPolicy::FixedTtl {
                    days: self.redemption_ttl_days,
                }
            },
            allow_repeat_claims: self.allow_repeat_claims,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `MOTIVE__BUSINESS_RULES__REDEMPTION_TTL_DAYS=14`
            .add_source(config::Environment::with_prefix("MOTIVE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = BusinessRules::default();
        assert_eq!(rules.code_prefix, "SUB");
        assert_eq!(rules.code_max_attempts, 5);
        assert_eq!(
            rules.redemption_policy().expiry,
            ExpiryPolicy::FixedTtl { days: 30 }
        );
        assert!(!rules.redemption_policy().allow_repeat_claims);
    }

    #[test]
    fn test_expire_with_offer_maps_to_policy() {
        let rules = BusinessRules {
            expire_with_offer: true,
            ..Default::default()
        };
        assert_eq!(rules.redemption_policy().expiry, ExpiryPolicy::OfferValidUntil);
    }
}
