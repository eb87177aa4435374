use crate::error::ClaimError;
use async_trait::async_trait;
use chrono::Utc;
use motive_shared::StoreError;
use rand::Rng;

const RANDOM_SEGMENT_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Lookup over every code ever issued. Backed by the redemption store's
/// unique-code constraint.
#[async_trait]
pub trait CodeDirectory: Send + Sync {
    async fn code_exists(&self, code: &str) -> Result<bool, StoreError>;
}

/// Issues redemption codes of the form `<prefix>-<time>-<random>`.
///
/// The time segment is the last six digits of the claim's unix
/// milliseconds; the random segment is regenerated on collision, bounded
/// by `max_attempts` so a pathological directory can never loop forever.
pub struct CodeGenerator {
    prefix: String,
    max_attempts: u32,
}

impl CodeGenerator {
    pub fn new(prefix: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            prefix: prefix.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Generate a code proven unique against the directory.
    pub async fn generate<D>(&self, directory: &D) -> Result<String, ClaimError>
    where
        D: CodeDirectory + ?Sized,
    {
        let time_segment = Self::time_segment();

        for _ in 0..self.max_attempts {
            let code = format!("{}-{}-{}", self.prefix, time_segment, random_segment());
            let taken = directory
                .code_exists(&code)
                .await
                .map_err(ClaimError::Store)?;
            if !taken {
                return Ok(code);
            }
            tracing::debug!(code, "code collision, regenerating random segment");
        }

        Err(ClaimError::CodeGenerationFailed(self.max_attempts))
    }

    fn time_segment() -> String {
        let millis = Utc::now().timestamp_millis();
        format!("{:06}", millis.rem_euclid(1_000_000))
    }

    /// Whether a string matches this generator's code shape. Useful for
    /// pre-validating operator input before hitting the store.
    pub fn matches_format(&self, code: &str) -> bool {
        let mut parts = code.splitn(3, '-');
        let (Some(prefix), Some(time), Some(random)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        prefix == self.prefix
            && time.len() == 6
            && time.bytes().all(|b| b.is_ascii_digit())
            && random.len() == RANDOM_SEGMENT_LEN
            && random.bytes().all(|b| ALPHABET.contains(&b))
    }
}

fn random_segment() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_SEGMENT_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
