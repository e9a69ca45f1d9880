//! Server configuration from the environment

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use std::env;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Where a blob store lives
#[derive(Debug, Clone, PartialEq)]
pub enum FilesBackend {
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        key_prefix: String,
        public_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub credentials: Option<(String, String)>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    /// `None` allows any origin
    pub frontend_origins: Option<Vec<String>>,
    pub public_base_url: String,
    /// Post attachments, publicly served
    pub files: FilesBackend,
    /// ID document scans, readable by moderators only
    pub id_documents: FilesBackend,
    pub smtp: Option<SmtpSettings>,
    pub max_upload_bytes: usize,
    pub auth: AuthConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 5)?;
        let listen_addr = parsed("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;

        let frontend_origins = match env::var("FRONTEND_ORIGINS") {
            Ok(origins) if origins.trim() == "*" => None,
            Ok(origins) => Some(
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            ),
            Err(_) => Some(vec![
                "http://localhost:40922".to_string(),
                "http://127.0.0.1:40922".to_string(),
            ]),
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:31113".to_string())
            .trim_end_matches('/')
            .to_string();

        let files = post_files_backend()?;
        let id_documents = id_documents_backend(&files, &public_base_url);
        ensure_separate(&files, &id_documents)?;

        let smtp = env::var("SMTP_HOST").ok().map(|host| SmtpSettings {
            host,
            credentials: env::var("SMTP_USERNAME")
                .ok()
                .zip(env::var("SMTP_PASSWORD").ok()),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@localhost".to_string()),
        });

        let max_upload_bytes = parsed("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?;

        Ok(Self {
            database_url,
            database_max_connections,
            listen_addr,
            frontend_origins,
            public_base_url,
            files,
            id_documents,
            smtp,
            max_upload_bytes,
            auth: auth_config()?,
        })
    }
}

fn post_files_backend() -> anyhow::Result<FilesBackend> {
    Ok(match env::var("POST_FILES_BACKEND").as_deref() {
        Ok("s3") => FilesBackend::S3 {
            bucket: env::var("POST_FILES_BUCKET")
                .context("POST_FILES_BUCKET must be set for the s3 backend")?,
            key_prefix: env::var("POST_FILES_KEY_PREFIX")
                .unwrap_or_else(|_| "post-files/".to_string()),
            public_url: env::var("POST_FILES_PUBLIC_URL").ok(),
        },
        Ok("local") | Err(_) => FilesBackend::Local {
            path: env::var("POST_FILES_PATH")
                .unwrap_or_else(|_| "./post-files".to_string())
                .into(),
        },
        Ok(other) => bail!("POST_FILES_BACKEND must be `local` or `s3`, got `{other}`"),
    })
}

/// Same kind of backend as post files, under its own directory or prefix.
///
/// Upload URLs point at `/users/id-documents/{key}`, the moderator-only route.
fn id_documents_backend(files: &FilesBackend, public_base_url: &str) -> FilesBackend {
    match files {
        FilesBackend::S3 { bucket, .. } => FilesBackend::S3 {
            bucket: env::var("ID_DOCUMENTS_BUCKET").unwrap_or_else(|_| bucket.clone()),
            key_prefix: ID_DOCUMENTS_KEY_PREFIX.to_string(),
            public_url: Some(format!("{public_base_url}/users")),
        },
        FilesBackend::Local { .. } => FilesBackend::Local {
            path: env::var("ID_DOCUMENTS_PATH")
                .unwrap_or_else(|_| "./id-documents".to_string())
                .into(),
        },
    }
}

/// S3 key prefix of ID documents, also the route segment serving them
const ID_DOCUMENTS_KEY_PREFIX: &str = "id-documents/";

fn ensure_separate(files: &FilesBackend, id_documents: &FilesBackend) -> anyhow::Result<()> {
    let shared = match (files, id_documents) {
        (FilesBackend::Local { path: a }, FilesBackend::Local { path: b }) => {
            normalized(a).eq(normalized(b))
        }
        (
            FilesBackend::S3 {
                bucket: a,
                key_prefix: prefix_a,
                ..
            },
            FilesBackend::S3 {
                bucket: b,
                key_prefix: prefix_b,
                ..
            },
        ) => {
            a == b
                && (prefix_a.starts_with(prefix_b.as_str())
                    || prefix_b.starts_with(prefix_a.as_str()))
        }
        _ => false,
    };

    if shared {
        bail!("ID documents must not share storage with the publicly served post files");
    }
    Ok(())
}

fn normalized(path: &Path) -> impl Iterator<Item = Component<'_>> {
    path.components().filter(|c| !matches!(c, Component::CurDir))
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let base = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    let token_secret = match env::var("TOKEN_SECRET") {
        Ok(secret_b64) => {
            let bytes = general_purpose::STANDARD
                .decode(secret_b64.trim())
                .context("TOKEN_SECRET must be base64")?;
            <[u8; 32]>::try_from(bytes.as_slice())
                .map_err(|_| anyhow::anyhow!("TOKEN_SECRET must decode to 32 bytes"))?
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("TOKEN_SECRET not set, tokens will not survive a restart");
            base.token_secret
        }
        Err(_) => bail!("TOKEN_SECRET must be set in production"),
    };

    let token_ttl = match env::var("TOKEN_TTL_HOURS") {
        Ok(hours) => {
            let hours: u64 = hours.parse().context("TOKEN_TTL_HOURS must be a number")?;
            Duration::from_secs(hours * 3600)
        }
        Err(_) => AuthConfig::default().token_ttl,
    };

    Ok(AuthConfig {
        token_secret,
        token_ttl,
        password_pepper: env::var("PASSWORD_PEPPER").ok().map(String::into_bytes),
        profile_pic_dir: env::var("PROFILE_PIC_PATH")
            .unwrap_or_else(|_| "./profile-pics".to_string())
            .into(),
    })
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} is not valid")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_to_default() {
        let value: u32 = parsed("CIVIC_API_TEST_NEVER_SET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_id_documents_get_their_own_directory() {
        let files = FilesBackend::Local {
            path: "./post-files".into(),
        };
        if env::var("ID_DOCUMENTS_PATH").is_err() {
            let id_documents = id_documents_backend(&files, "http://localhost:31113");
            assert_eq!(
                id_documents,
                FilesBackend::Local {
                    path: "./id-documents".into()
                }
            );
            assert!(ensure_separate(&files, &id_documents).is_ok());
        }

        let same = FilesBackend::Local {
            path: "post-files/".into(),
        };
        assert!(ensure_separate(&files, &same).is_err());
    }

    #[test]
    fn test_id_documents_s3_prefix_is_private_route() {
        let files = FilesBackend::S3 {
            bucket: "civic-reports".to_string(),
            key_prefix: "post-files/".to_string(),
            public_url: None,
        };
        if env::var("ID_DOCUMENTS_BUCKET").is_err() {
            let id_documents = id_documents_backend(&files, "https://api.example.org");
            assert_eq!(
                id_documents,
                FilesBackend::S3 {
                    bucket: "civic-reports".to_string(),
                    key_prefix: "id-documents/".to_string(),
                    public_url: Some("https://api.example.org/users".to_string()),
                }
            );
            assert!(ensure_separate(&files, &id_documents).is_ok());
        }

        let unprefixed = FilesBackend::S3 {
            bucket: "civic-reports".to_string(),
            key_prefix: String::new(),
            public_url: None,
        };
        let id_documents = FilesBackend::S3 {
            bucket: "civic-reports".to_string(),
            key_prefix: "id-documents/".to_string(),
            public_url: None,
        };
        assert!(ensure_separate(&unprefixed, &id_documents).is_err());
    }

    #[test]
    fn test_debug_auth_config_has_secret() {
        if cfg!(debug_assertions) && env::var("TOKEN_SECRET").is_err() {
            let config = auth_config().unwrap();
            assert_ne!(config.token_secret, [0u8; 32]);
        }
    }
}
