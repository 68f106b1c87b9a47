use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
    pub llm: LLMConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub accepted_mime_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    pub affirmative_tokens: Vec<String>,
}

const DEFAULT_EXTENSIONS: &str = ".xlsx,.xls";
const DEFAULT_MIME_PREFIXES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet,application/vnd.ms-excel";
const DEFAULT_AFFIRMATIVES: &str = "yes,yep,yeah,okay,correct,confirm,looks good,looks right";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            upload: UploadConfig {
                max_files: env::var("MAX_UPLOAD_FILES")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                max_file_size: env::var("MAX_FILE_SIZE_MB")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse::<u64>()?
                    * 1024
                    * 1024,
                allowed_extensions: env::var("UPLOAD_EXTENSIONS")
                    .unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string())
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .collect(),
                accepted_mime_prefixes: env::var("ACCEPTED_MIME_PREFIXES")
                    .unwrap_or_else(|_| DEFAULT_MIME_PREFIXES.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data")),
            },
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: env::var("ANALYZER_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            },
            conversation: ConversationConfig {
                affirmative_tokens: env::var("AFFIRMATIVE_TOKENS")
                    .unwrap_or_else(|_| DEFAULT_AFFIRMATIVES.to_string())
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .collect(),
            },
        })
    }
}
