use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");

        let mut original_config = Config {
            base_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        original_config.documents.folder = PathBuf::from("/data/docs");
        original_config.chunking.chunk_size = 300;
        original_config.chunking.overlap = 30;
        original_config.completion.model = "gpt-4o-mini".to_string();

        original_config.save().expect("should save config");
        assert!(temp_dir.path().join("config.toml").exists());

        let loaded_config = Config::load(temp_dir.path()).expect("should load saved config");
        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn save_refuses_invalid_config() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let mut config = Config {
            base_dir: temp_dir.path().join("nested"),
            ..Config::default()
        };
        config.chunking.overlap = config.chunking.chunk_size;

        assert!(config.save().is_err());
        assert!(!temp_dir.path().join("nested").exists());
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let invalid_toml = r#"
            [ollama]
            port = "not-a-port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_parse_errors() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(temp_dir.path().join("config.toml"), "[server\nport = 1")
            .expect("should write config");

        let err = Config::load(temp_dir.path()).expect_err("parse should fail");
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let config = Config {
                ollama: OllamaConfig {
                    protocol: protocol.to_string(),
                    host: host.to_string(),
                    port,
                    ..OllamaConfig::default()
                },
                ..Config::default()
            };

            let url = config.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::MissingApiKey(API_KEY_VAR),
            ConfigError::OverlapTooLarge {
                chunk_size: 2,
                overlap: 2,
            },
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(!message.is_empty());
            assert!(message.len() > 10);
        }
    }
}
