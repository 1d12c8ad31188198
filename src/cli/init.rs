//! `init` command: scaffolds a new Taskgate deployment directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    Success,
    /// `taskgate.toml` exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    pub host: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Taskgate");

    let base_path = &config.path;

    let config_path = base_path.join("taskgate.toml");
    if config_path.exists() && !config.force {
        output.warning("taskgate.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else if let Err(e) = fs::create_dir_all(&data_dir) {
        output.error(&format!("Failed to create data/: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created("directory", "data");
    }

    let files = [
        ("config", "taskgate.toml", generate_taskgate_toml(&config)),
        ("env", ".env.example", generate_env_example()),
    ];
    for (kind, name, content) in files {
        if let Err(e) = write_file(&base_path.join(name), &content, config.force) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created(kind, name);
    }

    // Never overwrite an existing .gitignore, even with --force.
    let gitignore_path = base_path.join(".gitignore");
    if gitignore_path.exists() {
        output.skipped(".gitignore", "already exists");
    } else if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
        output.warning(&format!("Failed to create .gitignore: {}", e));
    } else {
        output.created("file", ".gitignore");
    }

    output.success("Taskgate project initialized");

    output.header("Next Steps");
    output.info("1. Set the signing secret:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set JWT_SECRET");
    output.info("2. Create an administrator:");
    output.command("taskgate-server create-admin --username admin --password <password>");
    output.info("3. Start the server:");
    output.command("taskgate-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

/// Writes `content` unless the file exists and `force` is false.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_taskgate_toml(config: &InitConfig) -> String {
    format!(
        r#"# Taskgate configuration
#
# Secrets are never stored here. Each *_env key names the environment
# variable that holds the value; .env is loaded at startup.

[server]
host = "{host}"
port = {port}
log_level = "info"
# Upper bound on a single request, in seconds
request_timeout_secs = 30
# Time in-flight requests get after SIGTERM/Ctrl-C
shutdown_grace_secs = 10

[auth]
jwt_secret_env = "JWT_SECRET"
# Token lifetime in seconds
token_ttl_secs = 3600

[database]
# Local file, or ":memory:" for a throwaway store
url = "./data/taskgate.db"

# Remote Turso database (requires the `turso` feature)
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
"#,
        host = config.host,
        port = config.port,
    )
}

fn generate_env_example() -> String {
    r#"# Taskgate environment
# Copy to .env and fill in.

# HMAC key for signing tokens. Use a long random value.
JWT_SECRET=change-me-to-a-long-random-string

# Log filter override (falls back to [server] log_level)
# RUST_LOG=info,taskgate=debug

# Turso (only with the `turso` feature)
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Environment
.env

# Local database
data/
*.db
*.db-shm
*.db-wal

# Build output
target/
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::TaskgateConfig;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir, force: bool) -> InitConfig {
        InitConfig {
            path: temp_dir.path().to_path_buf(),
            force,
            host: "127.0.0.1".to_string(),
            port: 4100,
        }
    }

    #[test]
    fn test_generated_toml_parses() {
        let temp_dir = TempDir::new().unwrap();
        let content = generate_taskgate_toml(&create_test_config(&temp_dir, false));

        let parsed = TaskgateConfig::parse(&content).expect("generated config must parse");
        assert_eq!(parsed.server.port, 4100);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.auth.jwt_secret_env, "JWT_SECRET");
        assert!(parsed.database.turso_url_env.is_none());
    }

    #[test]
    fn test_env_example_and_gitignore() {
        assert!(generate_env_example().contains("JWT_SECRET="));
        let gitignore = generate_gitignore();
        assert!(gitignore.contains(".env"));
        assert!(gitignore.contains("data/"));
    }

    #[test]
    fn test_write_file_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.txt");

        write_file(&path, "first", false).unwrap();
        write_file(&path, "second", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_file(&path, "third", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let result = run(create_test_config(&temp_dir, false), &Output::no_color());

        assert_eq!(result, InitResult::Success);
        assert!(temp_dir.path().join("taskgate.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
        assert!(temp_dir.path().join(".gitignore").exists());
        assert!(temp_dir.path().join("data").is_dir());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("taskgate.toml"), "# mine").unwrap();

        let result = run(create_test_config(&temp_dir, false), &Output::no_color());

        assert_eq!(result, InitResult::AlreadyExists);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("taskgate.toml")).unwrap(),
            "# mine"
        );
    }

    #[test]
    fn test_run_force_overwrites_config_but_not_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("taskgate.toml"), "# mine").unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "custom\n").unwrap();

        let result = run(create_test_config(&temp_dir, true), &Output::no_color());

        assert_eq!(result, InitResult::Success);
        let content = fs::read_to_string(temp_dir.path().join("taskgate.toml")).unwrap();
        assert!(content.contains("[server]"));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join(".gitignore")).unwrap(),
            "custom\n"
        );
    }
}
