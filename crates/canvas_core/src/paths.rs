use std::path::PathBuf;

/// Application directory (~/.chat-canvas)
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".chat-canvas")
}

/// config.json inside the application directory
pub fn config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

/// models.conf inside the application directory
pub fn models_conf_path() -> PathBuf {
    app_dir().join("models.conf")
}

/// Document the CLI works on when no path is given
pub fn default_document_path() -> PathBuf {
    app_dir().join("canvas.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_app_dir() {
        let dir = app_dir();
        assert!(dir.ends_with(".chat-canvas"));
        assert_eq!(config_json_path().parent(), Some(dir.as_path()));
        assert_eq!(models_conf_path().file_name().unwrap(), "models.conf");
    }
}
