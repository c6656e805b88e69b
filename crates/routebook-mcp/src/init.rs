//! `routebook-mcp init`: register this server with the MCP clients on PATH,
//! in project-scoped config files under the current directory.

use std::path::{Path, PathBuf};

use routebook_core::{Error, Result, RoutebookConfig};
use serde_json::json;

use crate::SERVER_NAME;

/// How a client should launch the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntry {
    pub command: String,
    /// Passed as `ROUTEBOOK_DATA_DIR` so client-launched servers share the
    /// store this one was configured with.
    pub data_dir: PathBuf,
}

impl ServerEntry {
    fn current(config: &RoutebookConfig) -> Result<Self> {
        let command = std::env::current_exe()?.canonicalize()?;
        Ok(Self {
            command: command.to_string_lossy().to_string(),
            data_dir: config.data_dir.clone(),
        })
    }

    fn data_dir_str(&self) -> String {
        self.data_dir.to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Client {
    ClaudeCode,
    Codex,
}

impl Client {
    pub const ALL: [Client; 2] = [Client::ClaudeCode, Client::Codex];

    pub fn label(self) -> &'static str {
        match self {
            Client::ClaudeCode => "Claude Code",
            Client::Codex => "Codex",
        }
    }

    fn executable(self) -> &'static str {
        match self {
            Client::ClaudeCode => "claude",
            Client::Codex => "codex",
        }
    }

    pub fn config_path(self, project: &Path) -> PathBuf {
        match self {
            Client::ClaudeCode => project.join(".mcp.json"),
            Client::Codex => project.join(".codex").join("config.toml"),
        }
    }

    /// Add or replace the routebook entry, keeping every other server.
    /// A config file that doesn't parse is left alone and reported.
    pub fn register(self, project: &Path, entry: &ServerEntry) -> Result<PathBuf> {
        let path = self.config_path(project);
        let existing = match std::fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let updated = match self {
            Client::ClaudeCode => claude_config(existing.as_deref(), entry)?,
            Client::Codex => codex_config(existing.as_deref(), entry)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, updated)?;
        Ok(path)
    }

    fn installed(self) -> bool {
        let name = self.executable();
        std::env::var_os("PATH").is_some_and(|paths| {
            std::env::split_paths(&paths)
                .any(|dir| dir.join(name).is_file() || dir.join(format!("{name}.exe")).is_file())
        })
    }
}

fn claude_config(existing: Option<&str>, entry: &ServerEntry) -> Result<String> {
    let mut root: serde_json::Value = match existing {
        Some(raw) => serde_json::from_str(raw)?,
        None => json!({}),
    };
    let Some(doc) = root.as_object_mut() else {
        return Err(Error::invalid(".mcp.json is not a JSON object"));
    };
    let servers = doc.entry("mcpServers").or_insert_with(|| json!({}));
    if !servers.is_object() {
        *servers = json!({});
    }
    servers[SERVER_NAME] = json!({
        "type": "stdio",
        "command": entry.command,
        "args": [],
        "env": { "ROUTEBOOK_DATA_DIR": entry.data_dir_str() },
    });
    Ok(serde_json::to_string_pretty(&root)?)
}

fn codex_config(existing: Option<&str>, entry: &ServerEntry) -> Result<String> {
    let mut doc: toml_edit::DocumentMut = match existing {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::invalid(format!(".codex/config.toml: {e}")))?,
        None => toml_edit::DocumentMut::new(),
    };
    if !doc.contains_table("mcp_servers") {
        doc["mcp_servers"] = toml_edit::table();
    }

    let mut env = toml_edit::Table::new();
    env.insert("ROUTEBOOK_DATA_DIR", toml_edit::value(entry.data_dir_str()));
    let mut server = toml_edit::Table::new();
    server.insert("command", toml_edit::value(entry.command.as_str()));
    server.insert("args", toml_edit::value(toml_edit::Array::new()));
    server.insert("env", toml_edit::Item::Table(env));
    doc["mcp_servers"][SERVER_NAME] = toml_edit::Item::Table(server);
    Ok(doc.to_string())
}

/// Register with every installed client. Fails when none is installed.
pub fn run(config: &RoutebookConfig) -> Result<Vec<Client>> {
    let clients: Vec<Client> = Client::ALL.into_iter().filter(|c| c.installed()).collect();
    if clients.is_empty() {
        return Err(Error::invalid(
            "neither `claude` nor `codex` found in PATH; install one, then re-run `routebook-mcp init`",
        ));
    }
    let entry = ServerEntry::current(config)?;
    let project = std::env::current_dir()?;
    for client in &clients {
        let path = client.register(&project, &entry)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(clients)
}
