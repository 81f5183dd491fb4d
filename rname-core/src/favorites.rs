use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const FAVORITES_FILE_NAME: &str = "favorites.json";

/// A saved command line that can be replayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    /// Arguments after the program name
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub created_at: String,
}

impl Favorite {
    /// Command line as a shell would show it
    pub fn command_line(&self) -> String {
        command_line(&self.command)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    next_id: u64,
    #[serde(default)]
    favorites: Vec<Favorite>,
}

impl Default for FavoritesFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            favorites: Vec::new(),
        }
    }
}

/// Favorites kept in `favorites.json`
#[derive(Debug, Default)]
pub struct FavoritesStore {
    path: Option<PathBuf>,
    file: FavoritesFile,
}

impl FavoritesStore {
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_from_path(&data_dir.join(FAVORITES_FILE_NAME))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let reader = BufReader::new(
                File::open(path)
                    .with_context(|| format!("Failed to open favorites file: {}", path.display()))?,
            );
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse favorites file: {}", path.display()))?
        } else {
            FavoritesFile::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            file,
        })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create favorites file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.file)
            .with_context(|| format!("Failed to write favorites file: {}", path.display()))?;
        Ok(())
    }

    pub fn add(&mut self, command: Vec<String>, alias: Option<String>) -> Result<Favorite> {
        if command.is_empty() {
            return Err(anyhow!("Cannot save an empty command as a favorite"));
        }
        if let Some(alias) = &alias {
            self.check_alias(alias, None)?;
        }

        let favorite = Favorite {
            id: self.file.next_id,
            command,
            alias,
            created_at: chrono::Local::now().to_rfc3339(),
        };
        self.file.next_id += 1;
        self.file.favorites.push(favorite.clone());
        self.save()?;
        Ok(favorite)
    }

    /// Look up by numeric id or by alias
    pub fn get(&self, id_or_alias: &str) -> Option<&Favorite> {
        match id_or_alias.parse::<u64>() {
            Ok(id) => self.file.favorites.iter().find(|f| f.id == id),
            Err(_) => self
                .file
                .favorites
                .iter()
                .find(|f| f.alias.as_deref() == Some(id_or_alias)),
        }
    }

    pub fn list(&self) -> &[Favorite] {
        &self.file.favorites
    }

    pub fn remove(&mut self, id_or_alias: &str) -> Result<Favorite> {
        let id = self
            .get(id_or_alias)
            .map(|f| f.id)
            .ok_or_else(|| anyhow!("Favorite '{}' not found", id_or_alias))?;
        let position = self
            .file
            .favorites
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| anyhow!("Favorite '{}' not found", id_or_alias))?;
        let removed = self.file.favorites.remove(position);
        self.save()?;
        Ok(removed)
    }

    /// Set or clear (`None`) the alias of favorite `id`
    pub fn set_alias(&mut self, id: u64, alias: Option<String>) -> Result<()> {
        if let Some(alias) = &alias {
            self.check_alias(alias, Some(id))?;
        }
        let favorite = self
            .file
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| anyhow!("Favorite {} not found", id))?;
        favorite.alias = alias;
        self.save()
    }

    fn check_alias(&self, alias: &str, owner: Option<u64>) -> Result<()> {
        if alias.trim().is_empty() {
            return Err(anyhow!("Alias cannot be empty"));
        }
        if alias.parse::<u64>().is_ok() {
            return Err(anyhow!("Alias '{}' cannot be a number", alias));
        }
        let taken = self
            .file
            .favorites
            .iter()
            .any(|f| f.alias.as_deref() == Some(alias) && Some(f.id) != owner);
        if taken {
            return Err(anyhow!("Alias '{}' is already in use", alias));
        }
        Ok(())
    }
}

/// Join arguments, quoting the ones a shell would split
pub fn command_line(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || "'\"{}$*?".contains(c)) {
                format!("'{}'", arg.replace('\'', r"'\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format favorites for display
pub fn format_favorites(favorites: &[Favorite], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(favorites)?);
    }
    if favorites.is_empty() {
        return Ok("No favorites saved".to_string());
    }

    use comfy_table::{Cell, Color, Table};

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Alias").fg(Color::Cyan),
        Cell::new("Command").fg(Color::Cyan),
    ]);
    for favorite in favorites {
        table.add_row(vec![
            favorite.id.to_string(),
            favorite.alias.clone().unwrap_or_default(),
            favorite.command_line(),
        ]);
    }
    Ok(table.to_string())
}
