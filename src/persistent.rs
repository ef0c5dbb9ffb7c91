use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::Digest;
use uuid::Uuid;

use crate::filter_expr::{FilterOperator, FilterPredicate};

pub fn make_uuid_from_seed(seed: &str) -> Uuid {
    let digest_bytes: [u8; 32] = sha2::Sha256::digest(seed).into();
    let mut uuid_bytes = [0u8; 16];
    uuid_bytes.copy_from_slice(&digest_bytes[0..16]);
    Uuid::from_bytes(uuid_bytes)
}

/// A named set of filters that selects the compared population.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedView {
    pub id: Uuid,
    pub name: String,
    pub filters: Vec<FilterPredicate>,
    /// Built-in views are not saved in persistent data.
    pub is_builtin: bool,
}

impl SavedView {
    pub fn new(name: &str, filters: Vec<FilterPredicate>) -> SavedView {
        SavedView {
            id: Uuid::new_v4(),
            name: name.to_string(),
            filters,
            is_builtin: false,
        }
    }

    fn builtin(name: &str, filters: Vec<FilterPredicate>) -> SavedView {
        SavedView {
            id: make_uuid_from_seed(name),
            name: name.to_string(),
            filters,
            is_builtin: true,
        }
    }
}

pub fn builtin_views() -> Vec<SavedView> {
    vec![
        SavedView::builtin(
            "Errors",
            vec![FilterPredicate::new("status", FilterOperator::Equal, "error")],
        ),
        SavedView::builtin(
            "Server spans",
            vec![FilterPredicate::new("kind", FilterOperator::Equal, "server")],
        ),
    ]
}

/// Persistent data structure that holds the user's column list and saved views.
/// If the data structure changes, it should be versioned to maintain compatibility with data saved
/// using older versions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum PersistentData {
    V1(PersistentDataV1),
}

impl Default for PersistentData {
    fn default() -> Self {
        PersistentData::V1(PersistentDataV1::default())
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PersistentDataV1 {
    columns: String,
    views: Vec<SavedView>,
}

/// Settings as used by the rest of the crate, builtin views included.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub columns: String,
    pub views: Vec<SavedView>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            columns: String::new(),
            views: builtin_views(),
        }
    }
}

impl Settings {
    pub fn find_view(&self, name: &str) -> Option<&SavedView> {
        self.views.iter().find(|view| view.name == name)
    }

    /// Add a user view, replacing an existing user view with the same name.
    pub fn upsert_view(&mut self, view: SavedView) {
        match self
            .views
            .iter_mut()
            .find(|existing| !existing.is_builtin && existing.name == view.name)
        {
            Some(existing) => {
                existing.filters = view.filters;
            }
            None => self.views.push(view),
        }
    }

    pub fn load() -> Result<Settings> {
        Settings::load_from(&persistent_data_file_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&persistent_data_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Settings> {
        let data = read_data(path)?;
        let PersistentData::V1(data) = data;

        // Add builtin views which are not saved in persistent data
        let views = builtin_views().into_iter().chain(data.views).collect();
        Ok(Settings {
            columns: data.columns,
            views,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut views = self.views.clone();
        views.retain(|view| !view.is_builtin);

        let data = PersistentData::V1(PersistentDataV1 {
            columns: self.columns.clone(),
            views,
        });
        write_data(path, &data)
    }
}

fn write_data(path: &Path, data: &PersistentData) -> Result<()> {
    tracing::info!("Writing persistent data to {}", path.display());

    let folder = path
        .parent()
        .context("Persistent data path has no parent directory")?;
    // Create the directory if it doesn't exist
    std::fs::create_dir_all(folder)?;

    // First write the data to a temporary file
    let random_number: u64 = rand::random();
    let write_file_path = folder.join(format!("temporary_persistent_data{}.json", random_number));
    let mut file = std::fs::File::create(&write_file_path)?;
    serde_json::to_writer_pretty(&mut file, &data)?;
    file.sync_all()?;

    // Then move the temporary file to the final location
    std::fs::rename(&write_file_path, path)?;

    Ok(())
}

fn read_data(path: &Path) -> Result<PersistentData> {
    tracing::debug!("Reading persistent data from {}", path.display());
    if !path.try_exists()? {
        tracing::info!("File not found, using default data");
        return Ok(PersistentData::default());
    }
    let file = std::fs::File::open(path)?;
    let data: PersistentData = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse persistent data in {}", path.display()))?;
    Ok(data)
}

fn persistent_data_folder() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "spanscope", "spanscope")
        .context("Couldn't determine the home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

fn persistent_data_file_path() -> Result<PathBuf> {
    Ok(persistent_data_folder()?.join("persistent_data.json"))
}
