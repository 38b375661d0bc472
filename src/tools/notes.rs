//! Persistent notes.
//!
//! [`NoteStore`] is a durable name → note mapping in a single JSON file,
//! surviving process restarts. Writes are last-write-wins and each
//! read-modify-write cycle holds an exclusive file lock, so concurrent
//! sessions in separate processes cannot corrupt the store. [`NotesTool`]
//! exposes the store to the model with `add`/`list`/`get`/`delete` actions.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

/// A stored note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// The note body
    pub content: String,
    /// When the note was written (refreshed on overwrite)
    pub created_at: DateTime<Utc>,
}

/// Durable name → note mapping backed by a locked JSON file.
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    /// Create a store over the given file path. The file and its parent
    /// directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write a note, overwriting any previous note with the same name.
    pub fn put(&self, name: &str, content: &str) -> Result<()> {
        let mut file = self.open_for_update()?;
        file.lock_exclusive()?;

        let mut notes = read_notes(&mut file)?;
        notes.insert(
            name.to_string(),
            Note {
                content: content.to_string(),
                created_at: Utc::now(),
            },
        );
        write_notes(&mut file, &notes)?;

        fs2::FileExt::unlock(&file)?;
        Ok(())
    }

    /// Read one note by name.
    pub fn get(&self, name: &str) -> Result<Option<Note>> {
        Ok(self.get_all()?.remove(name))
    }

    /// Read the whole mapping.
    pub fn get_all(&self) -> Result<BTreeMap<String, Note>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let mut file = File::open(&self.path)?;
        file.lock_shared()?;
        let notes = read_notes(&mut file);
        fs2::FileExt::unlock(&file)?;
        notes
    }

    /// Delete a note. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut file = self.open_for_update()?;
        file.lock_exclusive()?;

        let mut notes = read_notes(&mut file)?;
        let existed = notes.remove(name).is_some();
        if existed {
            write_notes(&mut file, &notes)?;
        }

        fs2::FileExt::unlock(&file)?;
        Ok(existed)
    }

    fn open_for_update(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)?)
    }
}

fn read_notes(file: &mut File) -> Result<BTreeMap<String, Note>> {
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_notes(file: &mut File, notes: &BTreeMap<String, Note>) -> Result<()> {
    let serialized = serde_json::to_string_pretty(notes)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Persistent note management exposed to the model.
pub struct NotesTool {
    store: NoteStore,
}

impl NotesTool {
    /// Create the tool over a note store.
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for NotesTool {
    fn name(&self) -> &str {
        "manage_notes"
    }

    fn description(&self) -> &str {
        "Manage persistent notes. Use this when the user asks to remember or \
         save something ('add'), read back everything saved ('list', returns \
         every note name with its content), read one note ('get'), or remove \
         one ('delete'). Saving under an existing name overwrites it."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["add", "list", "get", "delete"],
                    "description": "The action to perform"
                },
                "title": {
                    "type": "string",
                    "description": "Note name (for add, get, delete)"
                },
                "content": {
                    "type": "string",
                    "description": "Note content (for add)"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let action = args.get("action").and_then(Value::as_str).unwrap_or("");
        let title = args.get("title").and_then(Value::as_str);
        let content = args.get("content").and_then(Value::as_str);

        let payload = match action {
            "add" => match (title, content) {
                (Some(title), Some(content)) if !title.is_empty() => {
                    self.store.put(title, content)?;
                    json!({
                        "success": true,
                        "message": format!("note '{}' saved", title)
                    })
                }
                _ => json!({
                    "success": false,
                    "error": "'add' requires both 'title' and 'content'"
                }),
            },
            "list" => {
                let notes = self.store.get_all()?;
                let mapping: BTreeMap<&String, &String> =
                    notes.iter().map(|(name, note)| (name, &note.content)).collect();
                json!({
                    "success": true,
                    "count": mapping.len(),
                    "notes": mapping
                })
            }
            "get" => match title {
                Some(title) => match self.store.get(title)? {
                    Some(note) => json!({
                        "success": true,
                        "title": title,
                        "content": note.content,
                        "created_at": note.created_at.to_rfc3339()
                    }),
                    None => json!({
                        "success": false,
                        "error": format!("note '{}' not found", title)
                    }),
                },
                None => json!({
                    "success": false,
                    "error": "'get' requires 'title'"
                }),
            },
            "delete" => match title {
                Some(title) => {
                    if self.store.delete(title)? {
                        json!({
                            "success": true,
                            "message": format!("note '{}' deleted", title)
                        })
                    } else {
                        json!({
                            "success": false,
                            "error": format!("note '{}' not found", title)
                        })
                    }
                }
                None => json!({
                    "success": false,
                    "error": "'delete' requires 'title'"
                }),
            },
            other => json!({
                "success": false,
                "error": format!("invalid action '{}'", other)
            }),
        };

        Ok(payload.to_string())
    }
}
