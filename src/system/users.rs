use std::collections::HashMap;
use std::path::Path;

use super::error::SourceResult;
use super::source::read_file;

/// uid → login name, parsed from a passwd-format account database.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    names: HashMap<u32, String>,
}

impl UserTable {
    /// Rows are `name:password:uid:...`. Rows with a non-numeric uid are
    /// skipped; the first row for a uid wins.
    pub fn parse(contents: &str) -> Self {
        let mut names = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(':');
            let (Some(name), Some(_), Some(uid)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            if let Ok(uid) = uid.parse::<u32>() {
                names.entry(uid).or_insert_with(|| name.to_string());
            }
        }
        UserTable { names }
    }

    pub fn load(path: &Path) -> SourceResult<Self> {
        let contents = read_file(path)?;
        Ok(Self::parse(&contents))
    }

    /// Login name for `uid`, or the uid itself in decimal when unknown.
    pub fn resolve(&self, uid: u32) -> String {
        self.names
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
