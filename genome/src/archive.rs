//! Topology archive (§4.10 / §6): a version-gated text table mapping a
//! canonical genome string to one or more topology names. Grounded on
//! moyo's `data::hall_symbol_database` lookup-table shape, adapted to a
//! runtime-loaded table since RCSR archives are large and user-supplied
//! rather than a fixed compiled-in list.

use std::collections::BTreeMap;

use crate::base::GenomeError;

/// Current archive format version this build writes and expects to read.
pub const ARCHIVE_VERSION: &str = "0.1.0";
const TOOL_NAME: &str = "genome";

/// One archive entry: the genome string it was filed under and the name(s)
/// recognising it. Duplicate keys are concatenated, joined by `", "`, in
/// the order they were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub genome: String,
    pub names: Vec<String>,
}

/// An in-memory topology archive: version header plus `genome -> names` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub version: String,
    entries: BTreeMap<String, Vec<String>>,
}

impl Archive {
    /// A fresh, empty archive stamped with the current tool version.
    pub fn new() -> Self {
        Self {
            version: ARCHIVE_VERSION.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Parse the text format of §6: first line `"Made by <tool> v<X.Y.Z>"`,
    /// then blank-separated `key <genome>` / `id <name>` pairs, each `key`
    /// followed by exactly one `id`.
    pub fn parse(text: &str) -> Result<Archive, GenomeError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| {
            GenomeError::InvalidInput("archive is empty, missing version header".to_string())
        })?;
        let version = parse_header(header)?;

        let tokens: Vec<&str> = lines.flat_map(|l| l.split_whitespace()).collect();
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i] != "key" {
                return Err(GenomeError::InvalidInput(format!(
                    "expected 'key', found '{}'",
                    tokens[i]
                )));
            }
            let genome = tokens.get(i + 1).ok_or_else(|| {
                GenomeError::InvalidInput("'key' with no genome string".to_string())
            })?;
            if tokens.get(i + 2) != Some(&"id") {
                return Err(GenomeError::InvalidInput(
                    "'key' not followed by 'id'".to_string(),
                ));
            }
            let name = tokens.get(i + 3).ok_or_else(|| {
                GenomeError::InvalidInput("'id' with no topology name".to_string())
            })?;
            entries
                .entry(genome.to_string())
                .or_default()
                .push(name.to_string());
            i += 4;
        }

        Ok(Archive { version, entries })
    }

    /// Render back to the text format `parse` accepts.
    pub fn render(&self) -> String {
        let mut out = format!("Made by {TOOL_NAME} v{}\n", self.version);
        for (genome, names) in &self.entries {
            for name in names {
                out.push_str(&format!("key {genome}\nid {name}\n"));
            }
        }
        out
    }

    /// Names recognising `genome`, or `None` if absent.
    pub fn lookup(&self, genome: &str) -> Option<&[String]> {
        self.entries.get(genome).map(|v| v.as_slice())
    }

    /// File `genome` under `name`, appending if the key already exists.
    pub fn insert(&mut self, genome: &str, name: &str) {
        self.entries
            .entry(genome.to_string())
            .or_default()
            .push(name.to_string());
    }

    /// Drop every record for `genome`. Returns `true` if anything was removed.
    pub fn remove(&mut self, genome: &str) -> bool {
        self.entries.remove(genome).is_some()
    }

    /// Merge `other`'s records into `self`, concatenating names on
    /// duplicate keys as directory-archive loading requires.
    pub fn merge(&mut self, other: &Archive) {
        for (genome, names) in &other.entries {
            self.entries
                .entry(genome.clone())
                .or_default()
                .extend(names.iter().cloned());
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = ArchiveEntry> + '_ {
        self.entries.iter().map(|(genome, names)| ArchiveEntry {
            genome: genome.clone(),
            names: names.clone(),
        })
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_header(line: &str) -> Result<String, GenomeError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || parts[0] != "Made" || parts[1] != "by" {
        return Err(GenomeError::InvalidInput(format!(
            "malformed archive header: '{line}'"
        )));
    }
    let tool_version = parts[3];
    let version = tool_version.strip_prefix('v').ok_or_else(|| {
        GenomeError::InvalidInput(format!("malformed version field: '{tool_version}'"))
    })?;
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let text = "Made by genome v0.1.0\nkey 3 1 1 1 0 0 3 1 1 0 1 0 3 1 1 0 0 1\nid pcu\n";
        let archive = Archive::parse(text).unwrap();
        assert_eq!(archive.version, "0.1.0");
        assert_eq!(
            archive.lookup("3 1 1 1 0 0 3 1 1 0 1 0 3 1 1 0 0 1"),
            Some(&["pcu".to_string()][..])
        );
    }

    #[test]
    fn test_duplicate_keys_concatenate_names() {
        let text = "Made by genome v0.1.0\nkey g\nid alpha\nkey g\nid beta\n";
        let archive = Archive::parse(text).unwrap();
        assert_eq!(archive.lookup("g"), Some(&["alpha".to_string(), "beta".to_string()][..]));
    }

    #[test]
    fn test_unknown_genome_is_none() {
        let archive = Archive::parse("Made by genome v0.1.0\n").unwrap();
        assert_eq!(archive.lookup("nope"), None);
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        assert!(Archive::parse("not a header\n").is_err());
    }

    #[test]
    fn test_key_without_id_is_rejected() {
        assert!(Archive::parse("Made by genome v0.1.0\nkey g\n").is_err());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut archive = Archive::new();
        archive.insert("g", "pcu");
        assert_eq!(archive.lookup("g"), Some(&["pcu".to_string()][..]));
        assert!(archive.remove("g"));
        assert_eq!(archive.lookup("g"), None);
        assert!(!archive.remove("g"));
    }

    #[test]
    fn test_merge_concatenates_across_archives() {
        let mut a = Archive::new();
        a.insert("g", "alpha");
        let mut b = Archive::new();
        b.insert("g", "beta");
        a.merge(&b);
        assert_eq!(a.lookup("g"), Some(&["alpha".to_string(), "beta".to_string()][..]));
    }

    #[test]
    fn test_render_then_parse_is_stable() {
        let mut archive = Archive::new();
        archive.insert("g1", "alpha");
        archive.insert("g2", "beta");
        let rendered = archive.render();
        let reparsed = Archive::parse(&rendered).unwrap();
        assert_eq!(reparsed.lookup("g1"), Some(&["alpha".to_string()][..]));
        assert_eq!(reparsed.lookup("g2"), Some(&["beta".to_string()][..]));
    }
}
