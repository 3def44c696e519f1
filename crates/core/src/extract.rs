//! Asset reference extraction from XML project documents
//!
//! The project document is read as a token stream; no schema is assumed.
//! Candidate paths come from three overlapping sources:
//! 1. `fullpath` attributes on any element whose local name contains `fileReference`
//! 2. text content of `fullpath` elements
//! 3. text content of `file`/`path`/`src`/`source` elements, plus any of their
//!    attributes whose name contains `path` or `file` (case-insensitive)
//!
//! Candidates are merged into one set before resolution since the same asset
//! is usually referenced more than once.

use crate::store::{clean_path, relative_to};
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const TEXT_ELEMENTS: [&[u8]; 4] = [b"file", b"path", b"src", b"source"];
const URI_PREFIXES: [&str; 3] = ["http://", "https://", "file://"];

/// An asset found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAsset {
    /// Absolute, cleaned path
    pub path: PathBuf,
    /// Path relative to the project file's directory
    pub relative_path: PathBuf,
    pub filename: String,
    /// Extension including the leading dot (`.mp4`), empty if none
    pub extension: String,
    pub size: u64,
}

/// Result of scanning one project file
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub project_file: PathBuf,
    /// Found assets, sorted by absolute path
    pub assets: Vec<ExtractedAsset>,
    /// Referenced paths that are absent or not regular files, sorted
    pub missing: Vec<PathBuf>,
    /// Sum of the found assets' sizes
    pub total_size: u64,
}

/// Extract the assets referenced by a project file
///
/// Fails only when the file cannot be opened or read. A malformed or empty
/// document yields no candidates.
pub fn extract_assets(project_file: &Path) -> Result<Extraction> {
    let project_file = absolutize(project_file)?;

    let file = File::open(&project_file)
        .with_context(|| format!("Failed to open project file {}", project_file.display()))?;

    let candidates = match scan_candidates(BufReader::new(file))
        .with_context(|| format!("Failed to read project file {}", project_file.display()))?
    {
        Some(candidates) => candidates,
        None => BTreeSet::new(),
    };

    let project_dir = project_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let mut extraction = resolve_candidates(&candidates, &project_dir);
    extraction.project_file = project_file;

    tracing::debug!(
        "Extracted {} assets ({} missing, {} bytes) from {}",
        extraction.assets.len(),
        extraction.missing.len(),
        extraction.total_size,
        extraction.project_file.display()
    );

    Ok(extraction)
}

/// Collect raw candidate strings from a document stream
///
/// Returns `Ok(None)` when the document is not well-formed; only I/O errors
/// are reported as `Err`.
pub fn scan_candidates<R: BufRead>(source: R) -> Result<Option<BTreeSet<String>>> {
    struct Frame {
        captures_text: bool,
        has_child: bool,
        text: String,
    }

    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut candidates = BTreeSet::new();

    loop {
        buf.clear();
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(quick_xml::Error::Io(e)) => {
                return Err(anyhow::anyhow!("I/O error while reading document: {}", e));
            }
            Err(e) => {
                tracing::warn!(
                    "Project document is not well-formed at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                return Ok(None);
            }
        };

        match event {
            Event::Start(ref element) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_child = true;
                }
                if !collect_attributes(element, &mut candidates) {
                    return Ok(None);
                }
                stack.push(Frame {
                    captures_text: captures_text(element.local_name().as_ref()),
                    has_child: false,
                    text: String::new(),
                });
            }
            Event::Empty(ref element) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_child = true;
                }
                if !collect_attributes(element, &mut candidates) {
                    return Ok(None);
                }
            }
            Event::Text(ref text) => {
                if let Some(top) = stack.last_mut() {
                    if top.captures_text && !top.has_child {
                        match text.unescape() {
                            Ok(value) => top.text.push_str(&value),
                            Err(e) => {
                                tracing::warn!("Bad escape in project document: {}", e);
                                return Ok(None);
                            }
                        }
                    }
                }
            }
            Event::CData(ref data) => {
                if let Some(top) = stack.last_mut() {
                    if top.captures_text && !top.has_child {
                        top.text.push_str(&String::from_utf8_lossy(data));
                    }
                }
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    if frame.captures_text {
                        insert_candidate(&mut candidates, &frame.text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        tracing::warn!("Project document ended with {} unclosed elements", stack.len());
        return Ok(None);
    }

    Ok(Some(candidates))
}

fn captures_text(local_name: &[u8]) -> bool {
    local_name == b"fullpath" || TEXT_ELEMENTS.contains(&local_name)
}

/// Returns false if an attribute could not be decoded
fn collect_attributes(element: &BytesStart<'_>, candidates: &mut BTreeSet<String>) -> bool {
    let local_name = element.local_name();
    let name = local_name.as_ref();

    let is_file_reference = contains(name, b"fileReference");
    let is_text_element = TEXT_ELEMENTS.contains(&name);
    if !is_file_reference && !is_text_element {
        return true;
    }

    for attr in element.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!("Malformed attribute in project document: {}", e);
                return false;
            }
        };

        let key = attr.key.local_name();
        let key = key.as_ref();

        let wanted = (is_file_reference && key == b"fullpath")
            || (is_text_element && {
                let lower = key.to_ascii_lowercase();
                contains(&lower, b"path") || contains(&lower, b"file")
            });

        if wanted {
            match attr.unescape_value() {
                Ok(value) => insert_candidate(candidates, &value),
                Err(e) => {
                    tracing::warn!("Bad escape in project document attribute: {}", e);
                    return false;
                }
            }
        }
    }

    true
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn insert_candidate(candidates: &mut BTreeSet<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        candidates.insert(trimmed.to_string());
    }
}

/// Resolve candidate strings against the project directory and stat them
pub fn resolve_candidates(candidates: &BTreeSet<String>, project_dir: &Path) -> Extraction {
    let mut found: Vec<PathBuf> = Vec::new();
    let mut missing: Vec<PathBuf> = Vec::new();

    for candidate in candidates {
        if URI_PREFIXES.iter().any(|p| candidate.starts_with(p)) {
            continue;
        }

        let raw = Path::new(candidate);
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            project_dir.join(raw)
        };
        let resolved = clean_path(&joined);

        match std::fs::metadata(&resolved) {
            Ok(meta) if meta.is_file() => found.push(resolved),
            _ => missing.push(resolved),
        }
    }

    // Different candidate strings can clean to the same path
    sort_paths(&mut found);

    let mut extraction = Extraction::default();

    for path in found {
        // Stat again for the size; a file vanishing in between counts as missing
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(_) => {
                missing.push(path);
                continue;
            }
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        extraction.total_size += size;
        extraction.assets.push(ExtractedAsset {
            relative_path: relative_to(&path, project_dir),
            path,
            filename,
            extension,
            size,
        });
    }

    sort_paths(&mut missing);
    extraction.missing = missing;
    extraction
}

/// Sort by the raw path bytes and drop duplicates
///
/// `PathBuf` ordering is per component, which puts `b/c.png` before `b-c.png`.
fn sort_paths(paths: &mut Vec<PathBuf>) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    paths.dedup();
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };
    Ok(clean_path(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scan(doc: &str) -> Option<BTreeSet<String>> {
        scan_candidates(doc.as_bytes()).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_file_reference_fullpath_attribute() {
        let doc = r#"<AfterEffectsProject xmlns="http://www.adobe.com/products/aftereffects">
            <Fold><fileReference fullpath="/media/a.mp4" platform="Mac"/></Fold>
            <ns:fileReference xmlns:ns="urn:x" fullpath=" /media/b.png "></ns:fileReference>
            <fileReference other="/media/ignored.wav"/>
        </AfterEffectsProject>"#;
        assert_eq!(scan(doc), Some(set(&["/media/a.mp4", "/media/b.png"])));
    }

    #[test]
    fn test_fullpath_element_text() {
        let doc = "<root><item><fullpath>footage/clip.mov</fullpath></item></root>";
        assert_eq!(scan(doc), Some(set(&["footage/clip.mov"])));
    }

    #[test]
    fn test_generic_elements_text_and_attributes() {
        let doc = r#"<root>
            <file>one.wav</file>
            <path>two.wav</path>
            <src FilePath="three.wav" SourcePATH="four.wav" id="nope"/>
            <source>five.wav<child/>tail-not-text</source>
            <other path="ignored.wav">ignored-too.wav</other>
        </root>"#;
        assert_eq!(
            scan(doc),
            Some(set(&["one.wav", "two.wav", "three.wav", "four.wav", "five.wav"]))
        );
    }

    #[test]
    fn test_duplicates_merge() {
        let doc = r#"<root>
            <fileReference fullpath="/m/a.mp4"/>
            <fullpath>/m/a.mp4</fullpath>
            <file path="/m/a.mp4">/m/a.mp4</file>
        </root>"#;
        assert_eq!(scan(doc), Some(set(&["/m/a.mp4"])));
    }

    #[test]
    fn test_escaped_text_and_cdata() {
        let doc = "<root><file>a&amp;b.png</file><path><![CDATA[c d.png]]></path></root>";
        assert_eq!(scan(doc), Some(set(&["a&b.png", "c d.png"])));
    }

    #[test]
    fn test_malformed_document_yields_none() {
        assert_eq!(scan("<root><file>a.png</root>"), None);
        assert_eq!(scan("<root><file>a.png</file>"), None);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(scan(""), Some(BTreeSet::new()));
    }

    #[test]
    fn test_resolve_skips_uris_and_classifies() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path();
        fs::create_dir_all(dir.join("footage"))?;
        fs::write(dir.join("footage/a.mp4"), vec![0u8; 100])?;
        fs::write(dir.join("b.png"), vec![0u8; 20])?;

        let candidates = set(&[
            "footage/a.mp4",
            "./footage/../b.png",
            "http://example.com/x.png",
            "file:///tmp/y.png",
            "gone.wav",
            "footage",
        ]);

        let extraction = resolve_candidates(&candidates, dir);

        let found: Vec<_> = extraction.assets.iter().map(|a| a.path.clone()).collect();
        assert_eq!(found, vec![dir.join("b.png"), dir.join("footage/a.mp4")]);
        assert_eq!(extraction.total_size, 120);
        assert_eq!(extraction.missing, vec![dir.join("footage"), dir.join("gone.wav")]);

        let a = &extraction.assets[1];
        assert_eq!(a.filename, "a.mp4");
        assert_eq!(a.extension, ".mp4");
        assert_eq!(a.relative_path, PathBuf::from("footage/a.mp4"));
        assert_eq!(a.size, 100);

        Ok(())
    }

    #[test]
    fn test_resolve_orders_by_full_path_text() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path();
        fs::create_dir_all(dir.join("b"))?;
        fs::write(dir.join("b/c.png"), b"1")?;
        fs::write(dir.join("b-c.png"), b"2")?;

        let candidates = set(&["b-c.png", "b/c.png", "m-n.wav", "m/n.wav", "./b-c.png"]);
        let extraction = resolve_candidates(&candidates, dir);

        // '-' sorts before '/'
        let found: Vec<_> = extraction.assets.iter().map(|a| a.path.clone()).collect();
        assert_eq!(found, vec![dir.join("b-c.png"), dir.join("b/c.png")]);
        assert_eq!(extraction.missing, vec![dir.join("m-n.wav"), dir.join("m/n.wav")]);
        assert_eq!(extraction.total_size, 2);

        Ok(())
    }

    #[test]
    fn test_extract_assets_end_to_end() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path();
        fs::write(dir.join("video1.mp4"), vec![1u8; 64])?;
        fs::write(
            dir.join("intro.aepx"),
            r#"<?xml version="1.0"?>
            <AfterEffectsProject>
                <fileReference fullpath="video1.mp4"/>
                <fileReference fullpath="missing.png"/>
            </AfterEffectsProject>"#,
        )?;

        let extraction = extract_assets(&dir.join("intro.aepx"))?;
        assert_eq!(extraction.project_file, dir.join("intro.aepx"));
        assert_eq!(extraction.assets.len(), 1);
        assert_eq!(extraction.assets[0].path, dir.join("video1.mp4"));
        assert_eq!(extraction.missing, vec![dir.join("missing.png")]);
        assert_eq!(extraction.total_size, 64);

        Ok(())
    }

    #[test]
    fn test_extract_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path();
        for name in ["c.wav", "a.wav", "b.wav"] {
            fs::write(dir.join(name), name.as_bytes())?;
        }
        fs::write(
            dir.join("mix.aepx"),
            "<p><file>c.wav</file><file>a.wav</file><file>b.wav</file><file>z.wav</file><file>y.wav</file></p>",
        )?;

        let first = extract_assets(&dir.join("mix.aepx"))?;
        let second = extract_assets(&dir.join("mix.aepx"))?;

        assert_eq!(first.assets, second.assets);
        assert_eq!(first.missing, second.missing);
        let names: Vec<_> = first.assets.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a.wav", "b.wav", "c.wav"]);
        assert_eq!(first.missing, vec![dir.join("y.wav"), dir.join("z.wav")]);

        Ok(())
    }

    #[test]
    fn test_extract_malformed_document_is_not_an_error() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("broken.aepx");
        fs::write(&path, "<AfterEffectsProject><fileReference fullpath=\"x.mp4\">")?;

        let extraction = extract_assets(&path)?;
        assert!(extraction.assets.is_empty());
        assert!(extraction.missing.is_empty());
        assert_eq!(extraction.total_size, 0);

        Ok(())
    }

    #[test]
    fn test_extract_unopenable_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = extract_assets(&temp.path().join("absent.aepx"));
        assert!(result.is_err());
    }
}
