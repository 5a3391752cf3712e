//! Archive inventory and Xcode project detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::{ConvertError, Result};

/// Markers that identify Xcode project content, checked in this order.
/// The first marker contained in an entry name (case-insensitive) wins.
pub const XCODE_MARKERS: &[(&str, &str)] = &[
    (".xcodeproj", "Xcode Project Bundle"),
    (".pbxproj", "Xcode Project File"),
    (".xcworkspace", "Xcode Workspace"),
    ("Info.plist", "iOS App Configuration"),
    (".xcassets", "Asset Catalog"),
    (".storyboard", "Interface Builder File"),
    (".xib", "Interface Builder File"),
    ("Podfile", "CocoaPods Dependency"),
    ("Cartfile", "Carthage Dependency"),
];

const DETECTED: &str = "Valid Xcode project detected";
const NOT_DETECTED: &str = "Not an Xcode project";

/// Entry names of an archive and the directories they imply.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Inventory {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct XcodeFile {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct XcodeDetection {
    pub has_xcode_project: bool,
    pub xcode_files: Vec<XcodeFile>,
    pub validation_status: String,
    /// Marker → entry names that matched it.
    pub details: BTreeMap<String, Vec<String>>,
}

/// Full inspection result as returned by `/api/detect`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Inspection {
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub xcode_detection: XcodeDetection,
}

impl Inspection {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }
}

/// Read the central directory of the archive at `path`.
///
/// Blocking; run it inside `spawn_blocking` from async code.
pub fn inventory(path: &Path) -> Result<Inventory> {
    let file = File::open(path)?;
    let archive = zip::ZipArchive::new(file).map_err(|e| {
        ConvertError::UnsupportedFormat(format!("Error reading ZIP file: {e}"))
    })?;
    Ok(inventory_from_names(archive.file_names().map(str::to_owned)))
}

/// Build an [`Inventory`] from entry names in archive order.
pub fn inventory_from_names(names: impl IntoIterator<Item = String>) -> Inventory {
    let mut files = Vec::new();
    let mut directories = BTreeSet::new();
    for name in names {
        if let Some((parent, _)) = name.rsplit_once('/') {
            directories.insert(parent.to_owned());
        }
        files.push(name);
    }
    Inventory {
        files,
        directories: directories.into_iter().collect(),
    }
}

/// Flag entries matching [`XCODE_MARKERS`].
pub fn detect_xcode<'a>(names: impl IntoIterator<Item = &'a str>) -> XcodeDetection {
    let mut xcode_files = Vec::new();
    let mut details: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for name in names {
        let lower = name.to_lowercase();
        let hit = XCODE_MARKERS
            .iter()
            .find(|(marker, _)| lower.contains(&marker.to_lowercase()));
        if let Some((marker, kind)) = hit {
            xcode_files.push(XcodeFile {
                path: name.to_owned(),
                kind: (*kind).to_owned(),
            });
            details
                .entry((*marker).to_owned())
                .or_default()
                .push(name.to_owned());
        }
    }

    let has_xcode_project = !xcode_files.is_empty();
    XcodeDetection {
        has_xcode_project,
        xcode_files,
        validation_status: if has_xcode_project { DETECTED } else { NOT_DETECTED }.to_owned(),
        details,
    }
}

/// Inventory plus Xcode detection for the archive at `path`. Blocking.
pub fn inspect(path: &Path) -> Result<Inspection> {
    let Inventory { files, directories } = inventory(path)?;
    let xcode_detection = detect_xcode(files.iter().map(String::as_str));
    Ok(Inspection {
        files,
        directories,
        xcode_detection,
    })
}
