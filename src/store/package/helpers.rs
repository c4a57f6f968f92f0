// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Package persistence helpers:
/// body rendering, member/json conversion, and safe filesystem writes.
fn render_body(document: &Document) -> (StyledText, String) {
    let mut text = document.styled_text().clone();
    strip_stray_zero_width_spaces(&mut text);
    let body = export_rtf(&text, document.metadata());
    (text, body)
}

/// Member names are single plain path segments; anything else could escape
/// the package directory.
fn validate_member_name(name: &str) -> Result<(), PackageError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(PackageError::InvalidMemberName {
            name: name.to_owned(),
        })
    }
}

/// Metadata entries that survive a save, in id order: only those referenced
/// by an attachment still in the text. Everything else is an orphan and is
/// dropped.
fn surviving_records<'a>(
    text: &StyledText,
    metadata: &'a BTreeMap<ImageId, VisualMetadata>,
) -> Vec<&'a VisualMetadata> {
    let referenced: BTreeSet<ImageId> = text.referenced_image_ids().into_iter().collect();
    referenced
        .iter()
        .filter_map(|id| metadata.get(id))
        .collect()
}

/// The exact asset names a written package may contain. Image-typed members
/// under any other name have no metadata entry and are pruned.
fn surviving_asset_names(
    text: &StyledText,
    metadata: &BTreeMap<ImageId, VisualMetadata>,
) -> BTreeSet<SmolStr> {
    surviving_records(text, metadata)
        .into_iter()
        .map(|record| asset_file_name(record.id()))
        .collect()
}

fn encode_image_metadata(
    text: &StyledText,
    metadata: &BTreeMap<ImageId, VisualMetadata>,
) -> Result<String, serde_json::Error> {
    let entries: Vec<VisualMetadataJson> = surviving_records(text, metadata)
        .into_iter()
        .map(visual_metadata_to_json)
        .collect();
    serde_json::to_string_pretty(&entries)
}

fn encode_file_metadata(metadata: &FileMetadata) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&file_metadata_to_json(metadata))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VisualMetadataJson {
    Current(VisualMetadataCurrentJson),
    Legacy(VisualMetadataLegacyJson),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VisualMetadataCurrentJson {
    id: Uuid,
    width: f64,
    height: f64,
    #[serde(default = "default_true")]
    lock_aspect_ratio: bool,
    default_size: SizeJson,
    max_size: SizeJson,
    #[serde(default)]
    original_aspect_ratio: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    is_flipped_horizontal: bool,
    #[serde(default)]
    is_flipped_vertical: bool,
    #[serde(default = "default_opaque")]
    opacity: f64,
    #[serde(default)]
    show_border: bool,
    #[serde(default = "default_border_width")]
    border_width: f64,
    #[serde(default = "default_border_color")]
    border_color: ColorJson,
    #[serde(default)]
    show_shadow: bool,
    #[serde(default = "default_shadow_radius")]
    shadow_radius: f64,
    #[serde(default)]
    shadow_offset_x: f64,
    #[serde(default)]
    shadow_offset_y: f64,
    #[serde(default = "default_shadow_color")]
    shadow_color: ColorJson,
}

/// First-generation record: one `original_size` instead of the
/// `default_size`/`max_size` pair, and possibly none of the newer style
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VisualMetadataLegacyJson {
    id: Uuid,
    width: f64,
    height: f64,
    #[serde(default = "default_true")]
    lock_aspect_ratio: bool,
    original_size: SizeJson,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    is_flipped_horizontal: bool,
    #[serde(default)]
    is_flipped_vertical: bool,
    #[serde(default = "default_opaque")]
    opacity: f64,
    #[serde(default)]
    show_border: bool,
    #[serde(default = "default_border_width")]
    border_width: f64,
    #[serde(default = "default_border_color")]
    border_color: ColorJson,
    #[serde(default)]
    show_shadow: bool,
    #[serde(default = "default_shadow_radius")]
    shadow_radius: f64,
    #[serde(default)]
    shadow_offset_x: f64,
    #[serde(default)]
    shadow_offset_y: f64,
    #[serde(default = "default_shadow_color")]
    shadow_color: ColorJson,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SizeJson {
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ColorJson {
    #[serde(default)]
    red: f64,
    #[serde(default)]
    green: f64,
    #[serde(default)]
    blue: f64,
    #[serde(default = "default_opaque")]
    alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileMetadataJson {
    #[serde(default = "default_format_version")]
    format_version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

fn default_opaque() -> f64 {
    1.0
}

fn default_border_width() -> f64 {
    1.0
}

fn default_shadow_radius() -> f64 {
    1.0
}

fn default_border_color() -> ColorJson {
    ColorJson {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
        alpha: 1.0,
    }
}

fn default_shadow_color() -> ColorJson {
    ColorJson {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
        alpha: 0.3,
    }
}

fn default_format_version() -> u32 {
    CURRENT_FORMAT_VERSION
}

fn visual_metadata_to_json(metadata: &VisualMetadata) -> VisualMetadataJson {
    VisualMetadataJson::Current(VisualMetadataCurrentJson {
        id: *metadata.id().as_uuid(),
        width: metadata.width(),
        height: metadata.height(),
        lock_aspect_ratio: metadata.lock_aspect_ratio(),
        default_size: size_to_json(metadata.default_size()),
        max_size: size_to_json(metadata.max_size()),
        original_aspect_ratio: metadata.original_aspect_ratio(),
        rotation: metadata.rotation(),
        is_flipped_horizontal: metadata.is_flipped_horizontal(),
        is_flipped_vertical: metadata.is_flipped_vertical(),
        opacity: metadata.opacity(),
        show_border: metadata.show_border(),
        border_width: metadata.border_width(),
        border_color: color_to_json(metadata.border_color()),
        show_shadow: metadata.show_shadow(),
        shadow_radius: metadata.shadow_radius(),
        shadow_offset_x: metadata.shadow_offset_x(),
        shadow_offset_y: metadata.shadow_offset_y(),
        shadow_color: color_to_json(metadata.shadow_color()),
    })
}

/// Stored values are transported verbatim; the editing API owns clamping.
fn visual_metadata_from_json(json: VisualMetadataJson) -> VisualMetadata {
    match json {
        VisualMetadataJson::Current(json) => {
            let max_size = size_from_json(json.max_size);
            VisualMetadata {
                id: ImageId::from_uuid(json.id),
                width: json.width,
                height: json.height,
                lock_aspect_ratio: json.lock_aspect_ratio,
                default_size: size_from_json(json.default_size),
                max_size,
                original_aspect_ratio: if json.original_aspect_ratio > 0.0 {
                    json.original_aspect_ratio
                } else {
                    max_size.aspect_ratio()
                },
                rotation: json.rotation,
                is_flipped_horizontal: json.is_flipped_horizontal,
                is_flipped_vertical: json.is_flipped_vertical,
                opacity: json.opacity,
                show_border: json.show_border,
                border_width: json.border_width,
                border_color: color_from_json(json.border_color),
                show_shadow: json.show_shadow,
                shadow_radius: json.shadow_radius,
                shadow_offset_x: json.shadow_offset_x,
                shadow_offset_y: json.shadow_offset_y,
                shadow_color: color_from_json(json.shadow_color),
            }
        }
        VisualMetadataJson::Legacy(json) => {
            let original_size = size_from_json(json.original_size);
            VisualMetadata {
                id: ImageId::from_uuid(json.id),
                width: json.width,
                height: json.height,
                lock_aspect_ratio: json.lock_aspect_ratio,
                default_size: original_size,
                max_size: original_size,
                original_aspect_ratio: original_size.aspect_ratio(),
                rotation: json.rotation,
                is_flipped_horizontal: json.is_flipped_horizontal,
                is_flipped_vertical: json.is_flipped_vertical,
                opacity: json.opacity,
                show_border: json.show_border,
                border_width: json.border_width,
                border_color: color_from_json(json.border_color),
                show_shadow: json.show_shadow,
                shadow_radius: json.shadow_radius,
                shadow_offset_x: json.shadow_offset_x,
                shadow_offset_y: json.shadow_offset_y,
                shadow_color: color_from_json(json.shadow_color),
            }
        }
    }
}

fn size_to_json(size: Size) -> SizeJson {
    SizeJson {
        width: size.width,
        height: size.height,
    }
}

fn size_from_json(json: SizeJson) -> Size {
    Size::new(json.width, json.height)
}

fn color_to_json(color: Rgba) -> ColorJson {
    ColorJson {
        red: color.red(),
        green: color.green(),
        blue: color.blue(),
        alpha: color.alpha(),
    }
}

fn color_from_json(json: ColorJson) -> Rgba {
    Rgba::new(json.red, json.green, json.blue, json.alpha)
}

/// Saves always write the current generation.
fn file_metadata_to_json(metadata: &FileMetadata) -> FileMetadataJson {
    FileMetadataJson {
        format_version: CURRENT_FORMAT_VERSION,
        created_at: metadata.created_at(),
        updated_at: metadata.updated_at(),
    }
}

fn file_metadata_from_json(json: FileMetadataJson) -> FileMetadata {
    FileMetadata {
        format_version: json.format_version,
        created_at: json.created_at,
        updated_at: json.updated_at,
    }
}

/// Writes one member into the staging directory. The directory is private
/// until the swap, so `create_new` is both safe and a guard against name
/// collisions.
fn write_member(
    dir: &Path,
    name: &str,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), PackageError> {
    validate_member_name(name)?;
    let path = dir.join(name);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| PackageError::Io {
        path: path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;
    }

    Ok(())
}

fn copy_member_if_present(
    package_dir: &Path,
    staging_dir: &Path,
    name: &str,
    durability: WriteDurability,
) -> Result<(), PackageError> {
    let from = package_dir.join(name);
    match fs::read(&from) {
        Ok(bytes) => write_member(staging_dir, name, &bytes, durability),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PackageError::Io { path: from, source }),
    }
}

/// Replaces the package at `path` with the fully written staging directory.
///
/// An existing package is moved aside first and restored if the swap fails.
/// On failure the staging directory is left for the caller to remove.
fn swap_into_place(
    staging_dir: &Path,
    path: &Path,
    durability: WriteDurability,
) -> Result<(), PackageError> {
    let existing = match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(PackageError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(md) => Some(md),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(PackageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match existing {
        Some(md) => {
            let (Some(parent), Some(file_name)) =
                (path.parent(), path.file_name().and_then(|name| name.to_str()))
            else {
                return Err(PackageError::InvalidPackagePath {
                    path: path.to_path_buf(),
                });
            };
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let aside = parent.join(format!(".proteus.old.{file_name}.{nanos}"));

            fs::rename(path, &aside).map_err(|source| PackageError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if let Err(source) = fs::rename(staging_dir, path) {
                // Put the previous package back before reporting.
                let _ = fs::rename(&aside, path);
                return Err(PackageError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }

            let removed = if md.is_dir() {
                fs::remove_dir_all(&aside)
            } else {
                fs::remove_file(&aside)
            };
            if let Err(err) = removed {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(
                        path = %aside.display(),
                        error = %err,
                        "package: could not remove replaced package"
                    );
                }
            }
        }
        None => {
            fs::rename(staging_dir, path).map_err(|source| PackageError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            sync_dir(path)?;
            if let Some(parent) = path.parent() {
                let parent = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                sync_dir(parent)?;
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> Result<(), PackageError> {
    let dir = fs::File::open(path).map_err(|source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    dir.sync_all().map_err(|source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    })
}
