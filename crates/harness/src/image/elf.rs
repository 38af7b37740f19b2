//! ELF to raw binary extraction.
//!
//! Test programs usually arrive as linked ELF files. The converter needs the flat image that
//! `objcopy -O binary` produces: every allocated section with file contents, placed at its
//! offset from the lowest such section, with gaps zero-filled.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use object::{Object, ObjectSection, SectionKind};
use tracing::debug;

use crate::common::constants::{ELF_MAGIC, MAX_FLAT_IMAGE_BYTES};
use crate::common::{HarnessError, HarnessResult};
use crate::sim::process::{ProcessOutcome, ProcessSpec};

/// Strategy used to turn an ELF into a raw binary image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElfExtractor {
    /// Delegate to an external `objcopy -O binary`.
    Objcopy(PathBuf),
    /// Parse the ELF in-process.
    Native,
}

impl ElfExtractor {
    /// Picks objcopy when it was resolved, the native parser otherwise.
    pub fn new(objcopy: Option<&Path>) -> Self {
        objcopy.map_or(Self::Native, |path| Self::Objcopy(path.to_path_buf()))
    }

    /// Writes the raw image of `elf` to `output`.
    pub fn extract(&self, elf: &Path, output: &Path, timeout: Duration) -> HarnessResult<()> {
        match self {
            Self::Objcopy(tool) => {
                let outcome = ProcessSpec::new(tool)
                    .args(["-O", "binary"])
                    .arg(elf)
                    .arg(output)
                    .timeout(timeout)
                    .run()?;
                match outcome {
                    ProcessOutcome::Exited { code: Some(0), .. } => Ok(()),
                    other => Err(HarnessError::Conversion {
                        path: elf.to_path_buf(),
                        reason: format!("objcopy failed: {}", other.stderr().trim()),
                    }),
                }
            }
            Self::Native => {
                let data = fs::read(elf).map_err(|e| HarnessError::Conversion {
                    path: elf.to_path_buf(),
                    reason: e.to_string(),
                })?;
                let image = flatten(&data).map_err(|reason| HarnessError::Conversion {
                    path: elf.to_path_buf(),
                    reason,
                })?;
                debug!(elf = %elf.display(), bytes = image.len(), "extracted ELF natively");
                fs::write(output, image).map_err(|e| HarnessError::Conversion {
                    path: output.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Returns `true` if `path` names an ELF file, by extension or by magic number.
pub fn is_elf(path: &Path) -> bool {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("elf"))
    {
        return true;
    }
    let mut magic = [0u8; 4];
    fs::File::open(path)
        .and_then(|mut f| std::io::Read::read_exact(&mut f, &mut magic))
        .is_ok_and(|()| magic == ELF_MAGIC)
}

/// Lays out the loadable sections of an ELF image as a flat binary.
///
/// Fails if the sections span more than [`MAX_FLAT_IMAGE_BYTES`].
pub fn flatten(elf: &[u8]) -> Result<Vec<u8>, String> {
    let file = object::File::parse(elf).map_err(|e| format!("not a valid ELF: {e}"))?;

    let mut sections = Vec::new();
    for section in file.sections() {
        let loadable = matches!(
            section.kind(),
            SectionKind::Text
                | SectionKind::Data
                | SectionKind::ReadOnlyData
                | SectionKind::ReadOnlyDataWithRel
                | SectionKind::ReadOnlyString
        );
        if !loadable || section.file_range().is_none() || section.size() == 0 {
            continue;
        }
        let data = section
            .data()
            .map_err(|e| format!("unreadable section {}: {e}", section.name().unwrap_or("?")))?;
        sections.push((section.address(), data));
    }

    let Some(base) = sections.iter().map(|(addr, _)| *addr).min() else {
        return Ok(Vec::new());
    };
    let end = sections
        .iter()
        .map(|(addr, data)| addr + data.len() as u64)
        .max()
        .unwrap_or(base);

    let span = end - base;
    let len = usize::try_from(span)
        .ok()
        .filter(|_| span <= MAX_FLAT_IMAGE_BYTES)
        .ok_or_else(|| {
            format!(
                "sections span {span:#x} bytes from {base:#x}, more than the {MAX_FLAT_IMAGE_BYTES:#x} byte limit"
            )
        })?;
    let mut image = vec![0u8; len];
    for (addr, data) in sections {
        let offset = (addr - base) as usize;
        image[offset..offset + data.len()].copy_from_slice(data);
    }
    Ok(image)
}
